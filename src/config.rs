use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::regenerate::BundleMode;

/// Runtime settings for one pipeline deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Directory of canonical SVG source files.
    pub icon_dir: PathBuf,
    /// Directory derived bundle artifacts are written under.
    pub output_dir: PathBuf,
    pub mode: BundleMode,
    /// Base URL prefixed onto artifact paths in result descriptors.
    pub public_base_url: String,
    /// Glyph-compilation backend program; required in font mode.
    pub glyph_compiler: Option<PathBuf>,
}

impl PipelineSettings {
    pub fn trace_loaded(&self) {
        info!(
            icon_dir = %self.icon_dir.display(),
            output_dir = %self.output_dir.display(),
            mode = ?self.mode,
            "Loaded settings"
        );
        debug!(?self, "Settings loaded (full debug)");
    }
}
