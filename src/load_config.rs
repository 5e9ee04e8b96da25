//! YAML settings file loading.
//!
//! The file carries directory layout and bundle mode; the public base URL can
//! be overridden with the `CDN_BASE_URL` environment variable so deployments
//! keep it out of the checked-in config.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;
use tracing::{error, info};

use crate::config::PipelineSettings;
use crate::regenerate::BundleMode;

const DEFAULT_BASE_URL: &str = "http://localhost:3002/uploads";

#[derive(Deserialize)]
struct StaticConfig {
    store: StoreSection,
    bundle: BundleSection,
    #[serde(default)]
    font: Option<FontSection>,
}

#[derive(Deserialize)]
struct StoreSection {
    icon_dir: PathBuf,
    output_dir: PathBuf,
}

#[derive(Deserialize)]
struct BundleSection {
    mode: BundleMode,
    #[serde(default)]
    public_base_url: Option<String>,
}

#[derive(Deserialize)]
struct FontSection {
    compiler: PathBuf,
}

/// Load the YAML settings file and apply environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PipelineSettings> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {path_ref:?}: {e}"
            ));
        }
    };

    let static_conf: StaticConfig = match serde_yaml::from_str(&content) {
        Ok(conf) => conf,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let public_base_url = match std::env::var("CDN_BASE_URL") {
        Ok(base) if !base.trim().is_empty() => base,
        _ => static_conf
            .bundle
            .public_base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
    };

    let glyph_compiler = static_conf.font.map(|f| f.compiler);
    if static_conf.bundle.mode == BundleMode::Font && glyph_compiler.is_none() {
        return Err(anyhow::anyhow!(
            "font.compiler must be configured when bundle.mode is 'font'"
        ));
    }

    let settings = PipelineSettings {
        icon_dir: static_conf.store.icon_dir,
        output_dir: static_conf.store.output_dir,
        mode: static_conf.bundle.mode,
        public_base_url,
        glyph_compiler,
    };
    settings.trace_loaded();
    Ok(settings)
}
