//! Directory-backed icon store: the single source of truth for which icons
//! exist right now.
//!
//! One flat directory of SVG files keyed by sanitized original filename. No
//! application-level locking; concurrent writers to the same filename race at
//! the OS level and the last writer wins, consistent with overwrite-on-put.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::ident;

/// One stored SVG source document.
#[derive(Debug, Clone)]
pub struct Icon {
    /// Sanitized upload filename the icon is stored under.
    pub source_name: String,
    /// Derived stable identifier, unique within the active bundle.
    pub symbolic_id: String,
    /// Raw SVG markup.
    pub content: String,
    /// Absolute or config-relative location of the stored file.
    pub stored_path: PathBuf,
}

/// Explicit handle over the icon directory and the bundle output directory.
///
/// Constructed once with its directories injected, so tests can run in
/// parallel against isolated tempdirs.
#[derive(Debug, Clone)]
pub struct IconStore {
    icon_dir: PathBuf,
    output_dir: PathBuf,
}

impl IconStore {
    pub fn new(icon_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            icon_dir: icon_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn icon_dir(&self) -> &Path {
        &self.icon_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Idempotent creation of the icon and output directories.
    ///
    /// Must be called before any other operation; safe to call concurrently
    /// from overlapping rebuild invocations (`create_dir_all` tolerates the
    /// directory already existing).
    pub fn ensure_ready(&self) -> Result<(), PipelineError> {
        fs::create_dir_all(&self.icon_dir)
            .map_err(|e| PipelineError::storage("creating icon directory", e))?;
        fs::create_dir_all(&self.output_dir)
            .map_err(|e| PipelineError::storage("creating output directory", e))?;
        Ok(())
    }

    /// Write (or overwrite) an icon under its sanitized source name.
    ///
    /// Returns the stored path. Rejects names that sanitize to nothing and
    /// non-`.svg` uploads before touching the filesystem.
    pub fn put(&self, source_name: &str, content: &[u8]) -> Result<PathBuf, PipelineError> {
        let file_name = ident::sanitize_file_name(source_name).ok_or_else(|| {
            PipelineError::Validation(format!("unusable icon filename '{source_name}'"))
        })?;
        if !file_name.to_ascii_lowercase().ends_with(".svg") {
            return Err(PipelineError::Validation(format!(
                "only SVG files are allowed, got '{file_name}'"
            )));
        }

        let stored_path = self.icon_dir.join(&file_name);
        fs::write(&stored_path, content)
            .map_err(|e| PipelineError::storage(format!("writing icon '{file_name}'"), e))?;
        debug!(file = file_name, path = %stored_path.display(), "Stored icon");
        Ok(stored_path)
    }

    /// Delete the icon stored under `source_name`, if present.
    ///
    /// Returns `false` (not an error) when the icon did not exist; deletion is
    /// idempotent from the store's perspective. Whether "not found" is
    /// user-facing is decided per bundle mode by the orchestrator.
    pub fn remove(&self, source_name: &str) -> Result<bool, PipelineError> {
        let Some(file_name) = ident::sanitize_file_name(source_name) else {
            return Ok(false);
        };
        let path = self.icon_dir.join(&file_name);
        if !path.exists() {
            debug!(file = file_name, "Icon not present, nothing to remove");
            return Ok(false);
        }
        fs::remove_file(&path)
            .map_err(|e| PipelineError::storage(format!("removing icon '{file_name}'"), e))?;
        debug!(file = file_name, "Removed icon");
        Ok(true)
    }

    /// Enumerate every stored icon.
    ///
    /// Entries are sorted by file name so the order is stable within one
    /// rebuild. An empty store yields an empty vec, not an error. Non-SVG
    /// strays are skipped with a warning rather than failing the rebuild.
    pub fn list_all(&self) -> Result<Vec<Icon>, PipelineError> {
        let entries = fs::read_dir(&self.icon_dir)
            .map_err(|e| PipelineError::storage("reading icon directory", e))?;

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| PipelineError::storage("reading icon directory entry", e))?;
            let path = entry.path();
            let is_svg = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
            if path.is_file() && is_svg {
                files.push(path);
            } else {
                warn!(path = %path.display(), "Skipping non-SVG entry in icon directory");
            }
        }
        files.sort();

        let mut icons = Vec::with_capacity(files.len());
        for path in files {
            let source_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            let content = fs::read_to_string(&path)
                .map_err(|e| PipelineError::storage(format!("reading icon '{source_name}'"), e))?;
            icons.push(Icon {
                symbolic_id: ident::symbolic_id(&source_name),
                source_name,
                content,
                stored_path: path,
            });
        }
        Ok(icons)
    }
}
