use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tempfile::NamedTempFile;

use crate::config::PipelineSettings;
use crate::glyphs::CommandGlyphCompiler;
use crate::load_config::load_config;
use crate::regenerate::{BundleMode, RegenerateReport, Regenerator, UploadInput};
use crate::store::IconStore;

/// CLI for icon-bundler: maintain an icon store and its derived bundle.
#[derive(Parser)]
#[clap(
    name = "icon-bundler",
    version,
    about = "Rebuild SVG sprite or icon webfont bundles from a directory of source icons"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
    /// Print the full report as JSON instead of the debug summary
    #[clap(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add one or more SVG files to the icon store and regenerate the bundle
    Add {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// SVG files to add
        #[clap(required = true)]
        files: Vec<PathBuf>,
    },
    /// Remove an icon by its stored filename and regenerate the bundle
    Remove {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Stored filename of the icon to remove
        name: String,
    },
    /// Regenerate the bundle from the current store without mutating it
    Rebuild {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Reuse a specific bundle id instead of generating one (sprite mode)
        #[clap(long)]
        bundle_id: Option<String>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let result = match cli.command {
        Commands::Add { config, files } => {
            let regenerator = build_regenerator(&load_config(config)?)?;
            let mut uploads = stage_uploads(&std::env::temp_dir(), &files)?;
            println!("Regeneration starting...");
            if uploads.len() == 1 {
                regenerator.add_icon(uploads.remove(0)).await
            } else {
                regenerator.add_icons(uploads).await
            }
        }
        Commands::Remove { config, name } => {
            let regenerator = build_regenerator(&load_config(config)?)?;
            println!("Regeneration starting...");
            regenerator.remove_icon(&name).await
        }
        Commands::Rebuild { config, bundle_id } => {
            let regenerator = build_regenerator(&load_config(config)?)?;
            println!("Regeneration starting...");
            regenerator.rebuild(bundle_id).await
        }
    };

    match result {
        Ok(report) => {
            print_report(&report, cli.json)?;
            Ok(())
        }
        Err(e) => {
            eprintln!("[ERROR] Regeneration failed: {e}");
            Err(anyhow::Error::new(e))
        }
    }
}

fn build_regenerator(settings: &PipelineSettings) -> Result<Regenerator> {
    let store = IconStore::new(&settings.icon_dir, &settings.output_dir);
    match settings.mode {
        BundleMode::Sprite => Ok(Regenerator::sprite(
            store,
            &settings.public_base_url,
            None,
        )),
        BundleMode::Font => {
            let program = settings
                .glyph_compiler
                .as_ref()
                .context("font mode requires a configured glyph compiler")?;
            Ok(Regenerator::font(
                store,
                &settings.public_base_url,
                Arc::new(CommandGlyphCompiler::new(program)),
            ))
        }
    }
}

/// Copy local files into transient uploads, the same shape an upload handler
/// would hand over.
///
/// Staged files stay owned by their [`NamedTempFile`] handles until the whole
/// batch has staged, so a failure at file `k` drops and deletes the temps for
/// files `1..k-1`. Only a fully staged batch is persisted and handed to the
/// orchestrator, which then owns the cleanup.
fn stage_uploads(staging_dir: &Path, files: &[PathBuf]) -> Result<Vec<UploadInput>> {
    let mut staged = Vec::with_capacity(files.len());
    for file in files {
        let original_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("unusable file name: {}", file.display()))?
            .to_string();
        let size = fs::metadata(file)
            .with_context(|| format!("reading metadata of {}", file.display()))?
            .len();

        let temp =
            NamedTempFile::new_in(staging_dir).context("creating temporary upload file")?;
        fs::copy(file, temp.path())
            .with_context(|| format!("staging {} for upload", file.display()))?;
        staged.push((original_name, size, temp));
    }

    staged
        .into_iter()
        .map(|(original_name, size, temp)| {
            let (_file, temp_path) = temp.keep().context("persisting temporary upload file")?;
            Ok(UploadInput {
                original_name,
                temp_path,
                mime_type: "image/svg+xml".to_string(),
                size,
                uploaded_by: "cli".to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn failed_staging_leaves_no_temp_files_behind() {
        let staging = tempdir().unwrap();
        let sources = tempdir().unwrap();
        let good = sources.path().join("a.svg");
        fs::write(&good, "<svg/>").unwrap();
        let missing = sources.path().join("ghost.svg");

        let err = stage_uploads(staging.path(), &[good, missing]).unwrap_err();
        assert!(err.to_string().contains("ghost.svg"));
        assert_eq!(fs::read_dir(staging.path()).unwrap().count(), 0);
    }

    #[test]
    fn fully_staged_batch_is_persisted() {
        let staging = tempdir().unwrap();
        let sources = tempdir().unwrap();
        let good = sources.path().join("a.svg");
        fs::write(&good, "<svg/>").unwrap();

        let uploads = stage_uploads(staging.path(), &[good]).unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].original_name, "a.svg");
        assert!(uploads[0].temp_path.is_file());
        fs::remove_file(&uploads[0].temp_path).unwrap();
    }
}

fn print_report(report: &RegenerateReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("Regeneration complete.\nReport:");
        println!("{report:#?}");
    }
    Ok(())
}
