//! Regeneration orchestrator: sequences "mutate icon store" → "rebuild
//! bundle" → "report result".
//!
//! Each request walks the state machine Received → StoreMutated → Rebuilding
//! → Completed|Failed. A single-writer lock serializes every mutate+rebuild
//! sequence, so overlapping requests cannot interleave their store mutations
//! between each other's rebuilds. This is a deliberate hardening over the
//! original race-prone design; see DESIGN.md.
//!
//! Failure behavior:
//! - A build failure after a successful store mutation is NOT rolled back:
//!   the icon stays persisted, the previously published bundle stays live and
//!   the error propagates. Callers may retry with [`Regenerator::rebuild`].
//! - Transient upload inputs are deleted on every exit path, success or
//!   failure. This is the one unconditional resource release in the pipeline.
//!
//! Delete policy differs per bundle mode (both are legitimate, documented
//! variants):
//! - sprite mode: deletion is idempotent, a rebuild runs even when the icon
//!   was already gone, so the bundle re-converges with the store.
//! - font mode: a missing icon is reported as [`PipelineError::NotFound`] and
//!   no rebuild side effect happens.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info};

use crate::contract::{GlyphCompiler, MetadataStore, NewIconRecord};
use crate::error::PipelineError;
use crate::font::{FontBuilder, FontBundle};
use crate::ident;
use crate::sprite::{SpriteBuilder, SpriteBundle};
use crate::store::IconStore;

/// Bundle strategy for a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleMode {
    Sprite,
    Font,
}

impl BundleMode {
    fn noun(self) -> &'static str {
        match self {
            BundleMode::Sprite => "sprite",
            BundleMode::Font => "font",
        }
    }
}

/// Transient upload handed over by the upload handler: the original filename
/// plus a temporary file holding the not-yet-stored bytes.
#[derive(Debug, Clone)]
pub struct UploadInput {
    pub original_name: String,
    pub temp_path: PathBuf,
    pub mime_type: String,
    pub size: u64,
    pub uploaded_by: String,
}

/// Public sprite artifact locations.
#[derive(Debug, Clone, Serialize)]
pub struct SpriteReport {
    pub bundle_id: String,
    pub icon_ids: Vec<String>,
    pub svg_url: String,
    pub js_url: String,
    pub dts_url: String,
}

/// Public font artifact locations.
#[derive(Debug, Clone, Serialize)]
pub struct FontUrls {
    pub woff2: String,
    pub woff: String,
    pub ttf: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FontReport {
    pub font_name: String,
    pub icon_ids: Vec<String>,
    pub css_url: String,
    pub font_urls: FontUrls,
}

/// Mode-specific artifact descriptor.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum BundleArtifacts {
    Sprite(SpriteReport),
    Font(FontReport),
}

/// Result descriptor returned to the transport layer.
#[derive(Debug, Clone, Serialize)]
pub struct RegenerateReport {
    pub message: String,
    pub artifacts: BundleArtifacts,
}

/// Orchestrates store mutations and full bundle rebuilds.
///
/// Constructed once per deployment with explicit directory handles; no
/// ambient globals, so isolated instances can run in parallel tests.
pub struct Regenerator {
    store: IconStore,
    mode: BundleMode,
    sprite: SpriteBuilder,
    font: Option<FontBuilder>,
    metadata: Option<Arc<dyn MetadataStore>>,
    public_base_url: String,
    write_lock: tokio::sync::Mutex<()>,
}

impl Regenerator {
    /// Sprite-mode deployment, optionally wired to a metadata record store.
    pub fn sprite(
        store: IconStore,
        public_base_url: impl Into<String>,
        metadata: Option<Arc<dyn MetadataStore>>,
    ) -> Self {
        let sprite = SpriteBuilder::new(store.output_dir().join("sprites"));
        Self {
            sprite,
            mode: BundleMode::Sprite,
            font: None,
            metadata,
            public_base_url: normalize_base_url(public_base_url.into()),
            write_lock: tokio::sync::Mutex::new(()),
            store,
        }
    }

    /// Font-mode deployment with its glyph-compilation backend.
    pub fn font(
        store: IconStore,
        public_base_url: impl Into<String>,
        compiler: Arc<dyn GlyphCompiler>,
    ) -> Self {
        let sprite = SpriteBuilder::new(store.output_dir().join("sprites"));
        let font = FontBuilder::new(
            store.icon_dir(),
            store.output_dir().join("fonts"),
            compiler,
        );
        Self {
            sprite,
            mode: BundleMode::Font,
            font: Some(font),
            metadata: None,
            public_base_url: normalize_base_url(public_base_url.into()),
            write_lock: tokio::sync::Mutex::new(()),
            store,
        }
    }

    pub fn mode(&self) -> BundleMode {
        self.mode
    }

    /// Add one icon and rebuild the bundle.
    pub async fn add_icon(&self, upload: UploadInput) -> Result<RegenerateReport, PipelineError> {
        let _guard = self.write_lock.lock().await;
        info!(name = upload.original_name, "[REGEN] Received add request");
        let result = self.add_icon_inner(&upload).await;
        cleanup_temp_input(&upload.temp_path);
        self.finish(result)
    }

    /// Add several icons sequentially, then rebuild once.
    ///
    /// The put loop is not transactional: a failure at file `k` leaves files
    /// `1..k-1` persisted with no rebuild attempted. Every temporary input is
    /// still cleaned up.
    pub async fn add_icons(
        &self,
        uploads: Vec<UploadInput>,
    ) -> Result<RegenerateReport, PipelineError> {
        if uploads.is_empty() {
            return Err(PipelineError::Validation("no files uploaded".to_string()));
        }
        let _guard = self.write_lock.lock().await;
        info!(count = uploads.len(), "[REGEN] Received add-many request");
        let result = self.add_icons_inner(&uploads).await;
        for upload in &uploads {
            cleanup_temp_input(&upload.temp_path);
        }
        self.finish(result)
    }

    /// Remove one icon by stored filename, applying the per-mode policy.
    pub async fn remove_icon(&self, source_name: &str) -> Result<RegenerateReport, PipelineError> {
        let _guard = self.write_lock.lock().await;
        info!(name = source_name, "[REGEN] Received delete request");
        let result = self.remove_icon_inner(source_name).await;
        self.finish(result)
    }

    /// Rebuild-only entry point: regenerate the bundle from the current store
    /// without mutating it. Callers use this to retry after a failed add.
    pub async fn rebuild(
        &self,
        bundle_id: Option<String>,
    ) -> Result<RegenerateReport, PipelineError> {
        let _guard = self.write_lock.lock().await;
        info!("[REGEN] Received rebuild request");
        let result = async {
            self.store.ensure_ready()?;
            let artifacts = self.rebuild_current(bundle_id).await?;
            Ok(RegenerateReport {
                message: format!("Regenerated {} from current icon store.", self.mode.noun()),
                artifacts,
            })
        }
        .await;
        self.finish(result)
    }

    async fn add_icon_inner(
        &self,
        upload: &UploadInput,
    ) -> Result<RegenerateReport, PipelineError> {
        self.store.ensure_ready()?;
        self.put_upload(upload).await?;
        let artifacts = self.rebuild_current(None).await?;
        Ok(RegenerateReport {
            message: format!(
                "Successfully uploaded 1 icon and regenerated {}.",
                self.mode.noun()
            ),
            artifacts,
        })
    }

    async fn add_icons_inner(
        &self,
        uploads: &[UploadInput],
    ) -> Result<RegenerateReport, PipelineError> {
        self.store.ensure_ready()?;
        for upload in uploads {
            self.put_upload(upload).await?;
        }
        let artifacts = self.rebuild_current(None).await?;
        Ok(RegenerateReport {
            message: format!(
                "Successfully uploaded {} icons and regenerated {}.",
                uploads.len(),
                self.mode.noun()
            ),
            artifacts,
        })
    }

    async fn remove_icon_inner(
        &self,
        source_name: &str,
    ) -> Result<RegenerateReport, PipelineError> {
        self.store.ensure_ready()?;
        let removed = self.store.remove(source_name)?;
        if removed {
            info!(name = source_name, "[REGEN] Store mutated, icon removed");
        }

        match self.mode {
            BundleMode::Sprite => {
                if !removed {
                    info!(
                        name = source_name,
                        "[REGEN] Icon was already absent, rebuilding anyway"
                    );
                }
                if removed {
                    if let Some(file_name) = ident::sanitize_file_name(source_name) {
                        self.delete_record(&file_name).await;
                    }
                }
                let artifacts = self.rebuild_current(None).await?;
                Ok(RegenerateReport {
                    message: format!(
                        "Successfully deleted icon '{source_name}' and regenerated sprite."
                    ),
                    artifacts,
                })
            }
            BundleMode::Font => {
                if !removed {
                    info!(
                        name = source_name,
                        "[REGEN] Icon not found, skipping font rebuild"
                    );
                    return Err(PipelineError::NotFound(source_name.to_string()));
                }
                let artifacts = self.rebuild_current(None).await?;
                Ok(RegenerateReport {
                    message: format!(
                        "Successfully deleted icon '{source_name}' and regenerated font."
                    ),
                    artifacts,
                })
            }
        }
    }

    /// Read the transient upload, place it in the store and record provenance.
    async fn put_upload(&self, upload: &UploadInput) -> Result<(), PipelineError> {
        let bytes = fs::read(&upload.temp_path).map_err(|e| {
            PipelineError::storage(format!("reading upload '{}'", upload.original_name), e)
        })?;
        let stored_path = self.store.put(&upload.original_name, &bytes)?;
        info!(
            name = upload.original_name,
            path = %stored_path.display(),
            "[REGEN] Store mutated, icon added"
        );
        self.create_record(upload, &stored_path).await;
        Ok(())
    }

    /// Record provenance in the metadata store, when one is wired.
    ///
    /// Best-effort: the record store never reads back into the pipeline, so a
    /// failure here is logged for operators without failing the regeneration.
    async fn create_record(&self, upload: &UploadInput, stored_path: &Path) {
        let Some(metadata) = &self.metadata else {
            return;
        };
        let Some(file_name) = ident::sanitize_file_name(&upload.original_name) else {
            return;
        };
        let record = NewIconRecord {
            id: &file_name,
            original_name: &upload.original_name,
            filename: &file_name,
            path: &stored_path.display().to_string(),
            mime_type: &upload.mime_type,
            size: upload.size,
            uploaded_by: &upload.uploaded_by,
        };
        match metadata.create(record).await {
            Ok(created) => debug!(id = created.id, "Created provenance record"),
            Err(e) => error!(error = ?e, file = file_name, "Failed to create provenance record"),
        }
    }

    async fn delete_record(&self, file_name: &str) {
        let Some(metadata) = &self.metadata else {
            return;
        };
        match metadata.delete_by_id(file_name).await {
            Ok(true) => debug!(id = file_name, "Deleted provenance record"),
            Ok(false) => debug!(id = file_name, "No provenance record to delete"),
            Err(e) => error!(error = ?e, id = file_name, "Failed to delete provenance record"),
        }
    }

    /// Full, non-incremental rebuild from the store's current contents.
    async fn rebuild_current(
        &self,
        bundle_id: Option<String>,
    ) -> Result<BundleArtifacts, PipelineError> {
        info!(mode = ?self.mode, "[REGEN] Rebuilding bundle from current icon store");
        let icons = self.store.list_all()?;
        match self.mode {
            BundleMode::Sprite => {
                let bundle = self.sprite.build(&icons, bundle_id)?;
                Ok(BundleArtifacts::Sprite(self.sprite_report(bundle)))
            }
            BundleMode::Font => {
                let Some(font) = &self.font else {
                    return Err(PipelineError::build(
                        "font mode configured without a glyph compiler",
                    ));
                };
                let bundle = font.build(&icons).await?;
                Ok(BundleArtifacts::Font(self.font_report(bundle)))
            }
        }
    }

    fn finish(
        &self,
        result: Result<RegenerateReport, PipelineError>,
    ) -> Result<RegenerateReport, PipelineError> {
        match &result {
            Ok(report) => info!(message = report.message, "[REGEN] Completed"),
            Err(e) => error!(error = %e, status = e.http_status(), "[REGEN] Failed"),
        }
        result
    }

    fn sprite_report(&self, bundle: SpriteBundle) -> SpriteReport {
        let base = &self.public_base_url;
        SpriteReport {
            svg_url: format!("{base}/sprites/{}.svg", bundle.id),
            js_url: format!("{base}/sprites/{}.js", bundle.id),
            dts_url: format!("{base}/sprites/{}.d.ts", bundle.id),
            icon_ids: bundle.icon_ids,
            bundle_id: bundle.id,
        }
    }

    fn font_report(&self, bundle: FontBundle) -> FontReport {
        FontReport {
            css_url: self.public_font_url(&bundle.css_path),
            font_urls: FontUrls {
                woff2: self.public_font_url(&bundle.font_paths.woff2),
                woff: self.public_font_url(&bundle.font_paths.woff),
                ttf: self.public_font_url(&bundle.font_paths.ttf),
            },
            icon_ids: bundle.icon_ids,
            font_name: bundle.family,
        }
    }

    fn public_font_url(&self, path: &Path) -> String {
        let file = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        format!("{}/fonts/{file}", self.public_base_url)
    }
}

fn normalize_base_url(base: String) -> String {
    base.trim_end_matches('/').to_string()
}

/// Delete a transient upload file, tolerating its absence.
///
/// Called on every exit path of an add request; failure to delete is logged
/// for operators but never fails the request.
fn cleanup_temp_input(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Deleted temporary upload file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => error!(error = ?e, path = %path.display(), "Failed to delete temporary upload file"),
    }
}
