//! Collaborator contracts for the regeneration pipeline.
//!
//! Two external collaborators sit behind traits here: the glyph-compilation
//! backend that turns a set of SVG glyphs into binary font encodings, and the
//! metadata record store that keeps upload provenance for sprite-mode
//! deployments. The pipeline supplies the identifiers these collaborators
//! need but never reads provenance back through them.
//!
//! Both traits are annotated for `mockall`, so tests can drive the
//! orchestrator with deterministic mocks instead of a real backend or store.

use std::path::PathBuf;
use std::time::SystemTime;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// One glyph to compile into the icon font.
#[derive(Debug, Clone)]
pub struct Glyph {
    /// Symbolic id of the source icon; becomes the CSS class suffix.
    pub name: String,
    /// Stored SVG file the glyph is cut from.
    pub source_path: PathBuf,
    /// Assigned Private Use Area codepoint.
    pub codepoint: u32,
}

/// Request for one whole-store font compilation.
#[derive(Debug, Clone)]
pub struct GlyphCompilation {
    /// Fixed font family name shared by every rebuild.
    pub family: String,
    /// Directory the binary encodings must land in.
    pub fonts_dir: PathBuf,
    pub glyphs: Vec<Glyph>,
}

/// Locations of the three binary font encodings, all sharing one family name.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FontPaths {
    pub woff2: PathBuf,
    pub woff: PathBuf,
    pub ttf: PathBuf,
}

/// Glyph-compilation backend.
///
/// Implemented by [`crate::glyphs::CommandGlyphCompiler`] in production and by
/// mocks in tests. Upstream failures come back as boxed errors; the font
/// builder wraps them into the pipeline taxonomy.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait GlyphCompiler: Send + Sync {
    /// Compile the glyph set into `{family}.ttf`, `{family}.woff` and
    /// `{family}.woff2` inside the requested fonts directory.
    async fn compile(
        &self,
        request: GlyphCompilation,
    ) -> Result<FontPaths, Box<dyn std::error::Error + Send + Sync>>;
}

/// Upload provenance for one stored icon.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IconRecord {
    pub id: String,
    pub original_name: String,
    pub filename: String,
    pub path: String,
    pub mime_type: String,
    pub size: u64,
    pub uploaded_by: String,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

/// Data needed to create a provenance record.
///
/// The pipeline supplies the stored filename as `id`, so it can later delete
/// the record without reading anything back from the store.
pub struct NewIconRecord<'a> {
    pub id: &'a str,
    pub original_name: &'a str,
    pub filename: &'a str,
    pub path: &'a str,
    pub mime_type: &'a str,
    pub size: u64,
    pub uploaded_by: &'a str,
}

/// Filter for listing provenance records.
#[derive(Debug, Default, Clone)]
pub struct RecordFilter {
    pub uploaded_by: Option<String>,
}

/// Metadata record store collaborator (sprite-mode deployments only).
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn create<'a>(
        &self,
        record: NewIconRecord<'a>,
    ) -> Result<IconRecord, Box<dyn std::error::Error + Send + Sync>>;

    async fn find_by_id(
        &self,
        id: &str,
    ) -> Result<Option<IconRecord>, Box<dyn std::error::Error + Send + Sync>>;

    async fn find_all(
        &self,
        filter: RecordFilter,
    ) -> Result<Vec<IconRecord>, Box<dyn std::error::Error + Send + Sync>>;

    /// Delete by record id; `false` when no record matched.
    async fn delete_by_id(
        &self,
        id: &str,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}
