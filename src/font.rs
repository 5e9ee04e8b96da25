//! Font-mode bundle builder.
//!
//! Compiles the entire icon store into one glyph webfont (three binary
//! encodings via the [`GlyphCompiler`] backend) plus a stylesheet mapping
//! `.icon-*` classes to glyphs. Rebuilds are full and non-incremental: the
//! fonts output directory is cleared before every compilation, so no stale
//! glyph artifact survives an icon's removal.
//!
//! The font family name is a fixed deployment-wide constant. Consumers always
//! reference the same URLs; rebuilds change content, never location.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::contract::{FontPaths, Glyph, GlyphCompilation, GlyphCompiler};
use crate::error::PipelineError;
use crate::ident;
use crate::store::Icon;

/// Fixed font family name for the whole deployment.
pub const FONT_FAMILY: &str = "iconfont";

/// First Private Use Area codepoint handed to a glyph.
const FIRST_CODEPOINT: u32 = 0xE001;

/// Result of one font build.
#[derive(Debug, Clone, Serialize)]
pub struct FontBundle {
    pub family: String,
    pub glyph_count: usize,
    /// Symbolic ids in store order.
    pub icon_ids: Vec<String>,
    pub css_path: PathBuf,
    pub font_paths: FontPaths,
}

/// Builds the icon webfont into a fixed fonts directory.
pub struct FontBuilder {
    icon_dir: PathBuf,
    fonts_dir: PathBuf,
    compiler: Arc<dyn GlyphCompiler>,
}

impl FontBuilder {
    pub fn new(
        icon_dir: impl Into<PathBuf>,
        fonts_dir: impl Into<PathBuf>,
        compiler: Arc<dyn GlyphCompiler>,
    ) -> Self {
        Self {
            icon_dir: icon_dir.into(),
            fonts_dir: fonts_dir.into(),
            compiler,
        }
    }

    /// Rebuild the whole font bundle from the current store contents.
    ///
    /// The `icons` snapshot is only consulted for the emptiness check; glyph
    /// sources are always re-derived from disk so the compilation covers
    /// exactly what the store holds right now. Zero icons is a hard error
    /// here, unlike the sprite pipeline.
    pub async fn build(&self, icons: &[Icon]) -> Result<FontBundle, PipelineError> {
        if icons.is_empty() {
            return Err(PipelineError::EmptySource);
        }

        let glyphs = self.scan_glyphs()?;
        if glyphs.is_empty() {
            return Err(PipelineError::EmptySource);
        }

        self.clear_fonts_dir()?;

        let font_paths = self
            .compiler
            .compile(GlyphCompilation {
                family: FONT_FAMILY.to_string(),
                fonts_dir: self.fonts_dir.clone(),
                glyphs: glyphs.clone(),
            })
            .await
            .map_err(PipelineError::Build)?;

        let css_path = self.fonts_dir.join(format!("{FONT_FAMILY}.css"));
        fs::write(&css_path, render_stylesheet(&glyphs)).map_err(|e| {
            PipelineError::storage(format!("writing stylesheet '{FONT_FAMILY}.css'"), e)
        })?;

        let icon_ids: Vec<String> = glyphs.iter().map(|g| g.name.clone()).collect();
        info!(
            family = FONT_FAMILY,
            glyphs = glyphs.len(),
            "Compiled icon webfont bundle"
        );
        Ok(FontBundle {
            family: FONT_FAMILY.to_string(),
            glyph_count: glyphs.len(),
            icon_ids,
            css_path,
            font_paths,
        })
    }

    /// Enumerate the store directory and assign stable PUA codepoints in
    /// store order.
    fn scan_glyphs(&self) -> Result<Vec<Glyph>, PipelineError> {
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
            }
        }
        files.sort();

        Ok(files
            .into_iter()
            .enumerate()
            .map(|(i, path)| {
                let source_name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default();
                Glyph {
                    name: ident::symbolic_id(source_name),
                    codepoint: FIRST_CODEPOINT + i as u32,
                    source_path: path,
                }
            })
            .collect())
    }

    /// Full-clear the fonts output directory before a rebuild.
    fn clear_fonts_dir(&self) -> Result<(), PipelineError> {
        if self.fonts_dir.exists() {
            fs::remove_dir_all(&self.fonts_dir)
                .map_err(|e| PipelineError::storage("clearing fonts directory", e))?;
            debug!(path = %self.fonts_dir.display(), "Cleared previous fonts directory");
        }
        fs::create_dir_all(&self.fonts_dir)
            .map_err(|e| PipelineError::storage("creating fonts directory", e))?;
        Ok(())
    }
}

/// Render the stylesheet: one `@font-face` over the three encodings plus one
/// class per glyph.
fn render_stylesheet(glyphs: &[Glyph]) -> String {
    let mut css = format!(
        r#"@font-face {{
  font-family: '{FONT_FAMILY}';
  src: url('{FONT_FAMILY}.woff2') format('woff2'),
       url('{FONT_FAMILY}.woff') format('woff'),
       url('{FONT_FAMILY}.ttf') format('truetype');
  font-weight: normal;
  font-style: normal;
}}

[class^='icon-'],
[class*=' icon-'] {{
  font-family: '{FONT_FAMILY}';
  font-style: normal;
  font-weight: normal;
  speak: never;
  display: inline-block;
  line-height: 1;
  -webkit-font-smoothing: antialiased;
}}
"#
    );
    for glyph in glyphs {
        css.push_str(&format!(
            "\n.icon-{}:before {{\n  content: '\\{:x}';\n}}\n",
            glyph.name, glyph.codepoint
        ));
    }
    css
}
