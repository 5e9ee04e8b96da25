//! External glyph-compilation backend, driven as a child process.
//!
//! The backend program receives the font family name, the target directory
//! and one `--glyph <hex-codepoint>=<svg-path>` argument per icon, and must
//! leave `{family}.ttf`, `{family}.woff` and `{family}.woff2` in the target
//! directory.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::contract::{FontPaths, GlyphCompilation, GlyphCompiler};

/// Shells out to a configured glyph-compilation program.
#[derive(Debug, Clone)]
pub struct CommandGlyphCompiler {
    program: PathBuf,
}

impl CommandGlyphCompiler {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl GlyphCompiler for CommandGlyphCompiler {
    async fn compile(
        &self,
        request: GlyphCompilation,
    ) -> Result<FontPaths, Box<dyn std::error::Error + Send + Sync>> {
        let mut command = Command::new(&self.program);
        command
            .arg("--name")
            .arg(&request.family)
            .arg("--out")
            .arg(&request.fonts_dir);
        for glyph in &request.glyphs {
            command
                .arg("--glyph")
                .arg(format!("{:x}={}", glyph.codepoint, glyph.source_path.display()));
        }

        debug!(
            program = %self.program.display(),
            glyphs = request.glyphs.len(),
            "Invoking glyph-compilation backend"
        );
        let output = command.output().await.map_err(|e| {
            error!(error = ?e, program = %self.program.display(), "Failed to launch glyph-compilation backend");
            format!(
                "failed to launch glyph compiler '{}': {e}",
                self.program.display()
            )
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(
                status = ?output.status,
                stderr = %stderr,
                "Glyph-compilation backend exited with non-zero status"
            );
            return Err(format!(
                "glyph compiler exited with {}: {}",
                output.status,
                stderr.trim()
            )
            .into());
        }

        let paths = FontPaths {
            woff2: request.fonts_dir.join(format!("{}.woff2", request.family)),
            woff: request.fonts_dir.join(format!("{}.woff", request.family)),
            ttf: request.fonts_dir.join(format!("{}.ttf", request.family)),
        };
        for expected in [&paths.woff2, &paths.woff, &paths.ttf] {
            if !expected.exists() {
                return Err(format!(
                    "glyph compiler did not produce '{}'",
                    expected.display()
                )
                .into());
            }
        }

        info!(
            family = request.family,
            glyphs = request.glyphs.len(),
            "Glyph-compilation backend produced font encodings"
        );
        Ok(paths)
    }
}
