//! Sprite-mode bundle builder.
//!
//! Merges every stored icon into one combined SVG document of named
//! `<symbol>` elements, then renders two companion artifacts: a
//! self-installing loader script that injects the document into a host page
//! and publishes the `window.SVG_ICONS` lookup table, and an advisory
//! TypeScript definition file enumerating the valid icon names as a closed
//! union.
//!
//! An empty icon set is a legitimate input here (the loader simply exposes an
//! empty lookup table); the font pipeline treats the same situation as a hard
//! error instead.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::store::Icon;

const SPRITE_SVG_OPEN: &str = concat!(
    "<svg xmlns=\"http://www.w3.org/2000/svg\" ",
    "xmlns:xlink=\"http://www.w3.org/1999/xlink\" ",
    "style=\"display: none;\" aria-hidden=\"true\">"
);

/// Result of one sprite build: artifact locations plus the final id set.
#[derive(Debug, Clone, Serialize)]
pub struct SpriteBundle {
    pub id: String,
    /// Number of input icons (collisions included).
    pub svg_count: usize,
    pub svg_path: PathBuf,
    pub js_path: PathBuf,
    pub dts_path: PathBuf,
    /// Symbolic ids in input order, deduplicated last-write-wins.
    pub icon_ids: Vec<String>,
}

/// Builds sprite bundles into a fixed output directory.
#[derive(Debug, Clone)]
pub struct SpriteBuilder {
    output_dir: PathBuf,
}

impl SpriteBuilder {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Build one consistent sprite bundle from the given icon snapshot.
    ///
    /// A missing `bundle_id` gets a freshly generated one. Duplicate symbolic
    /// ids dedup with the later occurrence winning: its content replaces the
    /// earlier symbol at the earlier position, matching the lookup-table
    /// overwrite the loader performs.
    pub fn build(
        &self,
        icons: &[Icon],
        bundle_id: Option<String>,
    ) -> Result<SpriteBundle, PipelineError> {
        let id = bundle_id.unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut icon_ids: Vec<String> = Vec::with_capacity(icons.len());
        let mut symbols: HashMap<String, String> = HashMap::with_capacity(icons.len());
        for icon in icons {
            let symbol = icon_to_symbol(icon)?;
            if symbols.insert(icon.symbolic_id.clone(), symbol).is_none() {
                icon_ids.push(icon.symbolic_id.clone());
            } else {
                debug!(
                    symbolic_id = icon.symbolic_id,
                    source = icon.source_name,
                    "Duplicate symbolic id, later content wins"
                );
            }
            debug!(
                source = icon.source_name,
                symbolic_id = icon.symbolic_id,
                "Added icon to sprite"
            );
        }

        let mut combined = String::from(SPRITE_SVG_OPEN);
        for symbolic_id in &icon_ids {
            combined.push_str(&symbols[symbolic_id]);
        }
        combined.push_str("</svg>");

        fs::create_dir_all(&self.output_dir)
            .map_err(|e| PipelineError::storage("creating sprite output directory", e))?;

        let svg_path = self.output_dir.join(format!("{id}.svg"));
        fs::write(&svg_path, &combined)
            .map_err(|e| PipelineError::storage(format!("writing sprite '{id}.svg'"), e))?;

        let js_path = self.output_dir.join(format!("{id}.js"));
        fs::write(&js_path, render_loader_script(&id, &combined, &icon_ids))
            .map_err(|e| PipelineError::storage(format!("writing loader '{id}.js'"), e))?;

        let dts_path = self.output_dir.join(format!("{id}.d.ts"));
        fs::write(&dts_path, render_type_definitions(&id, &icon_ids))
            .map_err(|e| PipelineError::storage(format!("writing definitions '{id}.d.ts'"), e))?;

        info!(
            bundle_id = id,
            icons = icons.len(),
            symbols = icon_ids.len(),
            "Created sprite bundle"
        );

        Ok(SpriteBundle {
            svg_count: icons.len(),
            svg_path,
            js_path,
            dts_path,
            icon_ids,
            id,
        })
    }
}

/// Convert one icon document into a `<symbol id="...">` element.
///
/// The root `<svg>` element is replaced by the symbol; geometry-relevant root
/// attributes carry over, empty `<defs>` blocks are dropped, everything else
/// is copied through untouched.
fn icon_to_symbol(icon: &Icon) -> Result<String, PipelineError> {
    let mut reader = Reader::from_str(&icon.content);
    reader.config_mut().trim_text(true);
    let mut writer = Writer::new(Vec::new());

    let mut in_root = false;
    let mut depth = 0usize;
    let mut closed = false;

    loop {
        let event = reader.read_event().map_err(PipelineError::build)?;
        match event {
            Event::Eof => break,
            Event::Decl(_) | Event::DocType(_) | Event::PI(_) => {}
            Event::Start(e) if !in_root => {
                if e.local_name().as_ref() != b"svg" {
                    return Err(PipelineError::build(format!(
                        "icon '{}' has no <svg> root element",
                        icon.source_name
                    )));
                }
                in_root = true;
                writer
                    .write_event(Event::Start(symbol_open(&e, &icon.symbolic_id)?))
                    .map_err(PipelineError::build)?;
            }
            Event::Empty(e) if !in_root => {
                if e.local_name().as_ref() != b"svg" {
                    return Err(PipelineError::build(format!(
                        "icon '{}' has no <svg> root element",
                        icon.source_name
                    )));
                }
                writer
                    .write_event(Event::Empty(symbol_open(&e, &icon.symbolic_id)?))
                    .map_err(PipelineError::build)?;
                closed = true;
                break;
            }
            _ if !in_root => {}
            Event::End(_) if depth == 0 => {
                writer
                    .write_event(Event::End(BytesEnd::new("symbol")))
                    .map_err(PipelineError::build)?;
                closed = true;
                break;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"defs" => {
                debug!(source = icon.source_name, "Dropping empty <defs>");
            }
            Event::Start(e) if e.local_name().as_ref() == b"defs" => {
                copy_defs_block(&mut reader, &mut writer, &e, icon)?;
            }
            Event::Start(e) => {
                depth += 1;
                writer
                    .write_event(Event::Start(e))
                    .map_err(PipelineError::build)?;
            }
            Event::End(e) => {
                depth -= 1;
                writer
                    .write_event(Event::End(e))
                    .map_err(PipelineError::build)?;
            }
            other => {
                writer.write_event(other).map_err(PipelineError::build)?;
            }
        }
    }

    if !closed {
        return Err(PipelineError::build(format!(
            "icon '{}' is not a well-formed SVG document",
            icon.source_name
        )));
    }

    String::from_utf8(writer.into_inner()).map_err(PipelineError::build)
}

/// Copy a `<defs>` block through, unless it turns out to be empty.
fn copy_defs_block(
    reader: &mut Reader<&[u8]>,
    writer: &mut Writer<Vec<u8>>,
    open: &BytesStart<'_>,
    icon: &Icon,
) -> Result<(), PipelineError> {
    let mut buffered: Vec<Event<'static>> = Vec::new();
    let mut defs_depth = 1usize;
    loop {
        let event = reader.read_event().map_err(PipelineError::build)?;
        match event {
            Event::Eof => {
                return Err(PipelineError::build(format!(
                    "icon '{}' has an unclosed <defs> block",
                    icon.source_name
                )));
            }
            Event::Start(ref e) if e.local_name().as_ref() == b"defs" => {
                defs_depth += 1;
                buffered.push(event.into_owned());
            }
            Event::End(ref e) if e.local_name().as_ref() == b"defs" => {
                defs_depth -= 1;
                if defs_depth == 0 {
                    break;
                }
                buffered.push(event.into_owned());
            }
            other => buffered.push(other.into_owned()),
        }
    }

    if buffered.is_empty() {
        debug!(source = icon.source_name, "Dropping empty <defs>");
        return Ok(());
    }
    writer
        .write_event(Event::Start(open.to_owned()))
        .map_err(PipelineError::build)?;
    for event in buffered {
        writer.write_event(event).map_err(PipelineError::build)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("defs")))
        .map_err(PipelineError::build)?;
    Ok(())
}

/// Open a `<symbol>` element carrying the symbolic id and the root `<svg>`
/// attributes that still matter inside a sprite.
fn symbol_open(
    root: &BytesStart<'_>,
    symbolic_id: &str,
) -> Result<BytesStart<'static>, PipelineError> {
    let mut symbol = BytesStart::new("symbol");
    symbol.push_attribute(("id", symbolic_id));
    for attr in root.attributes() {
        let attr = attr.map_err(PipelineError::build)?;
        let name = match attr.key.as_ref() {
            b"viewBox" => "viewBox",
            b"preserveAspectRatio" => "preserveAspectRatio",
            b"fill" => "fill",
            b"stroke" => "stroke",
            _ => continue,
        };
        let value = attr.unescape_value().map_err(PipelineError::build)?;
        symbol.push_attribute((name, value.as_ref()));
    }
    Ok(symbol)
}

/// Escape text for embedding inside a JavaScript template literal.
///
/// Contract: escape backslash first, then backtick; reversing the order would
/// double-escape the backslashes introduced for backticks.
pub fn escape_template_literal(text: &str) -> String {
    text.replace('\\', "\\\\").replace('`', "\\`")
}

/// Render the self-installing loader script.
///
/// On execution it no-ops in hosts without SVG support, injects the combined
/// document as a hidden container before all other body content, and publishes
/// the `window.SVG_ICONS` string-identity map consumers use to validate icon
/// names. Symbolic ids only contain `[A-Za-z0-9-]`, so they embed into string
/// literals as-is.
fn render_loader_script(bundle_id: &str, sprite_xml: &str, icon_ids: &[String]) -> String {
    let lookup = icon_ids
        .iter()
        .map(|id| format!("    '{id}': '{id}'"))
        .collect::<Vec<_>>()
        .join(",\n");
    format!(
        r#"/**
 * SVG sprite {bundle_id} loader.
 */
(function (window, document) {{
  'use strict';
  if (!document.createElementNS || !document.createElementNS('http://www.w3.org/2000/svg', 'svg').createSVGRect) {{
    return true;
  }}
  var svgSprite = `{sprite}`;

  var div = document.createElement('div');
  div.style.display = 'none';
  div.innerHTML = svgSprite;

  document.body.insertBefore(div, document.body.childNodes[0]);

  window.SVG_ICONS = {{
{lookup}
  }};
}})(window, document);
"#,
        sprite = escape_template_literal(sprite_xml),
    )
}

/// Render the advisory TypeScript definition artifact.
///
/// Enumerates the exact valid symbolic-id set as a closed union; consumers
/// without static typing simply ignore the file.
fn render_type_definitions(bundle_id: &str, icon_ids: &[String]) -> String {
    let window_entries = icon_ids
        .iter()
        .map(|id| format!("            '{id}': '{id}';"))
        .collect::<Vec<_>>()
        .join("\n");
    let union = if icon_ids.is_empty() {
        "never".to_string()
    } else {
        icon_ids
            .iter()
            .map(|id| format!("'{id}'"))
            .collect::<Vec<_>>()
            .join(" | ")
    };
    format!(
        r#"/**
 * SVG sprite {bundle_id} definitions.
 */

declare global {{
    interface Window {{
        SVG_ICONS: {{
{window_entries}
        }};
    }}
}}

export type SvgIconName = {union};

export {{}};
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_backslash_before_backtick() {
        assert_eq!(escape_template_literal(r"a\b"), r"a\\b");
        assert_eq!(escape_template_literal("a`b"), "a\\`b");
        // A literal backslash-backtick pair must not double-escape.
        assert_eq!(escape_template_literal("\\`"), "\\\\\\`");
    }

    #[test]
    fn script_closing_sequences_pass_through() {
        let adversarial = "<svg></script><path note=\"tick ` and slash \\\"/></svg>";
        let script = render_loader_script("x", adversarial, &[]);
        assert!(script.contains("</script>"));
        assert!(script.contains("tick \\` and slash \\\\"));
    }

    #[test]
    fn empty_union_degrades_to_never() {
        let dts = render_type_definitions("x", &[]);
        assert!(dts.contains("export type SvgIconName = never;"));
    }
}
