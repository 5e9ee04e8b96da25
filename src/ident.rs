//! Identifier assignment for stored icons.
//!
//! Symbolic ids are derived deterministically from the upload filename and are
//! NOT guaranteed collision-free: two names that normalize identically silently
//! collide. Later occurrences win in sprite mode (lookup entry overwritten) and
//! overwrite the stored file in font mode. That is the established contract of
//! the bundle format; changing it would change observable output.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^A-Za-z0-9]").expect("valid literal pattern"));

/// Derive the symbolic id for a source filename.
///
/// Strips the trailing file extension, then replaces every character outside
/// `[A-Za-z0-9]` with `-`. Pure and infallible.
pub fn symbolic_id(source_name: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(source_name);
    NON_ALPHANUMERIC.replace_all(stem, "-").into_owned()
}

/// Reduce an upload filename to a safe flat file name.
///
/// Drops every path component except the last, which defeats traversal
/// attempts like `../../etc/passwd.svg`. Returns `None` when nothing safe
/// remains (empty input, bare separators, `..`).
pub fn sanitize_file_name(source_name: &str) -> Option<String> {
    // Split on both separator styles; uploads may carry Windows-style paths.
    let name = source_name.rsplit(['/', '\\']).next().unwrap_or("").trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}
