//! Working-directory derivation from a registered binary path.
//!
//! Registry entries store the launch command line the way the platform
//! wrote it: possibly quoted, possibly with trailing arguments, possibly
//! with backslash separators. A managed instance changes into the directory
//! containing its registered executable before running.

use std::path::{Path, PathBuf};

/// Extracts the executable path from a registered launch command line:
/// a leading quoted segment wins; otherwise the raw trimmed value.
fn strip_quoting(raw: &str) -> &str {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_prefix('"') {
        match rest.find('"') {
            Some(end) => &rest[..end],
            None => rest,
        }
    } else {
        raw
    }
}

/// Derives the directory containing the registered executable.
///
/// Separators are normalized to `/` before taking the parent; a bare file
/// name derives `.`.
pub(crate) fn derive_workdir(binary_path: &str) -> PathBuf {
    let normalized = strip_quoting(binary_path).replace('\\', "/");
    match Path::new(&normalized).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
