//! Reading layout files from disk and resolving relative paths.

use encoding_rs::SHIFT_JIS;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is neither UTF-8 nor Shift_JIS text", .path.display())]
    Undecodable { path: PathBuf },
}

/// Decode layout file bytes: UTF-8 (BOM removed), then Shift_JIS (code page 932).
pub fn decode_layout_text(bytes: &[u8]) -> Option<String> {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(body) {
        return Some(text.to_string());
    }
    SHIFT_JIS
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}

/// Read a layout file, trying the encodings of [`decode_layout_text`] in order.
pub fn read_layout_file(path: impl AsRef<Path>) -> Result<String, LoadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_layout_text(&bytes).ok_or_else(|| LoadError::Undecodable {
        path: path.to_path_buf(),
    })
}

/// Resolve a user-supplied path.
///
/// Absolute paths are returned as is. Relative paths are looked up next to the running
/// executable, then in the current directory; when neither exists the path is returned
/// unchanged so the caller reports the open error.
pub fn resolve_external_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let cwd = std::env::current_dir().ok();
    for base in exe_dir.iter().chain(cwd.iter()) {
        let candidate = base.join(path);
        if candidate.exists() {
            return candidate;
        }
    }
    path.to_path_buf()
}
