//! Pick the layout for an input file.
//!
//! Precedence: explicit name, then the input file's extension, then the single layout that has
//! no extension mapping at all.

use crate::ast::LayoutDef;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("struct '{name}' not found; available: {}", .available.join(", "))]
    UnknownName { name: String, available: Vec<String> },
    #[error("input file has no extension and {count} structs are defined; specify the struct explicitly")]
    NoExtension { count: usize },
    #[error("no struct is mapped to extension '.{extension}'; specify the struct explicitly or add the extension to a definition; available: {}", .available.join(", "))]
    NoMatch {
        extension: String,
        available: Vec<String>,
    },
    #[error("extension '.{extension}' matches several structs: {}; specify the struct explicitly", .candidates.join(", "))]
    Ambiguous {
        extension: String,
        candidates: Vec<String>,
    },
}

/// Lowercased extension of `file_name` without the dot; empty when there is none.
pub fn file_extension(file_name: impl AsRef<Path>) -> String {
    file_name
        .as_ref()
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn names<'a>(layouts: impl IntoIterator<Item = &'a LayoutDef>) -> Vec<String> {
    layouts.into_iter().map(|l| l.name().to_string()).collect()
}

/// Select one layout by explicit name or by the extension of `file_name`.
pub fn select_layout<'a>(
    layouts: &'a [LayoutDef],
    explicit: Option<&str>,
    file_name: impl AsRef<Path>,
) -> Result<&'a LayoutDef, SelectionError> {
    if let Some(name) = explicit {
        return layouts
            .iter()
            .find(|l| l.name() == name)
            .ok_or_else(|| SelectionError::UnknownName {
                name: name.to_string(),
                available: names(layouts),
            });
    }

    let ext = file_extension(&file_name);
    if ext.is_empty() {
        return match layouts {
            [only] => Ok(only),
            _ => Err(SelectionError::NoExtension {
                count: layouts.len(),
            }),
        };
    }

    let matching: Vec<&LayoutDef> = layouts.iter().filter(|l| l.has_extension(&ext)).collect();
    match matching.as_slice() {
        [only] => {
            tracing::debug!(layout = only.name(), extension = %ext, "selected struct by extension");
            Ok(*only)
        }
        [] => {
            let unmapped: Vec<&LayoutDef> =
                layouts.iter().filter(|l| l.extensions().is_empty()).collect();
            match unmapped.as_slice() {
                [only] => {
                    tracing::debug!(layout = only.name(), extension = %ext, "falling back to struct without extension mapping");
                    Ok(*only)
                }
                _ => Err(SelectionError::NoMatch {
                    extension: ext,
                    available: names(layouts),
                }),
            }
        }
        _ => Err(SelectionError::Ambiguous {
            extension: ext,
            candidates: names(matching.iter().copied()),
        }),
    }
}
