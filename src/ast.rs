//! Layout model for the struct DSL: fields, layouts and the per-run layout set.

use crate::parser::{parse_layouts, ConfigError};
use crate::select::{select_layout, SelectionError};
use std::num::NonZeroUsize;
use std::path::Path;

/// Name given to the single `struct { ... }` block accepted when no named block exists.
pub const ANONYMOUS_LAYOUT_NAME: &str = "_anonymous_";

/// How a layout was named in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutName {
    Named(String),
    /// Legacy `struct { ... }` form; only accepted as the sole definition.
    Anonymous,
}

impl LayoutName {
    pub fn as_str(&self) -> &str {
        match self {
            LayoutName::Named(name) => name,
            LayoutName::Anonymous => ANONYMOUS_LAYOUT_NAME,
        }
    }
}

/// One `BYTE Name[len];` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub len: NonZeroUsize,
}

impl FieldDef {
    /// Returns `None` for a zero length.
    pub fn new(name: impl Into<String>, len: usize) -> Option<Self> {
        Some(FieldDef {
            name: name.into(),
            len: NonZeroUsize::new(len)?,
        })
    }

    pub fn len(&self) -> usize {
        self.len.get()
    }
}

/// A fixed-length record layout: ordered fields plus the file extensions mapped to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutDef {
    name: LayoutName,
    fields: Vec<FieldDef>,
    extensions: Vec<String>,
    record_len: usize,
}

impl LayoutDef {
    /// Build a layout. Returns `None` when `fields` is empty or the lengths overflow `usize`.
    ///
    /// Extensions are expected already normalized (see [`parse_ext_list`](crate::parser::parse_ext_list));
    /// duplicates are dropped keeping the first occurrence.
    pub fn new(name: LayoutName, fields: Vec<FieldDef>, extensions: Vec<String>) -> Option<Self> {
        if fields.is_empty() {
            return None;
        }
        let record_len = fields
            .iter()
            .try_fold(0usize, |total, f| total.checked_add(f.len()))?;
        let mut unique: Vec<String> = Vec::with_capacity(extensions.len());
        for ext in extensions {
            if !unique.contains(&ext) {
                unique.push(ext);
            }
        }
        Some(LayoutDef {
            name,
            fields,
            extensions: unique,
            record_len,
        })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn layout_name(&self) -> &LayoutName {
        &self.name
    }

    pub fn is_anonymous(&self) -> bool {
        self.name == LayoutName::Anonymous
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Lowercase extensions without the leading dot.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn has_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e == ext)
    }

    /// Sum of all field lengths (the field block of one record, terminator excluded).
    pub fn record_len(&self) -> usize {
        self.record_len
    }
}

/// Layouts parsed from one config file, in source order. Read-only for the rest of a run.
#[derive(Debug, Clone)]
pub struct LayoutSet {
    layouts: Vec<LayoutDef>,
}

impl LayoutSet {
    /// Strip comments and parse layout source.
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        Ok(LayoutSet {
            layouts: parse_layouts(source)?,
        })
    }

    pub fn from_layouts(layouts: Vec<LayoutDef>) -> Self {
        LayoutSet { layouts }
    }

    pub fn get(&self, name: &str) -> Option<&LayoutDef> {
        self.layouts.iter().find(|l| l.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.layouts.iter().map(LayoutDef::name).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LayoutDef> {
        self.layouts.iter()
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    pub fn as_slice(&self) -> &[LayoutDef] {
        &self.layouts
    }

    /// Pick the layout for `file_name`, or the one named `explicit`.
    pub fn select(
        &self,
        explicit: Option<&str>,
        file_name: impl AsRef<Path>,
    ) -> Result<&LayoutDef, SelectionError> {
        select_layout(&self.layouts, explicit, file_name)
    }
}

impl<'a> IntoIterator for &'a LayoutSet {
    type Item = &'a LayoutDef;
    type IntoIter = std::slice::Iter<'a, LayoutDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.layouts.iter()
    }
}
