//! Describe a layout without converting anything (`--dump-layout`).

use crate::ast::{FieldDef, LayoutDef};
use crate::transcode::TranscodeOptions;
use std::fmt;

/// Layout, framing and size arithmetic for one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutReport {
    pub layout: String,
    pub fields: Vec<FieldDef>,
    pub terminator_in: Vec<u8>,
    pub terminator_out: Vec<u8>,
    pub separator: Vec<u8>,
    /// Sum of field lengths.
    pub field_len: usize,
    /// Field length plus input terminator length.
    pub record_len: usize,
    /// `input_size / record_len`.
    pub approx_records: u64,
}

pub fn describe(layout: &LayoutDef, options: &TranscodeOptions, input_size: u64) -> LayoutReport {
    let record_len = options.input_record_len(layout);
    LayoutReport {
        layout: layout.name().to_string(),
        fields: layout.fields().to_vec(),
        terminator_in: options.terminator_in.clone(),
        terminator_out: options.terminator_out.clone(),
        separator: options.separator.clone(),
        field_len: layout.record_len(),
        record_len,
        approx_records: input_size.checked_div(record_len as u64).unwrap_or(0),
    }
}

impl fmt::Display for LayoutReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Layout")?;
        writeln!(f, "- Using struct             : {}", self.layout)?;
        for field in &self.fields {
            writeln!(f, "  * {}: {} bytes", field.name, field.len())?;
        }
        writeln!(
            f,
            "- Input record terminator  : \"{}\" (len={})",
            self.terminator_in.escape_ascii(),
            self.terminator_in.len()
        )?;
        writeln!(
            f,
            "- Output line terminator   : \"{}\" (len={})",
            self.terminator_out.escape_ascii(),
            self.terminator_out.len()
        )?;
        writeln!(f, "- Field separator          : \"{}\"", self.separator.escape_ascii())?;
        writeln!(
            f,
            "=> 1 record (input)        : {} + {} = {} bytes",
            self.field_len,
            self.terminator_in.len(),
            self.record_len
        )?;
        write!(f, "=> Approx. records in input: {}", self.approx_records)
    }
}
