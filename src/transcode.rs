//! Record transcoding: stream fixed-length records plus terminators from the input, check the
//! framing, slice fields, render them and write one delimited line per record.
//!
//! Each input record is `F` field bytes (the layout's [`record_len`](LayoutDef::record_len))
//! followed by `T` terminator bytes. The loop per record:
//!
//! 1. read `F` bytes; none means end of input, fewer means a truncated tail (warned, dropped)
//! 2. read `T` bytes and compare with the expected terminator; a short read or mismatch is a
//!    [`FramingError`] which aborts in [`FramingPolicy::Strict`] and is counted as a warning in
//!    [`FramingPolicy::Lenient`]
//! 3. slice the block by field lengths, render each field, join with the separator and append
//!    the output terminator
//!
//! The output terminator is always the configured one, whatever terminator was actually read.

use crate::ast::LayoutDef;
use crate::bytespec::{visualize, EscapeMode, SpecError};
use std::fmt;
use std::io::{self, Read, Write};

/// What to do when a record terminator is missing or wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramingPolicy {
    /// Abort the run at the first framing error.
    #[default]
    Strict,
    /// Warn, count, and keep going.
    Lenient,
}

/// Resolved parameters for one run.
#[derive(Debug, Clone)]
pub struct TranscodeOptions {
    pub terminator_in: Vec<u8>,
    pub terminator_out: Vec<u8>,
    pub separator: Vec<u8>,
    pub escape: EscapeMode,
    /// Per-byte prefix for [`EscapeMode::Hex`]; empty means space-separated pairs.
    pub prefix: String,
    pub policy: FramingPolicy,
    /// Stop after this many records.
    pub max_records: Option<usize>,
    /// Names written as a header line before the first record.
    pub header: Option<Vec<String>>,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        TranscodeOptions {
            terminator_in: b"\r\n".to_vec(),
            terminator_out: b"\r\n".to_vec(),
            separator: b"\t".to_vec(),
            escape: EscapeMode::None,
            prefix: String::new(),
            policy: FramingPolicy::Strict,
            max_records: None,
            header: None,
        }
    }
}

impl TranscodeOptions {
    /// Bytes one input record occupies: fields plus terminator (saturating).
    pub fn input_record_len(&self, layout: &LayoutDef) -> usize {
        layout.record_len().saturating_add(self.terminator_in.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramingErrorKind {
    /// Input ended inside the terminator.
    TerminatorTruncated { got: Vec<u8>, expected: Vec<u8> },
    TerminatorMismatch { got: Vec<u8>, expected: Vec<u8> },
}

/// Bad record terminator; `record` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramingError {
    pub record: usize,
    pub kind: FramingErrorKind,
}

impl fmt::Display for FramingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FramingErrorKind::TerminatorTruncated { got, expected } => write!(
                f,
                "terminator missing/truncated at record {}: got {} of {} bytes (\"{}\")",
                self.record,
                got.len(),
                expected.len(),
                got.escape_ascii()
            ),
            FramingErrorKind::TerminatorMismatch { got, expected } => write!(
                f,
                "terminator mismatch at record {}: got \"{}\" expected \"{}\"",
                self.record,
                got.escape_ascii(),
                expected.escape_ascii()
            ),
        }
    }
}

impl std::error::Error for FramingError {}

/// Non-fatal conditions collected during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Input size is not a whole number of records.
    InputSizeMisaligned { size: u64, record_len: usize },
    /// Final field block was short; it was dropped.
    TruncatedTail {
        record: usize,
        got: usize,
        expected: usize,
    },
    /// Framing error tolerated under [`FramingPolicy::Lenient`].
    Framing(FramingError),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::InputSizeMisaligned { size, record_len } => write!(
                f,
                "input size {} bytes is not a multiple of the record size {}; the tail may be truncated or terminators may not match",
                size, record_len
            ),
            Warning::TruncatedTail {
                record,
                got,
                expected,
            } => write!(
                f,
                "truncated tail at record {}: dropping {} bytes (expected {})",
                record, got, expected
            ),
            Warning::Framing(e) => fmt::Display::fmt(e, f),
        }
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub records: usize,
    pub warnings: Vec<Warning>,
}

impl RunStats {
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("IO: {0}")]
    Io(#[from] io::Error),
    #[error("framing: {0}")]
    Framing(#[from] FramingError),
    #[error(transparent)]
    Spec(#[from] SpecError),
}

/// Converts records of one layout with fixed options.
#[derive(Debug, Clone, Copy)]
pub struct Transcoder<'a> {
    layout: &'a LayoutDef,
    options: &'a TranscodeOptions,
}

impl<'a> Transcoder<'a> {
    pub fn new(layout: &'a LayoutDef, options: &'a TranscodeOptions) -> Result<Self, TranscodeError> {
        if options.separator.is_empty() {
            return Err(SpecError::EmptySeparator.into());
        }
        Ok(Transcoder { layout, options })
    }

    pub fn layout(&self) -> &LayoutDef {
        self.layout
    }

    /// Advisory check of the total input size against the record size.
    pub fn check_input_size(&self, size: u64) -> Option<Warning> {
        let record_len = self.options.input_record_len(self.layout);
        if record_len > 0 && size % record_len as u64 != 0 {
            Some(Warning::InputSizeMisaligned { size, record_len })
        } else {
            None
        }
    }

    /// Run to completion. `input_size`, when known, enables the up-front alignment warning.
    ///
    /// In strict mode a framing error returns `Err` after flushing the records already written.
    pub fn run<R: Read, W: Write>(
        &self,
        mut input: R,
        mut output: W,
        input_size: Option<u64>,
    ) -> Result<RunStats, TranscodeError> {
        let opts = self.options;
        let mut stats = RunStats::default();

        if let Some(warning) = input_size.and_then(|size| self.check_input_size(size)) {
            stats.warn(warning);
        }

        if let Some(names) = &opts.header {
            let mut line = Vec::new();
            for (i, name) in names.iter().enumerate() {
                if i > 0 {
                    line.extend_from_slice(&opts.separator);
                }
                line.extend_from_slice(name.as_bytes());
            }
            line.extend_from_slice(&opts.terminator_out);
            output.write_all(&line)?;
        }

        let field_len = self.layout.record_len();
        let mut block = Vec::new();
        block
            .try_reserve_exact(field_len)
            .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
        block.resize(field_len, 0u8);
        let mut terminator = vec![0u8; opts.terminator_in.len()];
        let mut line = Vec::new();

        loop {
            if opts.max_records.is_some_and(|max| stats.records >= max) {
                break;
            }
            let record = stats.records + 1;

            let n = read_up_to(&mut input, &mut block)?;
            if n == 0 {
                break;
            }
            if n < field_len {
                stats.warn(Warning::TruncatedTail {
                    record,
                    got: n,
                    expected: field_len,
                });
                break;
            }

            if !terminator.is_empty() {
                if let Err(e) = self.read_terminator(&mut input, &mut terminator, record)? {
                    match opts.policy {
                        FramingPolicy::Strict => {
                            output.flush()?;
                            return Err(e.into());
                        }
                        FramingPolicy::Lenient => stats.warn(Warning::Framing(e)),
                    }
                }
            }

            line.clear();
            self.render_record(&block, &mut line);
            output.write_all(&line)?;
            stats.records += 1;
        }

        output.flush()?;
        tracing::debug!(
            records = stats.records,
            warnings = stats.warning_count(),
            layout = self.layout.name(),
            "transcode finished"
        );
        Ok(stats)
    }

    /// Read and check one terminator. The outer `Result` is I/O, the inner one framing.
    fn read_terminator<R: Read>(
        &self,
        input: &mut R,
        buf: &mut [u8],
        record: usize,
    ) -> io::Result<Result<(), FramingError>> {
        let expected = &self.options.terminator_in;
        let n = read_up_to(input, buf)?;
        let kind = if n < expected.len() {
            FramingErrorKind::TerminatorTruncated {
                got: buf[..n].to_vec(),
                expected: expected.clone(),
            }
        } else if buf[..] != expected[..] {
            FramingErrorKind::TerminatorMismatch {
                got: buf.to_vec(),
                expected: expected.clone(),
            }
        } else {
            return Ok(Ok(()));
        };
        Ok(Err(FramingError { record, kind }))
    }

    fn render_record(&self, block: &[u8], line: &mut Vec<u8>) {
        let opts = self.options;
        let mut pos = 0;
        for (i, field) in self.layout.fields().iter().enumerate() {
            if i > 0 {
                line.extend_from_slice(&opts.separator);
            }
            let end = pos + field.len();
            line.extend_from_slice(&visualize(&block[pos..end], opts.escape, &opts.prefix));
            pos = end;
        }
        line.extend_from_slice(&opts.terminator_out);
    }
}

/// Convert every record of `input` into `output` using `layout`.
pub fn transcode<R: Read, W: Write>(
    input: R,
    output: W,
    layout: &LayoutDef,
    options: &TranscodeOptions,
) -> Result<RunStats, TranscodeError> {
    Transcoder::new(layout, options)?.run(input, output, None)
}

/// Fill `buf` as far as the reader allows; returns the number of bytes read.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
