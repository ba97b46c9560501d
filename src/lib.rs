//! # fixedrec: fixed-length records to delimited text
//!
//! Converts a binary file made of repeated fixed-length records into delimited text. The
//! record layout comes from a small struct DSL; fields are opaque byte windows and are never
//! decoded into typed values.
//!
//! ## Layout DSL
//!
//! ```text
//! /* order records */
//! struct Order {
//!   BYTE Id[5];
//!   BYTE Qty[3];   // zero padded
//! } ord, .dat;
//!
//! struct Raw {
//!   BYTE Payload[16];
//! }
//! ```
//!
//! - `BYTE Name[len];` declares one field; fields are laid out in declaration order
//! - the optional list after `}` maps file extensions to the struct (case-insensitive, dot optional)
//! - `//` and `/* */` comments are allowed anywhere
//! - a single anonymous `struct { ... }` is accepted when no named struct exists
//!
//! ## Pipeline
//!
//! [`parse_layouts`] → [`select_layout`] → [`transcode`], with terminators, separators and
//! rendering resolved by [`bytespec`].
//!
//! ```no_run
//! use fixedrec::{LayoutSet, TranscodeOptions, transcode};
//!
//! let layouts = LayoutSet::parse("struct R { BYTE A[5]; BYTE B[3]; } bin;")?;
//! let layout = layouts.select(None, "input.bin")?;
//! let input = std::fs::File::open("input.bin")?;
//! let output = std::fs::File::create("out.tsv")?;
//! let stats = transcode(input, output, layout, &TranscodeOptions::default())?;
//! println!("{} records", stats.records);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod ast;
pub mod bytespec;
pub mod comments;
pub mod dump;
pub mod loader;
pub mod parser;
pub mod select;
pub mod transcode;

pub use ast::{FieldDef, LayoutDef, LayoutName, LayoutSet, ANONYMOUS_LAYOUT_NAME};
pub use bytespec::{
    resolve_byte_spec, resolve_separator, resolve_terminator, visualize, visualize_str,
    EscapeMode, SpecError, Terminator,
};
pub use comments::strip_comments;
pub use dump::{describe, LayoutReport};
pub use loader::{read_layout_file, resolve_external_path, LoadError};
pub use parser::{parse_ext_list, parse_layouts, ConfigError, Position};
pub use select::{select_layout, SelectionError};
pub use transcode::{
    transcode, FramingError, FramingErrorKind, FramingPolicy, RunStats, TranscodeError,
    TranscodeOptions, Transcoder, Warning,
};
