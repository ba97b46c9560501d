//! Byte specs: turn command-line tokens into byte sequences and render field bytes for display.
//!
//! Token forms, tried in order:
//!
//! - `hex:1f2a`: even-length hexadecimal, decoded to raw bytes
//! - anything with a backslash: string-literal escapes (`\t`, `\n`, `\x1f`, `\u00e9`, ...),
//!   result encoded as UTF-8; if the escapes don't decode the token is taken verbatim
//! - otherwise: the token's UTF-8 bytes
//!
//! Terminator keywords (`crlf`, `lf`, `cr`, `none`, case-insensitive) are resolved first by
//! [`Terminator`].

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Marker that introduces a raw hexadecimal byte literal.
pub const HEX_MARKER: &str = "hex:";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("hex spec {token:?} has no digits")]
    EmptyHex { token: String },
    #[error("hex spec {token:?} must have an even number of digits")]
    OddHexLength { token: String },
    #[error("hex spec {token:?} cannot be decoded: {reason}")]
    InvalidHex { token: String, reason: String },
    #[error("unknown escape mode {0:?} (expected none or hex)")]
    UnknownEscapeMode(String),
    #[error("separator must be at least one byte")]
    EmptySeparator,
}

/// Resolve a byte-spec token (`hex:..`, escaped text, or plain text) into bytes.
pub fn resolve_byte_spec(token: &str) -> Result<Vec<u8>, SpecError> {
    if let Some(digits) = token.strip_prefix(HEX_MARKER) {
        let digits = digits.trim();
        if digits.is_empty() {
            return Err(SpecError::EmptyHex {
                token: token.to_string(),
            });
        }
        return hex::decode(digits).map_err(|e| match e {
            hex::FromHexError::OddLength => SpecError::OddHexLength {
                token: token.to_string(),
            },
            other => SpecError::InvalidHex {
                token: token.to_string(),
                reason: other.to_string(),
            },
        });
    }
    if token.contains('\\') {
        if let Some(decoded) = unescape(token) {
            return Ok(decoded.into_bytes());
        }
    }
    Ok(token.as_bytes().to_vec())
}

/// Resolve a separator token; the result must be non-empty.
pub fn resolve_separator(token: &str) -> Result<Vec<u8>, SpecError> {
    let bytes = resolve_byte_spec(token)?;
    if bytes.is_empty() {
        return Err(SpecError::EmptySeparator);
    }
    Ok(bytes)
}

/// Decode string-literal backslash escapes. `None` when an escape is malformed.
fn unescape(s: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let esc = chars.next()?;
        match esc {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut value = esc.to_digit(8)?;
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value)?);
            }
            'x' => out.push(hex_escape(&mut chars, 2)?),
            'u' => out.push(hex_escape(&mut chars, 4)?),
            'U' => out.push(hex_escape(&mut chars, 8)?),
            // Named escapes (`\N{...}`) are not resolved.
            'N' => return None,
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    Some(out)
}

fn hex_escape(chars: &mut impl Iterator<Item = char>, digits: usize) -> Option<char> {
    let mut value: u32 = 0;
    for _ in 0..digits {
        value = value.checked_mul(16)? + chars.next()?.to_digit(16)?;
    }
    char::from_u32(value)
}

/// Record terminator: a closed set of keywords plus arbitrary bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminator {
    CrLf,
    Lf,
    Cr,
    None,
    Bytes(Vec<u8>),
}

impl Terminator {
    /// Resolve a keyword (case-insensitive) or fall back to [`resolve_byte_spec`].
    pub fn parse(token: &str) -> Result<Self, SpecError> {
        Ok(match token.to_ascii_lowercase().as_str() {
            "crlf" => Terminator::CrLf,
            "lf" => Terminator::Lf,
            "cr" => Terminator::Cr,
            "none" => Terminator::None,
            _ => Terminator::Bytes(resolve_byte_spec(token)?),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Terminator::CrLf => b"\r\n",
            Terminator::Lf => b"\n",
            Terminator::Cr => b"\r",
            Terminator::None => b"",
            Terminator::Bytes(b) => b,
        }
    }
}

impl FromStr for Terminator {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Terminator::parse(s)
    }
}

/// Resolve a terminator token straight to bytes.
pub fn resolve_terminator(token: &str) -> Result<Vec<u8>, SpecError> {
    Ok(Terminator::parse(token)?.as_bytes().to_vec())
}

/// How field bytes are rendered in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EscapeMode {
    /// Bytes pass through unchanged.
    #[default]
    None,
    /// Every byte as two lowercase hex digits.
    Hex,
}

impl FromStr for EscapeMode {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(EscapeMode::None),
            "hex" => Ok(EscapeMode::Hex),
            other => Err(SpecError::UnknownEscapeMode(other.to_string())),
        }
    }
}

impl fmt::Display for EscapeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EscapeMode::None => "none",
            EscapeMode::Hex => "hex",
        })
    }
}

/// Render `bytes` for output.
///
/// Hex without a prefix gives space-separated pairs (`00 1f`); with a prefix every byte is
/// prefixed and nothing separates them (`%00%1f`).
pub fn visualize<'a>(bytes: &'a [u8], mode: EscapeMode, prefix: &str) -> Cow<'a, [u8]> {
    match mode {
        EscapeMode::None => Cow::Borrowed(bytes),
        EscapeMode::Hex => {
            let digits = hex::encode(bytes);
            let mut out = Vec::with_capacity(digits.len() + bytes.len() * prefix.len().max(1));
            for (i, pair) in digits.as_bytes().chunks(2).enumerate() {
                if prefix.is_empty() {
                    if i > 0 {
                        out.push(b' ');
                    }
                } else {
                    out.extend_from_slice(prefix.as_bytes());
                }
                out.extend_from_slice(pair);
            }
            Cow::Owned(out)
        }
    }
}

/// [`visualize`] with the mode given as text (`none` / `hex`).
pub fn visualize_str<'a>(
    bytes: &'a [u8],
    mode: &str,
    prefix: &str,
) -> Result<Cow<'a, [u8]>, SpecError> {
    Ok(visualize(bytes, mode.parse()?, prefix))
}
