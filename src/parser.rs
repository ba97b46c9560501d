//! Parse layout source into [`LayoutDef`]s using PEST.

use crate::ast::{FieldDef, LayoutDef, LayoutName};
use crate::comments::strip_comments;
use pest::error::LineColLocation;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser as PestParser;
use std::fmt;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct LayoutParser;

/// Line/column (1-based) of a construct in the comment-stripped source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

impl From<&Pair<'_, Rule>> for Position {
    fn from(pair: &Pair<'_, Rule>) -> Self {
        let (line, column) = pair.as_span().start_pos().line_col();
        Position { line, column }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("no struct definition found")]
    NoLayouts,
    #[error("struct '{layout}' has no BYTE fields ({at})")]
    EmptyLayout { layout: String, at: Position },
    #[error("invalid field length {layout}.{field} = {value} ({at}); lengths must be positive integers")]
    InvalidFieldLength {
        layout: String,
        field: String,
        value: String,
        at: Position,
    },
    #[error("struct '{layout}' is too large: field {field} ({at}) overflows the record length")]
    RecordTooLarge {
        layout: String,
        field: String,
        at: Position,
    },
    #[error("{count} anonymous struct blocks found; an anonymous struct is only allowed as the single definition")]
    MultipleAnonymous { count: usize },
}

impl From<pest::error::Error<Rule>> for ConfigError {
    fn from(e: pest::error::Error<Rule>) -> Self {
        let (line, column) = match e.line_col {
            LineColLocation::Pos(pos) => pos,
            LineColLocation::Span(start, _) => start,
        };
        ConfigError::Syntax {
            line,
            column,
            message: e.variant.message().into_owned(),
        }
    }
}

/// A `struct` block as written, before the named/anonymous precedence is applied.
struct RawBlock<'a> {
    name: Option<String>,
    at: Position,
    fields: Vec<Pair<'a, Rule>>,
    extensions: Vec<String>,
}

/// Parse layout source (comments allowed) into layouts, in source order.
///
/// Named blocks win: anonymous `struct { ... }` blocks are only used when no named block
/// exists, and then only when there is exactly one of them.
pub fn parse_layouts(source: &str) -> Result<Vec<LayoutDef>, ConfigError> {
    let cleaned = strip_comments(source);
    let config = LayoutParser::parse(Rule::config, &cleaned)?
        .next()
        .ok_or(ConfigError::NoLayouts)?;

    let blocks: Vec<RawBlock> = config
        .into_inner()
        .filter(|p| p.as_rule() == Rule::layout_block)
        .map(build_block)
        .collect();

    let (named, anonymous): (Vec<_>, Vec<_>) = blocks.into_iter().partition(|b| b.name.is_some());

    if !named.is_empty() {
        if !anonymous.is_empty() {
            tracing::warn!(
                count = anonymous.len(),
                "ignoring anonymous struct block(s) next to named structs"
            );
        }
        let layouts = named
            .into_iter()
            .map(build_layout)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(count = layouts.len(), "parsed named layouts");
        return Ok(layouts);
    }

    let mut anonymous = anonymous;
    match anonymous.len() {
        0 => Err(ConfigError::NoLayouts),
        1 => {
            let block = anonymous.remove(0);
            tracing::debug!("using anonymous struct block");
            Ok(vec![build_layout(block)?])
        }
        count => Err(ConfigError::MultipleAnonymous { count }),
    }
}

fn build_block(pair: Pair<'_, Rule>) -> RawBlock<'_> {
    let at = Position::from(&pair);
    let mut name = None;
    let mut fields = Vec::new();
    let mut extensions = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::layout_name => name = Some(inner.as_str().to_string()),
            Rule::field_decl => fields.push(inner),
            Rule::ext_list => extensions = parse_ext_list(inner.as_str()),
            _ => {}
        }
    }
    RawBlock {
        name,
        at,
        fields,
        extensions,
    }
}

fn build_layout(block: RawBlock<'_>) -> Result<LayoutDef, ConfigError> {
    let name = match block.name {
        Some(n) => LayoutName::Named(n),
        None => LayoutName::Anonymous,
    };
    let mut fields = Vec::with_capacity(block.fields.len());
    let mut total: usize = 0;
    for decl in block.fields {
        let at = Position::from(&decl);
        let field = build_field(name.as_str(), decl)?;
        total = total
            .checked_add(field.len())
            .ok_or_else(|| ConfigError::RecordTooLarge {
                layout: name.as_str().to_string(),
                field: field.name.clone(),
                at,
            })?;
        fields.push(field);
    }
    let layout_label = name.as_str().to_string();
    LayoutDef::new(name, fields, block.extensions).ok_or(ConfigError::EmptyLayout {
        layout: layout_label,
        at: block.at,
    })
}

fn build_field(layout: &str, pair: Pair<'_, Rule>) -> Result<FieldDef, ConfigError> {
    let at = Position::from(&pair);
    let mut name = String::new();
    let mut len_text = "";
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::field_name => name = inner.as_str().to_string(),
            Rule::field_len => len_text = inner.as_str(),
            _ => {}
        }
    }
    let invalid = |name: String| ConfigError::InvalidFieldLength {
        layout: layout.to_string(),
        field: name,
        value: len_text.to_string(),
        at,
    };
    let len: usize = match len_text.parse() {
        Ok(n) => n,
        Err(_) => return Err(invalid(name)),
    };
    match FieldDef::new(name.clone(), len) {
        Some(field) => Ok(field),
        None => Err(invalid(name)),
    }
}

/// Normalize the free-text extension list that follows a struct's closing brace.
///
/// `"txt, .DAT ,bin;"` becomes `["txt", "dat", "bin"]`.
pub fn parse_ext_list(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in raw.split(',') {
        let t = token.trim();
        let t = t.strip_prefix('.').unwrap_or(t);
        let t = t
            .to_lowercase()
            .trim_matches(|c| matches!(c, ' ' | ';' | '\t' | '\r' | '\n'))
            .to_string();
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ext_list_variants() {
        assert_eq!(parse_ext_list("txt"), vec!["txt"]);
        assert_eq!(parse_ext_list("txt, dat, bin"), vec!["txt", "dat", "bin"]);
        assert_eq!(parse_ext_list(".txt, .dat"), vec!["txt", "dat"]);
        assert_eq!(parse_ext_list("txt, .dat, BIN"), vec!["txt", "dat", "bin"]);
        assert_eq!(parse_ext_list("txt;"), vec!["txt"]);
    }

    #[test]
    fn ext_list_blank_and_duplicates() {
        assert!(parse_ext_list("").is_empty());
        assert!(parse_ext_list(" , ,\n").is_empty());
        assert_eq!(parse_ext_list("txt, TXT, .txt"), vec!["txt"]);
    }

    #[test]
    fn syntax_error_reports_position() {
        let err = parse_layouts("struct A {\n  BYTE X[3]\n}").unwrap_err();
        match err {
            ConfigError::Syntax { line, .. } => assert_eq!(line, 3),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }
}
