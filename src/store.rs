//! INI-style shortcut store.
//!
//! One section per shortcut, one `text` field per section:
//!
//! ```text
//! [ctrl+alt+e]
//! text = hello world
//! ```
//!
//! Values escape backslash, newline, carriage return and tab so multi-line
//! expansions survive the flat file. Lines starting with `;` or `#` are
//! comments. The whole file is rewritten on every registry mutation; reads
//! preserve file order.

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, line_ending, multispace0, not_line_ending, space0},
    combinator::{all_consuming, eof, map, opt, recognize},
    error::{context, VerboseError, VerboseErrorKind},
    multi::many0,
    sequence::{delimited, tuple},
    IResult,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::errors::StoreError;

#[derive(Debug, Error)]
#[error("parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    fn from_verbose(full: &str, err: VerboseError<&str>) -> Self {
        let (message, remainder) = match err.errors.first() {
            Some((input, VerboseErrorKind::Context(ctx))) => {
                (format!("expected {ctx}"), *input)
            }
            Some((input, VerboseErrorKind::Char(c))) => (format!("expected '{c}'"), *input),
            Some((input, VerboseErrorKind::Nom(kind))) => {
                (format!("invalid syntax ({kind:?})"), *input)
            }
            None => ("unknown parse error".to_string(), ""),
        };
        let (line, column) = position_of(full, remainder);
        ParseError {
            message,
            line,
            column,
        }
    }
}

fn position_of(full: &str, remainder: &str) -> (usize, usize) {
    let offset = full.len().saturating_sub(remainder.len());
    let consumed = &full[..offset];
    let line = consumed.matches('\n').count() + 1;
    let column = consumed.rsplit('\n').next().map_or(0, str::len) + 1;
    (line, column)
}

type PResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

fn comment(input: &str) -> PResult<&str> {
    recognize(tuple((
        space0,
        alt((char(';'), char('#'))),
        not_line_ending,
        opt(line_ending),
    )))(input)
}

fn blank(input: &str) -> PResult<&str> {
    recognize(tuple((space0, line_ending)))(input)
}

fn junk(input: &str) -> PResult<()> {
    map(many0(alt((comment, blank))), |_| ())(input)
}

fn field(input: &str) -> PResult<(String, String)> {
    context("field", |input| {
        let (input, key) =
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)?;
        let (input, _) = space0(input)?;
        let (input, _) = char('=')(input)?;
        let (input, _) = space0(input)?;
        let (input, value) = not_line_ending(input)?;
        let (input, _) = alt((line_ending, eof))(input)?;
        let (input, _) = junk(input)?;
        Ok((input, (key.to_string(), unescape(value))))
    })(input)
}

fn section(input: &str) -> PResult<(String, Vec<(String, String)>)> {
    context("section", |input| {
        let (input, name) = delimited(
            char('['),
            take_while1(|c| c != ']' && c != '\n' && c != '\r'),
            char(']'),
        )(input)?;
        let (input, _) = space0(input)?;
        let (input, _) = alt((line_ending, eof))(input)?;
        let (input, _) = junk(input)?;
        let (input, fields) = many0(field)(input)?;
        Ok((input, (name.trim().to_string(), fields)))
    })(input)
}

fn sections(input: &str) -> PResult<Vec<(String, Vec<(String, String)>)>> {
    let (input, _) = junk(input)?;
    let (input, parsed) = many0(section)(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, parsed))
}

/// Parse the store text into ordered (shortcut, text) pairs. Duplicate
/// `text` fields within a section resolve last-wins; a section without a
/// `text` field is an error. Duplicate sections are passed through — the
/// registry's own validation decides their fate.
pub fn parse_store(input: &str) -> Result<Vec<(String, String)>, ParseError> {
    let parsed = match all_consuming(sections)(input) {
        Ok((_, parsed)) => parsed,
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
            return Err(ParseError::from_verbose(input, e))
        }
        Err(nom::Err::Incomplete(_)) => {
            return Err(ParseError {
                message: "unexpected end of input".to_string(),
                line: 0,
                column: 0,
            })
        }
    };

    let mut pairs = Vec::with_capacity(parsed.len());
    for (name, fields) in parsed {
        let text = fields
            .iter()
            .rev()
            .find(|(key, _)| key == "text")
            .map(|(_, value)| value.clone());
        match text {
            Some(text) => pairs.push((name, text)),
            None => {
                return Err(ParseError {
                    message: format!("section '{name}' has no text field"),
                    line: 0,
                    column: 0,
                })
            }
        }
    }
    Ok(pairs)
}

pub fn render_store(entries: &[(&str, &str)]) -> String {
    let mut out = String::new();
    for (key, text) in entries {
        out.push_str(&format!("[{key}]\ntext = {}\n\n", escape(text)));
    }
    out
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Whole-file persistence for the registry. Reading reports a missing file
/// distinctly so startup can treat it as "no entries yet"; writing always
/// replaces the entire file, UTF-8 encoded.
#[derive(Debug, Clone)]
pub struct ShortcutStore {
    path: PathBuf,
}

impl ShortcutStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ordered (shortcut, text) pairs as they appear in the file.
    pub fn read(&self) -> Result<Vec<(String, String)>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(self.path.clone()))
            }
            Err(e) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        Ok(parse_store(&raw)?)
    }

    /// Total replacement of the store contents, not a merge.
    pub fn write(&self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                    path: self.path.clone(),
                    source: e,
                })?;
            }
        }
        fs::write(&self.path, render_store(entries)).map_err(|e| StoreError::Io {
            path: self.path.clone(),
            source: e,
        })
    }
}
