//! Raw query placeholder rewriting.

use super::writer::SqlWriter;
use crate::dialect::{Capabilities, Dialect};
use crate::error::{Error, Result};
use crate::query::{QueryKind, Raw};
use crate::value::Value;

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Index just past the quoted section opened at `start`; a doubled quote
/// character is an escaped quote, and with `backslash` so is `\'`
fn skip_quoted(bytes: &[u8], start: usize, backslash: bool) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        if backslash && bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Length of a Postgres dollar-quote tag (`$$` or `$tag$`) starting at `start`
fn dollar_tag(bytes: &[u8], start: usize) -> Option<usize> {
    let rest = &bytes[start + 1..];
    if rest.first().is_some_and(|b| !is_name_start(*b) && *b != b'$') {
        return None;
    }
    let len = rest.iter().position(|b| !is_name_char(*b))?;
    (rest[len] == b'$').then_some(len + 2)
}

/// Whether the byte before `i` continues an identifier or number
fn follows_word(bytes: &[u8], i: usize) -> bool {
    i > 0 && (is_name_char(bytes[i - 1]) || bytes[i - 1] == b'$')
}

fn skip_until(bytes: &[u8], start: usize, end: &[u8]) -> usize {
    bytes[start..]
        .windows(end.len())
        .position(|w| w == end)
        .map_or(bytes.len(), |p| start + p + end.len())
}

/// Rewrite `:name` references into the dialect's placeholders.
///
/// Quoted strings and identifiers, comments and `::` casts are copied
/// through untouched, following the dialect's lexical rules: backslash
/// escapes and `#` comments on MySQL, dollar-quoted and `E'...'` strings on
/// Postgres. A name used twice is bound twice.
pub(crate) fn render(caps: &Capabilities, raw: &Raw) -> Result<(String, Vec<Value>)> {
    let dialect = caps.dialect();
    let mut w = SqlWriter::new(caps, QueryKind::Raw);
    let text = raw.sql();
    let bytes = text.as_bytes();
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' if dialect == Dialect::MySql => i = skip_quoted(bytes, i, true),
            b'\'' if dialect == Dialect::Postgres
                && i > 0
                && matches!(bytes[i - 1], b'E' | b'e')
                && !follows_word(bytes, i - 1) =>
            {
                i = skip_quoted(bytes, i, true)
            }
            b'\'' | b'"' | b'`' => i = skip_quoted(bytes, i, false),
            b'#' if dialect == Dialect::MySql => i = skip_until(bytes, i, b"\n"),
            b'$' if dialect == Dialect::Postgres && !follows_word(bytes, i) => match dollar_tag(bytes, i) {
                Some(len) => i = skip_until(bytes, i + len, &bytes[i..i + len]),
                None => i += 1,
            },
            b'-' if bytes.get(i + 1) == Some(&b'-') => i = skip_until(bytes, i, b"\n"),
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_until(bytes, i + 2, b"*/"),
            b':' if bytes.get(i + 1) == Some(&b':') => i += 2,
            b':' if bytes.get(i + 1).copied().is_some_and(is_name_start) => {
                let start = i + 1;
                let end = bytes[start..]
                    .iter()
                    .position(|b| !is_name_char(*b))
                    .map_or(bytes.len(), |p| start + p);
                let name = &text[start..end];
                let value = raw.param(name).ok_or_else(|| Error::UnboundParameter {
                    name: name.to_string(),
                })?;
                w.push(&text[copied..i]);
                w.param(value.clone());
                copied = end;
                i = end;
            }
            _ => i += 1,
        }
    }
    w.push(&text[copied..]);
    Ok(w.finish())
}
