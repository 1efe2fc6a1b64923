use std::borrow::Cow;

mod lexer;

use lexer::{Context, dollar_delimiter_at, placeholder_digits_at, starts_with_at};

use crate::types::RowValues;

/// Native placeholder style of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// PostgreSQL-style placeholders like `$1`, which is also the canonical form.
    Postgres,
    /// SQLite-style placeholders like `?1`.
    Sqlite,
}

impl PlaceholderStyle {
    fn marker(self) -> char {
        match self {
            PlaceholderStyle::Postgres => '$',
            PlaceholderStyle::Sqlite => '?',
        }
    }
}

/// Rewrite canonical `$N` placeholders into the backend's native marker.
///
/// The rewrite is textual: each `$N` becomes `<marker>N` with the same number, left to right, so
/// argument positions are never reordered. A lightweight state machine leaves quoted strings,
/// quoted identifiers, comments and dollar-quoted bodies alone, but this is not a SQL parser.
/// It is meant for the fixed statements a job queue issues, not for arbitrary user-supplied SQL.
///
/// Returns a borrowed `Cow` when no changes are needed.
#[must_use]
pub fn translate_placeholders(sql: &str, target: PlaceholderStyle) -> Cow<'_, str> {
    if target == PlaceholderStyle::Postgres {
        return Cow::Borrowed(sql);
    }

    // Only allocated once the first placeholder is rewritten.
    let mut out: Option<String> = None;
    let mut ctx = Context::Code;
    let mut idx = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        // bytes [idx, idx + skip) are consumed this step and copied unless `replaced`
        let mut skip = 1;
        let mut replaced = false;
        match &mut ctx {
            Context::Code => match bytes[idx] {
                b'\'' => ctx = Context::Literal,
                b'"' => ctx = Context::QuotedIdent,
                b'-' if starts_with_at(bytes, idx, b"--") => ctx = Context::LineComment,
                b'/' if starts_with_at(bytes, idx, b"/*") => {
                    ctx = Context::BlockComment { depth: 1 };
                    skip = 2;
                }
                b'$' => {
                    if let Some(delimiter) = dollar_delimiter_at(sql, idx) {
                        skip = delimiter.len();
                        ctx = Context::DollarBody { delimiter };
                    } else if let Some(digits) = placeholder_digits_at(sql, idx) {
                        let buf = out.get_or_insert_with(|| sql[..idx].to_string());
                        buf.push(target.marker());
                        buf.push_str(digits);
                        skip = 1 + digits.len();
                        replaced = true;
                    }
                }
                _ => skip = char_width(bytes, idx),
            },
            Context::Literal | Context::QuotedIdent => {
                let quote = if ctx == Context::Literal { b'\'' } else { b'"' };
                if bytes[idx] == quote {
                    if bytes.get(idx + 1) == Some(&quote) {
                        skip = 2; // doubled quote stays inside
                    } else {
                        ctx = Context::Code;
                    }
                } else {
                    skip = char_width(bytes, idx);
                }
            }
            Context::LineComment => {
                if bytes[idx] == b'\n' {
                    ctx = Context::Code;
                } else {
                    skip = char_width(bytes, idx);
                }
            }
            Context::BlockComment { depth } => {
                if starts_with_at(bytes, idx, b"/*") {
                    *depth += 1;
                    skip = 2;
                } else if starts_with_at(bytes, idx, b"*/") {
                    skip = 2;
                    if *depth == 1 {
                        ctx = Context::Code;
                    } else {
                        *depth -= 1;
                    }
                } else {
                    skip = char_width(bytes, idx);
                }
            }
            Context::DollarBody { delimiter } => {
                if starts_with_at(bytes, idx, delimiter.as_bytes()) {
                    skip = delimiter.len();
                    ctx = Context::Code;
                } else {
                    skip = char_width(bytes, idx);
                }
            }
        }

        if let Some(buf) = out.as_mut()
            && !replaced
        {
            buf.push_str(&sql[idx..idx + skip]);
        }
        idx += skip;
    }

    match out {
        Some(buf) => Cow::Owned(buf),
        None => Cow::Borrowed(sql),
    }
}

// Placeholder and quote bytes are ASCII, so stepping whole UTF-8 sequences keeps
// multi-byte text intact without changing where markers are found.
fn char_width(bytes: &[u8], idx: usize) -> usize {
    match bytes.get(idx) {
        Some(b) if *b >= 0xF0 => 4,
        Some(b) if *b >= 0xE0 => 3,
        Some(b) if *b >= 0xC0 => 2,
        _ => 1,
    }
}

/// Lay out canonical 1-indexed arguments for a backend whose native argument array is 0-indexed.
///
/// Slot 0 is a `Null` filler that is never bound; slots `1..=n` hold the original values in order,
/// so native slot `i` lines up with placeholder `i`. Values are copied unchanged.
#[must_use]
pub fn align_args(args: &[RowValues]) -> Vec<RowValues> {
    let mut aligned = Vec::with_capacity(args.len() + 1);
    aligned.push(RowValues::Null);
    aligned.extend_from_slice(args);
    aligned
}
