//! Byte-level helpers for the placeholder rewriter.

/// Where the rewriter currently is within the SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Context {
    Code,
    /// `'...'`
    Literal,
    /// `"..."`
    QuotedIdent,
    LineComment,
    BlockComment { depth: u32 },
    /// Inside a dollar-quoted body; holds the full `$tag$` delimiter.
    DollarBody { delimiter: String },
}

pub(super) fn starts_with_at(bytes: &[u8], idx: usize, pat: &[u8]) -> bool {
    bytes.get(idx..idx + pat.len()) == Some(pat)
}

/// The `$tag$` delimiter opening at `idx`, if any.
///
/// Tags follow identifier rules and may not start with a digit, so `$1$2` stays two placeholders.
pub(super) fn dollar_delimiter_at(sql: &str, idx: usize) -> Option<String> {
    let rest = sql.get(idx + 1..)?;
    let tag = &rest[..rest.find('$')?];
    let valid = tag.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
        && !tag.starts_with(|c: char| c.is_ascii_digit());
    valid.then(|| format!("${tag}$"))
}

/// The digits of a `$N` placeholder whose `$` sits at `idx`.
pub(super) fn placeholder_digits_at(sql: &str, idx: usize) -> Option<&str> {
    let rest = sql.get(idx + 1..)?;
    let len = rest.bytes().take_while(u8::is_ascii_digit).count();
    (len > 0).then(|| &rest[..len])
}
