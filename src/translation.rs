//! Placeholder handling for compiled statements.
//!
//! The builder compiles every statement with neutral `?` markers. Before
//! dispatch they are rewritten to the active backend's style (`$N` for
//! PostgreSQL; SQLite accepts `?` as-is). The same scanner powers the
//! diagnostic preview, which splices literal values into the text.
//!
//! The scanner skips placeholders inside quoted strings, line and block
//! comments, and dollar-quoted blocks via a lightweight state machine; it
//! may miss edge cases in complex SQL (e.g. procedural bodies).

use std::borrow::Cow;

use crate::types::SqlValue;

/// Placeholder style expected by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// PostgreSQL-style numbered placeholders like `$1`.
    Postgres,
    /// SQLite-style `?` placeholders.
    Sqlite,
}

/// Rewrite neutral `?` markers into the backend's placeholder style.
///
/// Bare markers are numbered left to right; markers that already carry a
/// number (`?3`) keep it. Returns a borrowed `Cow` when nothing changes.
#[must_use]
pub fn finalize_placeholders(sql: &str, style: PlaceholderStyle) -> Cow<'_, str> {
    if style == PlaceholderStyle::Sqlite {
        return Cow::Borrowed(sql);
    }

    let markers = scan_markers(sql);
    if markers.is_empty() {
        return Cow::Borrowed(sql);
    }

    let mut out = String::with_capacity(sql.len() + markers.len());
    let mut cursor = 0;
    let mut next_number = 1;
    for marker in &markers {
        out.push_str(&sql[cursor..marker.start]);
        out.push('$');
        match marker.digits {
            Some(ref digits) => out.push_str(digits),
            None => {
                out.push_str(&next_number.to_string());
                next_number += 1;
            }
        }
        cursor = marker.end;
    }
    out.push_str(&sql[cursor..]);
    Cow::Owned(out)
}

/// Replace each `?` marker with its quoted literal value, in bind order.
///
/// Informational only: the rendering performs no escaping and must never
/// be re-executed. Markers beyond the supplied values are left in place.
#[must_use]
pub fn substitute_placeholders(sql: &str, values: &[SqlValue]) -> String {
    let markers = scan_markers(sql);
    let mut out = String::with_capacity(sql.len());
    let mut cursor = 0;
    for (idx, marker) in markers.iter().enumerate() {
        out.push_str(&sql[cursor..marker.start]);
        match values.get(idx) {
            Some(value) => {
                out.push('\'');
                out.push_str(&value.to_string());
                out.push('\'');
            }
            None => out.push_str(&sql[marker.start..marker.end]),
        }
        cursor = marker.end;
    }
    out.push_str(&sql[cursor..]);
    out
}

struct Marker {
    start: usize,
    end: usize,
    digits: Option<String>,
}

enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

/// Locate `?` markers outside literals, comments, and dollar quotes.
fn scan_markers(sql: &str) -> Vec<Marker> {
    let bytes = sql.as_bytes();
    let mut markers = Vec::new();
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'-' if bytes.get(idx + 1) == Some(&b'-') => {
                    state = State::LineComment;
                    idx += 1;
                }
                b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b'$' => {
                    if let Some((tag, advance)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = advance;
                    }
                }
                b'?' => {
                    let (end, digits) = match scan_digits(bytes, idx + 1) {
                        Some((digits_end, digits)) => (digits_end, Some(digits.to_string())),
                        None => (idx + 1, None),
                    };
                    markers.push(Marker {
                        start: idx,
                        end,
                        digits,
                    });
                    idx = end - 1;
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if b == b'/' && bytes.get(idx + 1) == Some(&b'*') {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if b == b'*' && bytes.get(idx + 1) == Some(&b'/') {
                    if depth == 1 {
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    let advance = tag.len();
                    state = State::Normal;
                    idx += advance;
                }
            }
        }

        idx += 1;
    }

    markers
}

fn scan_digits(bytes: &[u8], start: usize) -> Option<(usize, &str)> {
    let mut idx = start;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    if idx == start {
        None
    } else {
        std::str::from_utf8(&bytes[start..idx])
            .ok()
            .map(|digits| (idx, digits))
    }
}

fn try_start_dollar_quote(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let mut idx = start + 1;
    while idx < bytes.len() && bytes[idx] != b'$' {
        let b = bytes[idx];
        if !(b.is_ascii_alphanumeric() || b == b'_') {
            return None;
        }
        idx += 1;
    }

    if idx < bytes.len() && bytes[idx] == b'$' {
        let tag = String::from_utf8(bytes[start + 1..idx].to_vec()).ok()?;
        Some((tag, idx))
    } else {
        None
    }
}

fn matches_tag(bytes: &[u8], idx: usize, tag: &str) -> bool {
    let end = idx + 1 + tag.len();
    end < bytes.len()
        && bytes[idx + 1..=end].starts_with(tag.as_bytes())
        && bytes.get(end) == Some(&b'$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_bare_markers_for_postgres() {
        let sql = "SELECT * FROM t WHERE (a=?) AND (b IN (?,?))";
        let res = finalize_placeholders(sql, PlaceholderStyle::Postgres);
        assert_eq!(res, "SELECT * FROM t WHERE (a=$1) AND (b IN ($2,$3))");
    }

    #[test]
    fn keeps_existing_numbers() {
        let sql = "SELECT * FROM t WHERE a = ?2 AND b = ?1";
        let res = finalize_placeholders(sql, PlaceholderStyle::Postgres);
        assert_eq!(res, "SELECT * FROM t WHERE a = $2 AND b = $1");
    }

    #[test]
    fn sqlite_style_is_untouched() {
        let sql = "SELECT * FROM t WHERE a = ?";
        let res = finalize_placeholders(sql, PlaceholderStyle::Sqlite);
        assert!(matches!(res, Cow::Borrowed(_)));
        assert_eq!(res, sql);
    }

    #[test]
    fn skips_inside_literals_and_comments() {
        let sql = "SELECT '?', \"a?b\" -- ?\n/* ? */ FROM t WHERE a = ?";
        let res = finalize_placeholders(sql, PlaceholderStyle::Postgres);
        assert_eq!(res, "SELECT '?', \"a?b\" -- ?\n/* ? */ FROM t WHERE a = $1");
    }

    #[test]
    fn skips_dollar_quoted_blocks() {
        let sql = "$fn$ where a = ? $fn$ WHERE b = ?";
        let res = finalize_placeholders(sql, PlaceholderStyle::Postgres);
        assert_eq!(res, "$fn$ where a = ? $fn$ WHERE b = $1");
    }

    #[test]
    fn substitutes_values_in_bind_order() {
        let sql = "UPDATE t SET name=? WHERE (id=?)";
        let rendered = substitute_placeholders(
            sql,
            &[SqlValue::Text("X".into()), SqlValue::Int(1)],
        );
        assert_eq!(rendered, "UPDATE t SET name='X' WHERE (id='1')");
    }

    #[test]
    fn leaves_markers_without_values() {
        let sql = "SELECT * FROM t WHERE (a=?) AND (b=?)";
        let rendered = substitute_placeholders(sql, &[SqlValue::Int(5)]);
        assert_eq!(rendered, "SELECT * FROM t WHERE (a='5') AND (b=?)");
    }
}
