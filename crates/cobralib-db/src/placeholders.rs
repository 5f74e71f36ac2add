//! Placeholder normalization.
//!
//! Callers always write `?` placeholders; adapters rewrite them into the
//! engine's native style before execution. The scanner skips string
//! literals (including PostgreSQL `$tag$ … $tag$` dollar quoting), quoted
//! identifiers, and comments so a literal `?` in SQL text is never
//! miscounted. Quotes inside string literals must be doubled (`''`);
//! MySQL's optional backslash escapes are not recognized.

use cobralib_core::{Error, Result};

/// Native placeholder style of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStyle {
    /// `?` — MySQL and SQLite.
    Question,
    /// `$1`, `$2`, … — PostgreSQL.
    Dollar,
    /// `@P1`, `@P2`, … — SQL Server (TDS).
    AtP,
}

/// Rewrite `?` placeholders into `style`, returning the rewritten SQL and
/// the placeholder count.
pub fn rewrite(sql: &str, style: ParamStyle) -> (String, usize) {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len() + 8);
    let mut count = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        match chars[i] {
            '?' => {
                count += 1;
                match style {
                    ParamStyle::Question => out.push('?'),
                    ParamStyle::Dollar => {
                        out.push('$');
                        out.push_str(&count.to_string());
                    }
                    ParamStyle::AtP => {
                        out.push_str("@P");
                        out.push_str(&count.to_string());
                    }
                }
                i += 1;
            }
            '\'' => i = copy_quoted(&chars, i, &mut out),
            '"' => i = copy_delimited(&chars, i, '"', &mut out),
            '`' => i = copy_delimited(&chars, i, '`', &mut out),
            '[' => i = copy_delimited(&chars, i, ']', &mut out),
            '-' if chars.get(i + 1) == Some(&'-') => i = copy_line_comment(&chars, i, &mut out),
            '/' if chars.get(i + 1) == Some(&'*') => i = copy_block_comment(&chars, i, &mut out),
            '$' => i = copy_dollar_quoted(&chars, i, &mut out),
            ch => {
                out.push(ch);
                i += 1;
            }
        }
    }

    (out, count)
}

/// Count the `?` placeholders in a statement.
pub fn count(sql: &str) -> usize {
    rewrite(sql, ParamStyle::Question).1
}

/// Fail with a statement error when the placeholder count does not match
/// the parameter count.
pub fn check_params(sql: &str, n_params: usize) -> Result<()> {
    let n_placeholders = count(sql);
    if n_placeholders != n_params {
        return Err(Error::Statement(format!(
            "statement has {n_placeholders} placeholder(s) but {n_params} parameter(s) were given"
        )));
    }
    Ok(())
}

/// Single-quoted literal with `''` doubling.
fn copy_quoted(chars: &[char], start: usize, out: &mut String) -> usize {
    out.push('\'');
    let mut i = start + 1;
    while i < chars.len() {
        out.push(chars[i]);
        if chars[i] == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    i
}

fn copy_delimited(chars: &[char], start: usize, close: char, out: &mut String) -> usize {
    out.push(chars[start]);
    let mut i = start + 1;
    while i < chars.len() {
        out.push(chars[i]);
        if chars[i] == close {
            return i + 1;
        }
        i += 1;
    }
    i
}

fn copy_line_comment(chars: &[char], start: usize, out: &mut String) -> usize {
    let mut i = start;
    while i < chars.len() {
        out.push(chars[i]);
        if chars[i] == '\n' {
            return i + 1;
        }
        i += 1;
    }
    i
}

fn copy_block_comment(chars: &[char], start: usize, out: &mut String) -> usize {
    out.push(chars[start]);
    out.push(chars[start + 1]);
    let mut i = start + 2;
    while i < chars.len() {
        out.push(chars[i]);
        if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
            out.push('/');
            return i + 2;
        }
        i += 1;
    }
    i
}

/// PostgreSQL `$tag$ … $tag$` dollar quoting. A `$` that does not open a
/// dollar quote is copied through unchanged.
fn copy_dollar_quoted(chars: &[char], start: usize, out: &mut String) -> usize {
    let tag_end = match scan_dollar_tag(chars, start) {
        Some(end) => end,
        None => {
            out.push('$');
            return start + 1;
        }
    };
    let tag: String = chars[start..tag_end].iter().collect();
    out.push_str(&tag);

    let mut i = tag_end;
    while i < chars.len() {
        if chars[i] == '$' {
            if let Some(end) = scan_dollar_tag(chars, i) {
                if chars[i..end].iter().collect::<String>() == tag {
                    out.push_str(&tag);
                    return end;
                }
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    i
}

/// Index one past the closing `$` of a `$tag$` opener at `start`, if the
/// characters in between form a valid tag.
fn scan_dollar_tag(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < chars.len() {
        let ch = chars[i];
        if ch == '$' {
            return Some(i + 1);
        }
        if !(ch.is_ascii_alphanumeric() || ch == '_') {
            return None;
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_to_dollar_numbers() {
        let (sql, n) = rewrite(
            "SELECT * FROM names WHERE first = ? AND last = ?",
            ParamStyle::Dollar,
        );
        assert_eq!(sql, "SELECT * FROM names WHERE first = $1 AND last = $2");
        assert_eq!(n, 2);
    }

    #[test]
    fn rewrites_to_at_p_numbers() {
        let (sql, n) = rewrite("INSERT INTO t (a, b) VALUES (?, ?)", ParamStyle::AtP);
        assert_eq!(sql, "INSERT INTO t (a, b) VALUES (@P1, @P2)");
        assert_eq!(n, 2);
    }

    #[test]
    fn question_style_passes_through() {
        let (sql, n) = rewrite("UPDATE t SET a = ? WHERE b = ?", ParamStyle::Question);
        assert_eq!(sql, "UPDATE t SET a = ? WHERE b = ?");
        assert_eq!(n, 2);
    }

    #[test]
    fn ignores_question_marks_in_literals() {
        let (sql, n) = rewrite(
            "SELECT 'what?' AS q, \"huh?\" FROM t WHERE a = ?",
            ParamStyle::Dollar,
        );
        assert_eq!(sql, "SELECT 'what?' AS q, \"huh?\" FROM t WHERE a = $1");
        assert_eq!(n, 1);
    }

    #[test]
    fn handles_escaped_single_quotes() {
        let (_, n) = rewrite("SELECT 'it''s a ?' WHERE a = ?", ParamStyle::Question);
        assert_eq!(n, 1);
    }

    #[test]
    fn ignores_comments() {
        let sql = "SELECT a FROM t -- what?\nWHERE b = ? /* really? */ AND c = ?";
        let (rewritten, n) = rewrite(sql, ParamStyle::Dollar);
        assert_eq!(n, 2);
        assert!(rewritten.contains("b = $1"));
        assert!(rewritten.contains("c = $2"));
        assert!(rewritten.contains("-- what?"));
    }

    #[test]
    fn ignores_bracketed_and_backticked_identifiers() {
        let (_, n) = rewrite(
            "SELECT [weird?col], `odd?col` FROM t WHERE a = ?",
            ParamStyle::AtP,
        );
        assert_eq!(n, 1);
    }

    #[test]
    fn ignores_dollar_quoted_strings() {
        let (sql, n) = rewrite("SELECT $$it's a ?$$ WHERE a = ?", ParamStyle::Dollar);
        assert_eq!(n, 1);
        assert!(sql.contains("$$it's a ?$$"));
        assert!(sql.ends_with("a = $1"));
    }

    #[test]
    fn ignores_tagged_dollar_quotes() {
        let body = "$body$ SELECT 1 WHERE x = '?'; $inner$ ? $inner$ $body$";
        let (rewritten, n) = rewrite(&format!("DO {body} WHERE a = ?"), ParamStyle::Dollar);
        assert_eq!(n, 1);
        assert!(rewritten.contains(body));
        assert!(rewritten.ends_with("a = $1"));
    }

    #[test]
    fn lone_dollar_signs_pass_through() {
        let (sql, n) = rewrite("SELECT amount$ FROM t WHERE a = ?", ParamStyle::AtP);
        assert_eq!(sql, "SELECT amount$ FROM t WHERE a = @P1");
        assert_eq!(n, 1);
    }

    #[test]
    fn check_params_reports_mismatch() {
        assert!(check_params("SELECT ?", 1).is_ok());
        let err = check_params("SELECT ?, ?", 1).unwrap_err();
        assert!(err.to_string().contains("2 placeholder(s)"));
        assert!(check_params("SELECT 1", 0).is_ok());
    }
}
