//! Read/write statement classification.
//!
//! Reads are fetched and returned as rows; everything else is executed
//! for its side effect and reports `rows_affected` only. Writes carrying
//! a `RETURNING` clause produce rows and are classified as reads.

/// Whether a statement produces a result set.
pub fn is_read_statement(sql: &str) -> bool {
    let keyword = first_keyword(sql);
    if matches!(
        keyword.as_str(),
        "SELECT" | "SHOW" | "DESCRIBE" | "DESC" | "EXPLAIN" | "PRAGMA" | "WITH" | "VALUES" | "TABLE"
    ) {
        return true;
    }
    has_returning_clause(sql)
}

fn first_keyword(sql: &str) -> String {
    let mut rest = sql.trim_start();
    // Skip leading comments.
    loop {
        if let Some(stripped) = rest.strip_prefix("--") {
            rest = match stripped.find('\n') {
                Some(idx) => stripped[idx + 1..].trim_start(),
                None => "",
            };
        } else if let Some(stripped) = rest.strip_prefix("/*") {
            rest = match stripped.find("*/") {
                Some(idx) => stripped[idx + 2..].trim_start(),
                None => "",
            };
        } else {
            break;
        }
    }
    rest.split(|ch: char| ch.is_whitespace() || ch == '(')
        .next()
        .unwrap_or("")
        .to_ascii_uppercase()
}

/// Look for a bare `RETURNING` keyword outside literals, quoted
/// identifiers, and comments.
fn has_returning_clause(sql: &str) -> bool {
    let chars: Vec<char> = sql.chars().collect();
    let mut bare = String::with_capacity(sql.len());
    let mut i = 0usize;

    while i < chars.len() {
        match chars[i] {
            quote @ ('\'' | '"' | '`') => {
                i += 1;
                while i < chars.len() {
                    if chars[i] == quote {
                        // Doubled quote is an escaped quote.
                        if quote == '\'' && chars.get(i + 1) == Some(&'\'') {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
                bare.push(' ');
                i += 1;
            }
            '[' => {
                while i < chars.len() && chars[i] != ']' {
                    i += 1;
                }
                bare.push(' ');
                i += 1;
            }
            '-' if chars.get(i + 1) == Some(&'-') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
            }
            ch => {
                bare.push(ch);
                i += 1;
            }
        }
    }

    bare.split(|ch: char| !ch.is_ascii_alphanumeric() && ch != '_')
        .any(|token| token.eq_ignore_ascii_case("RETURNING"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_reads() {
        assert!(is_read_statement("SELECT * FROM t"));
        assert!(is_read_statement("  select 1"));
        assert!(is_read_statement("SHOW DATABASES;"));
        assert!(is_read_statement("PRAGMA table_info(t)"));
        assert!(is_read_statement("WITH x AS (SELECT 1) SELECT * FROM x"));
    }

    #[test]
    fn classifies_writes() {
        assert!(!is_read_statement("INSERT INTO t VALUES (1)"));
        assert!(!is_read_statement("UPDATE t SET a = 1"));
        assert!(!is_read_statement("DELETE FROM t"));
        assert!(!is_read_statement("CREATE TABLE t (a INT)"));
        assert!(!is_read_statement("USE other_db"));
    }

    #[test]
    fn skips_leading_comments() {
        assert!(is_read_statement("-- fetch\nSELECT 1"));
        assert!(is_read_statement("/* fetch */ SELECT 1"));
        assert!(!is_read_statement("/* create */ CREATE TABLE t (a INT)"));
    }

    #[test]
    fn returning_writes_are_fetched() {
        assert!(is_read_statement(
            "INSERT INTO t (a) VALUES (1) RETURNING id"
        ));
        assert!(is_read_statement("UPDATE t SET a = 1 returning a"));
        assert!(is_read_statement("DELETE FROM t WHERE a = 1 RETURNING *"));
    }

    #[test]
    fn returning_inside_literals_does_not_count() {
        assert!(!is_read_statement(
            "INSERT INTO t (a) VALUES ('not RETURNING')"
        ));
        assert!(!is_read_statement("UPDATE t SET a = 1 -- RETURNING a"));
        assert!(!is_read_statement(
            "INSERT INTO t (returning_date) VALUES (1)"
        ));
    }
}
