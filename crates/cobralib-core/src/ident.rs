/// Sanitize a column name for use as an insert target.
///
/// Replaces every non-alphanumeric, non-underscore character with `_` and
/// prefixes an underscore when the name starts with a digit, so headers
/// taken from arbitrary source files are always legal identifiers.
pub fn sanitize_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 1);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if i == 0 && ch.is_ascii_digit() {
                out.push('_');
            }
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_clean_names_through() {
        assert_eq!(sanitize_identifier("FirstName"), "FirstName");
        assert_eq!(sanitize_identifier("name_id"), "name_id");
    }

    #[test]
    fn replaces_punctuation_and_spaces() {
        assert_eq!(sanitize_identifier("First Name"), "First_Name");
        assert_eq!(sanitize_identifier("price ($)"), "price____");
        assert_eq!(sanitize_identifier("a.b-c"), "a_b_c");
    }

    #[test]
    fn guards_leading_digits() {
        assert_eq!(sanitize_identifier("1st_col"), "_1st_col");
        assert_eq!(sanitize_identifier("2"), "_2");
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(sanitize_identifier(""), "");
    }
}
