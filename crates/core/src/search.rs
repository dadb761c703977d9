//! Search term helpers shared by the site search and the search log.

/// Longest search term kept.
pub const MAX_TERM_LENGTH: usize = 255;

/// Trim, collapse whitespace and cap the length of a search term.
///
/// ```
/// use faqbase_core::search::normalize_term;
///
/// assert_eq!(normalize_term("  reset   password "), "reset password");
/// ```
#[must_use]
pub fn normalize_term(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_TERM_LENGTH)
        .collect::<String>()
        .trim_end()
        .to_owned()
}

/// Build a SQL `LIKE`/`ILIKE` pattern matching `term` anywhere.
///
/// `%`, `_` and `\` in the term are escaped with a backslash, the default
/// escape character in PostgreSQL.
///
/// ```
/// use faqbase_core::search::like_pattern;
///
/// assert_eq!(like_pattern("100%"), "%100\\%%");
/// ```
#[must_use]
pub fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

/// Build a prefix pattern for autocompletion.
#[must_use]
pub fn prefix_pattern(prefix: &str) -> String {
    let mut pattern = like_pattern(prefix);
    pattern.remove(0);
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_term(" \t\n "), "");
    }

    #[test]
    fn test_normalize_caps_length() {
        assert_eq!(normalize_term(&"a".repeat(400)).len(), MAX_TERM_LENGTH);
    }

    #[test]
    fn test_cut_on_space_is_trimmed() {
        let term = normalize_term(&format!("{} tail", "a".repeat(MAX_TERM_LENGTH - 1)));
        assert_eq!(term, "a".repeat(MAX_TERM_LENGTH - 1));
    }

    #[test]
    fn test_like_escapes_wildcards() {
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c:\\tmp"), "%c:\\\\tmp%");
        assert_eq!(like_pattern(""), "%%");
    }

    #[test]
    fn test_prefix_pattern() {
        assert_eq!(prefix_pattern("pass"), "pass%");
    }
}
