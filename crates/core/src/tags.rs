//! Tag list parsing.

use std::collections::HashSet;

/// Longest tag name stored.
pub const MAX_TAG_LENGTH: usize = 255;

/// Split a comma separated tag input into clean tag names.
///
/// Each name is trimmed, inner whitespace collapsed to single spaces and
/// truncated to [`MAX_TAG_LENGTH`] characters. Empty names are dropped and
/// duplicates (ignoring case) keep their first spelling.
///
/// ```
/// use faqbase_core::tags::parse_tag_list;
///
/// assert_eq!(
///     parse_tag_list(" Rust , web  server,,rust"),
///     vec!["Rust".to_string(), "web server".to_string()]
/// );
/// ```
#[must_use]
pub fn parse_tag_list(input: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    input
        .split(',')
        .map(|raw| {
            raw.split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .chars()
                .take(MAX_TAG_LENGTH)
                .collect::<String>()
                .trim_end()
                .to_owned()
        })
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.to_lowercase()))
        .collect()
}

/// Join tag names back into the editable form.
#[must_use]
pub fn join_tag_list<S: AsRef<str>>(tags: &[S]) -> String {
    tags.iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupes_ignoring_case() {
        assert_eq!(parse_tag_list("Login, LOGIN, login "), vec!["Login"]);
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(parse_tag_list("two\t factor\nauth"), vec!["two factor auth"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_tag_list("").is_empty());
        assert!(parse_tag_list(" , ,, ").is_empty());
    }

    #[test]
    fn test_long_tags_are_truncated() {
        let long = "é".repeat(300);
        let tags = parse_tag_list(&long);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags.first().map(|t| t.chars().count()), Some(MAX_TAG_LENGTH));
    }

    #[test]
    fn test_cut_on_space_is_trimmed() {
        let input = format!("{} tail, {}", "a".repeat(254), "a".repeat(254));
        let tags = parse_tag_list(&input);
        assert_eq!(tags, vec!["a".repeat(254)]);
    }

    #[test]
    fn test_join_round_trip() {
        let tags = parse_tag_list("a, b ,c");
        assert_eq!(join_tag_list(&tags), "a, b, c");
    }
}
