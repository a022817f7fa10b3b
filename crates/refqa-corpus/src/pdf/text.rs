use std::sync::LazyLock;

use regex::Regex;

static LINE_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\n\r\t]+").expect("line break regex is valid"));

static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("whitespace regex is valid"));

/// Flatten a page to a single line: line breaks and tabs become `", "`,
/// then any remaining run of two or more whitespace characters collapses
/// to one space.
#[must_use]
pub fn normalize_whitespace(page: &str) -> String {
    let joined = LINE_BREAKS.replace_all(page, ", ");
    WHITESPACE_RUNS.replace_all(&joined, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn line_breaks_become_commas() {
        assert_eq!(normalize_whitespace("第一行\n第二行"), "第一行, 第二行");
        assert_eq!(normalize_whitespace("a\r\n\tb"), "a, b");
    }

    #[test]
    fn whitespace_runs_collapse() {
        assert_eq!(normalize_whitespace("a    b"), "a b");
        assert_eq!(normalize_whitespace("a \n b"), "a , b");
        assert_eq!(normalize_whitespace("全形\u{3000}\u{3000}空白"), "全形 空白");
    }

    #[test]
    fn empty_page_stays_empty() {
        assert_eq!(normalize_whitespace(""), "");
    }

    proptest! {
        #[test]
        fn output_has_no_breaks_or_double_spaces(s in "(\\PC|\\s){0,200}") {
            let out = normalize_whitespace(&s);
            prop_assert!(!out.contains(['\n', '\r', '\t']));
            prop_assert!(!out.contains("  "));
        }

        #[test]
        fn normalization_is_idempotent_without_breaks(s in "[a-z 銀行]{0,80}") {
            let once = normalize_whitespace(&s);
            prop_assert_eq!(normalize_whitespace(&once), once.clone());
        }
    }
}
