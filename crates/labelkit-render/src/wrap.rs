//! Greedy word wrap shared by both renderers.

/// Break `text` into lines no wider than `max_width`.
///
/// Words are accumulated greedily and never split; a single word wider
/// than `max_width` gets a line of its own. `'\n'` forces a break. Runs
/// of spaces collapse to one.
pub fn wrap_text(text: &str, max_width: f64, measure: impl Fn(&str) -> f64) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }
            let candidate = format!("{line} {word}");
            if measure(&candidate) > max_width {
                lines.push(std::mem::replace(&mut line, word.to_string()));
            } else {
                line = candidate;
            }
        }
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ten units per character.
    fn measure(s: &str) -> f64 {
        s.chars().count() as f64 * 10.0
    }

    #[test]
    fn test_fits_on_one_line() {
        assert_eq!(wrap_text("hello world", 200.0, measure), ["hello world"]);
    }

    #[test]
    fn test_breaks_between_words() {
        assert_eq!(
            wrap_text("the quick brown fox", 100.0, measure),
            ["the quick", "brown fox"]
        );
    }

    #[test]
    fn test_never_splits_a_word() {
        assert_eq!(
            wrap_text("a extraordinarily b", 50.0, measure),
            ["a", "extraordinarily", "b"]
        );
    }

    #[test]
    fn test_exact_fit_stays() {
        // "abcd efgh" is exactly 90 wide.
        assert_eq!(wrap_text("abcd efgh", 90.0, measure), ["abcd efgh"]);
    }

    #[test]
    fn test_newline_is_a_hard_break() {
        assert_eq!(wrap_text("one\ntwo  three", 500.0, measure), ["one", "two three"]);
        assert_eq!(wrap_text("a\n\nb", 500.0, measure), ["a", "", "b"]);
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(wrap_text("", 100.0, measure), [""]);
    }
}
