/// Greedy word wrap measured in characters.
///
/// Continuation lines are prefixed with `hanging`; the first line is not.
/// Whitespace runs collapse to single spaces. A `width` of 0 disables wrapping.
/// Words longer than the width get a line of their own rather than being split.
pub fn wrap(text: &str, width: usize, hanging: &str) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return vec![];
    }
    if width == 0 {
        return vec![words.join(" ")];
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for word in words {
        let word_w = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_width = word_w;
        } else if current_width + 1 + word_w > width {
            lines.push(std::mem::take(&mut current));
            current.push_str(hanging);
            current.push_str(word);
            current_width = hanging.chars().count() + word_w;
        } else {
            current.push(' ');
            current.push_str(word);
            current_width += 1 + word_w;
        }
    }
    lines.push(current);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_has_no_lines() {
        assert!(wrap("   ", 40, "").is_empty());
    }

    #[test]
    fn test_short_text_is_one_line() {
        assert_eq!(wrap("Built the thing", 40, "  "), vec!["Built the thing"]);
    }

    #[test]
    fn test_wraps_at_width_with_hanging_indent() {
        let lines = wrap("alpha beta gamma delta", 11, "  ");
        assert_eq!(lines, vec!["alpha beta", "  gamma", "  delta"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 11));
    }

    #[test]
    fn test_long_word_gets_own_line() {
        let lines = wrap("a supercalifragilistic b", 8, "");
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn test_zero_width_disables_wrapping() {
        assert_eq!(wrap("one  two\nthree", 0, "  "), vec!["one two three"]);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        let lines = wrap("café naïve résumé", 10, "");
        assert_eq!(lines, vec!["café naïve", "résumé"]);
    }
}
