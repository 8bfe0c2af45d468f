//! String utilities for the domain layer.

/// Truncate a string to at most `max_len` bytes, appending an ellipsis.
///
/// Cuts on a UTF-8 character boundary so the result is always valid.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len.saturating_sub(3);
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

/// Collapse runs of whitespace (including newlines) into single spaces.
///
/// Used for one-line previews of agent output in logs and progress lines.
pub fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        // 'é' is two bytes; cutting at byte 4 would split it
        let s = "abcé and more";
        let out = truncate(s, 7);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 7);
    }

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("a\n\n  b\tc "), "a b c");
    }
}
