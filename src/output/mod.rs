// Output formatting: terminal display of analysis results.

pub mod terminal;

/// Truncate a string to at most `max_chars` characters, appending "…" if
/// truncated.
///
/// Counts characters, not bytes, so multi-byte text (emoji, Cyrillic) is
/// never split mid-character.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let mut chars = text.char_indices();
    match chars.nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}…", &text[..cut]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_chars("hello", 5), "hello");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn long_text_gets_ellipsis_on_char_boundary() {
        assert_eq!(truncate_chars("hello world", 5), "hello…");
        assert_eq!(truncate_chars("привет мир", 6), "привет…");
        assert_eq!(truncate_chars("🚀🚀🚀", 1), "🚀…");
    }
}
