//! Character-safe string helpers shared by extractors and the TSV row.

/// Longest prefix of `s` holding at most `max` characters.
///
/// Never splits a UTF-8 sequence.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Clean a string for a tab-separated row.
///
/// Tabs and newlines become spaces. When `max_len` is non-zero and the
/// result is longer, it is cut to `max_len - 3` characters plus `...`.
pub fn sanitize_tsv(s: &str, max_len: usize) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| if c == '\t' || c == '\n' { ' ' } else { c })
        .collect();
    if max_len > 0 && cleaned.chars().count() > max_len {
        let mut cut = truncate_chars(&cleaned, max_len.saturating_sub(3)).to_string();
        cut.push_str("...");
        cut
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語");
    }

    #[test]
    fn truncate_chars_returns_whole_string_when_short() {
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn sanitize_tsv_replaces_tabs_and_newlines() {
        assert_eq!(sanitize_tsv("a\tb\nc", 0), "a b c");
    }

    #[test]
    fn sanitize_tsv_truncates_with_ellipsis() {
        let out = sanitize_tsv("abcdefghij", 8);
        assert_eq!(out, "abcde...");
        assert_eq!(out.chars().count(), 8);
    }

    #[test]
    fn sanitize_tsv_keeps_exact_length_input() {
        assert_eq!(sanitize_tsv("abcdefgh", 8), "abcdefgh");
    }
}
