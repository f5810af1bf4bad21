//! Character-indexed string helpers.
//!
//! Offsets throughout the engine count Unicode scalar values. Caret motion
//! steps over grapheme clusters and word bounds via `unicode-segmentation`,
//! so these helpers convert between char offsets and byte offsets.

use unicode_segmentation::UnicodeSegmentation;

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of the `chars`-th character, clamped to the string length.
pub fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(i, _)| i)
}

fn char_offset(s: &str, bytes: usize) -> usize {
    s[..bytes].chars().count()
}

/// Split at a char offset.
pub fn split_at_char(s: &str, at: usize) -> (&str, &str) {
    s.split_at(byte_offset(s, at))
}

/// Substring between two char offsets (clamped, order-insensitive).
pub fn slice_chars(s: &str, from: usize, to: usize) -> &str {
    let (from, to) = if from <= to { (from, to) } else { (to, from) };
    &s[byte_offset(s, from)..byte_offset(s, to)]
}

pub fn insert_at_char(s: &str, at: usize, insert: &str) -> String {
    let (head, tail) = split_at_char(s, at);
    let mut out = String::with_capacity(s.len() + insert.len());
    out.push_str(head);
    out.push_str(insert);
    out.push_str(tail);
    out
}

pub fn remove_chars(s: &str, from: usize, to: usize) -> String {
    let (from, to) = if from <= to { (from, to) } else { (to, from) };
    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..byte_offset(s, from)]);
    out.push_str(&s[byte_offset(s, to)..]);
    out
}

/// Char offset of the grapheme boundary after `offset`.
pub fn next_grapheme(s: &str, offset: usize) -> Option<usize> {
    let start = byte_offset(s, offset);
    s[start..]
        .grapheme_indices(true)
        .next()
        .map(|(i, g)| char_offset(s, start + i + g.len()))
}

/// Char offset of the grapheme boundary before `offset`.
pub fn previous_grapheme(s: &str, offset: usize) -> Option<usize> {
    let end = byte_offset(s, offset);
    s[..end]
        .grapheme_indices(true)
        .next_back()
        .map(|(i, _)| char_offset(s, i))
}

/// Char offset at the end of the next word after `offset` (skipping
/// whitespace and punctuation first).
pub fn next_word(s: &str, offset: usize) -> Option<usize> {
    let start = byte_offset(s, offset);
    if start >= s.len() {
        return None;
    }
    let mut end = s.len();
    for (i, word) in s[start..].split_word_bound_indices() {
        if word.chars().any(char::is_alphanumeric) {
            end = start + i + word.len();
            break;
        }
    }
    Some(char_offset(s, end))
}

/// Char offset at the start of the word before `offset`.
pub fn previous_word(s: &str, offset: usize) -> Option<usize> {
    let end = byte_offset(s, offset);
    if end == 0 {
        return None;
    }
    let mut start = 0;
    for (i, word) in s[..end].split_word_bound_indices().rev() {
        if word.chars().any(char::is_alphanumeric) {
            start = i;
            break;
        }
    }
    Some(char_offset(s, start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn char_offsets_are_not_bytes() {
        assert_eq!(char_len("héllo"), 5);
        assert_eq!(split_at_char("héllo", 2), ("hé", "llo"));
        assert_eq!(slice_chars("héllo", 4, 1), "éll");
        assert_eq!(insert_at_char("héllo", 9, "!"), "héllo!");
        assert_eq!(remove_chars("héllo", 1, 3), "hlo");
    }

    #[test]
    fn graphemes_step_over_combining_marks() {
        // e + combining acute accent
        let s = "ae\u{301}b";
        assert_eq!(next_grapheme(s, 1), Some(3));
        assert_eq!(previous_grapheme(s, 3), Some(1));
        assert_eq!(next_grapheme(s, 4), None);
        assert_eq!(previous_grapheme(s, 0), None);
    }

    #[rstest]
    #[case("hello brave world", 0, Some(5))]
    #[case("hello brave world", 5, Some(11))]
    #[case("hello, world", 5, Some(12))]
    #[case("hello", 5, None)]
    fn next_word_bounds(#[case] s: &str, #[case] from: usize, #[case] expected: Option<usize>) {
        assert_eq!(next_word(s, from), expected);
    }

    #[rstest]
    #[case("hello brave world", 17, Some(12))]
    #[case("hello brave world", 12, Some(6))]
    #[case("hello, ", 7, Some(0))]
    #[case("hello", 0, None)]
    fn previous_word_bounds(#[case] s: &str, #[case] from: usize, #[case] expected: Option<usize>) {
        assert_eq!(previous_word(s, from), expected);
    }
}
