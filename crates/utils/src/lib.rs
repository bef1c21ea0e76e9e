//! Small text and file helpers shared across the workspace.
//!
//! Text positions exchanged between crates are char indices (Unicode scalar values), the same
//! unit a DOM text node offset is expressed in by the host model. These helpers convert between
//! char indices and the byte indices `str` slicing needs.

pub mod io;

pub use self::io::{create_or_overwrite, read_to_string_if_exists};

/// Returns the number of chars in `text`.
#[inline]
pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// Returns the char at given char index (0-based).
pub fn char_at(text: &str, char_idx: usize) -> Option<char> {
    text.chars().nth(char_idx)
}

/// Returns the byte index of given char index, `text.len()` if it is past the end.
pub fn byte_index_for(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(byte_idx, _c)| byte_idx)
        .unwrap_or(text.len())
}

/// Returns the char index of given byte index (0-based).
///
/// `text.len()` maps to the char count, any other byte index which is not on a char
/// boundary returns `None`.
pub fn char_index_for(text: &str, byte_idx: usize) -> Option<usize> {
    if byte_idx == text.len() {
        return Some(char_count(text));
    }
    text.char_indices().enumerate().find_map(
        |(c_idx, (b_idx, _c))| {
            if byte_idx == b_idx {
                Some(c_idx)
            } else {
                None
            }
        },
    )
}

/// Returns the sub string between the char indices `start` and `end`, both clamped.
pub fn slice_chars(text: &str, start: usize, end: usize) -> &str {
    let start = byte_index_for(text, start);
    let end = byte_index_for(text, end).max(start);
    &text[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_byte_conversion() {
        let text = "「日本」 abc";
        assert_eq!(char_count(text), 8);
        assert_eq!(char_at(text, 1), Some('日'));
        assert_eq!(char_at(text, 8), None);
        assert_eq!(byte_index_for(text, 1), 3);
        assert_eq!(byte_index_for(text, 100), text.len());
        assert_eq!(char_index_for(text, 3), Some(1));
        assert_eq!(char_index_for(text, 4), None);
        assert_eq!(char_index_for(text, text.len()), Some(8));
    }

    #[test]
    fn test_slice_chars() {
        let text = "can’t stop";
        assert_eq!(slice_chars(text, 0, 5), "can’t");
        assert_eq!(slice_chars(text, 6, 42), "stop");
        assert_eq!(slice_chars(text, 4, 2), "");
    }
}
