//! Decides where a word starts and where it ends.
//!
//! Two primitives are exposed:
//!
//! - [`is_boundary_char`], which tells whether a single char terminates a word span.
//! - [`match_special_token`], which recognizes the multi-char spans (hyphenated words,
//!   contractions, numbers with units, URLs and emails) that must be treated as one word even
//!   though they contain boundary chars.
//!
//! All the offsets are char indices.

mod token;

use once_cell::sync::Lazy;
use regex::Regex;

pub use self::token::{
    match_special_token, special_tokens, Direction, SpecialToken, TokenKind, TokenMatch,
};

/// Unicode punctuation and separator categories.
static DELIMITER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{P}\p{Z}]$").expect("valid delimiter regex"));

/// Quotes and brackets which always delimit a word, CJK forms included.
const EXTRA_DELIMITERS: &[char] = &[
    '「', '」', '『', '』', '“', '”', '‘', '’', '<', '>', '"', '\'', '.', ',', ';', ':', '?',
    '!', '(', ')', '[', ']', '{', '}',
];

/// Returns `true` if `ch` terminates a word.
///
/// `None` stands for the start or the end of the text, which is always a boundary.
pub fn is_boundary_char(ch: Option<char>) -> bool {
    let Some(ch) = ch else {
        return true;
    };

    if ch.is_whitespace() || EXTRA_DELIMITERS.contains(&ch) {
        return true;
    }

    let mut buf = [0u8; 4];
    DELIMITER.is_match(ch.encode_utf8(&mut buf))
}

/// Returns `true` if `ch` can be part of a word.
#[inline]
pub fn is_word_char(ch: char) -> bool {
    !is_boundary_char(Some(ch))
}

/// Lowercases and trims `word`, the key every mark is stored under.
pub fn normalize_word(word: &str) -> String {
    word.trim().to_lowercase()
}
