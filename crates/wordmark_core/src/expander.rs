//! Snaps a selection range to the edges of the word it touches.

use boundary::{
    is_boundary_char, match_special_token, normalize_word, special_tokens, Direction,
};
use dom::{Document, DomError, Range};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpandError {
    #[error("failed to move the range boundary: {0}")]
    Boundary(#[from] DomError),
    #[error("the selection holds no word")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// The expanded copy of the selection range.
    pub range: Range,
    /// Normalized text of `range`.
    pub word: String,
}

/// Expands `range` to whole words, the input range is not modified.
///
/// Only boundary points inside text nodes move, a point between the children of an element
/// is kept as is.
///
/// A selection made of boundary chars only, e.g. a space, holds no word unless it lies inside
/// a special token such as the apostrophe of `can't`.
pub fn expand(document: &Document, range: &Range) -> Result<Expansion, ExpandError> {
    let selected = document.range_text(range)?;
    if selected.chars().all(|c| is_boundary_char(Some(c)))
        && !is_inside_special_token(document, range)?
    {
        return Err(ExpandError::Empty);
    }

    let (start, end) = (range.start(), range.end());

    let start_offset = match document.node(start.node)?.text() {
        Some(text) => expand_backward(text, start.offset),
        None => start.offset,
    };
    let end_offset = match document.node(end.node)?.text() {
        Some(text) => expand_forward(text, end.offset),
        None => end.offset,
    };

    // Both points are checked before either is applied.
    document.checked_point(start.node, start_offset)?;
    document.checked_point(end.node, end_offset)?;

    let mut expanded = *range;
    document.set_start(&mut expanded, start.node, start_offset)?;
    document.set_end(&mut expanded, end.node, end_offset)?;

    let word = normalize_word(&document.range_text(&expanded)?);
    if word.is_empty() {
        return Err(ExpandError::Empty);
    }

    Ok(Expansion {
        range: expanded,
        word,
    })
}

/// Whether the non-empty `range` lies within a single special token of one text node.
fn is_inside_special_token(document: &Document, range: &Range) -> Result<bool, DomError> {
    let (start, end) = (range.start(), range.end());
    if start.node != end.node || start.offset >= end.offset {
        return Ok(false);
    }

    let Some(text) = document.node(start.node)?.text() else {
        return Ok(false);
    };

    Ok(special_tokens(text)
        .iter()
        .any(|token| token.start <= start.offset && end.offset <= token.end))
}

fn expand_backward(text: &str, offset: usize) -> usize {
    let token = match_special_token(text, offset, Direction::Backward);
    if token.matched {
        return token.new_offset;
    }

    let chars = text.chars().collect::<Vec<_>>();
    let mut offset = offset.min(chars.len());
    while offset > 0 && !is_boundary_char(Some(chars[offset - 1])) {
        offset -= 1;
    }
    offset
}

fn expand_forward(text: &str, offset: usize) -> usize {
    let token = match_special_token(text, offset, Direction::Forward);
    if token.matched {
        return token.new_offset;
    }

    let chars = text.chars().collect::<Vec<_>>();
    let mut offset = offset.min(chars.len());
    while offset < chars.len() && !is_boundary_char(Some(chars[offset])) {
        offset += 1;
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::NodeId;

    const SENTENCE: &str = "I can't believe state-of-the-art tech costs 100kg of gold.";

    fn text_document(text: &str) -> (Document, NodeId) {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p").unwrap();
        let node = doc.append_text(p, text).unwrap();
        (doc, node)
    }

    fn expand_word(text: &str, start: usize, end: usize) -> Result<String, ExpandError> {
        let (doc, node) = text_document(text);
        let range = doc.create_range(node, start, node, end).unwrap();
        expand(&doc, &range).map(|expansion| expansion.word)
    }

    #[test]
    fn test_expand_plain_word() {
        assert_eq!(expand_word("hello world", 7, 8).unwrap(), "world");
        assert_eq!(expand_word("hello world", 0, 11).unwrap(), "hello world");
        assert_eq!(expand_word("Hello, World!", 1, 2).unwrap(), "hello");
    }

    #[test]
    fn test_expand_special_tokens() {
        // "a" of "can't"
        assert_eq!(expand_word(SENTENCE, 3, 4).unwrap(), "can't");
        // "of" inside the compound
        assert_eq!(expand_word(SENTENCE, 22, 24).unwrap(), "state-of-the-art");
        // "0k" of "100kg"
        assert_eq!(expand_word(SENTENCE, 46, 48).unwrap(), "100kg");
        assert_eq!(expand_word(SENTENCE, 54, 56).unwrap(), "gold");
        assert_eq!(
            expand_word("mail me at jane.doe@example.com today", 16, 18).unwrap(),
            "jane.doe@example.com"
        );
    }

    #[test]
    fn test_expand_cjk_punctuation() {
        assert_eq!(expand_word("他说「你好」。", 3, 4).unwrap(), "你好");
    }

    #[test]
    fn test_expand_leaves_input_untouched() {
        let (doc, node) = text_document("hello world");
        let range = doc.create_range(node, 7, node, 8).unwrap();
        let expansion = expand(&doc, &range).unwrap();

        assert_eq!(range.start().offset, 7);
        assert_eq!(expansion.range.start().offset, 6);
        assert_eq!(expansion.range.end().offset, 11);
    }

    #[test]
    fn test_expand_any_char_of_contraction() {
        let text = "I can't believe";
        for start in 2..7 {
            let (doc, node) = text_document(text);
            let range = doc.create_range(node, start, node, start + 1).unwrap();
            let expansion = expand(&doc, &range).unwrap();

            assert_eq!(expansion.word, "can't", "selecting char {start}");
            assert_eq!(expansion.range.start().offset, 2);
            assert_eq!(expansion.range.end().offset, 7);
        }
    }

    #[test]
    fn test_expand_hyphen_inside_compound() {
        assert_eq!(
            expand_word("state-of-the-art solution", 5, 6).unwrap(),
            "state-of-the-art"
        );
        assert_eq!(
            expand_word("state-of-the-art solution", 12, 13).unwrap(),
            "state-of-the-art"
        );
        // The space right after the compound is not part of it.
        assert_eq!(
            expand_word("state-of-the-art solution", 16, 17),
            Err(ExpandError::Empty)
        );
    }

    #[test]
    fn test_expand_is_idempotent_on_whole_words() {
        let words = [
            (0, 1, "i"),
            (2, 7, "can't"),
            (8, 15, "believe"),
            (16, 32, "state-of-the-art"),
            (33, 37, "tech"),
            (38, 43, "costs"),
            (44, 49, "100kg"),
            (50, 52, "of"),
            (53, 57, "gold"),
        ];

        let (doc, node) = text_document(SENTENCE);
        for (start, end, word) in words {
            let range = doc.create_range(node, start, node, end).unwrap();
            let expansion = expand(&doc, &range).unwrap();

            assert_eq!(expansion.word, word);
            assert_eq!(expansion.range, range, "{word} moved");

            let again = expand(&doc, &expansion.range).unwrap();
            assert_eq!(again, expansion);
        }

        // Expanding an expansion changes nothing either.
        let range = doc.create_range(node, 22, node, 23).unwrap();
        let expansion = expand(&doc, &range).unwrap();
        assert_eq!(expand(&doc, &expansion.range).unwrap(), expansion);
    }

    #[test]
    fn test_expand_aborts_on_boundary_only_selection() {
        assert_eq!(expand_word("hello world", 5, 6), Err(ExpandError::Empty));
        assert_eq!(expand_word("hello, world", 5, 7), Err(ExpandError::Empty));
        assert_eq!(expand_word("hello world", 3, 3), Err(ExpandError::Empty));
    }

    #[test]
    fn test_expand_across_text_nodes() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p").unwrap();
        let first = doc.append_text(p, "foo ba").unwrap();
        let second = doc.append_text(p, "r baz").unwrap();

        let range = doc.create_range(first, 5, second, 1).unwrap();
        let expansion = expand(&doc, &range).unwrap();
        assert_eq!(expansion.word, "bar");
        assert_eq!(expansion.range.start().offset, 4);
        assert_eq!(expansion.range.end().offset, 1);
    }

    #[test]
    fn test_expand_keeps_element_boundaries() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p").unwrap();
        doc.append_text(p, "one").unwrap();
        doc.append_text(p, " two").unwrap();

        let range = doc.create_range(p, 0, p, 1).unwrap();
        let expansion = expand(&doc, &range).unwrap();
        assert_eq!(expansion.range, range);
        assert_eq!(expansion.word, "one");
    }

    #[test]
    fn test_expand_stale_range() {
        let (mut doc, node) = text_document("hello world");
        let range = doc.create_range(node, 7, node, 11).unwrap();
        doc.set_text(node, "hi").unwrap();

        assert!(matches!(
            expand(&doc, &range),
            Err(ExpandError::Boundary(DomError::IndexSize { .. }))
        ));
    }
}
