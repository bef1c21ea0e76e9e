//! Marker elements: creation, wrapping and removal.

use boundary::{is_boundary_char, normalize_word};
use dom::{Document, DomError, NodeId, Range};
use mark_store::{WordMark, MAX_MARK_COUNT};
use std::collections::HashMap;

use crate::theme::Theme;

pub const MARKER_TAG: &str = "span";
pub const MARKER_CLASS_PREFIX: &str = "wordmark-";
pub const DATA_WORD: &str = "data-word";
pub const DATA_COUNT: &str = "data-count";

/// Elements whose text is never marked.
const SKIPPED_TAGS: &[&str] = &["script", "style", "textarea"];

/// Shade per count, from the first highlight to the last.
const LIGHT_SHADES: [u16; MAX_MARK_COUNT as usize] = [500, 600, 700, 800, 900];
const DARK_SHADES: [u16; MAX_MARK_COUNT as usize] = [500, 400, 300, 200, 100];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("failed to wrap the range: {0}")]
    Surround(#[from] DomError),
}

/// Returns the class of a marker, e.g. `wordmark-yellow-700` for a third light highlight.
///
/// `count` is clamped to `1..=5`.
pub fn class_name(base_color: &str, count: u8, theme: Theme) -> String {
    let index = usize::from(count.clamp(1, MAX_MARK_COUNT) - 1);
    let shade = if theme.is_dark() {
        DARK_SHADES[index]
    } else {
        LIGHT_SHADES[index]
    };
    format!("{MARKER_CLASS_PREFIX}{base_color}-{shade}")
}

/// Wraps `range` in a new marker element and returns the marker.
///
/// When `range` is exactly the text of a marker of the same word, that marker is restyled
/// with the new count instead of being nested. The document is left unchanged on error.
pub fn render(
    document: &mut Document,
    range: &Range,
    word: &str,
    count: u8,
    base_color: &str,
    theme: Theme,
) -> Result<NodeId, RenderError> {
    if let Some(marker) = enclosing_marker(document, range, word) {
        document.set_attribute(marker, "class", class_name(base_color, count, theme))?;
        document.set_attribute(marker, DATA_COUNT, count.to_string())?;
        return Ok(marker);
    }

    let marker = create_marker(document, word, count, base_color, theme)?;
    document.surround_contents(range, marker)?;
    Ok(marker)
}

/// The marker of `word` whose only child is the text node `range` covers entirely.
fn enclosing_marker(document: &Document, range: &Range, word: &str) -> Option<NodeId> {
    let (start, end) = (range.start(), range.end());
    if start.node != end.node || start.offset != 0 {
        return None;
    }

    let text = document.node(start.node).ok()?;
    if !text.is_text() || end.offset != text.length() {
        return None;
    }

    let parent = text.parent()?;
    let marker = document.node(parent).ok()?;
    let same_word = marker
        .attribute(DATA_WORD)
        .map_or(false, |w| normalize_word(w) == normalize_word(word));

    (is_marker(document, parent) && same_word && marker.children() == [start.node].as_slice())
        .then_some(parent)
}

fn create_marker(
    document: &mut Document,
    word: &str,
    count: u8,
    base_color: &str,
    theme: Theme,
) -> Result<NodeId, DomError> {
    let marker = document.create_element(MARKER_TAG);
    document.set_attribute(marker, "class", class_name(base_color, count, theme))?;
    document.set_attribute(marker, DATA_WORD, word)?;
    document.set_attribute(marker, DATA_COUNT, count.to_string())?;
    Ok(marker)
}

fn is_marker(document: &Document, node: NodeId) -> bool {
    document.node(node).map_or(false, |n| {
        n.tag_name() == Some(MARKER_TAG)
            && n.attribute(DATA_WORD).is_some()
            && n
                .attribute("class")
                .map_or(false, |class| class.starts_with(MARKER_CLASS_PREFIX))
    })
}

/// Whether the text of `node` can receive markers.
fn is_markable_text(document: &Document, node: NodeId) -> bool {
    !document.ancestors(node).any(|ancestor| {
        is_marker(document, ancestor)
            || document
                .node(ancestor)
                .ok()
                .and_then(|n| n.tag_name())
                .map_or(false, |tag| {
                    SKIPPED_TAGS.iter().any(|s| tag.eq_ignore_ascii_case(s))
                })
    })
}

/// Marks every whole-word occurrence of the stored words, returns the number of markers
/// created.
///
/// Text already inside a marker is left alone, so restoring twice creates no new marker.
pub fn restore_marks(
    document: &mut Document,
    marks: &[WordMark],
    base_color: &str,
    theme: Theme,
) -> Result<usize, RenderError> {
    let marks = marks
        .iter()
        .filter(|mark| mark.count > 0)
        .map(|mark| {
            let word = normalize_word(&mark.word);
            (fold(&word), (word, mark.count))
        })
        .filter(|(folded, _)| !folded.is_empty())
        .collect::<HashMap<_, _>>();
    if marks.is_empty() {
        return Ok(0);
    }

    // Longest words first, e.g. `state-of-the-art` wins over `state`.
    let mut words = marks.keys().map(Vec::as_slice).collect::<Vec<_>>();
    words.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let text_nodes = document
        .text_nodes(document.root())
        .into_iter()
        .filter(|&node| is_markable_text(document, node))
        .collect::<Vec<_>>();

    let mut total = 0;
    for node in text_nodes {
        let Some(text) = document.node(node)?.text() else {
            continue;
        };
        let occurrences = find_occurrences(&fold(text), &words);

        // Wrap from the end, the earlier offsets stay valid as the node is split.
        for (start, end, folded) in occurrences.into_iter().rev() {
            let Some((word, count)) = marks.get(folded) else {
                continue;
            };
            let range = document.create_range(node, start, node, end)?;
            render(document, &range, word, *count, base_color, theme)?;
            total += 1;
        }
    }

    tracing::debug!(total, "Restored word marks");

    Ok(total)
}

/// Lowercases char by char so that offsets in the folded text match the original.
fn fold(text: &str) -> Vec<char> {
    text.chars()
        .map(|c| {
            let mut lower = c.to_lowercase();
            match (lower.next(), lower.next()) {
                (Some(l), None) => l,
                _ => c,
            }
        })
        .collect()
}

/// Non-overlapping occurrences of `words` in `text` bounded by boundary chars, left to right.
fn find_occurrences<'a>(text: &[char], words: &[&'a [char]]) -> Vec<(usize, usize, &'a [char])> {
    let mut occurrences = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let preceded_by_boundary = pos == 0 || is_boundary_char(text.get(pos - 1).copied());
        let found = preceded_by_boundary
            .then(|| {
                words.iter().copied().find(|word| {
                    let end = pos + word.len();
                    end <= text.len()
                        && &text[pos..end] == *word
                        && is_boundary_char(text.get(end).copied())
                })
            })
            .flatten();

        match found {
            Some(word) => {
                occurrences.push((pos, pos + word.len(), word));
                pos += word.len();
            }
            None => pos += 1,
        }
    }

    occurrences
}

/// Unwraps the markers of `word`, or all the markers if `word` is `None`, and merges the
/// freed text back into its neighbours. Returns the number of markers removed.
pub fn remove_markers(document: &mut Document, word: Option<&str>) -> Result<usize, RenderError> {
    let word = word.map(normalize_word);

    let markers = document
        .elements_with_attribute(document.root(), DATA_WORD)
        .into_iter()
        .filter(|&node| is_marker(document, node))
        .filter(|&node| match &word {
            Some(word) => document
                .node(node)
                .ok()
                .and_then(|n| n.attribute(DATA_WORD))
                .map_or(false, |w| normalize_word(w) == *word),
            None => true,
        })
        .collect::<Vec<_>>();

    let mut removed = 0;
    for marker in markers {
        let Some(parent) = document.parent(marker) else {
            continue;
        };
        document.unwrap_node(marker)?;
        document.normalize(parent)?;
        removed += 1;
    }

    Ok(removed)
}
