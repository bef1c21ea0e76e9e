use crate::document::Document;
use crate::{DomError, NodeId};
use std::cmp::Ordering;

/// A `(node, offset)` pair. The offset counts chars in a text node and children otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A static range, `start` never comes after `end` in tree order.
///
/// Ranges are plain values, they are only changed through [`Document::set_start`] and
/// [`Document::set_end`] which validate the new boundary points against the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    start: BoundaryPoint,
    end: BoundaryPoint,
}

impl Range {
    pub fn collapsed_at(point: BoundaryPoint) -> Self {
        Self {
            start: point,
            end: point,
        }
    }

    pub fn start(&self) -> BoundaryPoint {
        self.start
    }

    pub fn end(&self) -> BoundaryPoint {
        self.end
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

impl Document {
    /// Creates a range from `(start_node, start_offset)` to `(end_node, end_offset)`.
    pub fn create_range(
        &self,
        start_node: NodeId,
        start_offset: usize,
        end_node: NodeId,
        end_offset: usize,
    ) -> Result<Range, DomError> {
        let mut range = Range::collapsed_at(self.checked_point(start_node, start_offset)?);
        self.set_end(&mut range, end_node, end_offset)?;
        Ok(range)
    }

    /// Returns the boundary point if `offset` is valid for `node`.
    pub fn checked_point(&self, node: NodeId, offset: usize) -> Result<BoundaryPoint, DomError> {
        let length = self.node(node)?.length();
        if !self.is_connected(node) {
            return Err(DomError::Detached(node));
        }
        if offset > length {
            return Err(DomError::IndexSize {
                node,
                offset,
                length,
            });
        }
        Ok(BoundaryPoint::new(node, offset))
    }

    /// Moves the start of `range`, collapsing it if the new start is after its end.
    ///
    /// On error `range` is left untouched.
    pub fn set_start(&self, range: &mut Range, node: NodeId, offset: usize) -> Result<(), DomError> {
        let point = self.checked_point(node, offset)?;
        range.start = point;
        if self.compare_points(point, range.end) == Ordering::Greater {
            range.end = point;
        }
        Ok(())
    }

    /// Moves the end of `range`, collapsing it if the new end is before its start.
    ///
    /// On error `range` is left untouched.
    pub fn set_end(&self, range: &mut Range, node: NodeId, offset: usize) -> Result<(), DomError> {
        let point = self.checked_point(node, offset)?;
        range.end = point;
        if self.compare_points(point, range.start) == Ordering::Less {
            range.start = point;
        }
        Ok(())
    }

    /// Checks that both boundary points of `range` are still valid in the current tree.
    pub fn validate_range(&self, range: &Range) -> Result<(), DomError> {
        let start = self.checked_point(range.start.node, range.start.offset)?;
        let end = self.checked_point(range.end.node, range.end.offset)?;
        if self.compare_points(start, end) == Ordering::Greater {
            return Err(DomError::InvalidState);
        }
        Ok(())
    }

    /// Position of the boundary point `a` relative to `b`.
    ///
    /// Both points must be connected to the document.
    pub fn compare_points(&self, a: BoundaryPoint, b: BoundaryPoint) -> Ordering {
        if a.node == b.node {
            return a.offset.cmp(&b.offset);
        }

        if self.tree_path(a.node) > self.tree_path(b.node) {
            return self.compare_points(b, a).reverse();
        }

        if self.is_inclusive_ancestor(a.node, b.node) {
            let mut child = b.node;
            while let Some(parent) = self.parent(child) {
                if parent == a.node {
                    break;
                }
                child = parent;
            }
            if self.index_of(child).map_or(false, |index| index < a.offset) {
                return Ordering::Greater;
            }
        }

        Ordering::Less
    }

    /// Child indices leading from the document node to `node`, whose lexical order is the
    /// tree order.
    fn tree_path(&self, node: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = node;
        while let Some(index) = self.index_of(current) {
            path.push(index);
            current = self.parent(current).unwrap_or(current);
        }
        path.reverse();
        path
    }

    /// Whether `node` lies entirely inside `range`.
    fn is_contained(&self, node: NodeId, range: &Range) -> bool {
        let length = self.nodes[node].length();
        self.compare_points(BoundaryPoint::new(node, 0), range.start) == Ordering::Greater
            && self.compare_points(BoundaryPoint::new(node, length), range.end) == Ordering::Less
    }

    /// Text covered by `range`, like `Range.toString()`.
    pub fn range_text(&self, range: &Range) -> Result<String, DomError> {
        self.validate_range(range)?;

        let (start, end) = (range.start, range.end);
        let start_text = self.nodes[start.node].text();

        if start.node == end.node {
            if let Some(text) = start_text {
                return Ok(utils::slice_chars(text, start.offset, end.offset).to_string());
            }
        }

        let mut out = String::new();
        if let Some(text) = start_text {
            out.push_str(utils::slice_chars(text, start.offset, usize::MAX));
        }
        for node in self.text_nodes(self.root()) {
            if node == start.node || node == end.node {
                continue;
            }
            if self.is_contained(node, range) {
                out.push_str(self.nodes[node].text().unwrap_or_default());
            }
        }
        if start.node != end.node {
            if let Some(text) = self.nodes[end.node].text() {
                out.push_str(utils::slice_chars(text, 0, end.offset));
            }
        }

        Ok(out)
    }

    /// Whether a node which is not a text node is an inclusive ancestor of exactly one of the
    /// boundary points of `range`.
    fn partially_contains_non_text(&self, range: &Range) -> bool {
        let inclusive_ancestors = |node: NodeId| {
            std::iter::once(node)
                .chain(self.ancestors(node))
                .collect::<Vec<_>>()
        };
        let start_side = inclusive_ancestors(range.start.node);
        let end_side = inclusive_ancestors(range.end.node);

        start_side
            .iter()
            .filter(|n| !end_side.contains(n))
            .chain(end_side.iter().filter(|n| !start_side.contains(n)))
            .any(|&n| !self.nodes[n].is_text())
    }

    fn text_length(&self, node: NodeId) -> Option<usize> {
        self.nodes[node].text().map(utils::char_count)
    }

    /// The node whose children the boundary point sits between once text is split.
    fn container_of(&self, point: BoundaryPoint) -> Result<NodeId, DomError> {
        if self.nodes[point.node].is_text() {
            self.parent(point.node).ok_or(DomError::Detached(point.node))
        } else {
            Ok(point.node)
        }
    }

    /// Moves the contents of `range` into `new_parent` and inserts `new_parent` where the
    /// contents were, like `Range.surroundContents()`.
    ///
    /// `new_parent` must be a detached element, its previous children are dropped. The
    /// preconditions are all checked before the tree is touched, so on error the document is
    /// unchanged:
    ///
    /// - [`DomError::InvalidState`] if an element is partially contained in the range, i.e.
    ///   the range starts inside one element and ends outside of it.
    /// - [`DomError::IndexSize`], [`DomError::NotFound`] or [`DomError::Detached`] if the range
    ///   no longer fits the tree.
    pub fn surround_contents(&mut self, range: &Range, new_parent: NodeId) -> Result<(), DomError> {
        self.validate_range(range)?;

        let wrapper = self.node(new_parent)?;
        if !wrapper.is_element() {
            return Err(DomError::InvalidNodeType(new_parent));
        }
        if wrapper.parent.is_some() {
            return Err(DomError::HierarchyRequest(new_parent));
        }

        if self.partially_contains_non_text(range) {
            return Err(DomError::InvalidState);
        }

        let (start, end) = (range.start, range.end);
        let container = self.container_of(start)?;
        if container != self.container_of(end)? {
            return Err(DomError::InvalidState);
        }

        let end_length = self.text_length(end.node);
        let mut end_index = match end_length {
            Some(length) => {
                let index = self.index_of(end.node).ok_or(DomError::Detached(end.node))?;
                if end.offset == 0 {
                    index
                } else {
                    if end.offset < length {
                        self.split_text(end.node, end.offset)?;
                    }
                    index + 1
                }
            }
            None => end.offset,
        };

        // Re-read the length, the end split may have shortened the start node.
        let start_length = self.text_length(start.node);
        let start_index = match start_length {
            Some(length) => {
                let index = self
                    .index_of(start.node)
                    .ok_or(DomError::Detached(start.node))?;
                if start.offset == 0 {
                    index
                } else if start.offset >= length {
                    index + 1
                } else {
                    self.split_text(start.node, start.offset)?;
                    end_index += 1;
                    index + 1
                }
            }
            None => start.offset,
        };

        for child in std::mem::take(&mut self.nodes[new_parent].children) {
            self.nodes[child].parent = None;
        }

        let moved = self.nodes[container]
            .children
            .drain(start_index..end_index.max(start_index))
            .collect::<Vec<_>>();
        for &child in &moved {
            self.nodes[child].parent = Some(new_parent);
        }
        self.nodes[new_parent].children = moved;

        self.nodes[container].children.insert(start_index, new_parent);
        self.nodes[new_parent].parent = Some(container);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `<p>Hello <b>big</b> world</p>`
    fn sample() -> (Document, NodeId, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p").unwrap();
        let t1 = doc.append_text(p, "Hello ").unwrap();
        let b = doc.append_element(p, "b").unwrap();
        let big = doc.append_text(b, "big").unwrap();
        let t3 = doc.append_text(p, " world").unwrap();
        (doc, p, t1, big, t3)
    }

    #[test]
    fn test_set_boundaries() {
        let (doc, _p, t1, _big, t3) = sample();
        let mut range = doc.create_range(t1, 1, t3, 2).unwrap();

        assert!(matches!(
            doc.set_start(&mut range, t1, 7),
            Err(DomError::IndexSize {
                offset: 7,
                length: 6,
                ..
            })
        ));
        assert_eq!(range.start(), BoundaryPoint::new(t1, 1));

        // A start past the end collapses the range.
        doc.set_start(&mut range, t3, 4).unwrap();
        assert!(range.is_collapsed());
        assert_eq!(range.end(), BoundaryPoint::new(t3, 4));

        doc.set_end(&mut range, t1, 0).unwrap();
        assert!(range.is_collapsed());
        assert_eq!(range.start(), BoundaryPoint::new(t1, 0));
    }

    #[test]
    fn test_compare_points() {
        let (doc, p, t1, big, t3) = sample();
        let point = BoundaryPoint::new;
        assert_eq!(doc.compare_points(point(t1, 3), point(t1, 4)), Ordering::Less);
        assert_eq!(doc.compare_points(point(t3, 0), point(big, 3)), Ordering::Greater);
        // (p, 1) sits right before <b>.
        assert_eq!(doc.compare_points(point(p, 1), point(big, 0)), Ordering::Less);
        assert_eq!(doc.compare_points(point(p, 2), point(big, 0)), Ordering::Greater);
        assert_eq!(doc.compare_points(point(big, 1), point(p, 3)), Ordering::Less);
    }

    #[test]
    fn test_range_text() {
        let (doc, p, t1, big, t3) = sample();
        let range = doc.create_range(t1, 2, t3, 3).unwrap();
        assert_eq!(doc.range_text(&range).unwrap(), "llo big wo");

        let range = doc.create_range(big, 0, big, 2).unwrap();
        assert_eq!(doc.range_text(&range).unwrap(), "bi");

        let range = doc.create_range(p, 0, p, 3).unwrap();
        assert_eq!(doc.range_text(&range).unwrap(), "Hello big world");
    }

    #[test]
    fn test_surround_within_text_node() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p").unwrap();
        let text = doc.append_text(p, "I can't believe").unwrap();
        let range = doc.create_range(text, 2, text, 7).unwrap();

        let span = doc.create_element("span");
        doc.surround_contents(&range, span).unwrap();

        assert_eq!(doc.outer_html(p), "<p>I <span>can't</span> believe</p>");
        assert_eq!(doc.parent(span), Some(p));
    }

    #[test]
    fn test_surround_whole_text_node() {
        let mut doc = Document::new();
        let p = doc.append_element(doc.root(), "p").unwrap();
        let text = doc.append_text(p, "word").unwrap();
        let range = doc.create_range(text, 0, text, 4).unwrap();

        let span = doc.create_element("span");
        doc.surround_contents(&range, span).unwrap();

        assert_eq!(doc.outer_html(p), "<p><span>word</span></p>");
        assert_eq!(doc.node(p).unwrap().children(), &[span]);
    }

    #[test]
    fn test_surround_fully_contained_element() {
        let (mut doc, p, t1, _big, t3) = sample();
        let range = doc.create_range(t1, 2, t3, 3).unwrap();

        let span = doc.create_element("span");
        doc.surround_contents(&range, span).unwrap();

        assert_eq!(
            doc.outer_html(p),
            "<p>He<span>llo <b>big</b> wo</span>rld</p>"
        );
    }

    #[test]
    fn test_surround_partially_contained_element_fails() {
        let (mut doc, p, _t1, big, t3) = sample();
        let before = doc.outer_html(p);
        let range = doc.create_range(big, 1, t3, 3).unwrap();

        let span = doc.create_element("span");
        assert_eq!(
            doc.surround_contents(&range, span),
            Err(DomError::InvalidState)
        );
        assert_eq!(doc.outer_html(p), before);
        assert_eq!(doc.parent(span), None);
    }

    #[test]
    fn test_surround_stale_range_fails() {
        let (mut doc, p, t1, _big, _t3) = sample();
        let range = doc.create_range(t1, 1, t1, 6).unwrap();
        doc.set_text(t1, "Hi").unwrap();
        let before = doc.outer_html(p);

        let span = doc.create_element("span");
        assert!(matches!(
            doc.surround_contents(&range, span),
            Err(DomError::IndexSize { .. })
        ));
        assert_eq!(doc.outer_html(p), before);
    }
}
