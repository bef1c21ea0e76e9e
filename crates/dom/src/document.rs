use crate::selection::Selection;
use crate::{DomError, NodeId};

const ROOT: NodeId = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) data: NodeData,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            data,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn tag_name(&self) -> Option<&str> {
        match &self.data {
            NodeData::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        match &self.data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find_map(|(key, value)| (key == name).then_some(value.as_str())),
            _ => None,
        }
    }

    /// Length of the node as the DOM defines it: chars for a text node, the number of
    /// children otherwise.
    pub fn length(&self) -> usize {
        match &self.data {
            NodeData::Text(text) => utils::char_count(text),
            _ => self.children.len(),
        }
    }
}

/// A document tree plus the selection living in it.
///
/// Nodes are never freed, a removed node simply becomes detached. Node `0` is the document
/// node itself.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) nodes: Vec<Node>,
    selection: Selection,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
            selection: Selection::default(),
        }
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.nodes.get(id).ok_or(DomError::NotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
        self.nodes.get_mut(id).ok_or(DomError::NotFound(id))
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Node::new(data));
        self.nodes.len() - 1
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.push(NodeData::Element {
            tag: tag.into(),
            attributes: Vec::new(),
        })
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    pub fn append_element(
        &mut self,
        parent: NodeId,
        tag: impl Into<String>,
    ) -> Result<NodeId, DomError> {
        let element = self.create_element(tag);
        self.append_child(parent, element)?;
        Ok(element)
    }

    pub fn append_text(
        &mut self,
        parent: NodeId,
        text: impl Into<String>,
    ) -> Result<NodeId, DomError> {
        let text = self.create_text(text);
        self.append_child(parent, text)?;
        Ok(text)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insertion(parent, child)?;
        self.detach(child)?;
        let index = self.nodes[parent].children.len();
        self.insert_at(parent, index, child);
        Ok(())
    }

    /// Inserts `child` at `index` among the children of `parent`.
    ///
    /// `child` is detached first, `index` refers to the children list after that and is
    /// clamped to its length.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), DomError> {
        self.check_insertion(parent, child)?;
        self.detach(child)?;
        let index = index.min(self.nodes[parent].children.len());
        self.insert_at(parent, index, child);
        Ok(())
    }

    fn insert_at(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.nodes[parent].children.insert(index, child);
        self.nodes[child].parent = Some(parent);
    }

    fn check_insertion(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if self.node(parent)?.is_text() {
            return Err(DomError::HierarchyRequest(parent));
        }
        if matches!(self.node(child)?.data, NodeData::Document)
            || self.is_inclusive_ancestor(child, parent)
        {
            return Err(DomError::HierarchyRequest(child));
        }
        Ok(())
    }

    /// Removes `node` from its parent, if any.
    pub fn detach(&mut self, node: NodeId) -> Result<(), DomError> {
        if let Some(parent) = self.node(node)?.parent {
            self.nodes[parent].children.retain(|&c| c != node);
            self.nodes[node].parent = None;
        }
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        node: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        match &mut self.node_mut(node)?.data {
            NodeData::Element { attributes, .. } => {
                let value = value.into();
                match attributes.iter_mut().find(|(key, _)| key == name) {
                    Some((_, old)) => *old = value,
                    None => attributes.push((name.to_string(), value)),
                }
                Ok(())
            }
            _ => Err(DomError::InvalidNodeType(node)),
        }
    }

    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) -> Result<(), DomError> {
        match &mut self.node_mut(node)?.data {
            NodeData::Text(old) => {
                *old = text.into();
                Ok(())
            }
            _ => Err(DomError::InvalidNodeType(node)),
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    /// Returns the position of `node` among its siblings.
    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.nodes[parent].children.iter().position(|&c| c == node)
    }

    /// Ancestors of `node`, nearest first, `node` excluded.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(node), move |&n| self.parent(n))
    }

    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).any(|n| n == ancestor)
    }

    /// Whether `node` is reachable from the document node.
    pub fn is_connected(&self, node: NodeId) -> bool {
        node == ROOT || self.ancestors(node).last() == Some(ROOT)
    }

    /// Returns `node` and all its descendants in tree order.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        if node >= self.nodes.len() {
            return result;
        }
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.nodes[current].children.iter().rev());
        }
        result
    }

    /// Text nodes under `node` in tree order.
    pub fn text_nodes(&self, node: NodeId) -> Vec<NodeId> {
        self.descendants(node)
            .into_iter()
            .filter(|&n| self.nodes[n].is_text())
            .collect()
    }

    /// Elements under `node` (inclusive) carrying the attribute `name`, in tree order.
    pub fn elements_with_attribute(&self, node: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(node)
            .into_iter()
            .filter(|&n| self.nodes[n].attribute(name).is_some())
            .collect()
    }

    /// Concatenated text of all the text nodes under `node`.
    pub fn text_content(&self, node: NodeId) -> String {
        self.text_nodes(node)
            .into_iter()
            .filter_map(|n| self.nodes[n].text())
            .collect()
    }

    pub fn node_length(&self, node: NodeId) -> Result<usize, DomError> {
        Ok(self.node(node)?.length())
    }

    /// Splits the text node at `offset`, the text after `offset` is moved into a new text node
    /// inserted right after `node`. Returns the new node.
    pub fn split_text(&mut self, node: NodeId, offset: usize) -> Result<NodeId, DomError> {
        let text = self
            .node(node)?
            .text()
            .ok_or(DomError::InvalidNodeType(node))?;
        let length = utils::char_count(text);
        if offset > length {
            return Err(DomError::IndexSize {
                node,
                offset,
                length,
            });
        }

        let byte_idx = utils::byte_index_for(text, offset);
        let tail = text[byte_idx..].to_string();
        if let NodeData::Text(text) = &mut self.nodes[node].data {
            text.truncate(byte_idx);
        }

        let new_node = self.create_text(tail);
        if let (Some(parent), Some(index)) = (self.parent(node), self.index_of(node)) {
            self.insert_at(parent, index + 1, new_node);
        }
        Ok(new_node)
    }

    /// Replaces `node` by its children.
    pub fn unwrap_node(&mut self, node: NodeId) -> Result<(), DomError> {
        let parent = self.node(node)?.parent.ok_or(DomError::Detached(node))?;
        let index = self.index_of(node).ok_or(DomError::Detached(node))?;

        let children = std::mem::take(&mut self.nodes[node].children);
        for &child in &children {
            self.nodes[child].parent = Some(parent);
        }
        self.nodes[parent].children.splice(index..index + 1, children);
        self.nodes[node].parent = None;

        Ok(())
    }

    /// Merges the adjacent text children of `node` and drops the empty ones.
    pub fn normalize(&mut self, node: NodeId) -> Result<(), DomError> {
        let children = self.node(node)?.children.clone();
        let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());

        for child in children {
            if let NodeData::Text(text) = &self.nodes[child].data {
                let previous_is_text = kept
                    .last()
                    .map_or(false, |&prev| self.nodes[prev].is_text());

                if text.is_empty() || previous_is_text {
                    let text = text.clone();
                    if let Some(&prev) = kept.last() {
                        if let NodeData::Text(prev_text) = &mut self.nodes[prev].data {
                            prev_text.push_str(&text);
                        }
                    }
                    self.nodes[child].parent = None;
                    continue;
                }
            }
            kept.push(child);
        }

        self.nodes[node].children = kept;
        Ok(())
    }

    /// Serializes `node` as HTML, attributes in insertion order.
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.nodes.get(node) else {
            return;
        };
        match &n.data {
            NodeData::Document => {
                for &child in &n.children {
                    self.write_html(child, out);
                }
            }
            NodeData::Text(text) => escape_into(text, false, out),
            NodeData::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
                out.push('>');
                for &child in &n.children {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

fn escape_into(text: &str, in_attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(doc: &mut Document) -> (NodeId, NodeId, NodeId, NodeId) {
        let p = doc.append_element(doc.root(), "p").unwrap();
        let t1 = doc.append_text(p, "Hello ").unwrap();
        let b = doc.append_element(p, "b").unwrap();
        doc.append_text(b, "big").unwrap();
        let t3 = doc.append_text(p, " world").unwrap();
        (p, t1, b, t3)
    }

    #[test]
    fn test_build_and_serialize() {
        let mut doc = Document::new();
        let (p, _, b, _) = paragraph(&mut doc);
        doc.set_attribute(b, "class", "x\"y").unwrap();
        assert_eq!(
            doc.outer_html(p),
            "<p>Hello <b class=\"x&quot;y\">big</b> world</p>"
        );
        assert_eq!(doc.text_content(doc.root()), "Hello big world");
        assert_eq!(doc.node(b).unwrap().attribute("class"), Some("x\"y"));
    }

    #[test]
    fn test_insertion_errors() {
        let mut doc = Document::new();
        let (p, t1, b, _) = paragraph(&mut doc);
        assert_eq!(
            doc.append_child(t1, b),
            Err(DomError::HierarchyRequest(t1))
        );
        assert_eq!(
            doc.append_child(b, p),
            Err(DomError::HierarchyRequest(p))
        );
        assert_eq!(
            doc.set_attribute(t1, "class", "x"),
            Err(DomError::InvalidNodeType(t1))
        );
    }

    #[test]
    fn test_split_text_and_normalize() {
        let mut doc = Document::new();
        let (p, t1, _, _) = paragraph(&mut doc);

        let tail = doc.split_text(t1, 2).unwrap();
        assert_eq!(doc.node(t1).unwrap().text(), Some("He"));
        assert_eq!(doc.node(tail).unwrap().text(), Some("llo "));
        assert_eq!(doc.node(p).unwrap().children().len(), 4);
        assert!(matches!(
            doc.split_text(t1, 3),
            Err(DomError::IndexSize { .. })
        ));

        let empty = doc.create_text("");
        doc.insert_child(p, 0, empty).unwrap();
        doc.normalize(p).unwrap();
        assert_eq!(doc.node(p).unwrap().children().len(), 3);
        assert_eq!(doc.node(t1).unwrap().text(), Some("Hello "));
        assert_eq!(doc.outer_html(p), "<p>Hello <b>big</b> world</p>");
    }

    #[test]
    fn test_unwrap_node() {
        let mut doc = Document::new();
        let (p, _, b, _) = paragraph(&mut doc);
        doc.unwrap_node(b).unwrap();
        assert_eq!(doc.outer_html(p), "<p>Hello big world</p>");
        assert_eq!(doc.node(p).unwrap().children().len(), 3);
        assert!(!doc.is_connected(b));

        doc.normalize(p).unwrap();
        assert_eq!(doc.node(p).unwrap().children().len(), 1);
    }

    #[test]
    fn test_tree_queries() {
        let mut doc = Document::new();
        let (p, t1, b, t3) = paragraph(&mut doc);
        let big = doc.node(b).unwrap().children()[0];
        assert_eq!(doc.descendants(p), vec![p, t1, b, big, t3]);
        assert_eq!(doc.text_nodes(doc.root()), vec![t1, big, t3]);
        assert_eq!(doc.ancestors(big).collect::<Vec<_>>(), vec![b, p, doc.root()]);
        assert_eq!(doc.index_of(t3), Some(2));

        let detached = doc.create_element("span");
        assert!(!doc.is_connected(detached));
        assert!(doc.is_connected(big));
    }
}
