//! An arena backed document tree modelling the parts of the DOM a content script touches:
//! element and text nodes, attributes, boundary points, ranges, the selection and
//! `surroundContents()`.
//!
//! Offsets into text nodes are char indices, offsets into any other node are child indices.

mod document;
mod range;
mod selection;

pub use self::document::{Document, Node, NodeData};
pub use self::range::{BoundaryPoint, Range};
pub use self::selection::Selection;

/// Index of a node in the document arena.
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node {0} does not exist")]
    NotFound(NodeId),
    #[error("node {0} is not connected to the document")]
    Detached(NodeId),
    #[error("offset {offset} exceeds the length {length} of node {node}")]
    IndexSize {
        node: NodeId,
        offset: usize,
        length: usize,
    },
    #[error("a non-text node is partially contained in the range")]
    InvalidState,
    #[error("node {0} cannot be inserted here")]
    HierarchyRequest(NodeId),
    #[error("node {0} has an invalid type for this operation")]
    InvalidNodeType(NodeId),
}
