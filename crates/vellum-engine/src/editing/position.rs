use serde::{Deserialize, Serialize};

use crate::editing::node::{Affinity, NodeId, NodePosition};

/// A document-wide caret position: a node plus a position inside it.
///
/// Only meaningful while the referenced node exists; operations that find a
/// stale id treat the position as addressing nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentPosition {
    pub node_id: NodeId,
    pub node_position: NodePosition,
}

impl DocumentPosition {
    pub fn new(node_id: NodeId, node_position: NodePosition) -> Self {
        Self {
            node_id,
            node_position,
        }
    }

    /// A caret at a character offset inside a text node.
    pub fn text(node_id: NodeId, offset: usize) -> Self {
        Self::new(node_id, NodePosition::text(offset))
    }

    /// A caret on one face of a block node.
    pub fn block(node_id: NodeId, affinity: Affinity) -> Self {
        Self::new(node_id, NodePosition::block(affinity))
    }
}

/// A document-wide selection as a base/extent pair.
///
/// Base and extent are *not* sorted: they preserve the direction of the
/// gesture that produced them, which expand/contract operations depend on.
/// Use [`Document::range_between`](crate::editing::Document::range_between)
/// for the document-order-normalized range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentSelection {
    pub base: DocumentPosition,
    pub extent: DocumentPosition,
}

impl DocumentSelection {
    pub fn new(base: DocumentPosition, extent: DocumentPosition) -> Self {
        Self { base, extent }
    }

    /// A plain caret: base and extent at the same position.
    pub fn collapsed(position: DocumentPosition) -> Self {
        Self {
            base: position,
            extent: position,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.base == self.extent
    }
}

/// A document-order-normalized range: `start` is never after `end`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRange {
    pub start: DocumentPosition,
    pub end: DocumentPosition,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::node::Affinity;

    #[test]
    fn test_collapsed_selection() {
        let position = DocumentPosition::text(NodeId::new(), 3);
        let selection = DocumentSelection::collapsed(position);

        assert!(selection.is_collapsed());
        assert_eq!(selection.base, selection.extent);
    }

    #[test]
    fn test_selection_preserves_gesture_direction() {
        let id = NodeId::new();
        let selection =
            DocumentSelection::new(DocumentPosition::text(id, 5), DocumentPosition::text(id, 2));

        assert_eq!(selection.base, DocumentPosition::text(id, 5));
        assert_eq!(selection.extent, DocumentPosition::text(id, 2));
        assert!(!selection.is_collapsed());
    }

    #[test]
    fn test_block_position_constructor() {
        let id = NodeId::new();
        let position = DocumentPosition::block(id, Affinity::Upstream);

        assert_eq!(position.node_position, NodePosition::block(Affinity::Upstream));
    }
}
