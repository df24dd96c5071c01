use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use crate::editing::node::{DocumentNode, NodeId};
use crate::editing::position::{DocumentPosition, DocumentRange};
use crate::text::AttributedText;

/// Identifies a registered change listener for later removal.
pub type ListenerId = u64;

type Listener = Box<dyn FnMut(&[DocumentChange])>;

/// One committed structural mutation, reported to listeners after the
/// document is already in its new state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentChange {
    NodeInserted { id: NodeId, index: usize },
    NodeRemoved { id: NodeId, index: usize },
    NodeReplaced { old: NodeId, new: NodeId },
    /// A node's content changed in place (text replaced).
    NodeChanged { id: NodeId },
}

/// Errors raised by structural mutations. Every failing mutation leaves the
/// document untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("a node with id {0} already exists in the document")]
    DuplicateNodeId(NodeId),
    #[error("index {index} is out of bounds for a document of {len} nodes")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("node {0} is not a text node")]
    NotATextNode(NodeId),
}

/// An ordered sequence of document nodes with stable identity.
///
/// The document owns node order and node lookup; it never interprets
/// node-local position semantics, which belong to the nodes themselves.
/// Every structural mutation validates first and fails atomically, then
/// fires a change notification once committed. Inside a transaction (opened
/// by the command engine) the notifications batch up and flush once, with
/// the version bumped once per logical edit.
pub struct Document {
    nodes: Vec<DocumentNode>,
    index: HashMap<NodeId, usize>,
    version: u64,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener_id: ListenerId,
    transaction_depth: u32,
    pending: Vec<DocumentChange>,
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            version: 0,
            listeners: Vec::new(),
            next_listener_id: 0,
            transaction_depth: 0,
            pending: Vec::new(),
        }
    }

    /// Build a document from an initial node sequence, validating id
    /// uniqueness.
    pub fn from_nodes(nodes: Vec<DocumentNode>) -> Result<Self, DocumentError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (position, node) in nodes.iter().enumerate() {
            if index.insert(node.id(), position).is_some() {
                return Err(DocumentError::DuplicateNodeId(node.id()));
            }
        }
        Ok(Self {
            nodes,
            index,
            version: 0,
            listeners: Vec::new(),
            next_listener_id: 0,
            transaction_depth: 0,
            pending: Vec::new(),
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[DocumentNode] {
        &self.nodes
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn node_by_id(&self, id: NodeId) -> Option<&DocumentNode> {
        self.index.get(&id).map(|&position| &self.nodes[position])
    }

    /// The node's position in the ordered sequence.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn node_at(&self, index: usize) -> Option<&DocumentNode> {
        self.nodes.get(index)
    }

    pub fn first_node(&self) -> Option<&DocumentNode> {
        self.nodes.first()
    }

    pub fn last_node(&self) -> Option<&DocumentNode> {
        self.nodes.last()
    }

    /// The node immediately upstream of `id`, if any.
    pub fn node_before(&self, id: NodeId) -> Option<&DocumentNode> {
        let index = self.index_of(id)?;
        index.checked_sub(1).and_then(|i| self.nodes.get(i))
    }

    /// The node immediately downstream of `id`, if any.
    pub fn node_after(&self, id: NodeId) -> Option<&DocumentNode> {
        let index = self.index_of(id)?;
        self.nodes.get(index + 1)
    }

    pub fn insert_node_at(&mut self, index: usize, node: DocumentNode) -> Result<(), DocumentError> {
        if index > self.nodes.len() {
            return Err(DocumentError::IndexOutOfBounds {
                index,
                len: self.nodes.len(),
            });
        }
        if self.index.contains_key(&node.id()) {
            return Err(DocumentError::DuplicateNodeId(node.id()));
        }

        let id = node.id();
        self.nodes.insert(index, node);
        self.rebuild_index();
        self.committed(DocumentChange::NodeInserted { id, index });
        Ok(())
    }

    /// Insert `node` immediately after the node `existing`. Returns
    /// `Ok(false)` when `existing` is absent: nothing to do.
    pub fn insert_node_after(
        &mut self,
        existing: NodeId,
        node: DocumentNode,
    ) -> Result<bool, DocumentError> {
        let Some(index) = self.index_of(existing) else {
            return Ok(false);
        };
        self.insert_node_at(index + 1, node)?;
        Ok(true)
    }

    /// Remove the node with the given id. Returns `false` when absent.
    pub fn delete_node(&mut self, id: NodeId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        self.nodes.remove(index);
        self.rebuild_index();
        self.committed(DocumentChange::NodeRemoved { id, index });
        true
    }

    /// Swap the node `old` for `node`, keeping its position in the order.
    /// Returns `Ok(false)` when `old` is absent.
    pub fn replace_node(&mut self, old: NodeId, node: DocumentNode) -> Result<bool, DocumentError> {
        let Some(index) = self.index_of(old) else {
            return Ok(false);
        };
        let new = node.id();
        if new != old && self.index.contains_key(&new) {
            return Err(DocumentError::DuplicateNodeId(new));
        }

        self.nodes[index] = node;
        self.rebuild_index();
        self.committed(DocumentChange::NodeReplaced { old, new });
        Ok(true)
    }

    /// Replace the attributed text of a text node. This is the single text
    /// mutation path, so "text changed" fires exactly once per logical
    /// edit. Returns `Ok(false)` when the node is absent; a non-text target
    /// is a contract violation.
    pub fn replace_node_text(
        &mut self,
        id: NodeId,
        text: AttributedText,
    ) -> Result<bool, DocumentError> {
        let Some(index) = self.index_of(id) else {
            return Ok(false);
        };
        let DocumentNode::Text(node) = &mut self.nodes[index] else {
            return Err(DocumentError::NotATextNode(id));
        };
        node.set_text(text);
        self.committed(DocumentChange::NodeChanged { id });
        Ok(true)
    }

    /// Order two document positions: node order first, then the node's own
    /// intra-node ordering. `None` when either node is absent or a position
    /// does not address its node's kind.
    pub fn compare_positions(
        &self,
        a: &DocumentPosition,
        b: &DocumentPosition,
    ) -> Option<Ordering> {
        let index_a = self.index_of(a.node_id)?;
        let index_b = self.index_of(b.node_id)?;
        if index_a != index_b {
            return Some(index_a.cmp(&index_b));
        }
        let node = self.node_at(index_a)?;
        node.compare_positions(&a.node_position, &b.node_position).ok()
    }

    /// Normalize two positions into a document-order range: `start` is
    /// whichever comes first in node order, ties broken by the node's
    /// upstream position.
    pub fn range_between(
        &self,
        a: &DocumentPosition,
        b: &DocumentPosition,
    ) -> Option<DocumentRange> {
        Some(match self.compare_positions(a, b)? {
            Ordering::Greater => DocumentRange { start: *b, end: *a },
            _ => DocumentRange { start: *a, end: *b },
        })
    }

    /// All nodes whose span intersects the range between the two positions,
    /// in document order, inclusive of partially covered boundary nodes.
    /// Unselectable nodes are included: they are traversable structure,
    /// even though navigation never offers them as a landing target.
    pub fn nodes_inside(&self, a: &DocumentPosition, b: &DocumentPosition) -> Vec<&DocumentNode> {
        let (Some(index_a), Some(index_b)) = (self.index_of(a.node_id), self.index_of(b.node_id))
        else {
            return Vec::new();
        };
        let (low, high) = if index_a <= index_b {
            (index_a, index_b)
        } else {
            (index_b, index_a)
        };
        self.nodes[low..=high].iter().collect()
    }

    /// Register a change listener, called after each committed mutation (or
    /// once per transaction with the batched changes).
    pub fn subscribe(&mut self, listener: impl FnMut(&[DocumentChange]) + 'static) -> ListenerId {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub(crate) fn begin_transaction(&mut self) {
        self.transaction_depth += 1;
    }

    pub(crate) fn commit_transaction(&mut self) {
        debug_assert!(self.transaction_depth > 0);
        self.transaction_depth = self.transaction_depth.saturating_sub(1);
        if self.transaction_depth == 0 {
            self.flush();
        }
    }

    fn committed(&mut self, change: DocumentChange) {
        self.pending.push(change);
        if self.transaction_depth == 0 {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        self.version += 1;
        let changes = std::mem::take(&mut self.pending);
        for (_, listener) in &mut self.listeners {
            listener(&changes);
        }
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (position, node) in self.nodes.iter().enumerate() {
            self.index.insert(node.id(), position);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Document {
    fn clone(&self) -> Self {
        // Listeners and in-flight transaction state are not part of the
        // document's value.
        Self {
            nodes: self.nodes.clone(),
            index: self.index.clone(),
            version: self.version,
            listeners: Vec::new(),
            next_listener_id: 0,
            transaction_depth: 0,
            pending: Vec::new(),
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::editing::node::{BlockNode, TextNode};

    fn paragraph(text: &str) -> DocumentNode {
        DocumentNode::Text(TextNode::new(text))
    }

    fn two_paragraph_doc() -> (Document, NodeId, NodeId) {
        let first = paragraph("first");
        let second = paragraph("second");
        let (first_id, second_id) = (first.id(), second.id());
        let doc = Document::from_nodes(vec![first, second]).expect("Should build document");
        (doc, first_id, second_id)
    }

    // ============ Lookup tests ============

    #[test]
    fn test_node_lookup_by_id_and_index() {
        let (doc, first_id, second_id) = two_paragraph_doc();

        assert_eq!(doc.index_of(first_id), Some(0));
        assert_eq!(doc.index_of(second_id), Some(1));
        assert_eq!(doc.node_by_id(second_id).map(DocumentNode::id), Some(second_id));
        assert_eq!(doc.node_at(2), None);
    }

    #[test]
    fn test_lookup_miss_returns_none() {
        let (doc, _, _) = two_paragraph_doc();

        assert!(doc.node_by_id(NodeId::new()).is_none());
        assert!(doc.index_of(NodeId::new()).is_none());
    }

    #[test]
    fn test_neighbors() {
        let (doc, first_id, second_id) = two_paragraph_doc();

        assert_eq!(doc.node_before(second_id).map(DocumentNode::id), Some(first_id));
        assert_eq!(doc.node_after(first_id).map(DocumentNode::id), Some(second_id));
        assert!(doc.node_before(first_id).is_none());
        assert!(doc.node_after(second_id).is_none());
    }

    // ============ Structural mutation tests ============

    #[test]
    fn test_insert_node_after() {
        let (mut doc, first_id, _) = two_paragraph_doc();
        let inserted = paragraph("middle");
        let inserted_id = inserted.id();

        let done = doc
            .insert_node_after(first_id, inserted)
            .expect("Should insert");

        assert!(done);
        assert_eq!(doc.index_of(inserted_id), Some(1));
        assert_eq!(doc.node_count(), 3);
    }

    #[test]
    fn test_insert_after_missing_node_does_nothing() {
        let (mut doc, _, _) = two_paragraph_doc();

        let done = doc
            .insert_node_after(NodeId::new(), paragraph("orphan"))
            .expect("Should not error");

        assert!(!done);
        assert_eq!(doc.node_count(), 2);
    }

    #[test]
    fn test_duplicate_id_fails_without_partial_mutation() {
        let (mut doc, first_id, _) = two_paragraph_doc();
        let duplicate = DocumentNode::Text(TextNode::with_id(first_id, "dup"));

        let result = doc.insert_node_at(0, duplicate);

        assert_eq!(result, Err(DocumentError::DuplicateNodeId(first_id)));
        assert_eq!(doc.node_count(), 2);
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn test_delete_node() {
        let (mut doc, first_id, second_id) = two_paragraph_doc();

        assert!(doc.delete_node(first_id));
        assert_eq!(doc.node_count(), 1);
        assert_eq!(doc.index_of(second_id), Some(0));
        assert!(!doc.delete_node(first_id));
    }

    #[test]
    fn test_replace_node_keeps_order() {
        let (mut doc, first_id, _) = two_paragraph_doc();
        let replacement = paragraph("replaced");
        let replacement_id = replacement.id();

        let done = doc.replace_node(first_id, replacement).expect("Should replace");

        assert!(done);
        assert_eq!(doc.index_of(replacement_id), Some(0));
        assert!(doc.node_by_id(first_id).is_none());
    }

    #[test]
    fn test_replace_node_text_on_block_is_an_error() {
        let block = DocumentNode::Block(BlockNode::horizontal_rule());
        let block_id = block.id();
        let mut doc = Document::from_nodes(vec![block]).expect("Should build document");

        let result = doc.replace_node_text(block_id, AttributedText::new("x"));

        assert_eq!(result, Err(DocumentError::NotATextNode(block_id)));
    }

    // ============ Ordering tests ============

    #[test]
    fn test_compare_positions_across_nodes() {
        let (doc, first_id, second_id) = two_paragraph_doc();

        let in_first = DocumentPosition::text(first_id, 5);
        let in_second = DocumentPosition::text(second_id, 0);

        assert_eq!(doc.compare_positions(&in_first, &in_second), Some(Ordering::Less));
    }

    #[test]
    fn test_range_between_normalizes_document_order() {
        let (doc, first_id, second_id) = two_paragraph_doc();

        let late = DocumentPosition::text(second_id, 2);
        let early = DocumentPosition::text(first_id, 3);
        let range = doc.range_between(&late, &early).expect("Should normalize");

        assert_eq!(range.start, early);
        assert_eq!(range.end, late);
    }

    #[test]
    fn test_nodes_inside_includes_boundary_and_unselectable_nodes() {
        let first = paragraph("a");
        let rule = DocumentNode::Block(BlockNode::horizontal_rule().unselectable());
        let last = paragraph("c");
        let (first_id, rule_id, last_id) = (first.id(), rule.id(), last.id());
        let doc = Document::from_nodes(vec![first, rule, last]).expect("Should build document");

        let inside = doc.nodes_inside(
            &DocumentPosition::text(first_id, 1),
            &DocumentPosition::text(last_id, 0),
        );

        let ids: Vec<NodeId> = inside.iter().map(|node| node.id()).collect();
        assert_eq!(ids, vec![first_id, rule_id, last_id]);
    }

    // ============ Change notification tests ============

    #[test]
    fn test_mutation_notifies_after_commit() {
        let (mut doc, first_id, _) = two_paragraph_doc();
        let seen: Rc<RefCell<Vec<DocumentChange>>> = Rc::default();
        let sink = Rc::clone(&seen);
        doc.subscribe(move |changes| sink.borrow_mut().extend_from_slice(changes));

        doc.delete_node(first_id);

        assert_eq!(
            seen.borrow().as_slice(),
            &[DocumentChange::NodeRemoved {
                id: first_id,
                index: 0
            }]
        );
        assert_eq!(doc.version(), 1);
    }

    #[test]
    fn test_transaction_batches_notifications() {
        let (mut doc, first_id, second_id) = two_paragraph_doc();
        let notifications: Rc<RefCell<usize>> = Rc::default();
        let sink = Rc::clone(&notifications);
        doc.subscribe(move |_| *sink.borrow_mut() += 1);

        doc.begin_transaction();
        doc.delete_node(first_id);
        doc.delete_node(second_id);
        assert_eq!(*notifications.borrow(), 0);
        doc.commit_transaction();

        assert_eq!(*notifications.borrow(), 1);
        assert_eq!(doc.version(), 1);
    }

    #[test]
    fn test_empty_transaction_does_not_notify_or_bump_version() {
        let (mut doc, _, _) = two_paragraph_doc();
        let notifications: Rc<RefCell<usize>> = Rc::default();
        let sink = Rc::clone(&notifications);
        doc.subscribe(move |_| *sink.borrow_mut() += 1);

        doc.begin_transaction();
        doc.commit_transaction();

        assert_eq!(*notifications.borrow(), 0);
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn test_unsubscribe() {
        let (mut doc, first_id, _) = two_paragraph_doc();
        let notifications: Rc<RefCell<usize>> = Rc::default();
        let sink = Rc::clone(&notifications);
        let listener = doc.subscribe(move |_| *sink.borrow_mut() += 1);

        assert!(doc.unsubscribe(listener));
        doc.delete_node(first_id);

        assert_eq!(*notifications.borrow(), 0);
    }
}
