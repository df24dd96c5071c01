use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::text::{AttributedText, TextError};

/// Metadata key conventionally used to tag a text node's block type
/// (e.g. `"header1"`, `"blockquote"`). The engine itself only inspects it
/// when splitting paragraphs; everything else is host-defined.
pub const BLOCK_TYPE_KEY: &str = "blockType";

/// Stable node identity. Assigned at node creation, unique within a
/// document, and never reused after removal. Selections reference nodes by
/// id precisely because indices shift under structural edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    /// A fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Disambiguates a caret at a boundary: `Upstream` leans toward the
/// start of the document, `Downstream` toward the end.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Affinity {
    Upstream,
    #[default]
    Downstream,
}

/// A caret position inside a text node: a character offset in
/// `[0, text.len()]` plus a boundary affinity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TextPosition {
    pub offset: usize,
    pub affinity: Affinity,
}

impl TextPosition {
    pub fn new(offset: usize) -> Self {
        Self {
            offset,
            affinity: Affinity::Downstream,
        }
    }

    pub fn with_affinity(offset: usize, affinity: Affinity) -> Self {
        Self { offset, affinity }
    }
}

/// The single sentinel position of a block node. The affinity records which
/// face of the block the caret rests on: `Upstream` is "just before",
/// `Downstream` is "just after". The block has no interior positions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BlockPosition {
    pub affinity: Affinity,
}

impl BlockPosition {
    pub fn upstream() -> Self {
        Self {
            affinity: Affinity::Upstream,
        }
    }

    pub fn downstream() -> Self {
        Self {
            affinity: Affinity::Downstream,
        }
    }
}

/// A node-local position, tagged by node kind. Cross-kind usage is a
/// checked contract violation, never a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodePosition {
    Text(TextPosition),
    Block(BlockPosition),
}

impl NodePosition {
    pub fn text(offset: usize) -> Self {
        Self::Text(TextPosition::new(offset))
    }

    pub fn block(affinity: Affinity) -> Self {
        Self::Block(BlockPosition { affinity })
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Block(_) => "block",
        }
    }
}

/// A node-local base/extent selection inside a text node. Base and extent
/// preserve gesture direction; use [`TextSelection::normalized_offsets`] for
/// the document-order range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextSelection {
    pub base: TextPosition,
    pub extent: TextPosition,
}

impl TextSelection {
    pub fn collapsed(position: TextPosition) -> Self {
        Self {
            base: position,
            extent: position,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.base == self.extent
    }

    /// `(start, end)` character offsets in node order, end exclusive.
    pub fn normalized_offsets(&self) -> (usize, usize) {
        if self.base.offset <= self.extent.offset {
            (self.base.offset, self.extent.offset)
        } else {
            (self.extent.offset, self.base.offset)
        }
    }
}

/// A node-local base/extent selection over a block node's two faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockSelection {
    pub base: BlockPosition,
    pub extent: BlockPosition,
}

impl BlockSelection {
    pub fn is_collapsed(&self) -> bool {
        self.base == self.extent
    }
}

/// A node-local selection, tagged by node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeSelection {
    Text(TextSelection),
    Block(BlockSelection),
}

/// Errors raised by the node-local position algebra. `PositionKindMismatch`
/// and `OffsetOutOfBounds` are contract violations: a caller handed a node
/// a position that cannot address it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    #[error("node {node} is a {expected} node but was given a {actual} position")]
    PositionKindMismatch {
        node: NodeId,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("offset {offset} is beyond the text of node {node} (length {len})")]
    OffsetOutOfBounds {
        node: NodeId,
        offset: usize,
        len: usize,
    },
    #[error(transparent)]
    Text(#[from] TextError),
}

/// Arbitrary host-defined node metadata.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A text-bearing node: paragraphs, list items, headings, anything whose
/// block type is expressed through metadata rather than a distinct shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    id: NodeId,
    text: AttributedText,
    metadata: Metadata,
}

impl TextNode {
    pub fn new(text: impl Into<AttributedText>) -> Self {
        Self {
            id: NodeId::new(),
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_id(id: NodeId, text: impl Into<AttributedText>) -> Self {
        Self {
            id,
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Tag this node's block type (see [`BLOCK_TYPE_KEY`]).
    pub fn with_block_type(mut self, block_type: impl Into<String>) -> Self {
        self.metadata.insert(
            BLOCK_TYPE_KEY.to_string(),
            serde_json::Value::String(block_type.into()),
        );
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn text(&self) -> &AttributedText {
        &self.text
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub(crate) fn set_text(&mut self, text: AttributedText) {
        self.text = text;
    }
}

/// The content of a non-text block node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockContent {
    HorizontalRule,
    Image { url: String, alt: Option<String> },
}

/// An opaque block node: no interior addressable content, a single sentinel
/// position with two faces. Unselectable blocks never host a caret but are
/// still traversed (and skipped over) by navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    id: NodeId,
    content: BlockContent,
    selectable: bool,
    metadata: Metadata,
}

impl BlockNode {
    pub fn new(content: BlockContent) -> Self {
        Self {
            id: NodeId::new(),
            content,
            selectable: true,
            metadata: Metadata::new(),
        }
    }

    pub fn horizontal_rule() -> Self {
        Self::new(BlockContent::HorizontalRule)
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self::new(BlockContent::Image {
            url: url.into(),
            alt: None,
        })
    }

    pub fn with_id(id: NodeId, content: BlockContent) -> Self {
        Self {
            id,
            content,
            selectable: true,
            metadata: Metadata::new(),
        }
    }

    pub fn unselectable(mut self) -> Self {
        self.selectable = false;
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn content(&self) -> &BlockContent {
        &self.content
    }

    pub fn selectable(&self) -> bool {
        self.selectable
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn content_token(&self) -> String {
        match &self.content {
            BlockContent::HorizontalRule => "---".to_string(),
            BlockContent::Image { url, .. } => url.clone(),
        }
    }
}

/// One block-level unit of document structure.
///
/// The two kinds form a closed set; every position/selection operation
/// dispatches exhaustively and reports cross-kind calls as [`NodeError`]s.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentNode {
    Text(TextNode),
    Block(BlockNode),
}

impl DocumentNode {
    pub fn id(&self) -> NodeId {
        match self {
            Self::Text(node) => node.id(),
            Self::Block(node) => node.id(),
        }
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            Self::Text(node) => node.metadata(),
            Self::Block(node) => node.metadata(),
        }
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            Self::Text(node) => Some(node),
            Self::Block(_) => None,
        }
    }

    pub fn as_block(&self) -> Option<&BlockNode> {
        match self {
            Self::Block(node) => Some(node),
            Self::Text(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Whether a caret may rest on this node. Text nodes always accept a
    /// caret; block nodes only when their `selectable` flag is set.
    pub fn is_selectable(&self) -> bool {
        match self {
            Self::Text(_) => true,
            Self::Block(node) => node.selectable(),
        }
    }

    /// The earliest caret position in this node.
    pub fn beginning_position(&self) -> NodePosition {
        match self {
            Self::Text(_) => NodePosition::text(0),
            Self::Block(_) => NodePosition::Block(BlockPosition::upstream()),
        }
    }

    /// The latest caret position in this node.
    pub fn end_position(&self) -> NodePosition {
        match self {
            Self::Text(node) => NodePosition::text(node.text().len()),
            Self::Block(_) => NodePosition::Block(BlockPosition::downstream()),
        }
    }

    /// Order two positions in node-local order. Fails on a kind mismatch or
    /// an out-of-bounds text offset.
    pub fn compare_positions(
        &self,
        a: &NodePosition,
        b: &NodePosition,
    ) -> Result<Ordering, NodeError> {
        match (self, a, b) {
            (Self::Text(node), NodePosition::Text(pa), NodePosition::Text(pb)) => {
                let len = node.text().len();
                for position in [pa, pb] {
                    if position.offset > len {
                        return Err(NodeError::OffsetOutOfBounds {
                            node: node.id(),
                            offset: position.offset,
                            len,
                        });
                    }
                }
                Ok(pa.cmp(pb))
            }
            (Self::Block(_), NodePosition::Block(pa), NodePosition::Block(pb)) => Ok(pa.cmp(pb)),
            (_, a, b) => {
                let offending = if a.kind_name() != self.kind_name() { a } else { b };
                Err(self.kind_mismatch(offending))
            }
        }
    }

    /// Whichever of the two positions comes first in node-local order.
    pub fn select_upstream_position(
        &self,
        a: NodePosition,
        b: NodePosition,
    ) -> Result<NodePosition, NodeError> {
        Ok(match self.compare_positions(&a, &b)? {
            Ordering::Greater => b,
            _ => a,
        })
    }

    /// Whichever of the two positions comes last in node-local order.
    pub fn select_downstream_position(
        &self,
        a: NodePosition,
        b: NodePosition,
    ) -> Result<NodePosition, NodeError> {
        Ok(match self.compare_positions(&a, &b)? {
            Ordering::Less => b,
            _ => a,
        })
    }

    /// Build this node's selection type from two of its positions.
    pub fn compute_selection(
        &self,
        base: NodePosition,
        extent: NodePosition,
    ) -> Result<NodeSelection, NodeError> {
        self.compare_positions(&base, &extent)?;
        match (base, extent) {
            (NodePosition::Text(base), NodePosition::Text(extent)) => {
                Ok(NodeSelection::Text(TextSelection { base, extent }))
            }
            (NodePosition::Block(base), NodePosition::Block(extent)) => {
                Ok(NodeSelection::Block(BlockSelection { base, extent }))
            }
            (a, b) => {
                let offending = if a.kind_name() != self.kind_name() { a } else { b };
                Err(self.kind_mismatch(&offending))
            }
        }
    }

    /// The textual content covered by a node-local selection. Text nodes
    /// return the selected slice; block nodes return a representational
    /// token (`"---"` for a rule, the URL for an image) when the selection
    /// spans the block, or an empty string when collapsed.
    pub fn copy_content(&self, selection: &NodeSelection) -> Result<String, NodeError> {
        match (self, selection) {
            (Self::Text(node), NodeSelection::Text(sel)) => {
                let (start, end) = sel.normalized_offsets();
                Ok(node.text().span_text(start..end)?.to_string())
            }
            (Self::Block(node), NodeSelection::Block(sel)) => {
                if sel.is_collapsed() {
                    Ok(String::new())
                } else {
                    Ok(node.content_token())
                }
            }
            (_, selection) => {
                let kind = match selection {
                    NodeSelection::Text(_) => "text",
                    NodeSelection::Block(_) => "block",
                };
                Err(NodeError::PositionKindMismatch {
                    node: self.id(),
                    expected: self.kind_name(),
                    actual: kind,
                })
            }
        }
    }

    /// Value equality ignoring node identity, used for content diffing.
    pub fn has_equivalent_content(&self, other: &DocumentNode) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => {
                a.text() == b.text() && a.metadata() == b.metadata()
            }
            (Self::Block(a), Self::Block(b)) => {
                a.content() == b.content()
                    && a.selectable() == b.selectable()
                    && a.metadata() == b.metadata()
            }
            _ => false,
        }
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Block(_) => "block",
        }
    }

    fn kind_mismatch(&self, position: &NodePosition) -> NodeError {
        NodeError::PositionKindMismatch {
            node: self.id(),
            expected: self.kind_name(),
            actual: position.kind_name(),
        }
    }
}

impl From<TextNode> for DocumentNode {
    fn from(node: TextNode) -> Self {
        Self::Text(node)
    }
}

impl From<BlockNode> for DocumentNode {
    fn from(node: BlockNode) -> Self {
        Self::Block(node)
    }
}
