use serde_json::Value;

use crate::editing::editor::{CommandOutcome, EditCommand, Transaction};
use crate::editing::node::{
    Affinity, BLOCK_TYPE_KEY, BlockNode, DocumentNode, Metadata, NodeError, NodePosition, TextNode,
};
use crate::editing::position::{DocumentPosition, DocumentSelection};

/// Insert characters at a collapsed caret in a text node, carrying the
/// composer's current attribution preferences. An expanded or non-text
/// selection rejects; replacing a selection is a host-level composition of
/// delete-then-insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertText {
    text: String,
}

impl InsertText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl EditCommand for InsertText {
    fn execute(&self, tx: &mut Transaction<'_>) -> anyhow::Result<CommandOutcome> {
        let Some(selection) = tx.composer.selection().cloned() else {
            return Ok(CommandOutcome::Rejected);
        };
        if !selection.is_collapsed() {
            return Ok(CommandOutcome::Rejected);
        }
        let position = selection.extent;
        let NodePosition::Text(caret) = position.node_position else {
            return Ok(CommandOutcome::Rejected);
        };

        let attributions = tx.composer.preferences().current_attributions().clone();
        let new_text = {
            let Some(node) = tx.document.node_by_id(position.node_id) else {
                return Ok(CommandOutcome::Rejected);
            };
            let DocumentNode::Text(text_node) = node else {
                return Err(NodeError::PositionKindMismatch {
                    node: node.id(),
                    expected: node.kind_name(),
                    actual: "text",
                }
                .into());
            };
            text_node.text().insert(&self.text, caret.offset, &attributions)?
        };

        tx.document.replace_node_text(position.node_id, new_text)?;
        tx.composer
            .set_selection(Some(DocumentSelection::collapsed(DocumentPosition::text(
                position.node_id,
                caret.offset + self.text.chars().count(),
            ))));
        Ok(CommandOutcome::Changed)
    }
}

/// Split the text node at a collapsed caret into two nodes. The downstream
/// remainder moves to a freshly-identified node and the caret lands at its
/// start. Heading block types stay on the upstream half; the new node
/// resumes as a plain block of the same family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitParagraph;

impl EditCommand for SplitParagraph {
    fn execute(&self, tx: &mut Transaction<'_>) -> anyhow::Result<CommandOutcome> {
        let Some(selection) = tx.composer.selection().cloned() else {
            return Ok(CommandOutcome::Rejected);
        };
        if !selection.is_collapsed() {
            return Ok(CommandOutcome::Rejected);
        }
        let position = selection.extent;
        let NodePosition::Text(caret) = position.node_position else {
            return Ok(CommandOutcome::Rejected);
        };

        let (kept, remainder, metadata) = {
            let Some(node) = tx.document.node_by_id(position.node_id) else {
                return Ok(CommandOutcome::Rejected);
            };
            let DocumentNode::Text(text_node) = node else {
                return Err(NodeError::PositionKindMismatch {
                    node: node.id(),
                    expected: node.kind_name(),
                    actual: "text",
                }
                .into());
            };
            let len = text_node.text().len();
            (
                text_node.text().copy_span(0..caret.offset)?,
                text_node.text().copy_span(caret.offset..len)?,
                split_metadata(text_node.metadata()),
            )
        };

        let new_node = TextNode::new(remainder).with_metadata(metadata);
        let new_id = new_node.id();

        tx.document.replace_node_text(position.node_id, kept)?;
        tx.document
            .insert_node_after(position.node_id, DocumentNode::Text(new_node))?;
        tx.composer
            .set_selection(Some(DocumentSelection::collapsed(DocumentPosition::text(
                new_id, 0,
            ))));
        Ok(CommandOutcome::Changed)
    }
}

/// Metadata for the downstream half of a split: everything carries over
/// except heading block types, which reset to a plain paragraph.
fn split_metadata(metadata: &Metadata) -> Metadata {
    let mut metadata = metadata.clone();
    if let Some(Value::String(block_type)) = metadata.get(BLOCK_TYPE_KEY)
        && block_type.starts_with("header")
    {
        metadata.remove(BLOCK_TYPE_KEY);
    }
    metadata
}

/// Insert a block node (fresh identity supplied by the caller) immediately
/// after the caret's node. When the block is selectable the caret lands on
/// its downstream face; an unselectable block leaves the caret alone.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertBlockNode {
    node: BlockNode,
}

impl InsertBlockNode {
    pub fn new(node: BlockNode) -> Self {
        Self { node }
    }
}

impl EditCommand for InsertBlockNode {
    fn execute(&self, tx: &mut Transaction<'_>) -> anyhow::Result<CommandOutcome> {
        let Some(selection) = tx.composer.selection().cloned() else {
            return Ok(CommandOutcome::Rejected);
        };
        if !selection.is_collapsed() {
            return Ok(CommandOutcome::Rejected);
        }

        let block = self.node.clone();
        let (block_id, selectable) = (block.id(), block.selectable());
        let inserted = tx
            .document
            .insert_node_after(selection.extent.node_id, DocumentNode::Block(block))?;
        if !inserted {
            return Ok(CommandOutcome::Rejected);
        }

        if selectable {
            tx.composer
                .set_selection(Some(DocumentSelection::collapsed(DocumentPosition::block(
                    block_id,
                    Affinity::Downstream,
                ))));
        }
        Ok(CommandOutcome::Changed)
    }
}
