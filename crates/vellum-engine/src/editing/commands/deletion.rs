use crate::editing::editor::{CommandOutcome, EditCommand, Transaction};
use crate::editing::node::{Affinity, DocumentNode, NodeError, NodeId, NodePosition};
use crate::editing::position::{DocumentPosition, DocumentRange, DocumentSelection};
use crate::text::AttributedText;

use super::movement::Travel;

/// Backspace semantics: delete the selection, or one grapheme upstream, or
/// resolve the upstream node boundary.
///
/// At a text-node boundary the upstream neighbor decides the outcome: a
/// text neighbor merges, a selectable block is deleted (with the caret
/// moving to the node on its far side), and an unselectable block makes the
/// keypress a structural and selection no-op. Removing an unselectable
/// block takes an explicit document-level operation, never this path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteUpstream;

impl EditCommand for DeleteUpstream {
    fn execute(&self, tx: &mut Transaction<'_>) -> anyhow::Result<CommandOutcome> {
        let Some(selection) = tx.composer.selection().cloned() else {
            return Ok(CommandOutcome::Rejected);
        };
        if !selection.is_collapsed() {
            return delete_selection(tx, &selection);
        }
        let position = selection.extent;

        enum Step {
            ReplaceText { text: AttributedText, caret: usize },
            Boundary,
            BlockCaret,
        }

        let step = {
            let Some(node) = tx.document.node_by_id(position.node_id) else {
                return Ok(CommandOutcome::Rejected);
            };
            match (node, &position.node_position) {
                (DocumentNode::Text(text_node), NodePosition::Text(caret)) => {
                    match text_node.text().prev_grapheme_offset(caret.offset) {
                        Some(from) => Step::ReplaceText {
                            text: text_node.text().remove_range(from..caret.offset)?,
                            caret: from,
                        },
                        None => Step::Boundary,
                    }
                }
                (DocumentNode::Block(_), NodePosition::Block(_)) => Step::BlockCaret,
                (node, position) => return Err(mismatch(node, position).into()),
            }
        };

        match step {
            Step::ReplaceText { text, caret } => {
                tx.document.replace_node_text(position.node_id, text)?;
                tx.composer
                    .set_selection(Some(DocumentSelection::collapsed(DocumentPosition::text(
                        position.node_id,
                        caret,
                    ))));
                Ok(CommandOutcome::Changed)
            }
            Step::Boundary => delete_upstream_boundary(tx, position.node_id),
            Step::BlockCaret => remove_block_at_caret(tx, position.node_id, Travel::Upstream),
        }
    }
}

/// Forward-delete semantics, the downstream mirror of [`DeleteUpstream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteDownstream;

impl EditCommand for DeleteDownstream {
    fn execute(&self, tx: &mut Transaction<'_>) -> anyhow::Result<CommandOutcome> {
        let Some(selection) = tx.composer.selection().cloned() else {
            return Ok(CommandOutcome::Rejected);
        };
        if !selection.is_collapsed() {
            return delete_selection(tx, &selection);
        }
        let position = selection.extent;

        enum Step {
            ReplaceText { text: AttributedText, caret: usize },
            Boundary,
            BlockCaret,
        }

        let step = {
            let Some(node) = tx.document.node_by_id(position.node_id) else {
                return Ok(CommandOutcome::Rejected);
            };
            match (node, &position.node_position) {
                (DocumentNode::Text(text_node), NodePosition::Text(caret)) => {
                    match text_node.text().next_grapheme_offset(caret.offset) {
                        Some(to) => Step::ReplaceText {
                            text: text_node.text().remove_range(caret.offset..to)?,
                            caret: caret.offset,
                        },
                        None => Step::Boundary,
                    }
                }
                (DocumentNode::Block(_), NodePosition::Block(_)) => Step::BlockCaret,
                (node, position) => return Err(mismatch(node, position).into()),
            }
        };

        match step {
            Step::ReplaceText { text, caret } => {
                tx.document.replace_node_text(position.node_id, text)?;
                tx.composer
                    .set_selection(Some(DocumentSelection::collapsed(DocumentPosition::text(
                        position.node_id,
                        caret,
                    ))));
                Ok(CommandOutcome::Changed)
            }
            Step::Boundary => delete_downstream_boundary(tx, position.node_id),
            Step::BlockCaret => remove_block_at_caret(tx, position.node_id, Travel::Downstream),
        }
    }
}

/// Delete the current expanded selection and collapse to its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteSelection;

impl EditCommand for DeleteSelection {
    fn execute(&self, tx: &mut Transaction<'_>) -> anyhow::Result<CommandOutcome> {
        let Some(selection) = tx.composer.selection().cloned() else {
            return Ok(CommandOutcome::Rejected);
        };
        if selection.is_collapsed() {
            return Ok(CommandOutcome::Rejected);
        }
        delete_selection(tx, &selection)
    }
}

enum UpstreamPlan {
    Edge,
    NoOp,
    Merge {
        upstream_id: NodeId,
        junction: usize,
        merged: AttributedText,
    },
    DeleteBlock {
        block_id: NodeId,
        caret: Option<DocumentPosition>,
    },
}

fn delete_upstream_boundary(
    tx: &mut Transaction<'_>,
    current_id: NodeId,
) -> anyhow::Result<CommandOutcome> {
    let plan = {
        let document = &tx.document;
        let Some(index) = document.index_of(current_id) else {
            return Ok(CommandOutcome::Rejected);
        };
        match index.checked_sub(1).and_then(|i| document.node_at(i)) {
            None => UpstreamPlan::Edge,
            Some(DocumentNode::Text(upstream)) => {
                let Some(current) = document.node_by_id(current_id).and_then(DocumentNode::as_text)
                else {
                    return Ok(CommandOutcome::Rejected);
                };
                UpstreamPlan::Merge {
                    upstream_id: upstream.id(),
                    junction: upstream.text().len(),
                    merged: upstream.text().append(current.text()),
                }
            }
            Some(DocumentNode::Block(block)) if block.selectable() => UpstreamPlan::DeleteBlock {
                block_id: block.id(),
                caret: index
                    .checked_sub(2)
                    .and_then(|i| document.node_at(i))
                    .map(|far| DocumentPosition::new(far.id(), far.end_position())),
            },
            Some(DocumentNode::Block(_)) => UpstreamPlan::NoOp,
        }
    };

    match plan {
        UpstreamPlan::Edge | UpstreamPlan::NoOp => Ok(CommandOutcome::Rejected),
        UpstreamPlan::Merge {
            upstream_id,
            junction,
            merged,
        } => {
            tx.document.replace_node_text(upstream_id, merged)?;
            tx.document.delete_node(current_id);
            tx.composer
                .set_selection(Some(DocumentSelection::collapsed(DocumentPosition::text(
                    upstream_id,
                    junction,
                ))));
            Ok(CommandOutcome::Changed)
        }
        UpstreamPlan::DeleteBlock { block_id, caret } => {
            tx.document.delete_node(block_id);
            if let Some(caret) = caret {
                tx.composer
                    .set_selection(Some(DocumentSelection::collapsed(caret)));
            }
            Ok(CommandOutcome::Changed)
        }
    }
}

enum DownstreamPlan {
    Edge,
    NoOp,
    Merge {
        downstream_id: NodeId,
        junction: usize,
        merged: AttributedText,
    },
    DeleteBlock {
        block_id: NodeId,
        caret: Option<DocumentPosition>,
    },
}

fn delete_downstream_boundary(
    tx: &mut Transaction<'_>,
    current_id: NodeId,
) -> anyhow::Result<CommandOutcome> {
    let plan = {
        let document = &tx.document;
        let Some(index) = document.index_of(current_id) else {
            return Ok(CommandOutcome::Rejected);
        };
        match document.node_at(index + 1) {
            None => DownstreamPlan::Edge,
            Some(DocumentNode::Text(downstream)) => {
                let Some(current) = document.node_by_id(current_id).and_then(DocumentNode::as_text)
                else {
                    return Ok(CommandOutcome::Rejected);
                };
                DownstreamPlan::Merge {
                    downstream_id: downstream.id(),
                    junction: current.text().len(),
                    merged: current.text().append(downstream.text()),
                }
            }
            Some(DocumentNode::Block(block)) if block.selectable() => {
                DownstreamPlan::DeleteBlock {
                    block_id: block.id(),
                    caret: document
                        .node_at(index + 2)
                        .map(|far| DocumentPosition::new(far.id(), far.beginning_position())),
                }
            }
            Some(DocumentNode::Block(_)) => DownstreamPlan::NoOp,
        }
    };

    match plan {
        DownstreamPlan::Edge | DownstreamPlan::NoOp => Ok(CommandOutcome::Rejected),
        DownstreamPlan::Merge {
            downstream_id,
            junction,
            merged,
        } => {
            tx.document.replace_node_text(current_id, merged)?;
            tx.document.delete_node(downstream_id);
            tx.composer
                .set_selection(Some(DocumentSelection::collapsed(DocumentPosition::text(
                    current_id, junction,
                ))));
            Ok(CommandOutcome::Changed)
        }
        DownstreamPlan::DeleteBlock { block_id, caret } => {
            tx.document.delete_node(block_id);
            if let Some(caret) = caret {
                tx.composer
                    .set_selection(Some(DocumentSelection::collapsed(caret)));
            }
            Ok(CommandOutcome::Changed)
        }
    }
}

/// Delete the block the caret rests on, landing the caret on the neighbor
/// facing the delete direction (or the other neighbor at a document edge).
fn remove_block_at_caret(
    tx: &mut Transaction<'_>,
    block_id: NodeId,
    travel: Travel,
) -> anyhow::Result<CommandOutcome> {
    let caret = {
        let document = &tx.document;
        let Some(index) = document.index_of(block_id) else {
            return Ok(CommandOutcome::Rejected);
        };
        let upstream = index
            .checked_sub(1)
            .and_then(|i| document.node_at(i))
            .map(|node| DocumentPosition::new(node.id(), node.end_position()));
        let downstream = document
            .node_at(index + 1)
            .map(|node| DocumentPosition::new(node.id(), node.beginning_position()));
        match travel {
            Travel::Upstream => upstream.or(downstream),
            Travel::Downstream => downstream.or(upstream),
        }
    };

    tx.document.delete_node(block_id);
    tx.composer
        .set_selection(caret.map(DocumentSelection::collapsed));
    Ok(CommandOutcome::Changed)
}

/// Where an edge node of a multi-node deletion ends up.
enum EdgePlan {
    TrimText {
        id: NodeId,
        text: AttributedText,
        offset: usize,
    },
    RemoveBlock {
        id: NodeId,
    },
    KeepBlock {
        id: NodeId,
    },
}

/// Shared range deletion: trim the boundary text nodes, remove everything
/// in between, merge the surviving text remainders, and collapse the caret
/// to the range start.
pub(crate) fn delete_selection(
    tx: &mut Transaction<'_>,
    selection: &DocumentSelection,
) -> anyhow::Result<CommandOutcome> {
    let Some(range) = tx.document.range_between(&selection.base, &selection.extent) else {
        return Ok(CommandOutcome::Rejected);
    };
    if range.start == range.end {
        return Ok(CommandOutcome::Rejected);
    }
    let (Some(start_index), Some(end_index)) = (
        tx.document.index_of(range.start.node_id),
        tx.document.index_of(range.end.node_id),
    ) else {
        return Ok(CommandOutcome::Rejected);
    };

    if start_index == end_index {
        return delete_within_single_node(tx, &range);
    }

    let (first_plan, last_plan, interior) = {
        let document = &tx.document;
        let interior: Vec<NodeId> = (start_index + 1..end_index)
            .filter_map(|i| document.node_at(i).map(DocumentNode::id))
            .collect();

        let Some(first) = document.node_at(start_index) else {
            return Ok(CommandOutcome::Rejected);
        };
        let first_plan = match (first, &range.start.node_position) {
            (DocumentNode::Text(node), NodePosition::Text(caret)) => EdgePlan::TrimText {
                id: node.id(),
                text: node.text().remove_range(caret.offset..node.text().len())?,
                offset: caret.offset,
            },
            (DocumentNode::Block(node), NodePosition::Block(face)) => {
                if face.affinity == Affinity::Upstream {
                    EdgePlan::RemoveBlock { id: node.id() }
                } else {
                    EdgePlan::KeepBlock { id: node.id() }
                }
            }
            (node, position) => return Err(mismatch(node, position).into()),
        };

        let Some(last) = document.node_at(end_index) else {
            return Ok(CommandOutcome::Rejected);
        };
        let last_plan = match (last, &range.end.node_position) {
            (DocumentNode::Text(node), NodePosition::Text(caret)) => EdgePlan::TrimText {
                id: node.id(),
                text: node.text().remove_range(0..caret.offset)?,
                offset: caret.offset,
            },
            (DocumentNode::Block(node), NodePosition::Block(face)) => {
                if face.affinity == Affinity::Downstream {
                    EdgePlan::RemoveBlock { id: node.id() }
                } else {
                    EdgePlan::KeepBlock { id: node.id() }
                }
            }
            (node, position) => return Err(mismatch(node, position).into()),
        };

        (first_plan, last_plan, interior)
    };

    for id in interior {
        tx.document.delete_node(id);
    }

    let caret = match (first_plan, last_plan) {
        (
            EdgePlan::TrimText {
                id: first_id,
                text: first_text,
                offset,
            },
            EdgePlan::TrimText {
                id: last_id,
                text: remainder,
                ..
            },
        ) => {
            tx.document
                .replace_node_text(first_id, first_text.append(&remainder))?;
            tx.document.delete_node(last_id);
            Some(DocumentPosition::text(first_id, offset))
        }
        (
            EdgePlan::TrimText {
                id: first_id,
                text,
                offset,
            },
            last,
        ) => {
            tx.document.replace_node_text(first_id, text)?;
            if let EdgePlan::RemoveBlock { id } = last {
                tx.document.delete_node(id);
            }
            Some(DocumentPosition::text(first_id, offset))
        }
        (
            first,
            EdgePlan::TrimText {
                id: last_id, text, ..
            },
        ) => {
            if let EdgePlan::RemoveBlock { id } = first {
                tx.document.delete_node(id);
            }
            tx.document.replace_node_text(last_id, text)?;
            Some(DocumentPosition::text(last_id, 0))
        }
        (first, last) => {
            if let EdgePlan::RemoveBlock { id } = last {
                tx.document.delete_node(id);
            }
            match first {
                EdgePlan::KeepBlock { id } => {
                    Some(DocumentPosition::block(id, Affinity::Downstream))
                }
                EdgePlan::RemoveBlock { id } => {
                    let upstream = tx
                        .document
                        .node_before(id)
                        .map(|node| DocumentPosition::new(node.id(), node.end_position()));
                    tx.document.delete_node(id);
                    upstream.or_else(|| {
                        tx.document
                            .first_node()
                            .map(|node| DocumentPosition::new(node.id(), node.beginning_position()))
                    })
                }
                EdgePlan::TrimText { .. } => None,
            }
        }
    };

    tx.composer
        .set_selection(caret.map(DocumentSelection::collapsed));
    Ok(CommandOutcome::Changed)
}

fn delete_within_single_node(
    tx: &mut Transaction<'_>,
    range: &DocumentRange,
) -> anyhow::Result<CommandOutcome> {
    let id = range.start.node_id;

    enum Plan {
        Text { text: AttributedText, offset: usize },
        Block,
    }

    let plan = {
        let Some(node) = tx.document.node_by_id(id) else {
            return Ok(CommandOutcome::Rejected);
        };
        match (node, &range.start.node_position, &range.end.node_position) {
            (DocumentNode::Text(text_node), NodePosition::Text(a), NodePosition::Text(b)) => {
                let (low, high) = (a.offset.min(b.offset), a.offset.max(b.offset));
                Plan::Text {
                    text: text_node.text().remove_range(low..high)?,
                    offset: low,
                }
            }
            (DocumentNode::Block(_), NodePosition::Block(_), NodePosition::Block(_)) => Plan::Block,
            (node, position, _) => return Err(mismatch(node, position).into()),
        }
    };

    match plan {
        Plan::Text { text, offset } => {
            tx.document.replace_node_text(id, text)?;
            tx.composer
                .set_selection(Some(DocumentSelection::collapsed(DocumentPosition::text(
                    id, offset,
                ))));
        }
        Plan::Block => {
            let caret = tx
                .document
                .node_before(id)
                .map(|node| DocumentPosition::new(node.id(), node.end_position()))
                .or_else(|| {
                    tx.document
                        .node_after(id)
                        .map(|node| DocumentPosition::new(node.id(), node.beginning_position()))
                });
            tx.document.delete_node(id);
            tx.composer
                .set_selection(caret.map(DocumentSelection::collapsed));
        }
    }
    Ok(CommandOutcome::Changed)
}

fn mismatch(node: &DocumentNode, position: &NodePosition) -> NodeError {
    NodeError::PositionKindMismatch {
        node: node.id(),
        expected: node.kind_name(),
        actual: position.kind_name(),
    }
}
