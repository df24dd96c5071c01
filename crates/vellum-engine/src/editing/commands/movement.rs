use crate::editing::document::Document;
use crate::editing::editor::{CommandOutcome, EditCommand, Transaction};
use crate::editing::layout::DocumentLayout;
use crate::editing::node::{Affinity, DocumentNode, NodeError, NodePosition};
use crate::editing::position::{DocumentPosition, DocumentSelection};

/// Which way the caret travels, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Travel {
    Upstream,
    Downstream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Left,
    Right,
    Up,
    Down,
}

impl MoveDirection {
    fn travel(self) -> Travel {
        match self {
            Self::Left | Self::Up => Travel::Upstream,
            Self::Right | Self::Down => Travel::Downstream,
        }
    }

    fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

/// Granularity of a horizontal caret move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementModifier {
    Character,
    Word,
    Line,
}

/// Move or expand the caret.
///
/// Movement walks a three-state machine per step: within-node, crossing to
/// a selectable neighbor, or skipping an unselectable neighbor. Skips chain
/// over consecutive unselectable nodes; when no selectable landing exists
/// in the direction of travel the move is rejected and the selection stays
/// byte-for-byte unchanged. Expansion recomputes only the extent, with
/// identical skip rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveCaret {
    pub direction: MoveDirection,
    pub modifier: MovementModifier,
    pub expand: bool,
}

impl MoveCaret {
    pub fn new(direction: MoveDirection) -> Self {
        Self {
            direction,
            modifier: MovementModifier::Character,
            expand: false,
        }
    }

    pub fn left() -> Self {
        Self::new(MoveDirection::Left)
    }

    pub fn right() -> Self {
        Self::new(MoveDirection::Right)
    }

    pub fn up() -> Self {
        Self::new(MoveDirection::Up)
    }

    pub fn down() -> Self {
        Self::new(MoveDirection::Down)
    }

    pub fn by_word(mut self) -> Self {
        self.modifier = MovementModifier::Word;
        self
    }

    pub fn to_line_boundary(mut self) -> Self {
        self.modifier = MovementModifier::Line;
        self
    }

    pub fn expanding(mut self) -> Self {
        self.expand = true;
        self
    }
}

impl EditCommand for MoveCaret {
    fn execute(&self, tx: &mut Transaction<'_>) -> anyhow::Result<CommandOutcome> {
        let Some(selection) = tx.composer.selection().cloned() else {
            return Ok(CommandOutcome::Rejected);
        };

        // A plain horizontal arrow with an expanded selection collapses to
        // the range edge facing the move, without travelling further.
        if self.direction.is_horizontal() && !self.expand && !selection.is_collapsed() {
            let Some(range) = tx.document.range_between(&selection.base, &selection.extent)
            else {
                return Ok(CommandOutcome::Rejected);
            };
            let edge = match self.direction.travel() {
                Travel::Upstream => range.start,
                Travel::Downstream => range.end,
            };
            tx.composer
                .set_selection(Some(DocumentSelection::collapsed(edge)));
            return Ok(CommandOutcome::Changed);
        }

        let target = if self.direction.is_horizontal() {
            horizontal_target(
                tx.document,
                tx.layout,
                &selection.extent,
                self.direction.travel(),
                self.modifier,
            )?
        } else {
            vertical_target(
                tx.document,
                tx.layout,
                &selection.extent,
                self.direction.travel(),
            )?
        };

        let Some(target) = target else {
            return Ok(CommandOutcome::Rejected);
        };

        let new_selection = if self.expand {
            DocumentSelection::new(selection.base, target)
        } else {
            DocumentSelection::collapsed(target)
        };
        if new_selection == selection {
            return Ok(CommandOutcome::Rejected);
        }

        tx.composer.set_selection(Some(new_selection));
        Ok(CommandOutcome::Changed)
    }
}

/// Select from the beginning of the first node to the end of the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectAll;

impl EditCommand for SelectAll {
    fn execute(&self, tx: &mut Transaction<'_>) -> anyhow::Result<CommandOutcome> {
        let (Some(first), Some(last)) = (tx.document.first_node(), tx.document.last_node())
        else {
            return Ok(CommandOutcome::Rejected);
        };

        let selection = DocumentSelection::new(
            DocumentPosition::new(first.id(), first.beginning_position()),
            DocumentPosition::new(last.id(), last.end_position()),
        );
        if tx.composer.selection() == Some(&selection) {
            return Ok(CommandOutcome::Rejected);
        }

        tx.composer.set_selection(Some(selection));
        Ok(CommandOutcome::Changed)
    }
}

/// The next caret position for a horizontal move, or `None` when the move
/// is rejected (no selectable landing position in that direction).
pub(crate) fn horizontal_target(
    document: &Document,
    layout: &dyn DocumentLayout,
    position: &DocumentPosition,
    travel: Travel,
    modifier: MovementModifier,
) -> Result<Option<DocumentPosition>, NodeError> {
    let Some(index) = document.index_of(position.node_id) else {
        return Ok(None);
    };
    let Some(node) = document.node_at(index) else {
        return Ok(None);
    };

    match (node, &position.node_position) {
        (DocumentNode::Text(text_node), NodePosition::Text(caret)) => {
            let len = text_node.text().len();
            if caret.offset > len {
                return Err(NodeError::OffsetOutOfBounds {
                    node: text_node.id(),
                    offset: caret.offset,
                    len,
                });
            }

            if modifier == MovementModifier::Line {
                let target = match travel {
                    Travel::Upstream => layout.position_at_start_of_line(document, position),
                    Travel::Downstream => layout.position_at_end_of_line(document, position),
                };
                return Ok(Some(target));
            }

            let within = match (travel, modifier) {
                (Travel::Upstream, MovementModifier::Character) => {
                    text_node.text().prev_grapheme_offset(caret.offset)
                }
                (Travel::Downstream, MovementModifier::Character) => {
                    text_node.text().next_grapheme_offset(caret.offset)
                }
                (Travel::Upstream, _) => {
                    (caret.offset > 0).then(|| text_node.text().prev_word_offset(caret.offset))
                }
                (Travel::Downstream, _) => {
                    (caret.offset < len).then(|| text_node.text().next_word_offset(caret.offset))
                }
            };

            match within {
                Some(offset) => Ok(Some(DocumentPosition::text(position.node_id, offset))),
                None => Ok(cross_to_neighbor(document, index, travel)),
            }
        }
        (DocumentNode::Block(_), NodePosition::Block(_)) => {
            // A block is a single caret stop; any horizontal step leaves it.
            Ok(cross_to_neighbor(document, index, travel))
        }
        (node, position) => Err(NodeError::PositionKindMismatch {
            node: node.id(),
            expected: node.kind_name(),
            actual: position.kind_name(),
        }),
    }
}

/// The next caret position for a vertical move. Line geometry is consulted
/// first; falling off the node's text degrades to whole-node movement with
/// the same skip rules as horizontal travel.
pub(crate) fn vertical_target(
    document: &Document,
    layout: &dyn DocumentLayout,
    position: &DocumentPosition,
    travel: Travel,
) -> Result<Option<DocumentPosition>, NodeError> {
    let Some(index) = document.index_of(position.node_id) else {
        return Ok(None);
    };

    if matches!(document.node_at(index), Some(DocumentNode::Text(_))) {
        let hop = match travel {
            Travel::Upstream => layout.position_one_line_up(document, position),
            Travel::Downstream => layout.position_one_line_down(document, position),
        };
        if let Some(target) = hop {
            return Ok(Some(target));
        }
    }

    Ok(cross_to_neighbor(document, index, travel))
}

/// Walk past the node at `from_index` in the direction of travel, chaining
/// over unselectable blocks, until a node that can host the caret is found.
/// `None` when the document edge is reached first.
pub(crate) fn cross_to_neighbor(
    document: &Document,
    from_index: usize,
    travel: Travel,
) -> Option<DocumentPosition> {
    let mut index = from_index;
    loop {
        index = match travel {
            Travel::Downstream => index + 1,
            Travel::Upstream => index.checked_sub(1)?,
        };
        let node = document.node_at(index)?;
        match node {
            DocumentNode::Text(_) => {
                let landing = match travel {
                    Travel::Downstream => node.beginning_position(),
                    Travel::Upstream => node.end_position(),
                };
                return Some(DocumentPosition::new(node.id(), landing));
            }
            DocumentNode::Block(block) if block.selectable() => {
                let affinity = match travel {
                    Travel::Downstream => Affinity::Upstream,
                    Travel::Upstream => Affinity::Downstream,
                };
                return Some(DocumentPosition::block(block.id(), affinity));
            }
            DocumentNode::Block(_) => {}
        }
    }
}
