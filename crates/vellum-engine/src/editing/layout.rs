use crate::editing::document::Document;
use crate::editing::node::NodePosition;
use crate::editing::position::DocumentPosition;

/// Line-geometry collaborator consumed for vertical caret movement and
/// line-boundary modifiers.
///
/// The engine treats the provider as an opaque service: it owns no layout
/// state of its own. `position_one_line_up`/`down` return `None` when the
/// caret would fall off the node's text, which hands control back to the
/// engine's cross-node movement rules.
pub trait DocumentLayout {
    fn position_one_line_up(
        &self,
        document: &Document,
        position: &DocumentPosition,
    ) -> Option<DocumentPosition>;

    fn position_one_line_down(
        &self,
        document: &Document,
        position: &DocumentPosition,
    ) -> Option<DocumentPosition>;

    fn position_at_start_of_line(
        &self,
        document: &Document,
        position: &DocumentPosition,
    ) -> DocumentPosition;

    fn position_at_end_of_line(
        &self,
        document: &Document,
        position: &DocumentPosition,
    ) -> DocumentPosition;
}

/// Geometry-free fallback that treats every text node as a single line.
///
/// Vertical hops always fall off the node, so up/down degrade to whole-node
/// movement; line boundaries clamp to the node's own boundaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLayout;

impl DocumentLayout for NoLayout {
    fn position_one_line_up(
        &self,
        _document: &Document,
        _position: &DocumentPosition,
    ) -> Option<DocumentPosition> {
        None
    }

    fn position_one_line_down(
        &self,
        _document: &Document,
        _position: &DocumentPosition,
    ) -> Option<DocumentPosition> {
        None
    }

    fn position_at_start_of_line(
        &self,
        _document: &Document,
        position: &DocumentPosition,
    ) -> DocumentPosition {
        match position.node_position {
            NodePosition::Text(_) => DocumentPosition::text(position.node_id, 0),
            NodePosition::Block(_) => *position,
        }
    }

    fn position_at_end_of_line(
        &self,
        document: &Document,
        position: &DocumentPosition,
    ) -> DocumentPosition {
        match (document.node_by_id(position.node_id), position.node_position) {
            (Some(node), NodePosition::Text(_)) => {
                DocumentPosition::new(position.node_id, node.end_position())
            }
            _ => *position,
        }
    }
}
