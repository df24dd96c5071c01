//! The built-in edit commands: caret movement, deletion, insertion, and
//! attribution styling. Hosts compose these (and their own commands) into
//! batches executed by the [`Editor`](crate::editing::Editor).

pub mod attributions;
pub mod deletion;
pub mod insertion;
pub mod movement;

pub use attributions::{
    AddTextAttributions, NodeTextRange, RemoveTextAttributions, ToggleTextAttributions,
    selected_text_ranges, selection_has_attributions,
};
pub use deletion::{DeleteDownstream, DeleteSelection, DeleteUpstream};
pub use insertion::{InsertBlockNode, InsertText, SplitParagraph};
pub use movement::{MoveCaret, MoveDirection, MovementModifier, SelectAll};

use crate::editing::document::Document;
use crate::editing::position::DocumentSelection;

/// Read-only copy of the content covered by a selection: each touched
/// node's [`copy_content`](crate::editing::DocumentNode::copy_content)
/// for its covered sub-selection, non-empty segments joined with newlines.
pub fn copy_selected_content(
    document: &Document,
    selection: &DocumentSelection,
) -> anyhow::Result<String> {
    let Some(range) = document.range_between(&selection.base, &selection.extent) else {
        return Ok(String::new());
    };
    let (Some(start_index), Some(end_index)) = (
        document.index_of(range.start.node_id),
        document.index_of(range.end.node_id),
    ) else {
        return Ok(String::new());
    };

    let mut segments = Vec::new();
    for index in start_index..=end_index {
        let Some(node) = document.node_at(index) else {
            break;
        };
        let local_base = if index == start_index {
            range.start.node_position
        } else {
            node.beginning_position()
        };
        let local_extent = if index == end_index {
            range.end.node_position
        } else {
            node.end_position()
        };

        let node_selection = node.compute_selection(local_base, local_extent)?;
        let content = node.copy_content(&node_selection)?;
        if !content.is_empty() {
            segments.push(content);
        }
    }

    Ok(segments.join("\n"))
}
