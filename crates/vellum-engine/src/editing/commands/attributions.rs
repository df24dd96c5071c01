use std::collections::HashSet;

use crate::editing::document::Document;
use crate::editing::editor::{CommandOutcome, EditCommand, Transaction};
use crate::editing::node::{DocumentNode, NodeId, NodePosition};
use crate::editing::position::DocumentSelection;
use crate::text::Attribution;

/// An inclusive character range within one text node, produced by
/// [`selected_text_ranges`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeTextRange {
    pub node_id: NodeId,
    /// First included character offset.
    pub start: usize,
    /// Last included character offset.
    pub end: usize,
}

/// Decompose a document selection into per-text-node inclusive character
/// ranges.
///
/// This is the one shared resolution used by every attribution command and
/// query: a single node covering base and extent yields
/// `[min, max - 1]`; the first node of a multi-node selection yields
/// `[boundary, len - 1]`; the last yields `[0, boundary - 1]`; interior
/// text nodes yield `[0, len - 1]`. Empty ranges are dropped and non-text
/// nodes are skipped entirely, since attributions only apply to text.
pub fn selected_text_ranges(
    document: &Document,
    selection: &DocumentSelection,
) -> Vec<NodeTextRange> {
    let Some(range) = document.range_between(&selection.base, &selection.extent) else {
        return Vec::new();
    };
    let (Some(start_index), Some(end_index)) = (
        document.index_of(range.start.node_id),
        document.index_of(range.end.node_id),
    ) else {
        return Vec::new();
    };

    let mut ranges = Vec::new();

    if start_index == end_index {
        if let (Some(DocumentNode::Text(node)), NodePosition::Text(a), NodePosition::Text(b)) = (
            document.node_at(start_index),
            &range.start.node_position,
            &range.end.node_position,
        ) {
            let (low, high) = (a.offset.min(b.offset), a.offset.max(b.offset));
            if high > low {
                ranges.push(NodeTextRange {
                    node_id: node.id(),
                    start: low,
                    end: high - 1,
                });
            }
        }
        return ranges;
    }

    for index in start_index..=end_index {
        let Some(DocumentNode::Text(node)) = document.node_at(index) else {
            continue;
        };
        let len = node.text().len();

        if index == start_index {
            let NodePosition::Text(boundary) = &range.start.node_position else {
                continue;
            };
            if boundary.offset < len {
                ranges.push(NodeTextRange {
                    node_id: node.id(),
                    start: boundary.offset,
                    end: len - 1,
                });
            }
        } else if index == end_index {
            let NodePosition::Text(boundary) = &range.end.node_position else {
                continue;
            };
            if boundary.offset > 0 {
                ranges.push(NodeTextRange {
                    node_id: node.id(),
                    start: 0,
                    end: boundary.offset - 1,
                });
            }
        } else if len > 0 {
            ranges.push(NodeTextRange {
                node_id: node.id(),
                start: 0,
                end: len - 1,
            });
        }
    }

    ranges
}

/// True when every requested attribution covers at least one character
/// somewhere in the selection.
pub fn selection_has_attributions(
    document: &Document,
    selection: &DocumentSelection,
    attributions: &[Attribution],
) -> bool {
    let ranges = selected_text_ranges(document, selection);
    if ranges.is_empty() {
        return false;
    }
    attributions.iter().all(|attribution| {
        ranges.iter().any(|range| {
            document
                .node_by_id(range.node_id)
                .and_then(DocumentNode::as_text)
                .is_some_and(|node| {
                    node.text().has_attributions_within(
                        std::slice::from_ref(attribution),
                        range.start..=range.end,
                    )
                })
        })
    })
}

/// Apply attributions across every text range the selection touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddTextAttributions {
    selection: DocumentSelection,
    attributions: HashSet<Attribution>,
}

impl AddTextAttributions {
    pub fn new(selection: DocumentSelection, attributions: HashSet<Attribution>) -> Self {
        Self {
            selection,
            attributions,
        }
    }
}

impl EditCommand for AddTextAttributions {
    fn execute(&self, tx: &mut Transaction<'_>) -> anyhow::Result<CommandOutcome> {
        apply_to_ranges(tx, &self.selection, |text, range| {
            let mut styled = text.clone();
            for attribution in &self.attributions {
                styled = styled.add_attribution(attribution.clone(), range.start..=range.end)?;
            }
            Ok(styled)
        })
    }
}

/// Remove attributions across every text range the selection touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveTextAttributions {
    selection: DocumentSelection,
    attributions: HashSet<Attribution>,
}

impl RemoveTextAttributions {
    pub fn new(selection: DocumentSelection, attributions: HashSet<Attribution>) -> Self {
        Self {
            selection,
            attributions,
        }
    }
}

impl EditCommand for RemoveTextAttributions {
    fn execute(&self, tx: &mut Transaction<'_>) -> anyhow::Result<CommandOutcome> {
        apply_to_ranges(tx, &self.selection, |text, range| {
            let mut unstyled = text.clone();
            for attribution in &self.attributions {
                unstyled = unstyled.remove_attribution(attribution, range.start..=range.end)?;
            }
            Ok(unstyled)
        })
    }
}

/// Toggle attributions over the selection.
///
/// The toggle is global-any, not per-node: if *any* touched range already
/// carries *any* of the requested attributions, the whole operation removes
/// them from every touched range; only a fully absent set gets added. With
/// a collapsed selection the toggle flips the composer's preference set
/// instead, styling the next insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleTextAttributions {
    selection: DocumentSelection,
    attributions: HashSet<Attribution>,
}

impl ToggleTextAttributions {
    pub fn new(selection: DocumentSelection, attributions: HashSet<Attribution>) -> Self {
        Self {
            selection,
            attributions,
        }
    }
}

impl EditCommand for ToggleTextAttributions {
    fn execute(&self, tx: &mut Transaction<'_>) -> anyhow::Result<CommandOutcome> {
        if self.attributions.is_empty() {
            return Ok(CommandOutcome::Rejected);
        }
        if self.selection.is_collapsed() {
            for attribution in &self.attributions {
                tx.composer
                    .preferences_mut()
                    .toggle_attribution(attribution.clone());
            }
            return Ok(CommandOutcome::Changed);
        }

        let requested: Vec<Attribution> = self.attributions.iter().cloned().collect();
        let ranges = selected_text_ranges(tx.document, &self.selection);
        let any_present = ranges.iter().any(|range| {
            tx.document
                .node_by_id(range.node_id)
                .and_then(DocumentNode::as_text)
                .is_some_and(|node| {
                    node.text()
                        .has_any_attribution_within(&requested, range.start..=range.end)
                })
        });

        if any_present {
            RemoveTextAttributions::new(self.selection.clone(), self.attributions.clone())
                .execute(tx)
        } else {
            AddTextAttributions::new(self.selection.clone(), self.attributions.clone()).execute(tx)
        }
    }
}

fn apply_to_ranges(
    tx: &mut Transaction<'_>,
    selection: &DocumentSelection,
    restyle: impl Fn(
        &crate::text::AttributedText,
        &NodeTextRange,
    ) -> Result<crate::text::AttributedText, crate::text::TextError>,
) -> anyhow::Result<CommandOutcome> {
    let ranges = selected_text_ranges(tx.document, selection);
    if ranges.is_empty() {
        return Ok(CommandOutcome::Rejected);
    }

    for range in &ranges {
        let restyled = {
            let Some(node) = tx
                .document
                .node_by_id(range.node_id)
                .and_then(DocumentNode::as_text)
            else {
                continue;
            };
            restyle(node.text(), range)?
        };
        tx.document.replace_node_text(range.node_id, restyled)?;
    }
    Ok(CommandOutcome::Changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::document::Document;
    use crate::editing::editor::Editor;
    use crate::editing::node::{BlockNode, TextNode};
    use crate::editing::position::DocumentPosition;
    use crate::text::AttributionSpan;

    fn doc_editor(nodes: Vec<DocumentNode>) -> Editor {
        Editor::new(Document::from_nodes(nodes).expect("Should build document"))
    }

    fn spans_of(editor: &Editor, id: NodeId) -> Vec<AttributionSpan> {
        editor
            .document()
            .node_by_id(id)
            .and_then(DocumentNode::as_text)
            .expect("Should be a text node")
            .text()
            .spans()
            .to_vec()
    }

    // ============ Range resolution tests ============

    #[test]
    fn test_single_node_selection_resolves_to_inclusive_range() {
        let node = DocumentNode::Text(TextNode::new("abcdef"));
        let id = node.id();
        let document = Document::from_nodes(vec![node]).expect("Should build document");
        let selection = DocumentSelection::new(
            DocumentPosition::text(id, 4),
            DocumentPosition::text(id, 1),
        );

        let ranges = selected_text_ranges(&document, &selection);

        assert_eq!(
            ranges,
            vec![NodeTextRange {
                node_id: id,
                start: 1,
                end: 3
            }]
        );
    }

    #[test]
    fn test_collapsed_selection_resolves_to_no_ranges() {
        let node = DocumentNode::Text(TextNode::new("abc"));
        let id = node.id();
        let document = Document::from_nodes(vec![node]).expect("Should build document");
        let selection = DocumentSelection::collapsed(DocumentPosition::text(id, 1));

        assert!(selected_text_ranges(&document, &selection).is_empty());
    }

    #[test]
    fn test_multi_node_selection_resolves_boundary_and_interior_ranges() {
        let first = DocumentNode::Text(TextNode::new("hello"));
        let middle = DocumentNode::Text(TextNode::new("mid"));
        let last = DocumentNode::Text(TextNode::new("world"));
        let (first_id, middle_id, last_id) = (first.id(), middle.id(), last.id());
        let document =
            Document::from_nodes(vec![first, middle, last]).expect("Should build document");
        let selection = DocumentSelection::new(
            DocumentPosition::text(first_id, 2),
            DocumentPosition::text(last_id, 3),
        );

        let ranges = selected_text_ranges(&document, &selection);

        assert_eq!(
            ranges,
            vec![
                NodeTextRange {
                    node_id: first_id,
                    start: 2,
                    end: 4
                },
                NodeTextRange {
                    node_id: middle_id,
                    start: 0,
                    end: 2
                },
                NodeTextRange {
                    node_id: last_id,
                    start: 0,
                    end: 2
                },
            ]
        );
    }

    #[test]
    fn test_resolution_skips_non_text_nodes_and_empty_boundaries() {
        let first = DocumentNode::Text(TextNode::new("ab"));
        let rule = DocumentNode::Block(BlockNode::horizontal_rule());
        let last = DocumentNode::Text(TextNode::new("cd"));
        let (first_id, last_id) = (first.id(), last.id());
        let document =
            Document::from_nodes(vec![first, rule, last]).expect("Should build document");
        // Selection starts at the very end of the first node, so that node
        // contributes no characters.
        let selection = DocumentSelection::new(
            DocumentPosition::text(first_id, 2),
            DocumentPosition::text(last_id, 2),
        );

        let ranges = selected_text_ranges(&document, &selection);

        assert_eq!(
            ranges,
            vec![NodeTextRange {
                node_id: last_id,
                start: 0,
                end: 1
            }]
        );
    }

    // ============ Attribution command tests ============

    #[test]
    fn test_add_attributions_across_nodes() {
        let first = DocumentNode::Text(TextNode::new("ab"));
        let last = DocumentNode::Text(TextNode::new("cd"));
        let (first_id, last_id) = (first.id(), last.id());
        let mut editor = doc_editor(vec![first, last]);
        editor.composer_mut().set_selection(Some(DocumentSelection::new(
            DocumentPosition::text(first_id, 0),
            DocumentPosition::text(last_id, 2),
        )));

        editor
            .add_attributions(HashSet::from([Attribution::Bold]))
            .expect("Should add");

        assert_eq!(
            spans_of(&editor, first_id),
            vec![AttributionSpan::new(Attribution::Bold, 0, 2)]
        );
        assert_eq!(
            spans_of(&editor, last_id),
            vec![AttributionSpan::new(Attribution::Bold, 0, 2)]
        );
    }

    #[test]
    fn test_toggle_is_global_any_removal_wins() {
        // Only the second node carries bold; toggling over both removes it
        // there and does not add it to the first.
        let first = DocumentNode::Text(TextNode::new("ab"));
        let second = DocumentNode::Text(TextNode::new(
            crate::text::AttributedText::with_spans(
                "cd",
                vec![AttributionSpan::new(Attribution::Bold, 0, 1)],
            )
            .expect("Should build text"),
        ));
        let (first_id, second_id) = (first.id(), second.id());
        let mut editor = doc_editor(vec![first, second]);
        editor.composer_mut().set_selection(Some(DocumentSelection::new(
            DocumentPosition::text(first_id, 0),
            DocumentPosition::text(second_id, 2),
        )));

        editor
            .toggle_attributions(HashSet::from([Attribution::Bold]))
            .expect("Should toggle");

        assert!(spans_of(&editor, first_id).is_empty());
        assert!(spans_of(&editor, second_id).is_empty());
    }

    #[test]
    fn test_toggle_adds_when_fully_absent() {
        let first = DocumentNode::Text(TextNode::new("ab"));
        let second = DocumentNode::Text(TextNode::new("cd"));
        let (first_id, second_id) = (first.id(), second.id());
        let mut editor = doc_editor(vec![first, second]);
        editor.composer_mut().set_selection(Some(DocumentSelection::new(
            DocumentPosition::text(first_id, 0),
            DocumentPosition::text(second_id, 2),
        )));

        editor
            .toggle_attributions(HashSet::from([Attribution::Italics]))
            .expect("Should toggle");

        assert_eq!(
            spans_of(&editor, first_id),
            vec![AttributionSpan::new(Attribution::Italics, 0, 2)]
        );
        assert_eq!(
            spans_of(&editor, second_id),
            vec![AttributionSpan::new(Attribution::Italics, 0, 2)]
        );
    }

    #[test]
    fn test_attribution_over_block_only_selection_is_rejected() {
        let text = DocumentNode::Text(TextNode::new("ab"));
        let rule = DocumentNode::Block(BlockNode::horizontal_rule());
        let rule_id = rule.id();
        let mut editor = doc_editor(vec![text, rule]);
        editor.composer_mut().set_selection(Some(DocumentSelection::new(
            DocumentPosition::block(rule_id, crate::editing::node::Affinity::Upstream),
            DocumentPosition::block(rule_id, crate::editing::node::Affinity::Downstream),
        )));

        let outcome = editor
            .add_attributions(HashSet::from([Attribution::Bold]))
            .expect("Should run");

        assert_eq!(outcome, CommandOutcome::Rejected);
    }

    // ============ Selection query tests ============

    #[test]
    fn test_selection_has_attributions_query() {
        let first = DocumentNode::Text(TextNode::new(
            crate::text::AttributedText::with_spans(
                "ab",
                vec![AttributionSpan::new(Attribution::Bold, 0, 2)],
            )
            .expect("Should build text"),
        ));
        let second = DocumentNode::Text(TextNode::new(
            crate::text::AttributedText::with_spans(
                "cd",
                vec![AttributionSpan::new(Attribution::Italics, 0, 2)],
            )
            .expect("Should build text"),
        ));
        let (first_id, second_id) = (first.id(), second.id());
        let document =
            Document::from_nodes(vec![first, second]).expect("Should build document");
        let selection = DocumentSelection::new(
            DocumentPosition::text(first_id, 0),
            DocumentPosition::text(second_id, 2),
        );

        assert!(selection_has_attributions(
            &document,
            &selection,
            &[Attribution::Bold, Attribution::Italics]
        ));
        assert!(!selection_has_attributions(
            &document,
            &selection,
            &[Attribution::Underline]
        ));
    }
}
