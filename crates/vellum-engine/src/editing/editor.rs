use std::collections::HashSet;
use std::fmt;

use crate::editing::commands::attributions::{
    AddTextAttributions, RemoveTextAttributions, ToggleTextAttributions,
};
use crate::editing::commands::deletion::{DeleteDownstream, DeleteUpstream};
use crate::editing::commands::insertion::{InsertBlockNode, InsertText, SplitParagraph};
use crate::editing::commands::movement::{MoveCaret, SelectAll};
use crate::editing::composer::Composer;
use crate::editing::document::{Document, DocumentChange, ListenerId};
use crate::editing::layout::{DocumentLayout, NoLayout};
use crate::editing::node::BlockNode;
use crate::text::Attribution;

/// How a command run turned out.
///
/// `Rejected` is the expected "cannot proceed" path: a caret move at the
/// document edge, a delete with nothing to delete. It is a value, not an
/// error, and rejected commands leave document and selection untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Changed,
    Rejected,
}

impl CommandOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, Self::Changed)
    }
}

/// The mutable state a command executes against, inside one transaction.
pub struct Transaction<'a> {
    pub document: &'a mut Document,
    pub composer: &'a mut Composer,
    pub layout: &'a dyn DocumentLayout,
}

/// The edit protocol: any edit is a value that executes against a
/// transaction. The host decides which commands run and in what order;
/// hosts can define their own commands alongside the built-in ones.
///
/// Errors returned here are contract violations (stale or mismatched
/// positions, broken invariants); expected boundary conditions come back
/// as [`CommandOutcome::Rejected`] instead.
pub trait EditCommand: fmt::Debug {
    fn execute(&self, tx: &mut Transaction<'_>) -> anyhow::Result<CommandOutcome>;
}

/// The command engine: owns the document, the composer, and the injected
/// geometry and observability collaborators, and runs commands inside a
/// transaction boundary.
///
/// A transaction groups the primitive mutations of one logical edit so
/// observers are notified once. There is no rollback: when a command in a
/// batch fails, the steps already applied stay committed and the failure is
/// returned after the transaction flushes.
pub struct Editor {
    document: Document,
    composer: Composer,
    layout: Box<dyn DocumentLayout>,
    session: tracing::Span,
}

impl Editor {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            composer: Composer::new(),
            layout: Box::new(NoLayout),
            session: tracing::info_span!("edit_session"),
        }
    }

    /// Use an external line-geometry provider for vertical movement and
    /// line-boundary modifiers.
    pub fn with_layout(mut self, layout: Box<dyn DocumentLayout>) -> Self {
        self.layout = layout;
        self
    }

    /// Scope this editor's tracing output to a caller-owned span. The span
    /// lives as long as the editing session, not the process.
    pub fn with_session_span(mut self, span: tracing::Span) -> Self {
        self.session = span;
        self
    }

    pub fn with_composer(mut self, composer: Composer) -> Self {
        self.composer = composer;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&[DocumentChange]) + 'static,
    ) -> ListenerId {
        self.document.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.document.unsubscribe(id)
    }

    /// Run a single command inside its own transaction.
    pub fn execute<C: EditCommand>(&mut self, command: C) -> anyhow::Result<CommandOutcome> {
        self.execute_batch(&[&command])
    }

    /// Run an ordered batch of commands inside one transaction. Observers
    /// are notified once, after the last command (or the failing one).
    pub fn execute_batch(
        &mut self,
        commands: &[&dyn EditCommand],
    ) -> anyhow::Result<CommandOutcome> {
        let _session = self.session.enter();

        self.document.begin_transaction();
        let mut outcome = CommandOutcome::Rejected;
        let mut failure = None;

        for command in commands {
            tracing::debug!(command = ?command, "executing edit command");
            let mut tx = Transaction {
                document: &mut self.document,
                composer: &mut self.composer,
                layout: self.layout.as_ref(),
            };
            match command.execute(&mut tx) {
                Ok(CommandOutcome::Changed) => outcome = CommandOutcome::Changed,
                Ok(CommandOutcome::Rejected) => {
                    tracing::debug!(command = ?command, "edit command rejected");
                }
                Err(error) => {
                    tracing::warn!(
                        command = ?command,
                        error = %error,
                        "edit command failed; prior steps in this transaction stay committed"
                    );
                    failure = Some(error);
                    break;
                }
            }
        }

        self.document.commit_transaction();
        match failure {
            Some(error) => Err(error),
            None => Ok(outcome),
        }
    }

    // ---- Primitive operation entry points ----

    pub fn insert_text(&mut self, text: impl Into<String>) -> anyhow::Result<CommandOutcome> {
        self.execute(InsertText::new(text))
    }

    pub fn delete_upstream(&mut self) -> anyhow::Result<CommandOutcome> {
        self.execute(DeleteUpstream)
    }

    pub fn delete_downstream(&mut self) -> anyhow::Result<CommandOutcome> {
        self.execute(DeleteDownstream)
    }

    pub fn move_caret(&mut self, movement: MoveCaret) -> anyhow::Result<CommandOutcome> {
        self.execute(movement)
    }

    pub fn select_all(&mut self) -> anyhow::Result<CommandOutcome> {
        self.execute(SelectAll)
    }

    pub fn split_paragraph(&mut self) -> anyhow::Result<CommandOutcome> {
        self.execute(SplitParagraph)
    }

    pub fn insert_block_node(&mut self, node: BlockNode) -> anyhow::Result<CommandOutcome> {
        self.execute(InsertBlockNode::new(node))
    }

    pub fn add_attributions(
        &mut self,
        attributions: HashSet<Attribution>,
    ) -> anyhow::Result<CommandOutcome> {
        let Some(selection) = self.composer.selection().cloned() else {
            return Ok(CommandOutcome::Rejected);
        };
        self.execute(AddTextAttributions::new(selection, attributions))
    }

    pub fn remove_attributions(
        &mut self,
        attributions: HashSet<Attribution>,
    ) -> anyhow::Result<CommandOutcome> {
        let Some(selection) = self.composer.selection().cloned() else {
            return Ok(CommandOutcome::Rejected);
        };
        self.execute(RemoveTextAttributions::new(selection, attributions))
    }

    pub fn toggle_attributions(
        &mut self,
        attributions: HashSet<Attribution>,
    ) -> anyhow::Result<CommandOutcome> {
        let Some(selection) = self.composer.selection().cloned() else {
            return Ok(CommandOutcome::Rejected);
        };
        self.execute(ToggleTextAttributions::new(selection, attributions))
    }

    /// Read-only copy of the content covered by the current selection,
    /// node contents joined with newlines.
    pub fn copy_selected_content(&self) -> anyhow::Result<Option<String>> {
        let Some(selection) = self.composer.selection() else {
            return Ok(None);
        };
        crate::editing::commands::copy_selected_content(&self.document, selection).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::editing::document::DocumentError;
    use crate::editing::node::{DocumentNode, NodeId, TextNode};
    use crate::editing::position::{DocumentPosition, DocumentSelection};

    fn editor_with_paragraph(text: &str) -> (Editor, NodeId) {
        let node = DocumentNode::Text(TextNode::new(text));
        let id = node.id();
        let document = Document::from_nodes(vec![node]).expect("Should build document");
        (Editor::new(document), id)
    }

    #[derive(Debug)]
    struct FailingCommand;

    impl EditCommand for FailingCommand {
        fn execute(&self, _tx: &mut Transaction<'_>) -> anyhow::Result<CommandOutcome> {
            Err(DocumentError::NotATextNode(NodeId::new()).into())
        }
    }

    #[derive(Debug)]
    struct NoOpCommand;

    impl EditCommand for NoOpCommand {
        fn execute(&self, _tx: &mut Transaction<'_>) -> anyhow::Result<CommandOutcome> {
            Ok(CommandOutcome::Rejected)
        }
    }

    #[test]
    fn test_batch_reports_changed_if_any_command_changed() {
        let (mut editor, id) = editor_with_paragraph("hi");
        editor
            .composer_mut()
            .set_selection(Some(DocumentSelection::collapsed(DocumentPosition::text(id, 2))));

        let insert = InsertText::new("!");
        let outcome = editor
            .execute_batch(&[&NoOpCommand, &insert])
            .expect("Should execute batch");

        assert_eq!(outcome, CommandOutcome::Changed);
    }

    #[test]
    fn test_batch_notifies_once_per_logical_edit() {
        let (mut editor, id) = editor_with_paragraph("hi");
        editor
            .composer_mut()
            .set_selection(Some(DocumentSelection::collapsed(DocumentPosition::text(id, 2))));
        let notifications: Rc<RefCell<usize>> = Rc::default();
        let sink = Rc::clone(&notifications);
        editor.subscribe(move |_| *sink.borrow_mut() += 1);

        let first = InsertText::new("a");
        let second = InsertText::new("b");
        editor
            .execute_batch(&[&first, &second])
            .expect("Should execute batch");

        assert_eq!(*notifications.borrow(), 1);
        assert_eq!(editor.document().version(), 1);
    }

    #[test]
    fn test_failed_command_keeps_prior_steps_committed() {
        let (mut editor, id) = editor_with_paragraph("hi");
        editor
            .composer_mut()
            .set_selection(Some(DocumentSelection::collapsed(DocumentPosition::text(id, 2))));

        let insert = InsertText::new("!");
        let result = editor.execute_batch(&[&insert, &FailingCommand]);

        assert!(result.is_err());
        let node = editor.document().node_by_id(id).expect("Node should remain");
        assert_eq!(node.as_text().expect("Should be text").text().text(), "hi!");
    }

    #[test]
    fn test_rejected_batch_leaves_version_untouched() {
        let (mut editor, _) = editor_with_paragraph("hi");

        let outcome = editor
            .execute_batch(&[&NoOpCommand])
            .expect("Should execute batch");

        assert_eq!(outcome, CommandOutcome::Rejected);
        assert_eq!(editor.document().version(), 0);
    }
}
