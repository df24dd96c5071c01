/*!
 * # Editing Core Module
 *
 * This module implements the document editing engine: a structured document
 * model, a selection algebra that works uniformly across text and non-text
 * nodes, and a command protocol that applies edits inside a transaction
 * boundary.
 *
 * ## Architecture Overview
 *
 * ### 1. Ordered Nodes with Stable Identity
 * - A [`Document`] is an ordered sequence of [`DocumentNode`]s
 * - Every node carries an immutable [`NodeId`], unique for the document's
 *   lifetime and never reused; selections reference nodes by id because
 *   indices shift under structural edits
 * - Text-bearing nodes own an [`AttributedText`](crate::text::AttributedText);
 *   opaque block nodes (horizontal rules, images) expose a single sentinel
 *   position with an upstream and a downstream face
 *
 * ### 2. Position & Selection Algebra
 * - [`DocumentPosition`] pairs a node id with a node-local position; the
 *   node-local type is a closed tagged set ([`NodePosition`]) dispatched
 *   exhaustively, so cross-kind misuse is a checked error, not a crash
 * - [`DocumentSelection`] keeps base and extent unsorted to preserve
 *   gesture direction; [`Document::range_between`] produces the
 *   document-order-normalized range when algorithms need one
 *
 * ### 3. Command-Based Editing
 * - All edits are values implementing [`EditCommand`], executed by the
 *   [`Editor`] inside a transaction
 * - A transaction groups the primitive mutations of one logical edit so
 *   change listeners are notified exactly once per edit
 * - Expected boundary conditions (caret move at the document edge, delete
 *   with nothing upstream) come back as [`CommandOutcome::Rejected`] with
 *   document and selection untouched
 *
 * ### 4. Selection Owner: the Composer
 * - The [`Composer`] owns the current (nullable) selection, the IME
 *   composing region, and the attribution preferences applied to the next
 *   insertion
 *
 * ### 5. External Collaborators
 * - Line geometry is consumed through the [`DocumentLayout`] trait;
 *   rendering observes the document through change subscriptions and
 *   re-reads state
 *
 * ## Module Structure
 *
 * - **`node`**: node variants and the node-local position/selection algebra
 * - **`document`**: ordered node storage, lookup, structural mutation,
 *   change notification
 * - **`position`**: document-wide positions, selections, and ranges
 * - **`composer`**: selection ownership and input-composition state
 * - **`editor`**: the command engine and transaction boundary
 * - **`commands`**: built-in movement/deletion/insertion/attribution
 *   commands and the shared selection-to-text-ranges resolution
 * - **`layout`**: the consumed line-geometry interface
 */

pub mod commands;
pub mod composer;
pub mod document;
pub mod editor;
pub mod layout;
pub mod node;
pub mod position;

pub use commands::{
    AddTextAttributions, DeleteDownstream, DeleteSelection, DeleteUpstream, InsertBlockNode,
    InsertText, MoveCaret, MoveDirection, MovementModifier, NodeTextRange,
    RemoveTextAttributions, SelectAll, SplitParagraph, ToggleTextAttributions,
    copy_selected_content, selected_text_ranges, selection_has_attributions,
};
pub use composer::{Composer, ComposerPreferences};
pub use document::{Document, DocumentChange, DocumentError, ListenerId};
pub use editor::{CommandOutcome, EditCommand, Editor, Transaction};
pub use layout::{DocumentLayout, NoLayout};
pub use node::{
    Affinity, BLOCK_TYPE_KEY, BlockContent, BlockNode, BlockPosition, BlockSelection,
    DocumentNode, Metadata, NodeError, NodeId, NodePosition, NodeSelection, TextNode,
    TextPosition, TextSelection,
};
pub use position::{DocumentPosition, DocumentRange, DocumentSelection};
