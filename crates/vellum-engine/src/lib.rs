pub mod editing;
pub mod text;

// Re-export key types for easier usage
pub use editing::{
    Affinity, BlockContent, BlockNode, CommandOutcome, Composer, Document, DocumentChange,
    DocumentLayout, DocumentNode, DocumentPosition, DocumentRange, DocumentSelection,
    EditCommand, Editor, NodeId, NodePosition, TextNode, Transaction,
};
pub use text::{AttributedText, Attribution, AttributionSpan, TextError};
