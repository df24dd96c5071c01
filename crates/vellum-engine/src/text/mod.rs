//! Attributed text: character content plus layered style annotations.
//!
//! [`AttributedText`] is the text-bearing leaf of the document model. It is
//! immutable by replacement (every edit returns a new value), so node text
//! can be swapped atomically and observed by value comparison.

pub mod attributed_text;
pub mod attribution;

pub use attributed_text::{AttributedText, TextError};
pub use attribution::{Attribution, AttributionSpan};
