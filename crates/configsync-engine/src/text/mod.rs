//! Byte-exact text primitives shared by both pipelines: spans, line
//! iteration with preserved terminators, and splice edits.

pub mod edit;
pub mod lines;
pub mod span;

pub use edit::{TextEdit, apply_all};
pub use lines::{LineRef, RopeLine, lines, lines_with_spans};
pub use span::Span;
