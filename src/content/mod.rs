//! Content stream scanning.
//!
//! Tokenizes page content streams far enough to locate text-showing
//! operator ranges for marked-content insertion. Full graphics
//! interpretation is out of scope; the scanner only needs operator
//! boundaries and byte spans.

pub mod operators;
pub mod parser;

pub use operators::{classify, is_text_showing, OpClass};
pub use parser::{count_text_showing_ops, scan_content_ops, ContentOp};
