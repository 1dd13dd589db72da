//! PDF writing.
//!
//! Serializes the document model to a complete PDF file: header, body
//! (catalog, page tree, content streams, Info, XMP metadata, structure
//! tree), cross-reference table, and trailer. Written back atomically at
//! the end of a pass.

pub mod object_serializer;
pub mod pdf_writer;

pub use object_serializer::ObjectSerializer;
pub use pdf_writer::{PdfWriter, PdfWriterConfig};
