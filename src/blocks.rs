//! Content block model.
//!
//! The input handed over by the content extractor: classified text/image
//! blocks per page with position and font metadata, plus each page's raw
//! content-stream bytes. The extractor itself lives outside this crate; this
//! module only defines the snapshot interchange format (JSON, content bytes
//! base64-encoded) and its loader.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A complete extractor snapshot of one source document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// Document title, if the source carried one
    #[serde(default)]
    pub title: Option<String>,
    /// Primary language hint, if the source carried one
    #[serde(default)]
    pub language: Option<String>,
    /// Pages in document order
    #[serde(default)]
    pub pages: Vec<PageSnapshot>,
}

/// One page of the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// Page width in points
    #[serde(default = "default_page_width")]
    pub width: f32,
    /// Page height in points
    #[serde(default = "default_page_height")]
    pub height: f32,
    /// Raw content-stream bytes (base64 in JSON)
    #[serde(default, with = "base64_bytes")]
    pub content: Vec<u8>,
    /// Classified blocks in reading order
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
    /// Annotations present on the page
    #[serde(default)]
    pub annotations: Vec<AnnotationSnapshot>,
}

fn default_page_width() -> f32 {
    612.0
}

fn default_page_height() -> f32 {
    792.0
}

/// One classified content block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Classification hint from the extractor
    #[serde(flatten)]
    pub kind: BlockKind,
    /// Text content (absent for pure image blocks)
    #[serde(default)]
    pub text: Option<String>,
    /// Bounding box on the page
    #[serde(default)]
    pub bbox: BBox,
    /// Dominant font of the block
    #[serde(default)]
    pub font: Option<FontInfo>,
    /// Alternate description (image blocks)
    #[serde(default)]
    pub alt: Option<String>,
}

/// Block classification as produced by the extractor.
///
/// Unrecognized kinds deserialize to [`BlockKind::Other`] rather than
/// failing the whole snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BlockKind {
    /// Heading with its level (1-6)
    Heading {
        /// Heading level, 1 through 6
        level: u8,
    },
    /// Body paragraph
    Paragraph,
    /// Item inside a bulleted or numbered list
    ListItem,
    /// Image or other illustration
    Figure,
    /// Caption attached to a figure or table
    Caption,
    /// Anything the extractor could not classify
    #[serde(other)]
    Other,
}

/// Axis-aligned bounding box, PDF coordinate space (origin bottom-left).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    /// Left edge
    pub x: f32,
    /// Bottom edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl BBox {
    /// Top edge of the box (y grows upward in PDF space).
    pub fn top(&self) -> f32 {
        self.y + self.height
    }
}

/// Font metadata for a block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontInfo {
    /// Font name or family
    pub name: String,
    /// Size in points
    pub size: f32,
    /// Bold weight
    #[serde(default)]
    pub bold: bool,
    /// Italic style
    #[serde(default)]
    pub italic: bool,
}

/// Annotation snapshot; only the accessibility-relevant entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationSnapshot {
    /// Annotation subtype (e.g. "Widget", "Link")
    pub subtype: String,
    /// Annotation rectangle [llx, lly, urx, ury]
    #[serde(default)]
    pub rect: [f32; 4],
    /// Tooltip / alternate field name (`/TU`)
    #[serde(default)]
    pub tooltip: Option<String>,
    /// Partial field name (`/T`)
    #[serde(default)]
    pub title: Option<String>,
}

impl DocumentSnapshot {
    /// Load a snapshot from a JSON file produced by the content extractor.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_json(&data)
    }

    /// Parse a snapshot from JSON bytes.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let snapshot: DocumentSnapshot = serde_json::from_slice(data)?;
        if snapshot
            .pages
            .iter()
            .any(|p| p.width <= 0.0 || p.height <= 0.0)
        {
            return Err(Error::InvalidInput(
                "snapshot page with non-positive dimensions".to_string(),
            ));
        }
        Ok(snapshot)
    }

    /// Number of pages in the snapshot.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Serde adapter encoding content-stream bytes as base64 strings.
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
