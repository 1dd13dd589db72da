//! Fix-request interchange.
//!
//! Remediation requests arrive as an ordered sequence of records, each with
//! a `type` discriminant. The set of types is closed and matched
//! exhaustively; records with an unrecognized `type` deserialize to
//! [`FixRecord::Unknown`] and are ignored rather than failing the run.

use crate::error::Result;
use crate::structure::builder::{ListSpec, TableSpec};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One remediation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FixRecord {
    /// Tag a run of text as a heading at a given level
    Heading {
        /// Page number (0-based)
        page: u32,
        /// Heading text, used to locate the block
        text: String,
        /// Heading level 1-6
        level: u8,
    },
    /// Build a tagged table on a page
    Table {
        /// Page number (0-based)
        page: u32,
        /// Table payload
        table: TableSpec,
    },
    /// Build a tagged list on a page
    List {
        /// Page number (0-based)
        page: u32,
        /// List payload
        list: ListSpec,
    },
    /// Supply alternate text for a figure
    AltText {
        /// Page number (0-based)
        page: u32,
        /// Figure to target, matched by recorded text; first figure
        /// without alt text when absent
        #[serde(default)]
        target: Option<String>,
        /// The alternate description
        alt: String,
    },
    /// Set document metadata
    Metadata {
        /// Document title
        #[serde(default)]
        title: Option<String>,
        /// Document author
        #[serde(default)]
        author: Option<String>,
        /// Document subject
        #[serde(default)]
        subject: Option<String>,
    },
    /// Set the primary document language
    Language {
        /// BCP 47-ish language code ("en", "de-AT")
        lang: String,
    },
    /// Color-contrast finding; remediation is delegated to the independent
    /// contrast auditor, so the engine only acknowledges these
    ColorContrast {
        /// Page number (0-based), if the finding is page-specific
        #[serde(default)]
        page: Option<u32>,
    },
    /// Any record type this build does not know
    #[serde(other)]
    Unknown,
}

impl FixRecord {
    /// The page this record applies to, for document-level records None.
    pub fn page(&self) -> Option<u32> {
        match self {
            FixRecord::Heading { page, .. }
            | FixRecord::Table { page, .. }
            | FixRecord::List { page, .. }
            | FixRecord::AltText { page, .. } => Some(*page),
            FixRecord::ColorContrast { page } => *page,
            FixRecord::Metadata { .. } | FixRecord::Language { .. } | FixRecord::Unknown => None,
        }
    }
}

/// Load fix records from a JSON file (a top-level array of records).
///
/// Unknown record types are counted and logged, not fatal.
pub fn load_fix_records(path: impl AsRef<Path>) -> Result<Vec<FixRecord>> {
    let data = std::fs::read(path.as_ref())?;
    let records: Vec<FixRecord> = serde_json::from_slice(&data)?;
    let unknown = records
        .iter()
        .filter(|r| matches!(r, FixRecord::Unknown))
        .count();
    if unknown > 0 {
        log::warn!("{} fix record(s) of unknown type will be ignored", unknown);
    }
    Ok(records)
}
