#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::match_like_matches_macro)]
#![cfg_attr(test, allow(dead_code))]

//! # accesspdf
//!
//! PDF/UA (ISO 14289-1) accessibility remediation: builds a tagged
//! logical-structure tree over a document's visual content, links that tree
//! to the page content streams via Marked-Content Identifiers (MCID), and
//! validates the result against a fixed battery of ten compliance checks.
//!
//! ## Pipeline
//!
//! 1. **Structure Tree Builder** ([`structure`]) consumes the content block
//!    model and produces the tagged tree plus pending MCID assignments.
//! 2. **Content-Stream Linker** ([`linker`]) inserts `BDC`/`EMC` marker
//!    operators so every MCID resolves to actual drawn content.
//! 3. **Compliance Validator** ([`compliance`]) walks the finished document
//!    and produces a structured pass/fail report.
//!
//! Text/font/image extraction and AI-based suggestion are external
//! collaborators, consumed through the [`blocks`] snapshot format and the
//! [`ai`] oracle trait.
//!
//! ## Quick Start
//!
//! ```
//! use accesspdf::ai::NoSuggestions;
//! use accesspdf::blocks::DocumentSnapshot;
//! use accesspdf::compliance::ComplianceValidator;
//! use accesspdf::remediate::{remediate, RemediationOptions};
//!
//! # fn main() -> accesspdf::Result<()> {
//! let snapshot: DocumentSnapshot = serde_json::from_str(r#"{
//!     "title": "Handbook",
//!     "pages": [{"blocks": [{"kind": "paragraph", "text": "Hello"}]}]
//! }"#)?;
//!
//! let (doc, summary) = remediate(
//!     &snapshot,
//!     &[],
//!     &NoSuggestions,
//!     &RemediationOptions::default(),
//! )?;
//! assert_eq!(summary.elements_created, 1);
//!
//! let report = ComplianceValidator::new().validate(&doc);
//! assert!(report.is_compliant);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// PDF object model
pub mod decoders;
pub mod object;

// Extractor interchange
pub mod blocks;
pub mod fixes;

// Document model
pub mod document;
pub mod metadata;

// Core engine
pub mod content;
pub mod linker;
/// PDF logical structure (Tagged PDFs)
pub mod structure;

// Compliance validation
pub mod compliance;

// Orchestration
pub mod ai;
pub mod remediate;

// PDF writing
pub mod writer;

// Re-exports
pub use blocks::DocumentSnapshot;
pub use compliance::{CheckKind, ComplianceReport, ComplianceValidator};
pub use document::{Page, PdfDocument};
pub use error::{Error, Result};
pub use fixes::FixRecord;
pub use linker::{ContentStreamLinker, LinkMode};
pub use remediate::{remediate, RemediationOptions, RemediationSummary};
pub use structure::StructureTreeBuilder;
pub use writer::PdfWriter;

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.starts_with("0."));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "accesspdf");
    }
}
