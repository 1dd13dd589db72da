//! The ten PDF/UA compliance checks.
//!
//! Each check is a stateless, read-only function of the document snapshot.
//! The validator runs every check — an early failure never short-circuits
//! the rest, so one pass yields a complete diagnosis. A check that errors
//! internally is converted into a failing outcome carrying the error
//! message; the validator itself never aborts.
//!
//! Standards reference: ISO 14289-1:2014 (PDF/UA-1).

use crate::compliance::types::{CheckKind, CheckOutcome, ComplianceReport};
use crate::content::parser::count_text_showing_ops;
use crate::document::PdfDocument;
use crate::error::Result;
use crate::structure::traversal::{collect_headings, find_revisited, mcids_on_page, preorder};
use crate::structure::types::{StructTag, StructTree};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;

lazy_static! {
    /// Primary language tag: two letters plus optional subtags ("en", "de-AT").
    static ref LANGUAGE_TAG: Regex =
        Regex::new(r"^[A-Za-z]{2}(-[A-Za-z0-9]{2,8})*$").expect("static pattern compiles");
}

/// PDF/UA validator.
///
/// Runs the fixed battery of ten checks and aggregates their outcomes.
#[derive(Debug, Clone)]
pub struct ComplianceValidator {
    /// Fraction of text-showing operators that must be covered by MCIDs
    coverage_ratio: f64,
}

impl Default for ComplianceValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ComplianceValidator {
    /// Create a validator with the standard settings.
    pub fn new() -> Self {
        Self {
            coverage_ratio: 0.5,
        }
    }

    /// Override the tagged-content coverage threshold (0.0 to 1.0).
    pub fn with_coverage_ratio(mut self, ratio: f64) -> Self {
        self.coverage_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Run all ten checks. Never mutates the document, never aborts: a
    /// check that errors internally becomes a failing outcome with the
    /// error message as the reason.
    pub fn validate(&self, document: &PdfDocument) -> ComplianceReport {
        let checks = CheckKind::ALL
            .iter()
            .map(|kind| match self.run_check(*kind, document) {
                Ok(outcome) => outcome,
                Err(err) => CheckOutcome::fail(*kind, format!("check aborted: {}", err)),
            })
            .collect();
        ComplianceReport::from_checks(checks)
    }

    fn run_check(&self, kind: CheckKind, document: &PdfDocument) -> Result<CheckOutcome> {
        match kind {
            CheckKind::TaggedPdf => self.check_tagged_pdf(document),
            CheckKind::PrimaryLanguage => self.check_primary_language(document),
            CheckKind::Title => self.check_title(document),
            CheckKind::TaggedContent => self.check_tagged_content(document),
            CheckKind::TabOrder => self.check_tab_order(document),
            CheckKind::AlternateText => self.check_alternate_text(document),
            CheckKind::HeadingNesting => self.check_heading_nesting(document),
            CheckKind::TreeIntegrity => self.check_tree_integrity(document),
            CheckKind::MarkInfo => self.check_mark_info(document),
            CheckKind::DocumentWrapper => self.check_document_wrapper(document),
        }
    }

    /// Check 1: structure tree exists, its sole child is a Document wrapper,
    /// and the wrapper has at least one child.
    fn check_tagged_pdf(&self, document: &PdfDocument) -> Result<CheckOutcome> {
        let mut outcome = CheckOutcome::pass(CheckKind::TaggedPdf);
        let Some(tree) = document.struct_tree.as_ref() else {
            outcome.add_failure("document has no structure tree");
            return Ok(outcome);
        };
        match tree.document_wrapper() {
            Some(wrapper) => {
                let children = tree.node(wrapper).map(|n| n.children.len()).unwrap_or(0);
                if children == 0 {
                    outcome.add_failure("Document wrapper has no children");
                }
                outcome = outcome.with_details(json!({ "wrapper_children": children }));
            },
            None => {
                outcome.add_failure(describe_root_shape(tree));
            },
        }
        Ok(outcome)
    }

    /// Check 2: catalog `/Lang` present, non-empty, syntactically a
    /// two-letter code with optional region.
    fn check_primary_language(&self, document: &PdfDocument) -> Result<CheckOutcome> {
        let mut outcome = CheckOutcome::pass(CheckKind::PrimaryLanguage);
        match document.language() {
            None => outcome.add_failure("catalog has no /Lang entry"),
            Some(lang) if lang.is_empty() => outcome.add_failure("/Lang is empty"),
            Some(lang) if !LANGUAGE_TAG.is_match(&lang) => {
                outcome.add_failure(format!("/Lang '{}' is not a valid language code", lang));
            },
            Some(lang) => {
                outcome = outcome.with_details(json!({ "lang": lang }));
            },
        }
        Ok(outcome)
    }

    /// Check 3: title present and non-empty in both the Info dictionary and
    /// the XMP metadata.
    fn check_title(&self, document: &PdfDocument) -> Result<CheckOutcome> {
        let mut outcome = CheckOutcome::pass(CheckKind::Title);
        match document.info_title() {
            Some(title) if !title.is_empty() => {},
            _ => outcome.add_failure("no title in Info dictionary"),
        }
        match document.xmp_title() {
            Some(title) if !title.is_empty() => {},
            _ => outcome.add_failure("no dc:title in XMP metadata"),
        }
        Ok(outcome)
    }

    /// Check 4: every page's drawable content is covered by marked-content
    /// references. Heuristic: MCID count >= `coverage_ratio` of detected
    /// text-showing operators, or no text operators and at least one
    /// structure element exists.
    fn check_tagged_content(&self, document: &PdfDocument) -> Result<CheckOutcome> {
        let mut outcome = CheckOutcome::pass(CheckKind::TaggedContent);
        let tree = document.struct_tree.as_ref();
        let element_count = tree.map(|t| t.len()).unwrap_or(0);
        let mut per_page = Vec::new();

        for (index, page) in document.pages.iter().enumerate() {
            let text_ops = count_text_showing_ops(&page.content);
            let mcids = tree
                .map(|t| mcids_on_page(t, index as u32).len())
                .unwrap_or(0);
            per_page.push(json!({ "page": index, "text_ops": text_ops, "mcids": mcids }));

            let covered = if text_ops == 0 {
                element_count > 0
            } else {
                mcids as f64 >= self.coverage_ratio * text_ops as f64
            };
            if !covered {
                outcome.add_failure(format!(
                    "page {}: {} mcid(s) for {} text-showing operator(s)",
                    index, mcids, text_ops
                ));
            }
        }
        Ok(outcome.with_details(json!({ "pages": per_page })))
    }

    /// Check 5: the Document wrapper has at least one child. Full
    /// reading-order verification is out of scope; this only verifies
    /// structural presence.
    fn check_tab_order(&self, document: &PdfDocument) -> Result<CheckOutcome> {
        let mut outcome = CheckOutcome::pass(CheckKind::TabOrder);
        let has_children = document
            .struct_tree
            .as_ref()
            .and_then(|tree| {
                let wrapper = tree.document_wrapper()?;
                tree.node(wrapper).map(|n| !n.children.is_empty())
            })
            .unwrap_or(false);
        if !has_children {
            outcome.add_failure("no structure elements to derive a tab order from");
        }
        Ok(outcome)
    }

    /// Check 6: every Figure element has non-empty `/Alt`; every widget
    /// annotation has a tooltip or title.
    fn check_alternate_text(&self, document: &PdfDocument) -> Result<CheckOutcome> {
        let mut outcome = CheckOutcome::pass(CheckKind::AlternateText);
        let mut figures = 0usize;

        if let Some(tree) = document.struct_tree.as_ref() {
            for id in preorder(tree) {
                let Some(node) = tree.node(id) else { continue };
                if node.tag != StructTag::Figure {
                    continue;
                }
                figures += 1;
                let has_alt = node.alt.as_deref().map(|a| !a.is_empty()).unwrap_or(false);
                if !has_alt {
                    match node.page {
                        Some(page) => outcome
                            .add_failure(format!("figure on page {} has no alternate text", page)),
                        None => outcome.add_failure(format!("figure {} has no alternate text", id)),
                    }
                }
            }
        }

        for (index, page) in document.pages.iter().enumerate() {
            for annot in &page.annotations {
                let is_widget = annot.get("Subtype").and_then(|o| o.as_name()) == Some("Widget");
                if !is_widget {
                    continue;
                }
                let named = ["TU", "T"].iter().any(|key| {
                    annot
                        .get(*key)
                        .and_then(|o| o.as_text())
                        .map(|t| !t.is_empty())
                        .unwrap_or(false)
                });
                if !named {
                    outcome.add_failure(format!(
                        "widget annotation on page {} has no tooltip or title",
                        index
                    ));
                }
            }
        }
        Ok(outcome.with_details(json!({ "figures": figures })))
    }

    /// Check 7: headings in reading order never jump more than one level
    /// forward, and the first heading is an H1.
    fn check_heading_nesting(&self, document: &PdfDocument) -> Result<CheckOutcome> {
        let mut outcome = CheckOutcome::pass(CheckKind::HeadingNesting);
        let Some(tree) = document.struct_tree.as_ref() else {
            return Ok(outcome);
        };

        let headings = collect_headings(tree);
        if let Some(first) = headings.first() {
            if first.level != 1 {
                outcome.add_failure(format!(
                    "first heading is H{}, expected H1",
                    first.level
                ));
            }
        }
        for pair in headings.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.level > prev.level + 1 {
                let place = next
                    .page
                    .map(|p| format!(" on page {}", p))
                    .unwrap_or_default();
                outcome.add_failure(format!(
                    "heading level skip H{}->H{}{}",
                    prev.level, next.level, place
                ));
            }
        }
        let levels: Vec<u8> = headings.iter().map(|h| h.level).collect();
        Ok(outcome.with_details(json!({ "levels": levels })))
    }

    /// Check 8: traversal with a visited set keyed by element identity
    /// detects no repeated visitation.
    fn check_tree_integrity(&self, document: &PdfDocument) -> Result<CheckOutcome> {
        let mut outcome = CheckOutcome::pass(CheckKind::TreeIntegrity);
        let Some(tree) = document.struct_tree.as_ref() else {
            return Ok(outcome);
        };
        let revisited = find_revisited(tree);
        for id in &revisited {
            outcome.add_failure(format!(
                "element {} reachable more than once (cycle or shared parent)",
                id
            ));
        }
        Ok(outcome.with_details(json!({ "revisited": revisited.len() })))
    }

    /// Check 9: catalog `/MarkInfo` with `/Marked true`.
    fn check_mark_info(&self, document: &PdfDocument) -> Result<CheckOutcome> {
        let mut outcome = CheckOutcome::pass(CheckKind::MarkInfo);
        if !document.is_marked() {
            outcome.add_failure("catalog /MarkInfo /Marked is not true");
        }
        Ok(outcome)
    }

    /// Check 10: StructTreeRoot has exactly one child, of type Document.
    fn check_document_wrapper(&self, document: &PdfDocument) -> Result<CheckOutcome> {
        let mut outcome = CheckOutcome::pass(CheckKind::DocumentWrapper);
        match document.struct_tree.as_ref() {
            None => outcome.add_failure("document has no structure tree"),
            Some(tree) => {
                if tree.document_wrapper().is_none() {
                    outcome.add_failure(describe_root_shape(tree));
                }
            },
        }
        Ok(outcome)
    }
}

/// Explain why the tree root is not a single Document wrapper.
fn describe_root_shape(tree: &StructTree) -> String {
    match tree.root_children.as_slice() {
        [] => "structure tree root has no children".to_string(),
        [single] => {
            let tag = tree
                .node(*single)
                .map(|n| n.tag.as_name())
                .unwrap_or("<missing>");
            format!("structure tree root child is {}, expected Document", tag)
        },
        many => format!(
            "structure tree root has {} children, expected exactly one Document",
            many.len()
        ),
    }
}
