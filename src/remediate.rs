//! The remediation pass.
//!
//! Drives the core end to end: build the structure tree from the content
//! block snapshot and fix records, link every page's content stream, then
//! apply the catalog-level metadata fixes. Builder, linker, and validator
//! run strictly sequentially; the document is exclusively owned for the
//! duration of the pass.

use crate::ai::{language_or_default, SuggestionOracle};
use crate::blocks::{BlockKind, ContentBlock, DocumentSnapshot};
use crate::document::PdfDocument;
use crate::error::Result;
use crate::fixes::FixRecord;
use crate::linker::{ContentStreamLinker, LinkMode};
use crate::structure::builder::{ElementOptions, StructureTreeBuilder};
use crate::structure::types::{NodeId, StructTag};

/// Options for one remediation pass.
#[derive(Debug, Clone, Default)]
pub struct RemediationOptions {
    /// Title override (takes precedence over fix records and the snapshot)
    pub title: Option<String>,
    /// Language override (same precedence)
    pub language: Option<String>,
    /// Force one link mode for every page
    pub link_mode: Option<LinkMode>,
}

/// What a pass did, for user-visible reporting.
#[derive(Debug, Clone, Default)]
pub struct RemediationSummary {
    /// Fix records applied
    pub fixes_applied: usize,
    /// Fix records skipped (malformed, delegated, or unknown)
    pub fixes_skipped: usize,
    /// Structure elements created
    pub elements_created: usize,
    /// MCIDs placed into content streams
    pub mcids_placed: usize,
    /// Non-fatal anomalies collected along the way
    pub warnings: Vec<String>,
}

/// Run a full remediation pass over a snapshot.
///
/// Returns the remediated document and a summary. Only I/O-level problems
/// are errors; malformed individual records are skipped with a warning.
pub fn remediate(
    snapshot: &DocumentSnapshot,
    fixes: &[FixRecord],
    oracle: &dyn SuggestionOracle,
    options: &RemediationOptions,
) -> Result<(PdfDocument, RemediationSummary)> {
    let mut doc = PdfDocument::from_snapshot(snapshot);
    let mut summary = RemediationSummary::default();

    let mut builder = StructureTreeBuilder::new();
    builder.create_root()?;

    // Auto-tag every block with its classification hint, in reading order.
    // Fix records refine the result afterwards.
    let mut figures_by_page: Vec<Vec<NodeId>> = vec![Vec::new(); snapshot.pages.len()];
    let mut tagged_by_page: Vec<Vec<(NodeId, Option<String>)>> =
        vec![Vec::new(); snapshot.pages.len()];
    for (page_index, page) in snapshot.pages.iter().enumerate() {
        for block in &page.blocks {
            if let Some(id) = tag_block(&mut builder, page_index as u32, block, oracle) {
                tagged_by_page[page_index].push((id, block.text.clone()));
                if matches!(block.kind, BlockKind::Figure) {
                    figures_by_page[page_index].push(id);
                }
            }
        }
    }

    // Apply fix records in order.
    for record in fixes {
        if let Some(page) = record.page() {
            if page as usize >= snapshot.pages.len() {
                log::warn!("fix record for out-of-range page {} skipped", page);
                summary
                    .warnings
                    .push(format!("fix record for out-of-range page {} skipped", page));
                summary.fixes_skipped += 1;
                continue;
            }
        }
        match record {
            FixRecord::Heading { page, text, level } => {
                let retagged = retag_heading(&mut builder, &tagged_by_page[*page as usize], text, *level);
                if retagged {
                    summary.fixes_applied += 1;
                } else {
                    // No matching block; create a standalone heading element
                    builder.create_element(
                        StructTag::heading(*level),
                        *page,
                        ElementOptions {
                            text: Some(text.clone()),
                            ..Default::default()
                        },
                    );
                    summary.fixes_applied += 1;
                }
            },
            FixRecord::Table { page, table } => {
                if table.rows.is_empty() {
                    log::warn!("table fix with no rows skipped (page {})", page);
                    summary.warnings.push(format!("table fix with no rows skipped (page {})", page));
                    summary.fixes_skipped += 1;
                } else {
                    builder.create_table(*page, table, None);
                    summary.fixes_applied += 1;
                }
            },
            FixRecord::List { page, list } => {
                if list.items.is_empty() {
                    log::warn!("list fix with no items skipped (page {})", page);
                    summary.warnings.push(format!("list fix with no items skipped (page {})", page));
                    summary.fixes_skipped += 1;
                } else {
                    builder.create_list(*page, list);
                    summary.fixes_applied += 1;
                }
            },
            FixRecord::AltText { page, target, alt } => {
                if apply_alt_text(
                    &mut builder,
                    &figures_by_page[*page as usize],
                    target.as_deref(),
                    alt,
                ) {
                    summary.fixes_applied += 1;
                } else {
                    log::warn!("altText fix matched no figure on page {}", page);
                    summary
                        .warnings
                        .push(format!("altText fix matched no figure on page {}", page));
                    summary.fixes_skipped += 1;
                }
            },
            FixRecord::Metadata { title, author, subject } => {
                if let Some(title) = title {
                    doc.set_title(title);
                }
                if let Some(author) = author {
                    doc.info.insert(
                        "Author".to_string(),
                        crate::object::Object::string(author),
                    );
                }
                if let Some(subject) = subject {
                    doc.info.insert(
                        "Subject".to_string(),
                        crate::object::Object::string(subject),
                    );
                }
                summary.fixes_applied += 1;
            },
            FixRecord::Language { lang } => {
                doc.set_language(lang);
                summary.fixes_applied += 1;
            },
            FixRecord::ColorContrast { .. } => {
                // Contrast remediation belongs to the independent auditor
                log::debug!("colorContrast record delegated; not handled here");
                summary.fixes_skipped += 1;
            },
            FixRecord::Unknown => {
                summary.fixes_skipped += 1;
            },
        }
    }

    summary.elements_created = builder.finalize();

    // Link every page that has pending assignments.
    let linker = match options.link_mode {
        Some(mode) => ContentStreamLinker::with_mode(mode),
        None => ContentStreamLinker::new(),
    };
    let pages = builder.pages_with_assignments();
    let (tree, assignments) = builder.finish();
    for page_index in pages {
        let Some(page) = doc.page_mut(page_index as usize) else {
            continue;
        };
        let specs = assignments.get(&page_index).map(Vec::as_slice).unwrap_or(&[]);
        let outcome = linker.link_page(&mut page.content, specs);
        summary.mcids_placed += outcome.placed;
        summary.warnings.extend(
            outcome
                .warnings
                .into_iter()
                .map(|w| format!("page {}: {}", page_index, w)),
        );
    }
    doc.struct_tree = Some(tree);

    // Document-level attributes: title and language resolve by precedence
    // (CLI option, then fix record / snapshot, then oracle fallback).
    if let Some(ref title) = options.title {
        doc.set_title(title);
    } else if doc.info_title().is_none() {
        if let Some(ref title) = snapshot.title {
            doc.set_title(title);
        }
    }

    if let Some(ref language) = options.language {
        doc.set_language(language);
    } else if doc.language().is_none() {
        let language = snapshot.language.clone().unwrap_or_else(|| {
            let sample = first_text_sample(snapshot);
            language_or_default(oracle, &sample)
        });
        doc.set_language(&language);
    }

    doc.set_marked(true);
    doc.set_display_doc_title();
    if let Some(xmp) = doc.xmp.as_mut() {
        xmp.stamp_modified();
    }

    Ok((doc, summary))
}

/// Create the element for one classified block. Returns None for blocks
/// that produce no structure (empty text, unclassifiable).
fn tag_block(
    builder: &mut StructureTreeBuilder,
    page: u32,
    block: &ContentBlock,
    oracle: &dyn SuggestionOracle,
) -> Option<NodeId> {
    let y = Some(block.bbox.top());
    match &block.kind {
        BlockKind::Heading { level } => {
            let (id, _) = builder.create_element(
                StructTag::heading(*level),
                page,
                ElementOptions {
                    text: block.text.clone(),
                    y,
                    ..Default::default()
                },
            );
            Some(id)
        },
        BlockKind::Paragraph | BlockKind::Caption | BlockKind::ListItem => {
            block.text.as_ref()?;
            let (id, _) = builder.create_element(
                StructTag::P,
                page,
                ElementOptions {
                    text: block.text.clone(),
                    y,
                    ..Default::default()
                },
            );
            Some(id)
        },
        BlockKind::Figure => {
            let alt = block.alt.clone().or_else(|| {
                let context = block.text.clone().unwrap_or_default();
                oracle.suggest_alt_text(&context)
            });
            let (id, _) = builder.create_element(
                StructTag::Figure,
                page,
                ElementOptions {
                    text: block.text.clone(),
                    alt,
                    y,
                    ..Default::default()
                },
            );
            Some(id)
        },
        BlockKind::Other => {
            let text = block.text.as_ref()?;
            if text.is_empty() {
                return None;
            }
            let (id, _) = builder.create_element(
                StructTag::P,
                page,
                ElementOptions {
                    text: Some(text.clone()),
                    y,
                    ..Default::default()
                },
            );
            Some(id)
        },
    }
}

/// Retag an already-created element as a heading, matching by block text.
fn retag_heading(
    builder: &mut StructureTreeBuilder,
    tagged: &[(NodeId, Option<String>)],
    text: &str,
    level: u8,
) -> bool {
    for (id, block_text) in tagged {
        if block_text.as_deref() == Some(text) {
            builder.retag(*id, StructTag::heading(level));
            return true;
        }
    }
    false
}

/// Set alt text on the targeted figure, or the first figure without alt.
fn apply_alt_text(
    builder: &mut StructureTreeBuilder,
    figures: &[NodeId],
    target: Option<&str>,
    alt: &str,
) -> bool {
    for id in figures {
        let Some(node) = builder.tree_mut().node_mut(*id) else {
            continue;
        };
        let matches = match target {
            Some(wanted) => node.text.as_deref() == Some(wanted),
            None => node.alt.as_deref().map(|a| a.is_empty()).unwrap_or(true),
        };
        if matches {
            node.alt = Some(alt.to_string());
            return true;
        }
    }
    false
}

/// A small text sample for language detection.
fn first_text_sample(snapshot: &DocumentSnapshot) -> String {
    snapshot
        .pages
        .iter()
        .flat_map(|p| p.blocks.iter())
        .filter_map(|b| b.text.as_deref())
        .take(5)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::NoSuggestions;
    use crate::blocks::{BBox, PageSnapshot};
    use crate::compliance::{CheckKind, ComplianceValidator};

    fn block(kind: BlockKind, text: &str, y: f32) -> ContentBlock {
        ContentBlock {
            kind,
            text: Some(text.to_string()),
            bbox: BBox {
                x: 72.0,
                y,
                width: 400.0,
                height: 20.0,
            },
            font: None,
            alt: None,
        }
    }

    fn one_page_snapshot() -> DocumentSnapshot {
        DocumentSnapshot {
            title: Some("Handbook".into()),
            language: Some("en".into()),
            pages: vec![PageSnapshot {
                width: 612.0,
                height: 792.0,
                content: b"BT (Welcome) Tj (Body text) Tj ET".to_vec(),
                blocks: vec![
                    block(BlockKind::Heading { level: 1 }, "Welcome", 700.0),
                    block(BlockKind::Paragraph, "Body text", 650.0),
                ],
                annotations: vec![],
            }],
        }
    }

    #[test]
    fn test_pass_produces_compliant_document() {
        let snapshot = one_page_snapshot();
        let (doc, summary) =
            remediate(&snapshot, &[], &NoSuggestions, &RemediationOptions::default()).unwrap();
        assert_eq!(summary.elements_created, 2);
        assert_eq!(summary.mcids_placed, 2);

        let report = ComplianceValidator::new().validate(&doc);
        assert!(report.is_compliant, "failures: {:?}", report.checks);
    }

    #[test]
    fn test_heading_fix_retags_block() {
        let snapshot = one_page_snapshot();
        let fixes = vec![FixRecord::Heading {
            page: 0,
            text: "Body text".into(),
            level: 2,
        }];
        let (doc, summary) =
            remediate(&snapshot, &fixes, &NoSuggestions, &RemediationOptions::default()).unwrap();
        assert_eq!(summary.fixes_applied, 1);

        let tree = doc.struct_tree.as_ref().unwrap();
        let headings = crate::structure::traversal::collect_headings(tree);
        assert_eq!(headings.len(), 2);
        assert_eq!(headings[1].level, 2);
    }

    #[test]
    fn test_out_of_range_page_is_skipped_not_fatal() {
        let snapshot = one_page_snapshot();
        let fixes = vec![FixRecord::Heading {
            page: 9,
            text: "Ghost".into(),
            level: 1,
        }];
        let (_, summary) =
            remediate(&snapshot, &fixes, &NoSuggestions, &RemediationOptions::default()).unwrap();
        assert_eq!(summary.fixes_applied, 0);
        assert_eq!(summary.fixes_skipped, 1);
        assert!(!summary.warnings.is_empty());
    }

    #[test]
    fn test_language_fallback_is_deterministic() {
        let mut snapshot = one_page_snapshot();
        snapshot.language = None;
        let (doc, _) =
            remediate(&snapshot, &[], &NoSuggestions, &RemediationOptions::default()).unwrap();
        assert_eq!(doc.language().as_deref(), Some("en"));
    }

    #[test]
    fn test_cli_options_take_precedence() {
        let snapshot = one_page_snapshot();
        let options = RemediationOptions {
            title: Some("Override".into()),
            language: Some("de".into()),
            link_mode: None,
        };
        let (doc, _) = remediate(&snapshot, &[], &NoSuggestions, &options).unwrap();
        assert_eq!(doc.info_title().as_deref(), Some("Override"));
        assert_eq!(doc.language().as_deref(), Some("de"));
    }

    #[test]
    fn test_alt_text_fix_applies_to_untitled_figure() {
        let mut snapshot = one_page_snapshot();
        snapshot.pages[0]
            .blocks
            .push(block(BlockKind::Figure, "chart", 400.0));
        let fixes = vec![FixRecord::AltText {
            page: 0,
            target: None,
            alt: "Revenue by quarter".into(),
        }];
        let (doc, summary) =
            remediate(&snapshot, &fixes, &NoSuggestions, &RemediationOptions::default()).unwrap();
        assert_eq!(summary.fixes_applied, 1);

        let report = ComplianceValidator::new().validate(&doc);
        assert!(report.check(CheckKind::AlternateText).unwrap().passed);
    }

    #[test]
    fn test_delegated_and_unknown_records_counted_as_skipped() {
        let snapshot = one_page_snapshot();
        let fixes = vec![
            FixRecord::ColorContrast { page: Some(0) },
            FixRecord::Unknown,
        ];
        let (_, summary) =
            remediate(&snapshot, &fixes, &NoSuggestions, &RemediationOptions::default()).unwrap();
        assert_eq!(summary.fixes_applied, 0);
        assert_eq!(summary.fixes_skipped, 2);
    }
}
