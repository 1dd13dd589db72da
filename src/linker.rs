//! Content-stream linker.
//!
//! Makes the MCIDs allocated by the structure tree builder resolvable
//! against a page's drawn content by inserting `BDC`/`EMC` operator pairs
//! into the raw content-stream bytes:
//!
//! ```text
//! /P <</MCID 0>> BDC
//! (Hello) Tj
//! EMC
//! ```
//!
//! Linking is fail-soft, never fail-fast: a partially-tagged document is
//! strictly better than a corrupted one. The degradation ladder per page is
//! precise mode -> simple mode -> leave the bytes untouched; a stream whose
//! nesting cannot be resolved is never spliced into at all, because an
//! inserted `EMC` could land inside an unterminated construct.

use crate::content::parser::scan_content_ops;
use crate::content::{is_text_showing, ContentOp};
use crate::structure::builder::McidAssignment;
use std::ops::Range;

/// Operating mode for a page link pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// Wrap individual text-showing operator ranges, one per MCID
    Precise,
    /// Wrap the entire content stream once with a single MCID
    Simple,
}

/// Result of linking one page.
#[derive(Debug, Clone, Default)]
pub struct LinkOutcome {
    /// MCIDs successfully placed into the stream
    pub placed: usize,
    /// Non-fatal anomalies (unplaced MCIDs, fallbacks taken)
    pub warnings: Vec<String>,
}

impl LinkOutcome {
    fn warn(mut self, message: impl Into<String>) -> Self {
        self.warnings.push(message.into());
        self
    }
}

/// Inserts marked-content operators into page content streams.
#[derive(Debug, Clone, Default)]
pub struct ContentStreamLinker {
    /// Forced mode; auto-selected per page when None
    mode: Option<LinkMode>,
}

impl ContentStreamLinker {
    /// Create a linker that picks its mode per page: simple when a page has
    /// exactly one pending MCID, precise otherwise.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force one mode for every page.
    pub fn with_mode(mode: LinkMode) -> Self {
        Self { mode: Some(mode) }
    }

    /// Insert markers for `specs` into `content`, mutating it in place.
    ///
    /// Returns how many MCIDs were placed; the rest are reported in the
    /// outcome's warnings. On any parse anomaly the stream is left
    /// byte-identical and zero placements are reported.
    pub fn link_page(&self, content: &mut Vec<u8>, specs: &[McidAssignment]) -> LinkOutcome {
        if specs.is_empty() {
            return LinkOutcome::default();
        }

        // Either mode splices into the stream, so both need its nesting
        // resolved first.
        let ops = match scan_content_ops(content) {
            Ok(ops) => ops,
            Err(err) => {
                log::warn!("content stream left untouched: {}", err);
                return LinkOutcome::default()
                    .warn(format!("stream left untouched, not tokenizable: {}", err));
            },
        };

        let mode = self.mode.unwrap_or(if specs.len() == 1 {
            LinkMode::Simple
        } else {
            LinkMode::Precise
        });

        match mode {
            LinkMode::Precise => {
                let targets: Vec<Range<usize>> = ops
                    .iter()
                    .filter(|op: &&ContentOp| is_text_showing(&op.name))
                    .map(|op| op.span.clone())
                    .collect();

                if targets.is_empty() {
                    // Nothing to match against; degrade to the whole-stream wrap
                    return self
                        .wrap_whole_stream(content, specs)
                        .warn("no text-showing operators; fell back to simple mode");
                }
                self.wrap_targets(content, specs, &targets)
            },
            LinkMode::Simple => self.wrap_whole_stream(content, specs),
        }
    }

    /// Precise placement: the i-th pending MCID claims the i-th target range.
    fn wrap_targets(
        &self,
        content: &mut Vec<u8>,
        specs: &[McidAssignment],
        targets: &[Range<usize>],
    ) -> LinkOutcome {
        let mut outcome = LinkOutcome::default();
        let mut rebuilt = Vec::with_capacity(content.len() + specs.len() * 32);
        let mut cursor = 0usize;

        for (spec, range) in specs.iter().zip(targets.iter()) {
            rebuilt.extend_from_slice(&content[cursor..range.start]);
            rebuilt.extend_from_slice(
                format!("\n/{} <</MCID {}>> BDC\n", spec.tag.as_name(), spec.mcid).as_bytes(),
            );
            rebuilt.extend_from_slice(&content[range.clone()]);
            rebuilt.extend_from_slice(b"\nEMC\n");
            cursor = range.end;
            outcome.placed += 1;
        }
        rebuilt.extend_from_slice(&content[cursor..]);

        for spec in specs.iter().skip(targets.len()) {
            outcome.warnings.push(format!(
                "mcid {} not placed: {} pending mcids for {} text-showing operators",
                spec.mcid,
                specs.len(),
                targets.len()
            ));
        }
        if outcome.placed < specs.len() {
            log::warn!(
                "placed {} of {} pending mcid(s); remainder left unlinked",
                outcome.placed,
                specs.len()
            );
        }

        *content = rebuilt;
        outcome
    }

    /// Simple placement: one wrap around the whole stream with the first
    /// pending MCID.
    fn wrap_whole_stream(&self, content: &mut Vec<u8>, specs: &[McidAssignment]) -> LinkOutcome {
        let spec = specs[0];
        let mut rebuilt =
            format!("/{} <</MCID {}>> BDC\n", spec.tag.as_name(), spec.mcid).into_bytes();
        rebuilt.extend_from_slice(content);
        rebuilt.extend_from_slice(b"\nEMC");
        *content = rebuilt;

        let mut outcome = LinkOutcome {
            placed: 1,
            warnings: Vec::new(),
        };
        for spec in &specs[1..] {
            outcome
                .warnings
                .push(format!("mcid {} not placed: simple mode wraps once", spec.mcid));
        }
        outcome
    }
}
