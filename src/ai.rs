//! Suggestion oracle seam.
//!
//! Alt-text and language suggestion is an external collaborator (an AI
//! service living outside this crate). The engine only depends on this
//! trait; calls must be time-bounded, and every absent or late answer has
//! a deterministic fallback: language defaults to "en", alt-text
//! suggestion is skipped.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Fallback primary language when no hint and no oracle answer exist.
pub const DEFAULT_LANGUAGE: &str = "en";

/// An oracle that may suggest a document language or figure alt-text.
pub trait SuggestionOracle {
    /// Suggest a primary language for a text sample, or None.
    fn suggest_language(&self, sample: &str) -> Option<String>;

    /// Suggest alternate text for a figure given surrounding context, or None.
    fn suggest_alt_text(&self, context: &str) -> Option<String>;
}

/// The no-op oracle: never suggests anything, fallbacks always apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSuggestions;

impl SuggestionOracle for NoSuggestions {
    fn suggest_language(&self, _sample: &str) -> Option<String> {
        None
    }

    fn suggest_alt_text(&self, _context: &str) -> Option<String> {
        None
    }
}

/// Wraps an oracle with a wall-clock budget shared across all calls.
///
/// Once the budget is spent, every further call short-circuits to None and
/// the deterministic fallbacks take over; a slow backend can delay a run by
/// at most the budget.
pub struct TimeBounded<O> {
    inner: O,
    budget: Duration,
    started: Cell<Option<Instant>>,
}

impl<O: SuggestionOracle> TimeBounded<O> {
    /// Wrap `inner`, allowing at most `budget` of wall-clock time in total.
    pub fn new(inner: O, budget: Duration) -> Self {
        Self {
            inner,
            budget,
            started: Cell::new(None),
        }
    }

    fn within_budget(&self) -> bool {
        let started = match self.started.get() {
            Some(instant) => instant,
            None => {
                let now = Instant::now();
                self.started.set(Some(now));
                now
            },
        };
        if started.elapsed() <= self.budget {
            true
        } else {
            log::warn!("suggestion oracle budget exhausted; using fallbacks");
            false
        }
    }
}

impl<O: SuggestionOracle> SuggestionOracle for TimeBounded<O> {
    fn suggest_language(&self, sample: &str) -> Option<String> {
        if self.within_budget() {
            self.inner.suggest_language(sample)
        } else {
            None
        }
    }

    fn suggest_alt_text(&self, context: &str) -> Option<String> {
        if self.within_budget() {
            self.inner.suggest_alt_text(context)
        } else {
            None
        }
    }
}

/// Resolve a language: oracle answer first, then the deterministic default.
pub fn language_or_default(oracle: &dyn SuggestionOracle, sample: &str) -> String {
    oracle
        .suggest_language(sample)
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}
