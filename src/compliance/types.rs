//! Compliance check types and report structures.

use serde::Serialize;
use std::fmt;

/// The ten PDF/UA checks, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckKind {
    /// Structure tree exists with a populated Document wrapper
    TaggedPdf,
    /// Catalog `/Lang` present and syntactically valid
    PrimaryLanguage,
    /// Title present in both Info dictionary and XMP metadata
    Title,
    /// Page content covered by marked-content references
    TaggedContent,
    /// Document wrapper has structural children (tab-order presence)
    TabOrder,
    /// Figures have `/Alt`; widget annotations have a tooltip or title
    AlternateText,
    /// Heading levels never skip forward
    HeadingNesting,
    /// Traversal revisits no element (no cycles, no shared parents)
    TreeIntegrity,
    /// Catalog `/MarkInfo /Marked` is true
    MarkInfo,
    /// StructTreeRoot has exactly one child, of type Document
    DocumentWrapper,
}

impl CheckKind {
    /// All checks in execution order.
    pub const ALL: [CheckKind; 10] = [
        CheckKind::TaggedPdf,
        CheckKind::PrimaryLanguage,
        CheckKind::Title,
        CheckKind::TaggedContent,
        CheckKind::TabOrder,
        CheckKind::AlternateText,
        CheckKind::HeadingNesting,
        CheckKind::TreeIntegrity,
        CheckKind::MarkInfo,
        CheckKind::DocumentWrapper,
    ];

    /// Stable error code for reports.
    pub fn code(&self) -> &'static str {
        match self {
            CheckKind::TaggedPdf => "UA-CHK-001",
            CheckKind::PrimaryLanguage => "UA-CHK-002",
            CheckKind::Title => "UA-CHK-003",
            CheckKind::TaggedContent => "UA-CHK-004",
            CheckKind::TabOrder => "UA-CHK-005",
            CheckKind::AlternateText => "UA-CHK-006",
            CheckKind::HeadingNesting => "UA-CHK-007",
            CheckKind::TreeIntegrity => "UA-CHK-008",
            CheckKind::MarkInfo => "UA-CHK-009",
            CheckKind::DocumentWrapper => "UA-CHK-010",
        }
    }

    /// Human-readable check name.
    pub fn title(&self) -> &'static str {
        match self {
            CheckKind::TaggedPdf => "Tagged PDF",
            CheckKind::PrimaryLanguage => "Primary language",
            CheckKind::Title => "Document title",
            CheckKind::TaggedContent => "Tagged content",
            CheckKind::TabOrder => "Tab order",
            CheckKind::AlternateText => "Alternate text",
            CheckKind::HeadingNesting => "Heading nesting",
            CheckKind::TreeIntegrity => "Structure tree integrity",
            CheckKind::MarkInfo => "MarkInfo/Marked",
            CheckKind::DocumentWrapper => "Document wrapper",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Result of one compliance check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    /// Which check this is
    pub kind: CheckKind,
    /// Stable code, duplicated for report consumers
    pub code: &'static str,
    /// Whether the check passed
    pub passed: bool,
    /// One reason per individual failure
    pub failures: Vec<String>,
    /// Check-specific diagnostic values
    pub details: serde_json::Value,
}

impl CheckOutcome {
    /// A passing outcome.
    pub fn pass(kind: CheckKind) -> Self {
        Self {
            kind,
            code: kind.code(),
            passed: true,
            failures: Vec::new(),
            details: serde_json::Value::Null,
        }
    }

    /// A failing outcome with one reason.
    pub fn fail(kind: CheckKind, reason: impl Into<String>) -> Self {
        let mut outcome = Self::pass(kind);
        outcome.add_failure(reason);
        outcome
    }

    /// Record a failure reason; the outcome becomes failing.
    pub fn add_failure(&mut self, reason: impl Into<String>) {
        self.failures.push(reason.into());
        self.passed = false;
    }

    /// Attach diagnostic details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

/// The aggregated report of all ten checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceReport {
    /// Overall compliance: logical AND of all checks
    pub is_compliant: bool,
    /// Every check's outcome, in execution order
    pub checks: Vec<CheckOutcome>,
}

impl ComplianceReport {
    /// Aggregate check outcomes; every check is present, none short-circuited.
    pub fn from_checks(checks: Vec<CheckOutcome>) -> Self {
        let is_compliant = checks.iter().all(|c| c.passed);
        Self {
            is_compliant,
            checks,
        }
    }

    /// Outcome for a specific check.
    pub fn check(&self, kind: CheckKind) -> Option<&CheckOutcome> {
        self.checks.iter().find(|c| c.kind == kind)
    }

    /// Total failure reasons across all checks.
    pub fn failure_count(&self) -> usize {
        self.checks.iter().map(|c| c.failures.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_codes_are_stable() {
        assert_eq!(CheckKind::TaggedPdf.code(), "UA-CHK-001");
        assert_eq!(CheckKind::DocumentWrapper.code(), "UA-CHK-010");
        assert_eq!(format!("{}", CheckKind::AlternateText), "UA-CHK-006");
    }

    #[test]
    fn test_all_lists_ten_checks() {
        assert_eq!(CheckKind::ALL.len(), 10);
        let codes: std::collections::HashSet<_> =
            CheckKind::ALL.iter().map(|k| k.code()).collect();
        assert_eq!(codes.len(), 10);
    }

    #[test]
    fn test_outcome_fail_flips_passed() {
        let mut outcome = CheckOutcome::pass(CheckKind::Title);
        assert!(outcome.passed);
        outcome.add_failure("no Info title");
        assert!(!outcome.passed);
        assert_eq!(outcome.failures.len(), 1);
    }

    #[test]
    fn test_report_aggregation() {
        let report = ComplianceReport::from_checks(vec![
            CheckOutcome::pass(CheckKind::TaggedPdf),
            CheckOutcome::fail(CheckKind::Title, "missing"),
        ]);
        assert!(!report.is_compliant);
        assert_eq!(report.failure_count(), 1);
        assert!(report.check(CheckKind::TaggedPdf).unwrap().passed);
    }

    #[test]
    fn test_report_serializes() {
        let report = ComplianceReport::from_checks(vec![CheckOutcome::pass(CheckKind::MarkInfo)]);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"UA-CHK-009\""));
        assert!(json.contains("\"is_compliant\":true"));
    }
}
