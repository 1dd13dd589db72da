//! Content stream operator classification.
//!
//! Operator names per ISO 32000-1:2008, Section 8-9. The linker only needs
//! to know which operators paint glyphs and which manage marked content.

/// Operators that show text (paint glyphs).
///
/// ISO 32000-1:2008, Table 109: Tj, TJ, ' and ".
pub const TEXT_SHOWING_OPS: [&str; 4] = ["Tj", "TJ", "'", "\""];

/// Rough classification of a content stream operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpClass {
    /// Paints glyphs (Tj, TJ, ', ")
    TextShowing,
    /// Marked-content boundary (BMC, BDC, EMC, MP, DP)
    MarkedContent,
    /// Inline image sequence (BI ... ID ... EI)
    InlineImage,
    /// Everything else (graphics state, paths, XObjects, ...)
    Other,
}

/// Check whether an operator paints glyphs.
pub fn is_text_showing(op: &str) -> bool {
    TEXT_SHOWING_OPS.contains(&op)
}

/// Classify an operator by name.
pub fn classify(op: &str) -> OpClass {
    match op {
        "Tj" | "TJ" | "'" | "\"" => OpClass::TextShowing,
        "BMC" | "BDC" | "EMC" | "MP" | "DP" => OpClass::MarkedContent,
        "BI" => OpClass::InlineImage,
        _ => OpClass::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_showing() {
        assert!(is_text_showing("Tj"));
        assert!(is_text_showing("TJ"));
        assert!(is_text_showing("'"));
        assert!(is_text_showing("\""));
        assert!(!is_text_showing("Td"));
        assert!(!is_text_showing("Do"));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("TJ"), OpClass::TextShowing);
        assert_eq!(classify("BDC"), OpClass::MarkedContent);
        assert_eq!(classify("EMC"), OpClass::MarkedContent);
        assert_eq!(classify("BI"), OpClass::InlineImage);
        assert_eq!(classify("re"), OpClass::Other);
        assert_eq!(classify("cm"), OpClass::Other);
    }
}
