//! Error types for the remediation library.
//!
//! This module defines all error types that can occur while building structure
//! trees, linking content streams, and writing remediated documents.

/// Result type alias for remediation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during PDF remediation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed extractor snapshot or fix-record file
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Object has wrong type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// Stream decoding error
    #[error("Stream decoding error: {0}")]
    Decode(String),

    /// Unsupported stream filter
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Content stream could not be tokenized
    #[error("Content stream parse error at byte {offset}: {reason}")]
    ContentStream {
        /// Byte offset where tokenization failed
        offset: usize,
        /// Reason for the failure
        reason: String,
    },

    /// Structure tree invariant violation
    #[error("Structure tree error: {0}")]
    StructureTree(String),

    /// XMP metadata error
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// UTF-8 decoding error
    #[error("UTF-8 decoding error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_stream_error() {
        let err = Error::ContentStream {
            offset: 42,
            reason: "unterminated string".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("42"));
        assert!(msg.contains("unterminated string"));
    }

    #[test]
    fn test_invalid_object_type_error() {
        let err = Error::InvalidObjectType {
            expected: "Stream".to_string(),
            found: "Array".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Stream"));
        assert!(msg.contains("Array"));
    }

    #[test]
    fn test_structure_tree_error() {
        let err = Error::StructureTree("root already exists".to_string());
        assert!(format!("{}", err).contains("root already exists"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
