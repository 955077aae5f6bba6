//! Error types for the extraction library.
//!
//! The public extraction API is best-effort and never surfaces these errors;
//! they exist for the lexer/CLI edges and for internal fallible helpers that
//! degrade locally.

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur around the extraction core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Parse error at a specific byte offset
    #[error("Failed to parse object at byte {offset}: {reason}")]
    ParseError {
        /// Byte offset where the error occurred
        offset: usize,
        /// Reason for the parse failure
        reason: String,
    },

    /// Object has the wrong type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// Invalid PDF structure (generic)
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// Stream decoding error
    #[error("Stream decoding error: {0}")]
    Decode(String),

    /// Font error
    #[error("Font error: {0}")]
    Font(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
