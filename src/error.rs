//! Error types for gts

use thiserror::Error;

/// Result type alias for gts operations
pub type Result<T> = std::result::Result<T, GtsError>;

/// Error types that can occur in gts
#[derive(Debug, Error)]
pub enum GtsError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed GenBank record
    #[error("invalid GenBank record at line {line}: {msg}")]
    InvalidGenBank {
        /// Line number within the record where the error occurred
        line: usize,
        /// What the parser expected
        msg: String,
    },

    /// Malformed FASTA record
    #[error("invalid FASTA record at line {line}: {msg}")]
    InvalidFasta {
        /// Line number where the error occurred
        line: usize,
        /// What the parser expected
        msg: String,
    },

    /// A string could not be interpreted as an INSDC location
    #[error("`{0}` is not a location")]
    InvalidLocation(String),

    /// A feature selector expression failed to parse
    #[error("invalid selector `{expr}`: {msg}")]
    InvalidSelector {
        /// The offending selector expression
        expr: String,
        /// Why it was rejected
        msg: String,
    },

    /// Refusing to write a record with no sequence bytes
    #[error("refusing to format an empty sequence")]
    EmptySequence,

    /// Rotation requested on a record that is not circular
    #[error("sequence `{0}` is not circular")]
    NotCircular(String),

    /// An edit position fell outside of the sequence
    #[error("position {index} is out of bounds for a sequence of length {len}")]
    OutOfBounds {
        /// The offending position
        index: usize,
        /// The sequence length
        len: usize,
    },

    /// The requested file format cannot be read or written
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
}
