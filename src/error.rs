//! Error types for sorting runs, registry lookups and option parsing.

use thiserror::Error;

use crate::registry::{AlgorithmId, Family};

/// Result type alias for sortviz operations
pub type Result<T> = std::result::Result<T, SortError>;

/// Error type for sortviz operations
#[derive(Error, Debug)]
pub enum SortError {
    /// An option value outside its enumerated set
    #[error("Invalid option '{name}': {value} (expected one of {allowed:?})")]
    InvalidOption {
        /// The option name
        name: &'static str,
        /// The rejected value
        value: u32,
        /// The accepted values
        allowed: &'static [u32],
    },

    /// A family tag outside `1..=5`
    #[error("Unknown algorithm family tag: {0} (expected 1..=5)")]
    UnknownFamily(u8),

    /// A name that the selected family does not provide
    #[error("Unknown algorithm '{name}' in the {family} family")]
    UnknownAlgorithm {
        /// The family that was searched
        family: Family,
        /// The requested name
        name: String,
    },

    /// A template hook the algorithm does not implement
    #[error("{algorithm} does not support {operation}")]
    Unsupported {
        /// The algorithm that rejected the call
        algorithm: AlgorithmId,
        /// The rejected hook
        operation: &'static str,
    },

    /// Dense-bucket algorithms refuse value spans they cannot allocate for
    #[error("{algorithm} cannot sort a value span of {span} (limit {limit})")]
    SpanTooWide {
        /// The algorithm that refused the input
        algorithm: AlgorithmId,
        /// `max - min + 1` of the input range
        span: u64,
        /// The largest accepted span
        limit: u64,
    },

    /// The snapshot consumer went away mid-run
    #[error("Snapshot consumer disconnected")]
    Cancelled,

    /// The worker thread could not be started or died without reporting
    #[error("Sort worker failed: {0}")]
    Worker(String),

    /// A malformed options document
    #[error("Invalid options document: {0}")]
    Config(#[from] serde_json::Error),

    /// I/O failure while writing reports
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_option_message() {
        let err = SortError::InvalidOption { name: "radix_base", value: 7, allowed: &[2, 8, 10, 16] };
        assert_eq!(err.to_string(), "Invalid option 'radix_base': 7 (expected one of [2, 8, 10, 16])");
    }

    #[test]
    fn test_unknown_algorithm_message() {
        let err = SortError::UnknownAlgorithm { family: Family::Curious, name: "quick-sort".to_string() };
        assert_eq!(err.to_string(), "Unknown algorithm 'quick-sort' in the curious family");
    }

    #[test]
    fn test_unsupported_message() {
        let err = SortError::Unsupported { algorithm: AlgorithmId::BitonicSort, operation: "sort_range" };
        assert_eq!(err.to_string(), "bitonic-sort does not support sort_range");
    }
}
