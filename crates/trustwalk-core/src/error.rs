//! Error types for trustwalk.

use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for trustwalk operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building trust graphs or propagating votes.
#[derive(Error, Debug)]
pub enum Error {
    /// Vertex (user) not present in the trust graph.
    #[error("Vertex {0} not found in trust graph")]
    VertexNotFound(u64),

    /// Attempted to add an edge from a vertex to itself.
    #[error("Self-loop rejected on vertex {0}")]
    SelfLoop(u64),

    /// An edge already exists for this ordered pair.
    #[error("Edge {from} -> {to} already exists")]
    EdgeExists {
        /// Source vertex.
        from: u64,
        /// Target vertex.
        to: u64,
    },

    /// No edge exists for this ordered pair.
    #[error("Edge {from} -> {to} not found")]
    EdgeNotFound {
        /// Source vertex.
        from: u64,
        /// Target vertex.
        to: u64,
    },

    /// Edge weight is zero, negative, infinite or not a number.
    #[error("Edge {from} -> {to} has non-positive or non-finite weight {weight}")]
    NonPositiveWeight {
        /// Source vertex.
        from: u64,
        /// Target vertex.
        to: u64,
        /// Offending weight.
        weight: f64,
    },

    /// Rating data is internally inconsistent (upstream corruption).
    #[error("Corrupted rating data: {0}")]
    CorruptedData(String),

    /// A running rating accumulator would overflow.
    #[error("Accumulator overflow: {0}")]
    ValueOverflow(String),

    /// Component constructed with invalid parameters.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Propagation was requested with an empty votes map.
    #[error("Propagation requires at least one voter")]
    NoVoters,

    /// A per-source edge policy was evaluated for another source.
    #[error("Policy bound to source {expected} evaluated for source {actual}")]
    PolicyScope {
        /// Source vertex the policy was constructed for.
        expected: u64,
        /// Source vertex it was evaluated for.
        actual: u64,
    },

    /// The builder pipeline stopped before signalling completion.
    #[error("Graph build pipeline aborted: {0}")]
    PipelineAborted(String),

    /// Snapshot file written by an incompatible format version.
    #[error("Unsupported snapshot format version {found} (expected {expected})")]
    UnsupportedFormatVersion {
        /// Version found in the file.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },

    /// Snapshot file does not start with the expected magic bytes.
    #[error("Invalid snapshot header")]
    InvalidSnapshotHeader,

    /// Binary serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Returns true if a driver may skip the current item and continue
    /// with the next one.
    ///
    /// Data corruption, accumulator overflow and configuration errors are
    /// fatal for the whole run.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::VertexNotFound(_) | Self::NoVoters | Self::Io(_) | Self::Csv(_)
        )
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::EdgeExists { from: 1, to: 2 };
        assert_eq!(err.to_string(), "Edge 1 -> 2 already exists");

        let err = Error::NonPositiveWeight {
            from: 3,
            to: 4,
            weight: -0.5,
        };
        assert!(err.to_string().contains("-0.5"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_fatal_errors_are_not_recoverable() {
        assert!(!Error::CorruptedData("mismatch".into()).is_recoverable());
        assert!(!Error::ValueOverflow("sigma".into()).is_recoverable());
        assert!(!Error::InvalidConfig("scale".into()).is_recoverable());
        assert!(Error::VertexNotFound(7).is_recoverable());
    }
}
