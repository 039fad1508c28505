//! Core error types for varacc

use thiserror::Error;

/// A single failed document inside an unordered bulk write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkWriteFailure {
    pub hash: String,
    pub message: String,
}

/// Main error type for varacc operations
#[derive(Error, Debug)]
pub enum VarAccError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The counter could not hand out a new accession; the batch must be aborted
    #[error("Accession could not be generated: {0}")]
    AllocationFailure(String),

    /// Data that violates an invariant the pipeline relies on; never retried
    #[error("Integrity fault: {0}")]
    IntegrityFault(String),

    /// Input that references data absent from the reference material
    #[error("Upstream data fault: {0}")]
    UpstreamDataFault(String),

    #[error("Accession {0} does not exist")]
    AccessionDoesNotExist(u64),

    #[error("Accession {origin} has been merged into {destination}")]
    AccessionMerged { origin: u64, destination: u64 },

    #[error("Accession {0} has been deprecated")]
    AccessionDeprecated(u64),

    #[error("Hash {hash} already exists with accession {accession}")]
    HashAlreadyExists { hash: String, accession: u64 },

    #[error("Bulk write failed for {} of {attempted} documents", .failures.len())]
    BulkWrite {
        attempted: usize,
        failures: Vec<BulkWriteFailure>,
    },
}

/// Result type alias for varacc operations
pub type VarAccResult<T> = Result<T, VarAccError>;

impl VarAccError {
    /// Whether retrying the same batch can possibly succeed
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            VarAccError::Io(_) | VarAccError::Storage(_) | VarAccError::BulkWrite { .. }
        )
    }
}

impl From<serde_json::Error> for VarAccError {
    fn from(err: serde_json::Error) -> Self {
        VarAccError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for VarAccError {
    fn from(err: anyhow::Error) -> Self {
        VarAccError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display() {
        let merged = VarAccError::AccessionMerged {
            origin: 10,
            destination: 20,
        };
        assert_eq!(merged.to_string(), "Accession 10 has been merged into 20");

        let exists = VarAccError::HashAlreadyExists {
            hash: "ABC".to_string(),
            accession: 3,
        };
        assert_eq!(exists.to_string(), "Hash ABC already exists with accession 3");

        let bulk = VarAccError::BulkWrite {
            attempted: 5,
            failures: vec![BulkWriteFailure {
                hash: "H".to_string(),
                message: "boom".to_string(),
            }],
        };
        assert_eq!(bulk.to_string(), "Bulk write failed for 1 of 5 documents");

        let fault = VarAccError::IntegrityFault("two snapshots".to_string());
        assert_eq!(fault.to_string(), "Integrity fault: two snapshots");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: VarAccError = io_err.into();

        match err {
            VarAccError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
            _ => panic!("Expected Io error variant"),
        }
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let parse_result: Result<serde_json::Value, serde_json::Error> =
            serde_json::from_str("{invalid json}");
        let err: VarAccError = parse_result.unwrap_err().into();

        assert!(matches!(err, VarAccError::Serialization(_)));
    }

    #[test]
    fn test_retriable_classification() {
        assert!(VarAccError::Storage("timeout".to_string()).is_retriable());
        assert!(!VarAccError::IntegrityFault("x".to_string()).is_retriable());
        assert!(!VarAccError::AllocationFailure("exhausted".to_string()).is_retriable());
        assert!(!VarAccError::UpstreamDataFault("contig".to_string()).is_retriable());
    }
}
