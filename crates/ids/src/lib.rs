//! Identifier generation for laboratory records.
//!
//! Three identifier shapes are in use:
//!
//! - **Sequential ids** for catalog tests, patients and inventory: a short uppercase prefix
//!   followed by a zero-padded counter (`T001`, `P012`, `INV003`).
//! - **Timestamp ids** for samples: a prefix followed by the last eight digits of the
//!   intake time in epoch milliseconds (`SAM84511234`). The same string doubles as the
//!   sample barcode.
//! - **Record UUIDs** for result sets: 32 lowercase hex characters, no hyphens.
//!
//! Both generators are monotonic. A generator never hands out the same id twice, even when
//! entries are deleted or several samples arrive within the same millisecond.

mod generator;

pub use generator::{RecordUuid, SequentialIdGenerator, TimestampIdGenerator, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type IdResult<T> = Result<T, IdError>;
