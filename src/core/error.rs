//! Error taxonomy for ledger and store operations.

use thiserror::Error;

/// Errors raised by the ledger core and its stores.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// No authenticated session, or the store rejected the credentials
    #[error("User is not authenticated")]
    Authentication,

    /// The store could not be read
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store did not accept a write
    #[error("Write failed: {0}")]
    WriteError(String),

    /// A transaction violates the record invariants
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    /// Parsing an exported ledger failed
    #[error("Import error: {0}")]
    Import(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
