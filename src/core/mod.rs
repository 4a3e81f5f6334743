//! Core ledger types, derived views and the store abstraction

pub mod aggregation;
pub mod config;
pub mod error;
pub mod log;
pub mod session;
pub mod store;
pub mod transaction;

// Re-export main types for cleaner imports
pub use aggregation::{BalanceOrder, BalancePoint, LedgerSummary, Totals};
pub use error::{LedgerError, LedgerResult};
pub use session::{Session, UserId};
pub use store::TransactionStore;
pub use transaction::{Transaction, TransactionRecord, TransactionType};
