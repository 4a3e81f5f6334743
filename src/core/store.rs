use crate::core::error::LedgerResult;
use crate::core::session::UserId;
use crate::core::transaction::Transaction;
use async_trait::async_trait;

/// Per-user transaction collection.
///
/// Only reads and appends are exposed. An empty collection is a successful
/// fetch.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Returns every transaction of `user` in insertion order.
    async fn fetch_all(&self, user: &UserId) -> LedgerResult<Vec<Transaction>>;

    /// Persists `transaction` and returns the identifier the store assigned.
    async fn append(&self, user: &UserId, transaction: &Transaction) -> LedgerResult<String>;
}
