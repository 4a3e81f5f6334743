use crate::core::error::LedgerResult;
use crate::core::session::UserId;
use crate::core::store::TransactionStore;
use crate::core::transaction::Transaction;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// In-memory transaction store keyed by user
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<UserId, Vec<Transaction>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn fetch_all(&self, user: &UserId) -> LedgerResult<Vec<Transaction>> {
        let collections = self.inner.lock().await;
        let transactions = collections.get(user).cloned().unwrap_or_default();
        debug!("Memory store FETCH {} transactions for {}", transactions.len(), user);
        Ok(transactions)
    }

    async fn append(&self, user: &UserId, transaction: &Transaction) -> LedgerResult<String> {
        let id = Uuid::new_v4().to_string();
        let mut collections = self.inner.lock().await;
        collections
            .entry(user.clone())
            .or_default()
            .push(transaction.clone().with_id(id.clone()));
        debug!("Memory store APPEND {} for {}", id, user);
        Ok(id)
    }
}
