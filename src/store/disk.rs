use crate::core::error::{LedgerError, LedgerResult};
use crate::core::session::UserId;
use crate::core::store::TransactionStore;
use crate::core::transaction::{Transaction, TransactionRecord};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

const PARTITION: &str = "transactions";
const SEQ_LEN: usize = std::mem::size_of::<u64>();

/// Transaction store persisted in a local fjall keyspace.
///
/// Keys are `user 0x00 sequence` with a big-endian sequence number, so a
/// prefix scan yields one user's transactions in insertion order.
pub struct DiskStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
    write_lock: Mutex<()>,
}

impl DiskStore {
    pub fn open(path: &Path) -> LedgerResult<Self> {
        std::fs::create_dir_all(path)
            .map_err(|e| LedgerError::StoreUnavailable(format!("{}: {e}", path.display())))?;
        let keyspace = fjall::Config::new(path)
            .open()
            .map_err(|e| LedgerError::StoreUnavailable(e.to_string()))?;
        let partition = keyspace
            .open_partition(PARTITION, PartitionCreateOptions::default())
            .map_err(|e| LedgerError::StoreUnavailable(e.to_string()))?;
        debug!("Opened disk store at {}", path.display());

        Ok(Self {
            keyspace,
            partition,
            write_lock: Mutex::new(()),
        })
    }

    fn user_prefix(user: &UserId) -> Vec<u8> {
        let mut prefix = user.as_str().as_bytes().to_vec();
        prefix.push(0);
        prefix
    }

    fn next_sequence(&self, prefix: &[u8]) -> LedgerResult<u64> {
        let last = self
            .partition
            .prefix(prefix)
            .next_back()
            .transpose()
            .map_err(|e| LedgerError::WriteError(e.to_string()))?;

        let Some((key, _)) = last else {
            return Ok(0);
        };
        let seq: [u8; SEQ_LEN] = key[key.len() - SEQ_LEN..]
            .try_into()
            .map_err(|_| LedgerError::WriteError("corrupt sequence key".to_string()))?;
        Ok(u64::from_be_bytes(seq) + 1)
    }
}

#[async_trait]
impl TransactionStore for DiskStore {
    async fn fetch_all(&self, user: &UserId) -> LedgerResult<Vec<Transaction>> {
        let mut transactions = Vec::new();
        for item in self.partition.prefix(Self::user_prefix(user)) {
            let (_, value) = item.map_err(|e| LedgerError::StoreUnavailable(e.to_string()))?;
            let transaction: Transaction = serde_json::from_slice(&value)
                .map_err(|e| LedgerError::StoreUnavailable(format!("malformed document: {e}")))?;
            transactions.push(transaction);
        }
        debug!("Disk store FETCH {} transactions for {}", transactions.len(), user);
        Ok(transactions)
    }

    async fn append(&self, user: &UserId, transaction: &Transaction) -> LedgerResult<String> {
        let _guard = self.write_lock.lock().await;

        let id = Uuid::new_v4().to_string();
        let record = TransactionRecord::from(transaction.clone().with_id(id.clone()));
        let value =
            serde_json::to_vec(&record).map_err(|e| LedgerError::WriteError(e.to_string()))?;

        let mut key = Self::user_prefix(user);
        let seq = self.next_sequence(&key)?;
        key.extend_from_slice(&seq.to_be_bytes());

        self.partition
            .insert(key, value)
            .map_err(|e| LedgerError::WriteError(e.to_string()))?;
        self.keyspace
            .persist(PersistMode::SyncAll)
            .map_err(|e| LedgerError::WriteError(e.to_string()))?;
        debug!("Disk store APPEND {} (seq {}) for {}", id, seq, user);
        Ok(id)
    }
}
