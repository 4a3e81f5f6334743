pub mod disk;
pub mod memory;

use crate::core::config::AppConfig;
use crate::core::store::TransactionStore;
use crate::providers::remote_store::RemoteStore;
use anyhow::{Context, Result};
use disk::DiskStore;
use tracing::debug;

/// Opens the transaction store selected by `config`.
///
/// A configured remote store takes precedence; otherwise transactions are
/// kept on disk under the data directory.
pub fn open_store(config: &AppConfig) -> Result<Box<dyn TransactionStore>> {
    if let Some(remote) = &config.store.remote {
        debug!("Using remote store at {}", remote.base_url);
        return Ok(Box::new(RemoteStore::from_config(remote)));
    }

    let path = config.default_data_path()?.join("ledger");
    debug!("Using disk store at {}", path.display());
    let store = DiskStore::open(&path)
        .with_context(|| format!("Failed to open ledger at {}", path.display()))?;
    Ok(Box::new(store))
}
