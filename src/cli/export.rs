use super::ui;
use crate::core::session::Session;
use crate::core::store::TransactionStore;
use crate::export::{export_file, import_csv};
use crate::ledger::{FetchStatus, LedgerState};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Writes the ledger as CSV to `output`.
///
/// Refuses to write anything unless the ledger was fetched successfully, so
/// an unreachable store never produces a truncated file.
pub fn export(ledger: &LedgerState, output: &Path) -> Result<()> {
    match ledger.status() {
        FetchStatus::Loaded => {}
        FetchStatus::Failed(e) => {
            anyhow::bail!("Nothing exported: transactions could not be fetched ({e})")
        }
        _ => anyhow::bail!("Nothing exported: transactions were not fetched"),
    }

    let file = export_file(&ledger.transactions());
    std::fs::write(output, &file.bytes)
        .with_context(|| format!("Failed to write export to {}", output.display()))?;

    info!(
        "Exported {} transactions to {} as {}",
        ledger.len(),
        output.display(),
        file.mime_type
    );
    println!(
        "Exported {} transactions to {} ({})",
        ledger.len(),
        ui::style_text(&output.display().to_string(), ui::StyleType::TotalLabel),
        file.mime_type
    );
    Ok(())
}

/// Appends every transaction of a CSV file to the ledger.
pub async fn import(
    ledger: &mut LedgerState,
    store: &dyn TransactionStore,
    session: &Session,
    input: &Path,
) -> Result<()> {
    let bytes = std::fs::read(input)
        .with_context(|| format!("Failed to read import file {}", input.display()))?;
    let transactions = import_csv(&bytes)
        .with_context(|| format!("Failed to parse {}", input.display()))?;

    let notice = ledger.add_many(store, session, transactions).await;
    ui::print_notice(&notice);
    if notice.is_error() {
        anyhow::bail!("Import incomplete: {}", notice.message);
    }
    Ok(())
}
