use super::ui;
use crate::core::session::Session;
use crate::core::store::TransactionStore;
use crate::core::transaction::{Transaction, TransactionType};
use crate::ledger::LedgerState;
use anyhow::Result;
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;

/// A transaction entered on the command line.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionType,
    pub name: String,
    pub amount: Decimal,
    pub tag: String,
    pub date: Option<NaiveDate>,
}

impl NewTransaction {
    pub fn into_transaction(self) -> Result<Transaction> {
        let date = self.date.unwrap_or_else(|| Local::now().date_naive());
        Ok(Transaction::new(
            self.kind,
            date,
            self.amount,
            self.tag,
            self.name,
        )?)
    }
}

pub async fn run(
    ledger: &mut LedgerState,
    store: &dyn TransactionStore,
    session: &Session,
    new: NewTransaction,
) -> Result<()> {
    let transaction = new.into_transaction()?;
    let notice = ledger.add(store, session, transaction).await;
    ui::print_notice(&notice);
    if notice.is_error() {
        anyhow::bail!("Transaction was not saved: {}", notice.message);
    }

    let totals = ledger.totals();
    println!(
        "{} {}",
        ui::style_text("Current Balance:", ui::StyleType::TotalLabel),
        ui::style_text(&format!("{:.2}", totals.net), ui::StyleType::TotalValue)
    );
    Ok(())
}
