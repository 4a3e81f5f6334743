//! Derived views over a transaction sequence.
//!
//! Everything here is pure: the same input sequence always produces the same
//! output. [`LedgerSummary`] folds transactions one at a time so a ledger can
//! keep its views current on append without rescanning; the `compute_*`
//! functions are the from-scratch equivalents.
use crate::core::transaction::{Transaction, TransactionType};
use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Income, expense and net balance over a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

/// Net amount of all transactions sharing a month label.
#[derive(Debug, Clone, PartialEq)]
pub struct BalancePoint {
    pub month: String,
    pub balance: Decimal,
}

/// Order in which balance series buckets are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceOrder {
    /// Order in which each month first appears in the ledger.
    #[default]
    FirstOccurrence,
    /// Ascending by year, then month.
    Chronological,
}

#[derive(Debug, Clone)]
struct MonthBucket {
    year: i32,
    month: u32,
    label: String,
    balance: Decimal,
}

/// Formats the bucket label for a date, e.g. `Jan 2024`.
pub fn month_label(date: chrono::NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

/// Running aggregate of a transaction sequence.
#[derive(Debug, Clone, Default)]
pub struct LedgerSummary {
    totals: Totals,
    buckets: Vec<MonthBucket>,
    bucket_index: HashMap<(i32, u32), usize>,
    spending: HashMap<String, Decimal>,
}

impl LedgerSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_transactions<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let mut summary = Self::new();
        for transaction in transactions {
            summary.apply(transaction);
        }
        summary
    }

    /// Folds one more transaction into every view.
    pub fn apply(&mut self, transaction: &Transaction) {
        let amount = transaction.amount();
        match transaction.kind() {
            TransactionType::Income => self.totals.income += amount,
            TransactionType::Expense => {
                self.totals.expense += amount;
                *self
                    .spending
                    .entry(transaction.tag().to_string())
                    .or_default() += amount;
            }
        }
        self.totals.net = self.totals.income - self.totals.expense;

        let date = transaction.date();
        let key = (date.year(), date.month());
        let index = *self.bucket_index.entry(key).or_insert_with(|| {
            self.buckets.push(MonthBucket {
                year: key.0,
                month: key.1,
                label: month_label(date),
                balance: Decimal::ZERO,
            });
            self.buckets.len() - 1
        });
        self.buckets[index].balance += transaction.signed_amount();
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn balance_series(&self, order: BalanceOrder) -> Vec<BalancePoint> {
        let mut buckets: Vec<&MonthBucket> = self.buckets.iter().collect();
        if order == BalanceOrder::Chronological {
            buckets.sort_by_key(|b| (b.year, b.month));
        }
        buckets
            .into_iter()
            .map(|b| BalancePoint {
                month: b.label.clone(),
                balance: b.balance,
            })
            .collect()
    }

    pub fn spending_by_category(&self) -> &HashMap<String, Decimal> {
        &self.spending
    }
}

/// Sums income and expense amounts. All zero for an empty sequence.
pub fn compute_totals(transactions: &[Transaction]) -> Totals {
    LedgerSummary::from_transactions(transactions).totals()
}

/// Net amount per month, in the order each month first appears.
pub fn compute_balance_series(transactions: &[Transaction]) -> Vec<BalancePoint> {
    compute_balance_series_with(transactions, BalanceOrder::FirstOccurrence)
}

pub fn compute_balance_series_with(
    transactions: &[Transaction],
    order: BalanceOrder,
) -> Vec<BalancePoint> {
    LedgerSummary::from_transactions(transactions).balance_series(order)
}

/// Total expense amount per tag. Income is ignored.
pub fn compute_spending_by_category(transactions: &[Transaction]) -> HashMap<String, Decimal> {
    LedgerSummary::from_transactions(transactions)
        .spending_by_category()
        .clone()
}

/// Net balance after each transaction, in ledger order.
pub fn compute_running_balance(transactions: &[Transaction]) -> Vec<Decimal> {
    transactions
        .iter()
        .scan(Decimal::ZERO, |balance, t| {
            *balance += t.signed_amount();
            Some(*balance)
        })
        .collect()
}
