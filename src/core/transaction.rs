//! The transaction record and its wire shape.

use crate::core::error::{LedgerError, LedgerResult};
use chrono::NaiveDate;
use rust_decimal::{Decimal, prelude::*};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TransactionType::Income => "income",
                TransactionType::Expense => "expense",
            }
        )
    }
}

impl FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(LedgerError::InvalidTransaction(format!(
                "unknown transaction type: {s}"
            ))),
        }
    }
}

/// Document shape used by the stores.
///
/// Carries no invariants of its own; converting into a [`Transaction`]
/// validates it. Amounts travel as plain JSON numbers and are read back
/// through their shortest decimal form, so `0.1` stays exactly `0.1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub date: NaiveDate,
    pub amount: f64,
    pub tag: String,
    pub name: String,
}

/// Parses a decimal amount, e.g. from a CSV field or the command line.
pub fn parse_amount(s: &str) -> LedgerResult<Decimal> {
    Decimal::from_str(s.trim())
        .map_err(|e| LedgerError::InvalidTransaction(format!("bad amount {s:?}: {e}")))
}

/// Formats an amount without trailing zeros: `1000`, `12.5`.
pub fn format_amount(amount: Decimal) -> String {
    amount.normalize().to_string()
}

/// A single dated income or expense.
///
/// `amount` is never negative; the sign of its contribution to the balance
/// comes from `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TransactionRecord", into = "TransactionRecord")]
pub struct Transaction {
    kind: TransactionType,
    date: NaiveDate,
    amount: Decimal,
    tag: String,
    name: String,
    id: Option<String>,
}

impl Transaction {
    pub fn new(
        kind: TransactionType,
        date: NaiveDate,
        amount: Decimal,
        tag: impl Into<String>,
        name: impl Into<String>,
    ) -> LedgerResult<Self> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::InvalidTransaction(format!(
                "amount must be a non-negative number, got {amount}"
            )));
        }
        Ok(Self {
            kind,
            date,
            amount,
            tag: tag.into(),
            name: name.into(),
            id: None,
        })
    }

    pub fn income(
        date: NaiveDate,
        amount: Decimal,
        tag: impl Into<String>,
        name: impl Into<String>,
    ) -> LedgerResult<Self> {
        Self::new(TransactionType::Income, date, amount, tag, name)
    }

    pub fn expense(
        date: NaiveDate,
        amount: Decimal,
        tag: impl Into<String>,
        name: impl Into<String>,
    ) -> LedgerResult<Self> {
        Self::new(TransactionType::Expense, date, amount, tag, name)
    }

    /// Returns a copy carrying the identifier assigned by a store.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    /// Contribution of this transaction to the net balance.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = LedgerError;

    fn try_from(record: TransactionRecord) -> Result<Self, Self::Error> {
        if !record.amount.is_finite() {
            return Err(LedgerError::InvalidTransaction(format!(
                "amount must be a finite number, got {}",
                record.amount
            )));
        }
        let transaction = Transaction::new(
            record.kind,
            record.date,
            parse_amount(&record.amount.to_string())?,
            record.tag,
            record.name,
        )?;
        Ok(match record.id {
            Some(id) => transaction.with_id(id),
            None => transaction,
        })
    }
}

impl From<Transaction> for TransactionRecord {
    fn from(transaction: Transaction) -> Self {
        TransactionRecord {
            id: transaction.id,
            kind: transaction.kind,
            date: transaction.date,
            amount: transaction.amount.to_f64().unwrap_or_default(),
            tag: transaction.tag,
            name: transaction.name,
        }
    }
}

impl From<&Transaction> for TransactionRecord {
    fn from(transaction: &Transaction) -> Self {
        transaction.clone().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dec(s: &str) -> Decimal {
        parse_amount(s).unwrap()
    }

    #[test]
    fn test_negative_amount_rejected() {
        let result = Transaction::expense(date("2024-01-10"), dec("-5"), "food", "refund?");
        assert!(matches!(result, Err(LedgerError::InvalidTransaction(_))));
    }

    #[test]
    fn test_signed_amount_follows_type() {
        let income = Transaction::income(date("2024-01-05"), dec("1000"), "salary", "Jan pay").unwrap();
        let expense = Transaction::expense(date("2024-01-10"), dec("200"), "food", "groceries").unwrap();

        assert_eq!(income.signed_amount(), dec("1000"));
        assert_eq!(expense.signed_amount(), dec("-200"));
        assert!(expense.is_expense());
        assert!(income.id().is_none());
    }

    #[test]
    fn test_document_deserialization() {
        let json = r#"{"id":"abc","type":"expense","date":"2024-02-01","amount":50,"tag":"food","name":"snacks"}"#;
        let t: Transaction = serde_json::from_str(json).unwrap();

        assert_eq!(t.id(), Some("abc"));
        assert_eq!(t.kind(), TransactionType::Expense);
        assert_eq!(t.date(), date("2024-02-01"));
        assert_eq!(t.amount(), dec("50"));
        assert_eq!(t.tag(), "food");
        assert_eq!(t.name(), "snacks");
    }

    #[test]
    fn test_document_amount_is_read_exactly() {
        let json = r#"{"type":"expense","date":"2024-02-01","amount":0.1,"tag":"a","name":"b"}"#;
        let t: Transaction = serde_json::from_str(json).unwrap();

        assert_eq!(t.amount(), dec("0.1"));
        assert_eq!(serde_json::to_value(&t).unwrap()["amount"], 0.1);
    }

    #[test]
    fn test_document_with_negative_amount_fails() {
        let json = r#"{"type":"income","date":"2024-02-01","amount":-1,"tag":"x","name":"y"}"#;
        assert!(serde_json::from_str::<Transaction>(json).is_err());
    }

    #[test]
    fn test_serialization_omits_missing_id() {
        let t = Transaction::income(date("2024-01-05"), dec("1000"), "salary", "Jan pay").unwrap();
        let value = serde_json::to_value(&t).unwrap();

        assert_eq!(value["type"], "income");
        assert_eq!(value["date"], "2024-01-05");
        assert_eq!(value["amount"], 1000.0);
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_amount_formatting() {
        assert_eq!(format_amount(dec("1000")), "1000");
        assert_eq!(format_amount(dec("12.50")), "12.5");
        assert_eq!(format_amount(dec("0.1")), "0.1");
        assert!(parse_amount("twelve").is_err());
    }

    #[test]
    fn test_type_from_str() {
        assert_eq!(
            "Income".parse::<TransactionType>().unwrap(),
            TransactionType::Income
        );
        assert_eq!(
            "expense".parse::<TransactionType>().unwrap(),
            TransactionType::Expense
        );
        assert!("transfer".parse::<TransactionType>().is_err());
    }
}
