//! CSV export and import of the ledger.
//!
//! Columns are fixed to `name,type,date,amount,tag` with a header row.
//! Records are separated by CRLF with no terminator after the last one.
//! A field is quoted when it contains a delimiter, quote or line break, or
//! when it starts or ends with a space.
use crate::core::error::{LedgerError, LedgerResult};
use crate::core::transaction::{Transaction, TransactionType, format_amount, parse_amount};
use chrono::NaiveDate;
use csv::Reader;
use serde::Deserialize;
use tracing::debug;

pub const EXPORT_FILE_NAME: &str = "transactions.csv";
pub const EXPORT_MIME_TYPE: &str = "text/csv";
pub const EXPORT_COLUMNS: [&str; 5] = ["name", "type", "date", "amount", "tag"];

const RECORD_SEPARATOR: &str = "\r\n";

/// A rendered export, ready to be saved or handed to a download.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub file_name: &'static str,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    name: String,
    #[serde(rename = "type")]
    kind: TransactionType,
    date: NaiveDate,
    amount: String,
    tag: String,
}

fn quote_field(field: &str) -> String {
    let needs_quotes = field.contains([',', '"', '\n', '\r', '\u{feff}'])
        || field.starts_with(' ')
        || field.ends_with(' ');
    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn csv_line(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|field| quote_field(field))
        .collect::<Vec<_>>()
        .join(",")
}

/// Serializes `transactions` in ledger order.
pub fn export_csv(transactions: &[Transaction]) -> Vec<u8> {
    let mut lines = Vec::with_capacity(transactions.len() + 1);
    lines.push(csv_line(&EXPORT_COLUMNS));
    for transaction in transactions {
        let kind = transaction.kind().to_string();
        let date = transaction.date().format("%Y-%m-%d").to_string();
        let amount = format_amount(transaction.amount());
        lines.push(csv_line(&[
            transaction.name(),
            kind.as_str(),
            date.as_str(),
            amount.as_str(),
            transaction.tag(),
        ]));
    }

    let bytes = lines.join(RECORD_SEPARATOR).into_bytes();
    debug!(
        "Exported {} transactions ({} bytes)",
        transactions.len(),
        bytes.len()
    );
    bytes
}

/// Renders `transactions` as `transactions.csv`.
pub fn export_file(transactions: &[Transaction]) -> ExportFile {
    ExportFile {
        file_name: EXPORT_FILE_NAME,
        mime_type: EXPORT_MIME_TYPE,
        bytes: export_csv(transactions),
    }
}

/// Parses bytes produced by [`export_csv`]. Columns are matched by header
/// name, so their order in the input does not matter.
pub fn import_csv(bytes: &[u8]) -> LedgerResult<Vec<Transaction>> {
    let mut reader = Reader::from_reader(bytes);

    let mut transactions = Vec::new();
    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row.map_err(|e| LedgerError::Import(format!("row {}: {e}", index + 1)))?;
        let transaction = parse_amount(&row.amount)
            .and_then(|amount| Transaction::new(row.kind, row.date, amount, row.tag, row.name))
            .map_err(|e| LedgerError::Import(format!("row {}: {e}", index + 1)))?;
        transactions.push(transaction);
    }
    debug!("Imported {} transactions", transactions.len());
    Ok(transactions)
}
