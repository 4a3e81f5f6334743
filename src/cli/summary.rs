use super::ui;
use crate::core::aggregation::{Totals, compute_running_balance};
use crate::ledger::LedgerState;
use anyhow::Result;
use comfy_table::{Cell, CellAlignment};
use rust_decimal::Decimal;

fn totals_table(totals: &Totals) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Current Balance"),
        ui::header_cell("Total Income"),
        ui::header_cell("Total Expenses"),
    ]);
    table.add_row(vec![
        ui::amount_cell(totals.net),
        ui::amount_cell(totals.income),
        ui::amount_cell(totals.expense),
    ]);
    table.to_string()
}

fn balance_table(ledger: &LedgerState) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Month"), ui::header_cell("Balance")]);
    for point in ledger.balance_series() {
        table.add_row(vec![Cell::new(point.month), ui::amount_cell(point.balance)]);
    }
    table.to_string()
}

fn spending_table(ledger: &LedgerState) -> String {
    let spending = ledger.spending_by_category();
    let total: Decimal = spending.values().sum();

    let mut rows: Vec<(&String, &Decimal)> = spending.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Category"),
        ui::header_cell("Spent"),
        ui::header_cell("Share (%)"),
    ]);
    for (category, amount) in rows {
        let share = if total > Decimal::ZERO {
            amount / total * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
        table.add_row(vec![
            Cell::new(category),
            Cell::new(format!("{amount:.2}")).set_alignment(CellAlignment::Right),
            Cell::new(format!("{share:.2}%")).set_alignment(CellAlignment::Right),
        ]);
    }
    table.to_string()
}

fn transactions_table(ledger: &LedgerState) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Name"),
        ui::header_cell("Type"),
        ui::header_cell("Date"),
        ui::header_cell("Amount"),
        ui::header_cell("Tag"),
        ui::header_cell("Balance"),
        ui::header_cell("Status"),
    ]);
    let balances = compute_running_balance(&ledger.transactions());
    for (entry, balance) in ledger.entries().iter().zip(balances) {
        let t = &entry.transaction;
        table.add_row(vec![
            Cell::new(t.name()),
            Cell::new(t.kind()),
            Cell::new(t.date()),
            ui::amount_cell(t.signed_amount()),
            Cell::new(t.tag()),
            ui::amount_cell(balance),
            ui::sync_cell(&entry.sync),
        ]);
    }
    table.to_string()
}

/// Renders the dashboard for the current ledger contents.
pub fn render(ledger: &LedgerState) -> String {
    let mut output = totals_table(&ledger.totals());

    if ledger.is_empty() {
        output.push_str(&format!(
            "\n\n{}",
            ui::style_text("You have no transactions currently", ui::StyleType::Subtle)
        ));
        return output;
    }

    output.push_str(&format!(
        "\n\n{}\n\n{}",
        ui::style_text("Financial Statistics", ui::StyleType::Title),
        balance_table(ledger)
    ));

    output.push_str(&format!(
        "\n\n{}\n\n",
        ui::style_text("Total Spending", ui::StyleType::Title)
    ));
    if ledger.spending_by_category().is_empty() {
        output.push_str(&ui::style_text(
            "Seems like you haven't spent anything till now...",
            ui::StyleType::Subtle,
        ));
    } else {
        output.push_str(&spending_table(ledger));
    }

    output.push_str(&format!(
        "\n\n{}\n\n{}",
        ui::style_text("Transactions", ui::StyleType::Title),
        transactions_table(ledger)
    ));
    output
}

pub fn run(ledger: &LedgerState) -> Result<()> {
    println!("{}", render(ledger));
    Ok(())
}
