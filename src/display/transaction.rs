//! Transaction display formatting
//!
//! Table view for transaction lists and a detail view for a single entry.

use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};
use tabled::{Table, Tabled};

use crate::config::settings::Settings;
use crate::models::Transaction;
use crate::services::{FilterContext, Totals};

use super::truncate;

#[derive(Tabled)]
struct TransactionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Tags")]
    tags: String,
    #[tabled(rename = "Amount")]
    amount: String,
}

/// Income rows show their source when no description was given
fn label(txn: &Transaction) -> &str {
    if txn.description.is_empty() {
        &txn.source
    } else {
        &txn.description
    }
}

/// "Category / Subcategory", or empty when uncategorized
pub fn category_label(txn: &Transaction, ctx: &FilterContext) -> String {
    let Some(category_id) = txn.category_id else {
        return String::new();
    };
    let category = ctx.category_name(category_id).unwrap_or("(unknown)");
    match txn.subcategory_id.and_then(|id| ctx.subcategory_name(id)) {
        Some(sub) => format!("{} / {}", category, sub),
        None => category.to_string(),
    }
}

/// Format transactions as a table; expenses show as negative amounts
pub fn format_transaction_list(
    transactions: &[Transaction],
    ctx: &FilterContext,
    settings: &Settings,
) -> String {
    if transactions.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let rows: Vec<_> = transactions
        .iter()
        .map(|txn| TransactionRow {
            id: txn.id.to_string(),
            date: settings.format_date(txn.date),
            description: truncate(label(txn), 32),
            category: truncate(&category_label(txn, ctx), 28),
            tags: truncate(
                &ctx.tag_names(txn)
                    .iter()
                    .map(|t| format!("#{}", t))
                    .collect::<Vec<_>>()
                    .join(" "),
                24,
            ),
            amount: txn
                .signed_amount()
                .format_with_symbol(&settings.currency_symbol),
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .modify(Columns::single(5), Alignment::right());

    format!("{}\n", table)
}

/// One-line totals shown under a list
pub fn format_totals(totals: &Totals, symbol: &str) -> String {
    format!(
        "{} transaction{}  income {}  expenses {}  net {}\n",
        totals.count,
        if totals.count == 1 { "" } else { "s" },
        totals.income.format_with_symbol(symbol),
        totals.expenses.format_with_symbol(symbol),
        totals.net.format_with_symbol(symbol)
    )
}

/// Format transaction details for display
pub fn format_transaction_details(
    txn: &Transaction,
    ctx: &FilterContext,
    settings: &Settings,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("Transaction: {}\n", txn.id));
    output.push_str(&format!("Type:        {}\n", txn.kind));
    output.push_str(&format!("Date:        {}\n", settings.format_date(txn.date)));
    output.push_str(&format!(
        "Amount:      {}\n",
        txn.amount.format_with_symbol(&settings.currency_symbol)
    ));

    if !txn.description.is_empty() {
        output.push_str(&format!("Description: {}\n", txn.description));
    }
    if !txn.source.is_empty() {
        output.push_str(&format!("Source:      {}\n", txn.source));
    }

    if txn.is_expense() {
        let category = category_label(txn, ctx);
        if category.is_empty() {
            output.push_str("Category:    (uncategorized)\n");
        } else {
            output.push_str(&format!("Category:    {}\n", category));
        }
    }

    let tags = ctx.tag_names(txn);
    if !tags.is_empty() {
        output.push_str(&format!("Tags:        {}\n", tags.join(", ")));
    }
    if !txn.notes.is_empty() {
        output.push_str(&format!("Notes:       {}\n", txn.notes));
    }
    if txn.import_id.is_some() {
        output.push_str("Imported:    yes\n");
    }

    output.push_str(&format!(
        "Created:     {}\n",
        txn.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if txn.updated_at != txn.created_at {
        output.push_str(&format!(
            "Updated:     {}\n",
            txn.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }

    output
}
