//! CSV Export functionality
//!
//! Exports transactions and budget progress in a spreadsheet-friendly form.
//! Transaction exports can be fed back through the importer.

use std::collections::BTreeSet;
use std::io::Write;

use crate::error::{TallyError, TallyResult};
use crate::models::{Month, Transaction};
use crate::services::{BudgetService, FilterContext};
use crate::storage::Storage;

pub const TRANSACTION_HEADER: [&str; 10] = [
    "ID",
    "Date",
    "Type",
    "Description",
    "Category",
    "Subcategory",
    "Source",
    "Tags",
    "Amount",
    "Notes",
];

pub const BUDGET_HEADER: [&str; 6] = [
    "Month",
    "Category",
    "Limit",
    "Spent",
    "Remaining",
    "Percent Used",
];

/// Export transactions to CSV
///
/// Tags are joined with `tag_separator`; pass the importer's separator so the
/// file reads back with its tags intact.
pub fn export_transactions_csv<W: Write>(
    storage: &Storage,
    transactions: &[Transaction],
    tag_separator: char,
    writer: W,
) -> TallyResult<usize> {
    let ctx = FilterContext::from_storage(storage)?;
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(TRANSACTION_HEADER)?;

    for txn in transactions {
        let category = txn
            .category_id
            .and_then(|id| ctx.category_name(id))
            .unwrap_or_default();
        let subcategory = txn
            .subcategory_id
            .and_then(|id| ctx.subcategory_name(id))
            .unwrap_or_default();

        csv.write_record([
            txn.id.to_string(),
            txn.date.to_string(),
            txn.kind.to_string(),
            txn.description.clone(),
            category.to_string(),
            subcategory.to_string(),
            txn.source.clone(),
            ctx.tag_names(txn).join(tag_separator.to_string().as_str()),
            txn.amount.as_decimal_string(),
            txn.notes.clone(),
        ])?;
    }

    csv.flush().map_err(|e| TallyError::Export(e.to_string()))?;
    tracing::info!(rows = transactions.len(), "exported transactions CSV");
    Ok(transactions.len())
}

/// Export budget progress to CSV
///
/// With no `months`, every month that has at least one budget is exported,
/// oldest first.
pub fn export_budgets_csv<W: Write>(
    storage: &Storage,
    months: Option<&[Month]>,
    writer: W,
) -> TallyResult<usize> {
    let budget_service = BudgetService::new(storage);
    let months: BTreeSet<Month> = match months {
        Some(months) => months.iter().copied().collect(),
        None => storage
            .budgets
            .get_all()?
            .into_iter()
            .map(|b| b.month)
            .collect(),
    };

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(BUDGET_HEADER)?;

    let mut rows = 0;
    for month in months {
        for progress in budget_service.progress_for_month(month)? {
            csv.write_record([
                month.to_string(),
                progress.category_name.clone(),
                progress.budget.limit.as_decimal_string(),
                progress.spent.as_decimal_string(),
                progress.remaining.as_decimal_string(),
                format!("{:.2}", progress.percent_used),
            ])?;
            rows += 1;
        }
    }

    csv.flush().map_err(|e| TallyError::Export(e.to_string()))?;
    tracing::info!(rows, "exported budgets CSV");
    Ok(rows)
}
