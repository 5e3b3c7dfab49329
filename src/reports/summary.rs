//! Income/expense summary report
//!
//! Totals for every transaction matching a filter, broken down by month.

use std::collections::BTreeMap;
use std::io::Write;

use crate::error::{TallyError, TallyResult};
use crate::models::{Money, Month};
use crate::services::{SortSpec, Totals, TransactionFilter, TransactionService};
use crate::storage::Storage;

/// Income and expenses for one calendar month
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthSummary {
    pub month: Month,
    pub income: Money,
    pub expenses: Money,
    pub net: Money,
    pub transaction_count: usize,
}

impl MonthSummary {
    fn new(month: Month) -> Self {
        Self {
            month,
            income: Money::zero(),
            expenses: Money::zero(),
            net: Money::zero(),
            transaction_count: 0,
        }
    }
}

/// Summary Report
#[derive(Debug, Clone)]
pub struct SummaryReport {
    pub totals: Totals,
    /// Chronological
    pub months: Vec<MonthSummary>,
}

impl SummaryReport {
    /// Generate a summary over all transactions matching `filter`
    pub fn generate(storage: &Storage, filter: &TransactionFilter) -> TallyResult<Self> {
        let transactions =
            TransactionService::new(storage).list(filter, &SortSpec::default(), None)?;

        let mut months: BTreeMap<Month, MonthSummary> = BTreeMap::new();
        for txn in &transactions {
            let month = Month::of(txn.date);
            let row = months
                .entry(month)
                .or_insert_with(|| MonthSummary::new(month));
            if txn.is_income() {
                row.income += txn.amount;
            } else {
                row.expenses += txn.amount;
            }
            row.net = row.income - row.expenses;
            row.transaction_count += 1;
        }

        Ok(Self {
            totals: TransactionService::totals(&transactions),
            months: months.into_values().collect(),
        })
    }

    /// Format the report for terminal display
    pub fn format_terminal(&self, symbol: &str) -> String {
        let mut output = String::new();

        output.push_str("Income and Expense Summary\n");
        output.push_str(&"=".repeat(64));
        output.push('\n');
        output.push_str(&format!(
            "{:<16} {:>14} {:>14} {:>14}\n",
            "Month", "Income", "Expenses", "Net"
        ));
        output.push_str(&"-".repeat(64));
        output.push('\n');

        for row in &self.months {
            output.push_str(&format!(
                "{:<16} {:>14} {:>14} {:>14}\n",
                row.month.long_name(),
                row.income.format_with_symbol(symbol),
                row.expenses.format_with_symbol(symbol),
                row.net.format_with_symbol(symbol)
            ));
        }

        output.push_str(&"-".repeat(64));
        output.push('\n');
        output.push_str(&format!(
            "{:<16} {:>14} {:>14} {:>14}\n",
            "TOTAL",
            self.totals.income.format_with_symbol(symbol),
            self.totals.expenses.format_with_symbol(symbol),
            self.totals.net.format_with_symbol(symbol)
        ));
        output.push_str(&format!("Transactions: {}\n", self.totals.count));

        output
    }

    /// Export the report to CSV format
    pub fn export_csv<W: Write>(&self, writer: W) -> TallyResult<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["Month", "Income", "Expenses", "Net", "Transaction Count"])?;

        for row in &self.months {
            csv.write_record([
                row.month.to_string(),
                row.income.as_decimal_string(),
                row.expenses.as_decimal_string(),
                row.net.as_decimal_string(),
                row.transaction_count.to_string(),
            ])?;
        }

        csv.write_record([
            "TOTAL".to_string(),
            self.totals.income.as_decimal_string(),
            self.totals.expenses.as_decimal_string(),
            self.totals.net.as_decimal_string(),
            self.totals.count.to_string(),
        ])?;

        csv.flush().map_err(|e| TallyError::Export(e.to_string()))?;
        Ok(())
    }
}
