//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod budget;
pub mod category;
pub mod export;
pub mod import;
pub mod report;
pub mod tag;
pub mod transaction;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::NaiveDate;

use crate::error::{TallyError, TallyResult};
use crate::models::{Money, Month};

pub use budget::{handle_budget_command, BudgetCommands};
pub use category::{handle_category_command, CategoryCommands};
pub use export::{handle_export_command, ExportCommands, ExportFormat};
pub use import::{handle_import_command, ImportArgs};
pub use report::{handle_report_command, ReportCommands};
pub use tag::{handle_tag_command, TagCommands};
pub use transaction::{
    handle_expense_command, handle_income_command, handle_transaction_command, ExpenseCommands,
    FilterArgs, IncomeCommands, TransactionCommands,
};

/// Parse a `YYYY-MM-DD` argument
pub fn parse_date_arg(s: &str) -> TallyResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
        TallyError::Validation(format!("Invalid date format: '{}'. Use YYYY-MM-DD", s))
    })
}

/// Parse an optional date argument, defaulting to today
pub fn parse_date_or_today(s: Option<&str>) -> TallyResult<NaiveDate> {
    match s {
        Some(s) => parse_date_arg(s),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

/// Parse a `YYYY-MM` argument, defaulting to the current month
pub fn parse_month_or_current(s: Option<&str>) -> TallyResult<Month> {
    match s {
        Some(s) => Month::parse(s).map_err(|e| {
            TallyError::Validation(format!("{}. Use YYYY-MM (e.g., 2025-01)", e))
        }),
        None => Ok(Month::current()),
    }
}

/// Parse an amount argument such as "12.50"
pub fn parse_amount_arg(s: &str) -> TallyResult<Money> {
    Money::parse(s).map_err(|e| TallyError::Validation(format!("Invalid amount: {}", e)))
}

/// Split a comma separated tag argument
pub fn split_tags(s: &str) -> Vec<String> {
    crate::models::tag::split_tag_list(s, ',')
}

/// Open an output file for buffered writing, creating parent directories
pub fn create_output(path: &Path) -> TallyResult<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path).map_err(|e| {
        TallyError::Export(format!("Failed to create file {}: {}", path.display(), e))
    })?;
    Ok(BufWriter::new(file))
}
