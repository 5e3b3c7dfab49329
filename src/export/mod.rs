//! Export module for Tally
//!
//! - CSV: transactions (re-importable) and budget progress
//! - JSON / YAML: full snapshot of every collection
//! - PDF: printable reports

pub mod csv;
pub mod json;
pub mod pdf;
pub mod yaml;

pub use self::csv::{export_budgets_csv, export_transactions_csv};
pub use json::{export_full_json, import_from_json, FullExport, EXPORT_SCHEMA_VERSION};
pub use pdf::{budget_pdf, spending_pdf, summary_pdf, transactions_pdf, Align, PdfColumn, PdfReport};
pub use yaml::{export_full_yaml, import_from_yaml};
