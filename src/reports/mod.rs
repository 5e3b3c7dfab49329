//! Reports module for Tally
//!
//! Income/expense summaries, spending by category and budget progress.
//! Every report renders to terminal text and CSV; the PDF renderings live
//! in `export::pdf`.

pub mod budget;
pub mod spending;
pub mod summary;

pub use budget::BudgetReport;
pub use spending::{SpendingByCategory, SpendingBySubcategory, SpendingReport};
pub use summary::{MonthSummary, SummaryReport};
