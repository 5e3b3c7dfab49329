//! Display formatting for terminal output
//!
//! Tables for lists, tree and detail views for single records.

pub mod budget;
pub mod category;
pub mod import;
pub mod tag;
pub mod transaction;

pub use budget::{format_budget_list, format_budget_progress, progress_bar};
pub use category::{format_category_tree, format_subcategory_list};
pub use import::{format_import_preview, format_import_report};
pub use tag::format_tag_list;
pub use transaction::{format_totals, format_transaction_details, format_transaction_list};

/// Shorten `s` to at most `max` characters, ending in "..." when cut
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else if max <= 3 {
        s.chars().take(max).collect()
    } else {
        let mut out: String = s.chars().take(max - 3).collect();
        out.push_str("...");
        out
    }
}
