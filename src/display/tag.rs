//! Tag display formatting

use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};
use tabled::{Table, Tabled};

use crate::services::TagUsage;

#[derive(Tabled)]
struct TagRow {
    #[tabled(rename = "Tag")]
    name: String,
    #[tabled(rename = "Transactions")]
    count: usize,
    #[tabled(rename = "ID")]
    id: String,
}

/// Format tags with how many transactions carry each
pub fn format_tag_list(usage: &[TagUsage]) -> String {
    if usage.is_empty() {
        return "No tags found.\n".to_string();
    }

    let rows: Vec<_> = usage
        .iter()
        .map(|u| TagRow {
            name: u.tag.to_string(),
            count: u.transaction_count,
            id: u.tag.id.to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .modify(Columns::single(1), Alignment::right());

    format!("{}\n", table)
}
