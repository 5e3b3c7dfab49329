//! Import preview and result formatting

use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};
use tabled::{Table, Tabled};

use crate::config::settings::Settings;
use crate::services::{ImportPreview, ImportReport, ImportStatus};

use super::truncate;

/// Preview tables stop after this many rows
const PREVIEW_ROWS: usize = 25;

#[derive(Tabled)]
struct PreviewRow {
    #[tabled(rename = "Row")]
    row: usize,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Amount")]
    amount: String,
}

/// Format the rows an import would add, with duplicates and errors
pub fn format_import_preview(preview: &ImportPreview, settings: &Settings) -> String {
    let mut output = format!(
        "{} new, {} duplicate, {} with errors\n",
        preview.new_count(),
        preview.duplicate_count(),
        preview.errors.len()
    );

    if !preview.entries.is_empty() {
        let rows: Vec<_> = preview
            .entries
            .iter()
            .take(PREVIEW_ROWS)
            .map(|entry| {
                let row = &entry.row;
                let label = if row.description.is_empty() {
                    &row.source
                } else {
                    &row.description
                };
                let category = match (&row.category, &row.subcategory) {
                    (Some(c), Some(s)) => format!("{} / {}", c, s),
                    (Some(c), None) => c.clone(),
                    _ => String::new(),
                };
                PreviewRow {
                    row: row.row,
                    status: match entry.status {
                        ImportStatus::New => "new".to_string(),
                        ImportStatus::Duplicate => "duplicate".to_string(),
                    },
                    date: settings.format_date(row.date),
                    kind: row.kind.to_string(),
                    description: truncate(label, 32),
                    category: truncate(&category, 24),
                    amount: row.amount.format_with_symbol(&settings.currency_symbol),
                }
            })
            .collect();

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .modify(Columns::single(6), Alignment::right());
        output.push_str(&format!("{}\n", table));

        if preview.entries.len() > PREVIEW_ROWS {
            output.push_str(&format!(
                "... and {} more\n",
                preview.entries.len() - PREVIEW_ROWS
            ));
        }
    }

    for error in &preview.errors {
        output.push_str(&format!("  error: {}\n", error));
    }

    output
}

/// Summarize a finished import
pub fn format_import_report(report: &ImportReport) -> String {
    let mut output = format!(
        "Imported {} transaction{}",
        report.imported,
        if report.imported == 1 { "" } else { "s" }
    );
    if report.duplicates > 0 {
        output.push_str(&format!(
            ", skipped {} duplicate{}",
            report.duplicates,
            if report.duplicates == 1 { "" } else { "s" }
        ));
    }
    if report.skipped > 0 {
        output.push_str(&format!(
            ", {} row{} with errors",
            report.skipped,
            if report.skipped == 1 { "" } else { "s" }
        ));
    }
    output.push('\n');

    if !report.created_categories.is_empty() {
        output.push_str(&format!(
            "Created categories: {}\n",
            report.created_categories.join(", ")
        ));
    }
    for warning in &report.warnings {
        output.push_str(&format!("  warning: {}\n", warning));
    }
    for error in &report.errors {
        output.push_str(&format!("  error: {}\n", error));
    }

    output
}
