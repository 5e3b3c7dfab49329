//! Budget display formatting
//!
//! Progress rows carry a text bar; the bar is capped at full width and
//! overspending is flagged with `!`.

use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};
use tabled::{Table, Tabled};

use crate::models::{Budget, BudgetProgress, BudgetStatus, Month};

const BAR_WIDTH: usize = 20;

#[derive(Tabled)]
struct ProgressRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Limit")]
    limit: String,
    #[tabled(rename = "Spent")]
    spent: String,
    #[tabled(rename = "Remaining")]
    remaining: String,
    #[tabled(rename = "Progress")]
    bar: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct BudgetRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Limit")]
    limit: String,
    #[tabled(rename = "Notes")]
    notes: String,
}

/// `[#######.............]  35%`
pub fn progress_bar(percent: f64, width: usize) -> String {
    let clamped = percent.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * width as f64).round() as usize;
    let marker = if percent > 100.0 { "!" } else { " " };
    format!(
        "[{}{}]{}{:>4.0}%",
        "#".repeat(filled),
        ".".repeat(width - filled),
        marker,
        percent
    )
}

/// Format budget progress for a month
pub fn format_budget_progress(month: Month, rows: &[BudgetProgress], symbol: &str) -> String {
    if rows.is_empty() {
        return format!(
            "No budgets set for {}.\n\nUse 'tally budget set <category> <amount>' to add one.\n",
            month.long_name()
        );
    }

    let table_rows: Vec<_> = rows
        .iter()
        .map(|p| ProgressRow {
            category: p.category_name.clone(),
            limit: p.budget.limit.format_with_symbol(symbol),
            spent: p.spent.format_with_symbol(symbol),
            remaining: p.remaining.format_with_symbol(symbol),
            bar: progress_bar(p.percent_used, BAR_WIDTH),
            status: p.status.to_string(),
        })
        .collect();

    let mut table = Table::new(table_rows);
    table
        .with(Style::rounded())
        .modify(Columns::new(1..4), Alignment::right());

    let over = rows
        .iter()
        .filter(|p| p.status == BudgetStatus::OverBudget)
        .count();
    let mut output = format!("Budget progress for {}\n{}\n", month.long_name(), table);
    if over > 0 {
        output.push_str(&format!("{} of {} budgets over limit\n", over, rows.len()));
    }
    output
}

/// Format budgets without spending figures
pub fn format_budget_list(
    month: Month,
    budgets: &[Budget],
    category_name: impl Fn(&Budget) -> String,
    symbol: &str,
) -> String {
    if budgets.is_empty() {
        return format!("No budgets set for {}.\n", month.long_name());
    }

    let rows: Vec<_> = budgets
        .iter()
        .map(|b| BudgetRow {
            category: category_name(b),
            limit: b.limit.format_with_symbol(symbol),
            notes: b.notes.clone(),
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .modify(Columns::single(1), Alignment::right());

    format!("Budgets for {}\n{}\n", month.long_name(), table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryId, Money};

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0, 10), "[..........]    0%");
        assert_eq!(progress_bar(50.0, 10), "[#####.....]   50%");
        assert_eq!(progress_bar(150.0, 10), "[##########]! 150%");
    }

    #[test]
    fn test_format_progress() {
        let month = Month::new(2025, 5).unwrap();
        let budget = Budget::new(CategoryId::new(), month, Money::from_cents(10000));
        let rows = vec![BudgetProgress::new(budget, "Food", Money::from_cents(12000), 3)];

        let out = format_budget_progress(month, &rows, "$");
        assert!(out.contains("May 2025"));
        assert!(out.contains("Food"));
        assert!(out.contains("-$20.00"));
        assert!(out.contains("Over budget"));
        assert!(out.contains("1 of 1 budgets over limit"));
    }

    #[test]
    fn test_empty_month() {
        let month = Month::new(2025, 5).unwrap();
        assert!(format_budget_progress(month, &[], "$").contains("No budgets set for May 2025"));
    }
}
