//! Budget Report
//!
//! Progress of every budget in a month with overall totals.

use std::io::Write;

use crate::error::{TallyError, TallyResult};
use crate::models::{BudgetProgress, Money, Month};
use crate::services::BudgetService;
use crate::storage::Storage;

/// Budget Report
#[derive(Debug, Clone)]
pub struct BudgetReport {
    pub month: Month,
    /// Sorted by category name
    pub rows: Vec<BudgetProgress>,
    pub total_limit: Money,
    pub total_spent: Money,
    pub total_remaining: Money,
}

impl BudgetReport {
    /// Generate the budget report for a month
    pub fn generate(storage: &Storage, month: Month) -> TallyResult<Self> {
        let rows = BudgetService::new(storage).progress_for_month(month)?;

        let total_limit: Money = rows.iter().map(|r| r.budget.limit).sum();
        let total_spent: Money = rows.iter().map(|r| r.spent).sum();

        Ok(Self {
            month,
            rows,
            total_limit,
            total_spent,
            total_remaining: total_limit - total_spent,
        })
    }

    pub fn over_budget_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_over_budget()).count()
    }

    /// Overall spent / limit * 100
    pub fn percent_used(&self) -> f64 {
        if self.total_limit.is_zero() {
            0.0
        } else {
            self.total_spent.cents() as f64 * 100.0 / self.total_limit.cents() as f64
        }
    }

    /// Format the report for terminal display
    pub fn format_terminal(&self, symbol: &str) -> String {
        let mut output = String::new();

        output.push_str(&format!("Budget Report: {}\n", self.month.long_name()));
        output.push_str(&"=".repeat(80));
        output.push('\n');

        if self.rows.is_empty() {
            output.push_str("No budgets set for this month.\n");
            return output;
        }

        output.push_str(&format!(
            "{:<24} {:>12} {:>12} {:>12} {:>7}  {}\n",
            "Category", "Limit", "Spent", "Remaining", "Used", "Status"
        ));
        output.push_str(&"-".repeat(80));
        output.push('\n');

        for row in &self.rows {
            output.push_str(&format!(
                "{:<24} {:>12} {:>12} {:>12} {:>6.0}%  {}\n",
                row.category_name,
                row.budget.limit.format_with_symbol(symbol),
                row.spent.format_with_symbol(symbol),
                row.remaining.format_with_symbol(symbol),
                row.percent_used,
                row.status
            ));
        }

        output.push_str(&"-".repeat(80));
        output.push('\n');
        output.push_str(&format!(
            "{:<24} {:>12} {:>12} {:>12} {:>6.0}%\n",
            "TOTAL",
            self.total_limit.format_with_symbol(symbol),
            self.total_spent.format_with_symbol(symbol),
            self.total_remaining.format_with_symbol(symbol),
            self.percent_used()
        ));

        let over = self.over_budget_count();
        if over > 0 {
            output.push_str(&format!("\n{} categor{} over budget\n", over, if over == 1 { "y" } else { "ies" }));
        }

        output
    }

    /// Export the report to CSV format
    pub fn export_csv<W: Write>(&self, writer: W) -> TallyResult<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record([
            "Month",
            "Category",
            "Limit",
            "Spent",
            "Remaining",
            "Percent Used",
            "Status",
        ])?;

        for row in &self.rows {
            csv.write_record([
                self.month.to_string(),
                row.category_name.clone(),
                row.budget.limit.as_decimal_string(),
                row.spent.as_decimal_string(),
                row.remaining.as_decimal_string(),
                format!("{:.2}", row.percent_used),
                row.status.to_string(),
            ])?;
        }

        csv.write_record([
            self.month.to_string(),
            "TOTAL".to_string(),
            self.total_limit.as_decimal_string(),
            self.total_spent.as_decimal_string(),
            self.total_remaining.as_decimal_string(),
            format!("{:.2}", self.percent_used()),
            String::new(),
        ])?;

        csv.flush().map_err(|e| TallyError::Export(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use crate::models::Transaction;
    use crate::services::CategoryService;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_budget_report_totals() {
        let (_temp_dir, storage) = create_test_storage();
        let categories = CategoryService::new(&storage);
        let budgets = BudgetService::new(&storage);
        let month = Month::new(2025, 3).unwrap();

        let food = categories.create_category("Food").unwrap();
        let fun = categories.create_category("Fun").unwrap();
        budgets.set_budget(food.id, month, Money::from_cents(40000)).unwrap();
        budgets.set_budget(fun.id, month, Money::from_cents(10000)).unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        storage
            .transactions
            .upsert(Transaction::expense(date, Money::from_cents(30000), "Market", Some(food.id)))
            .unwrap();
        storage
            .transactions
            .upsert(Transaction::expense(date, Money::from_cents(15000), "Concert", Some(fun.id)))
            .unwrap();

        let report = BudgetReport::generate(&storage, month).unwrap();
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.total_limit.cents(), 50000);
        assert_eq!(report.total_spent.cents(), 45000);
        assert_eq!(report.total_remaining.cents(), 5000);
        assert_eq!(report.over_budget_count(), 1);
        assert!((report.percent_used() - 90.0).abs() < 1e-9);

        let text = report.format_terminal("$");
        assert!(text.contains("March 2025"));
        assert!(text.contains("1 category over budget"));
    }

    #[test]
    fn test_export_csv() {
        let (_temp_dir, storage) = create_test_storage();
        let food = CategoryService::new(&storage).create_category("Food").unwrap();
        let month = Month::new(2025, 3).unwrap();
        BudgetService::new(&storage)
            .set_budget(food.id, month, Money::from_cents(20000))
            .unwrap();

        let report = BudgetReport::generate(&storage, month).unwrap();
        let mut buf = Vec::new();
        report.export_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Month,Category,Limit,Spent,Remaining,Percent Used,Status");
        assert_eq!(lines[1], "2025-03,Food,200.00,0.00,200.00,0.00,On track");
        assert_eq!(lines[2], "2025-03,TOTAL,200.00,0.00,200.00,0.00,");
    }

    #[test]
    fn test_empty_month() {
        let (_temp_dir, storage) = create_test_storage();
        let report = BudgetReport::generate(&storage, Month::new(2025, 1).unwrap()).unwrap();
        assert!(report.rows.is_empty());
        assert!(report.format_terminal("$").contains("No budgets set"));
    }
}
