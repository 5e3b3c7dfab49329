//! Spending Report
//!
//! Expenses in a date range grouped by category, then subcategory.

use std::collections::HashMap;
use std::io::Write;

use chrono::NaiveDate;

use crate::error::{TallyError, TallyResult};
use crate::models::{CategoryId, Money, SubcategoryId};
use crate::services::CategoryService;
use crate::storage::Storage;

/// Spending within one subcategory
#[derive(Debug, Clone)]
pub struct SpendingBySubcategory {
    pub subcategory_id: SubcategoryId,
    pub subcategory_name: String,
    pub total_spending: Money,
    pub transaction_count: usize,
    /// Share of the report's total spending
    pub percentage: f64,
}

/// Spending within one category, including its subcategories
#[derive(Debug, Clone)]
pub struct SpendingByCategory {
    pub category_id: CategoryId,
    pub category_name: String,
    pub total_spending: Money,
    pub transaction_count: usize,
    pub percentage: f64,
    /// Only subcategories with spending, largest first
    pub subcategories: Vec<SpendingBySubcategory>,
}

/// Spending Report
#[derive(Debug, Clone)]
pub struct SpendingReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Largest first
    pub categories: Vec<SpendingByCategory>,
    pub total_spending: Money,
    pub total_income: Money,
    /// Expenses counted, including uncategorized
    pub total_transactions: usize,
    pub uncategorized_spending: Money,
    pub uncategorized_count: usize,
}

#[derive(Default)]
struct Bucket {
    total: Money,
    count: usize,
    subcategories: HashMap<SubcategoryId, (Money, usize)>,
}

fn percentage_of(part: Money, total: Money) -> f64 {
    if total.is_zero() {
        0.0
    } else {
        part.cents() as f64 * 100.0 / total.cents() as f64
    }
}

impl SpendingReport {
    /// Generate a spending report for an inclusive date range
    pub fn generate(storage: &Storage, start_date: NaiveDate, end_date: NaiveDate) -> TallyResult<Self> {
        let category_service = CategoryService::new(storage);
        let tree = category_service.category_tree()?;
        let transactions = storage.transactions.get_by_date_range(start_date, end_date)?;

        let mut buckets: HashMap<CategoryId, Bucket> = HashMap::new();
        let mut uncategorized_spending = Money::zero();
        let mut uncategorized_count = 0;
        let mut total_income = Money::zero();
        let mut total_spending = Money::zero();
        let mut total_transactions = 0;

        for txn in &transactions {
            if txn.is_income() {
                total_income += txn.amount;
                continue;
            }
            total_spending += txn.amount;
            total_transactions += 1;

            let known = txn
                .category_id
                .filter(|id| tree.iter().any(|c| c.category.id == *id));
            match known {
                Some(category_id) => {
                    let bucket = buckets.entry(category_id).or_default();
                    bucket.total += txn.amount;
                    bucket.count += 1;
                    if let Some(sub_id) = txn.subcategory_id {
                        let entry = bucket
                            .subcategories
                            .entry(sub_id)
                            .or_insert((Money::zero(), 0));
                        entry.0 += txn.amount;
                        entry.1 += 1;
                    }
                }
                None => {
                    uncategorized_spending += txn.amount;
                    uncategorized_count += 1;
                }
            }
        }

        let mut categories = Vec::new();
        for node in &tree {
            let Some(bucket) = buckets.get(&node.category.id) else {
                continue;
            };

            let mut subcategories: Vec<_> = node
                .subcategories
                .iter()
                .filter_map(|sub| {
                    bucket.subcategories.get(&sub.id).map(|(total, count)| {
                        SpendingBySubcategory {
                            subcategory_id: sub.id,
                            subcategory_name: sub.name.clone(),
                            total_spending: *total,
                            transaction_count: *count,
                            percentage: percentage_of(*total, total_spending),
                        }
                    })
                })
                .collect();
            subcategories.sort_by(|a, b| b.total_spending.cmp(&a.total_spending));

            categories.push(SpendingByCategory {
                category_id: node.category.id,
                category_name: node.category.name.clone(),
                total_spending: bucket.total,
                transaction_count: bucket.count,
                percentage: percentage_of(bucket.total, total_spending),
                subcategories,
            });
        }

        // Tree order is the tiebreak, so equal totals keep category order
        categories.sort_by(|a, b| b.total_spending.cmp(&a.total_spending));

        Ok(Self {
            start_date,
            end_date,
            categories,
            total_spending,
            total_income,
            total_transactions,
            uncategorized_spending,
            uncategorized_count,
        })
    }

    pub fn uncategorized_percentage(&self) -> f64 {
        percentage_of(self.uncategorized_spending, self.total_spending)
    }

    /// Format the report for terminal display
    pub fn format_terminal(&self, symbol: &str) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "Spending Report: {} to {}\n",
            self.start_date, self.end_date
        ));
        output.push_str(&"=".repeat(72));
        output.push('\n');
        output.push_str(&format!(
            "Total Spending: {}\n",
            self.total_spending.format_with_symbol(symbol)
        ));
        output.push_str(&format!(
            "Total Income: {}\n",
            self.total_income.format_with_symbol(symbol)
        ));
        output.push_str(&format!("Expenses: {}\n\n", self.total_transactions));

        output.push_str(&format!(
            "{:<36} {:>14} {:>8} {:>8}\n",
            "Category", "Amount", "Count", "%"
        ));
        output.push_str(&"-".repeat(72));
        output.push('\n');

        for category in &self.categories {
            output.push_str(&format!(
                "{:<36} {:>14} {:>8} {:>7.1}%\n",
                category.category_name,
                category.total_spending.format_with_symbol(symbol),
                category.transaction_count,
                category.percentage
            ));
            for sub in &category.subcategories {
                output.push_str(&format!(
                    "  {:<34} {:>14} {:>8} {:>7.1}%\n",
                    sub.subcategory_name,
                    sub.total_spending.format_with_symbol(symbol),
                    sub.transaction_count,
                    sub.percentage
                ));
            }
        }

        if self.uncategorized_count > 0 {
            output.push_str(&format!(
                "{:<36} {:>14} {:>8} {:>7.1}%\n",
                "UNCATEGORIZED",
                self.uncategorized_spending.format_with_symbol(symbol),
                self.uncategorized_count,
                self.uncategorized_percentage()
            ));
        }

        output.push_str(&"-".repeat(72));
        output.push('\n');
        output.push_str(&format!(
            "{:<36} {:>14} {:>8}\n",
            "TOTAL SPENDING",
            self.total_spending.format_with_symbol(symbol),
            self.total_transactions
        ));

        output
    }

    /// Export the report to CSV format
    pub fn export_csv<W: Write>(&self, writer: W) -> TallyResult<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record([
            "Start Date",
            "End Date",
            "Category",
            "Subcategory",
            "Amount",
            "Transaction Count",
            "Percentage",
        ])?;

        let start = self.start_date.to_string();
        let end = self.end_date.to_string();
        let mut row = |category: &str, subcategory: &str, amount: Money, count: usize, pct: String| {
            csv.write_record([
                start.clone(),
                end.clone(),
                category.to_string(),
                subcategory.to_string(),
                amount.as_decimal_string(),
                count.to_string(),
                pct,
            ])
        };

        for category in &self.categories {
            row(
                &category.category_name,
                "",
                category.total_spending,
                category.transaction_count,
                format!("{:.2}", category.percentage),
            )?;
            for sub in &category.subcategories {
                row(
                    &category.category_name,
                    &sub.subcategory_name,
                    sub.total_spending,
                    sub.transaction_count,
                    format!("{:.2}", sub.percentage),
                )?;
            }
        }

        if self.uncategorized_count > 0 {
            row(
                "UNCATEGORIZED",
                "",
                self.uncategorized_spending,
                self.uncategorized_count,
                format!("{:.2}", self.uncategorized_percentage()),
            )?;
        }

        let total_pct = if self.total_spending.is_zero() { "0.00" } else { "100.00" };
        row(
            "TOTAL",
            "",
            self.total_spending,
            self.total_transactions,
            total_pct.to_string(),
        )?;

        csv.flush().map_err(|e| TallyError::Export(e.to_string()))?;
        Ok(())
    }

    /// Get top spending categories
    pub fn top_categories(&self, limit: usize) -> &[SpendingByCategory] {
        &self.categories[..limit.min(self.categories.len())]
    }
}
