//! Budget service
//!
//! Monthly spending limits per category and the progress of actual spending
//! against them.

use crate::error::{TallyError, TallyResult};
use crate::models::{Budget, BudgetProgress, CategoryId, Money, Month};
use crate::storage::Storage;

/// Service for budget management
pub struct BudgetService<'a> {
    storage: &'a Storage,
}

/// Result of copying budgets between months
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyOutcome {
    pub copied: usize,
    pub overwritten: usize,
    /// Budgets left alone because the target month already had one
    pub skipped: usize,
}

impl<'a> BudgetService<'a> {
    /// Create a new budget service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create or update the budget for a category and month
    pub fn set_budget(&self, category_id: CategoryId, month: Month, limit: Money) -> TallyResult<Budget> {
        let category = self
            .storage
            .categories
            .get_category(category_id)?
            .ok_or_else(|| TallyError::category_not_found(category_id.to_string()))?;

        let budget = match self.storage.budgets.get_for(category_id, month)? {
            Some(mut existing) => {
                existing.set_limit(limit);
                existing
            }
            None => Budget::new(category_id, month, limit),
        };

        budget
            .validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        self.storage.budgets.upsert(budget.clone())?;
        self.storage.budgets.save()?;

        tracing::info!(category = %category.name, month = %month, limit = %limit, "set budget");
        Ok(budget)
    }

    /// Get the budget for a category and month
    pub fn get_budget(&self, category_id: CategoryId, month: Month) -> TallyResult<Option<Budget>> {
        self.storage.budgets.get_for(category_id, month)
    }

    /// Delete the budget for a category and month
    pub fn delete_budget(&self, category_id: CategoryId, month: Month) -> TallyResult<Budget> {
        let budget = self
            .storage
            .budgets
            .get_for(category_id, month)?
            .ok_or_else(|| TallyError::budget_not_found(format!("{} {}", category_id, month)))?;

        self.storage.budgets.delete(category_id, month)?;
        self.storage.budgets.save()?;

        tracing::info!(id = %budget.id, month = %month, "deleted budget");
        Ok(budget)
    }

    /// All budgets for a month
    pub fn list_for_month(&self, month: Month) -> TallyResult<Vec<Budget>> {
        self.storage.budgets.get_for_month(month)
    }

    /// Expenses in `category_id` dated within `month`, summed, with their count
    ///
    /// Sub-categories are part of their category, so every expense filed under
    /// the category counts whatever its sub-category.
    pub fn spent(&self, category_id: CategoryId, month: Month) -> TallyResult<(Money, usize)> {
        let expenses: Vec<_> = self
            .storage
            .transactions
            .get_by_category(category_id)?
            .into_iter()
            .filter(|t| t.is_expense() && month.contains(t.date))
            .collect();

        let total: Money = expenses.iter().map(|t| t.amount).sum();
        Ok((total, expenses.len()))
    }

    /// Progress of one category's budget in a month
    pub fn progress(&self, category_id: CategoryId, month: Month) -> TallyResult<BudgetProgress> {
        let budget = self
            .storage
            .budgets
            .get_for(category_id, month)?
            .ok_or_else(|| TallyError::budget_not_found(format!("{} {}", category_id, month)))?;

        self.progress_of(budget)
    }

    /// Progress of every budget in a month, ordered by category name
    pub fn progress_for_month(&self, month: Month) -> TallyResult<Vec<BudgetProgress>> {
        let mut rows = Vec::new();
        for budget in self.storage.budgets.get_for_month(month)? {
            rows.push(self.progress_of(budget)?);
        }

        rows.sort_by(|a, b| {
            a.category_name
                .to_lowercase()
                .cmp(&b.category_name.to_lowercase())
        });
        Ok(rows)
    }

    fn progress_of(&self, budget: Budget) -> TallyResult<BudgetProgress> {
        let category_name = self
            .storage
            .categories
            .get_category(budget.category_id)?
            .map(|c| c.name)
            .unwrap_or_else(|| "(deleted category)".to_string());

        let (spent, count) = self.spent(budget.category_id, budget.month)?;
        Ok(BudgetProgress::new(budget, category_name, spent, count))
    }

    /// Copy every budget of `from` into `to`
    ///
    /// Existing budgets in `to` are kept unless `overwrite` is set.
    pub fn copy_month(&self, from: Month, to: Month, overwrite: bool) -> TallyResult<CopyOutcome> {
        if from == to {
            return Err(TallyError::Validation(
                "Source and target month are the same".into(),
            ));
        }

        let source = self.storage.budgets.get_for_month(from)?;
        if source.is_empty() {
            return Err(TallyError::Budget(format!("No budgets set for {}", from)));
        }

        let mut outcome = CopyOutcome::default();
        for budget in source {
            match self.storage.budgets.get_for(budget.category_id, to)? {
                Some(mut existing) if overwrite => {
                    existing.set_limit(budget.limit);
                    self.storage.budgets.upsert(existing)?;
                    outcome.overwritten += 1;
                }
                Some(_) => outcome.skipped += 1,
                None => {
                    let mut copy = Budget::new(budget.category_id, to, budget.limit);
                    copy.notes = budget.notes;
                    self.storage.budgets.upsert(copy)?;
                    outcome.copied += 1;
                }
            }
        }

        self.storage.budgets.save()?;

        tracing::info!(
            from = %from,
            to = %to,
            copied = outcome.copied,
            overwritten = outcome.overwritten,
            skipped = outcome.skipped,
            "copied budgets"
        );
        Ok(outcome)
    }
}
