//! Monthly budget model
//!
//! A budget caps spending in one category for one calendar month.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BudgetId, CategoryId};
use super::money::Money;
use super::period::Month;

/// Share of the limit at which a budget counts as "near limit"
pub const NEAR_LIMIT_PERCENT: f64 = 80.0;

/// A spending limit for a category in a specific month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    /// Unique identifier
    pub id: BudgetId,

    /// The category this budget is for
    pub category_id: CategoryId,

    /// The month this budget applies to
    pub month: Month,

    /// Maximum planned spending
    pub limit: Money,

    /// Notes for this month's budget
    #[serde(default)]
    pub notes: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Budget {
    pub fn new(category_id: CategoryId, month: Month, limit: Money) -> Self {
        let now = Utc::now();
        Self {
            id: BudgetId::new(),
            category_id,
            month,
            limit,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_limit(&mut self, limit: Money) {
        self.limit = limit;
        self.updated_at = Utc::now();
    }

    /// Validate the budget
    pub fn validate(&self) -> Result<(), BudgetValidationError> {
        if !self.limit.is_positive() {
            return Err(BudgetValidationError::NonPositiveLimit);
        }

        Ok(())
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} limit: {}", self.month, self.limit)
    }
}

/// Where spending stands relative to the limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    UnderBudget,
    NearLimit,
    OverBudget,
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnderBudget => write!(f, "On track"),
            Self::NearLimit => write!(f, "Near limit"),
            Self::OverBudget => write!(f, "Over budget"),
        }
    }
}

/// Spending against a budget for its month
#[derive(Debug, Clone, Serialize)]
pub struct BudgetProgress {
    pub budget: Budget,

    /// Category name for display
    pub category_name: String,

    /// Sum of matching expenses in the month
    pub spent: Money,

    /// limit - spent (negative when overspent)
    pub remaining: Money,

    /// spent / limit * 100
    pub percent_used: f64,

    /// Number of expenses counted
    pub transaction_count: usize,

    pub status: BudgetStatus,
}

impl BudgetProgress {
    pub fn new(
        budget: Budget,
        category_name: impl Into<String>,
        spent: Money,
        transaction_count: usize,
    ) -> Self {
        let remaining = budget.limit - spent;
        let percent_used = if budget.limit.is_zero() {
            0.0
        } else {
            spent.cents() as f64 * 100.0 / budget.limit.cents() as f64
        };
        let status = if spent > budget.limit {
            BudgetStatus::OverBudget
        } else if percent_used >= NEAR_LIMIT_PERCENT {
            BudgetStatus::NearLimit
        } else {
            BudgetStatus::UnderBudget
        };

        Self {
            budget,
            category_name: category_name.into(),
            spent,
            remaining,
            percent_used,
            transaction_count,
            status,
        }
    }

    pub fn is_over_budget(&self) -> bool {
        self.status == BudgetStatus::OverBudget
    }
}

impl fmt::Display for BudgetProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} of {} ({:.0}%)",
            self.category_name, self.spent, self.budget.limit, self.percent_used
        )
    }
}

/// Validation errors for budgets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetValidationError {
    NonPositiveLimit,
}

impl fmt::Display for BudgetValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveLimit => write!(f, "Budget limit must be greater than zero"),
        }
    }
}

impl std::error::Error for BudgetValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_budget(limit_cents: i64) -> Budget {
        Budget::new(
            CategoryId::new(),
            Month::new(2025, 1).unwrap(),
            Money::from_cents(limit_cents),
        )
    }

    #[test]
    fn test_validation() {
        assert!(test_budget(50000).validate().is_ok());
        assert_eq!(
            test_budget(0).validate(),
            Err(BudgetValidationError::NonPositiveLimit)
        );
        assert_eq!(
            test_budget(-100).validate(),
            Err(BudgetValidationError::NonPositiveLimit)
        );
    }

    #[test]
    fn test_progress_under_budget() {
        let progress = BudgetProgress::new(test_budget(50000), "Food", Money::from_cents(20000), 3);
        assert_eq!(progress.remaining.cents(), 30000);
        assert!((progress.percent_used - 40.0).abs() < 1e-9);
        assert_eq!(progress.status, BudgetStatus::UnderBudget);
    }

    #[test]
    fn test_progress_near_limit() {
        let progress = BudgetProgress::new(test_budget(10000), "Food", Money::from_cents(8000), 1);
        assert_eq!(progress.status, BudgetStatus::NearLimit);
    }

    #[test]
    fn test_progress_exactly_at_limit_is_not_over() {
        let progress = BudgetProgress::new(test_budget(10000), "Food", Money::from_cents(10000), 1);
        assert_eq!(progress.status, BudgetStatus::NearLimit);
        assert!(progress.remaining.is_zero());
    }

    #[test]
    fn test_progress_over_budget() {
        let progress = BudgetProgress::new(test_budget(10000), "Food", Money::from_cents(12500), 2);
        assert!(progress.is_over_budget());
        assert_eq!(progress.remaining.cents(), -2500);
        assert_eq!(format!("{}", progress), "Food: $125.00 of $100.00 (125%)");
    }
}
