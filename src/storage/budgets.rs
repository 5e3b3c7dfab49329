//! Budget repository for JSON storage
//!
//! Budgets are keyed by (category, month); the map enforces one budget per pair.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::TallyError;
use crate::models::{Budget, CategoryId, Month};

use super::file_io::{read_json, write_json_atomic};
use super::lock_error;

/// Serializable budget data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct BudgetData {
    #[serde(default)]
    budgets: Vec<Budget>,
}

/// Composite key for budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BudgetKey {
    pub category_id: CategoryId,
    pub month: Month,
}

impl BudgetKey {
    pub fn new(category_id: CategoryId, month: Month) -> Self {
        Self { category_id, month }
    }

    fn of(budget: &Budget) -> Self {
        Self::new(budget.category_id, budget.month)
    }
}

/// Repository for budget persistence
pub struct BudgetRepository {
    path: PathBuf,
    budgets: RwLock<HashMap<BudgetKey, Budget>>,
}

impl BudgetRepository {
    /// Create a new budget repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            budgets: RwLock::new(HashMap::new()),
        }
    }

    /// Load budgets from disk
    pub fn load(&self) -> Result<(), TallyError> {
        let file_data: BudgetData = read_json(&self.path)?;

        let mut budgets = self.budgets.write().map_err(lock_error)?;

        budgets.clear();
        for budget in file_data.budgets {
            let key = BudgetKey::of(&budget);
            if budgets.insert(key, budget).is_some() {
                tracing::warn!(month = %key.month, "duplicate budget in file; keeping the last one");
            }
        }

        Ok(())
    }

    /// Save budgets to disk
    pub fn save(&self) -> Result<(), TallyError> {
        let budgets = self.get_all()?;
        write_json_atomic(&self.path, &BudgetData { budgets })
    }

    /// Get the budget for a category and month
    pub fn get_for(&self, category_id: CategoryId, month: Month) -> Result<Option<Budget>, TallyError> {
        let budgets = self.budgets.read().map_err(lock_error)?;
        Ok(budgets.get(&BudgetKey::new(category_id, month)).cloned())
    }

    /// Get all budgets for a month
    pub fn get_for_month(&self, month: Month) -> Result<Vec<Budget>, TallyError> {
        let budgets = self.budgets.read().map_err(lock_error)?;

        Ok(budgets
            .values()
            .filter(|b| b.month == month)
            .cloned()
            .collect())
    }

    /// Get all budgets for a category, oldest month first
    pub fn get_for_category(&self, category_id: CategoryId) -> Result<Vec<Budget>, TallyError> {
        let budgets = self.budgets.read().map_err(lock_error)?;

        let mut list: Vec<_> = budgets
            .values()
            .filter(|b| b.category_id == category_id)
            .cloned()
            .collect();
        list.sort_by_key(|b| b.month);
        Ok(list)
    }

    /// Insert or update a budget
    pub fn upsert(&self, budget: Budget) -> Result<(), TallyError> {
        let mut budgets = self.budgets.write().map_err(lock_error)?;
        budgets.insert(BudgetKey::of(&budget), budget);
        Ok(())
    }

    /// Delete the budget for a category and month
    pub fn delete(&self, category_id: CategoryId, month: Month) -> Result<bool, TallyError> {
        let mut budgets = self.budgets.write().map_err(lock_error)?;
        Ok(budgets.remove(&BudgetKey::new(category_id, month)).is_some())
    }

    /// Delete all budgets for a category
    pub fn delete_for_category(&self, category_id: CategoryId) -> Result<usize, TallyError> {
        let mut budgets = self.budgets.write().map_err(lock_error)?;

        let initial_count = budgets.len();
        budgets.retain(|k, _| k.category_id != category_id);
        Ok(initial_count - budgets.len())
    }

    /// Count budgets
    pub fn count(&self) -> Result<usize, TallyError> {
        let budgets = self.budgets.read().map_err(lock_error)?;
        Ok(budgets.len())
    }

    /// Get all budgets ordered by month
    pub fn get_all(&self) -> Result<Vec<Budget>, TallyError> {
        let budgets = self.budgets.read().map_err(lock_error)?;

        let mut list: Vec<_> = budgets.values().cloned().collect();
        list.sort_by(|a, b| a.month.cmp(&b.month).then(a.created_at.cmp(&b.created_at)));
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, BudgetRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("budgets.json");
        let repo = BudgetRepository::new(path);
        (temp_dir, repo)
    }

    fn jan() -> Month {
        Month::new(2025, 1).unwrap()
    }

    #[test]
    fn test_one_budget_per_category_month() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let food = CategoryId::new();
        repo.upsert(Budget::new(food, jan(), Money::from_cents(40000)))
            .unwrap();
        repo.upsert(Budget::new(food, jan(), Money::from_cents(45000)))
            .unwrap();

        assert_eq!(repo.count().unwrap(), 1);
        let budget = repo.get_for(food, jan()).unwrap().unwrap();
        assert_eq!(budget.limit.cents(), 45000);
    }

    #[test]
    fn test_get_for_month() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let food = CategoryId::new();
        let rent = CategoryId::new();
        repo.upsert(Budget::new(food, jan(), Money::from_cents(100)))
            .unwrap();
        repo.upsert(Budget::new(rent, jan(), Money::from_cents(200)))
            .unwrap();
        repo.upsert(Budget::new(food, jan().next(), Money::from_cents(300)))
            .unwrap();

        assert_eq!(repo.get_for_month(jan()).unwrap().len(), 2);
        assert_eq!(repo.get_for_month(jan().next()).unwrap().len(), 1);
        assert_eq!(repo.get_for_category(food).unwrap().len(), 2);
    }

    #[test]
    fn test_delete_for_category() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let food = CategoryId::new();
        repo.upsert(Budget::new(food, jan(), Money::from_cents(100)))
            .unwrap();
        repo.upsert(Budget::new(food, jan().prev(), Money::from_cents(100)))
            .unwrap();

        assert_eq!(repo.delete_for_category(food).unwrap(), 2);
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let food = CategoryId::new();
        repo.upsert(Budget::new(food, jan(), Money::from_cents(25000)))
            .unwrap();
        repo.save().unwrap();

        let repo2 = BudgetRepository::new(temp_dir.path().join("budgets.json"));
        repo2.load().unwrap();

        let budget = repo2.get_for(food, jan()).unwrap().unwrap();
        assert_eq!(budget.limit.cents(), 25000);
        assert!(repo2.delete(food, jan()).unwrap());
    }
}
