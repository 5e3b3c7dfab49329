//! Storage layer for Tally
//!
//! Provides JSON file storage with atomic writes and automatic directory
//! creation. Each collection lives in its own file under `data/`.

pub mod budgets;
pub mod categories;
pub mod file_io;
pub mod init;
pub mod tags;
pub mod transactions;

pub use budgets::BudgetRepository;
pub use categories::CategoryRepository;
pub use file_io::{read_json, read_json_required, write_json_atomic};
pub use init::initialize_storage;
pub use tags::TagRepository;
pub use transactions::TransactionRepository;

use crate::config::paths::TallyPaths;
use crate::error::TallyError;

pub(crate) fn lock_error<E: std::fmt::Display>(e: E) -> TallyError {
    TallyError::Storage(format!("Failed to acquire lock: {}", e))
}

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: TallyPaths,
    pub transactions: TransactionRepository,
    pub categories: CategoryRepository,
    pub tags: TagRepository,
    pub budgets: BudgetRepository,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: TallyPaths) -> Result<Self, TallyError> {
        paths.ensure_directories()?;

        Ok(Self {
            transactions: TransactionRepository::new(paths.transactions_file()),
            categories: CategoryRepository::new(paths.categories_file()),
            tags: TagRepository::new(paths.tags_file()),
            budgets: BudgetRepository::new(paths.budgets_file()),
            paths,
        })
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &TallyPaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&mut self) -> Result<(), TallyError> {
        self.categories.load()?;
        self.tags.load()?;
        self.transactions.load()?;
        self.budgets.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> Result<(), TallyError> {
        self.categories.save()?;
        self.tags.save()?;
        self.transactions.save()?;
        self.budgets.save()?;
        Ok(())
    }

    /// Check if storage has been initialized
    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Money, Transaction};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn test_storage_creation() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path());
        let storage = Storage::new(paths).unwrap();

        assert!(temp_dir.path().join("data").exists());
        assert!(temp_dir.path().join("exports").exists());
        assert!(!storage.is_initialized());
    }

    #[test]
    fn test_save_all_and_load_all() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path());

        let storage = Storage::new(paths.clone()).unwrap();
        let food = Category::new("Food");
        let food_id = food.id;
        storage.categories.upsert_category(food).unwrap();
        storage
            .transactions
            .upsert(Transaction::expense(
                NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                Money::from_cents(1500),
                "Lunch",
                Some(food_id),
            ))
            .unwrap();
        storage.tags.get_or_create("work").unwrap();
        storage.save_all().unwrap();

        let mut reloaded = Storage::new(paths).unwrap();
        reloaded.load_all().unwrap();
        assert_eq!(reloaded.categories.category_count().unwrap(), 1);
        assert_eq!(reloaded.transactions.count().unwrap(), 1);
        assert_eq!(reloaded.tags.count().unwrap(), 1);
        assert_eq!(reloaded.transactions.get_by_category(food_id).unwrap().len(), 1);
    }
}
