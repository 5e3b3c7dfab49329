//! Category service
//!
//! Provides business logic for categories and their sub-categories,
//! including the cascade applied when a category in use is deleted.

use chrono::Utc;

use crate::error::{TallyError, TallyResult};
use crate::models::{Category, CategoryId, Subcategory, SubcategoryId};
use crate::storage::Storage;

/// Service for category management
pub struct CategoryService<'a> {
    storage: &'a Storage,
}

/// A category with its sub-categories
#[derive(Debug, Clone)]
pub struct CategoryWithSubcategories {
    pub category: Category,
    pub subcategories: Vec<Subcategory>,
}

/// What a category deletion touched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteCategoryOutcome {
    /// Transactions left without a category
    pub uncategorized: usize,
    pub subcategories_removed: usize,
    pub budgets_removed: usize,
}

impl<'a> CategoryService<'a> {
    /// Create a new category service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    // === Category Operations ===

    /// Create a new category at the end of the list
    pub fn create_category(&self, name: &str) -> TallyResult<Category> {
        let name = name.trim();
        if self.storage.categories.get_category_by_name(name)?.is_some() {
            return Err(TallyError::Duplicate {
                entity_type: "Category",
                identifier: name.to_string(),
            });
        }

        let sort_order = self.storage.categories.next_sort_order()?;
        let category = Category::with_sort_order(name, sort_order);
        category
            .validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        self.storage.categories.upsert_category(category.clone())?;
        self.storage.categories.save()?;

        tracing::info!(id = %category.id, name = %category.name, "created category");
        Ok(category)
    }

    /// Get a category by ID
    pub fn get_category(&self, id: CategoryId) -> TallyResult<Option<Category>> {
        self.storage.categories.get_category(id)
    }

    /// Find a category by name (case-insensitive) or ID string
    pub fn find_category(&self, identifier: &str) -> TallyResult<Option<Category>> {
        if let Some(category) = self.storage.categories.get_category_by_name(identifier)? {
            return Ok(Some(category));
        }

        if let Ok(id) = identifier.trim().parse::<CategoryId>() {
            return self.storage.categories.get_category(id);
        }

        Ok(self
            .storage
            .categories
            .get_all_categories()?
            .into_iter()
            .find(|c| c.id.matches_prefix(identifier)))
    }

    /// Find a category or fail with a not-found error
    pub fn resolve_category(&self, identifier: &str) -> TallyResult<Category> {
        self.find_category(identifier)?
            .ok_or_else(|| TallyError::category_not_found(identifier.trim()))
    }

    /// List all categories in display order
    pub fn list_categories(&self) -> TallyResult<Vec<Category>> {
        self.storage.categories.get_all_categories()
    }

    /// List all categories with their sub-categories
    pub fn category_tree(&self) -> TallyResult<Vec<CategoryWithSubcategories>> {
        let categories = self.storage.categories.get_all_categories()?;
        let mut result = Vec::with_capacity(categories.len());

        for category in categories {
            let subcategories = self.storage.categories.get_subcategories(category.id)?;
            result.push(CategoryWithSubcategories {
                category,
                subcategories,
            });
        }

        Ok(result)
    }

    /// Rename a category
    pub fn rename_category(&self, id: CategoryId, new_name: &str) -> TallyResult<Category> {
        let mut category = self
            .storage
            .categories
            .get_category(id)?
            .ok_or_else(|| TallyError::category_not_found(id.to_string()))?;

        let new_name = new_name.trim();
        if let Some(existing) = self.storage.categories.get_category_by_name(new_name)? {
            if existing.id != id {
                return Err(TallyError::Duplicate {
                    entity_type: "Category",
                    identifier: new_name.to_string(),
                });
            }
        }

        let old_name = std::mem::take(&mut category.name);
        category.rename(new_name);
        category
            .validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        self.storage.categories.upsert_category(category.clone())?;
        self.storage.categories.save()?;

        tracing::info!(id = %id, from = %old_name, to = %category.name, "renamed category");
        Ok(category)
    }

    /// Delete a category and its sub-categories
    ///
    /// A category used by transactions is only deleted with `force`; the
    /// transactions are then left uncategorized and the category's budgets
    /// are removed.
    pub fn delete_category(&self, id: CategoryId, force: bool) -> TallyResult<DeleteCategoryOutcome> {
        let category = self
            .storage
            .categories
            .get_category(id)?
            .ok_or_else(|| TallyError::category_not_found(id.to_string()))?;

        let transactions = self.storage.transactions.get_by_category(id)?;
        if !transactions.is_empty() && !force {
            return Err(TallyError::Validation(format!(
                "Cannot delete category '{}' - it is used by {} transaction(s). Use --force to uncategorize them.",
                category.name,
                transactions.len()
            )));
        }

        let mut outcome = DeleteCategoryOutcome {
            subcategories_removed: self.storage.categories.get_subcategories(id)?.len(),
            ..Default::default()
        };

        for mut txn in transactions {
            txn.clear_category();
            self.storage.transactions.upsert(txn)?;
            outcome.uncategorized += 1;
        }
        outcome.budgets_removed = self.storage.budgets.delete_for_category(id)?;
        self.storage.categories.delete_category(id)?;

        self.storage.categories.save()?;
        if outcome.uncategorized > 0 {
            self.storage.transactions.save()?;
        }
        if outcome.budgets_removed > 0 {
            self.storage.budgets.save()?;
        }

        tracing::info!(
            id = %id,
            name = %category.name,
            uncategorized = outcome.uncategorized,
            budgets_removed = outcome.budgets_removed,
            "deleted category"
        );
        Ok(outcome)
    }

    // === Subcategory Operations ===

    /// Create a sub-category under a category
    pub fn create_subcategory(&self, category_id: CategoryId, name: &str) -> TallyResult<Subcategory> {
        let category = self
            .storage
            .categories
            .get_category(category_id)?
            .ok_or_else(|| TallyError::category_not_found(category_id.to_string()))?;

        let name = name.trim();
        if self
            .storage
            .categories
            .get_subcategory_by_name(category_id, name)?
            .is_some()
        {
            return Err(TallyError::Duplicate {
                entity_type: "Subcategory",
                identifier: format!("{}/{}", category.name, name),
            });
        }

        let existing = self.storage.categories.get_subcategories(category_id)?;
        let sort_order = existing.iter().map(|s| s.sort_order + 1).max().unwrap_or(0);

        let sub = Subcategory::with_sort_order(category_id, name, sort_order);
        sub.validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        self.storage.categories.upsert_subcategory(sub.clone())?;
        self.storage.categories.save()?;

        tracing::info!(id = %sub.id, category = %category.name, name = %sub.name, "created subcategory");
        Ok(sub)
    }

    /// Get a sub-category by ID
    pub fn get_subcategory(&self, id: SubcategoryId) -> TallyResult<Option<Subcategory>> {
        self.storage.categories.get_subcategory(id)
    }

    /// Find a sub-category of a category by name or ID string
    pub fn find_subcategory(
        &self,
        category_id: CategoryId,
        identifier: &str,
    ) -> TallyResult<Option<Subcategory>> {
        if let Some(sub) = self
            .storage
            .categories
            .get_subcategory_by_name(category_id, identifier)?
        {
            return Ok(Some(sub));
        }

        let subs = self.storage.categories.get_subcategories(category_id)?;
        if let Ok(id) = identifier.trim().parse::<SubcategoryId>() {
            return Ok(subs.into_iter().find(|s| s.id == id));
        }
        Ok(subs.into_iter().find(|s| s.id.matches_prefix(identifier)))
    }

    /// Find a sub-category or fail with a not-found error
    pub fn resolve_subcategory(
        &self,
        category_id: CategoryId,
        identifier: &str,
    ) -> TallyResult<Subcategory> {
        self.find_subcategory(category_id, identifier)?
            .ok_or_else(|| TallyError::subcategory_not_found(identifier.trim()))
    }

    /// List the sub-categories of a category
    pub fn list_subcategories(&self, category_id: CategoryId) -> TallyResult<Vec<Subcategory>> {
        self.storage.categories.get_subcategories(category_id)
    }

    /// Rename a sub-category
    pub fn rename_subcategory(&self, id: SubcategoryId, new_name: &str) -> TallyResult<Subcategory> {
        let mut sub = self
            .storage
            .categories
            .get_subcategory(id)?
            .ok_or_else(|| TallyError::subcategory_not_found(id.to_string()))?;

        let new_name = new_name.trim();
        if let Some(existing) = self
            .storage
            .categories
            .get_subcategory_by_name(sub.category_id, new_name)?
        {
            if existing.id != id {
                return Err(TallyError::Duplicate {
                    entity_type: "Subcategory",
                    identifier: new_name.to_string(),
                });
            }
        }

        sub.rename(new_name);
        sub.validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        self.storage.categories.upsert_subcategory(sub.clone())?;
        self.storage.categories.save()?;

        tracing::info!(id = %id, name = %sub.name, "renamed subcategory");
        Ok(sub)
    }

    /// Delete a sub-category; its transactions keep the parent category
    ///
    /// Returns the number of transactions that lost the sub-category.
    pub fn delete_subcategory(&self, id: SubcategoryId) -> TallyResult<usize> {
        let sub = self
            .storage
            .categories
            .get_subcategory(id)?
            .ok_or_else(|| TallyError::subcategory_not_found(id.to_string()))?;

        let mut cleared = 0;
        for mut txn in self.storage.transactions.get_by_category(sub.category_id)? {
            if txn.subcategory_id == Some(id) {
                txn.subcategory_id = None;
                txn.updated_at = Utc::now();
                self.storage.transactions.upsert(txn)?;
                cleared += 1;
            }
        }

        self.storage.categories.delete_subcategory(id)?;
        self.storage.categories.save()?;
        if cleared > 0 {
            self.storage.transactions.save()?;
        }

        tracing::info!(id = %id, name = %sub.name, cleared, "deleted subcategory");
        Ok(cleared)
    }
}
