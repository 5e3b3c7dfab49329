//! Category and Subcategory repository for JSON storage
//!
//! Both collections live in categories.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::TallyError;
use crate::models::{Category, CategoryId, Subcategory, SubcategoryId};

use super::file_io::{read_json, write_json_atomic};
use super::lock_error;

/// Serializable category data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct CategoryData {
    pub categories: Vec<Category>,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
}

/// Repository for category and sub-category persistence
pub struct CategoryRepository {
    path: PathBuf,
    categories: RwLock<HashMap<CategoryId, Category>>,
    subcategories: RwLock<HashMap<SubcategoryId, Subcategory>>,
}

fn sort_categories(list: &mut [Category]) {
    list.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

fn sort_subcategories(list: &mut [Subcategory]) {
    list.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

impl CategoryRepository {
    /// Create a new category repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            categories: RwLock::new(HashMap::new()),
            subcategories: RwLock::new(HashMap::new()),
        }
    }

    /// Load categories from disk
    pub fn load(&self) -> Result<(), TallyError> {
        let file_data: CategoryData = read_json(&self.path)?;

        let mut categories = self.categories.write().map_err(lock_error)?;
        let mut subcategories = self.subcategories.write().map_err(lock_error)?;

        categories.clear();
        subcategories.clear();

        for category in file_data.categories {
            categories.insert(category.id, category);
        }

        for sub in file_data.subcategories {
            if categories.contains_key(&sub.category_id) {
                subcategories.insert(sub.id, sub);
            } else {
                tracing::warn!(subcategory = %sub.id, "dropping subcategory with unknown parent");
            }
        }

        Ok(())
    }

    /// Save categories to disk
    pub fn save(&self) -> Result<(), TallyError> {
        let categories = self.categories.read().map_err(lock_error)?;
        let subcategories = self.subcategories.read().map_err(lock_error)?;

        let mut category_list: Vec<_> = categories.values().cloned().collect();
        sort_categories(&mut category_list);

        let mut sub_list: Vec<_> = subcategories.values().cloned().collect();
        sub_list.sort_by_key(|s| s.category_id);
        sub_list.sort_by_key(|s| s.sort_order);

        let file_data = CategoryData {
            categories: category_list,
            subcategories: sub_list,
        };

        write_json_atomic(&self.path, &file_data)
    }

    // Category operations

    /// Get a category by ID
    pub fn get_category(&self, id: CategoryId) -> Result<Option<Category>, TallyError> {
        let categories = self.categories.read().map_err(lock_error)?;
        Ok(categories.get(&id).cloned())
    }

    /// Get all categories in display order
    pub fn get_all_categories(&self) -> Result<Vec<Category>, TallyError> {
        let categories = self.categories.read().map_err(lock_error)?;

        let mut list: Vec<_> = categories.values().cloned().collect();
        sort_categories(&mut list);
        Ok(list)
    }

    /// Get a category by name (case-insensitive)
    pub fn get_category_by_name(&self, name: &str) -> Result<Option<Category>, TallyError> {
        let categories = self.categories.read().map_err(lock_error)?;

        let name_lower = name.trim().to_lowercase();
        Ok(categories
            .values()
            .find(|c| c.name.to_lowercase() == name_lower)
            .cloned())
    }

    /// Insert or update a category
    pub fn upsert_category(&self, category: Category) -> Result<(), TallyError> {
        let mut categories = self.categories.write().map_err(lock_error)?;
        categories.insert(category.id, category);
        Ok(())
    }

    /// Delete a category together with its sub-categories
    pub fn delete_category(&self, id: CategoryId) -> Result<bool, TallyError> {
        let mut categories = self.categories.write().map_err(lock_error)?;
        let mut subcategories = self.subcategories.write().map_err(lock_error)?;

        subcategories.retain(|_, s| s.category_id != id);
        Ok(categories.remove(&id).is_some())
    }

    /// Highest sort order in use, for appending new categories
    pub fn next_sort_order(&self) -> Result<i32, TallyError> {
        let categories = self.categories.read().map_err(lock_error)?;
        Ok(categories.values().map(|c| c.sort_order + 1).max().unwrap_or(0))
    }

    // Subcategory operations

    /// Get a sub-category by ID
    pub fn get_subcategory(&self, id: SubcategoryId) -> Result<Option<Subcategory>, TallyError> {
        let subcategories = self.subcategories.read().map_err(lock_error)?;
        Ok(subcategories.get(&id).cloned())
    }

    /// Get the sub-categories of a category in display order
    pub fn get_subcategories(&self, category_id: CategoryId) -> Result<Vec<Subcategory>, TallyError> {
        let subcategories = self.subcategories.read().map_err(lock_error)?;

        let mut list: Vec<_> = subcategories
            .values()
            .filter(|s| s.category_id == category_id)
            .cloned()
            .collect();
        sort_subcategories(&mut list);
        Ok(list)
    }

    /// Get all sub-categories
    pub fn get_all_subcategories(&self) -> Result<Vec<Subcategory>, TallyError> {
        let subcategories = self.subcategories.read().map_err(lock_error)?;

        let mut list: Vec<_> = subcategories.values().cloned().collect();
        sort_subcategories(&mut list);
        Ok(list)
    }

    /// Get a sub-category of `category_id` by name (case-insensitive)
    pub fn get_subcategory_by_name(
        &self,
        category_id: CategoryId,
        name: &str,
    ) -> Result<Option<Subcategory>, TallyError> {
        let subcategories = self.subcategories.read().map_err(lock_error)?;

        let name_lower = name.trim().to_lowercase();
        Ok(subcategories
            .values()
            .find(|s| s.category_id == category_id && s.name.to_lowercase() == name_lower)
            .cloned())
    }

    /// Insert or update a sub-category
    pub fn upsert_subcategory(&self, sub: Subcategory) -> Result<(), TallyError> {
        let mut subcategories = self.subcategories.write().map_err(lock_error)?;
        subcategories.insert(sub.id, sub);
        Ok(())
    }

    /// Delete a sub-category
    pub fn delete_subcategory(&self, id: SubcategoryId) -> Result<bool, TallyError> {
        let mut subcategories = self.subcategories.write().map_err(lock_error)?;
        Ok(subcategories.remove(&id).is_some())
    }

    /// Count categories
    pub fn category_count(&self) -> Result<usize, TallyError> {
        let categories = self.categories.read().map_err(lock_error)?;
        Ok(categories.len())
    }

    /// Count sub-categories
    pub fn subcategory_count(&self) -> Result<usize, TallyError> {
        let subcategories = self.subcategories.read().map_err(lock_error)?;
        Ok(subcategories.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, CategoryRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("categories.json");
        let repo = CategoryRepository::new(path);
        (temp_dir, repo)
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        assert_eq!(repo.category_count().unwrap(), 0);
        assert_eq!(repo.subcategory_count().unwrap(), 0);
        assert_eq!(repo.next_sort_order().unwrap(), 0);
    }

    #[test]
    fn test_category_and_subcategory_operations() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let food = Category::new("Food");
        let food_id = food.id;
        repo.upsert_category(food).unwrap();

        let groceries = Subcategory::new(food_id, "Groceries");
        let groceries_id = groceries.id;
        repo.upsert_subcategory(groceries).unwrap();

        assert_eq!(repo.get_category(food_id).unwrap().unwrap().name, "Food");
        assert_eq!(
            repo.get_subcategory(groceries_id).unwrap().unwrap().category_id,
            food_id
        );
        assert_eq!(repo.get_subcategories(food_id).unwrap().len(), 1);
    }

    #[test]
    fn test_get_by_name_is_case_insensitive() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let housing = Category::new("Housing");
        let housing_id = housing.id;
        repo.upsert_category(housing).unwrap();
        repo.upsert_subcategory(Subcategory::new(housing_id, "Rent"))
            .unwrap();

        assert!(repo.get_category_by_name("HOUSING").unwrap().is_some());
        assert!(repo
            .get_subcategory_by_name(housing_id, " rent ")
            .unwrap()
            .is_some());
        assert!(repo
            .get_subcategory_by_name(CategoryId::new(), "rent")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_delete_category_cascades() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let transport = Category::new("Transport");
        let transport_id = transport.id;
        repo.upsert_category(transport).unwrap();
        repo.upsert_subcategory(Subcategory::new(transport_id, "Fuel"))
            .unwrap();
        repo.upsert_subcategory(Subcategory::new(transport_id, "Parking"))
            .unwrap();

        assert!(repo.delete_category(transport_id).unwrap());
        assert_eq!(repo.category_count().unwrap(), 0);
        assert_eq!(repo.subcategory_count().unwrap(), 0);
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let health = Category::with_sort_order("Health", 3);
        let health_id = health.id;
        repo.upsert_category(health).unwrap();
        repo.upsert_subcategory(Subcategory::new(health_id, "Pharmacy"))
            .unwrap();
        repo.save().unwrap();

        let repo2 = CategoryRepository::new(temp_dir.path().join("categories.json"));
        repo2.load().unwrap();

        assert_eq!(repo2.category_count().unwrap(), 1);
        assert_eq!(repo2.subcategory_count().unwrap(), 1);
        assert_eq!(repo2.next_sort_order().unwrap(), 4);
    }

    #[test]
    fn test_orphan_subcategory_dropped_on_load() {
        let (temp_dir, repo) = create_test_repo();
        let data = CategoryData {
            categories: vec![],
            subcategories: vec![Subcategory::new(CategoryId::new(), "Lost")],
        };
        write_json_atomic(temp_dir.path().join("categories.json"), &data).unwrap();

        repo.load().unwrap();
        assert_eq!(repo.subcategory_count().unwrap(), 0);
    }
}
