//! Storage initialization
//!
//! Handles first-run setup and the default category set

use crate::config::paths::TallyPaths;
use crate::error::TallyError;
use crate::models::DefaultCategory;

use super::categories::CategoryData;
use super::file_io::write_json_atomic;

/// Initialize storage for a fresh data directory
///
/// Returns true when the default categories were written.
pub fn initialize_storage(paths: &TallyPaths) -> Result<bool, TallyError> {
    paths.ensure_directories()?;

    if paths.categories_file().exists() {
        return Ok(false);
    }

    create_default_categories(paths)?;
    Ok(true)
}

fn create_default_categories(paths: &TallyPaths) -> Result<(), TallyError> {
    let mut data = CategoryData::default();

    for (i, default) in DefaultCategory::all().iter().enumerate() {
        let (category, subs) = default.build(i as i32);
        data.categories.push(category);
        data.subcategories.extend(subs);
    }

    write_json_atomic(paths.categories_file(), &data)?;
    tracing::info!(
        categories = data.categories.len(),
        subcategories = data.subcategories.len(),
        "seeded default categories"
    );

    Ok(())
}

/// Check if storage needs initialization
pub fn needs_initialization(paths: &TallyPaths) -> bool {
    !paths.categories_file().exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use tempfile::TempDir;

    #[test]
    fn test_initialize_storage() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path());

        assert!(needs_initialization(&paths));
        assert!(initialize_storage(&paths).unwrap());

        assert!(!needs_initialization(&paths));
        assert!(paths.data_dir().exists());
        assert!(paths.exports_dir().exists());
    }

    #[test]
    fn test_default_categories_created() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path());

        initialize_storage(&paths).unwrap();

        let content = std::fs::read_to_string(paths.categories_file()).unwrap();
        let data: CategoryData = serde_json::from_str(&content).unwrap();

        assert_eq!(data.categories.len(), DefaultCategory::all().len());
        let names: Vec<_> = data.categories.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"Food"));
        assert!(names.contains(&"Other"));

        let food = data.categories.iter().find(|c| c.name == "Food").unwrap();
        let food_subs = data
            .subcategories
            .iter()
            .filter(|s| s.category_id == food.id)
            .count();
        assert_eq!(food_subs, 3);
    }

    #[test]
    fn test_doesnt_overwrite_existing() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path());

        initialize_storage(&paths).unwrap();

        let custom_data = CategoryData {
            categories: vec![Category::new("Custom")],
            subcategories: vec![],
        };
        write_json_atomic(paths.categories_file(), &custom_data).unwrap();

        assert!(!initialize_storage(&paths).unwrap());

        let content = std::fs::read_to_string(paths.categories_file()).unwrap();
        let data: CategoryData = serde_json::from_str(&content).unwrap();
        assert_eq!(data.categories.len(), 1);
        assert_eq!(data.categories[0].name, "Custom");
    }
}
