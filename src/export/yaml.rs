//! YAML Export functionality
//!
//! Same snapshot as the JSON export, in a human-readable form.

use std::io::Write;

use crate::error::{TallyError, TallyResult};
use crate::export::json::FullExport;
use crate::storage::Storage;

/// Export the full database to YAML format
pub fn export_full_yaml<W: Write>(storage: &Storage, mut writer: W) -> TallyResult<()> {
    let export = FullExport::from_storage(storage)?;

    let header = format!(
        "# Tally Full Export\n# Generated: {}\n# App Version: {}\n\n",
        export.exported_at, export.app_version
    );
    writer
        .write_all(header.as_bytes())
        .map_err(|e| TallyError::Export(e.to_string()))?;

    serde_yaml::to_writer(writer, &export).map_err(|e| TallyError::Export(e.to_string()))?;

    tracing::info!(
        transactions = export.metadata.transaction_count,
        "exported YAML snapshot"
    );
    Ok(())
}

/// Read a YAML export back and validate it
pub fn import_from_yaml(yaml_str: &str) -> TallyResult<FullExport> {
    let export: FullExport =
        serde_yaml::from_str(yaml_str).map_err(|e| TallyError::Import(e.to_string()))?;

    export.validate().map_err(TallyError::Import)?;

    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use crate::models::{Category, Money, Transaction};
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
    fn test_yaml_export_and_read_back() {
        let (_temp_dir, storage) = create_test_storage();

        let cat = Category::new("Groceries");
        storage.categories.upsert_category(cat.clone()).unwrap();
        storage
            .transactions
            .upsert(Transaction::expense(
                NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
                Money::from_cents(5000),
                "Corner shop",
                Some(cat.id),
            ))
            .unwrap();

        let mut yaml_output = Vec::new();
        export_full_yaml(&storage, &mut yaml_output).unwrap();
        let yaml_string = String::from_utf8(yaml_output).unwrap();

        assert!(yaml_string.starts_with("# Tally Full Export"));
        assert!(yaml_string.contains("Corner shop"));

        // YAML comments are ignored by the parser
        let imported = import_from_yaml(&yaml_string).unwrap();
        assert_eq!(imported.categories[0].name, "Groceries");
        assert_eq!(imported.transactions.len(), 1);
    }
}
