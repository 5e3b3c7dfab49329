//! JSON Export functionality
//!
//! Exports every collection to one JSON document with schema versioning.

use std::collections::HashSet;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{TallyError, TallyResult};
use crate::models::{Budget, Category, Subcategory, Tag, Transaction};
use crate::storage::Storage;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Full database export structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    pub categories: Vec<Category>,
    pub subcategories: Vec<Subcategory>,
    pub tags: Vec<Tag>,
    pub transactions: Vec<Transaction>,
    pub budgets: Vec<Budget>,

    pub metadata: ExportMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub transaction_count: usize,
    pub expense_count: usize,
    pub income_count: usize,
    pub category_count: usize,
    pub subcategory_count: usize,
    pub tag_count: usize,
    pub budget_count: usize,

    /// Date of the earliest transaction
    pub earliest_transaction: Option<String>,

    /// Date of the latest transaction
    pub latest_transaction: Option<String>,
}

impl FullExport {
    /// Snapshot every collection in storage
    pub fn from_storage(storage: &Storage) -> TallyResult<Self> {
        let categories = storage.categories.get_all_categories()?;
        let subcategories = storage.categories.get_all_subcategories()?;
        let tags = storage.tags.get_all()?;
        let mut transactions = storage.transactions.get_all()?;
        transactions.reverse();
        let budgets = storage.budgets.get_all()?;

        let metadata = ExportMetadata {
            transaction_count: transactions.len(),
            expense_count: transactions.iter().filter(|t| t.is_expense()).count(),
            income_count: transactions.iter().filter(|t| t.is_income()).count(),
            category_count: categories.len(),
            subcategory_count: subcategories.len(),
            tag_count: tags.len(),
            budget_count: budgets.len(),
            earliest_transaction: transactions.iter().map(|t| t.date).min().map(|d| d.to_string()),
            latest_transaction: transactions.iter().map(|t| t.date).max().map(|d| d.to_string()),
        };

        Ok(Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            categories,
            subcategories,
            tags,
            transactions,
            budgets,
            metadata,
        })
    }

    /// Check the schema version and that every reference resolves
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        let category_ids: HashSet<_> = self.categories.iter().map(|c| c.id).collect();
        let subcategory_ids: HashSet<_> = self.subcategories.iter().map(|s| s.id).collect();
        let tag_ids: HashSet<_> = self.tags.iter().map(|t| t.id).collect();

        for sub in &self.subcategories {
            if !category_ids.contains(&sub.category_id) {
                return Err(format!(
                    "Subcategory {} references unknown category {}",
                    sub.id, sub.category_id
                ));
            }
        }

        for txn in &self.transactions {
            if let Some(cat_id) = txn.category_id {
                if !category_ids.contains(&cat_id) {
                    return Err(format!(
                        "Transaction {} references unknown category {}",
                        txn.id, cat_id
                    ));
                }
            }
            if let Some(sub_id) = txn.subcategory_id {
                if !subcategory_ids.contains(&sub_id) {
                    return Err(format!(
                        "Transaction {} references unknown subcategory {}",
                        txn.id, sub_id
                    ));
                }
            }
            if let Some(tag_id) = txn.tag_ids.iter().find(|id| !tag_ids.contains(id)) {
                return Err(format!(
                    "Transaction {} references unknown tag {}",
                    txn.id, tag_id
                ));
            }
        }

        for budget in &self.budgets {
            if !category_ids.contains(&budget.category_id) {
                return Err(format!(
                    "Budget for {} references unknown category {}",
                    budget.month, budget.category_id
                ));
            }
        }

        Ok(())
    }
}

/// Export the full database to JSON
pub fn export_full_json<W: Write>(storage: &Storage, writer: W, pretty: bool) -> TallyResult<()> {
    let export = FullExport::from_storage(storage)?;

    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(|e| TallyError::Export(e.to_string()))?;

    tracing::info!(
        transactions = export.metadata.transaction_count,
        "exported JSON snapshot"
    );
    Ok(())
}

/// Read a JSON export back and validate it
pub fn import_from_json(json_str: &str) -> TallyResult<FullExport> {
    let export: FullExport =
        serde_json::from_str(json_str).map_err(|e| TallyError::Import(e.to_string()))?;

    export.validate().map_err(TallyError::Import)?;

    Ok(export)
}
