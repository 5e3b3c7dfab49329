//! Transaction repository for JSON storage
//!
//! Manages loading and saving transactions to transactions.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::NaiveDate;

use crate::error::TallyError;
use crate::models::{CategoryId, TagId, Transaction, TransactionId};

use super::file_io::{read_json, write_json_atomic};
use super::lock_error;

/// Serializable transaction data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct TransactionData {
    transactions: Vec<Transaction>,
}

/// Repository for transaction persistence with indexing
pub struct TransactionRepository {
    path: PathBuf,
    data: RwLock<HashMap<TransactionId, Transaction>>,
    /// Index: category_id -> transaction_ids
    by_category: RwLock<HashMap<CategoryId, Vec<TransactionId>>>,
    /// Index: tag_id -> transaction_ids
    by_tag: RwLock<HashMap<TagId, Vec<TransactionId>>>,
}

type Index<K> = HashMap<K, Vec<TransactionId>>;

fn index_insert(
    by_category: &mut Index<CategoryId>,
    by_tag: &mut Index<TagId>,
    txn: &Transaction,
) {
    if let Some(cat_id) = txn.category_id {
        by_category.entry(cat_id).or_default().push(txn.id);
    }
    for tag_id in &txn.tag_ids {
        by_tag.entry(*tag_id).or_default().push(txn.id);
    }
}

fn index_remove(
    by_category: &mut Index<CategoryId>,
    by_tag: &mut Index<TagId>,
    txn: &Transaction,
) {
    if let Some(cat_id) = txn.category_id {
        if let Some(ids) = by_category.get_mut(&cat_id) {
            ids.retain(|&id| id != txn.id);
        }
    }
    for tag_id in &txn.tag_ids {
        if let Some(ids) = by_tag.get_mut(tag_id) {
            ids.retain(|&id| id != txn.id);
        }
    }
}

/// Newest first, then most recently created
fn sort_newest_first(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
}

impl TransactionRepository {
    /// Create a new transaction repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_category: RwLock::new(HashMap::new()),
            by_tag: RwLock::new(HashMap::new()),
        }
    }

    /// Load transactions from disk and build indexes
    pub fn load(&self) -> Result<(), TallyError> {
        let file_data: TransactionData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(lock_error)?;
        let mut by_category = self.by_category.write().map_err(lock_error)?;
        let mut by_tag = self.by_tag.write().map_err(lock_error)?;

        data.clear();
        by_category.clear();
        by_tag.clear();

        for txn in file_data.transactions {
            index_insert(&mut by_category, &mut by_tag, &txn);
            data.insert(txn.id, txn);
        }

        tracing::debug!(count = data.len(), "loaded transactions");
        Ok(())
    }

    /// Save transactions to disk
    pub fn save(&self) -> Result<(), TallyError> {
        let data = self.data.read().map_err(lock_error)?;

        let mut transactions: Vec<_> = data.values().cloned().collect();
        sort_newest_first(&mut transactions);

        write_json_atomic(&self.path, &TransactionData { transactions })
    }

    /// Get a transaction by ID
    pub fn get(&self, id: TransactionId) -> Result<Option<Transaction>, TallyError> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.get(&id).cloned())
    }

    /// Get all transactions, newest first
    pub fn get_all(&self) -> Result<Vec<Transaction>, TallyError> {
        let data = self.data.read().map_err(lock_error)?;

        let mut transactions: Vec<_> = data.values().cloned().collect();
        sort_newest_first(&mut transactions);
        Ok(transactions)
    }

    fn collect_indexed<K>(
        &self,
        index: &RwLock<Index<K>>,
        key: &K,
    ) -> Result<Vec<Transaction>, TallyError>
    where
        K: std::hash::Hash + Eq,
    {
        let data = self.data.read().map_err(lock_error)?;
        let index = index.read().map_err(lock_error)?;

        let ids = index.get(key).map(|v| v.as_slice()).unwrap_or(&[]);
        let mut transactions: Vec<_> = ids.iter().filter_map(|id| data.get(id).cloned()).collect();
        sort_newest_first(&mut transactions);
        Ok(transactions)
    }

    /// Get transactions for a category
    pub fn get_by_category(&self, category_id: CategoryId) -> Result<Vec<Transaction>, TallyError> {
        self.collect_indexed(&self.by_category, &category_id)
    }

    /// Get transactions carrying a tag
    pub fn get_by_tag(&self, tag_id: TagId) -> Result<Vec<Transaction>, TallyError> {
        self.collect_indexed(&self.by_tag, &tag_id)
    }

    /// Get transactions in a date range (inclusive on both ends)
    pub fn get_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>, TallyError> {
        let all = self.get_all()?;
        Ok(all
            .into_iter()
            .filter(|t| t.date >= start && t.date <= end)
            .collect())
    }

    /// Insert or update a transaction
    pub fn upsert(&self, txn: Transaction) -> Result<(), TallyError> {
        let mut data = self.data.write().map_err(lock_error)?;
        let mut by_category = self.by_category.write().map_err(lock_error)?;
        let mut by_tag = self.by_tag.write().map_err(lock_error)?;

        if let Some(old) = data.get(&txn.id) {
            index_remove(&mut by_category, &mut by_tag, old);
        }
        index_insert(&mut by_category, &mut by_tag, &txn);

        data.insert(txn.id, txn);
        Ok(())
    }

    /// Delete a transaction
    pub fn delete(&self, id: TransactionId) -> Result<bool, TallyError> {
        let mut data = self.data.write().map_err(lock_error)?;
        let mut by_category = self.by_category.write().map_err(lock_error)?;
        let mut by_tag = self.by_tag.write().map_err(lock_error)?;

        match data.remove(&id) {
            Some(txn) => {
                index_remove(&mut by_category, &mut by_tag, &txn);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Find transaction by import ID
    ///
    /// Transactions entered by hand have no stored import ID; their
    /// fingerprint is computed on the fly so re-importing an export matches.
    pub fn find_by_import_id(&self, import_id: &str) -> Result<Option<Transaction>, TallyError> {
        let data = self.data.read().map_err(lock_error)?;

        Ok(data
            .values()
            .find(|t| match t.import_id.as_deref() {
                Some(stored) => stored == import_id,
                None => t.generate_import_id() == import_id,
            })
            .cloned())
    }

    /// Count transactions
    pub fn count(&self) -> Result<usize, TallyError> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.len())
    }
}
