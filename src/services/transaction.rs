//! Transaction service
//!
//! Business logic for recording, editing and querying expenses and income.

use chrono::{NaiveDate, Utc};

use crate::error::{TallyError, TallyResult};
use crate::models::{
    CategoryId, Money, SubcategoryId, TagId, Transaction, TransactionId, TransactionKind,
};
use crate::storage::Storage;

use super::filter::{self, FilterContext, SortSpec, TransactionFilter};

/// Service for transaction management
pub struct TransactionService<'a> {
    storage: &'a Storage,
}

/// Input for creating a new transaction
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    pub kind: TransactionKind,
    pub date: NaiveDate,
    pub amount: Money,
    pub description: String,
    pub category_id: Option<CategoryId>,
    pub subcategory_id: Option<SubcategoryId>,
    pub source: String,
    /// Tag names; missing tags are created
    pub tags: Vec<String>,
    pub notes: String,
}

impl CreateTransactionInput {
    pub fn new(kind: TransactionKind, date: NaiveDate, amount: Money) -> Self {
        Self {
            kind,
            date,
            amount,
            description: String::new(),
            category_id: None,
            subcategory_id: None,
            source: String::new(),
            tags: Vec::new(),
            notes: String::new(),
        }
    }

    pub fn expense(date: NaiveDate, amount: Money, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::new(TransactionKind::Expense, date, amount)
        }
    }

    pub fn income(date: NaiveDate, amount: Money, source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::new(TransactionKind::Income, date, amount)
        }
    }
}

/// Changes to apply to an existing transaction; `None` leaves a field as is
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    pub kind: Option<TransactionKind>,
    pub date: Option<NaiveDate>,
    pub amount: Option<Money>,
    pub description: Option<String>,
    /// `Some(None)` clears the category (and its sub-category)
    pub category_id: Option<Option<CategoryId>>,
    /// `Some(None)` clears the sub-category
    pub subcategory_id: Option<Option<SubcategoryId>>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

impl UpdateTransactionInput {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.date.is_none()
            && self.amount.is_none()
            && self.description.is_none()
            && self.category_id.is_none()
            && self.subcategory_id.is_none()
            && self.source.is_none()
            && self.notes.is_none()
    }
}

/// Aggregate figures over a set of transactions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub income: Money,
    pub expenses: Money,
    /// income - expenses
    pub net: Money,
    pub count: usize,
}

impl<'a> TransactionService<'a> {
    /// Create a new transaction service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new transaction
    pub fn create(&self, input: CreateTransactionInput) -> TallyResult<Transaction> {
        let (category_id, subcategory_id) =
            self.resolve_category_pair(input.category_id, input.subcategory_id)?;

        let mut txn = Transaction::new(input.kind, input.date, input.amount);
        txn.description = input.description.trim().to_string();
        txn.source = input.source.trim().to_string();
        txn.notes = input.notes;
        txn.category_id = category_id;
        txn.subcategory_id = subcategory_id;

        // Tags are created only once the rest of the transaction is valid
        txn.validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        let tag_ids = self.get_or_create_tags(&input.tags)?;
        for tag_id in tag_ids {
            txn.add_tag(tag_id);
        }

        self.storage.transactions.upsert(txn.clone())?;
        self.storage.transactions.save()?;
        if !input.tags.is_empty() {
            self.storage.tags.save()?;
        }

        tracing::info!(id = %txn.id, kind = %txn.kind, amount = %txn.amount, "created transaction");
        Ok(txn)
    }

    /// Get a transaction by ID
    pub fn get(&self, id: TransactionId) -> TallyResult<Option<Transaction>> {
        self.storage.transactions.get(id)
    }

    /// Find a transaction by full ID or by the short form shown in lists
    ///
    /// A prefix matching more than one transaction is a validation error.
    pub fn find(&self, identifier: &str) -> TallyResult<Option<Transaction>> {
        if let Ok(id) = identifier.trim().parse::<TransactionId>() {
            return self.storage.transactions.get(id);
        }

        let mut matches = self
            .storage
            .transactions
            .get_all()?
            .into_iter()
            .filter(|t| t.id.matches_prefix(identifier));

        let first = matches.next();
        if first.is_some() && matches.next().is_some() {
            return Err(TallyError::Validation(format!(
                "'{}' matches more than one transaction; use more characters",
                identifier
            )));
        }
        Ok(first)
    }

    /// Find a transaction or fail with a not-found error
    pub fn resolve(&self, identifier: &str) -> TallyResult<Transaction> {
        self.find(identifier)?
            .ok_or_else(|| TallyError::transaction_not_found(identifier))
    }

    /// List transactions matching a filter, sorted and optionally truncated
    pub fn list(
        &self,
        filter: &TransactionFilter,
        sort: &SortSpec,
        limit: Option<usize>,
    ) -> TallyResult<Vec<Transaction>> {
        let ctx = FilterContext::from_storage(self.storage)?;
        let candidates = match (filter.category_id, filter.tag_id) {
            (Some(cat), _) => self.storage.transactions.get_by_category(cat)?,
            (None, Some(tag)) => self.storage.transactions.get_by_tag(tag)?,
            (None, None) => self.storage.transactions.get_all()?,
        };
        Ok(filter::apply(candidates, filter, sort, limit, &ctx))
    }

    /// Update a transaction
    pub fn update(
        &self,
        id: TransactionId,
        input: UpdateTransactionInput,
    ) -> TallyResult<Transaction> {
        let mut txn = self
            .storage
            .transactions
            .get(id)?
            .ok_or_else(|| TallyError::transaction_not_found(id.to_string()))?;

        if let Some(kind) = input.kind {
            if kind != txn.kind && kind.is_income() {
                txn.category_id = None;
                txn.subcategory_id = None;
            }
            txn.kind = kind;
        }
        if let Some(date) = input.date {
            txn.date = date;
        }
        if let Some(amount) = input.amount {
            txn.amount = amount;
        }
        if let Some(description) = input.description {
            txn.description = description.trim().to_string();
        }
        if let Some(source) = input.source {
            txn.source = source.trim().to_string();
        }
        if let Some(notes) = input.notes {
            txn.notes = notes;
        }

        let category_id = input.category_id.unwrap_or(txn.category_id);
        let subcategory_id = match input.subcategory_id {
            Some(sub) => sub,
            // A sub-category never outlives a change of category
            None if category_id != txn.category_id => None,
            None => txn.subcategory_id,
        };
        // A sub-category given on its own brings its parent along
        let category_id = if input.category_id.is_none() && subcategory_id.is_some() {
            None
        } else {
            category_id
        };
        let (category_id, subcategory_id) =
            self.resolve_category_pair(category_id, subcategory_id)?;
        txn.category_id = category_id;
        txn.subcategory_id = subcategory_id;

        txn.updated_at = Utc::now();
        txn.validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        self.storage.transactions.upsert(txn.clone())?;
        self.storage.transactions.save()?;

        tracing::info!(id = %txn.id, "updated transaction");
        Ok(txn)
    }

    /// Delete a transaction
    pub fn delete(&self, id: TransactionId) -> TallyResult<Transaction> {
        let txn = self
            .storage
            .transactions
            .get(id)?
            .ok_or_else(|| TallyError::transaction_not_found(id.to_string()))?;

        self.storage.transactions.delete(id)?;
        self.storage.transactions.save()?;

        tracing::info!(id = %id, "deleted transaction");
        Ok(txn)
    }

    /// Attach tags by name, creating missing tags
    pub fn add_tags(&self, id: TransactionId, names: &[String]) -> TallyResult<Transaction> {
        let mut txn = self
            .storage
            .transactions
            .get(id)?
            .ok_or_else(|| TallyError::transaction_not_found(id.to_string()))?;

        let tag_ids = self.get_or_create_tags(names)?;
        let added = tag_ids.into_iter().filter(|t| txn.add_tag(*t)).count();

        self.storage.tags.save()?;
        if added > 0 {
            self.storage.transactions.upsert(txn.clone())?;
            self.storage.transactions.save()?;
        }

        tracing::debug!(id = %id, added, "tagged transaction");
        Ok(txn)
    }

    /// Detach tags by name; unknown tag names are an error
    pub fn remove_tags(&self, id: TransactionId, names: &[String]) -> TallyResult<Transaction> {
        let mut txn = self
            .storage
            .transactions
            .get(id)?
            .ok_or_else(|| TallyError::transaction_not_found(id.to_string()))?;

        let mut removed = 0;
        for name in names {
            let tag = self
                .storage
                .tags
                .get_by_name(name)?
                .ok_or_else(|| TallyError::tag_not_found(name.clone()))?;
            if txn.remove_tag(tag.id) {
                removed += 1;
            }
        }

        if removed > 0 {
            self.storage.transactions.upsert(txn.clone())?;
            self.storage.transactions.save()?;
        }

        tracing::debug!(id = %id, removed, "untagged transaction");
        Ok(txn)
    }

    /// Sum income and expenses
    pub fn totals(transactions: &[Transaction]) -> Totals {
        let income: Money = transactions
            .iter()
            .filter(|t| t.is_income())
            .map(|t| t.amount)
            .sum();
        let expenses: Money = transactions
            .iter()
            .filter(|t| t.is_expense())
            .map(|t| t.amount)
            .sum();

        Totals {
            income,
            expenses,
            net: income - expenses,
            count: transactions.len(),
        }
    }

    /// Check that the category exists and owns the sub-category
    ///
    /// A sub-category given without a category implies its parent.
    fn resolve_category_pair(
        &self,
        category_id: Option<CategoryId>,
        subcategory_id: Option<SubcategoryId>,
    ) -> TallyResult<(Option<CategoryId>, Option<SubcategoryId>)> {
        if let Some(cat_id) = category_id {
            self.storage
                .categories
                .get_category(cat_id)?
                .ok_or_else(|| TallyError::category_not_found(cat_id.to_string()))?;
        }

        let Some(sub_id) = subcategory_id else {
            return Ok((category_id, None));
        };

        let sub = self
            .storage
            .categories
            .get_subcategory(sub_id)?
            .ok_or_else(|| TallyError::subcategory_not_found(sub_id.to_string()))?;

        match category_id {
            Some(cat_id) if cat_id != sub.category_id => Err(TallyError::Validation(format!(
                "Subcategory '{}' does not belong to the selected category",
                sub.name
            ))),
            _ => Ok((Some(sub.category_id), Some(sub_id))),
        }
    }

    fn get_or_create_tags(&self, names: &[String]) -> TallyResult<Vec<TagId>> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            let (tag, _) = self.storage.tags.get_or_create(name)?;
            if !ids.contains(&tag.id) {
                ids.push(tag.id);
            }
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use crate::models::{Category, Subcategory};
    use crate::services::filter::SortKey;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn setup_category(storage: &Storage, name: &str, subs: &[&str]) -> (CategoryId, Vec<SubcategoryId>) {
        let category = Category::new(name);
        let id = category.id;
        storage.categories.upsert_category(category).unwrap();
        let sub_ids = subs
            .iter()
            .map(|s| {
                let sub = Subcategory::new(id, *s);
                let sub_id = sub.id;
                storage.categories.upsert_subcategory(sub).unwrap();
                sub_id
            })
            .collect();
        (id, sub_ids)
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[test]
    fn test_create_expense_with_tags() {
        let (_temp_dir, storage) = create_test_storage();
        let (food, subs) = setup_category(&storage, "Food", &["Groceries"]);
        let service = TransactionService::new(&storage);

        let mut input = CreateTransactionInput::expense(date(15), Money::from_cents(4250), " Market ");
        input.category_id = Some(food);
        input.subcategory_id = Some(subs[0]);
        input.tags = vec!["weekly".into(), "Weekly".into(), "".into()];

        let txn = service.create(input).unwrap();
        assert_eq!(txn.description, "Market");
        assert_eq!(txn.tag_ids.len(), 1);
        assert_eq!(storage.tags.count().unwrap(), 1);
        assert_eq!(storage.transactions.count().unwrap(), 1);
    }

    #[test]
    fn test_subcategory_implies_category() {
        let (_temp_dir, storage) = create_test_storage();
        let (food, subs) = setup_category(&storage, "Food", &["Coffee"]);
        let service = TransactionService::new(&storage);

        let mut input = CreateTransactionInput::expense(date(2), Money::from_cents(350), "Latte");
        input.subcategory_id = Some(subs[0]);

        let txn = service.create(input).unwrap();
        assert_eq!(txn.category_id, Some(food));
    }

    #[test]
    fn test_subcategory_must_belong_to_category() {
        let (_temp_dir, storage) = create_test_storage();
        let (_, food_subs) = setup_category(&storage, "Food", &["Groceries"]);
        let (housing, _) = setup_category(&storage, "Housing", &[]);
        let service = TransactionService::new(&storage);

        let mut input = CreateTransactionInput::expense(date(2), Money::from_cents(350), "Mixed");
        input.category_id = Some(housing);
        input.subcategory_id = Some(food_subs[0]);

        assert!(service.create(input).unwrap_err().is_validation());
    }

    #[test]
    fn test_income_rejects_category() {
        let (_temp_dir, storage) = create_test_storage();
        let (food, _) = setup_category(&storage, "Food", &[]);
        let service = TransactionService::new(&storage);

        let mut input = CreateTransactionInput::income(date(1), Money::from_cents(100000), "Salary");
        input.category_id = Some(food);

        assert!(service.create(input).unwrap_err().is_validation());
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TransactionService::new(&storage);

        let input = CreateTransactionInput::expense(date(1), Money::zero(), "Nothing");
        assert!(service.create(input).unwrap_err().is_validation());
        assert_eq!(storage.transactions.count().unwrap(), 0);
    }

    #[test]
    fn test_long_description_rejected_before_tags_exist() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TransactionService::new(&storage);

        let mut input = CreateTransactionInput::expense(date(1), Money::from_cents(100), "a".repeat(201));
        input.tags = vec!["orphan".into()];
        assert!(service.create(input).unwrap_err().is_validation());
        assert_eq!(storage.transactions.count().unwrap(), 0);
        assert_eq!(storage.tags.count().unwrap(), 0);

        let input = CreateTransactionInput::expense(date(1), Money::from_cents(100), "a".repeat(200));
        assert_eq!(service.create(input).unwrap().description.len(), 200);
    }

    #[test]
    fn test_unknown_category_is_not_found() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TransactionService::new(&storage);

        let mut input = CreateTransactionInput::expense(date(1), Money::from_cents(100), "x");
        input.category_id = Some(CategoryId::new());
        assert!(service.create(input).unwrap_err().is_not_found());
    }

    #[test]
    fn test_find_by_short_id() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TransactionService::new(&storage);

        let txn = service
            .create(CreateTransactionInput::expense(date(1), Money::from_cents(100), "Bread"))
            .unwrap();

        let short = txn.id.to_string();
        assert_eq!(service.find(&short).unwrap().unwrap().id, txn.id);
        assert_eq!(
            service.find(&txn.id.as_uuid().to_string()).unwrap().unwrap().id,
            txn.id
        );
        assert!(service.find("txn-zz").unwrap().is_none());
        assert!(service.resolve("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_update_changes_category_and_clears_subcategory() {
        let (_temp_dir, storage) = create_test_storage();
        let (food, food_subs) = setup_category(&storage, "Food", &["Groceries"]);
        let (housing, _) = setup_category(&storage, "Housing", &[]);
        let service = TransactionService::new(&storage);

        let mut input = CreateTransactionInput::expense(date(5), Money::from_cents(2000), "Shop");
        input.category_id = Some(food);
        input.subcategory_id = Some(food_subs[0]);
        let txn = service.create(input).unwrap();

        let updated = service
            .update(
                txn.id,
                UpdateTransactionInput {
                    category_id: Some(Some(housing)),
                    amount: Some(Money::from_cents(2500)),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.category_id, Some(housing));
        assert_eq!(updated.subcategory_id, None);
        assert_eq!(updated.amount.cents(), 2500);
        assert!(storage.transactions.get_by_category(food).unwrap().is_empty());
    }

    #[test]
    fn test_update_to_income_drops_category() {
        let (_temp_dir, storage) = create_test_storage();
        let (food, _) = setup_category(&storage, "Food", &[]);
        let service = TransactionService::new(&storage);

        let mut input = CreateTransactionInput::expense(date(5), Money::from_cents(2000), "Refund");
        input.category_id = Some(food);
        let txn = service.create(input).unwrap();

        let updated = service
            .update(
                txn.id,
                UpdateTransactionInput {
                    kind: Some(TransactionKind::Income),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(updated.is_income());
        assert!(updated.category_id.is_none());
    }

    #[test]
    fn test_tag_and_untag() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TransactionService::new(&storage);

        let txn = service
            .create(CreateTransactionInput::expense(date(1), Money::from_cents(100), "Taxi"))
            .unwrap();

        let tagged = service
            .add_tags(txn.id, &["work".into(), "reimbursable".into()])
            .unwrap();
        assert_eq!(tagged.tag_ids.len(), 2);

        let untagged = service.remove_tags(txn.id, &["WORK".into()]).unwrap();
        assert_eq!(untagged.tag_ids.len(), 1);

        assert!(service
            .remove_tags(txn.id, &["missing".into()])
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_list_with_filter_and_sort() {
        let (_temp_dir, storage) = create_test_storage();
        let (food, _) = setup_category(&storage, "Food", &[]);
        let service = TransactionService::new(&storage);

        for (day, cents) in [(1, 500), (2, 1500), (3, 1000)] {
            let mut input = CreateTransactionInput::expense(date(day), Money::from_cents(cents), "x");
            input.category_id = Some(food);
            service.create(input).unwrap();
        }
        service
            .create(CreateTransactionInput::income(date(4), Money::from_cents(9999), "Job"))
            .unwrap();

        let filter = TransactionFilter::new().category(food);
        let list = service
            .list(&filter, &SortSpec::descending(SortKey::Amount), Some(2))
            .unwrap();
        let amounts: Vec<_> = list.iter().map(|t| t.amount.cents()).collect();
        assert_eq!(amounts, vec![1500, 1000]);
    }

    #[test]
    fn test_delete() {
        let (_temp_dir, storage) = create_test_storage();
        let service = TransactionService::new(&storage);

        let txn = service
            .create(CreateTransactionInput::expense(date(1), Money::from_cents(100), "Gum"))
            .unwrap();
        service.delete(txn.id).unwrap();
        assert!(service.get(txn.id).unwrap().is_none());
        assert!(service.delete(txn.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_totals() {
        let txns = vec![
            Transaction::income(date(1), Money::from_cents(300000), "Salary"),
            Transaction::expense(date(2), Money::from_cents(95000), "Rent", None),
            Transaction::expense(date(3), Money::from_cents(5000), "Food", None),
        ];
        let totals = TransactionService::totals(&txns);
        assert_eq!(totals.income.cents(), 300000);
        assert_eq!(totals.expenses.cents(), 100000);
        assert_eq!(totals.net.cents(), 200000);
        assert_eq!(totals.count, 3);
    }
}
