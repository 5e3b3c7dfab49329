//! Transaction filtering and sorting
//!
//! A [`TransactionFilter`] is a set of independent, optional predicates.
//! Unset predicates match everything; set predicates are AND-ed together and
//! evaluated in declaration order, stopping at the first miss. Sorting uses a
//! single key and a stable sort, so rows that compare equal keep the order they
//! had after filtering.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::TallyResult;
use crate::models::{
    CategoryId, Money, SubcategoryId, TagId, Transaction, TransactionKind,
};
use crate::storage::Storage;

/// Filter criteria for transaction lists
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    /// Inclusive lower bound
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound
    pub end_date: Option<NaiveDate>,
    pub category_id: Option<CategoryId>,
    pub subcategory_id: Option<SubcategoryId>,
    /// Only expenses without a category
    pub uncategorized: bool,
    /// Case-insensitive substring of the income source
    pub source: Option<String>,
    pub tag_id: Option<TagId>,
    /// Inclusive, compared against the positive amount
    pub min_amount: Option<Money>,
    /// Inclusive, compared against the positive amount
    pub max_amount: Option<Money>,
    /// Case-insensitive free text over descriptions, notes, sources and names
    pub search: Option<String>,
}

impl TransactionFilter {
    /// Create a new empty filter
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    /// Filter by date range (both ends inclusive)
    pub fn date_range(self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date(start).end_date(end)
    }

    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn subcategory(mut self, subcategory_id: SubcategoryId) -> Self {
        self.subcategory_id = Some(subcategory_id);
        self
    }

    pub fn uncategorized(mut self) -> Self {
        self.uncategorized = true;
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn tag(mut self, tag_id: TagId) -> Self {
        self.tag_id = Some(tag_id);
        self
    }

    pub fn min_amount(mut self, amount: Money) -> Self {
        self.min_amount = Some(amount);
        self
    }

    pub fn max_amount(mut self, amount: Money) -> Self {
        self.max_amount = Some(amount);
        self
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    /// True when no predicate is set
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.category_id.is_none()
            && self.subcategory_id.is_none()
            && !self.uncategorized
            && self.source.as_deref().map_or(true, |s| s.trim().is_empty())
            && self.tag_id.is_none()
            && self.min_amount.is_none()
            && self.max_amount.is_none()
            && self.search.as_deref().map_or(true, |s| s.trim().is_empty())
    }

    /// Check a transaction against every set predicate
    pub fn matches(&self, txn: &Transaction, ctx: &FilterContext) -> bool {
        if let Some(kind) = self.kind {
            if txn.kind != kind {
                return false;
            }
        }
        if let Some(start) = self.start_date {
            if txn.date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if txn.date > end {
                return false;
            }
        }
        if let Some(cat) = self.category_id {
            if txn.category_id != Some(cat) {
                return false;
            }
        }
        if let Some(sub) = self.subcategory_id {
            if txn.subcategory_id != Some(sub) {
                return false;
            }
        }
        if self.uncategorized && !txn.is_uncategorized() {
            return false;
        }
        if let Some(source) = non_blank(&self.source) {
            if !contains_ci(&txn.source, source) {
                return false;
            }
        }
        if let Some(tag) = self.tag_id {
            if !txn.has_tag(tag) {
                return false;
            }
        }
        if let Some(min) = self.min_amount {
            if txn.amount < min {
                return false;
            }
        }
        if let Some(max) = self.max_amount {
            if txn.amount > max {
                return false;
            }
        }
        if let Some(query) = non_blank(&self.search) {
            if !search_matches(txn, query, ctx) {
                return false;
            }
        }
        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn search_matches(txn: &Transaction, query: &str, ctx: &FilterContext) -> bool {
    let query = query.to_lowercase();
    let hit = |s: &str| s.to_lowercase().contains(&query);

    hit(&txn.description)
        || hit(&txn.notes)
        || hit(&txn.source)
        || txn
            .category_id
            .and_then(|id| ctx.category_name(id))
            .is_some_and(hit)
        || txn
            .subcategory_id
            .and_then(|id| ctx.subcategory_name(id))
            .is_some_and(hit)
        || txn
            .tag_ids
            .iter()
            .filter_map(|id| ctx.tag_name(*id))
            .any(hit)
}

/// Id-to-name lookups used by text search and name sorting
#[derive(Debug, Clone, Default)]
pub struct FilterContext {
    categories: HashMap<CategoryId, String>,
    subcategories: HashMap<SubcategoryId, String>,
    tags: HashMap<TagId, String>,
}

impl FilterContext {
    /// A context with no names; name-based search and sort see nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Snapshot names from storage
    pub fn from_storage(storage: &Storage) -> TallyResult<Self> {
        let categories = storage
            .categories
            .get_all_categories()?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();
        let subcategories = storage
            .categories
            .get_all_subcategories()?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();
        let tags = storage
            .tags
            .get_all()?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect();

        Ok(Self {
            categories,
            subcategories,
            tags,
        })
    }

    pub fn with_category(mut self, id: CategoryId, name: impl Into<String>) -> Self {
        self.categories.insert(id, name.into());
        self
    }

    pub fn with_subcategory(mut self, id: SubcategoryId, name: impl Into<String>) -> Self {
        self.subcategories.insert(id, name.into());
        self
    }

    pub fn with_tag(mut self, id: TagId, name: impl Into<String>) -> Self {
        self.tags.insert(id, name.into());
        self
    }

    pub fn category_name(&self, id: CategoryId) -> Option<&str> {
        self.categories.get(&id).map(String::as_str)
    }

    pub fn subcategory_name(&self, id: SubcategoryId) -> Option<&str> {
        self.subcategories.get(&id).map(String::as_str)
    }

    pub fn tag_name(&self, id: TagId) -> Option<&str> {
        self.tags.get(&id).map(String::as_str)
    }

    /// Tag names of a transaction in attachment order
    pub fn tag_names(&self, txn: &Transaction) -> Vec<String> {
        txn.tag_ids
            .iter()
            .filter_map(|id| self.tag_name(*id))
            .map(str::to_string)
            .collect()
    }
}

/// Sort key for transaction lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Date,
    Amount,
    Description,
    Category,
    Created,
}

impl SortKey {
    pub fn all() -> &'static [Self] {
        &[
            Self::Date,
            Self::Amount,
            Self::Description,
            Self::Category,
            Self::Created,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Amount => "amount",
            Self::Description => "description",
            Self::Category => "category",
            Self::Created => "created",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "amount" => Ok(Self::Amount),
            "description" | "desc" => Ok(Self::Description),
            "category" => Ok(Self::Category),
            "created" => Ok(Self::Created),
            other => Err(format!(
                "Unknown sort key '{}'. Use one of: date, amount, description, category, created",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// How to order a transaction list (default: newest first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    pub fn ascending(key: SortKey) -> Self {
        Self::new(key, SortDirection::Ascending)
    }

    pub fn descending(key: SortKey) -> Self {
        Self::new(key, SortDirection::Descending)
    }

    /// Compare two transactions under this key and direction
    pub fn compare(&self, a: &Transaction, b: &Transaction, ctx: &FilterContext) -> Ordering {
        let ordering = match self.key {
            SortKey::Date => a.date.cmp(&b.date),
            SortKey::Amount => a.amount.cmp(&b.amount),
            SortKey::Description => a.description.to_lowercase().cmp(&b.description.to_lowercase()),
            SortKey::Category => {
                let name = |t: &Transaction| {
                    t.category_id
                        .and_then(|id| ctx.category_name(id))
                        .map(str::to_lowercase)
                };
                match (name(a), name(b)) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            }
            SortKey::Created => a.created_at.cmp(&b.created_at),
        };

        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    /// Stable in-place sort
    pub fn sort(&self, transactions: &mut [Transaction], ctx: &FilterContext) {
        transactions.sort_by(|a, b| self.compare(a, b, ctx));
    }
}

/// Filter, then sort, then truncate
pub fn apply(
    transactions: Vec<Transaction>,
    filter: &TransactionFilter,
    sort: &SortSpec,
    limit: Option<usize>,
    ctx: &FilterContext,
) -> Vec<Transaction> {
    let mut result: Vec<_> = transactions
        .into_iter()
        .filter(|t| filter.matches(t, ctx))
        .collect();

    sort.sort(&mut result, ctx);

    if let Some(limit) = limit {
        result.truncate(limit);
    }

    result
}
