//! Transaction model
//!
//! A transaction is either an expense (categorized spending) or income
//! (money received from a source). Amounts are stored as positive
//! magnitudes; the kind carries the direction.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use super::ids::{CategoryId, SubcategoryId, TagId, TransactionId};
use super::money::Money;

/// Maximum length of a transaction description
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// Whether money left or entered the user's pocket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    #[default]
    Expense,
    Income,
}

impl TransactionKind {
    pub fn is_expense(&self) -> bool {
        matches!(self, Self::Expense)
    }

    pub fn is_income(&self) -> bool {
        matches!(self, Self::Income)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expense => write!(f, "Expense"),
            Self::Income => write!(f, "Income"),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "expense" | "expenses" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            other => Err(format!(
                "Invalid transaction type: '{}'. Use expense or income",
                other
            )),
        }
    }
}

/// A recorded expense or income
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,

    /// Expense or income
    pub kind: TransactionKind,

    /// Transaction date
    pub date: NaiveDate,

    /// Positive magnitude of the transaction
    pub amount: Money,

    /// Short free-text description ("Weekly groceries")
    #[serde(default)]
    pub description: String,

    /// Category (expenses only)
    pub category_id: Option<CategoryId>,

    /// Sub-category within `category_id` (expenses only)
    #[serde(default)]
    pub subcategory_id: Option<SubcategoryId>,

    /// Where income came from ("Salary", "Freelance")
    #[serde(default)]
    pub source: String,

    /// Tags attached to this transaction
    #[serde(default)]
    pub tag_ids: Vec<TagId>,

    /// Notes
    #[serde(default)]
    pub notes: String,

    /// Import ID for duplicate detection during CSV import
    #[serde(default)]
    pub import_id: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction
    pub fn new(kind: TransactionKind, date: NaiveDate, amount: Money) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            kind,
            date,
            amount,
            description: String::new(),
            category_id: None,
            subcategory_id: None,
            source: String::new(),
            tag_ids: Vec::new(),
            notes: String::new(),
            import_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an expense with a description and optional category
    pub fn expense(
        date: NaiveDate,
        amount: Money,
        description: impl Into<String>,
        category_id: Option<CategoryId>,
    ) -> Self {
        let mut txn = Self::new(TransactionKind::Expense, date, amount);
        txn.description = description.into();
        txn.category_id = category_id;
        txn
    }

    /// Create an income entry from a source
    pub fn income(date: NaiveDate, amount: Money, source: impl Into<String>) -> Self {
        let mut txn = Self::new(TransactionKind::Income, date, amount);
        txn.source = source.into();
        txn
    }

    pub fn is_expense(&self) -> bool {
        self.kind.is_expense()
    }

    pub fn is_income(&self) -> bool {
        self.kind.is_income()
    }

    /// Amount with direction applied (negative for expenses)
    pub fn signed_amount(&self) -> Money {
        match self.kind {
            TransactionKind::Expense => -self.amount,
            TransactionKind::Income => self.amount,
        }
    }

    /// Check if this expense has no category
    pub fn is_uncategorized(&self) -> bool {
        self.is_expense() && self.category_id.is_none()
    }

    /// Set the category, clearing any sub-category from a previous category
    pub fn set_category(&mut self, category_id: CategoryId, subcategory_id: Option<SubcategoryId>) {
        self.category_id = Some(category_id);
        self.subcategory_id = subcategory_id;
        self.updated_at = Utc::now();
    }

    pub fn clear_category(&mut self) {
        self.category_id = None;
        self.subcategory_id = None;
        self.updated_at = Utc::now();
    }

    pub fn has_tag(&self, tag_id: TagId) -> bool {
        self.tag_ids.contains(&tag_id)
    }

    /// Attach a tag; returns false if it was already attached
    pub fn add_tag(&mut self, tag_id: TagId) -> bool {
        if self.has_tag(tag_id) {
            return false;
        }
        self.tag_ids.push(tag_id);
        self.updated_at = Utc::now();
        true
    }

    /// Detach a tag; returns false if it was not attached
    pub fn remove_tag(&mut self, tag_id: TagId) -> bool {
        let before = self.tag_ids.len();
        self.tag_ids.retain(|&t| t != tag_id);
        let removed = self.tag_ids.len() != before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Validate the transaction
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if !self.amount.is_positive() {
            return Err(TransactionValidationError::NonPositiveAmount(self.amount));
        }

        if self.is_income() && (self.category_id.is_some() || self.subcategory_id.is_some()) {
            return Err(TransactionValidationError::IncomeWithCategory);
        }

        if self.subcategory_id.is_some() && self.category_id.is_none() {
            return Err(TransactionValidationError::SubcategoryWithoutCategory);
        }

        let unique: HashSet<_> = self.tag_ids.iter().collect();
        if unique.len() != self.tag_ids.len() {
            return Err(TransactionValidationError::DuplicateTag);
        }

        let len = self.description.chars().count();
        if len > MAX_DESCRIPTION_LEN {
            return Err(TransactionValidationError::DescriptionTooLong(len));
        }

        Ok(())
    }

    /// Generate an import ID for duplicate detection
    ///
    /// Keyed on the description, or the source when the description is blank.
    pub fn generate_import_id(&self) -> String {
        let key = if self.description.trim().is_empty() {
            &self.source
        } else {
            &self.description
        };
        generate_import_id(self.kind, self.date, self.amount, key)
    }
}

/// Stable fingerprint of the fields a bank export keeps for a row
///
/// FNV-1a over a normalized key. Must stay stable across builds and platforms.
pub fn generate_import_id(
    kind: TransactionKind,
    date: NaiveDate,
    amount: Money,
    description: &str,
) -> String {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let key = format!(
        "{}|{}|{}|{}",
        kind,
        date,
        amount.cents(),
        description.trim().to_lowercase()
    );
    let hash = key.bytes().fold(FNV_OFFSET, |acc, b| {
        (acc ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    });
    format!("imp-{:016x}", hash)
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = if self.is_income() && self.description.is_empty() {
            &self.source
        } else {
            &self.description
        };
        write!(
            f,
            "{} {} {}",
            self.date.format("%Y-%m-%d"),
            label,
            self.signed_amount()
        )
    }
}

/// Validation errors for transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    NonPositiveAmount(Money),
    IncomeWithCategory,
    SubcategoryWithoutCategory,
    DuplicateTag,
    DescriptionTooLong(usize),
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount(amount) => {
                write!(f, "Amount must be greater than zero (got {})", amount)
            }
            Self::IncomeWithCategory => {
                write!(f, "Income cannot have a category or sub-category")
            }
            Self::SubcategoryWithoutCategory => {
                write!(f, "A sub-category requires a category")
            }
            Self::DuplicateTag => write!(f, "The same tag is attached more than once"),
            Self::DescriptionTooLong(len) => write!(
                f,
                "Description too long ({} chars, max {})",
                len, MAX_DESCRIPTION_LEN
            ),
        }
    }
}

impl std::error::Error for TransactionValidationError {}
