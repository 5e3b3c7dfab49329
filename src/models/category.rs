//! Category and Subcategory models
//!
//! Expenses are assigned a category and, optionally, a sub-category that
//! belongs to it (e.g. "Food" > "Groceries").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CategoryId, SubcategoryId};

/// Maximum length of category and sub-category names
pub const MAX_CATEGORY_NAME_LEN: usize = 50;

/// A top-level expense category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier
    pub id: CategoryId,

    /// Category name
    pub name: String,

    /// Sort order for display
    pub sort_order: i32,

    /// Whether this category is hidden from pickers
    #[serde(default)]
    pub hidden: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Create a new category
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: CategoryId::new(),
            name: name.into().trim().to_string(),
            sort_order: 0,
            hidden: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new category with a specific sort order
    pub fn with_sort_order(name: impl Into<String>, sort_order: i32) -> Self {
        let mut category = Self::new(name);
        category.sort_order = sort_order;
        category
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into().trim().to_string();
        self.updated_at = Utc::now();
    }

    /// Validate the category
    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        validate_name(&self.name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A sub-category nested under a category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: SubcategoryId,

    /// The parent category
    pub category_id: CategoryId,

    pub name: String,

    /// Sort order within the parent category
    pub sort_order: i32,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Subcategory {
    pub fn new(category_id: CategoryId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SubcategoryId::new(),
            category_id,
            name: name.into().trim().to_string(),
            sort_order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_sort_order(
        category_id: CategoryId,
        name: impl Into<String>,
        sort_order: i32,
    ) -> Self {
        let mut sub = Self::new(category_id, name);
        sub.sort_order = sort_order;
        sub
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into().trim().to_string();
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        validate_name(&self.name)
    }
}

impl fmt::Display for Subcategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn validate_name(name: &str) -> Result<(), CategoryValidationError> {
    if name.trim().is_empty() {
        return Err(CategoryValidationError::EmptyName);
    }

    let len = name.chars().count();
    if len > MAX_CATEGORY_NAME_LEN {
        return Err(CategoryValidationError::NameTooLong(len));
    }

    Ok(())
}

/// Categories created for a fresh data directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultCategory {
    Food,
    Housing,
    Transport,
    Health,
    Entertainment,
    Shopping,
    Other,
}

impl DefaultCategory {
    /// Get all default categories in display order
    pub fn all() -> &'static [Self] {
        &[
            Self::Food,
            Self::Housing,
            Self::Transport,
            Self::Health,
            Self::Entertainment,
            Self::Shopping,
            Self::Other,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Housing => "Housing",
            Self::Transport => "Transport",
            Self::Health => "Health",
            Self::Entertainment => "Entertainment",
            Self::Shopping => "Shopping",
            Self::Other => "Other",
        }
    }

    /// Starter sub-categories for this category
    pub fn subcategories(&self) -> &'static [&'static str] {
        match self {
            Self::Food => &["Groceries", "Dining Out", "Coffee"],
            Self::Housing => &["Rent", "Utilities", "Maintenance"],
            Self::Transport => &["Fuel", "Public Transit", "Parking"],
            Self::Health => &["Pharmacy", "Doctor"],
            Self::Entertainment => &["Streaming", "Events"],
            Self::Shopping => &["Clothing", "Electronics"],
            Self::Other => &[],
        }
    }

    /// Build the category and its sub-categories
    pub fn build(&self, sort_order: i32) -> (Category, Vec<Subcategory>) {
        let category = Category::with_sort_order(self.name(), sort_order);
        let subs = self
            .subcategories()
            .iter()
            .enumerate()
            .map(|(i, name)| Subcategory::with_sort_order(category.id, *name, i as i32))
            .collect();
        (category, subs)
    }
}

/// Validation errors for categories and sub-categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryValidationError {
    EmptyName,
    NameTooLong(usize),
}

impl fmt::Display for CategoryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Category name cannot be empty"),
            Self::NameTooLong(len) => write!(
                f,
                "Category name too long ({} chars, max {})",
                len, MAX_CATEGORY_NAME_LEN
            ),
        }
    }
}

impl std::error::Error for CategoryValidationError {}
