//! Core data models for Tally
//!
//! This module contains the data structures of the personal finance
//! domain: transactions, categories, tags and monthly budgets.

pub mod budget;
pub mod category;
pub mod ids;
pub mod money;
pub mod period;
pub mod tag;
pub mod transaction;

pub use budget::{Budget, BudgetProgress, BudgetStatus};
pub use category::{Category, DefaultCategory, Subcategory};
pub use ids::{BudgetId, CategoryId, SubcategoryId, TagId, TransactionId};
pub use money::Money;
pub use period::Month;
pub use tag::Tag;
pub use transaction::{Transaction, TransactionKind};
