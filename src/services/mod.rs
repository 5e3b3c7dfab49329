//! Service layer for Tally
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation, name resolution, and cross-entity operations.

pub mod budget;
pub mod category;
pub mod filter;
pub mod import;
pub mod tag;
pub mod transaction;

pub use budget::{BudgetService, CopyOutcome};
pub use category::{CategoryService, CategoryWithSubcategories, DeleteCategoryOutcome};
pub use filter::{FilterContext, SortDirection, SortKey, SortSpec, TransactionFilter};
pub use import::{
    ImportKind, ImportOptions, ImportPreview, ImportReport, ImportService, ImportStatus, RowError,
};
pub use tag::{TagService, TagUsage};
pub use transaction::{
    CreateTransactionInput, Totals, TransactionService, UpdateTransactionInput,
};
