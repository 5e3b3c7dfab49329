//! Transaction CLI commands
//!
//! `expense add`, `income add` and the `txn` family for listing, showing,
//! editing, deleting and tagging recorded transactions.

use clap::{Args, Subcommand};

use crate::config::settings::Settings;
use crate::display::{format_totals, format_transaction_details, format_transaction_list};
use crate::error::{TallyError, TallyResult};
use crate::models::{CategoryId, SubcategoryId, TransactionKind};
use crate::services::{
    CategoryService, CreateTransactionInput, FilterContext, SortDirection, SortKey, SortSpec,
    TagService, TransactionFilter, TransactionService, UpdateTransactionInput,
};
use crate::storage::Storage;

use super::{
    parse_amount_arg, parse_date_arg, parse_date_or_today, parse_month_or_current, split_tags,
};

/// Expense subcommands
#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record an expense
    Add {
        /// Amount (e.g., "12.50")
        amount: String,
        /// Date (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<String>,
        /// What the money was spent on
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// Category name or ID
        #[arg(short, long)]
        category: Option<String>,
        /// Subcategory name or ID (requires --category)
        #[arg(short, long, requires = "category")]
        subcategory: Option<String>,
        /// Comma separated tag names
        #[arg(short, long)]
        tags: Option<String>,
        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,
    },
}

/// Income subcommands
#[derive(Subcommand)]
pub enum IncomeCommands {
    /// Record income
    Add {
        /// Amount (e.g., "2500")
        amount: String,
        /// Date (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<String>,
        /// Description
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// Where the money came from
        #[arg(long)]
        source: Option<String>,
        /// Comma separated tag names
        #[arg(short, long)]
        tags: Option<String>,
        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,
    },
}

/// Filter options shared by listing, exporting and reporting
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only expense or income
    #[arg(long)]
    pub kind: Option<TransactionKind>,
    /// Start date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub from: Option<String>,
    /// End date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub to: Option<String>,
    /// A single month (YYYY-MM); overrides --from/--to
    #[arg(long)]
    pub month: Option<String>,
    /// Category name or ID
    #[arg(short, long)]
    pub category: Option<String>,
    /// Subcategory name or ID (requires --category)
    #[arg(long, requires = "category")]
    pub subcategory: Option<String>,
    /// Only expenses without a category
    #[arg(long, conflicts_with = "category")]
    pub uncategorized: bool,
    /// Income source contains this text
    #[arg(long)]
    pub source: Option<String>,
    /// Tag name or ID
    #[arg(short, long)]
    pub tag: Option<String>,
    /// Minimum amount
    #[arg(long)]
    pub min: Option<String>,
    /// Maximum amount
    #[arg(long)]
    pub max: Option<String>,
    /// Free text search over descriptions, notes, sources and names
    #[arg(short, long)]
    pub search: Option<String>,
}

impl FilterArgs {
    /// Resolve names and parse values into a filter
    pub fn to_filter(&self, storage: &Storage) -> TallyResult<TransactionFilter> {
        let mut filter = TransactionFilter::new();

        if let Some(kind) = self.kind {
            filter = filter.kind(kind);
        }

        if let Some(month) = &self.month {
            let month = parse_month_or_current(Some(month))?;
            filter = filter.date_range(month.start_date(), month.end_date());
        } else {
            if let Some(from) = &self.from {
                filter = filter.start_date(parse_date_arg(from)?);
            }
            if let Some(to) = &self.to {
                filter = filter.end_date(parse_date_arg(to)?);
            }
        }

        if let Some(category) = &self.category {
            let categories = CategoryService::new(storage);
            let category = categories.resolve_category(category)?;
            filter = filter.category(category.id);
            if let Some(sub) = &self.subcategory {
                let sub = categories.resolve_subcategory(category.id, sub)?;
                filter = filter.subcategory(sub.id);
            }
        }
        if self.uncategorized {
            filter = filter.uncategorized();
        }

        if let Some(source) = &self.source {
            filter = filter.source(source.as_str());
        }
        if let Some(tag) = &self.tag {
            let tag = TagService::new(storage).resolve(tag)?;
            filter = filter.tag(tag.id);
        }
        if let Some(min) = &self.min {
            filter = filter.min_amount(parse_amount_arg(min)?);
        }
        if let Some(max) = &self.max {
            filter = filter.max_amount(parse_amount_arg(max)?);
        }
        if let Some(search) = &self.search {
            filter = filter.search(search.as_str());
        }

        Ok(filter)
    }
}

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// List transactions
    List {
        #[command(flatten)]
        filter: FilterArgs,
        /// Sort by date, amount, description, category or created
        #[arg(long, default_value = "date")]
        sort: SortKey,
        /// Sort ascending (default is descending)
        #[arg(long)]
        asc: bool,
        /// Maximum rows to show (default from settings)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Show every matching row
        #[arg(long, conflicts_with = "limit")]
        all: bool,
    },

    /// Show transaction details
    Show {
        /// Transaction ID (the short form from lists is enough)
        id: String,
    },

    /// Edit a transaction
    Edit {
        /// Transaction ID
        id: String,
        /// Change to expense or income
        #[arg(long)]
        kind: Option<TransactionKind>,
        /// New amount
        #[arg(short, long)]
        amount: Option<String>,
        /// New date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
        /// New description
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// New category name or ID
        #[arg(short, long)]
        category: Option<String>,
        /// New subcategory name or ID
        #[arg(short, long)]
        subcategory: Option<String>,
        /// Remove the category
        #[arg(long, conflicts_with_all = ["category", "subcategory"])]
        clear_category: bool,
        /// New income source
        #[arg(long)]
        source: Option<String>,
        /// New notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: String,
    },

    /// Add tags to a transaction
    Tag {
        /// Transaction ID
        id: String,
        /// Comma separated tag names
        tags: String,
    },

    /// Remove tags from a transaction
    Untag {
        /// Transaction ID
        id: String,
        /// Comma separated tag names
        tags: String,
    },
}

/// Handle an expense command
pub fn handle_expense_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ExpenseCommands,
) -> TallyResult<()> {
    let ExpenseCommands::Add {
        amount,
        date,
        description,
        category,
        subcategory,
        tags,
        notes,
    } = cmd;

    let mut input = CreateTransactionInput::expense(
        parse_date_or_today(date.as_deref())?,
        parse_amount_arg(&amount)?,
        description.unwrap_or_default(),
    );
    if let Some(category) = category {
        let (category_id, subcategory_id) =
            resolve_category_args(storage, &category, subcategory.as_deref())?;
        input.category_id = Some(category_id);
        input.subcategory_id = subcategory_id;
    }
    input.tags = tags.as_deref().map(split_tags).unwrap_or_default();
    input.notes = notes.unwrap_or_default();

    let txn = TransactionService::new(storage).create(input)?;
    println!(
        "Recorded expense: {} on {}",
        txn.amount.format_with_symbol(&settings.currency_symbol),
        settings.format_date(txn.date)
    );
    println!("  ID: {}", txn.id);
    Ok(())
}

/// Handle an income command
pub fn handle_income_command(
    storage: &Storage,
    settings: &Settings,
    cmd: IncomeCommands,
) -> TallyResult<()> {
    let IncomeCommands::Add {
        amount,
        date,
        description,
        source,
        tags,
        notes,
    } = cmd;

    let mut input = CreateTransactionInput::income(
        parse_date_or_today(date.as_deref())?,
        parse_amount_arg(&amount)?,
        source.unwrap_or_default(),
    );
    input.description = description.unwrap_or_default();
    input.tags = tags.as_deref().map(split_tags).unwrap_or_default();
    input.notes = notes.unwrap_or_default();

    let txn = TransactionService::new(storage).create(input)?;
    println!(
        "Recorded income: {} on {}",
        txn.amount.format_with_symbol(&settings.currency_symbol),
        settings.format_date(txn.date)
    );
    println!("  ID: {}", txn.id);
    Ok(())
}

/// Handle a transaction command
pub fn handle_transaction_command(
    storage: &Storage,
    settings: &Settings,
    cmd: TransactionCommands,
) -> TallyResult<()> {
    let service = TransactionService::new(storage);

    match cmd {
        TransactionCommands::List {
            filter,
            sort,
            asc,
            limit,
            all,
        } => {
            let filter = filter.to_filter(storage)?;
            let direction = if asc {
                SortDirection::Ascending
            } else {
                SortDirection::Descending
            };
            let sort = SortSpec::new(sort, direction);

            let matching = service.list(&filter, &sort, None)?;
            let totals = TransactionService::totals(&matching);
            let limit = if all {
                matching.len()
            } else {
                limit.unwrap_or(settings.list_limit)
            };
            let shown = &matching[..limit.min(matching.len())];

            let ctx = FilterContext::from_storage(storage)?;
            print!("{}", format_transaction_list(shown, &ctx, settings));
            if shown.len() < matching.len() {
                println!("Showing {} of {} matching transactions", shown.len(), matching.len());
            }
            if !matching.is_empty() {
                print!("{}", format_totals(&totals, &settings.currency_symbol));
            }
        }

        TransactionCommands::Show { id } => {
            let txn = service.resolve(&id)?;
            let ctx = FilterContext::from_storage(storage)?;
            print!("{}", format_transaction_details(&txn, &ctx, settings));
        }

        TransactionCommands::Edit {
            id,
            kind,
            amount,
            date,
            description,
            category,
            subcategory,
            clear_category,
            source,
            notes,
        } => {
            let txn = service.resolve(&id)?;

            let mut input = UpdateTransactionInput {
                kind,
                amount: amount.as_deref().map(parse_amount_arg).transpose()?,
                date: date.as_deref().map(parse_date_arg).transpose()?,
                description,
                source,
                notes,
                ..Default::default()
            };

            if clear_category {
                input.category_id = Some(None);
            } else if let Some(category) = category {
                let (category_id, subcategory_id) =
                    resolve_category_args(storage, &category, subcategory.as_deref())?;
                input.category_id = Some(Some(category_id));
                input.subcategory_id = Some(subcategory_id);
            } else if let Some(sub) = subcategory {
                let category_id = txn.category_id.ok_or_else(|| {
                    TallyError::Validation(
                        "Transaction has no category; pass --category with --subcategory"
                            .to_string(),
                    )
                })?;
                let sub = CategoryService::new(storage).resolve_subcategory(category_id, &sub)?;
                input.subcategory_id = Some(Some(sub.id));
            }

            if input.is_empty() {
                println!(
                    "No changes specified. Use --amount, --date, --description, --category, --source or --notes."
                );
                return Ok(());
            }

            let updated = service.update(txn.id, input)?;
            println!("Updated transaction: {}", updated.id);
        }

        TransactionCommands::Delete { id } => {
            let txn = service.resolve(&id)?;
            service.delete(txn.id)?;
            println!(
                "Deleted transaction: {} ({} on {})",
                txn.id,
                txn.amount.format_with_symbol(&settings.currency_symbol),
                settings.format_date(txn.date)
            );
        }

        TransactionCommands::Tag { id, tags } => {
            let txn = service.resolve(&id)?;
            let updated = service.add_tags(txn.id, &split_tags(&tags))?;
            let ctx = FilterContext::from_storage(storage)?;
            println!("Tags: {}", ctx.tag_names(&updated).join(", "));
        }

        TransactionCommands::Untag { id, tags } => {
            let txn = service.resolve(&id)?;
            let updated = service.remove_tags(txn.id, &split_tags(&tags))?;
            let ctx = FilterContext::from_storage(storage)?;
            let names = ctx.tag_names(&updated);
            if names.is_empty() {
                println!("Tags: (none)");
            } else {
                println!("Tags: {}", names.join(", "));
            }
        }
    }

    Ok(())
}

fn resolve_category_args(
    storage: &Storage,
    category: &str,
    subcategory: Option<&str>,
) -> TallyResult<(CategoryId, Option<SubcategoryId>)> {
    let service = CategoryService::new(storage);
    let category = service.resolve_category(category)?;
    let subcategory = subcategory
        .map(|s| service.resolve_subcategory(category.id, s))
        .transpose()?;
    Ok((category.id, subcategory.map(|s| s.id)))
}
