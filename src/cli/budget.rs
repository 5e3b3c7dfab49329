//! Budget CLI commands
//!
//! Monthly spending limits per category: setting, listing, progress and
//! copying a month's budgets forward.

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::{format_budget_list, format_budget_progress};
use crate::error::TallyResult;
use crate::models::Month;
use crate::services::{BudgetService, CategoryService};
use crate::storage::Storage;

use super::{parse_amount_arg, parse_month_or_current};

/// Budget subcommands
#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Set the monthly limit for a category
    Set {
        /// Category name or ID
        category: String,
        /// Limit (e.g., "400" or "400.00")
        amount: String,
        /// Month (YYYY-MM, default current)
        #[arg(short, long)]
        month: Option<String>,
        /// Notes stored with the budget
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List budgets for a month
    List {
        /// Month (YYYY-MM, default current)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Show spending against each budget
    Progress {
        /// Month (YYYY-MM, default current)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Remove a category's budget for a month
    Delete {
        /// Category name or ID
        category: String,
        /// Month (YYYY-MM, default current)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Copy every budget of one month into another
    Copy {
        /// Source month (YYYY-MM)
        from: String,
        /// Target month (YYYY-MM)
        to: String,
        /// Replace budgets the target month already has
        #[arg(long)]
        overwrite: bool,
    },
}

/// Handle a budget command
pub fn handle_budget_command(
    storage: &Storage,
    settings: &Settings,
    cmd: BudgetCommands,
) -> TallyResult<()> {
    let service = BudgetService::new(storage);
    let categories = CategoryService::new(storage);
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        BudgetCommands::Set {
            category,
            amount,
            month,
            notes,
        } => {
            let month = parse_month_or_current(month.as_deref())?;
            let category = categories.resolve_category(&category)?;
            let mut budget = service.set_budget(category.id, month, parse_amount_arg(&amount)?)?;
            if let Some(notes) = notes {
                budget.notes = notes;
                storage.budgets.upsert(budget.clone())?;
                storage.budgets.save()?;
            }
            println!(
                "Budget for {} in {}: {}",
                category.name,
                month.long_name(),
                budget.limit.format_with_symbol(symbol)
            );
        }

        BudgetCommands::List { month } => {
            let month = parse_month_or_current(month.as_deref())?;
            let budgets = service.list_for_month(month)?;
            let output = format_budget_list(
                month,
                &budgets,
                |b| {
                    categories
                        .get_category(b.category_id)
                        .ok()
                        .flatten()
                        .map(|c| c.name)
                        .unwrap_or_else(|| "(deleted)".to_string())
                },
                symbol,
            );
            print!("{}", output);
        }

        BudgetCommands::Progress { month } => {
            let month = parse_month_or_current(month.as_deref())?;
            let rows = service.progress_for_month(month)?;
            print!("{}", format_budget_progress(month, &rows, symbol));
        }

        BudgetCommands::Delete { category, month } => {
            let month = parse_month_or_current(month.as_deref())?;
            let category = categories.resolve_category(&category)?;
            service.delete_budget(category.id, month)?;
            println!(
                "Deleted budget for {} in {}",
                category.name,
                month.long_name()
            );
        }

        BudgetCommands::Copy {
            from,
            to,
            overwrite,
        } => {
            let from: Month = parse_month_or_current(Some(&from))?;
            let to: Month = parse_month_or_current(Some(&to))?;
            let outcome = service.copy_month(from, to, overwrite)?;
            println!(
                "Copied {} budgets from {} to {}",
                outcome.copied + outcome.overwritten,
                from.long_name(),
                to.long_name()
            );
            if outcome.overwritten > 0 {
                println!("  {} existing budgets replaced", outcome.overwritten);
            }
            if outcome.skipped > 0 {
                println!(
                    "  {} kept because {} already had them (use --overwrite to replace)",
                    outcome.skipped,
                    to.long_name()
                );
            }
        }
    }

    Ok(())
}
