//! Category CLI commands
//!
//! Implements CLI commands for category and subcategory management.

use clap::Subcommand;

use crate::display::{format_category_tree, format_subcategory_list};
use crate::error::TallyResult;
use crate::services::CategoryService;
use crate::storage::Storage;

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List all categories with their subcategories
    List {
        /// Show how many transactions use each category
        #[arg(long)]
        counts: bool,
    },

    /// Create a new category
    Add {
        /// Category name
        name: String,
    },

    /// Rename a category
    Rename {
        /// Category name or ID
        category: String,
        /// New name
        new_name: String,
    },

    /// Delete a category
    Delete {
        /// Category name or ID
        category: String,
        /// Delete even if transactions use it (they become uncategorized)
        #[arg(long)]
        force: bool,
    },

    /// List the subcategories of a category
    #[command(name = "list-sub")]
    ListSub {
        /// Category name or ID
        category: String,
    },

    /// Create a subcategory
    #[command(name = "add-sub")]
    AddSub {
        /// Parent category name or ID
        category: String,
        /// Subcategory name
        name: String,
    },

    /// Rename a subcategory
    #[command(name = "rename-sub")]
    RenameSub {
        /// Parent category name or ID
        category: String,
        /// Subcategory name or ID
        subcategory: String,
        /// New name
        new_name: String,
    },

    /// Delete a subcategory (its transactions keep the parent category)
    #[command(name = "delete-sub")]
    DeleteSub {
        /// Parent category name or ID
        category: String,
        /// Subcategory name or ID
        subcategory: String,
    },
}

/// Handle a category command
pub fn handle_category_command(storage: &Storage, cmd: CategoryCommands) -> TallyResult<()> {
    let service = CategoryService::new(storage);

    match cmd {
        CategoryCommands::List { counts } => {
            let tree = service.category_tree()?;
            let output = if counts {
                let transactions = storage.transactions.get_all()?;
                format_category_tree(&tree, |node| {
                    Some(
                        transactions
                            .iter()
                            .filter(|t| t.category_id == Some(node.category.id))
                            .count(),
                    )
                })
            } else {
                format_category_tree(&tree, |_| None)
            };
            print!("{}", output);
        }

        CategoryCommands::Add { name } => {
            let category = service.create_category(&name)?;
            println!("Created category: {}", category.name);
            println!("  ID: {}", category.id);
        }

        CategoryCommands::Rename { category, new_name } => {
            let cat = service.resolve_category(&category)?;
            let renamed = service.rename_category(cat.id, &new_name)?;
            println!("Renamed category '{}' to '{}'", cat.name, renamed.name);
        }

        CategoryCommands::Delete { category, force } => {
            let cat = service.resolve_category(&category)?;
            let outcome = service.delete_category(cat.id, force)?;
            println!("Deleted category: {}", cat.name);
            if outcome.subcategories_removed > 0 {
                println!("  Removed {} subcategories", outcome.subcategories_removed);
            }
            if outcome.uncategorized > 0 {
                println!("  {} transactions are now uncategorized", outcome.uncategorized);
            }
            if outcome.budgets_removed > 0 {
                println!("  Removed {} budgets", outcome.budgets_removed);
            }
        }

        CategoryCommands::ListSub { category } => {
            let cat = service.resolve_category(&category)?;
            let subs = service.list_subcategories(cat.id)?;
            print!("{}", format_subcategory_list(&cat.name, &subs));
        }

        CategoryCommands::AddSub { category, name } => {
            let cat = service.resolve_category(&category)?;
            let sub = service.create_subcategory(cat.id, &name)?;
            println!("Created subcategory: {} / {}", cat.name, sub.name);
            println!("  ID: {}", sub.id);
        }

        CategoryCommands::RenameSub {
            category,
            subcategory,
            new_name,
        } => {
            let cat = service.resolve_category(&category)?;
            let sub = service.resolve_subcategory(cat.id, &subcategory)?;
            let renamed = service.rename_subcategory(sub.id, &new_name)?;
            println!(
                "Renamed subcategory '{} / {}' to '{}'",
                cat.name, sub.name, renamed.name
            );
        }

        CategoryCommands::DeleteSub {
            category,
            subcategory,
        } => {
            let cat = service.resolve_category(&category)?;
            let sub = service.resolve_subcategory(cat.id, &subcategory)?;
            let cleared = service.delete_subcategory(sub.id)?;
            println!("Deleted subcategory: {} / {}", cat.name, sub.name);
            if cleared > 0 {
                println!("  {} transactions moved to '{}'", cleared, cat.name);
            }
        }
    }

    Ok(())
}
