//! Tag CLI commands

use clap::Subcommand;

use crate::display::format_tag_list;
use crate::error::TallyResult;
use crate::services::TagService;
use crate::storage::Storage;

/// Tag subcommands
#[derive(Subcommand)]
pub enum TagCommands {
    /// List tags with usage counts
    List,

    /// Create a tag
    Add {
        /// Tag name
        name: String,
    },

    /// Rename a tag
    Rename {
        /// Tag name or ID
        tag: String,
        /// New name
        new_name: String,
    },

    /// Delete a tag and remove it from every transaction
    Delete {
        /// Tag name or ID
        tag: String,
    },
}

/// Handle a tag command
pub fn handle_tag_command(storage: &Storage, cmd: TagCommands) -> TallyResult<()> {
    let service = TagService::new(storage);

    match cmd {
        TagCommands::List => {
            print!("{}", format_tag_list(&service.usage_counts()?));
        }

        TagCommands::Add { name } => {
            let tag = service.create(&name)?;
            println!("Created tag: {}", tag);
        }

        TagCommands::Rename { tag, new_name } => {
            let old = service.resolve(&tag)?;
            let renamed = service.rename(old.id, &new_name)?;
            println!("Renamed tag {} to {}", old, renamed);
        }

        TagCommands::Delete { tag } => {
            let tag = service.resolve(&tag)?;
            let detached = service.delete(tag.id)?;
            println!("Deleted tag: {}", tag);
            if detached > 0 {
                println!("  Removed from {} transactions", detached);
            }
        }
    }

    Ok(())
}
