//! CSV import command

use std::path::PathBuf;

use clap::Args;

use crate::config::settings::{is_valid_strftime, Settings};
use crate::display::{format_import_preview, format_import_report};
use crate::error::{TallyError, TallyResult};
use crate::services::{ImportKind, ImportOptions, ImportService};
use crate::storage::Storage;

/// Arguments for `tally import`
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// CSV file with a header row
    pub file: PathBuf,

    /// Treat every row as expense or income, or decide per row (auto)
    #[arg(short, long, default_value = "auto")]
    pub kind: ImportKind,

    /// Date format tried before the built-in list (strftime, e.g. "%d.%m.%Y")
    #[arg(long)]
    pub date_format: Option<String>,

    /// Show what would be imported without saving anything
    #[arg(long)]
    pub dry_run: bool,

    /// Import rows with unknown categories as uncategorized instead of creating them
    #[arg(long)]
    pub no_create_categories: bool,
}

/// Handle the import command
pub fn handle_import_command(
    storage: &Storage,
    settings: &Settings,
    args: ImportArgs,
) -> TallyResult<()> {
    let mut options = ImportOptions::from_settings(settings).with_kind(args.kind);
    if let Some(format) = args.date_format {
        if !is_valid_strftime(&format) {
            return Err(TallyError::Validation(format!(
                "Invalid date format: '{}'",
                format
            )));
        }
        options = options.with_date_format(format);
    }
    if args.no_create_categories {
        options.create_missing_categories = false;
    }

    let service = ImportService::new(storage);
    let parsed = service.parse_file(&args.file, &options)?;
    let preview = service.preview(parsed)?;

    if args.dry_run {
        print!("{}", format_import_preview(&preview, settings));
        println!("Dry run: nothing was saved.");
        return Ok(());
    }

    let report = service.commit(&preview, &options)?;
    print!("{}", format_import_report(&report));
    Ok(())
}
