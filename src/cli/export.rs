//! CLI commands for data export
//!
//! Provides commands for exporting data in various formats.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Subcommand, ValueEnum};

use crate::config::settings::Settings;
use crate::error::{TallyError, TallyResult};
use crate::export::{csv, json, pdf, yaml};
use crate::services::{SortSpec, TransactionService};
use crate::storage::Storage;

use super::{create_output, parse_month_or_current, FilterArgs};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// CSV (transactions and budgets)
    Csv,
    /// JSON
    Json,
    /// YAML (human-readable)
    Yaml,
    /// Printable PDF (transactions only)
    Pdf,
}

/// Export subcommands
#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Export transactions, optionally filtered
    Transactions {
        /// Output file path
        output: PathBuf,

        /// Export format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Export budget progress to CSV
    Budgets {
        /// Output file path
        output: PathBuf,

        /// Months to export (YYYY-MM, repeatable; default every budgeted month)
        #[arg(short, long = "month")]
        months: Vec<String>,
    },

    /// Export all data to a file
    All {
        /// Output file path
        output: PathBuf,

        /// Export format
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

/// Handle export commands
pub fn handle_export_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ExportCommands,
) -> TallyResult<()> {
    match cmd {
        ExportCommands::Transactions {
            output,
            format,
            filter,
        } => handle_export_transactions(storage, settings, &output, format, &filter),
        ExportCommands::Budgets { output, months } => {
            handle_export_budgets(storage, &output, &months)
        }
        ExportCommands::All {
            output,
            format,
            pretty,
        } => handle_export_all(storage, &output, format, pretty),
    }
}

/// Handle transactions export
fn handle_export_transactions(
    storage: &Storage,
    settings: &Settings,
    output: &Path,
    format: ExportFormat,
    filter: &FilterArgs,
) -> TallyResult<()> {
    let filter = filter.to_filter(storage)?;
    let transactions =
        TransactionService::new(storage).list(&filter, &SortSpec::default(), None)?;

    match format {
        ExportFormat::Csv => {
            let mut writer = create_output(output)?;
            csv::export_transactions_csv(
                storage,
                &transactions,
                settings.import.tag_separator,
                &mut writer,
            )?;
        }
        ExportFormat::Json => {
            let mut writer = create_output(output)?;
            serde_json::to_writer_pretty(&mut writer, &transactions)?;
            writer.flush()?;
        }
        ExportFormat::Yaml => {
            let mut writer = create_output(output)?;
            serde_yaml::to_writer(&mut writer, &transactions)
                .map_err(|e| TallyError::Export(e.to_string()))?;
            writer.flush()?;
        }
        ExportFormat::Pdf => {
            pdf::transactions_pdf(storage, &transactions, settings)?.save(output)?;
        }
    }

    println!(
        "Exported {} transactions to: {}",
        transactions.len(),
        output.display()
    );
    Ok(())
}

/// Handle budgets export
fn handle_export_budgets(storage: &Storage, output: &Path, months: &[String]) -> TallyResult<()> {
    let months = months
        .iter()
        .map(|m| parse_month_or_current(Some(m)))
        .collect::<TallyResult<Vec<_>>>()?;
    let selected = (!months.is_empty()).then_some(months.as_slice());

    let mut writer = create_output(output)?;
    let rows = csv::export_budgets_csv(storage, selected, &mut writer)?;

    println!("Exported {} budget rows to: {}", rows, output.display());
    Ok(())
}

/// Handle full export
fn handle_export_all(
    storage: &Storage,
    output: &Path,
    format: ExportFormat,
    pretty: bool,
) -> TallyResult<()> {
    match format {
        ExportFormat::Json => {
            let mut writer = create_output(output)?;
            json::export_full_json(storage, &mut writer, pretty)?;
            writer.flush()?;
        }
        ExportFormat::Yaml => {
            let mut writer = create_output(output)?;
            yaml::export_full_yaml(storage, &mut writer)?;
            writer.flush()?;
        }
        ExportFormat::Csv | ExportFormat::Pdf => {
            return Err(TallyError::Validation(
                "A full export is JSON or YAML. Use 'export transactions' for CSV or PDF."
                    .to_string(),
            ));
        }
    }

    println!("Full database exported to: {}", output.display());
    Ok(())
}
