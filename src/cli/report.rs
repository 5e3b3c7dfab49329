//! CLI commands for reports
//!
//! Every report prints to the terminal; `--csv` and `--pdf` write a copy
//! to a file as well.

use std::io::Write;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Subcommand;

use crate::config::settings::Settings;
use crate::error::TallyResult;
use crate::export::pdf::{budget_pdf, spending_pdf, summary_pdf};
use crate::models::Month;
use crate::reports::{BudgetReport, SpendingReport, SummaryReport};
use crate::storage::Storage;

use super::{create_output, parse_date_arg, parse_month_or_current, FilterArgs};

/// Report subcommands
#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Income, expenses and net, month by month
    Summary {
        #[command(flatten)]
        filter: FilterArgs,

        /// Write the report to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write the report to a PDF file
        #[arg(long)]
        pdf: Option<PathBuf>,
    },

    /// Spending by category and subcategory
    Spending {
        /// Start date (YYYY-MM-DD, default first day of this month)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD, default today)
        #[arg(long)]
        to: Option<String>,

        /// A single month (YYYY-MM); overrides --from/--to
        #[arg(short, long)]
        month: Option<String>,

        /// Show top N categories only
        #[arg(long)]
        top: Option<usize>,

        /// Write the report to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write the report to a PDF file
        #[arg(long)]
        pdf: Option<PathBuf>,
    },

    /// Budget progress for a month
    Budget {
        /// Month (YYYY-MM, default current)
        #[arg(short, long)]
        month: Option<String>,

        /// Write the report to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write the report to a PDF file
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
}

/// Handle report commands
pub fn handle_report_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ReportCommands,
) -> TallyResult<()> {
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        ReportCommands::Summary { filter, csv, pdf } => {
            let filter = filter.to_filter(storage)?;
            let report = SummaryReport::generate(storage, &filter)?;

            if let Some(path) = csv {
                let mut writer = create_output(&path)?;
                report.export_csv(&mut writer)?;
                writer.flush()?;
                println!("Summary report exported to: {}", path.display());
            }
            if let Some(path) = pdf {
                summary_pdf(&report, settings).save(&path)?;
                println!("Summary report written to: {}", path.display());
            }
            print!("{}", report.format_terminal(symbol));
        }

        ReportCommands::Spending {
            from,
            to,
            month,
            top,
            csv,
            pdf,
        } => {
            let (start, end) = spending_range(from.as_deref(), to.as_deref(), month.as_deref())?;
            let report = SpendingReport::generate(storage, start, end)?;

            if let Some(path) = csv {
                let mut writer = create_output(&path)?;
                report.export_csv(&mut writer)?;
                writer.flush()?;
                println!("Spending report exported to: {}", path.display());
            }
            if let Some(path) = pdf {
                spending_pdf(&report, settings).save(&path)?;
                println!("Spending report written to: {}", path.display());
            }

            print!("{}", report.format_terminal(symbol));
            if let Some(n) = top {
                println!("Top {} categories:", n);
                for (i, cat) in report.top_categories(n).iter().enumerate() {
                    println!(
                        "  {}. {} {}",
                        i + 1,
                        cat.category_name,
                        cat.total_spending.format_with_symbol(symbol)
                    );
                }
            }
        }

        ReportCommands::Budget { month, csv, pdf } => {
            let month = parse_month_or_current(month.as_deref())?;
            let report = BudgetReport::generate(storage, month)?;

            if let Some(path) = csv {
                let mut writer = create_output(&path)?;
                report.export_csv(&mut writer)?;
                writer.flush()?;
                println!("Budget report exported to: {}", path.display());
            }
            if let Some(path) = pdf {
                budget_pdf(&report, settings).save(&path)?;
                println!("Budget report written to: {}", path.display());
            }

            print!("{}", report.format_terminal(symbol));
        }
    }

    Ok(())
}

/// Resolve the spending report's date range; defaults to month-to-date
fn spending_range(
    from: Option<&str>,
    to: Option<&str>,
    month: Option<&str>,
) -> TallyResult<(NaiveDate, NaiveDate)> {
    if month.is_some() {
        let month = parse_month_or_current(month)?;
        return Ok((month.start_date(), month.end_date()));
    }

    let today = chrono::Local::now().date_naive();
    let start = match from {
        Some(s) => parse_date_arg(s)?,
        None => Month::of(today).start_date(),
    };
    let end = match to {
        Some(s) => parse_date_arg(s)?,
        None => today,
    };
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spending_range_for_month() {
        let (start, end) = spending_range(None, None, Some("2024-02")).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_spending_range_explicit_dates() {
        let (start, end) =
            spending_range(Some("2025-01-05"), Some("2025-03-01"), None).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 1, 5).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    }
}
