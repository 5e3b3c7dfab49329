use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use tally::cli::{
    handle_budget_command, handle_category_command, handle_expense_command,
    handle_export_command, handle_import_command, handle_income_command, handle_report_command,
    handle_tag_command, handle_transaction_command,
};
use tally::config::{paths::TallyPaths, settings::Settings};
use tally::models::DefaultCategory;
use tally::storage::Storage;

#[derive(Parser)]
#[command(
    name = "tally",
    author = "Kaylee Beyene",
    version,
    about = "Terminal-based personal finance tracker",
    long_about = "Tally records expenses and income, organises them with categories \
                  and tags, tracks monthly budgets and turns bank CSV files into \
                  reports, all from the command line."
)]
struct Cli {
    /// Directory holding settings and data (default: platform config dir)
    #[arg(long, global = true, env = "TALLY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory with default categories
    Init,

    /// Show current configuration and paths
    Config,

    /// Record expenses
    #[command(subcommand)]
    Expense(tally::cli::ExpenseCommands),

    /// Record income
    #[command(subcommand)]
    Income(tally::cli::IncomeCommands),

    /// List, show, edit and tag transactions
    #[command(subcommand, alias = "transaction")]
    Txn(tally::cli::TransactionCommands),

    /// Category management commands
    #[command(subcommand)]
    Category(tally::cli::CategoryCommands),

    /// Tag management commands
    #[command(subcommand)]
    Tag(tally::cli::TagCommands),

    /// Monthly budget commands
    #[command(subcommand)]
    Budget(tally::cli::BudgetCommands),

    /// Import transactions from a CSV file
    Import(tally::cli::ImportArgs),

    /// Export data to CSV, JSON, YAML or PDF
    #[command(subcommand)]
    Export(tally::cli::ExportCommands),

    /// Generate reports
    #[command(subcommand)]
    Report(tally::cli::ReportCommands),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tally::init_tracing(cli.verbose);

    // Initialize paths and settings
    let paths = match cli.data_dir {
        Some(dir) => TallyPaths::with_base_dir(dir),
        None => TallyPaths::new()?,
    };
    let settings = Settings::load_or_create(&paths)?;

    // Initialize storage
    let mut storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    match cli.command {
        Some(Commands::Init) => {
            println!("Initializing Tally at: {}", paths.base_dir().display());
            let seeded = tally::storage::init::initialize_storage(&paths)?;
            settings.save(&paths)?;
            if seeded {
                println!("Default categories have been created:");
                for default in DefaultCategory::all() {
                    let (category, subs) = default.build(0);
                    let names: Vec<_> = subs.iter().map(|s| s.name.as_str()).collect();
                    if names.is_empty() {
                        println!("  - {}", category.name);
                    } else {
                        println!("  - {} ({})", category.name, names.join(", "));
                    }
                }
            } else {
                println!("Already initialized; existing categories were kept.");
            }
            println!();
            println!("Run 'tally category list' to see all categories.");
        }
        Some(Commands::Config) => {
            println!("Tally Configuration");
            println!("===================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Settings file:    {}", paths.settings_file().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Export directory: {}", paths.exports_dir().display());
            println!();
            println!("Settings:");
            println!("  Currency symbol: {}", settings.currency_symbol);
            println!("  Date format:     {}", settings.date_format);
            println!("  List limit:      {}", settings.list_limit);
            println!(
                "  Import date format: {}",
                settings.import.date_format.as_deref().unwrap_or("(auto)")
            );
            println!("  Import tag separator: '{}'", settings.import.tag_separator);
            println!(
                "  Create missing categories on import: {}",
                settings.import.create_missing_categories
            );
            println!("  PDF paper: {:?}", settings.pdf.paper);
        }
        Some(Commands::Expense(cmd)) => handle_expense_command(&storage, &settings, cmd)?,
        Some(Commands::Income(cmd)) => handle_income_command(&storage, &settings, cmd)?,
        Some(Commands::Txn(cmd)) => handle_transaction_command(&storage, &settings, cmd)?,
        Some(Commands::Category(cmd)) => handle_category_command(&storage, cmd)?,
        Some(Commands::Tag(cmd)) => handle_tag_command(&storage, cmd)?,
        Some(Commands::Budget(cmd)) => handle_budget_command(&storage, &settings, cmd)?,
        Some(Commands::Import(args)) => handle_import_command(&storage, &settings, args)?,
        Some(Commands::Export(cmd)) => handle_export_command(&storage, &settings, cmd)?,
        Some(Commands::Report(cmd)) => handle_report_command(&storage, &settings, cmd)?,
        None => {
            println!("Tally - Terminal-based personal finance tracker");
            println!();
            println!("Run 'tally --help' for usage information.");
            println!("Run 'tally init' to create the default categories.");
        }
    }

    Ok(())
}
