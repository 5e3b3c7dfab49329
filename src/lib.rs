//! Tally - Terminal-based personal finance tracker
//!
//! This library provides the core functionality for the Tally command line
//! application: recording expenses and income, organising them with
//! categories, subcategories and tags, tracking monthly budgets, importing
//! bank CSV files and exporting reports.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (transactions, categories, tags, budgets)
//! - `storage`: JSON file storage layer
//! - `services`: Business logic layer, including filtering and CSV import
//! - `reports`: Summary, spending and budget reports
//! - `export`: CSV, JSON, YAML and PDF output
//! - `display`: Terminal formatting
//! - `cli`: Command definitions and handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use tally::config::{paths::TallyPaths, settings::Settings};
//! use tally::storage::Storage;
//!
//! let paths = TallyPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let mut storage = Storage::new(paths)?;
//! storage.load_all()?;
//! ```

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod reports;
pub mod services;
pub mod storage;

pub use error::{TallyError, TallyResult};

use std::sync::Once;

/// Environment variable holding a tracing filter, e.g. `tally=trace`
pub const LOG_ENV: &str = "TALLY_LOG";

static TRACING_INIT: Once = Once::new();

/// Install the stderr tracing subscriber
///
/// `TALLY_LOG` wins when set; otherwise `verbosity` picks the level
/// (0 = warn, 1 = info, 2+ = debug).
pub fn init_tracing(verbosity: u8) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let default_level = match verbosity {
            0 => "tally=warn",
            1 => "tally=info",
            _ => "tally=debug",
        };
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(default_level));

        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    });
}
