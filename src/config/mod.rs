//! Configuration module for Tally
//!
//! - Platform path resolution (with a `TALLY_DATA_DIR` override)
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::TallyPaths;
pub use settings::{ImportSettings, Paper, PdfSettings, Settings};
