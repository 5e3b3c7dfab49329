//! User settings for Tally
//!
//! Manages display preferences, CSV import behaviour and PDF report layout.

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use super::paths::TallyPaths;
use crate::error::TallyError;

/// Paper size for PDF reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Paper {
    #[default]
    A4,
    Letter,
}

impl Paper {
    /// Page (width, height) in millimetres, portrait
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match self {
            Self::A4 => (210.0, 297.0),
            Self::Letter => (215.9, 279.4),
        }
    }
}

/// CSV import preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSettings {
    /// Date format tried before the built-in list (strftime)
    #[serde(default)]
    pub date_format: Option<String>,

    /// Separator between tag names inside a CSV cell
    #[serde(default = "default_tag_separator")]
    pub tag_separator: char,

    /// Create categories and sub-categories named in a CSV that don't exist yet
    #[serde(default = "default_true")]
    pub create_missing_categories: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            date_format: None,
            tag_separator: default_tag_separator(),
            create_missing_categories: true,
        }
    }
}

/// PDF report layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfSettings {
    #[serde(default)]
    pub paper: Paper,

    /// Body font size in points
    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// Title printed at the top of every report
    #[serde(default = "default_pdf_title")]
    pub title: String,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            paper: Paper::default(),
            font_size: default_font_size(),
            title: default_pdf_title(),
        }
    }
}

/// User settings for Tally
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Default currency symbol
    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Date format for display (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Default number of rows shown by list commands
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,

    #[serde(default)]
    pub import: ImportSettings,

    #[serde(default)]
    pub pdf: PdfSettings,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "$".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_list_limit() -> usize {
    50
}

fn default_tag_separator() -> char {
    ';'
}

fn default_true() -> bool {
    true
}

fn default_font_size() -> f32 {
    9.0
}

fn default_pdf_title() -> String {
    "Tally Report".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            currency_symbol: default_currency(),
            date_format: default_date_format(),
            list_limit: default_list_limit(),
            import: ImportSettings::default(),
            pdf: PdfSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &TallyPaths) -> Result<Self, TallyError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| TallyError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                TallyError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            settings.validate()?;
            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &TallyPaths) -> Result<(), TallyError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| TallyError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| TallyError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Reject values that would break formatting or layout
    pub fn validate(&self) -> Result<(), TallyError> {
        if self.list_limit == 0 {
            return Err(TallyError::Config("list_limit must be at least 1".into()));
        }
        if !(4.0..=24.0).contains(&self.pdf.font_size) {
            return Err(TallyError::Config(format!(
                "pdf.font_size must be between 4 and 24 (got {})",
                self.pdf.font_size
            )));
        }
        if !is_valid_strftime(&self.date_format) {
            return Err(TallyError::Config(format!(
                "date_format '{}' is not a valid strftime pattern",
                self.date_format
            )));
        }
        if let Some(format) = self.import.date_format.as_deref().filter(|f| !is_valid_strftime(f)) {
            return Err(TallyError::Config(format!(
                "import.date_format '{}' is not a valid strftime pattern",
                format
            )));
        }
        if self.import.tag_separator.is_alphanumeric() || self.import.tag_separator == '"' {
            return Err(TallyError::Config(format!(
                "import.tag_separator cannot be '{}'",
                self.import.tag_separator
            )));
        }
        Ok(())
    }

    /// Format a date for display using the configured format
    pub fn format_date(&self, date: chrono::NaiveDate) -> String {
        date.format(&self.date_format).to_string()
    }
}

/// Formatting with a malformed pattern panics, so patterns are checked up front
pub fn is_valid_strftime(format: &str) -> bool {
    !format.is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}
