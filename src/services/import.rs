//! CSV import service
//!
//! Reads bank or spreadsheet exports with a header row. Columns are matched
//! through a fixed synonym dictionary, dates are sniffed against a list of
//! common formats, and rows that cannot be read are skipped and reported
//! instead of aborting the import. Import is two-phase: [`ImportService::preview`]
//! marks each row new or duplicate, [`ImportService::commit`] writes the new ones.

use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::config::settings::Settings;
use crate::error::{TallyError, TallyResult};
use crate::models::tag::split_tag_list;
use crate::models::transaction::generate_import_id;
use crate::models::{Category, Money, Subcategory, Transaction, TransactionId, TransactionKind};
use crate::storage::Storage;

/// Date formats tried in order after the user's own format; the first that parses wins
pub const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m/%d/%y",
    "%d/%m/%y",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%d %b %Y",
    "%B %d, %Y",
];

/// Timestamp layouts accepted by date part when no date format matches
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// A logical column the importer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportField {
    Date,
    Amount,
    Description,
    Category,
    Subcategory,
    Tags,
    Source,
    Notes,
    Kind,
}

/// Accepted header names per field, compared after lowercasing and trimming
const HEADER_SYNONYMS: &[(ImportField, &[&str])] = &[
    (
        ImportField::Date,
        &["date", "transaction date", "posted", "posting date", "booking date", "day"],
    ),
    (
        ImportField::Amount,
        &["amount", "value", "sum", "total", "price", "cost"],
    ),
    (
        ImportField::Description,
        &["description", "desc", "details", "narrative", "payee", "merchant", "name", "title"],
    ),
    (ImportField::Category, &["category", "cat"]),
    (
        ImportField::Subcategory,
        &["subcategory", "sub-category", "sub category", "subcat"],
    ),
    (ImportField::Tags, &["tags", "tag", "labels", "label"]),
    (
        ImportField::Source,
        &["source", "from", "payer", "income source"],
    ),
    (
        ImportField::Notes,
        &["notes", "note", "memo", "comment", "comments"],
    ),
    (ImportField::Kind, &["type", "kind", "direction"]),
];

const EXPENSE_WORDS: &[&str] = &["expense", "expenses", "debit", "withdrawal", "out", "outflow"];
const INCOME_WORDS: &[&str] = &["income", "credit", "deposit", "in", "inflow"];

/// Which kind of transaction rows become
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportKind {
    Expense,
    Income,
    /// Decide per row from a type column, else from the amount's sign
    #[default]
    Auto,
}

impl FromStr for ImportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "expense" | "expenses" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            "auto" => Ok(Self::Auto),
            other => Err(format!(
                "Unknown import kind '{}'. Use expense, income or auto",
                other
            )),
        }
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expense => write!(f, "expense"),
            Self::Income => write!(f, "income"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

/// Options controlling one import
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub kind: ImportKind,
    /// Tried before [`DATE_FORMATS`]
    pub date_format: Option<String>,
    pub tag_separator: char,
    pub create_missing_categories: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            kind: ImportKind::Auto,
            date_format: None,
            tag_separator: ';',
            create_missing_categories: true,
        }
    }
}

impl ImportOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            kind: ImportKind::Auto,
            date_format: settings.import.date_format.clone(),
            tag_separator: settings.import.tag_separator,
            create_missing_categories: settings.import.create_missing_categories,
        }
    }

    pub fn with_kind(mut self, kind: ImportKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }
}

/// Column positions resolved from the header row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    pub date: usize,
    pub amount: usize,
    pub description: Option<usize>,
    pub category: Option<usize>,
    pub subcategory: Option<usize>,
    pub tags: Option<usize>,
    pub source: Option<usize>,
    pub notes: Option<usize>,
    pub kind: Option<usize>,
}

fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Field a header names, if any
pub fn field_for_header(header: &str) -> Option<ImportField> {
    let normalized = normalize_header(header);
    HEADER_SYNONYMS
        .iter()
        .find(|(_, names)| names.contains(&normalized.as_str()))
        .map(|(field, _)| *field)
}

impl ColumnMapping {
    /// Map header cells to fields; the first header matching a field wins
    ///
    /// # Errors
    ///
    /// Fails when no date or no amount column is present.
    pub fn from_headers(headers: &StringRecord) -> TallyResult<Self> {
        let mut date = None;
        let mut amount = None;
        let mut mapping = ColumnMapping::default();

        for (idx, header) in headers.iter().enumerate() {
            let Some(field) = field_for_header(header) else {
                tracing::debug!(column = idx, header, "ignoring unknown column");
                continue;
            };
            let slot = match field {
                ImportField::Date => &mut date,
                ImportField::Amount => &mut amount,
                ImportField::Description => &mut mapping.description,
                ImportField::Category => &mut mapping.category,
                ImportField::Subcategory => &mut mapping.subcategory,
                ImportField::Tags => &mut mapping.tags,
                ImportField::Source => &mut mapping.source,
                ImportField::Notes => &mut mapping.notes,
                ImportField::Kind => &mut mapping.kind,
            };
            if slot.is_none() {
                *slot = Some(idx);
            }
        }

        let expected = |field: ImportField| {
            HEADER_SYNONYMS
                .iter()
                .find(|(f, _)| *f == field)
                .map(|(_, names)| names.join(", "))
                .unwrap_or_default()
        };
        mapping.date = date.ok_or_else(|| {
            TallyError::Import(format!(
                "CSV header has no date column (expected one of: {})",
                expected(ImportField::Date)
            ))
        })?;
        mapping.amount = amount.ok_or_else(|| {
            TallyError::Import(format!(
                "CSV header has no amount column (expected one of: {})",
                expected(ImportField::Amount)
            ))
        })?;

        Ok(mapping)
    }
}

/// Parse a date cell, trying `user_format` first, then [`DATE_FORMATS`], then timestamps
pub fn parse_date(s: &str, user_format: Option<&str>) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for format in user_format.into_iter().chain(DATE_FORMATS.iter().copied()) {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            // %Y also reads "25" as year 25; leave two-digit years to %y
            if format.contains("%Y") && date.year() < 1000 {
                continue;
            }
            return Some(date);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .map(|dt| dt.date())
}

/// Parse an amount cell into a signed amount
///
/// Currency symbols, thousands separators and spaces are ignored; a value
/// wrapped in parentheses or with a leading or trailing minus is negative.
pub fn parse_amount(s: &str) -> Result<Money, String> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '(' | ')'))
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return Err(format!("invalid amount '{}'", s.trim()));
    }

    let (negative, value) = if let Some(inner) = cleaned
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        (true, inner)
    } else if let Some(rest) = cleaned.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = cleaned.strip_suffix('-') {
        (true, rest)
    } else {
        (false, cleaned.as_str())
    };

    let amount = Money::parse(value).map_err(|_| format!("invalid amount '{}'", s.trim()))?;
    Ok(if negative { -amount } else { amount })
}

fn kind_from_word(word: &str) -> Option<TransactionKind> {
    let word = word.trim().to_lowercase();
    if EXPENSE_WORDS.contains(&word.as_str()) {
        Some(TransactionKind::Expense)
    } else if INCOME_WORDS.contains(&word.as_str()) {
        Some(TransactionKind::Income)
    } else {
        None
    }
}

/// A row that failed to parse or import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// Line number in the file (the header is line 1)
    pub row: usize,
    pub reason: String,
}

impl RowError {
    pub fn new(row: usize, reason: impl Into<String>) -> Self {
        Self {
            row,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.row, self.reason)
    }
}

/// A CSV row read into transaction fields, before categories are resolved
#[derive(Debug, Clone)]
pub struct ParsedRow {
    pub row: usize,
    pub kind: TransactionKind,
    pub date: NaiveDate,
    /// Always positive
    pub amount: Money,
    pub description: String,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub tags: Vec<String>,
    pub source: String,
    pub notes: String,
    pub import_id: String,
}

/// Everything read from one file
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub rows: Vec<ParsedRow>,
    pub errors: Vec<RowError>,
}

/// Whether a row would be imported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    New,
    /// Already in storage, or repeated earlier in the same file
    Duplicate,
}

#[derive(Debug, Clone)]
pub struct ImportPreviewEntry {
    pub row: ParsedRow,
    pub status: ImportStatus,
    /// The stored transaction this row duplicates, if any
    pub existing_id: Option<TransactionId>,
}

/// Rows classified for review before committing
#[derive(Debug, Clone, Default)]
pub struct ImportPreview {
    pub entries: Vec<ImportPreviewEntry>,
    pub errors: Vec<RowError>,
}

impl ImportPreview {
    pub fn new_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == ImportStatus::New)
            .count()
    }

    pub fn duplicate_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == ImportStatus::Duplicate)
            .count()
    }
}

/// Result of a completed import
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub duplicates: usize,
    /// Rows that could not be parsed or stored
    pub skipped: usize,
    pub errors: Vec<RowError>,
    /// Rows imported with something dropped (unknown category, bad tag)
    pub warnings: Vec<RowError>,
    pub created_categories: Vec<String>,
    pub imported_ids: Vec<TransactionId>,
}

/// Service for CSV import
pub struct ImportService<'a> {
    storage: &'a Storage,
}

impl<'a> ImportService<'a> {
    /// Create a new import service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Parse a CSV file
    pub fn parse_file(&self, path: &Path, options: &ImportOptions) -> TallyResult<ParseOutcome> {
        let file = std::fs::File::open(path).map_err(|e| {
            TallyError::Import(format!("Cannot open {}: {}", path.display(), e))
        })?;
        self.parse_reader(file, options)
    }

    /// Parse CSV data with a header row
    ///
    /// Only an unreadable header fails the whole parse; bad rows are collected
    /// in [`ParseOutcome::errors`].
    pub fn parse_reader<R: Read>(&self, reader: R, options: &ImportOptions) -> TallyResult<ParseOutcome> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| TallyError::Import(format!("Cannot read CSV header: {}", e)))?
            .clone();
        let mapping = ColumnMapping::from_headers(&headers)?;
        tracing::debug!(?mapping, "resolved CSV columns");

        let mut outcome = ParseOutcome::default();
        for (idx, result) in reader.records().enumerate() {
            let fallback_row = idx + 2;
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    let row = e
                        .position()
                        .map(|p| p.line() as usize)
                        .unwrap_or(fallback_row);
                    let error = RowError::new(row, format!("unreadable record: {}", e));
                    tracing::warn!(row, reason = %error.reason, "skipping CSV row");
                    outcome.errors.push(error);
                    continue;
                }
            };

            if record.iter().all(|cell| cell.is_empty()) {
                continue;
            }

            let row = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(fallback_row);
            match parse_record(&record, row, &mapping, options) {
                Ok(parsed) => outcome.rows.push(parsed),
                Err(reason) => {
                    tracing::warn!(row, reason = %reason, "skipping CSV row");
                    outcome.errors.push(RowError::new(row, reason));
                }
            }
        }

        tracing::info!(
            rows = outcome.rows.len(),
            skipped = outcome.errors.len(),
            "parsed CSV"
        );
        Ok(outcome)
    }

    /// Mark each parsed row new or duplicate
    pub fn preview(&self, parsed: ParseOutcome) -> TallyResult<ImportPreview> {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(parsed.rows.len());

        for row in parsed.rows {
            let existing = self.storage.transactions.find_by_import_id(&row.import_id)?;
            let repeated = !seen.insert(row.import_id.clone());

            let (status, existing_id) = match existing {
                Some(txn) => (ImportStatus::Duplicate, Some(txn.id)),
                None if repeated => (ImportStatus::Duplicate, None),
                None => (ImportStatus::New, None),
            };
            entries.push(ImportPreviewEntry {
                row,
                status,
                existing_id,
            });
        }

        Ok(ImportPreview {
            entries,
            errors: parsed.errors,
        })
    }

    /// Store every new row from a preview; storage is saved once at the end
    pub fn commit(&self, preview: &ImportPreview, options: &ImportOptions) -> TallyResult<ImportReport> {
        let mut report = ImportReport {
            skipped: preview.errors.len(),
            errors: preview.errors.clone(),
            ..Default::default()
        };
        let mut created_tags = false;

        for entry in &preview.entries {
            if entry.status == ImportStatus::Duplicate {
                report.duplicates += 1;
                continue;
            }

            let row = &entry.row;
            let mut txn = Transaction::new(row.kind, row.date, row.amount);
            txn.description = row.description.clone();
            txn.source = row.source.clone();
            txn.notes = row.notes.clone();
            txn.import_id = Some(row.import_id.clone());

            // Nothing is created for a row that will be skipped
            if let Err(e) = txn.validate() {
                tracing::warn!(row = row.row, reason = %e, "skipping CSV row");
                report.errors.push(RowError::new(row.row, e.to_string()));
                report.skipped += 1;
                continue;
            }

            if row.kind.is_expense() {
                self.assign_category(&mut txn, row, options, &mut report)?;
            }

            for name in &row.tags {
                match self.storage.tags.get_or_create(name) {
                    Ok((tag, created)) => {
                        created_tags |= created;
                        txn.add_tag(tag.id);
                    }
                    Err(e) if e.is_validation() => {
                        report
                            .warnings
                            .push(RowError::new(row.row, format!("tag '{}' dropped: {}", name, e)));
                    }
                    Err(e) => return Err(e),
                }
            }

            report.imported_ids.push(txn.id);
            self.storage.transactions.upsert(txn)?;
            report.imported += 1;
        }

        if !report.created_categories.is_empty() {
            self.storage.categories.save()?;
        }
        if created_tags {
            self.storage.tags.save()?;
        }
        if report.imported > 0 {
            self.storage.transactions.save()?;
        }

        tracing::info!(
            imported = report.imported,
            duplicates = report.duplicates,
            skipped = report.skipped,
            "import finished"
        );
        Ok(report)
    }

    fn assign_category(
        &self,
        txn: &mut Transaction,
        row: &ParsedRow,
        options: &ImportOptions,
        report: &mut ImportReport,
    ) -> TallyResult<()> {
        let Some(category_name) = row.category.as_deref() else {
            if let Some(sub) = &row.subcategory {
                report.warnings.push(RowError::new(
                    row.row,
                    format!("subcategory '{}' ignored without a category", sub),
                ));
            }
            return Ok(());
        };

        let category = match self.storage.categories.get_category_by_name(category_name)? {
            Some(category) => category,
            None if options.create_missing_categories => {
                let category = Category::with_sort_order(
                    category_name,
                    self.storage.categories.next_sort_order()?,
                );
                if let Err(e) = category.validate() {
                    report.warnings.push(RowError::new(
                        row.row,
                        format!("category '{}' ignored: {}", category_name, e),
                    ));
                    return Ok(());
                }
                self.storage.categories.upsert_category(category.clone())?;
                report.created_categories.push(category.name.clone());
                tracing::info!(name = %category.name, "created category during import");
                category
            }
            None => {
                report.warnings.push(RowError::new(
                    row.row,
                    format!("unknown category '{}'; imported uncategorized", category_name),
                ));
                return Ok(());
            }
        };

        let subcategory = match row.subcategory.as_deref() {
            None => None,
            Some(name) => match self
                .storage
                .categories
                .get_subcategory_by_name(category.id, name)?
            {
                Some(sub) => Some(sub.id),
                None if options.create_missing_categories => {
                    let sub = Subcategory::new(category.id, name);
                    match sub.validate() {
                        Ok(()) => {
                            self.storage.categories.upsert_subcategory(sub.clone())?;
                            report
                                .created_categories
                                .push(format!("{}/{}", category.name, sub.name));
                            Some(sub.id)
                        }
                        Err(e) => {
                            report.warnings.push(RowError::new(
                                row.row,
                                format!("subcategory '{}' ignored: {}", name, e),
                            ));
                            None
                        }
                    }
                }
                None => {
                    report.warnings.push(RowError::new(
                        row.row,
                        format!("unknown subcategory '{}/{}'", category.name, name),
                    ));
                    None
                }
            },
        };

        txn.set_category(category.id, subcategory);
        Ok(())
    }
}

fn cell<'r>(record: &'r StringRecord, column: Option<usize>) -> &'r str {
    column.and_then(|c| record.get(c)).unwrap_or("").trim()
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn parse_record(
    record: &StringRecord,
    row: usize,
    mapping: &ColumnMapping,
    options: &ImportOptions,
) -> Result<ParsedRow, String> {
    let date_cell = cell(record, Some(mapping.date));
    if date_cell.is_empty() {
        return Err("missing date".into());
    }
    let date = parse_date(date_cell, options.date_format.as_deref())
        .ok_or_else(|| format!("unrecognized date '{}'", date_cell))?;

    let amount_cell = cell(record, Some(mapping.amount));
    if amount_cell.is_empty() {
        return Err("missing amount".into());
    }
    let signed = parse_amount(amount_cell)?;
    if signed.is_zero() {
        return Err("amount is zero".into());
    }

    let kind = match options.kind {
        ImportKind::Expense => TransactionKind::Expense,
        ImportKind::Income => TransactionKind::Income,
        ImportKind::Auto => {
            let type_cell = cell(record, mapping.kind);
            if type_cell.is_empty() {
                if signed.is_negative() {
                    TransactionKind::Expense
                } else {
                    TransactionKind::Income
                }
            } else {
                kind_from_word(type_cell)
                    .ok_or_else(|| format!("unknown transaction type '{}'", type_cell))?
            }
        }
    };

    let description = cell(record, mapping.description).to_string();
    let source = cell(record, mapping.source).to_string();
    let amount = signed.abs();

    let mut candidate = Transaction::new(kind, date, amount);
    candidate.description = description;
    candidate.validate().map_err(|e| e.to_string())?;
    let description = candidate.description;

    let key = if description.is_empty() { &source } else { &description };
    let import_id = generate_import_id(kind, date, amount, key);

    let (category, subcategory) = if kind.is_expense() {
        (
            non_empty(cell(record, mapping.category)),
            non_empty(cell(record, mapping.subcategory)),
        )
    } else {
        (None, None)
    };

    Ok(ParsedRow {
        row,
        kind,
        date,
        amount,
        description,
        category,
        subcategory,
        tags: split_tag_list(cell(record, mapping.tags), options.tag_separator),
        source,
        notes: cell(record, mapping.notes).to_string(),
        import_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn headers(line: &str) -> StringRecord {
        StringRecord::from(line.split(',').collect::<Vec<_>>())
    }

    #[test]
    fn test_header_synonyms() {
        let mapping =
            ColumnMapping::from_headers(&headers("Posting Date,Merchant,Value,Memo,Labels,Cat"))
                .unwrap();
        assert_eq!(mapping.date, 0);
        assert_eq!(mapping.description, Some(1));
        assert_eq!(mapping.amount, 2);
        assert_eq!(mapping.notes, Some(3));
        assert_eq!(mapping.tags, Some(4));
        assert_eq!(mapping.category, Some(5));
        assert_eq!(mapping.kind, None);
    }

    #[test]
    fn test_first_matching_header_wins() {
        let mapping =
            ColumnMapping::from_headers(&headers("date,amount,payee,description")).unwrap();
        assert_eq!(mapping.description, Some(2));
    }

    #[test]
    fn test_header_normalization() {
        assert_eq!(field_for_header("\u{feff}Date"), Some(ImportField::Date));
        assert_eq!(field_for_header("  TRANSACTION_DATE "), Some(ImportField::Date));
        assert_eq!(field_for_header("Sub  Category"), Some(ImportField::Subcategory));
        assert_eq!(field_for_header("balance"), None);
    }

    #[test]
    fn test_missing_required_headers() {
        let err = ColumnMapping::from_headers(&headers("when,amount")).unwrap_err();
        assert!(matches!(err, TallyError::Import(_)));
        assert!(err.to_string().contains("date"));

        let err = ColumnMapping::from_headers(&headers("date,description")).unwrap_err();
        assert!(err.to_string().contains("amount"));
    }

    #[test]
    fn test_date_sniffing() {
        assert_eq!(parse_date("2025-01-15", None), Some(ymd(2025, 1, 15)));
        assert_eq!(parse_date("01/15/2025", None), Some(ymd(2025, 1, 15)));
        assert_eq!(parse_date("15/01/2025", None), Some(ymd(2025, 1, 15)));
        assert_eq!(parse_date("01/15/25", None), Some(ymd(2025, 1, 15)));
        assert_eq!(parse_date("2025/01/15", None), Some(ymd(2025, 1, 15)));
        assert_eq!(parse_date("15.01.2025", None), Some(ymd(2025, 1, 15)));
        assert_eq!(parse_date("Jan 15, 2025", None), Some(ymd(2025, 1, 15)));
        assert_eq!(parse_date("15 Jan 2025", None), Some(ymd(2025, 1, 15)));
        assert_eq!(parse_date("January 15, 2025", None), Some(ymd(2025, 1, 15)));
        assert_eq!(parse_date("2025-01-15T10:00:00Z", None), Some(ymd(2025, 1, 15)));
        assert_eq!(parse_date("2025-01-15 08:30:00", None), Some(ymd(2025, 1, 15)));
        assert_eq!(parse_date("yesterday", None), None);
        assert_eq!(parse_date("", None), None);
    }

    #[test]
    fn test_ambiguous_date_prefers_month_first() {
        assert_eq!(parse_date("02/03/2025", None), Some(ymd(2025, 2, 3)));
        assert_eq!(
            parse_date("02/03/2025", Some("%d/%m/%Y")),
            Some(ymd(2025, 3, 2))
        );
    }

    #[test]
    fn test_amount_cleaning() {
        assert_eq!(parse_amount("$1,234.56").unwrap().cents(), 123456);
        assert_eq!(parse_amount("-12.50").unwrap().cents(), -1250);
        assert_eq!(parse_amount("(12.00)").unwrap().cents(), -1200);
        assert_eq!(parse_amount("12.00-").unwrap().cents(), -1200);
        assert_eq!(parse_amount("€ 5").unwrap().cents(), 500);
        assert_eq!(parse_amount("1 000.00").unwrap().cents(), 100000);
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("1.2.3").is_err());
        assert!(parse_amount("12.345").is_err());
    }

    #[test]
    fn test_parse_auto_kind_from_sign_and_type() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ImportService::new(&storage);

        let csv_data = "\
Date,Description,Amount,Type
2025-01-15,Supermarket,-45.50,
2025-01-16,Salary,3000.00,
2025-01-17,Refund,20.00,debit
2025-01-18,Gift,-20.00,Credit
";
        let outcome = service
            .parse_reader(csv_data.as_bytes(), &ImportOptions::default())
            .unwrap();
        assert!(outcome.errors.is_empty());

        let kinds: Vec<_> = outcome.rows.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TransactionKind::Expense,
                TransactionKind::Income,
                TransactionKind::Expense,
                TransactionKind::Income,
            ]
        );
        assert!(outcome.rows.iter().all(|r| r.amount.is_positive()));
        assert_eq!(outcome.rows[0].amount.cents(), 4550);
    }

    #[test]
    fn test_explicit_kind_uses_absolute_amount() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ImportService::new(&storage);

        let csv_data = "date,amount,description\n2025-01-15,-10.00,A\n2025-01-16,10.00,B\n";
        let options = ImportOptions::default().with_kind(ImportKind::Expense);
        let outcome = service.parse_reader(csv_data.as_bytes(), &options).unwrap();

        assert_eq!(outcome.rows.len(), 2);
        assert!(outcome.rows.iter().all(|r| r.kind.is_expense()));
        assert!(outcome.rows.iter().all(|r| r.amount.cents() == 1000));
    }

    #[test]
    fn test_bad_rows_are_skipped_with_row_numbers() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ImportService::new(&storage);

        let csv_data = "\
date,amount,description
2025-01-15,-10.00,Good
not a date,-5.00,Bad date
2025-01-16,lots,Bad amount
2025-01-17,0.00,Zero
,-1.00,No date
2025-01-18
2025-01-19,-7.00,Fine
2025-01-20,-3.00,Also good
";
        let outcome = service
            .parse_reader(csv_data.as_bytes(), &ImportOptions::default())
            .unwrap();

        assert_eq!(outcome.rows.len(), 3);
        let rows: Vec<_> = outcome.errors.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![3, 4, 5, 6, 7]);
        assert!(outcome.errors[0].reason.contains("date"));
        assert!(outcome.errors[1].reason.contains("amount"));
        assert!(outcome.errors[2].reason.contains("zero"));
        assert!(outcome.errors[4].reason.contains("missing amount"));
    }

    #[test]
    fn test_unknown_type_value_is_row_error() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ImportService::new(&storage);

        let csv_data = "date,amount,type\n2025-01-15,10.00,transfer\n";
        let outcome = service
            .parse_reader(csv_data.as_bytes(), &ImportOptions::default())
            .unwrap();
        assert!(outcome.rows.is_empty());
        assert_eq!(outcome.errors[0], RowError::new(2, "unknown transaction type 'transfer'"));
    }

    #[test]
    fn test_tags_split_and_trimmed() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ImportService::new(&storage);

        let csv_data = "date,amount,tags\n2025-01-15,-1.00,\" trip ; work| ;Trip\"\n";
        let outcome = service
            .parse_reader(csv_data.as_bytes(), &ImportOptions::default())
            .unwrap();
        assert_eq!(outcome.rows[0].tags, vec!["trip", "work"]);
    }

    #[test]
    fn test_income_rows_ignore_category_columns() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ImportService::new(&storage);

        let csv_data = "date,amount,category,source\n2025-01-15,2500.00,Salary,Acme\n";
        let outcome = service
            .parse_reader(csv_data.as_bytes(), &ImportOptions::default())
            .unwrap();
        let row = &outcome.rows[0];
        assert!(row.kind.is_income());
        assert_eq!(row.category, None);
        assert_eq!(row.source, "Acme");
    }

    #[test]
    fn test_preview_marks_duplicates_in_storage_and_file() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ImportService::new(&storage);
        let options = ImportOptions::default();

        let csv_data = "date,amount,description\n2025-01-15,-4.50,Coffee\n2025-01-15,-4.50,coffee\n2025-01-16,-9.00,Lunch\n";
        let parsed = service.parse_reader(csv_data.as_bytes(), &options).unwrap();
        let preview = service.preview(parsed).unwrap();

        let statuses: Vec<_> = preview.entries.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![ImportStatus::New, ImportStatus::Duplicate, ImportStatus::New]
        );

        let report = service.commit(&preview, &options).unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(report.duplicates, 1);

        let parsed = service.parse_reader(csv_data.as_bytes(), &options).unwrap();
        let preview = service.preview(parsed).unwrap();
        assert_eq!(preview.new_count(), 0);
        assert_eq!(preview.duplicate_count(), 3);
        assert!(preview.entries[0].existing_id.is_some());
    }

    #[test]
    fn test_commit_creates_missing_categories() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ImportService::new(&storage);
        let options = ImportOptions::default();

        let csv_data = "\
date,amount,description,category,subcategory,tags
2025-02-01,-60.00,Market,Food,Groceries,weekly
2025-02-02,-15.00,Cafe,food,Coffee,
2025-02-03,-30.00,Cinema,Fun,,
";
        let parsed = service.parse_reader(csv_data.as_bytes(), &options).unwrap();
        let preview = service.preview(parsed).unwrap();
        let report = service.commit(&preview, &options).unwrap();

        assert_eq!(report.imported, 3);
        assert_eq!(
            report.created_categories,
            vec!["Food", "Food/Groceries", "Food/Coffee", "Fun"]
        );
        assert_eq!(storage.categories.category_count().unwrap(), 2);
        assert_eq!(storage.tags.count().unwrap(), 1);

        let food = storage.categories.get_category_by_name("food").unwrap().unwrap();
        assert_eq!(storage.transactions.get_by_category(food.id).unwrap().len(), 2);
    }

    #[test]
    fn test_commit_without_creating_categories_warns() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ImportService::new(&storage);
        let options = ImportOptions {
            create_missing_categories: false,
            ..Default::default()
        };

        let csv_data = "date,amount,description,category\n2025-02-01,-60.00,Market,Food\n";
        let parsed = service.parse_reader(csv_data.as_bytes(), &options).unwrap();
        let preview = service.preview(parsed).unwrap();
        let report = service.commit(&preview, &options).unwrap();

        assert_eq!(report.imported, 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].row, 2);
        assert!(storage.transactions.get_all().unwrap()[0].is_uncategorized());
        assert_eq!(storage.categories.category_count().unwrap(), 0);
    }

    #[test]
    fn test_commit_reports_parse_errors() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ImportService::new(&storage);
        let options = ImportOptions::default();

        let csv_data = "date,amount\nbad,1.00\n2025-01-01,-1.00\n";
        let parsed = service.parse_reader(csv_data.as_bytes(), &options).unwrap();
        let preview = service.preview(parsed).unwrap();
        let report = service.commit(&preview, &options).unwrap();

        assert_eq!(report.imported, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.errors[0].row, 2);
    }

    #[test]
    fn test_overlong_description_is_row_error() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ImportService::new(&storage);
        let options = ImportOptions::default();

        let csv_data = format!(
            "date,amount,description,category,tags\n2025-03-01,-5.00,{},Ghost,phantom\n2025-03-02,-6.00,{},Ghost,\n",
            "x".repeat(250),
            "y".repeat(200),
        );
        let parsed = service.parse_reader(csv_data.as_bytes(), &options).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].row, 2);
        assert!(parsed.errors[0].reason.contains("Description too long"));

        let preview = service.preview(parsed).unwrap();
        assert_eq!(preview.new_count(), 1);

        let report = service.commit(&preview, &options).unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.created_categories, vec!["Ghost"]);
        assert_eq!(storage.categories.category_count().unwrap(), 1);
        assert_eq!(storage.tags.count().unwrap(), 0);
    }

    #[test]
    fn test_commit_creates_nothing_for_invalid_row() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ImportService::new(&storage);
        let options = ImportOptions::default();

        let row = ParsedRow {
            row: 2,
            kind: TransactionKind::Expense,
            date: ymd(2025, 3, 1),
            amount: Money::from_cents(500),
            description: "x".repeat(201),
            category: Some("Ghost".into()),
            subcategory: Some("Shade".into()),
            tags: vec!["phantom".into()],
            source: String::new(),
            notes: String::new(),
            import_id: "imp-test".into(),
        };
        let preview = ImportPreview {
            entries: vec![ImportPreviewEntry {
                row,
                status: ImportStatus::New,
                existing_id: None,
            }],
            errors: Vec::new(),
        };

        let report = service.commit(&preview, &options).unwrap();
        assert_eq!(report.imported, 0);
        assert_eq!(report.skipped, 1);
        assert!(report.created_categories.is_empty());
        assert_eq!(storage.categories.category_count().unwrap(), 0);
        assert_eq!(storage.tags.count().unwrap(), 0);
        assert_eq!(storage.transactions.count().unwrap(), 0);
    }

    #[test]
    fn test_amount_with_extra_decimals_is_row_error() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ImportService::new(&storage);

        let csv_data = "date,amount\n2025-01-15,-12.345\n2025-01-16,\"1.234,56\"\n2025-01-17,-12.30\n";
        let outcome = service
            .parse_reader(csv_data.as_bytes(), &ImportOptions::default())
            .unwrap();
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].amount.cents(), 1230);
        let rows: Vec<_> = outcome.errors.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![2, 3]);
        assert!(outcome.errors[0].reason.contains("invalid amount"));
    }

    #[test]
    fn test_user_date_format_from_options() {
        let (_temp_dir, storage) = create_test_storage();
        let service = ImportService::new(&storage);
        let options = ImportOptions::default().with_date_format("%d/%m/%Y");

        let csv_data = "date,amount\n04/05/2025,-1.00\n";
        let outcome = service.parse_reader(csv_data.as_bytes(), &options).unwrap();
        assert_eq!(outcome.rows[0].date, ymd(2025, 5, 4));
    }
}
