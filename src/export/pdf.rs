//! PDF report rendering
//!
//! A small table layout on top of `printpdf`: a title block, one table whose
//! header repeats on every page, and closing summary lines. Pages are planned
//! before drawing so every footer can say "Page n of m".
//!
//! Built-in Helvetica only covers Latin text; other characters print as `?`.

use std::path::Path;

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use crate::config::settings::{Paper, PdfSettings, Settings};
use crate::error::{TallyError, TallyResult};
use crate::models::Transaction;
use crate::reports::{BudgetReport, SpendingReport, SummaryReport};
use crate::services::{FilterContext, TransactionService};
use crate::storage::Storage;

const MARGIN_MM: f32 = 15.0;
const PT_TO_MM: f32 = 0.3528;
/// Average Helvetica glyph width as a fraction of the font size
const GLYPH_WIDTH: f32 = 0.5;
const CELL_PADDING_MM: f32 = 1.5;
const LINE_SPACING: f32 = 1.5;
const TITLE_SCALE: f32 = 1.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Right,
}

/// One table column
#[derive(Debug, Clone, PartialEq)]
pub struct PdfColumn {
    pub title: String,
    pub width_mm: f32,
    pub align: Align,
}

impl PdfColumn {
    pub fn left(title: impl Into<String>, width_mm: f32) -> Self {
        Self {
            title: title.into(),
            width_mm,
            align: Align::Left,
        }
    }

    pub fn right(title: impl Into<String>, width_mm: f32) -> Self {
        Self {
            title: title.into(),
            width_mm,
            align: Align::Right,
        }
    }
}

/// A line of the planned layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Line {
    Title,
    Subtitle(usize),
    Header,
    Row(usize),
    Summary(usize),
    Gap,
}

/// Builder for a single-table PDF report
#[derive(Debug, Clone)]
pub struct PdfReport {
    title: String,
    subtitles: Vec<String>,
    columns: Vec<PdfColumn>,
    rows: Vec<Vec<String>>,
    summary: Vec<String>,
    paper: Paper,
    font_size: f32,
}

impl PdfReport {
    pub fn new(title: impl Into<String>) -> Self {
        let defaults = PdfSettings::default();
        Self {
            title: title.into(),
            subtitles: Vec::new(),
            columns: Vec::new(),
            rows: Vec::new(),
            summary: Vec::new(),
            paper: defaults.paper,
            font_size: defaults.font_size,
        }
    }

    /// Title, paper and font size from settings
    pub fn from_settings(settings: &PdfSettings) -> Self {
        Self::new(settings.title.clone())
            .paper(settings.paper)
            .font_size(settings.font_size)
    }

    pub fn paper(mut self, paper: Paper) -> Self {
        self.paper = paper;
        self
    }

    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }

    pub fn subtitle(mut self, line: impl Into<String>) -> Self {
        self.subtitles.push(line.into());
        self
    }

    pub fn columns(mut self, columns: Vec<PdfColumn>) -> Self {
        self.columns = columns;
        self
    }

    /// Append a row; missing cells are blank, extra cells are dropped
    pub fn push_row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn summary_line(mut self, line: impl Into<String>) -> Self {
        self.summary.push(line.into());
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn line_height(&self) -> f32 {
        self.font_size * PT_TO_MM * LINE_SPACING
    }

    fn height_of(&self, line: Line) -> f32 {
        match line {
            Line::Title => self.line_height() * TITLE_SCALE,
            Line::Gap => self.line_height() * 0.5,
            _ => self.line_height(),
        }
    }

    /// Usable vertical space per page, leaving room for the footer
    fn body_height(&self) -> f32 {
        let (_, height) = self.paper.dimensions_mm();
        height - 2.0 * MARGIN_MM - self.line_height() * 2.0
    }

    /// Split the report into pages; a table continuing onto a new page
    /// starts with its header again
    pub(crate) fn paginate(&self) -> Vec<Vec<Line>> {
        let mut flow = vec![Line::Title];
        flow.extend((0..self.subtitles.len()).map(Line::Subtitle));
        flow.push(Line::Gap);
        if !self.columns.is_empty() {
            flow.push(Line::Header);
            flow.extend((0..self.rows.len()).map(Line::Row));
        }
        if !self.summary.is_empty() {
            flow.push(Line::Gap);
            flow.extend((0..self.summary.len()).map(Line::Summary));
        }

        let budget = self.body_height();
        let mut pages: Vec<Vec<Line>> = vec![Vec::new()];
        let mut used = 0.0;

        for line in flow {
            let height = self.height_of(line);
            if used + height > budget {
                let mut page = Vec::new();
                used = 0.0;
                if matches!(line, Line::Row(_)) {
                    page.push(Line::Header);
                    used += self.height_of(Line::Header);
                }
                pages.push(page);
            }
            // A gap at the top of a page is wasted space
            if line == Line::Gap && used == 0.0 {
                continue;
            }
            if let Some(page) = pages.last_mut() {
                page.push(line);
            }
            used += height;
        }

        pages
    }

    pub fn page_count(&self) -> usize {
        self.paginate().len()
    }

    /// Render to PDF bytes
    pub fn render(&self) -> TallyResult<Vec<u8>> {
        let (width, height) = self.paper.dimensions_mm();
        let pages = self.paginate();
        let total = pages.len();

        let (doc, first_page, first_layer) =
            PdfDocument::new(sanitize(&self.title), Mm(width), Mm(height), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| TallyError::Export(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| TallyError::Export(e.to_string()))?;

        for (index, lines) in pages.iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page, layer) = doc.add_page(Mm(width), Mm(height), "Layer 1");
                doc.get_page(page).get_layer(layer)
            };

            let mut y = height - MARGIN_MM;
            for line in lines {
                y -= self.height_of(*line);
                self.draw_line(&layer, *line, y, &regular, &bold);
            }

            let footer = format!("Page {} of {}", index + 1, total);
            let footer_size = self.font_size * 0.85;
            let footer_x = width - MARGIN_MM - text_width(&footer, footer_size);
            layer.use_text(footer, footer_size, Mm(footer_x), Mm(MARGIN_MM * 0.6), &regular);
        }

        let bytes = doc
            .save_to_bytes()
            .map_err(|e| TallyError::Export(e.to_string()))?;
        tracing::debug!(pages = total, rows = self.rows.len(), bytes = bytes.len(), "rendered PDF");
        Ok(bytes)
    }

    /// Render and write to a file
    pub fn save(&self, path: &Path) -> TallyResult<()> {
        let bytes = self.render()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)
            .map_err(|e| TallyError::Export(format!("Cannot write {}: {}", path.display(), e)))?;
        tracing::info!(path = %path.display(), "wrote PDF report");
        Ok(())
    }

    fn draw_line(
        &self,
        layer: &PdfLayerReference,
        line: Line,
        y: f32,
        regular: &IndirectFontRef,
        bold: &IndirectFontRef,
    ) {
        let size = self.font_size;
        match line {
            Line::Title => {
                layer.use_text(sanitize(&self.title), size * TITLE_SCALE, Mm(MARGIN_MM), Mm(y), bold);
            }
            Line::Subtitle(i) => {
                layer.use_text(sanitize(&self.subtitles[i]), size * 1.1, Mm(MARGIN_MM), Mm(y), regular);
            }
            Line::Summary(i) => {
                layer.use_text(sanitize(&self.summary[i]), size, Mm(MARGIN_MM), Mm(y), bold);
            }
            Line::Header => {
                let titles: Vec<String> = self.columns.iter().map(|c| c.title.clone()).collect();
                self.draw_cells(layer, &titles, y, bold);
            }
            Line::Row(i) => self.draw_cells(layer, &self.rows[i], y, regular),
            Line::Gap => {}
        }
    }

    fn draw_cells(&self, layer: &PdfLayerReference, cells: &[String], y: f32, font: &IndirectFontRef) {
        let size = self.font_size;
        let mut x = MARGIN_MM;
        for (column, cell) in self.columns.iter().zip(cells.iter()) {
            let text = truncate_to_width(&sanitize(cell), column.width_mm - 2.0 * CELL_PADDING_MM, size);
            let text_x = match column.align {
                Align::Left => x + CELL_PADDING_MM,
                Align::Right => x + column.width_mm - CELL_PADDING_MM - text_width(&text, size),
            };
            layer.use_text(text, size, Mm(text_x), Mm(y), font);
            x += column.width_mm;
        }
    }
}

fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

fn char_width(font_size: f32) -> f32 {
    font_size * GLYPH_WIDTH * PT_TO_MM
}

fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * char_width(font_size)
}

/// Cut `text` to fit `width_mm`, ending in "..." when shortened
pub(crate) fn truncate_to_width(text: &str, width_mm: f32, font_size: f32) -> String {
    let max_chars = (width_mm / char_width(font_size)).floor().max(0.0) as usize;
    let len = text.chars().count();
    if len <= max_chars {
        return text.to_string();
    }
    if max_chars <= 3 {
        return text.chars().take(max_chars).collect();
    }
    let mut truncated: String = text.chars().take(max_chars - 3).collect();
    truncated.push_str("...");
    truncated
}

/// Transaction listing with totals
pub fn transactions_pdf(
    storage: &Storage,
    transactions: &[Transaction],
    settings: &Settings,
) -> TallyResult<PdfReport> {
    let ctx = FilterContext::from_storage(storage)?;
    let symbol = settings.currency_symbol.as_str();

    let mut report = PdfReport::from_settings(&settings.pdf)
        .subtitle("Transactions")
        .columns(vec![
            PdfColumn::left("Date", 22.0),
            PdfColumn::left("Type", 16.0),
            PdfColumn::left("Description", 52.0),
            PdfColumn::left("Category", 38.0),
            PdfColumn::left("Tags", 28.0),
            PdfColumn::right("Amount", 24.0),
        ]);

    if let (Some(first), Some(last)) = (
        transactions.iter().map(|t| t.date).min(),
        transactions.iter().map(|t| t.date).max(),
    ) {
        report = report.subtitle(format!(
            "{} to {}",
            settings.format_date(first),
            settings.format_date(last)
        ));
    }

    for txn in transactions {
        let label = if txn.is_income() {
            txn.source.clone()
        } else {
            String::new()
        };
        let description = if txn.description.is_empty() { label } else { txn.description.clone() };
        let category = match (txn.category_id, txn.subcategory_id) {
            (Some(cat), Some(sub)) => format!(
                "{} / {}",
                ctx.category_name(cat).unwrap_or_default(),
                ctx.subcategory_name(sub).unwrap_or_default()
            ),
            (Some(cat), None) => ctx.category_name(cat).unwrap_or_default().to_string(),
            _ => String::new(),
        };
        report.push_row(vec![
            settings.format_date(txn.date),
            txn.kind.to_string(),
            description,
            category,
            ctx.tag_names(txn).join(", "),
            txn.signed_amount().format_with_symbol(symbol),
        ]);
    }

    let totals = TransactionService::totals(transactions);
    Ok(report
        .summary_line(format!("Transactions: {}", totals.count))
        .summary_line(format!("Income: {}", totals.income.format_with_symbol(symbol)))
        .summary_line(format!("Expenses: {}", totals.expenses.format_with_symbol(symbol)))
        .summary_line(format!("Net: {}", totals.net.format_with_symbol(symbol))))
}

/// Budget progress for one month
pub fn budget_pdf(report: &BudgetReport, settings: &Settings) -> PdfReport {
    let symbol = settings.currency_symbol.as_str();
    let mut pdf = PdfReport::from_settings(&settings.pdf)
        .subtitle(format!("Budget: {}", report.month.long_name()))
        .columns(vec![
            PdfColumn::left("Category", 50.0),
            PdfColumn::right("Limit", 26.0),
            PdfColumn::right("Spent", 26.0),
            PdfColumn::right("Remaining", 26.0),
            PdfColumn::right("Used", 18.0),
            PdfColumn::left("Status", 34.0),
        ]);

    for row in &report.rows {
        pdf.push_row(vec![
            row.category_name.clone(),
            row.budget.limit.format_with_symbol(symbol),
            row.spent.format_with_symbol(symbol),
            row.remaining.format_with_symbol(symbol),
            format!("{:.0}%", row.percent_used),
            row.status.to_string(),
        ]);
    }

    pdf.summary_line(format!(
        "Total: {} of {} spent ({:.0}%)",
        report.total_spent.format_with_symbol(symbol),
        report.total_limit.format_with_symbol(symbol),
        report.percent_used()
    ))
    .summary_line(format!(
        "Remaining: {}",
        report.total_remaining.format_with_symbol(symbol)
    ))
    .summary_line(format!("Over budget: {}", report.over_budget_count()))
}

/// Spending by category with subcategory rows indented
pub fn spending_pdf(report: &SpendingReport, settings: &Settings) -> PdfReport {
    let symbol = settings.currency_symbol.as_str();
    let mut pdf = PdfReport::from_settings(&settings.pdf)
        .subtitle("Spending by Category")
        .subtitle(format!(
            "{} to {}",
            settings.format_date(report.start_date),
            settings.format_date(report.end_date)
        ))
        .columns(vec![
            PdfColumn::left("Category", 90.0),
            PdfColumn::right("Amount", 35.0),
            PdfColumn::right("Count", 25.0),
            PdfColumn::right("Share", 30.0),
        ]);

    for category in &report.categories {
        pdf.push_row(vec![
            category.category_name.clone(),
            category.total_spending.format_with_symbol(symbol),
            category.transaction_count.to_string(),
            format!("{:.1}%", category.percentage),
        ]);
        for sub in &category.subcategories {
            pdf.push_row(vec![
                format!("    {}", sub.subcategory_name),
                sub.total_spending.format_with_symbol(symbol),
                sub.transaction_count.to_string(),
                format!("{:.1}%", sub.percentage),
            ]);
        }
    }
    if report.uncategorized_count > 0 {
        pdf.push_row(vec![
            "Uncategorized".to_string(),
            report.uncategorized_spending.format_with_symbol(symbol),
            report.uncategorized_count.to_string(),
            format!("{:.1}%", report.uncategorized_percentage()),
        ]);
    }

    pdf.summary_line(format!(
        "Total spending: {}",
        report.total_spending.format_with_symbol(symbol)
    ))
    .summary_line(format!(
        "Total income: {}",
        report.total_income.format_with_symbol(symbol)
    ))
}

/// Month-by-month income and expenses
pub fn summary_pdf(report: &SummaryReport, settings: &Settings) -> PdfReport {
    let symbol = settings.currency_symbol.as_str();
    let mut pdf = PdfReport::from_settings(&settings.pdf)
        .subtitle("Income and Expense Summary")
        .columns(vec![
            PdfColumn::left("Month", 60.0),
            PdfColumn::right("Income", 40.0),
            PdfColumn::right("Expenses", 40.0),
            PdfColumn::right("Net", 40.0),
        ]);

    for row in &report.months {
        pdf.push_row(vec![
            row.month.long_name(),
            row.income.format_with_symbol(symbol),
            row.expenses.format_with_symbol(symbol),
            row.net.format_with_symbol(symbol),
        ]);
    }

    pdf.summary_line(format!("Transactions: {}", report.totals.count))
        .summary_line(format!(
            "Net: {}",
            report.totals.net.format_with_symbol(symbol)
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use crate::models::{Money, Month};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn table(rows: usize) -> PdfReport {
        let mut report = PdfReport::new("Test")
            .subtitle("Sub")
            .columns(vec![PdfColumn::left("A", 90.0), PdfColumn::right("B", 90.0)])
            .summary_line("Done");
        for i in 0..rows {
            report.push_row(vec![format!("row {}", i), i.to_string()]);
        }
        report
    }

    #[test]
    fn test_short_report_fits_one_page() {
        let report = table(5);
        let pages = report.paginate();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0][0], Line::Title);
        assert!(pages[0].contains(&Line::Summary(0)));
    }

    #[test]
    fn test_long_table_repeats_header() {
        let report = table(300);
        let pages = report.paginate();
        assert!(pages.len() > 1);

        for page in &pages[1..] {
            if page.iter().any(|l| matches!(l, Line::Row(_))) {
                assert_eq!(page[0], Line::Header);
            }
        }

        let rows: Vec<_> = pages
            .iter()
            .flatten()
            .filter_map(|l| match l {
                Line::Row(i) => Some(*i),
                _ => None,
            })
            .collect();
        assert_eq!(rows, (0..300).collect::<Vec<_>>());
    }

    #[test]
    fn test_letter_paper_has_fewer_rows_per_page() {
        let a4 = table(400);
        let letter = table(400).paper(Paper::Letter);
        assert!(letter.page_count() >= a4.page_count());
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 50.0, 9.0), "short");
        let cut = truncate_to_width(&"x".repeat(100), 20.0, 9.0);
        assert!(cut.ends_with("..."));
        assert!(text_width(&cut, 9.0) <= 20.0);
        assert_eq!(truncate_to_width("abcdef", 0.0, 9.0), "");
    }

    #[test]
    fn test_sanitize_replaces_non_ascii() {
        assert_eq!(sanitize("Caf\u{e9} \u{20ac}5"), "Caf? ?5");
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes = table(120).render().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_transactions_pdf() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let txns = vec![
            Transaction::expense(
                NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
                Money::from_cents(1250),
                "Lunch",
                None,
            ),
            Transaction::income(
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                Money::from_cents(100000),
                "Salary",
            ),
        ];

        let report = transactions_pdf(&storage, &txns, &settings).unwrap();
        assert_eq!(report.row_count(), 2);
        assert!(report.render().unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_budget_pdf_saves_file() {
        let (temp_dir, storage) = create_test_storage();
        let report = BudgetReport::generate(&storage, Month::new(2025, 1).unwrap()).unwrap();
        let pdf = budget_pdf(&report, &Settings::default());

        let path = temp_dir.path().join("out/budget.pdf");
        pdf.save(&path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
