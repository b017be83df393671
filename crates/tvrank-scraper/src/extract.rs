//! Results-table extraction from Finnpanel HTML pages.
//!
//! The table layout is fixed and known in advance: one `table.totaltv` per
//! page, a header row first, then one row per program. Column meaning is
//! positional and counted partly from the end of the row, because the
//! providers' tables do not all carry the same number of columns.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tvrank_core::TableVariant;

/// CSS selector of the results table.
pub const RESULTS_TABLE_SELECTOR: &str = "table.totaltv";

static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(RESULTS_TABLE_SELECTOR).expect("valid table selector"));

/// One data row of the results table: trimmed cell texts in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    cells: Vec<String>,
    variant: TableVariant,
}

impl RawRow {
    #[must_use]
    pub fn new(cells: Vec<String>, variant: TableVariant) -> Self {
        Self { cells, variant }
    }

    #[must_use]
    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    #[must_use]
    pub fn variant(&self) -> TableVariant {
        self.variant
    }

    fn cell(&self, idx: usize) -> &str {
        self.cells.get(idx).map_or("", String::as_str)
    }

    /// First column.
    #[must_use]
    pub fn rank_text(&self) -> &str {
        self.cell(0)
    }

    /// Second column (the title in the simplified layout).
    #[must_use]
    pub fn program_text(&self) -> &str {
        self.cell(1)
    }

    /// Third column, but only for detailed rows wider than five columns;
    /// narrower rows have no episode column.
    #[must_use]
    pub fn episode_text(&self) -> &str {
        match self.variant {
            TableVariant::Detailed if self.cells.len() > 5 => self.cell(2),
            _ => "",
        }
    }

    /// Second-to-last column of a detailed row. Simplified rows carry no
    /// duration.
    #[must_use]
    pub fn duration_text(&self) -> &str {
        match self.variant {
            TableVariant::Detailed if self.cells.len() >= 2 => self.cell(self.cells.len() - 2),
            _ => "",
        }
    }

    /// Last column.
    #[must_use]
    pub fn viewers_text(&self) -> &str {
        self.cells.last().map_or("", String::as_str)
    }
}

/// Extracts data rows from the results table.
///
/// Returns `None` when the page has no results table. The first row of the
/// table itself is always treated as the header and skipped. Rows with fewer cells than
/// `variant.min_columns()` are dropped silently; some providers emit short
/// rows for entries without an episode column.
#[must_use]
pub fn extract_table(html: &str, variant: TableVariant) -> Option<Vec<RawRow>> {
    let document = Html::parse_document(html);
    let table = document.select(&TABLE).next()?;

    let min_columns = variant.min_columns();
    let mut short_rows = 0usize;
    let mut rows = Vec::new();

    for tr in table_rows(table).skip(1) {
        let cells = row_cells(tr, variant);
        if cells.len() < min_columns {
            short_rows += 1;
            continue;
        }
        rows.push(RawRow::new(cells, variant));
    }

    if short_rows > 0 {
        tracing::debug!(short_rows, min_columns, "skipped rows below column threshold");
    }

    Some(rows)
}

/// Rows belonging to `table` itself: `tr` children of the table or of its
/// `thead`/`tbody`/`tfoot`. Rows of tables nested inside cells are not
/// included.
fn table_rows(table: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    table
        .children()
        .filter_map(ElementRef::wrap)
        .flat_map(|child| match child.value().name() {
            "tr" => vec![child],
            "thead" | "tbody" | "tfoot" => child
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|row| row.value().name() == "tr")
                .collect(),
            _ => Vec::new(),
        })
}

/// Direct child cells of a row, in column order.
fn row_cells(tr: ElementRef<'_>, variant: TableVariant) -> Vec<String> {
    tr.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| match (variant, cell.value().name()) {
            (_, "td") | (TableVariant::Detailed, "th") => true,
            _ => false,
        })
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect()
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
