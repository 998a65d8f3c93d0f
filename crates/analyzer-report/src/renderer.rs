//! Deterministic paginated rendering of history entries.
//!
//! Produces a sequence of [`Page`]s, each a fixed-size canvas of positioned
//! text. Serializing a page to a concrete byte format is the document sink's
//! job (see [`crate::text`]); nothing here touches I/O or the clock, so the
//! same entries and layout always render to identical pages.

use analyzer_core::formatting;
use analyzer_core::models::HistoryEntry;

use crate::layout::{
    PageLayout, AVERAGE_METRIC_X, FILENAME_X, ROW_START_GAP, TITLE_GAP, TOTAL_ITEMS_X,
};

/// Document title, drawn once on the first page.
pub const REPORT_TITLE: &str = "Equipment Analysis History";

// ── Pages ─────────────────────────────────────────────────────────────────────

/// One piece of text placed on a page, bottom-left origin.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawnText {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

/// One fixed-size unit of rendered output.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub width: f64,
    pub height: f64,
    /// Drawn texts in draw order: top to bottom, left to right.
    pub texts: Vec<DrawnText>,
}

impl Page {
    fn new(layout: &PageLayout) -> Self {
        Self {
            width: layout.page_width,
            height: layout.page_height,
            texts: Vec::new(),
        }
    }

    fn draw(&mut self, x: f64, y: f64, text: impl Into<String>) {
        self.texts.push(DrawnText {
            x,
            y,
            text: text.into(),
        });
    }
}

// ── ReportRenderer ────────────────────────────────────────────────────────────

/// Lays ledger entries out into pages.
pub struct ReportRenderer {
    layout: PageLayout,
}

impl ReportRenderer {
    pub fn new(layout: PageLayout) -> Self {
        Self { layout }
    }

    /// Render `entries` (expected newest-first, as the ledger returns them)
    /// into one or more pages.
    ///
    /// The title appears on the first page only; the column header is
    /// repeated at the top of every page. A row that would cross the bottom
    /// margin closes the current page and becomes the first row of the next
    /// one. An empty history still yields a single page with title and
    /// header.
    pub fn render(&self, entries: &[HistoryEntry]) -> Vec<Page> {
        let mut pages = Vec::new();
        let mut page = Page::new(&self.layout);

        let mut y = self.layout.first_line_y();
        page.draw(FILENAME_X, y, REPORT_TITLE);
        y -= TITLE_GAP;
        y = self.draw_header(&mut page, y);

        for entry in entries {
            // Break before the row would cross the bottom margin. The check
            // runs once per row, so a row landing on a fresh page is drawn
            // there even if that page is too short for it.
            if y < self.layout.margin_bottom {
                pages.push(page);
                page = Page::new(&self.layout);
                y = self.draw_header(&mut page, self.layout.first_line_y());
            }

            self.draw_row(&mut page, y, entry);
            y -= self.layout.row_height;
        }

        pages.push(page);
        pages
    }

    /// Draw the column header at `y`; returns the y of the first row slot.
    fn draw_header(&self, page: &mut Page, y: f64) -> f64 {
        page.draw(FILENAME_X, y, "Filename");
        page.draw(TOTAL_ITEMS_X, y, "Total Items");
        page.draw(AVERAGE_METRIC_X, y, "Average Metric");
        y - ROW_START_GAP
    }

    fn draw_row(&self, page: &mut Page, y: f64, entry: &HistoryEntry) {
        let name: String = entry
            .source_name
            .chars()
            .take(self.layout.filename_truncate)
            .collect();
        page.draw(FILENAME_X, y, name);
        page.draw(
            TOTAL_ITEMS_X,
            y,
            formatting::format_number(entry.total_items as f64, 0),
        );
        page.draw(
            AVERAGE_METRIC_X,
            y,
            formatting::format_number(entry.average_metric, 2),
        );
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
