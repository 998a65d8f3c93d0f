//! Plain-text document sink.
//!
//! Serializes rendered [`Page`]s into a monospaced text document: each
//! distinct y position becomes one output line, x positions map onto
//! character columns, and pages are separated by a form feed. Padding is
//! width-aware so wide characters in source names keep columns aligned.

use unicode_width::UnicodeWidthStr;

use crate::renderer::{DrawnText, Page};

/// Points per character column when mapping x positions onto text.
const POINTS_PER_COLUMN: f64 = 8.0;

/// Serialize pages into one plain-text document.
///
/// Output is deterministic for identical pages. Pages after the first are
/// preceded by a form-feed line, so a printer (or pager) starts each on a
/// fresh sheet.
pub fn render_plain_text(pages: &[Page]) -> String {
    let mut out = String::new();

    for (index, page) in pages.iter().enumerate() {
        if index > 0 {
            out.push('\u{000C}');
            out.push('\n');
        }
        render_page(page, &mut out);
    }

    out
}

fn render_page(page: &Page, out: &mut String) {
    let mut texts: Vec<&DrawnText> = page.texts.iter().collect();
    // Top to bottom, then left to right. y and x come from a fixed layout,
    // never from arithmetic that could produce NaN.
    texts.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut current_y: Option<f64> = None;
    let mut line = String::new();

    for text in texts {
        if current_y != Some(text.y) {
            if current_y.is_some() {
                out.push_str(line.trim_end());
                out.push('\n');
                line.clear();
            }
            current_y = Some(text.y);
        }

        let column = (text.x / POINTS_PER_COLUMN).round() as usize;
        while line.width() < column {
            line.push(' ');
        }
        if !line.is_empty() && !line.ends_with(' ') {
            line.push(' ');
        }
        line.push_str(&text.text);
    }

    if current_y.is_some() {
        out.push_str(line.trim_end());
        out.push('\n');
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
