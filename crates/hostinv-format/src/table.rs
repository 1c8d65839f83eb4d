//! Aligned plain-text table

use tracing::debug;
use unicode_width::UnicodeWidthStr;

use crate::error::FormatError;
use crate::traits::{FormatRequest, OutputFormatter};

const GAP: &str = "  ";

/// Whitespace-aligned columns under a header row
///
/// Columns are `NAME` followed by the requested fields. Missing attributes
/// render as empty cells; tabs and newlines inside values are shown
/// escaped so rows stay on one line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableFormatter;

impl OutputFormatter for TableFormatter {
    fn name(&self) -> &'static str {
        "table"
    }

    fn format(&self, request: &FormatRequest<'_>) -> Result<String, FormatError> {
        let header: Vec<String> = std::iter::once("NAME".to_string())
            .chain(request.fields().iter().cloned())
            .collect();

        let rows: Vec<Vec<String>> = request
            .hosts()
            .iter()
            .map(|host| {
                std::iter::once(single_line(&host.name))
                    .chain(
                        request
                            .cells(host)
                            .map(|cell| cell.map(|v| single_line(&v.to_string())).unwrap_or_default()),
                    )
                    .collect()
            })
            .collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.width()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.width());
            }
        }
        debug!(columns = widths.len(), rows = rows.len(), "rendering table");

        let mut out = String::new();
        for row in std::iter::once(&header).chain(&rows) {
            let mut line = String::new();
            for (i, (cell, width)) in row.iter().zip(&widths).enumerate() {
                if i > 0 {
                    line.push_str(GAP);
                }
                line.push_str(cell);
                line.push_str(&" ".repeat(width.saturating_sub(cell.width())));
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
        Ok(out)
    }
}

fn single_line(text: &str) -> String {
    text.replace('\n', "\\n").replace('\t', "\\t").replace('\r', "\\r")
}
