//! Terminal rendering of a loaded page, used by the `preview` CLI
//! command and as a cheap end-to-end exercise of the cell renderers.

use console::style;
use unicode_width::UnicodeWidthStr;

use crate::{pager::PaginationState, render::DisplayElement, schema::PageSchema};

const MAX_COLUMN_WIDTH: usize = 40;

fn truncate(text: &str) -> String {
    if text.width() <= MAX_COLUMN_WIDTH {
        return text.to_owned();
    }
    let mut out = String::new();
    for ch in text.chars() {
        if out.width() + 1 >= MAX_COLUMN_WIDTH {
            out.push('…');
            return out;
        }
        out.push(ch);
    }
    out
}

fn pad(text: &str, width: usize) -> String {
    let mut out = text.to_owned();
    for _ in text.width()..width {
        out.push(' ');
    }
    out
}

/// Render headers, rows and the pagination footer as aligned text.
/// Empty pages render the descriptor's empty state across the table.
pub fn render_table(
    schema: &PageSchema,
    rows: &[Vec<DisplayElement>],
    pagination: &PaginationState,
) -> String {
    let headers: Vec<String> = schema
        .columns
        .iter()
        .map(|column| truncate(&column.header))
        .collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|element| truncate(&element.display_text()))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|header| header.width()).collect();
    for row in &cells {
        for (index, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(cell.width());
            }
        }
    }

    let mut out = String::new();
    out.push_str(&format!("{}\n", style(&schema.title).bold()));
    if let Some(description) = &schema.description {
        out.push_str(&format!("{description}\n"));
    }
    let header_line = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| style(pad(header, *width)).bold().to_string())
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(&header_line);
    out.push('\n');

    if cells.is_empty() {
        out.push_str(&format!("{}\n", style(&schema.empty_state.title).dim()));
    } else {
        for row in &cells {
            let line = row
                .iter()
                .zip(&widths)
                .map(|(cell, width)| pad(cell, *width))
                .collect::<Vec<_>>()
                .join("  ");
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }

    out.push_str(&format!(
        "{} ({} total)\n",
        pagination.page_label(),
        pagination.total_elements
    ));
    out
}
