//! Cell renderers, one per column type.

use crate::{
    options::{is_empty_value, stringify},
    render::{ActionRef, CellRenderer, DisplayElement},
    schema::ColumnSchema,
};

pub const TEXT_FALLBACK: &str = "-";
pub const IMAGE_PLACEHOLDER: &str = "/placeholder.png";
pub const DEFAULT_BADGE_VARIANT: &str = "default";

/// Booleans arrive either native or as the strings "true"/"false".
pub fn coerce_bool(value: &serde_json::Value) -> Option<bool> {
    match value {
        serde_json::Value::Bool(b) => Some(*b),
        serde_json::Value::String(s) => {
            if s.eq_ignore_ascii_case("true") {
                Some(true)
            } else if s.eq_ignore_ascii_case("false") {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Permissive date parsing: RFC 3339 first, then common bare formats.
/// Returns the display string, or None when nothing matches.
pub fn format_date(raw: &str) -> Option<String> {
    if let Ok(datetime) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.format("%Y-%m-%d %H:%M").to_string());
    }
    if let Ok(datetime) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(datetime.format("%Y-%m-%d %H:%M").to_string());
    }
    if let Ok(datetime) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(datetime.format("%Y-%m-%d %H:%M").to_string());
    }
    if let Ok(date) = raw.parse::<chrono::NaiveDate>() {
        return Some(date.format("%Y-%m-%d").to_string());
    }
    None
}

fn cell_value<'v>(column: &ColumnSchema, row: &'v serde_json::Value) -> Option<&'v serde_json::Value> {
    let value = row.get(&column.accessor)?;
    (!value.is_null()).then_some(value)
}

fn text_fallback(column: &ColumnSchema, row: &serde_json::Value) -> DisplayElement {
    let text = cell_value(column, row)
        .map(stringify)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| TEXT_FALLBACK.to_owned());
    DisplayElement::Text(text)
}

pub struct TextCell;

impl CellRenderer for TextCell {
    fn render(&self, column: &ColumnSchema, row: &serde_json::Value) -> DisplayElement {
        text_fallback(column, row)
    }
}

pub struct ImageCell;

impl CellRenderer for ImageCell {
    fn render(&self, column: &ColumnSchema, row: &serde_json::Value) -> DisplayElement {
        match cell_value(column, row) {
            Some(serde_json::Value::String(src)) if !src.is_empty() => DisplayElement::Thumbnail {
                src: src.clone(),
                alt: column.header.clone(),
                fallback: IMAGE_PLACEHOLDER.to_owned(),
            },
            _ => DisplayElement::Text(TEXT_FALLBACK.to_owned()),
        }
    }
}

pub struct BooleanCell;

impl CellRenderer for BooleanCell {
    fn render(&self, column: &ColumnSchema, row: &serde_json::Value) -> DisplayElement {
        match cell_value(column, row).and_then(coerce_bool) {
            Some(active) => DisplayElement::StatusBadge { active },
            None => text_fallback(column, row),
        }
    }
}

pub struct BadgeCell;

impl CellRenderer for BadgeCell {
    fn render(&self, column: &ColumnSchema, row: &serde_json::Value) -> DisplayElement {
        let Some(value) = cell_value(column, row).filter(|value| !is_empty_value(value)) else {
            return DisplayElement::Text(TEXT_FALLBACK.to_owned());
        };
        let label = stringify(value);
        let variant = column
            .badge_variants
            .get(&label)
            .cloned()
            .unwrap_or_else(|| DEFAULT_BADGE_VARIANT.to_owned());
        DisplayElement::Badge { label, variant }
    }
}

pub struct DateCell;

impl CellRenderer for DateCell {
    fn render(&self, column: &ColumnSchema, row: &serde_json::Value) -> DisplayElement {
        match cell_value(column, row) {
            Some(serde_json::Value::String(raw)) => {
                // Unparseable dates display as-is rather than erroring.
                let display = format_date(raw).unwrap_or_else(|| raw.clone());
                DisplayElement::Text(display)
            }
            _ => text_fallback(column, row),
        }
    }
}

pub struct LinkCell;

impl CellRenderer for LinkCell {
    fn render(&self, column: &ColumnSchema, row: &serde_json::Value) -> DisplayElement {
        match cell_value(column, row) {
            Some(serde_json::Value::String(href)) if !href.is_empty() => DisplayElement::Link {
                href: href.clone(),
                label: href.clone(),
            },
            _ => DisplayElement::Text(TEXT_FALLBACK.to_owned()),
        }
    }
}

pub struct ActionsCell;

impl CellRenderer for ActionsCell {
    fn render(&self, column: &ColumnSchema, _row: &serde_json::Value) -> DisplayElement {
        let actions = column
            .actions
            .iter()
            .enumerate()
            .map(|(index, action)| ActionRef {
                index,
                title: action.title.clone(),
                icon: action.icon.clone(),
                kind: action.kind,
            })
            .collect();
        DisplayElement::ActionMenu(actions)
    }
}
