//! Wire model of the page descriptor.
//!
//! This is the permissive shape delivered by the backend, one JSON document
//! per listing page. Structural validation happens in [`crate::schema`].

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::{Error, ErrorContext, ErrorDetail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Text,
    Image,
    Boolean,
    Badge,
    Date,
    Link,
    Actions,
}

impl Default for ColumnKind {
    fn default() -> Self {
        Self::Text
    }
}

// Unknown tags fall back to the text renderer instead of failing the page.
impl<'de> Deserialize<'de> for ColumnKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        Ok(match tag.as_str() {
            "text" => Self::Text,
            "image" => Self::Image,
            "boolean" => Self::Boolean,
            "badge" => Self::Badge,
            "date" => Self::Date,
            "link" => Self::Link,
            "actions" => Self::Actions,
            _ => Self::Text,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    Number,
    Select,
    MultiSelect,
    KeyValuePairs,
    JsonEditor,
    ImageUpload,
    SectionDivider,
}

impl Default for FieldKind {
    fn default() -> Self {
        Self::Text
    }
}

impl<'de> Deserialize<'de> for FieldKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        Ok(match tag.as_str() {
            "text" => Self::Text,
            "number" => Self::Number,
            "select" => Self::Select,
            "multi-select" => Self::MultiSelect,
            "key-value-pairs" => Self::KeyValuePairs,
            "json-editor" => Self::JsonEditor,
            "image-upload" => Self::ImageUpload,
            "section-divider" => Self::SectionDivider,
            _ => Self::Text,
        })
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    ShowPopup,
    ActionView,
    ActionDelete,
    ActionToggleStatus,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default = "default_page_no_param")]
    pub page_no_param: String,
    #[serde(default = "default_page_size_param")]
    pub page_size_param: String,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
}

fn default_page_no_param() -> String {
    "pageNo".into()
}

fn default_page_size_param() -> String {
    "pageSize".into()
}

fn default_page_size() -> u32 {
    10
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_no_param: default_page_no_param(),
            page_size_param: default_page_size_param(),
            default_page_size: default_page_size(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub accessor: String,
    #[serde(rename = "Header", default)]
    pub header: Option<String>,
    #[serde(default)]
    pub order: Option<u32>,
    #[serde(rename = "type", default)]
    pub kind: ColumnKind,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub badge_variants: IndexMap<String, String>,
}

/// Inline option shape as descriptors carry it. Values may be numbers or
/// strings; labels may be omitted.
#[derive(Deserialize, Debug, Clone)]
pub struct InlineOption {
    pub value: serde_json::Value,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub value: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,
    /// Outbound payload key; falls back to `value` when absent.
    #[serde(default)]
    pub api_field: Option<String>,
    #[serde(default)]
    pub fetch_options_url: Option<String>,
    #[serde(default)]
    pub option_value_key: Option<String>,
    #[serde(default)]
    pub option_label_key: Option<String>,
    #[serde(default)]
    pub select_options: Vec<InlineOption>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub title: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub action_url: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub popup_fields: Vec<Field>,
    #[serde(default)]
    pub popup_submit_url: Option<String>,
    #[serde(default)]
    pub status_field: Option<String>,
    #[serde(default)]
    pub confirmation_message: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Search {
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub search_btn_text: Option<String>,
    #[serde(default)]
    pub reset_btn_text: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct EmptyState {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Read a descriptor document from disk (CLI entry point; pages served
/// by the backend arrive through the transport instead).
pub async fn load(path: impl AsRef<Path>) -> Result<PageDescriptor, Error> {
    let path = path.as_ref();
    let ctx = ErrorContext::new(path.display().to_string());
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|error| ctx.error(ErrorDetail::ReadDescriptor(error)))?;
    serde_json::from_str(&text).map_err(|error| ctx.error(ErrorDetail::ParseDescriptor(error)))
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PageDescriptor {
    #[serde(default)]
    pub page_title: Option<String>,
    #[serde(default)]
    pub page_description: Option<String>,
    #[serde(default)]
    pub get_data_url: Option<String>,
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default)]
    pub table_headers: Vec<Column>,
    #[serde(default)]
    pub search: Option<Search>,
    #[serde(default)]
    pub buttons: Vec<Action>,
    #[serde(default)]
    pub empty_state: Option<EmptyState>,
}
