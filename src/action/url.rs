//! Action URL templates.

use std::sync::LazyLock;

use crate::options::stringify;

static PLACEHOLDER: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\{(?:id|entityId)\}").unwrap());

#[derive(Debug, thiserror::Error)]
#[error("row has no id for url template {0:?}")]
pub struct MissingRowId(pub String);

/// The acted-upon row's `id`, stringified, when it has one.
pub fn row_id(row: &serde_json::Value) -> Option<String> {
    row.get("id")
        .filter(|id| !id.is_null())
        .map(stringify)
        .filter(|id| !id.is_empty())
}

pub fn has_placeholder(template: &str) -> bool {
    PLACEHOLDER.is_match(template)
}

/// Substitute `{id}` and `{entityId}` with the row id. Templates without
/// placeholders pass through untouched; a placeholder with no id to fill
/// it is an error raised before any request goes out.
pub fn resolve(template: &str, id: Option<&str>) -> Result<String, MissingRowId> {
    if !has_placeholder(template) {
        return Ok(template.to_owned());
    }
    let id = id.ok_or_else(|| MissingRowId(template.to_owned()))?;
    let encoded = urlencoding::encode(id);
    Ok(PLACEHOLDER.replace_all(template, encoded.as_ref()).into_owned())
}
