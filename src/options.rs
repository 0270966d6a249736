//! Option endpoint normalization.
//!
//! Select fields, cascading filters and popup selects all load their
//! choices from `fetchOptionsUrl` endpoints that answer in slightly
//! different envelopes. Everything is normalized to [`SelectOption`] here.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// True for the values the engine treats as "nothing here": null, empty
/// strings, empty arrays and empty objects.
pub fn is_empty_value(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Stringify a scalar the way it appears in a query param or option value.
/// Strings lose their quotes; everything else keeps its JSON rendering.
pub fn stringify(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn items_of(body: serde_json::Value) -> Vec<serde_json::Value> {
    match body {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => {
            for key in ["data", "content"] {
                if let Some(inner) = map.shift_remove(key) {
                    return items_of(inner);
                }
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn lookup<'v>(entry: &'v serde_json::Value, keys: &[&str]) -> Option<&'v serde_json::Value> {
    keys.iter()
        .filter_map(|key| entry.get(key))
        .find(|value| !is_empty_value(value))
}

/// Normalize an option endpoint response into displayable options.
///
/// `value = entry[value_key] ?? entry.id`;
/// `label = entry[label_key] ?? displayName ?? name ?? code ?? value`.
/// Entries without a usable value are dropped.
pub fn normalize(
    body: serde_json::Value,
    value_key: Option<&str>,
    label_key: Option<&str>,
) -> Vec<SelectOption> {
    items_of(body)
        .into_iter()
        .filter_map(|entry| {
            let value_keys: Vec<&str> = value_key.into_iter().chain(["id"]).collect();
            let value = lookup(&entry, &value_keys)?;
            let value = stringify(value);
            let label_keys: Vec<&str> = label_key
                .into_iter()
                .chain(["displayName", "name", "code"])
                .collect();
            let label = lookup(&entry, &label_keys)
                .map(stringify)
                .unwrap_or_else(|| value.clone());
            Some(SelectOption { value, label })
        })
        .collect()
}

/// Normalize a descriptor's inline `selectOptions` list, dropping entries
/// with empty values the same way remote options are filtered.
pub fn normalize_inline(options: &[crate::descriptor::InlineOption]) -> Vec<SelectOption> {
    options
        .iter()
        .filter(|option| !is_empty_value(&option.value))
        .map(|option| {
            let value = stringify(&option.value);
            let label = option.label.clone().unwrap_or_else(|| value.clone());
            SelectOption { value, label }
        })
        .collect()
}
