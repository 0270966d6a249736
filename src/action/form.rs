//! Popup form state and the payload transform.
//!
//! The form walk and the payload build are inverses of each other: form
//! state is keyed by each field's `value`, the outbound payload by its
//! compiled path. Initializing from a row and transforming back must
//! reproduce the row's `apiField`-keyed values.

use indexmap::IndexMap;

use crate::{
    descriptor::FieldKind,
    options::is_empty_value,
    schema::FieldSchema,
};

/// Form/search state, keyed by the fields' `value` keys.
pub type FormState = IndexMap<String, serde_json::Value>;

fn is_input(field: &FieldSchema) -> bool {
    !matches!(field.kind, FieldKind::SectionDivider)
}

/// Initial form state for a create dialog: declared defaults only.
pub fn initialize_defaults(fields: &[FieldSchema]) -> FormState {
    fields
        .iter()
        .filter(|field| is_input(field))
        .filter_map(|field| {
            field
                .default_value
                .clone()
                .map(|value| (field.key.clone(), value))
        })
        .collect()
}

/// Initial form state for an edit dialog: each field read off the
/// (possibly hydrated) row through its outbound path.
pub fn initialize_from_row(fields: &[FieldSchema], row: &serde_json::Value) -> FormState {
    fields
        .iter()
        .filter(|field| is_input(field))
        .filter_map(|field| {
            field
                .path
                .read(row)
                .filter(|value| !value.is_null())
                .map(|value| (field.key.clone(), value.clone()))
        })
        .collect()
}

/// Labels of required fields the form leaves empty. Checked before any
/// submit request is issued.
pub fn missing_required(fields: &[FieldSchema], form: &FormState) -> Vec<String> {
    fields
        .iter()
        .filter(|field| is_input(field) && field.required)
        .filter(|field| {
            form.get(&field.key)
                .map(is_empty_value)
                .unwrap_or(true)
        })
        .map(|field| field.label.clone())
        .collect()
}

/// Invert the initialization walk into the outbound payload: empty
/// values are skipped, scalars land under their path key, indexed paths
/// accumulate into their arrays, and array slots nothing wrote to are
/// filtered out.
pub fn build_payload(
    fields: &[FieldSchema],
    form: &FormState,
) -> serde_json::Map<String, serde_json::Value> {
    let mut payload = serde_json::Map::new();
    for field in fields.iter().filter(|field| is_input(field)) {
        let Some(value) = form.get(&field.key) else {
            continue;
        };
        if is_empty_value(value) {
            continue;
        }
        field.path.write(&mut payload, value.clone());
    }
    for value in payload.values_mut() {
        if let serde_json::Value::Array(slots) = value {
            slots.retain(|slot| !slot.is_null());
        }
    }
    payload
}
