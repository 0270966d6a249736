//! Form/search field renderers, one per field type.

use indexmap::IndexMap;

use crate::{
    action::form::FormState,
    options::{SelectOption, stringify},
    render::{FieldRenderer, InputElement, KeyValuePairs, OptionsState},
    schema::{FieldSchema, OptionsSpec},
};

/// Remote options already fetched this session, keyed by field key.
pub type OptionCache = IndexMap<String, Vec<SelectOption>>;

/// Option precedence: fetched remote options for this field, then the
/// descriptor's inline list, then the explicit no-options state.
pub fn resolve_options(field: &FieldSchema, cache: &OptionCache) -> OptionsState {
    if let Some(fetched) = cache.get(&field.key) {
        return OptionsState::Loaded(fetched.clone());
    }
    match &field.options {
        OptionsSpec::Inline(options) => OptionsState::Loaded(options.clone()),
        OptionsSpec::Remote { .. } | OptionsSpec::None => OptionsState::Empty,
    }
}

fn form_value<'f>(field: &FieldSchema, form: &'f FormState) -> Option<&'f serde_json::Value> {
    form.get(&field.key).filter(|value| !value.is_null())
}

fn string_value(field: &FieldSchema, form: &FormState) -> Option<String> {
    form_value(field, form).map(stringify)
}

pub struct TextField;

impl FieldRenderer for TextField {
    fn render(&self, field: &FieldSchema, form: &FormState, _options: &OptionCache) -> InputElement {
        InputElement::TextInput {
            key: field.key.clone(),
            label: field.label.clone(),
            value: string_value(field, form).unwrap_or_default(),
            placeholder: field.placeholder.clone(),
            required: field.required,
        }
    }
}

pub struct NumberField;

impl FieldRenderer for NumberField {
    fn render(&self, field: &FieldSchema, form: &FormState, _options: &OptionCache) -> InputElement {
        let value = form_value(field, form).and_then(|value| match value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        });
        InputElement::NumberInput {
            key: field.key.clone(),
            label: field.label.clone(),
            value,
            placeholder: field.placeholder.clone(),
            required: field.required,
        }
    }
}

pub struct SelectField;

impl FieldRenderer for SelectField {
    fn render(&self, field: &FieldSchema, form: &FormState, options: &OptionCache) -> InputElement {
        InputElement::Select {
            key: field.key.clone(),
            label: field.label.clone(),
            options: resolve_options(field, options),
            selected: string_value(field, form).filter(|value| !value.is_empty()),
            required: field.required,
        }
    }
}

pub struct MultiSelectField;

impl FieldRenderer for MultiSelectField {
    fn render(&self, field: &FieldSchema, form: &FormState, options: &OptionCache) -> InputElement {
        let selected = match form_value(field, form) {
            Some(serde_json::Value::Array(items)) => items.iter().map(stringify).collect(),
            Some(single) => vec![stringify(single)],
            None => Vec::new(),
        };
        InputElement::MultiSelect {
            key: field.key.clone(),
            label: field.label.clone(),
            options: resolve_options(field, options),
            selected,
            required: field.required,
        }
    }
}

pub struct KeyValueField;

impl FieldRenderer for KeyValueField {
    fn render(&self, field: &FieldSchema, form: &FormState, _options: &OptionCache) -> InputElement {
        let pairs = form_value(field, form)
            .map(KeyValuePairs::from_value)
            .unwrap_or_default();
        InputElement::KeyValueEditor {
            key: field.key.clone(),
            label: field.label.clone(),
            pairs,
        }
    }
}

pub struct JsonEditorField;

impl FieldRenderer for JsonEditorField {
    fn render(&self, field: &FieldSchema, form: &FormState, _options: &OptionCache) -> InputElement {
        let text = form_value(field, form)
            .map(|value| serde_json::to_string_pretty(value).unwrap_or_default())
            .unwrap_or_default();
        InputElement::JsonEditor {
            key: field.key.clone(),
            label: field.label.clone(),
            text,
        }
    }
}

pub struct ImageUploadField;

impl FieldRenderer for ImageUploadField {
    fn render(&self, field: &FieldSchema, form: &FormState, _options: &OptionCache) -> InputElement {
        InputElement::ImageUpload {
            key: field.key.clone(),
            label: field.label.clone(),
            current: string_value(field, form).filter(|value| !value.is_empty()),
            required: field.required,
        }
    }
}

pub struct SectionDividerField;

impl FieldRenderer for SectionDividerField {
    fn render(&self, field: &FieldSchema, _form: &FormState, _options: &OptionCache) -> InputElement {
        InputElement::SectionDivider {
            label: field.label.clone(),
        }
    }
}
