//! Field and cell renderer dispatch.
//!
//! A [`Registry`] maps each declared column/field type to a strategy
//! object, registered once; rendering a page is a pure walk over the
//! compiled schema producing framework-neutral element trees. Renderers
//! never fail: anything unrenderable degrades to the text fallback.

use std::collections::HashMap;

use crate::{
    action::form::FormState,
    descriptor::{ActionKind, ColumnKind, FieldKind},
    options::SelectOption,
    schema::{ColumnSchema, FieldSchema},
};

pub mod cell;
pub mod field;
pub mod kv;

pub use field::OptionCache;
pub use kv::KeyValuePairs;

/// What a table cell renders to.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayElement {
    Text(String),
    Thumbnail {
        src: String,
        alt: String,
        /// Substituted by the host when the image fails to load.
        fallback: String,
    },
    StatusBadge {
        active: bool,
    },
    Badge {
        label: String,
        variant: String,
    },
    Link {
        href: String,
        label: String,
    },
    ActionMenu(Vec<ActionRef>),
}

/// Menu entry pointing back into the column's action list by position.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRef {
    pub index: usize,
    pub title: String,
    pub icon: Option<String>,
    pub kind: ActionKind,
}

impl DisplayElement {
    /// Plain-text projection, used by the terminal preview and as the
    /// universal fallback.
    pub fn display_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Thumbnail { src, .. } => src.clone(),
            Self::StatusBadge { active } => {
                if *active { "Active" } else { "Inactive" }.to_owned()
            }
            Self::Badge { label, .. } => label.clone(),
            Self::Link { label, .. } => label.clone(),
            Self::ActionMenu(actions) => actions
                .iter()
                .map(|action| action.title.as_str())
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }
}

/// Option list state for selects: a loaded list or the explicit
/// "no options" state.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionsState {
    Loaded(Vec<SelectOption>),
    Empty,
}

/// What a form/search field renders to. Event wiring is the host's
/// concern; the element carries current values only.
#[derive(Debug, Clone, PartialEq)]
pub enum InputElement {
    TextInput {
        key: String,
        label: String,
        value: String,
        placeholder: Option<String>,
        required: bool,
    },
    NumberInput {
        key: String,
        label: String,
        value: Option<f64>,
        placeholder: Option<String>,
        required: bool,
    },
    Select {
        key: String,
        label: String,
        options: OptionsState,
        selected: Option<String>,
        required: bool,
    },
    MultiSelect {
        key: String,
        label: String,
        options: OptionsState,
        selected: Vec<String>,
        required: bool,
    },
    KeyValueEditor {
        key: String,
        label: String,
        pairs: KeyValuePairs,
    },
    JsonEditor {
        key: String,
        label: String,
        text: String,
    },
    ImageUpload {
        key: String,
        label: String,
        current: Option<String>,
        required: bool,
    },
    SectionDivider {
        label: String,
    },
}

pub trait CellRenderer: Send + Sync {
    fn render(&self, column: &ColumnSchema, row: &serde_json::Value) -> DisplayElement;
}

pub trait FieldRenderer: Send + Sync {
    fn render(&self, field: &FieldSchema, form: &FormState, options: &OptionCache) -> InputElement;
}

/// Type-tag dispatch table. Adding a column or field type is one
/// `register_*` call; nothing downstream changes.
pub struct Registry {
    cells: HashMap<ColumnKind, Box<dyn CellRenderer>>,
    fields: HashMap<FieldKind, Box<dyn FieldRenderer>>,
}

impl Registry {
    pub fn empty() -> Self {
        Self {
            cells: HashMap::new(),
            fields: HashMap::new(),
        }
    }

    /// The built-in vocabulary.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register_cell(ColumnKind::Text, cell::TextCell);
        registry.register_cell(ColumnKind::Image, cell::ImageCell);
        registry.register_cell(ColumnKind::Boolean, cell::BooleanCell);
        registry.register_cell(ColumnKind::Badge, cell::BadgeCell);
        registry.register_cell(ColumnKind::Date, cell::DateCell);
        registry.register_cell(ColumnKind::Link, cell::LinkCell);
        registry.register_cell(ColumnKind::Actions, cell::ActionsCell);
        registry.register_field(FieldKind::Text, field::TextField);
        registry.register_field(FieldKind::Number, field::NumberField);
        registry.register_field(FieldKind::Select, field::SelectField);
        registry.register_field(FieldKind::MultiSelect, field::MultiSelectField);
        registry.register_field(FieldKind::KeyValuePairs, field::KeyValueField);
        registry.register_field(FieldKind::JsonEditor, field::JsonEditorField);
        registry.register_field(FieldKind::ImageUpload, field::ImageUploadField);
        registry.register_field(FieldKind::SectionDivider, field::SectionDividerField);
        registry
    }

    pub fn register_cell(&mut self, kind: ColumnKind, renderer: impl CellRenderer + 'static) {
        self.cells.insert(kind, Box::new(renderer));
    }

    pub fn register_field(&mut self, kind: FieldKind, renderer: impl FieldRenderer + 'static) {
        self.fields.insert(kind, Box::new(renderer));
    }

    pub fn render_cell(&self, column: &ColumnSchema, row: &serde_json::Value) -> DisplayElement {
        match self.cells.get(&column.kind) {
            Some(renderer) => renderer.render(column, row),
            None => cell::TextCell.render(column, row),
        }
    }

    pub fn render_field(
        &self,
        field: &FieldSchema,
        form: &FormState,
        options: &OptionCache,
    ) -> InputElement {
        match self.fields.get(&field.kind) {
            Some(renderer) => renderer.render(field, form, options),
            None => field::TextField.render(field, form, options),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}
