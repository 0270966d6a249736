//! Compiled page schema.
//!
//! [`PageSchema::compile`] is the one place descriptor structure is
//! validated: column ordering and uniqueness, the single actions column,
//! outbound field paths, action methods. Downstream dispatch works off the
//! compiled shape and never re-inspects raw JSON.

use indexmap::IndexMap;
use itertools::Itertools as _;

use crate::{
    Error, ErrorContext, ErrorDetail, descriptor,
    options::{self, SelectOption},
    path::FieldPath,
    transport::Method,
};

pub const DEFAULT_COLUMN_ORDER: u32 = 999;
pub const DEFAULT_EMPTY_TITLE: &str = "No data found";

#[derive(Debug, Clone)]
pub struct ColumnSchema {
    pub accessor: String,
    pub header: String,
    pub order: u32,
    pub kind: descriptor::ColumnKind,
    pub badge_variants: IndexMap<String, String>,
    pub actions: Vec<ActionSchema>,
}

#[derive(Debug, Clone)]
pub enum OptionsSpec {
    Remote {
        url: String,
        value_key: Option<String>,
        label_key: Option<String>,
    },
    Inline(Vec<SelectOption>),
    None,
}

#[derive(Debug, Clone)]
pub struct FieldSchema {
    /// Form/search-state key.
    pub key: String,
    pub label: String,
    pub kind: descriptor::FieldKind,
    pub placeholder: Option<String>,
    pub required: bool,
    pub default_value: Option<serde_json::Value>,
    /// Outbound payload path (`apiField` falling back to `value`).
    pub path: FieldPath,
    pub options: OptionsSpec,
}

#[derive(Debug, Clone)]
pub struct ActionSchema {
    pub kind: descriptor::ActionKind,
    pub title: String,
    pub icon: Option<String>,
    pub action_url: Option<String>,
    explicit_method: Option<Method>,
    pub fields: Vec<FieldSchema>,
    pub submit_url: Option<String>,
    pub status_field: Option<String>,
    pub confirmation_message: Option<String>,
}

impl ActionSchema {
    /// Method for delete/toggle/view calls: descriptor override first,
    /// then the per-kind default.
    pub fn method(&self) -> Method {
        let default = match self.kind {
            descriptor::ActionKind::ActionDelete => Method::Delete,
            descriptor::ActionKind::ActionToggleStatus => Method::Patch,
            _ => Method::Get,
        };
        self.explicit_method.unwrap_or(default)
    }

    /// Method for popup form submission. Creates POST, edits PUT, unless
    /// the descriptor pins one.
    pub fn submit_method(&self, is_edit: bool) -> Method {
        let default = if is_edit { Method::Put } else { Method::Post };
        self.explicit_method.unwrap_or(default)
    }
}

#[derive(Debug, Clone)]
pub struct SearchSchema {
    pub fields: Vec<FieldSchema>,
    pub search_text: String,
    pub reset_text: String,
}

#[derive(Debug, Clone)]
pub struct EmptyStateSchema {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug)]
pub struct PageSchema {
    pub title: String,
    pub description: Option<String>,
    pub data_url: String,
    pub page_no_param: String,
    pub page_size_param: String,
    pub default_page_size: u32,
    /// Ordered as rendered: non-decreasing `order`, descriptor position
    /// breaking ties.
    pub columns: Vec<ColumnSchema>,
    pub search: Option<SearchSchema>,
    pub buttons: Vec<ActionSchema>,
    pub empty_state: EmptyStateSchema,
}

fn compile_field(ctx: &ErrorContext, field: &descriptor::Field) -> Result<FieldSchema, Error> {
    let ctx = ctx.with_subject(&field.value);
    let raw_path = field.api_field.as_deref().unwrap_or(&field.value);
    let path = FieldPath::parse(raw_path).map_err(|source| {
        ctx.error(ErrorDetail::InvalidFieldPath {
            path: raw_path.to_owned(),
            source,
        })
    })?;
    let options = if let Some(url) = &field.fetch_options_url {
        OptionsSpec::Remote {
            url: url.clone(),
            value_key: field.option_value_key.clone(),
            label_key: field.option_label_key.clone(),
        }
    } else if !field.select_options.is_empty() {
        OptionsSpec::Inline(options::normalize_inline(&field.select_options))
    } else {
        OptionsSpec::None
    };
    Ok(FieldSchema {
        key: field.value.clone(),
        label: field.label.clone().unwrap_or_else(|| field.value.clone()),
        kind: field.kind,
        placeholder: field.placeholder.clone(),
        required: field.required,
        default_value: field.default_value.clone(),
        path,
        options,
    })
}

fn compile_action(ctx: &ErrorContext, action: &descriptor::Action) -> Result<ActionSchema, Error> {
    let ctx = ctx.with_subject(&action.title);
    if matches!(action.kind, descriptor::ActionKind::ActionToggleStatus)
        && action.status_field.is_none()
    {
        return Err(ctx.error(ErrorDetail::StatusFieldUndefined));
    }
    let fields = action
        .popup_fields
        .iter()
        .map(|field| compile_field(&ctx, field))
        .collect::<Result<_, _>>()?;
    Ok(ActionSchema {
        kind: action.kind,
        title: action.title.clone(),
        icon: action.icon.clone(),
        action_url: action.action_url.clone(),
        explicit_method: action.method.as_deref().and_then(Method::parse),
        fields,
        submit_url: action.popup_submit_url.clone(),
        status_field: action.status_field.clone(),
        confirmation_message: action.confirmation_message.clone(),
    })
}

impl PageSchema {
    pub fn compile(descriptor: &descriptor::PageDescriptor) -> Result<Self, Error> {
        let title = descriptor
            .page_title
            .clone()
            .unwrap_or_else(|| "page".into());
        let ctx = ErrorContext::new(&title);

        let data_url = descriptor
            .get_data_url
            .clone()
            .ok_or_else(|| ctx.error(ErrorDetail::MissingDataUrl))?;

        if let Some(duplicate) = descriptor
            .table_headers
            .iter()
            .map(|column| &column.accessor)
            .duplicates()
            .next()
        {
            return Err(ctx.error(ErrorDetail::DuplicateAccessor(duplicate.clone())));
        }
        let action_columns = descriptor
            .table_headers
            .iter()
            .filter(|column| matches!(column.kind, descriptor::ColumnKind::Actions))
            .map(|column| &column.accessor)
            .collect::<Vec<_>>();
        if let [first, second, ..] = action_columns.as_slice() {
            return Err(ctx.error(ErrorDetail::MultipleActionColumns {
                first: (*first).clone(),
                second: (*second).clone(),
            }));
        }

        let mut columns = descriptor
            .table_headers
            .iter()
            .map(|column| {
                let ctx = ctx.with_subject(&column.accessor);
                let actions = column
                    .actions
                    .iter()
                    .map(|action| compile_action(&ctx, action))
                    .collect::<Result<_, _>>()?;
                Ok(ColumnSchema {
                    accessor: column.accessor.clone(),
                    header: column
                        .header
                        .clone()
                        .unwrap_or_else(|| column.accessor.clone()),
                    order: column.order.unwrap_or(DEFAULT_COLUMN_ORDER),
                    kind: column.kind,
                    badge_variants: column.badge_variants.clone(),
                    actions,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        // Vec::sort_by_key is stable, so descriptor position breaks ties.
        columns.sort_by_key(|column| column.order);

        let search = descriptor
            .search
            .as_ref()
            .map(|search| {
                let fields = search
                    .fields
                    .iter()
                    .map(|field| {
                        let field = compile_field(&ctx, field)?;
                        if let FieldPath::Indexed { .. } = field.path {
                            return Err(ctx
                                .with_subject(&field.key)
                                .error(ErrorDetail::IndexedSearchField(field.path.clone())));
                        }
                        Ok(field)
                    })
                    .collect::<Result<_, _>>()?;
                Ok(SearchSchema {
                    fields,
                    search_text: search.search_btn_text.clone().unwrap_or_else(|| "Search".into()),
                    reset_text: search.reset_btn_text.clone().unwrap_or_else(|| "Reset".into()),
                })
            })
            .transpose()?;

        let buttons = descriptor
            .buttons
            .iter()
            .map(|action| compile_action(&ctx, action))
            .collect::<Result<_, _>>()?;

        let empty_state = EmptyStateSchema {
            title: descriptor
                .empty_state
                .as_ref()
                .and_then(|state| state.title.clone())
                .unwrap_or_else(|| DEFAULT_EMPTY_TITLE.into()),
            description: descriptor
                .empty_state
                .as_ref()
                .and_then(|state| state.description.clone()),
        };

        Ok(Self {
            title,
            description: descriptor.page_description.clone(),
            data_url,
            page_no_param: descriptor.pagination.page_no_param.clone(),
            page_size_param: descriptor.pagination.page_size_param.clone(),
            default_page_size: descriptor.pagination.default_page_size,
            columns,
            search,
            buttons,
            empty_state,
        })
    }

    /// The single actions column, when the page declares one.
    pub fn actions_column(&self) -> Option<&ColumnSchema> {
        self.columns
            .iter()
            .find(|column| matches!(column.kind, descriptor::ColumnKind::Actions))
    }
}
