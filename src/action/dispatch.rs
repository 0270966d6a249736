use tracing::{debug, error};

use crate::{
    action::{form, form::FormState, url},
    descriptor::ActionKind,
    notice,
    render::cell::coerce_bool,
    schema::ActionSchema,
    store::{LoadingKey, LoadingSet, Store},
    transport::{Method, Transport},
};

/// Dialog state, one per page. `Idle → {Viewing | Editing |
/// ConfirmingDelete | ConfirmingStatus} → Idle`.
#[derive(Debug, Clone)]
pub enum Dialog {
    Idle,
    Viewing {
        title: String,
        row: serde_json::Value,
    },
    Editing {
        action: ActionSchema,
        form: FormState,
        row_id: Option<String>,
    },
    ConfirmingDelete {
        action: ActionSchema,
        row: serde_json::Value,
    },
    ConfirmingStatus {
        action: ActionSchema,
        row: serde_json::Value,
        field: String,
        current: bool,
        next: bool,
    },
}

impl Dialog {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// What a confirmed dialog did. `Mutated` tells the shell to reload the
/// current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Mutated,
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError<E> {
    #[error("action request failed: {0}")]
    Transport(E),
    #[error(transparent)]
    MissingRowId(#[from] url::MissingRowId),
    #[error("action {0:?} needs a row")]
    RowRequired(String),
    #[error("required fields missing: {}", .0.join(", "))]
    MissingRequired(Vec<String>),
    #[error("action {0:?} has no submit url")]
    NoSubmitUrl(String),
    #[error("no dialog open")]
    NoDialog,
    #[error("another operation is in flight")]
    Busy,
}

pub struct Dispatcher<T> {
    transport: T,
    dialog: Store<Dialog>,
    busy: Store<bool>,
    loading: LoadingSet,
}

impl<T: Clone> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            dialog: self.dialog.clone(),
            busy: self.busy.clone(),
            loading: self.loading.clone(),
        }
    }
}

/// Clears the busy flag when the mutation call is done, whichever way it
/// exits.
struct BusyGuard(Store<bool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Detail endpoints answer either the object itself or `{data: {..}}`.
fn detail_of(body: serde_json::Value) -> serde_json::Value {
    match body {
        serde_json::Value::Object(mut map) => match map.shift_remove("data") {
            Some(inner @ serde_json::Value::Object(_)) => inner,
            Some(other) => other,
            None => serde_json::Value::Object(map),
        },
        other => other,
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T, loading: LoadingSet) -> Self {
        Self {
            transport,
            dialog: Store::new(Dialog::Idle),
            busy: Store::new(false),
            loading,
        }
    }

    pub fn dialog(&self) -> &Store<Dialog> {
        &self.dialog
    }

    /// True while a mutation call is in flight; the triggering control
    /// stays disabled for the duration.
    pub fn busy(&self) -> &Store<bool> {
        &self.busy
    }

    async fn fetch_detail(
        &self,
        template: &str,
        row: &serde_json::Value,
    ) -> Result<serde_json::Value, ActionError<T::Error>> {
        let resolved = url::resolve(template, url::row_id(row).as_deref())?;
        self.loading.begin(LoadingKey::Detail);
        let result = self
            .transport
            .request(Method::Get, &resolved, &[], None)
            .await;
        self.loading.end(&LoadingKey::Detail);
        match result {
            Ok(body) => Ok(detail_of(body)),
            Err(transport_error) => {
                error!(error = %transport_error, url = %resolved, "failed to fetch detail");
                notice::report_error(format!("Failed to load details: {transport_error}"));
                Err(ActionError::Transport(transport_error))
            }
        }
    }

    /// Dispatch an action against a row (or without one for top-level
    /// buttons such as "Add New"). Opens the matching dialog.
    pub async fn begin(
        &self,
        action: &ActionSchema,
        row: Option<&serde_json::Value>,
    ) -> Result<(), ActionError<T::Error>> {
        match action.kind {
            ActionKind::ActionView => {
                let row = row.ok_or_else(|| ActionError::RowRequired(action.title.clone()))?;
                // Fetch the full record when the descriptor points at a
                // detail endpoint; the list row is only a projection.
                let detail = match &action.action_url {
                    Some(template) => self.fetch_detail(template, row).await?,
                    None => row.clone(),
                };
                self.dialog.set(Dialog::Viewing {
                    title: action.title.clone(),
                    row: detail,
                });
            }
            ActionKind::ShowPopup => {
                let dialog = match row {
                    Some(row) => {
                        let hydrated = match &action.action_url {
                            Some(template) => self.fetch_detail(template, row).await?,
                            None => row.clone(),
                        };
                        Dialog::Editing {
                            form: form::initialize_from_row(&action.fields, &hydrated),
                            row_id: url::row_id(&hydrated).or_else(|| url::row_id(row)),
                            action: action.clone(),
                        }
                    }
                    None => Dialog::Editing {
                        form: form::initialize_defaults(&action.fields),
                        row_id: None,
                        action: action.clone(),
                    },
                };
                self.dialog.set(dialog);
            }
            ActionKind::ActionDelete => {
                let row = row.ok_or_else(|| ActionError::RowRequired(action.title.clone()))?;
                self.dialog.set(Dialog::ConfirmingDelete {
                    action: action.clone(),
                    row: row.clone(),
                });
            }
            ActionKind::ActionToggleStatus => {
                let row = row.ok_or_else(|| ActionError::RowRequired(action.title.clone()))?;
                let field = action
                    .status_field
                    .clone()
                    .expect("toggle action compiled without status field");
                let current = row
                    .get(&field)
                    .and_then(coerce_bool)
                    .unwrap_or(false);
                self.dialog.set(Dialog::ConfirmingStatus {
                    action: action.clone(),
                    row: row.clone(),
                    field,
                    current,
                    next: !current,
                });
            }
        }
        Ok(())
    }

    /// Update the form of an open edit dialog.
    pub fn set_form_value(&self, key: impl Into<String>, value: serde_json::Value) {
        let key = key.into();
        self.dialog.update(|dialog| {
            if let Dialog::Editing { form, .. } = dialog {
                form.insert(key, value);
            }
        });
    }

    /// Close the open dialog without submitting. Entered data is
    /// discarded; nothing is reloaded.
    pub fn cancel(&self) {
        self.dialog.set(Dialog::Idle);
    }

    fn begin_mutation(&self) -> Result<BusyGuard, ActionError<T::Error>> {
        let already = self.busy.update(|busy| std::mem::replace(busy, true));
        if already {
            debug!("mutation already in flight, rejecting duplicate");
            return Err(ActionError::Busy);
        }
        Ok(BusyGuard(self.busy.clone()))
    }

    async fn submit(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<(), ActionError<T::Error>> {
        let _busy = self.begin_mutation()?;
        self.loading.begin(LoadingKey::Submit);
        let result = self.transport.request(method, url, &[], body).await;
        self.loading.end(&LoadingKey::Submit);
        result.map(|_| ()).map_err(ActionError::Transport)
    }

    /// Confirm the open dialog. On success the dialog returns to idle
    /// and `Mutated` asks the shell to reload; on failure the dialog
    /// stays open with its state intact.
    pub async fn confirm(&self) -> Result<Confirmation, ActionError<T::Error>> {
        match self.dialog.get() {
            Dialog::Idle => Err(ActionError::NoDialog),
            Dialog::Viewing { .. } => {
                self.dialog.set(Dialog::Idle);
                Ok(Confirmation::Closed)
            }
            Dialog::ConfirmingDelete { action, row } => {
                let template = action
                    .action_url
                    .as_deref()
                    .ok_or_else(|| ActionError::NoSubmitUrl(action.title.clone()))?;
                let resolved = url::resolve(template, url::row_id(&row).as_deref())?;
                match self.submit(action.method(), &resolved, None).await {
                    Ok(()) => {
                        self.dialog.set(Dialog::Idle);
                        Ok(Confirmation::Mutated)
                    }
                    Err(submit_error) => {
                        error!(error = %submit_error, url = %resolved, "delete failed");
                        notice::report_error(format!("Delete failed: {submit_error}"));
                        Err(submit_error)
                    }
                }
            }
            Dialog::ConfirmingStatus {
                action,
                row,
                field,
                next,
                ..
            } => {
                let template = action
                    .action_url
                    .as_deref()
                    .ok_or_else(|| ActionError::NoSubmitUrl(action.title.clone()))?;
                let resolved = url::resolve(template, url::row_id(&row).as_deref())?;
                let mut body = serde_json::Map::new();
                body.insert(field, serde_json::Value::Bool(next));
                let body = serde_json::Value::Object(body);
                match self.submit(action.method(), &resolved, Some(&body)).await {
                    Ok(()) => {
                        self.dialog.set(Dialog::Idle);
                        Ok(Confirmation::Mutated)
                    }
                    Err(submit_error) => {
                        error!(error = %submit_error, url = %resolved, "status toggle failed");
                        notice::report_error(format!("Status update failed: {submit_error}"));
                        Err(submit_error)
                    }
                }
            }
            Dialog::Editing {
                action,
                form,
                row_id,
            } => {
                let missing = form::missing_required(&action.fields, &form);
                if !missing.is_empty() {
                    return Err(ActionError::MissingRequired(missing));
                }
                let template = action
                    .submit_url
                    .as_deref()
                    .or(action.action_url.as_deref())
                    .ok_or_else(|| ActionError::NoSubmitUrl(action.title.clone()))?;
                let is_edit = row_id.is_some();
                let resolved = url::resolve(template, row_id.as_deref())?;
                let payload = serde_json::Value::Object(form::build_payload(&action.fields, &form));
                match self
                    .submit(action.submit_method(is_edit), &resolved, Some(&payload))
                    .await
                {
                    Ok(()) => {
                        self.dialog.set(Dialog::Idle);
                        Ok(Confirmation::Mutated)
                    }
                    Err(submit_error) => {
                        // The dialog stays open with the entered data so
                        // nothing is lost.
                        error!(error = %submit_error, url = %resolved, "form submit failed");
                        notice::report_error(format!("Save failed: {submit_error}"));
                        Err(submit_error)
                    }
                }
            }
        }
    }
}
