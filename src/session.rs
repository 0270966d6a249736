//! Page session: the thin shell seam.
//!
//! One [`PageSession`] per mounted listing page. The descriptor is
//! compiled once and immutable for the session; all mutable UI state
//! lives in stores owned here and shared with the orchestrators.

use std::sync::Arc;

use futures::join;
use tracing::{debug, error};

use crate::{
    Error,
    action::{ActionError, Confirmation, Dispatcher},
    descriptor::PageDescriptor,
    filter::{FilterChain, FilterError, FilterNode},
    notice,
    options,
    pager::{Pager, PagerError},
    render::{DisplayElement, InputElement, OptionCache, Registry},
    schema::{FieldSchema, OptionsSpec, PageSchema},
    store::{LoadingKey, LoadingSet, Store},
    transport::{Method, Transport},
};

#[derive(Debug, thiserror::Error)]
pub enum SessionError<E> {
    #[error(transparent)]
    Pager(#[from] PagerError<E>),
    #[error(transparent)]
    Filter(#[from] FilterError<E>),
    #[error(transparent)]
    Action(#[from] ActionError<E>),
    #[error("no row at index {0}")]
    RowIndex(usize),
    #[error("no action at index {0}")]
    ActionIndex(usize),
}

pub struct PageSession<T: Transport + Clone> {
    schema: Arc<PageSchema>,
    registry: Arc<Registry>,
    pager: Pager<T>,
    filters: Option<FilterChain<T>>,
    dispatcher: Dispatcher<T>,
    field_options: Store<OptionCache>,
    loading: LoadingSet,
    transport: T,
}

impl<T: Transport + Clone> PageSession<T> {
    pub fn new(transport: T, descriptor: &PageDescriptor) -> Result<Self, Error> {
        let schema = Arc::new(PageSchema::compile(descriptor)?);
        let loading = LoadingSet::new();
        Ok(Self {
            pager: Pager::new(transport.clone(), &schema, loading.clone()),
            dispatcher: Dispatcher::new(transport.clone(), loading.clone()),
            filters: None,
            field_options: Store::new(OptionCache::new()),
            registry: Arc::new(Registry::standard()),
            loading,
            schema,
            transport,
        })
    }

    /// Attach a cascading filter chain (page-specific wiring, e.g. the
    /// chapters page's Exam → Grade → Stream → Batch selectors).
    pub fn with_filters(mut self, nodes: Vec<FilterNode>) -> Result<Self, Error> {
        let chain = FilterChain::new(
            self.transport.clone(),
            &self.schema.title,
            nodes,
            self.loading.clone(),
        )?;
        self.filters = Some(chain);
        Ok(self)
    }

    pub fn schema(&self) -> &PageSchema {
        &self.schema
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn pager(&self) -> &Pager<T> {
        &self.pager
    }

    pub fn filters(&self) -> Option<&FilterChain<T>> {
        self.filters.as_ref()
    }

    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    pub fn loading(&self) -> &LoadingSet {
        &self.loading
    }

    pub fn field_options(&self) -> &Store<OptionCache> {
        &self.field_options
    }

    /// Initial mount: first page, root filter options and search-field
    /// options load concurrently. Option failures degrade to empty lists
    /// and are reported as notices; only a failed list load is returned.
    pub async fn mount(&self) -> Result<(), SessionError<T::Error>> {
        let prime = async {
            if let Some(filters) = &self.filters {
                if let Err(prime_error) = filters.prime().await {
                    debug!(error = %prime_error, "filter priming failed");
                }
            }
        };
        let search_options = async {
            for field in self.search_fields() {
                let _ = self.load_field_options(&field).await;
            }
        };
        let (page, (), ()) = join!(self.pager.load_page(0), prime, search_options);
        page.map_err(SessionError::from)
    }

    fn search_fields(&self) -> Vec<String> {
        self.schema
            .search
            .as_ref()
            .map(|search| {
                search
                    .fields
                    .iter()
                    .filter(|field| matches!(field.options, OptionsSpec::Remote { .. }))
                    .map(|field| field.key.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn find_field(&self, key: &str) -> Option<&FieldSchema> {
        let search = self
            .schema
            .search
            .iter()
            .flat_map(|search| search.fields.iter());
        let popups = self
            .schema
            .buttons
            .iter()
            .chain(
                self.schema
                    .columns
                    .iter()
                    .flat_map(|column| column.actions.iter()),
            )
            .flat_map(|action| action.fields.iter());
        search.chain(popups).find(|field| field.key == key)
    }

    /// Fetch remote options for one select field into the shared cache.
    pub async fn load_field_options(&self, key: &str) -> Result<(), SessionError<T::Error>> {
        let Some(field) = self.find_field(key) else {
            return Ok(());
        };
        let OptionsSpec::Remote {
            url,
            value_key,
            label_key,
        } = field.options.clone()
        else {
            return Ok(());
        };
        let loading_key = LoadingKey::Options(key.to_owned());
        self.loading.begin(loading_key.clone());
        let result = self.transport.request(Method::Get, &url, &[], None).await;
        self.loading.end(&loading_key);
        match result {
            Ok(body) => {
                let loaded = options::normalize(body, value_key.as_deref(), label_key.as_deref());
                self.field_options.update(|cache| {
                    cache.insert(key.to_owned(), loaded);
                });
                Ok(())
            }
            Err(fetch_error) => {
                error!(error = %fetch_error, field = %key, "failed to load field options");
                notice::report_error(format!("Failed to load options for {key}"));
                Err(SessionError::Filter(FilterError::Transport(fetch_error)))
            }
        }
    }

    /// Change a cascading filter: resolve the chain, fold the surviving
    /// selections into the search criteria, and reload from page 0.
    pub async fn select_filter(
        &self,
        key: &str,
        value: &str,
    ) -> Result<(), SessionError<T::Error>> {
        let Some(filters) = &self.filters else {
            return Ok(());
        };
        filters.select(key, value).await?;
        let selections = filters.selections();
        self.pager.criteria().update(|criteria| {
            // Cleared descendants leave the criteria too, not just the UI.
            criteria.retain(|criterion, _| !filters.has_node(criterion));
            for (chain_key, selected) in &selections {
                criteria.insert(chain_key.clone(), selected.clone());
            }
        });
        self.pager.search().await?;
        Ok(())
    }

    pub async fn search(&self) -> Result<(), SessionError<T::Error>> {
        self.pager.search().await.map_err(SessionError::from)
    }

    /// Reset criteria and filter selections, then reload page 0 once.
    pub async fn clear_search(&self) -> Result<(), SessionError<T::Error>> {
        if let Some(filters) = &self.filters {
            for selected in filters.selections().keys() {
                // Clearing a selected node cascades; no fetches go out.
                let _ = filters.select(selected, "").await;
            }
        }
        self.pager.clear_search().await.map_err(SessionError::from)
    }

    pub async fn next_page(&self) -> Result<(), SessionError<T::Error>> {
        self.pager.next_page().await.map_err(SessionError::from)
    }

    pub async fn previous_page(&self) -> Result<(), SessionError<T::Error>> {
        self.pager.previous_page().await.map_err(SessionError::from)
    }

    /// Run a row action from the actions column against the row at
    /// `row_index` of the current page.
    pub async fn run_row_action(
        &self,
        action_index: usize,
        row_index: usize,
    ) -> Result<(), SessionError<T::Error>> {
        let action = self
            .schema
            .actions_column()
            .and_then(|column| column.actions.get(action_index))
            .cloned()
            .ok_or(SessionError::ActionIndex(action_index))?;
        let row = self
            .pager
            .items()
            .get()
            .get(row_index)
            .cloned()
            .ok_or(SessionError::RowIndex(row_index))?;
        self.dispatcher.begin(&action, Some(&row)).await?;
        Ok(())
    }

    /// Run a top-level button (e.g. "Add New").
    pub async fn run_button(&self, button_index: usize) -> Result<(), SessionError<T::Error>> {
        let action = self
            .schema
            .buttons
            .get(button_index)
            .cloned()
            .ok_or(SessionError::ActionIndex(button_index))?;
        self.dispatcher.begin(&action, None).await?;
        Ok(())
    }

    /// Confirm the open dialog; a confirmed mutation reloads the current
    /// page so the table reflects it.
    pub async fn confirm(&self) -> Result<Confirmation, SessionError<T::Error>> {
        let confirmation = self.dispatcher.confirm().await?;
        if confirmation == Confirmation::Mutated {
            self.pager.reload().await?;
        }
        Ok(confirmation)
    }

    pub fn cancel(&self) {
        self.dispatcher.cancel();
    }

    /// Render the current page: one element per column per row.
    pub fn render_rows(&self) -> Vec<Vec<DisplayElement>> {
        let items = self.pager.items().get();
        items
            .iter()
            .map(|row| {
                self.schema
                    .columns
                    .iter()
                    .map(|column| self.registry.render_cell(column, row))
                    .collect()
            })
            .collect()
    }

    /// Render the search bar from the current criteria.
    pub fn render_search_fields(&self) -> Vec<InputElement> {
        let Some(search) = &self.schema.search else {
            return Vec::new();
        };
        let criteria = self.pager.criteria().get();
        let form = criteria
            .iter()
            .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
            .collect();
        let cache = self.field_options.get();
        search
            .fields
            .iter()
            .map(|field| self.registry.render_field(field, &form, &cache))
            .collect()
    }

}
