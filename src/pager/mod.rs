//! Pagination and search orchestration.
//!
//! A [`Pager`] owns the current page, page size and search criteria for
//! one listing page and issues the list requests. Responses are matched
//! against the request sequence issued last; anything arriving late is
//! discarded, so a slow response never overwrites a newer page.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use indexmap::IndexMap;
use tracing::{debug, error};
use valuable::Valuable;

use crate::{
    notice,
    schema::PageSchema,
    store::{LoadingKey, LoadingSet, Store},
    transport::{Method, Transport},
};

pub mod envelope;

/// Values treated as "no selection" and left out of list queries.
pub fn is_cleared_criterion(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("all")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Valuable)]
pub struct PaginationState {
    /// 0-based.
    pub current_page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_elements: u64,
}

impl PaginationState {
    pub fn initial(page_size: u32) -> Self {
        Self {
            current_page: 0,
            page_size,
            total_pages: 0,
            total_elements: 0,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 0
    }

    pub fn has_next(&self) -> bool {
        self.current_page + 1 < self.total_pages
    }

    /// 1-based display label, e.g. "Page 1 of 2".
    pub fn page_label(&self) -> String {
        format!(
            "Page {} of {}",
            self.current_page + 1,
            self.total_pages.max(1)
        )
    }
}

pub type SearchCriteria = IndexMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum PagerError<E> {
    #[error("list request failed: {0}")]
    Transport(E),
}

pub struct Pager<T> {
    transport: T,
    data_url: String,
    page_no_param: String,
    page_size_param: String,
    items: Store<Vec<serde_json::Value>>,
    pagination: Store<PaginationState>,
    criteria: Store<SearchCriteria>,
    seq: Arc<AtomicU64>,
    loading: LoadingSet,
}

impl<T: Clone> Clone for Pager<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            data_url: self.data_url.clone(),
            page_no_param: self.page_no_param.clone(),
            page_size_param: self.page_size_param.clone(),
            items: self.items.clone(),
            pagination: self.pagination.clone(),
            criteria: self.criteria.clone(),
            seq: self.seq.clone(),
            loading: self.loading.clone(),
        }
    }
}

impl<T: Transport> Pager<T> {
    pub fn new(transport: T, schema: &PageSchema, loading: LoadingSet) -> Self {
        Self {
            transport,
            data_url: schema.data_url.clone(),
            page_no_param: schema.page_no_param.clone(),
            page_size_param: schema.page_size_param.clone(),
            items: Store::new(Vec::new()),
            pagination: Store::new(PaginationState::initial(schema.default_page_size)),
            criteria: Store::new(SearchCriteria::new()),
            seq: Arc::new(AtomicU64::new(0)),
            loading,
        }
    }

    pub fn items(&self) -> &Store<Vec<serde_json::Value>> {
        &self.items
    }

    pub fn pagination(&self) -> &Store<PaginationState> {
        &self.pagination
    }

    pub fn criteria(&self) -> &Store<SearchCriteria> {
        &self.criteria
    }

    /// Stage a criterion; takes effect on the next [`Self::search`].
    pub fn set_criterion(&self, key: impl Into<String>, value: impl Into<String>) {
        self.criteria
            .update(|criteria| criteria.insert(key.into(), value.into()));
    }

    fn build_params(&self, page_no: u32, page_size: u32) -> Vec<(String, String)> {
        let mut params = vec![
            (self.page_no_param.clone(), page_no.to_string()),
            (self.page_size_param.clone(), page_size.to_string()),
        ];
        for (key, value) in &self.criteria.get() {
            if !is_cleared_criterion(value) {
                params.push((key.clone(), value.clone()));
            }
        }
        params
    }

    pub async fn load_page(&self, page_no: u32) -> Result<(), PagerError<T::Error>> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let page_size = self.pagination.get().page_size;
        let params = self.build_params(page_no, page_size);
        self.loading.begin(LoadingKey::PageLoad);
        let result = self
            .transport
            .request(Method::Get, &self.data_url, &params, None)
            .await;
        self.loading.end(&LoadingKey::PageLoad);
        let body = match result {
            Ok(body) => body,
            Err(error) => {
                error!(%error, url = %self.data_url, "failed to load page");
                notice::report_error(format!("Failed to load data: {error}"));
                self.items.set(Vec::new());
                self.pagination.update(|state| {
                    *state = PaginationState::initial(state.page_size);
                });
                return Err(PagerError::Transport(error));
            }
        };
        if self.seq.load(Ordering::SeqCst) != seq {
            debug!(seq, page_no, "discarding stale list response");
            return Ok(());
        }
        let envelope = envelope::sniff(body);
        let state = PaginationState {
            current_page: envelope.page_number.unwrap_or(page_no),
            page_size,
            total_pages: envelope.total_pages.unwrap_or(1),
            total_elements: envelope
                .total_elements
                .unwrap_or(envelope.items.len() as u64),
        };
        debug!(pagination = state.as_value(), "loaded page");
        self.items.set(envelope.items);
        self.pagination.set(state);
        Ok(())
    }

    /// Re-issue the current page, e.g. after a mutation.
    pub async fn reload(&self) -> Result<(), PagerError<T::Error>> {
        let page = self.pagination.get().current_page;
        self.load_page(page).await
    }

    /// Apply the staged criteria: reset to the first page, then load.
    pub async fn search(&self) -> Result<(), PagerError<T::Error>> {
        self.pagination.update(|state| state.current_page = 0);
        self.load_page(0).await
    }

    /// Drop all criteria and reset to the first page with a single load.
    pub async fn clear_search(&self) -> Result<(), PagerError<T::Error>> {
        self.criteria.set(SearchCriteria::new());
        self.pagination.update(|state| state.current_page = 0);
        self.load_page(0).await
    }

    /// Changing the page size resets to the first page.
    pub async fn set_page_size(&self, page_size: u32) -> Result<(), PagerError<T::Error>> {
        self.pagination.update(|state| {
            state.page_size = page_size;
            state.current_page = 0;
        });
        self.load_page(0).await
    }

    /// Boundary-guarded; a no-op on the last page.
    pub async fn next_page(&self) -> Result<(), PagerError<T::Error>> {
        let state = self.pagination.get();
        if !state.has_next() {
            return Ok(());
        }
        self.load_page(state.current_page + 1).await
    }

    pub async fn previous_page(&self) -> Result<(), PagerError<T::Error>> {
        let state = self.pagination.get();
        if !state.has_previous() {
            return Ok(());
        }
        self.load_page(state.current_page - 1).await
    }
}
