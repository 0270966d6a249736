use std::sync::{Arc, Mutex};

use futures::future::join_all;
use indexmap::IndexMap;
use tracing::{debug, error};

use crate::{
    Error, ErrorContext, ErrorDetail, notice,
    options::{self, SelectOption},
    pager::is_cleared_criterion,
    store::{LoadingKey, LoadingSet},
    transport::{Method, Transport},
};

/// One selector in the chain. Ancestor selections are passed to the
/// option endpoint as query params named by the ancestor keys.
#[derive(Debug, Clone)]
pub struct FilterNode {
    pub key: String,
    pub depends_on: Vec<String>,
    pub options_url: String,
    pub value_key: Option<String>,
    pub label_key: Option<String>,
}

#[derive(Debug, Default)]
struct NodeState {
    selected: Option<String>,
    options: Vec<SelectOption>,
    /// Bumped on every clear; an option fetch that captured an older
    /// epoch discards its response on arrival.
    epoch: u64,
}

fn first_failure<E>(results: Vec<Result<(), FilterError<E>>>) -> Result<(), FilterError<E>> {
    results.into_iter().find(Result::is_err).unwrap_or(Ok(()))
}

#[derive(Debug, thiserror::Error)]
pub enum FilterError<E> {
    #[error("unknown filter {0}")]
    UnknownNode(String),
    #[error("option fetch failed: {0}")]
    Transport(E),
}

pub struct FilterChain<T> {
    transport: T,
    nodes: Arc<IndexMap<String, FilterNode>>,
    state: Arc<Mutex<IndexMap<String, NodeState>>>,
    loading: LoadingSet,
}

impl<T: Clone> Clone for FilterChain<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            nodes: self.nodes.clone(),
            state: self.state.clone(),
            loading: self.loading.clone(),
        }
    }
}

impl<T: Transport> FilterChain<T> {
    /// Nodes must be declared after every node they depend on; that
    /// ordering keeps the chain acyclic by construction.
    pub fn new(
        transport: T,
        page: &str,
        nodes: Vec<FilterNode>,
        loading: LoadingSet,
    ) -> Result<Self, Error> {
        let ctx = ErrorContext::new(page);
        let mut index = IndexMap::with_capacity(nodes.len());
        for node in nodes {
            let ctx = ctx.with_subject(&node.key);
            for parent in &node.depends_on {
                if !index.contains_key(parent) {
                    let detail = if parent == &node.key {
                        ErrorDetail::FilterOrder {
                            node: node.key.clone(),
                        }
                    } else {
                        ErrorDetail::UnknownFilterParent {
                            node: node.key.clone(),
                            parent: parent.clone(),
                        }
                    };
                    return Err(ctx.error(detail));
                }
            }
            index.insert(node.key.clone(), node);
        }
        let state = index
            .keys()
            .map(|key| (key.clone(), NodeState::default()))
            .collect();
        Ok(Self {
            transport,
            nodes: Arc::new(index),
            state: Arc::new(Mutex::new(state)),
            loading,
        })
    }

    pub fn has_node(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn selection(&self, key: &str) -> Option<String> {
        self.state
            .lock()
            .expect("filter state poisoned")
            .get(key)
            .and_then(|node| node.selected.clone())
    }

    pub fn options(&self, key: &str) -> Vec<SelectOption> {
        self.state
            .lock()
            .expect("filter state poisoned")
            .get(key)
            .map(|node| node.options.clone())
            .unwrap_or_default()
    }

    /// Current selections, in chain order, for merging into search
    /// criteria.
    pub fn selections(&self) -> IndexMap<String, String> {
        let state = self.state.lock().expect("filter state poisoned");
        state
            .iter()
            .filter_map(|(key, node)| node.selected.clone().map(|value| (key.clone(), value)))
            .collect()
    }

    fn descendants_of(&self, key: &str) -> Vec<String> {
        let mut reached = vec![key.to_owned()];
        // Nodes are stored in dependency order, so one forward pass
        // closes the transitive set.
        for (candidate, node) in self.nodes.iter() {
            if node.depends_on.iter().any(|dep| reached.contains(dep)) {
                reached.push(candidate.clone());
            }
        }
        reached.remove(0);
        reached
    }

    fn ancestors_of(&self, key: &str) -> Vec<String> {
        let mut reached = vec![key.to_owned()];
        for (candidate, node) in self.nodes.iter().rev() {
            if reached.contains(candidate) {
                for dep in &node.depends_on {
                    if !reached.contains(dep) {
                        reached.push(dep.clone());
                    }
                }
            }
        }
        reached.remove(0);
        self.nodes
            .keys()
            .filter(|key| reached.contains(*key))
            .cloned()
            .collect()
    }

    /// Change one node's selection.
    ///
    /// Every descendant is cleared unconditionally before any fetch is
    /// issued; only the immediate children whose parents are all
    /// selected get their options reloaded. Further descendants stay
    /// empty until the user selects the next link.
    pub async fn select(&self, key: &str, value: &str) -> Result<(), FilterError<T::Error>> {
        if !self.nodes.contains_key(key) {
            return Err(FilterError::UnknownNode(key.to_owned()));
        }
        let cleared = is_cleared_criterion(value);
        let pending = {
            let mut state = self.state.lock().expect("filter state poisoned");
            state.get_mut(key).expect("node state missing").selected =
                (!cleared).then(|| value.to_owned());
            for descendant in self.descendants_of(key) {
                let node = state.get_mut(&descendant).expect("node state missing");
                node.selected = None;
                node.options.clear();
                node.epoch += 1;
            }
            if cleared {
                return Ok(());
            }
            let satisfied = |node: &FilterNode| {
                node.depends_on.iter().all(|dep| {
                    state
                        .get(dep)
                        .map(|parent| parent.selected.is_some())
                        .unwrap_or(false)
                })
            };
            self.nodes
                .values()
                .filter(|node| node.depends_on.iter().any(|dep| dep == key))
                .filter(|node| satisfied(node))
                .map(|node| {
                    let epoch = state.get(&node.key).expect("node state missing").epoch;
                    let params = self
                        .ancestors_of(&node.key)
                        .into_iter()
                        .filter_map(|ancestor| {
                            state
                                .get(&ancestor)
                                .and_then(|s| s.selected.clone())
                                .map(|value| (ancestor, value))
                        })
                        .collect::<Vec<_>>();
                    (node.clone(), epoch, params)
                })
                .collect::<Vec<_>>()
        };

        let fetches = pending.into_iter().map(|(node, epoch, params)| async move {
            self.fetch_options(node, epoch, params).await
        });
        first_failure(join_all(fetches).await)
    }

    /// Load options for every root node. Called once at page mount.
    pub async fn prime(&self) -> Result<(), FilterError<T::Error>> {
        let roots = {
            let state = self.state.lock().expect("filter state poisoned");
            self.nodes
                .values()
                .filter(|node| node.depends_on.is_empty())
                .map(|node| {
                    let epoch = state.get(&node.key).expect("node state missing").epoch;
                    (node.clone(), epoch, Vec::new())
                })
                .collect::<Vec<_>>()
        };
        let fetches = roots.into_iter().map(|(node, epoch, params)| async move {
            self.fetch_options(node, epoch, params).await
        });
        // One root failing must not keep the others from loading.
        first_failure(join_all(fetches).await)
    }

    async fn fetch_options(
        &self,
        node: FilterNode,
        epoch: u64,
        params: Vec<(String, String)>,
    ) -> Result<(), FilterError<T::Error>> {
        let loading_key = LoadingKey::Options(node.key.clone());
        self.loading.begin(loading_key.clone());
        let result = self
            .transport
            .request(Method::Get, &node.options_url, &params, None)
            .await;
        self.loading.end(&loading_key);
        let body = match result {
            Ok(body) => body,
            Err(error) => {
                error!(%error, filter = %node.key, "failed to load filter options");
                notice::report_error(format!("Failed to load {} options: {error}", node.key));
                return Err(FilterError::Transport(error));
            }
        };
        let options = options::normalize(
            body,
            node.value_key.as_deref(),
            node.label_key.as_deref(),
        );
        let mut state = self.state.lock().expect("filter state poisoned");
        let entry = state.get_mut(&node.key).expect("node state missing");
        if entry.epoch != epoch {
            debug!(filter = %node.key, "discarding stale option response");
            return Ok(());
        }
        entry.options = options;
        Ok(())
    }
}
