//! Injectable reactive state.
//!
//! The page shell owns one [`Store`] per piece of mutable UI state
//! (pagination, criteria, dialog, loading) and passes clones into the
//! orchestrators, so the interpreter stays testable without a rendering
//! framework. Subscribers receive every committed value on an
//! async-channel; a dropped receiver is pruned on the next set.

use std::sync::{Arc, Mutex};

pub struct Store<T> {
    value: Arc<Mutex<T>>,
    subscribers: Arc<Mutex<Vec<async_channel::Sender<T>>>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            subscribers: self.subscribers.clone(),
        }
    }
}

impl<T: Clone> Store<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(Mutex::new(value)),
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn get(&self) -> T {
        self.value.lock().expect("store poisoned").clone()
    }

    pub fn set(&self, value: T) {
        *self.value.lock().expect("store poisoned") = value.clone();
        self.broadcast(value);
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let next = {
            let mut guard = self.value.lock().expect("store poisoned");
            let result = f(&mut guard);
            (result, guard.clone())
        };
        self.broadcast(next.1);
        next.0
    }

    pub fn subscribe(&self) -> async_channel::Receiver<T> {
        let (sender, receiver) = async_channel::unbounded();
        self.subscribers
            .lock()
            .expect("store poisoned")
            .push(sender);
        receiver
    }

    fn broadcast(&self, value: T) {
        self.subscribers
            .lock()
            .expect("store poisoned")
            .retain(|sender| sender.try_send(value.clone()).is_ok());
    }
}

/// One in-flight indicator per operation, so a slow option fetch never
/// blanks the whole page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadingKey {
    PageLoad,
    Detail,
    Submit,
    Options(String),
}

#[derive(Clone)]
pub struct LoadingSet {
    active: Store<Vec<LoadingKey>>,
}

impl Default for LoadingSet {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadingSet {
    pub fn new() -> Self {
        Self {
            active: Store::new(Vec::new()),
        }
    }

    pub fn begin(&self, key: LoadingKey) {
        self.active.update(|active| active.push(key));
    }

    pub fn end(&self, key: &LoadingKey) {
        self.active.update(|active| {
            if let Some(at) = active.iter().position(|k| k == key) {
                active.remove(at);
            }
        });
    }

    pub fn is_loading(&self, key: &LoadingKey) -> bool {
        self.active.get().contains(key)
    }

    pub fn any(&self) -> bool {
        !self.active.get().is_empty()
    }

    pub fn subscribe(&self) -> async_channel::Receiver<Vec<LoadingKey>> {
        self.active.subscribe()
    }
}
