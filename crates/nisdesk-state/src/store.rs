//! Generic Uuid-keyed store shared across request handlers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

/// A clonable, thread-safe map from [`Uuid`] to a record type.
///
/// Cloning a `Store` clones the handle, not the contents — all clones see
/// the same data.
#[derive(Debug)]
pub struct Store<T> {
    inner: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Store<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert or replace the record under `id`.
    pub fn insert(&self, id: Uuid, value: T) {
        self.inner.write().insert(id, value);
    }

    /// Remove a record, returning it if present.
    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.inner.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Run `f` over the record under `id` while holding the write lock.
    ///
    /// Returns `None` when the record does not exist; otherwise the
    /// closure's result. The closure may fail without mutating by
    /// returning `Err`.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        let mut guard = self.inner.write();
        guard.get_mut(id).map(f)
    }
}

impl<T: Clone> Store<T> {
    /// Fetch a clone of the record under `id`.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.inner.read().get(id).cloned()
    }

    /// Clone all records.
    pub fn list(&self) -> Vec<T> {
        self.inner.read().values().cloned().collect()
    }

    /// Clone all records matching a predicate.
    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.inner
            .read()
            .values()
            .filter(|v| pred(v))
            .cloned()
            .collect()
    }
}
