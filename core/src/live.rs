//! Live queries: reads that re-emit their full result after every write.
//!
//! The database keeps a [`Registry`] of active subscriptions. After each
//! successful write it re-runs every subscription's query and pushes the new
//! list through a `tokio::sync::watch` channel. A [`LiveQuery`] is the
//! receiving end; dropping it unregisters the subscription.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::watch;
use tracing::debug;

use crate::models::Recipe;

/// A read over the recipes table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeQuery {
    /// Every recipe, ordered by category then title.
    All,
    /// Exact category match, ordered by title.
    ByCategory(String),
    /// Title or ingredients contain the text (case-sensitive), ordered by title.
    Search(String),
    SearchInCategory { category: String, query: String },
}

pub(crate) struct Subscriber {
    pub(crate) query: RecipeQuery,
    pub(crate) tx: watch::Sender<Vec<Recipe>>,
}

#[derive(Default)]
pub(crate) struct Registry {
    subscribers: Mutex<HashMap<u64, Subscriber>>,
    next_id: AtomicU64,
}

impl Registry {
    pub(crate) fn lock(&self) -> MutexGuard<'_, HashMap<u64, Subscriber>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn remove(&self, id: u64) {
        if self.lock().remove(&id).is_some() {
            debug!(subscription = id, "live query unsubscribed");
        }
    }

    /// Drops every sender, ending all live queries.
    pub(crate) fn clear(&self) {
        self.lock().clear();
    }
}

/// Subscriber handle returned by `Database::watch`.
pub struct LiveQuery {
    id: u64,
    query: RecipeQuery,
    rx: watch::Receiver<Vec<Recipe>>,
    registry: Weak<Registry>,
    primed: bool,
}

impl LiveQuery {
    pub(crate) fn new(
        id: u64,
        query: RecipeQuery,
        rx: watch::Receiver<Vec<Recipe>>,
        registry: Weak<Registry>,
    ) -> Self {
        LiveQuery {
            id,
            query,
            rx,
            registry,
            primed: false,
        }
    }

    #[must_use]
    pub fn query(&self) -> &RecipeQuery {
        &self.query
    }

    /// Latest result, without waiting.
    #[must_use]
    pub fn current(&self) -> Vec<Recipe> {
        self.rx.borrow().clone()
    }

    /// The first call yields the current result; each later call waits for
    /// the next write. `None` once the database has been closed.
    pub async fn next(&mut self) -> Option<Vec<Recipe>> {
        if self.primed {
            self.rx.changed().await.ok()?;
        } else {
            self.rx.has_changed().ok()?;
            self.primed = true;
        }
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn unsubscribe(self) {}
}

impl Drop for LiveQuery {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}
