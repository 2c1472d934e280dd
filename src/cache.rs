//! Remote-state query cache.
//!
//! Server data is cached under structured keys and considered fresh for a
//! per-entity-class window. Mutations invalidate whole entity classes
//! rather than patching cached values, so the next read refetches.
//!
//! Every fetch goes through a ticket. A ticket only commits if it is still
//! the latest issued for its key and its entity class has not been
//! invalidated since, so a slow response can never overwrite newer data.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Mutex;
use std::time::Instant;

use crate::config::CacheWindows;
use crate::error::ApiError;

/// The invalidation granularity: every cached query belongs to exactly
/// one entity class, and mutations invalidate classes wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityClass {
    Expenses,
    Shares,
    Debts,
    Friendships,
    Groups,
    Invitations,
    Notifications,
    Statistics,
    Users,
}

impl EntityClass {
    pub const ALL: [EntityClass; 9] = [
        EntityClass::Expenses,
        EntityClass::Shares,
        EntityClass::Debts,
        EntityClass::Friendships,
        EntityClass::Groups,
        EntityClass::Invitations,
        EntityClass::Notifications,
        EntityClass::Statistics,
        EntityClass::Users,
    ];
}

/// Identifies one cached query: an entity class plus the parameters that
/// distinguish it from sibling queries (an id, filter values, a user id).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub class: EntityClass,
    pub params: Vec<String>,
}

impl QueryKey {
    /// The unfiltered list for a class.
    pub fn list(class: EntityClass) -> Self {
        Self {
            class,
            params: Vec::new(),
        }
    }

    /// A single entity by id.
    pub fn detail(class: EntityClass, id: impl fmt::Display) -> Self {
        Self {
            class,
            params: vec![id.to_string()],
        }
    }

    /// A filtered list. Callers must build `params` deterministically so
    /// the same filter always maps to the same key.
    pub fn filtered(class: EntityClass, params: Vec<String>) -> Self {
        Self { class, params }
    }
}

/// Permission to commit one fetch result. Stale tickets commit nothing.
#[derive(Debug)]
pub struct FetchTicket {
    key: QueryKey,
    issue: u64,
    class_generation: u64,
}

struct Entry {
    value: Box<dyn Any + Send + Sync>,
    fetched_at: Instant,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<QueryKey, Entry>,
    /// Bumped on invalidation; tickets issued before the bump are void.
    class_generations: HashMap<EntityClass, u64>,
    /// Last ticket issued per key; earlier tickets are superseded.
    issued: HashMap<QueryKey, u64>,
}

/// Cache of remote query results keyed by [`QueryKey`].
pub struct QueryCache {
    inner: Mutex<Inner>,
    windows: CacheWindows,
}

impl QueryCache {
    pub fn new(windows: CacheWindows) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            windows,
        }
    }

    /// Get a cached value if present and still within its freshness window.
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &QueryKey) -> Option<T> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let entry = inner.entries.get(key)?;
        if entry.fetched_at.elapsed() > self.windows.window_for(key.class) {
            return None;
        }
        entry.value.downcast_ref::<T>().cloned()
    }

    /// Start a fetch for `key`, superseding any ticket issued earlier.
    pub fn begin(&self, key: &QueryKey) -> FetchTicket {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let issue = inner.issued.entry(key.clone()).or_insert(0);
        *issue += 1;
        let issue = *issue;
        let class_generation = inner
            .class_generations
            .get(&key.class)
            .copied()
            .unwrap_or(0);
        FetchTicket {
            key: key.clone(),
            issue,
            class_generation,
        }
    }

    /// Commit a fetch result. Returns `false` (and stores nothing) if the
    /// ticket was superseded by a later fetch or voided by an invalidation.
    pub fn complete<T: Clone + Send + Sync + 'static>(&self, ticket: FetchTicket, value: &T) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        let current_issue = inner.issued.get(&ticket.key).copied().unwrap_or(0);
        let current_generation = inner
            .class_generations
            .get(&ticket.key.class)
            .copied()
            .unwrap_or(0);
        if ticket.issue != current_issue || ticket.class_generation != current_generation {
            tracing::debug!(?ticket.key, "discarding superseded fetch result");
            return false;
        }

        inner.entries.insert(
            ticket.key,
            Entry {
                value: Box::new(value.clone()),
                fetched_at: Instant::now(),
            },
        );
        true
    }

    /// Return the cached value if fresh, otherwise run `fetch` and commit
    /// the result under a ticket.
    ///
    /// The returned value is handed to the caller even when the commit is
    /// refused; only the cache ignores a superseded response.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &QueryKey, fetch: F) -> Result<T, ApiError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if let Some(value) = self.get::<T>(key) {
            return Ok(value);
        }
        let ticket = self.begin(key);
        let value = fetch().await?;
        self.complete(ticket, &value);
        Ok(value)
    }

    /// Drop every cached query in the given classes and void their
    /// outstanding tickets.
    pub fn invalidate(&self, classes: &[EntityClass]) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        for class in classes {
            *inner.class_generations.entry(*class).or_insert(0) += 1;
            inner.entries.retain(|key, _| key.class != *class);
        }
        tracing::debug!(?classes, "invalidated cache classes");
    }

    /// Drop everything. Used on sign-out so no data leaks across accounts.
    pub fn clear(&self) {
        self.invalidate(&EntityClass::ALL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn cache() -> QueryCache {
        QueryCache::new(CacheWindows::default())
    }

    fn instant_stale() -> QueryCache {
        let mut windows = CacheWindows::default();
        windows.expenses = Duration::ZERO;
        QueryCache::new(windows)
    }

    #[test]
    fn commit_then_get_round_trips() {
        let cache = cache();
        let key = QueryKey::list(EntityClass::Expenses);
        let ticket = cache.begin(&key);
        assert!(cache.complete(ticket, &vec![1u64, 2, 3]));
        assert_eq!(cache.get::<Vec<u64>>(&key), Some(vec![1, 2, 3]));
    }

    #[test]
    fn stale_entries_are_not_returned() {
        let cache = instant_stale();
        let key = QueryKey::list(EntityClass::Expenses);
        let ticket = cache.begin(&key);
        assert!(cache.complete(ticket, &vec![1u64]));
        assert_eq!(cache.get::<Vec<u64>>(&key), None);
    }

    #[test]
    fn superseded_ticket_is_discarded() {
        let cache = cache();
        let key = QueryKey::detail(EntityClass::Expenses, 7);

        let first = cache.begin(&key);
        let second = cache.begin(&key);

        // The newer fetch lands first; the older one must not clobber it.
        assert!(cache.complete(second, &"new".to_string()));
        assert!(!cache.complete(first, &"old".to_string()));
        assert_eq!(cache.get::<String>(&key), Some("new".to_string()));
    }

    #[test]
    fn invalidation_voids_in_flight_tickets() {
        let cache = cache();
        let key = QueryKey::list(EntityClass::Debts);
        let ticket = cache.begin(&key);

        cache.invalidate(&[EntityClass::Debts]);

        assert!(!cache.complete(ticket, &vec![1u64]));
        assert_eq!(cache.get::<Vec<u64>>(&key), None);
    }

    #[test]
    fn invalidation_is_class_scoped() {
        let cache = cache();
        let expenses = QueryKey::list(EntityClass::Expenses);
        let debts = QueryKey::list(EntityClass::Debts);

        let t1 = cache.begin(&expenses);
        cache.complete(t1, &"expenses".to_string());
        let t2 = cache.begin(&debts);
        cache.complete(t2, &"debts".to_string());

        cache.invalidate(&[EntityClass::Expenses]);

        assert_eq!(cache.get::<String>(&expenses), None);
        assert_eq!(cache.get::<String>(&debts), Some("debts".to_string()));
    }

    #[tokio::test]
    async fn get_or_fetch_skips_the_fetch_when_fresh() {
        let cache = cache();
        let key = QueryKey::list(EntityClass::Groups);

        let value = cache
            .get_or_fetch(&key, || async { Ok::<_, ApiError>(41u64) })
            .await
            .unwrap();
        assert_eq!(value, 41);

        // Second call must come from the cache, not the closure.
        let value = cache
            .get_or_fetch(&key, || async {
                Err::<u64, _>(ApiError::Network("should not run".into()))
            })
            .await
            .unwrap();
        assert_eq!(value, 41);
    }

    #[test]
    fn clear_empties_every_class() {
        let cache = cache();
        for class in EntityClass::ALL {
            let key = QueryKey::list(class);
            let ticket = cache.begin(&key);
            cache.complete(ticket, &1u64);
        }
        cache.clear();
        for class in EntityClass::ALL {
            assert_eq!(cache.get::<u64>(&QueryKey::list(class)), None);
        }
    }
}
