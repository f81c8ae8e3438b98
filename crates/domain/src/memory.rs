//! In-memory storage backing the repository contracts in tests and in
//! single-process deployments.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::Version;
use tokio::sync::RwLock;

use crate::aggregate::Aggregate;
use crate::repository::{Repository, RepositoryError, RepositoryResult};

/// Map of aggregates keyed by id, with version-checked writes.
///
/// Each aggregate's repository trait is implemented for `MemoryStore<A>`
/// in its own module; the type aliases there (`InMemoryOrderRepository`,
/// ...) name the concrete types.
#[derive(Debug)]
pub struct MemoryStore<A: Aggregate> {
    rows: Arc<RwLock<BTreeMap<A::Id, A>>>,
}

impl<A: Aggregate> Clone for MemoryStore<A> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
        }
    }
}

impl<A: Aggregate> Default for MemoryStore<A> {
    fn default() -> Self {
        Self {
            rows: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

impl<A: Aggregate> MemoryStore<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns clones of every stored aggregate matching `predicate`.
    pub async fn filter(&self, predicate: impl Fn(&A) -> bool) -> Vec<A> {
        self.rows
            .read()
            .await
            .values()
            .filter(|a| predicate(a))
            .cloned()
            .collect()
    }

    /// Returns the first stored aggregate matching `predicate`.
    pub async fn find_first(&self, predicate: impl Fn(&A) -> bool) -> Option<A> {
        self.rows
            .read()
            .await
            .values()
            .find(|a| predicate(a))
            .cloned()
    }

    /// Removes every aggregate matching `predicate`; returns how many.
    pub async fn remove_where(&self, predicate: impl Fn(&A) -> bool) -> usize {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|_, a| !predicate(a));
        before - rows.len()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl<A: Aggregate> Repository<A> for MemoryStore<A> {
    async fn insert(&self, aggregate: &A) -> RepositoryResult<Version> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(aggregate.id()) {
            return Err(RepositoryError::Duplicate {
                entity: A::aggregate_type(),
                field: "id",
                value: aggregate.id().to_string(),
            });
        }

        let mut stored = aggregate.clone();
        stored.set_version(Version::first());
        rows.insert(aggregate.id().clone(), stored);
        Ok(Version::first())
    }

    async fn get(&self, id: &A::Id) -> RepositoryResult<A> {
        self.rows
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(A::aggregate_type(), id))
    }

    async fn update(&self, aggregate: &A) -> RepositoryResult<Version> {
        let mut rows = self.rows.write().await;
        let stored = rows
            .get_mut(aggregate.id())
            .ok_or_else(|| RepositoryError::not_found(A::aggregate_type(), aggregate.id()))?;

        if stored.version() != aggregate.version() {
            return Err(RepositoryError::Conflict {
                entity: A::aggregate_type(),
                id: aggregate.id().to_string(),
                expected: aggregate.version(),
                actual: stored.version(),
            });
        }

        let next = aggregate.version().next();
        *stored = aggregate.clone();
        stored.set_version(next);
        Ok(next)
    }

    async fn delete(&self, id: &A::Id) -> RepositoryResult<()> {
        self.rows
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found(A::aggregate_type(), id))
    }
}
