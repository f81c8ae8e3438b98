//! Repository contract shared by every aggregate.

use async_trait::async_trait;
use common::{Classify, ErrorKind, Version};
use serde::Serialize;
use thiserror::Error;

use crate::aggregate::Aggregate;

/// Errors returned by repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The stored version moved since the aggregate was loaded.
    #[error("concurrent update on {entity} {id}: expected version {expected}, found {actual}")]
    Conflict {
        entity: &'static str,
        id: String,
        expected: Version,
        actual: Version,
    },

    /// A uniqueness constraint was violated.
    #[error("{entity} with {field} '{value}' already exists")]
    Duplicate {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RepositoryError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        RepositoryError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        RepositoryError::Backend(Box::new(err))
    }
}

impl Classify for RepositoryError {
    fn kind(&self) -> ErrorKind {
        match self {
            RepositoryError::NotFound { .. } => ErrorKind::NotFound,
            RepositoryError::Conflict { .. } | RepositoryError::Duplicate { .. } => {
                ErrorKind::Conflict
            }
            RepositoryError::Serialization(_) | RepositoryError::Backend(_) => ErrorKind::Internal,
        }
    }
}

pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Default page size for list queries.
pub const DEFAULT_LIMIT: usize = 20;
/// Upper bound applied to any requested page size.
pub const MAX_LIMIT: usize = 100;

/// Paginated query with an aggregate-specific filter.
#[derive(Debug, Clone)]
pub struct ListQuery<F> {
    pub offset: usize,
    pub limit: usize,
    pub filter: F,
}

impl<F: Default> Default for ListQuery<F> {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
            filter: F::default(),
        }
    }
}

impl<F> ListQuery<F> {
    pub fn new(filter: F) -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
            filter,
        }
    }

    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit.clamp(1, MAX_LIMIT);
        self
    }
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> Page<T> {
    /// Slices an already filtered and ordered result set.
    pub fn from_vec(all: Vec<T>, offset: usize, limit: usize) -> Self {
        let total = all.len();
        let items = all.into_iter().skip(offset).take(limit).collect();
        Self { items, total }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

/// CRUD shared by every aggregate repository.
///
/// Writes use optimistic concurrency: `update` succeeds only if the stored
/// version equals `aggregate.version()`, and returns the bumped version.
/// Child collections are written together with the root, so a reader never
/// sees a half-written aggregate.
#[async_trait]
pub trait Repository<A: Aggregate>: Send + Sync {
    /// Stores a new aggregate; returns its first version.
    async fn insert(&self, aggregate: &A) -> RepositoryResult<Version>;

    /// Loads an aggregate, failing with `NotFound` if absent.
    async fn get(&self, id: &A::Id) -> RepositoryResult<A>;

    /// Replaces the stored aggregate if its version is unchanged.
    async fn update(&self, aggregate: &A) -> RepositoryResult<Version>;

    /// Physically removes an aggregate.
    async fn delete(&self, id: &A::Id) -> RepositoryResult<()>;

    /// Loads an aggregate, mapping `NotFound` to `None`.
    async fn find(&self, id: &A::Id) -> RepositoryResult<Option<A>> {
        match self.get(id).await {
            Ok(aggregate) => Ok(Some(aggregate)),
            Err(RepositoryError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
