//! HTTP handlers, one module per resource.

pub mod auth;
pub mod kitchen;
pub mod ops;
pub mod orders;
pub mod reservations;

use serde::Deserialize;

/// `?offset=&limit=` paging shared by the list endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Paging {
    pub fn apply<F>(self, query: domain::ListQuery<F>) -> domain::ListQuery<F> {
        let offset = self.offset.unwrap_or(query.offset);
        let limit = self.limit.unwrap_or(query.limit);
        query.page(offset, limit)
    }
}

/// Body of the status-change endpoints.
#[derive(Debug, Deserialize)]
pub struct StatusRequest<S> {
    pub status: S,
}

/// Body of the cancel endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}
