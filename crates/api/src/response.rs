//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope. List endpoints that
//! page add a `meta` block.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "data": [...], "meta": {...} }` envelope for paged lists.
#[derive(Debug, Serialize)]
pub struct PagedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// Paging information returned alongside a page of results.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PageMeta {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}
