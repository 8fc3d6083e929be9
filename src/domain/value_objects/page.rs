//! Offset pagination.

use serde::Deserialize;

/// Upper bound for a single page.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Raw pagination query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Validated limit/offset pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Resolve query parameters against a default page size, clamping the
    /// limit to `1..=MAX_PAGE_SIZE` and the offset to non-negative values.
    pub fn resolve(query: PageQuery, default_limit: i64) -> Self {
        Self {
            limit: query.limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE),
            offset: query.offset.unwrap_or(0).max(0),
        }
    }
}
