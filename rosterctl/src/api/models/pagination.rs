//! Shared pagination types for API query parameters.
//!
//! List endpoints use page-based pagination with `page` and `limit`
//! parameters; the `limit` is clamped to keep a single request from fetching
//! an unbounded number of rows.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Default number of items to return per page.
pub const DEFAULT_LIMIT: i64 = 10;

/// Maximum number of items that can be requested per page.
pub const MAX_LIMIT: i64 = 100;

/// Standard pagination parameters for list endpoints.
///
/// - `page`: 1-based page number (default: 1)
/// - `limit`: Maximum items per page (default: 10, max: 100)
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    /// 1-based page number (default: 1)
    #[param(default = 1, minimum = 1)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub page: Option<i64>,

    /// Maximum number of items to return (default: 10, max: 100)
    #[param(default = 10, minimum = 1, maximum = 100)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<i64>,
}

impl Pagination {
    /// Get the page number, defaulting to 1 and never below it.
    #[inline]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Get the limit value, clamped between 1 and MAX_LIMIT.
    /// Defaults to DEFAULT_LIMIT if not specified.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Number of items to skip for the requested page.
    #[inline]
    pub fn skip(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

/// Pagination metadata returned next to a page of results.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PageInfo {
    pub page: i64,
    pub limit: i64,
    /// Total number of items matching the query (before pagination)
    pub total: i64,
    /// Total number of pages
    pub pages: i64,
}

impl PageInfo {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            page,
            limit,
            total,
            pages: if limit > 0 { (total + limit - 1) / limit } else { 0 },
        }
    }
}
