//! Pagination and search primitives shared by the CRUD list endpoints.

use serde::{Deserialize, Serialize};

/// Query string accepted by every list endpoint: `?search=&page=&per_page=`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListQuery {
    /// Maximum items per page.
    const MAX_PER_PAGE: i64 = 100;

    /// Default items per page.
    const DEFAULT_PER_PAGE: i64 = 25;

    pub fn limit(&self) -> i64 {
        self.per_page
            .unwrap_or(Self::DEFAULT_PER_PAGE)
            .clamp(1, Self::MAX_PER_PAGE)
    }

    pub fn offset(&self) -> i64 {
        (self.current_page() - 1).saturating_mul(self.limit())
    }

    pub fn current_page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Trimmed search term; blank input means "no filter".
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Paged result envelope returned by list endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: i64, query: &ListQuery) -> Self {
        let per_page = query.limit();
        let total_pages = total.saturating_add(per_page - 1) / per_page;
        Self {
            items,
            total,
            page: query.current_page(),
            per_page,
            total_pages,
        }
    }

    /// Convert the items while keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}
