// src/common/pagination.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
/// Teto do `limit`; o valor efetivo volta em `PaginationMeta.limit`.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Paginação por offset, com página 1-indexada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, limit: DEFAULT_PAGE_SIZE }
    }
}

impl Pagination {
    /// Normaliza os parâmetros vindos da query string (`page`, `limit`/`pageSize`).
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn meta(&self, total: i64) -> PaginationMeta {
        PaginationMeta {
            page: self.page,
            limit: self.limit,
            total,
            total_pages: total_pages(total, self.limit),
        }
    }
}

pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total <= 0 || limit <= 0 {
        0
    } else {
        (total + limit - 1) / limit
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    #[schema(example = 1)]
    pub page: i64,
    #[schema(example = 10)]
    pub limit: i64,
    #[schema(example = 42)]
    pub total: i64,
    #[schema(example = 5)]
    pub total_pages: i64,
}

/// Uma página de resultados + o total do conjunto FILTRADO.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> Page<T> {
    pub fn empty(pagination: Pagination) -> Self {
        Self { items: Vec::new(), meta: pagination.meta(0) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_is_ceiling_division() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(25, 7), 4);
    }

    #[test]
    fn params_are_normalised() {
        assert_eq!(Pagination::new(None, None), Pagination { page: 1, limit: 10 });
        assert_eq!(Pagination::new(Some(0), Some(0)), Pagination { page: 1, limit: 1 });
        assert_eq!(Pagination::new(Some(-3), Some(500)), Pagination { page: 1, limit: MAX_PAGE_SIZE });
    }

    #[test]
    fn oversized_page_size_is_echoed_as_the_cap() {
        let meta = Pagination::new(Some(1), Some(500)).meta(250);
        assert_eq!(meta.limit, MAX_PAGE_SIZE);
        assert_eq!(meta.total_pages, 3);
    }

    #[test]
    fn pages_cover_every_row_exactly_once() {
        let total = 23_i64;
        let limit = 5_i64;
        let mut seen = Vec::new();
        for page in 1..=total_pages(total, limit) {
            let p = Pagination::new(Some(page), Some(limit));
            let end = (p.offset() + p.limit).min(total);
            seen.extend(p.offset()..end);
        }
        assert_eq!(seen, (0..total).collect::<Vec<_>>());
    }
}
