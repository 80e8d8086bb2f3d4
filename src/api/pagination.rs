use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;

/// Raw `?page=&per_page=` query parameters as they arrive.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageQuery {
    /// Clamp to sane bounds: page >= 1, 1 <= per_page <= configured maximum.
    pub fn resolve(&self, api: &ApiConfig) -> Page {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(api.default_page_size)
            .clamp(1, api.max_page_size);
        Page { page, per_page }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: i64,
    pub per_page: i64,
}

impl Page {
    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: i64,
    pub per_page: i64,
    pub total_items: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: Page, total_items: i64) -> Self {
        let total_pages = if page.per_page > 0 {
            (total_items + page.per_page - 1) / page.per_page
        } else {
            0
        };
        Self {
            page: page.page,
            per_page: page.per_page,
            total_items,
            total_pages,
            has_next: page.page < total_pages,
            has_prev: page.page > 1,
        }
    }
}

/// A page of items plus its pagination block; serialized as the `data` of
/// every listing endpoint.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: Page, total_items: i64) -> Self {
        Self {
            items,
            pagination: PaginationMeta::new(page, total_items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> ApiConfig {
        ApiConfig {
            default_page_size: 10,
            max_page_size: 100,
            enable_cors: true,
        }
    }

    #[test]
    fn defaults_applied_when_absent() {
        let page = PageQuery::default().resolve(&api());
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 10);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn per_page_is_clamped() {
        let q = PageQuery {
            page: Some(0),
            per_page: Some(10_000),
        };
        let page = q.resolve(&api());
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 100);
    }

    #[test]
    fn pagination_meta_rounds_up() {
        let page = Page { page: 2, per_page: 10 };
        let meta = PaginationMeta::new(page, 21);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(meta.has_prev);
    }

    #[test]
    fn offset_advances_with_page() {
        let page = Page { page: 3, per_page: 20 };
        assert_eq!(page.offset(), 40);
        assert_eq!(page.limit(), 20);
    }
}
