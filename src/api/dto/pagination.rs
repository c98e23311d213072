//! Page-number pagination for listings.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// `?page=&page_size=`; out-of-range values are clamped rather than rejected.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-based)
    #[serde(default = "default_page")]
    #[param(minimum = 1, example = 1)]
    pub page: u32,

    /// Items per page (max 100)
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100, example = 10)]
    pub page_size: u32,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PaginationParams {
    pub fn normalize(mut self) -> Self {
        if self.page == 0 {
            self.page = 1;
        }
        if self.page_size == 0 {
            self.page_size = DEFAULT_PAGE_SIZE;
        }
        self.page_size = self.page_size.min(MAX_PAGE_SIZE);
        self
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PagedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct PaginationMeta {
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub page_size: u32,
    #[schema(example = 42)]
    pub total_items: u64,
    #[schema(example = 5)]
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> PagedResponse<T> {
    pub fn new(data: Vec<T>, params: &PaginationParams, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(u64::from(params.page_size)) as u32;
        Self {
            data,
            pagination: PaginationMeta {
                page: params.page,
                page_size: params.page_size,
                total_items,
                total_pages,
                has_next: params.page < total_pages,
                has_prev: params.page > 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: u32, page_size: u32) -> PaginationParams {
        PaginationParams { page, page_size }.normalize()
    }

    #[test]
    fn test_defaults_to_ten_per_page() {
        let parsed: PaginationParams = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.page, 1);
        assert_eq!(parsed.page_size, 10);
    }

    #[test]
    fn test_normalize_clamps() {
        let p = params(0, 500);
        assert_eq!((p.page, p.page_size), (1, 100));
        assert_eq!(params(2, 0).page_size, 10);
    }

    #[test]
    fn test_offset_and_limit() {
        let p = params(3, 10);
        assert_eq!(p.offset(), 20);
        assert_eq!(p.limit(), 10);
    }

    #[test]
    fn test_meta_for_partial_last_page() {
        let page: PagedResponse<u8> = PagedResponse::new(vec![1, 2], &params(3, 10), 22);
        assert_eq!(
            page.pagination,
            PaginationMeta {
                page: 3,
                page_size: 10,
                total_items: 22,
                total_pages: 3,
                has_next: false,
                has_prev: true,
            }
        );
    }

    #[test]
    fn test_meta_for_empty_listing() {
        let page: PagedResponse<u8> = PagedResponse::new(vec![], &params(1, 10), 0);
        assert_eq!(page.pagination.total_pages, 0);
        assert!(!page.pagination.has_next);
        assert!(!page.pagination.has_prev);
    }
}
