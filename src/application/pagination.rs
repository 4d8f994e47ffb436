//! Page-number pagination and the list envelope returned by collection endpoints.

use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_ITEMS_PER_PAGE: u32 = 10;
pub const MAX_ITEMS_PER_PAGE: u32 = 100;
pub const DEFAULT_WINDOW_LIMIT: u32 = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("page must be at least 1")]
    InvalidPage,
    #[error("items_per_page must be between 1 and {MAX_ITEMS_PER_PAGE}")]
    InvalidPageSize,
}

/// Offset of the first row on `page` (1-based).
pub fn compute_offset(page: u32, items_per_page: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(items_per_page)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub items_per_page: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, items_per_page: Option<u32>) -> Result<Self, PaginationError> {
        let page = page.unwrap_or(1);
        let items_per_page = items_per_page.unwrap_or(DEFAULT_ITEMS_PER_PAGE);
        if page == 0 {
            return Err(PaginationError::InvalidPage);
        }
        if items_per_page == 0 || items_per_page > MAX_ITEMS_PER_PAGE {
            return Err(PaginationError::InvalidPageSize);
        }
        Ok(Self {
            page,
            items_per_page,
        })
    }

    pub fn window(&self) -> Window {
        Window {
            offset: compute_offset(self.page, self.items_per_page),
            limit: self.items_per_page,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
        }
    }
}

/// Raw offset/limit slice used by repositories and skip/limit style endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u32,
}

impl Window {
    pub fn new(offset: Option<u64>, limit: Option<u32>) -> Self {
        Self {
            offset: offset.unwrap_or(0),
            limit: limit
                .unwrap_or(DEFAULT_WINDOW_LIMIT)
                .clamp(1, DEFAULT_WINDOW_LIMIT),
        }
    }

    pub fn offset_i64(&self) -> i64 {
        i64::try_from(self.offset).unwrap_or(i64::MAX)
    }

    pub fn limit_i64(&self) -> i64 {
        i64::from(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatedList<T> {
    pub data: Vec<T>,
    pub total_count: u64,
    pub has_more: bool,
    pub page: u32,
    pub items_per_page: u32,
}

impl<T> PaginatedList<T> {
    pub fn new(data: Vec<T>, total_count: u64, request: PageRequest) -> Self {
        let seen = u64::from(request.page) * u64::from(request.items_per_page);
        Self {
            data,
            total_count,
            has_more: seen < total_count,
            page: request.page,
            items_per_page: request.items_per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_starts_at_zero_for_first_page() {
        assert_eq!(compute_offset(1, 10), 0);
        assert_eq!(compute_offset(3, 10), 20);
        assert_eq!(compute_offset(0, 10), 0);
    }

    #[test]
    fn has_more_tracks_remaining_rows() {
        let request = PageRequest::new(Some(2), Some(10)).expect("valid page");
        let list = PaginatedList::new(vec![1; 10], 25, request);
        assert!(list.has_more);

        let last = PageRequest::new(Some(3), Some(10)).expect("valid page");
        let list = PaginatedList::new(vec![1; 5], 25, last);
        assert!(!list.has_more);
    }

    #[test]
    fn page_request_rejects_zero_and_oversized_pages() {
        assert_eq!(
            PageRequest::new(Some(0), None),
            Err(PaginationError::InvalidPage)
        );
        assert_eq!(
            PageRequest::new(None, Some(MAX_ITEMS_PER_PAGE + 1)),
            Err(PaginationError::InvalidPageSize)
        );
    }

    #[test]
    fn window_clamps_limit() {
        let window = Window::new(Some(5), Some(10_000));
        assert_eq!(window.offset, 5);
        assert_eq!(window.limit, DEFAULT_WINDOW_LIMIT);
        assert_eq!(Window::new(None, Some(0)).limit, 1);
    }
}
