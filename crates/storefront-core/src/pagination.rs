//! Pagination types for list operations.

use serde::{Deserialize, Serialize};

/// A request for a page of results.
///
/// Pages are 1-indexed, matching the storefront's public query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    /// The page number (1-indexed).
    pub page: u32,
    /// The number of items per page.
    pub limit: u32,
}

impl PageRequest {
    /// The page used when none is requested.
    pub const DEFAULT_PAGE: u32 = 1;
    /// The default page size.
    pub const DEFAULT_LIMIT: u32 = 20;
    /// The maximum allowed page size.
    pub const MAX_LIMIT: u32 = 100;

    /// Creates a new page request, clamping out-of-range values.
    #[must_use]
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Creates a page request from optional query parameters, filling in
    /// `page=1` and `limit=20` when absent.
    #[must_use]
    pub fn from_query(page: Option<u32>, limit: Option<u32>) -> Self {
        Self::new(
            page.unwrap_or(Self::DEFAULT_PAGE),
            limit.unwrap_or(Self::DEFAULT_LIMIT),
        )
    }

    /// Re-applies the clamping of [`Self::new`] to a request built from its
    /// public fields.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self::new(self.page, self.limit)
    }

    /// Creates a page request for the first page with default size.
    #[must_use]
    pub fn first() -> Self {
        Self::new(Self::DEFAULT_PAGE, Self::DEFAULT_LIMIT)
    }

    /// Returns the offset for database queries.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page.saturating_sub(1) as u64) * self.limit as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// A page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// The items on this page.
    pub content: Vec<T>,
    /// The current page number (1-indexed).
    pub page: u32,
    /// The number of items per page.
    pub limit: u32,
    /// The total number of items across all pages.
    pub total_elements: u64,
}

impl<T> Page<T> {
    /// Creates a new page.
    #[must_use]
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            page: request.page,
            limit: request.limit,
            total_elements,
        }
    }

    /// Returns true if the page is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Returns the number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults() {
        let req = PageRequest::from_query(None, None);
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, 20);
        assert_eq!(req, PageRequest::default());
    }

    #[test]
    fn test_page_request_clamping() {
        assert_eq!(PageRequest::new(0, 20).page, 1);
        assert_eq!(PageRequest::new(1, 1000).limit, PageRequest::MAX_LIMIT);
        assert_eq!(PageRequest::new(1, 0).limit, 1);
    }

    #[test]
    fn test_normalized_clamps_raw_fields() {
        let raw = PageRequest { page: 0, limit: 500 };
        assert_eq!(raw.normalized(), PageRequest::new(1, PageRequest::MAX_LIMIT));
        assert_eq!(PageRequest { page: 1, limit: 0 }.normalized().limit, 1);
    }

    #[test]
    fn test_page_request_offset() {
        assert_eq!(PageRequest::new(1, 20).offset(), 0);
        assert_eq!(PageRequest::new(3, 15).offset(), 30);
    }

    #[test]
    fn test_page_carries_request() {
        let page = Page::new(vec![1, 2, 3], PageRequest::new(2, 3), 7);
        assert_eq!(page.page, 2);
        assert_eq!(page.limit, 3);
        assert_eq!(page.len(), 3);
        assert!(!page.is_empty());
    }
}
