//! Shared DTO types used across multiple endpoints.

use serde::{Deserialize, Serialize};

/// Pagination query parameters for list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u32,
    /// Total number of pages.
    pub total_pages: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl PaginationParams {
    /// Clamps `per_page` to the allowed maximum of 100.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, 100),
        }
    }

    /// Builds the response metadata for a list of `total` items.
    #[must_use]
    pub fn meta(&self, total: u32) -> PaginationMeta {
        let total_pages = if total == 0 {
            0
        } else {
            total.div_ceil(self.per_page)
        };
        PaginationMeta {
            page: self.page,
            per_page: self.per_page,
            total,
            total_pages,
        }
    }

    /// Zero-based offset of the first item on the current page.
    ///
    /// Computed in `u64` so an absurdly large page number yields an
    /// offset past the end (an empty page) rather than overflowing.
    #[must_use]
    pub fn offset(&self) -> usize {
        let offset = u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page);
        usize::try_from(offset).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_bounds_page_and_per_page() {
        let params = PaginationParams {
            page: 0,
            per_page: 500,
        };
        let clamped = params.clamped();
        assert_eq!(clamped.page, 1);
        assert_eq!(clamped.per_page, 100);
    }

    #[test]
    fn huge_page_number_yields_empty_page_not_overflow() {
        let params = PaginationParams {
            page: u32::MAX,
            per_page: 100,
        }
        .clamped();
        let expected = (u64::from(u32::MAX) - 1) * 100;
        assert_eq!(params.offset() as u64, expected);
    }

    #[test]
    fn meta_rounds_pages_up() {
        let params = PaginationParams {
            page: 1,
            per_page: 20,
        };
        let meta = params.meta(41);
        assert_eq!(meta.total_pages, 3);
        let empty = params.meta(0);
        assert_eq!(empty.total_pages, 0);
    }
}
