//! Pagination metadata derived from a total count and a page request
//!
//! All fields are computed at construction from `(total, per_page, page)`.
//! There is no mutable recalculation step: building a new [`PageInfo`] is the
//! only way to change one.

use serde::{Deserialize, Serialize};

/// Pagination block of a discovery response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total: u64,
    pub per_page: u32,
    pub current_page: u32,
    pub last_page: u32,
    /// 1-based index of the first item on this page, 0 when empty
    pub from: u64,
    /// 1-based index of the last item on this page, 0 when empty
    pub to: u64,
    pub has_pages: bool,
    pub has_more_pages: bool,
}

impl PageInfo {
    /// Derive pagination for `page` over `total` items at `per_page` each
    ///
    /// The requested page is clamped into `[1, last_page]`, so out-of-range
    /// requests resolve to the nearest real page instead of an empty one.
    pub fn compute(total: u64, per_page: u32, page: u32) -> Self {
        let per_page = per_page.max(1);
        let last_page = (total.div_ceil(per_page as u64)).max(1) as u32;
        let current_page = page.clamp(1, last_page);

        let (from, to) = if total == 0 {
            (0, 0)
        } else {
            let from = (current_page as u64 - 1) * per_page as u64 + 1;
            let to = (from + per_page as u64 - 1).min(total);
            (from, to)
        };

        Self {
            total,
            per_page,
            current_page,
            last_page,
            from,
            to,
            has_pages: last_page > 1,
            has_more_pages: current_page < last_page,
        }
    }

    /// Single empty page
    pub fn empty(per_page: u32) -> Self {
        Self::compute(0, per_page, 1)
    }

    /// Number of items on the current page
    pub fn page_len(&self) -> u64 {
        if self.total == 0 {
            0
        } else {
            self.to - self.from + 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result() {
        let info = PageInfo::empty(12);
        assert_eq!(info.total, 0);
        assert_eq!(info.current_page, 1);
        assert_eq!(info.last_page, 1);
        assert_eq!(info.from, 0);
        assert_eq!(info.to, 0);
        assert!(!info.has_pages);
        assert!(!info.has_more_pages);
        assert_eq!(info.page_len(), 0);
    }

    #[test]
    fn test_partial_last_page() {
        let info = PageInfo::compute(25, 12, 3);
        assert_eq!(info.last_page, 3);
        assert_eq!(info.current_page, 3);
        assert_eq!(info.from, 25);
        assert_eq!(info.to, 25);
        assert_eq!(info.page_len(), 1);
        assert!(info.has_pages);
        assert!(!info.has_more_pages);
    }

    #[test]
    fn test_full_middle_page() {
        let info = PageInfo::compute(100, 24, 2);
        assert_eq!(info.last_page, 5);
        assert_eq!(info.from, 25);
        assert_eq!(info.to, 48);
        assert!(info.has_more_pages);
    }

    #[test]
    fn test_out_of_range_page_clamps() {
        let info = PageInfo::compute(10, 12, 9);
        assert_eq!(info.current_page, 1);
        assert_eq!(info.from, 1);
        assert_eq!(info.to, 10);

        let info = PageInfo::compute(30, 12, 0);
        assert_eq!(info.current_page, 1);
    }

    #[test]
    fn test_exact_multiple_boundary() {
        let info = PageInfo::compute(24, 12, 2);
        assert_eq!(info.last_page, 2);
        assert_eq!(info.from, 13);
        assert_eq!(info.to, 24);
        assert!(!info.has_more_pages);
    }

    #[test]
    fn test_single_item() {
        let info = PageInfo::compute(1, 6, 1);
        assert_eq!(info.last_page, 1);
        assert_eq!(info.from, 1);
        assert_eq!(info.to, 1);
        assert!(!info.has_pages);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(PageInfo::compute(25, 12, 1)).unwrap();
        assert_eq!(json["perPage"], 12);
        assert_eq!(json["currentPage"], 1);
        assert_eq!(json["lastPage"], 3);
        assert_eq!(json["hasMorePages"], true);
    }
}
