//! Pagination summary derived from a loader's total.

use serde::{Deserialize, Serialize};

/// Page bookkeeping for a windowed result set.
///
/// Pages are zero-indexed, matching the loader builder's `set_page`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageInfo {
    /// Total matching items across all pages.
    pub total: u64,
    /// Current page, zero-indexed.
    pub page: u64,
    /// Window size the result was loaded with.
    pub per_page: u64,
    /// Number of pages needed to cover `total`.
    pub total_pages: u64,
    /// Whether there's a next page.
    pub has_next: bool,
    /// Whether there's a previous page.
    pub has_prev: bool,
}

impl PageInfo {
    /// Derive page bookkeeping from a total and the requested window.
    ///
    /// A `per_page` of zero is treated as a single unwindowed page.
    pub fn new(total: u64, page: u64, per_page: u64) -> Self {
        let total_pages = if per_page > 0 {
            total.div_ceil(per_page)
        } else {
            1
        };
        Self {
            total,
            page,
            per_page,
            total_pages,
            has_next: page.saturating_add(1) < total_pages,
            has_prev: page > 0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn first_of_several_pages() {
        let info = PageInfo::new(25, 0, 10);
        assert_eq!(info.total_pages, 3);
        assert!(info.has_next);
        assert!(!info.has_prev);
    }

    #[test]
    fn middle_page() {
        let info = PageInfo::new(25, 1, 10);
        assert!(info.has_next);
        assert!(info.has_prev);
    }

    #[test]
    fn last_partial_page() {
        let info = PageInfo::new(25, 2, 10);
        assert_eq!(info.total_pages, 3);
        assert!(!info.has_next);
        assert!(info.has_prev);
    }

    #[test]
    fn single_page() {
        let info = PageInfo::new(5, 0, 10);
        assert_eq!(info.total_pages, 1);
        assert!(!info.has_next);
        assert!(!info.has_prev);
    }

    #[test]
    fn empty_result() {
        let info = PageInfo::new(0, 0, 10);
        assert_eq!(info.total_pages, 0);
        assert!(!info.has_next);
        assert!(!info.has_prev);
    }

    #[test]
    fn zero_per_page_is_one_unwindowed_page() {
        let info = PageInfo::new(42, 0, 0);
        assert_eq!(info.total_pages, 1);
        assert!(!info.has_next);
        assert!(!info.has_prev);
    }

    #[test]
    fn serializes_to_json() {
        let info = PageInfo::new(25, 1, 10);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["total"], 25);
        assert_eq!(json["page"], 1);
        assert_eq!(json["total_pages"], 3);
        assert_eq!(json["has_next"], true);
        assert_eq!(json["has_prev"], true);
    }
}
