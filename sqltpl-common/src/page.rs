//! # Pagination
//!
//! Purpose: Hold one page of a larger result set and the arithmetic that
//! decides which page a request actually lands on.
//!
//! ## Usage Notes
//!
//! - Requested page numbers below 1 are treated as 1.
//! - A request past the last page resolves to the last page, so callers see
//!   the final rows instead of an empty page.
//! - An empty result always resolves to page 1.
//!
//! All arithmetic saturates; a hostile page number cannot overflow.

use serde::Serialize;

/// One slice of an ordered result set plus count metadata.
///
/// `page_number` always lies in `[1, max(1, ceil(total_count / page_size))]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: u64,
    pub page_size: u64,
    pub total_count: u64,
}

impl<T> Page<T> {
    /// Number of pages the full result spans (at least 1).
    pub fn total_pages(&self) -> u64 {
        total_pages(self.total_count, self.page_size)
    }

    pub fn has_next(&self) -> bool {
        self.page_number < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }

    /// Converts the items while keeping the page metadata.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_count: self.total_count,
        }
    }
}

/// Clamps a caller-supplied page number to at least 1.
#[inline]
pub fn clamp_page_number(requested: i64) -> u64 {
    if requested < 1 {
        1
    } else {
        requested as u64
    }
}

/// `max(1, ceil(total_count / page_size))`; a zero page size counts as one page.
pub fn total_pages(total_count: u64, page_size: u64) -> u64 {
    if page_size == 0 || total_count == 0 {
        return 1;
    }
    total_count.div_ceil(page_size)
}

/// Resolves the page a request lands on once the total is known.
///
/// **Logic**:
/// 1. Clamp `requested` to at least 1.
/// 2. Empty results land on page 1.
/// 3. If the page would start at or past `total_count`, land on the last page.
/// 4. Otherwise keep the requested page.
pub fn effective_page(requested: i64, page_size: u64, total_count: u64) -> u64 {
    let page = clamp_page_number(requested);
    if total_count == 0 {
        return 1;
    }
    if (page - 1).saturating_mul(page_size) >= total_count {
        return total_pages(total_count, page_size);
    }
    page
}

/// Zero-based row offset of the first row on `page` (1-based).
#[inline]
pub fn row_offset(page: u64, page_size: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(page_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn past_the_end_lands_on_last_page() {
        // 25 rows, 10 per page, page 5 requested.
        let page = effective_page(5, 10, 25);
        assert_eq!(page, 3);
        assert_eq!(row_offset(page, 10), 20);
    }

    #[test]
    fn empty_result_is_page_one() {
        assert_eq!(effective_page(3, 10, 0), 1);
        assert_eq!(row_offset(1, 10), 0);
    }

    #[test]
    fn non_positive_requests_behave_like_first_page() {
        assert_eq!(effective_page(0, 10, 25), 1);
        assert_eq!(effective_page(-7, 10, 25), 1);
        assert_eq!(effective_page(i64::MIN, 10, 25), 1);
    }

    #[test]
    fn exact_boundary_moves_back() {
        // Page 3 of 20 rows would start at row 20, which does not exist.
        assert_eq!(effective_page(3, 10, 20), 2);
        assert_eq!(effective_page(2, 10, 20), 2);
    }

    #[test]
    fn huge_page_numbers_saturate() {
        assert_eq!(effective_page(i64::MAX, u64::MAX, 5), 1);
        assert_eq!(row_offset(u64::MAX, u64::MAX), u64::MAX);
    }

    #[test]
    fn navigation_helpers() {
        let page = Page {
            items: vec![1, 2],
            page_number: 2,
            page_size: 2,
            total_count: 5,
        };
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
        assert!(page.has_previous());
        let doubled = page.map(|n| n * 2);
        assert_eq!(doubled.items, vec![2, 4]);
        assert_eq!(doubled.page_number, 2);
    }
}
