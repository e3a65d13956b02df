//! One-based pagination over result rows.

use derive_getters::Getters;
use quarry_core::Row;
use serde::{Deserialize, Serialize};

/// Where a page sits in the whole result.
///
/// # Examples
///
/// ```
/// use quarry_result::Pagination;
///
/// let page = Pagination::new(3, 100, 257);
/// assert_eq!(*page.total_pages(), 3);
/// assert!(!*page.has_next());
/// assert!(*page.has_prev());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Pagination {
    page: usize,
    page_size: usize,
    total_count: usize,
    total_pages: usize,
    has_next: bool,
    has_prev: bool,
}

impl Pagination {
    /// Position of `page` (1-based) over `total_count` items.
    ///
    /// Page numbers below 1 are treated as 1 and a page size of 0 as 1.
    pub fn new(page: usize, page_size: usize, total_count: usize) -> Self {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let end = page.saturating_mul(page_size);
        Self {
            page,
            page_size,
            total_count,
            total_pages: total_count.div_ceil(page_size),
            has_next: end < total_count,
            has_prev: page > 1,
        }
    }

    /// Index range of this page, clipped to the items present.
    fn bounds(&self) -> (usize, usize) {
        let start = (self.page - 1)
            .saturating_mul(self.page_size)
            .min(self.total_count);
        let end = start.saturating_add(self.page_size).min(self.total_count);
        (start, end)
    }
}

/// Slice one page out of `items`. Out-of-range pages are empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> (Vec<T>, Pagination) {
    let pagination = Pagination::new(page, page_size, items.len());
    let (start, end) = pagination.bounds();
    (items[start..end].to_vec(), pagination)
}

/// One page of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct PagedRows {
    /// Empty when the source was a bare row list
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    columns: Vec<String>,
    rows: Vec<Row>,
    pagination: Pagination,
}

impl PagedRows {
    /// Page `page` of `rows`, keeping `columns`.
    pub fn new(columns: &[String], rows: &[Row], page: usize, page_size: usize) -> Self {
        let (rows, pagination) = paginate(rows, page, page_size);
        Self {
            columns: columns.to_vec(),
            rows,
            pagination,
        }
    }

    /// Page of a bare row list.
    pub fn from_rows(rows: &[Row], page: usize, page_size: usize) -> Self {
        Self::new(&[], rows, page, page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_bounds() {
        let items: Vec<usize> = (0..257).collect();
        let (first, meta) = paginate(&items, 1, 100);
        assert_eq!(first.len(), 100);
        assert!(*meta.has_next());
        assert!(!*meta.has_prev());

        let (last, meta) = paginate(&items, 3, 100);
        assert_eq!(last.len(), 57);
        assert_eq!(last[0], 200);
        assert!(!*meta.has_next());

        let (beyond, meta) = paginate(&items, 4, 100);
        assert!(beyond.is_empty());
        assert!(*meta.has_prev());
    }

    #[test]
    fn test_degenerate_arguments() {
        let items = vec![1, 2, 3];
        let (page, meta) = paginate(&items, 0, 0);
        assert_eq!(page, vec![1]);
        assert_eq!(*meta.page(), 1);
        assert_eq!(*meta.total_pages(), 3);

        let (page, meta) = paginate::<u8>(&[], 1, 10);
        assert!(page.is_empty());
        assert_eq!(*meta.total_pages(), 0);
        assert!(!*meta.has_next());
    }
}
