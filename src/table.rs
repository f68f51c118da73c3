use crate::data::ResultSet;
use serde::Serialize;

/// Page navigation over `total` rows. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
    total: usize,
    current: usize,
}

impl Paginator {
    /// A zero page size is treated as one row per page.
    pub fn new(total: usize, page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            total,
            current: 1,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// At least one page, even with no rows.
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.page_size).max(1)
    }

    pub fn pagination_needed(&self) -> bool {
        self.total > self.page_size
    }

    /// Move to `page`; out-of-range requests leave the page unchanged.
    pub fn set_page(&mut self, page: usize) -> bool {
        if (1..=self.total_pages()).contains(&page) {
            self.current = page;
            true
        } else {
            false
        }
    }

    pub fn has_prev(&self) -> bool {
        self.current > 1
    }

    pub fn has_next(&self) -> bool {
        self.current < self.total_pages()
    }

    pub fn next(&mut self) -> bool {
        self.set_page(self.current + 1)
    }

    pub fn prev(&mut self) -> bool {
        self.current > 1 && self.set_page(self.current - 1)
    }

    /// Row index range of the current page.
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = ((self.current - 1) * self.page_size).min(self.total);
        let end = (start + self.page_size).min(self.total);
        start..end
    }

    pub fn page_numbers(&self) -> Vec<usize> {
        (1..=self.total_pages()).collect()
    }
}

/// One page of a result set, every field as a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub page: usize,
    pub total_pages: usize,
    pub total_rows: usize,
    pub pagination_needed: bool,
    pub has_prev: bool,
    pub has_next: bool,
    pub page_numbers: Vec<usize>,
}

/// Slice `data` to `page`, clamped into the valid page range.
pub fn table_page(data: &ResultSet, page_size: usize, page: usize) -> TableView {
    let mut paginator = Paginator::new(data.len(), page_size);
    let page = page.clamp(1, paginator.total_pages());
    paginator.set_page(page);

    let columns = data.fields();
    let rows = data.records()[paginator.range()]
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|c| record.get(c).map(|v| v.cell_text()).unwrap_or_default())
                .collect()
        })
        .collect();

    TableView {
        columns,
        rows,
        page: paginator.current(),
        total_pages: paginator.total_pages(),
        total_rows: data.len(),
        pagination_needed: paginator.pagination_needed(),
        has_prev: paginator.has_prev(),
        has_next: paginator.has_next(),
        page_numbers: paginator.page_numbers(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(n: usize) -> ResultSet {
        let items: Vec<_> = (0..n).map(|i| json!({"id": i, "name": format!("row{}", i)})).collect();
        ResultSet::from_json(&serde_json::Value::Array(items)).unwrap()
    }

    #[test]
    fn test_paginator_bounds() {
        let mut p = Paginator::new(25, 10);
        assert_eq!(p.total_pages(), 3);
        assert!(!p.set_page(0));
        assert_eq!(p.current(), 1);
        assert!(p.set_page(3));
        assert_eq!(p.range(), 20..25);
        assert!(!p.set_page(4));
        assert_eq!(p.current(), 3);
        assert!(!p.has_next());
        assert!(!p.next());
        assert!(p.prev());
        assert_eq!(p.current(), 2);
    }

    #[test]
    fn test_paginator_prev_on_first_page() {
        let mut p = Paginator::new(5, 10);
        assert!(!p.prev());
        assert!(!p.has_prev());
        assert!(!p.pagination_needed());
        assert_eq!(p.page_numbers(), vec![1]);
    }

    #[test]
    fn test_table_page_last() {
        let view = table_page(&rows(25), 10, 3);
        assert_eq!(view.total_pages, 3);
        assert_eq!(view.rows.len(), 5);
        assert_eq!(view.rows[0], vec!["20", "row20"]);
        assert_eq!(view.columns, vec!["id", "name"]);
        assert!(view.pagination_needed);
    }

    #[test]
    fn test_table_page_clamped() {
        assert_eq!(table_page(&rows(25), 10, 0).page, 1);
        assert_eq!(table_page(&rows(25), 10, 4).page, 3);
    }

    #[test]
    fn test_table_null_cells_blank() {
        let data = ResultSet::from_json(&json!([{"a": null, "b": 1}, {"b": 2}])).unwrap();
        let view = table_page(&data, 10, 1);
        assert_eq!(view.rows, vec![vec!["", "1"], vec!["", "2"]]);
    }
}
