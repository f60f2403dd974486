//! One page of a paginated collection.

/// A page returned by a page fetcher
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPage<T> {
    /// Records in API order
    pub items: Vec<T>,
    /// 1-based page number this page answers
    pub page_number: u32,
    /// Whether another page exists; `None` when the API did not say
    pub has_next: Option<bool>,
    /// Best-effort total across all pages; `None` when unknown
    pub total_count: Option<u32>,
}

impl<T> ResultPage<T> {
    pub fn new(page_number: u32, items: Vec<T>) -> Self {
        Self {
            items,
            page_number,
            has_next: None,
            total_count: None,
        }
    }

    /// An empty first page, used when there is nothing to ask for
    pub fn empty() -> Self {
        Self::new(1, Vec::new())
    }

    pub fn with_next(mut self, has_next: bool) -> Self {
        self.has_next = Some(has_next);
        self
    }

    pub fn with_total(mut self, total: u32) -> Self {
        self.total_count = Some(total);
        self
    }

    /// Whether to offer another page. Without an explicit flag, a short page
    /// marks the end of the data.
    pub fn resolve_has_next(&self, page_size: Option<usize>) -> bool {
        match (self.has_next, page_size) {
            (Some(flag), _) => flag,
            (None, Some(size)) => size > 0 && self.items.len() >= size,
            (None, None) => false,
        }
    }
}
