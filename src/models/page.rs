use serde::{Deserialize, Serialize};

/// 1-based pagination parameters shared by every list endpoint.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    /// Page number, starting at 1.
    #[serde(default = "default_page")]
    pub page: u64,
    /// Results per page. Each listing supplies its own default.
    #[serde(default)]
    pub page_size: Option<u64>,
}

fn default_page() -> u64 {
    1
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: None,
        }
    }
}

impl PageRequest {
    /// Number of documents to skip for this page.
    pub fn skip(&self, default_size: u64) -> u64 {
        self.page.saturating_sub(1) * self.size(default_size)
    }

    /// Effective page size, falling back to the listing's default.
    pub fn size(&self, default_size: u64) -> u64 {
        self.page_size.unwrap_or(default_size)
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    /// Whether more pages exist: `total > skip + returned_count`.
    pub is_next: bool,
}

impl<T> Paged<T> {
    /// Build a page from the returned slice and the total match count.
    pub fn new(items: Vec<T>, total: u64, skip: u64) -> Self {
        let is_next = total > skip + items.len() as u64;
        Self { items, is_next }
    }

    /// An empty page with no follow-up.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            is_next: false,
        }
    }
}
