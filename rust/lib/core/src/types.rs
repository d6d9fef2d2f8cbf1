use serde::{Deserialize, Serialize};

/// Page-number pagination parameters for list/query operations.
///
/// `page` is 1-based. Missing values fall back to page 1 and a page size
/// chosen by the service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<usize>,

    #[serde(default)]
    pub page_size: Option<usize>,

    /// Search query string (for search endpoints).
    #[serde(default, alias = "q")]
    pub query: Option<String>,
}

impl PageParams {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
            query: None,
        }
    }
}

/// One page of an ordered result set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    /// Whether more items exist past this page at the time of the read.
    pub has_more: bool,
}

impl<T: Serialize> Page<T> {
    /// Cut the `page`-th window of `page_size` items out of an ordered list.
    ///
    /// Offsets past the end yield an empty page.
    pub fn slice(all: Vec<T>, page: usize, page_size: usize) -> Self {
        let total = all.len();
        let offset = page.saturating_sub(1).saturating_mul(page_size).min(total);
        let end = offset.saturating_add(page_size).min(total);
        let items = all.into_iter().skip(offset).take(end - offset).collect();
        Self {
            items,
            page,
            page_size,
            has_more: end < total,
        }
    }

    /// Transform every item, keeping the page position. Stops at the first error.
    pub fn try_map<U: Serialize, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
            page: self.page,
            page_size: self.page_size,
            has_more: self.has_more,
        })
    }
}
