use serde::Deserialize;

use chirp_core::{PageParams, ServiceError};

use crate::model::PageRequest;

/// Feed limits. Loaded from the `[feed]` table of the server config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Page size when the caller does not ask for one.
    pub default_page_size: usize,
    /// Larger requested page sizes are clamped to this.
    pub max_page_size: usize,
    /// Tweet content limit in Unicode code points.
    pub max_tweet_chars: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
            max_tweet_chars: 280,
        }
    }
}

impl FeedConfig {
    /// Validate paging input. Pages are 1-based; zero is rejected.
    pub fn window(&self, params: &PageParams) -> Result<PageRequest, ServiceError> {
        let page = params.page.unwrap_or(1);
        if page == 0 {
            return Err(ServiceError::InvalidArgument("page starts at 1".into()));
        }
        let page_size = params.page_size.unwrap_or(self.default_page_size);
        if page_size == 0 {
            return Err(ServiceError::InvalidArgument("pageSize must be positive".into()));
        }
        Ok(PageRequest {
            page,
            page_size: page_size.min(self.max_page_size),
        })
    }
}
