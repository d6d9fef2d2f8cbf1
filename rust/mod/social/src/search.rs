//! Search Index Query.
//!
//! Callers go through [`SearchIndex`] so the linear scan here can be swapped
//! for an inverted index without touching them.

use serde::Serialize;

use chirp_core::{Page, ServiceError};

use crate::model::{PageRequest, TweetId, UserId};
use crate::store::{EntityStore, Records};
use crate::timeline::newest_first;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    /// Content substring, newest first. Replies included.
    Tweets,
    /// Handle or display name substring, registration order.
    Users,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum SearchHit {
    Tweet(TweetId),
    User(UserId),
}

/// An index may lag the store. Callers re-read every hit and skip the ones
/// deleted since, so a page can come back shorter than `page_size` while
/// `has_more` still reflects the index's own count.
pub trait SearchIndex: Send + Sync {
    /// One page of matches for an already-normalized query.
    fn search(
        &self,
        kind: SearchKind,
        query: &str,
        window: PageRequest,
    ) -> Result<Page<SearchHit>, ServiceError>;
}

/// Trim and lowercase. A blank query is `InvalidArgument`.
pub fn normalize_query(query: Option<&str>) -> Result<String, ServiceError> {
    let trimmed = query.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidArgument("search query must not be empty".into()));
    }
    Ok(trimmed.to_lowercase())
}

/// Case-insensitive substring filter over a store snapshot.
pub struct ScanIndex {
    store: EntityStore,
}

impl ScanIndex {
    pub fn new(store: EntityStore) -> Self {
        Self { store }
    }
}

impl SearchIndex for ScanIndex {
    fn search(
        &self,
        kind: SearchKind,
        query: &str,
        window: PageRequest,
    ) -> Result<Page<SearchHit>, ServiceError> {
        let r = self.store.read()?;
        let hits: Vec<SearchHit> = match kind {
            SearchKind::Tweets => {
                let mut tweets: Vec<_> = r
                    .tweets()?
                    .into_iter()
                    .filter(|t| t.content.to_lowercase().contains(query))
                    .collect();
                tweets.sort_by(newest_first);
                tweets.into_iter().map(|t| SearchHit::Tweet(t.id)).collect()
            }
            SearchKind::Users => r
                .users()?
                .into_iter()
                .filter(|u| {
                    u.handle.to_lowercase().contains(query)
                        || u.display_name.to_lowercase().contains(query)
                })
                .map(|u| SearchHit::User(u.id))
                .collect(),
        };
        Ok(Page::slice(hits, window.page, window.page_size))
    }
}
