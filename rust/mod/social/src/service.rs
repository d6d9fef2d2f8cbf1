//! `SocialService`: the entry point external request handlers call.
//!
//! Each mutating method opens one `Writer`, runs the operation, and commits.
//! Any error drops the writer, which discards every write the operation made.

use std::sync::Arc;

use tracing::{info, warn};

use chirp_core::{Clock, Page, PageParams, ServiceError};
use chirp_kv::KVStore;

use crate::audit::{self, CounterDrift};
use crate::config::FeedConfig;
use crate::engagement;
use crate::model::{
    NewTweet, NewUser, NotificationId, NotificationView, ProfileUpdate, ProfileView, TweetDetail,
    TweetId, TweetView, UserId, UserView,
};
use crate::notify;
use crate::profile;
use crate::search::{self, ScanIndex, SearchHit, SearchIndex, SearchKind};
use crate::store::{EntityStore, Records};
use crate::timeline;
use crate::tweet;

pub struct SocialService {
    store: EntityStore,
    index: Arc<dyn SearchIndex>,
    config: FeedConfig,
}

impl SocialService {
    /// Build a service over `kv` with the scan-based search index.
    pub fn new(kv: Arc<dyn KVStore>, clock: Arc<dyn Clock>, config: FeedConfig) -> Self {
        let store = EntityStore::new(kv, clock);
        let index = Arc::new(ScanIndex::new(store.clone()));
        Self {
            store,
            index,
            config,
        }
    }

    /// Replace the search index.
    pub fn with_index(mut self, index: Arc<dyn SearchIndex>) -> Self {
        self.index = index;
        self
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    // ── Users ──

    pub fn register_user(&self, req: NewUser) -> Result<UserView, ServiceError> {
        let mut w = self.store.write()?;
        let user = profile::register(&mut w, req)?;
        let view = profile::view(&w, user)?;
        w.commit()?;
        info!(user = %view.user.id, handle = %view.user.handle, "user registered");
        Ok(view)
    }

    pub fn get_user(&self, id: UserId) -> Result<UserView, ServiceError> {
        let r = self.store.read()?;
        let user = r.require_user(id)?;
        profile::view(&r, user)
    }

    pub fn get_profile(&self, caller: UserId, id: UserId) -> Result<ProfileView, ServiceError> {
        let r = self.store.read()?;
        profile::profile(&r, caller, id)
    }

    pub fn update_profile(
        &self,
        caller: UserId,
        update: ProfileUpdate,
    ) -> Result<UserView, ServiceError> {
        let mut w = self.store.write()?;
        let user = profile::update(&mut w, caller, update)?;
        let view = profile::view(&w, user)?;
        w.commit()?;
        info!(user = %caller, "profile updated");
        Ok(view)
    }

    pub fn search_users(&self, params: &PageParams) -> Result<Page<UserView>, ServiceError> {
        let query = search::normalize_query(params.query.as_deref())?;
        let window = self.config.window(params)?;
        let hits = self.index.search(SearchKind::Users, &query, window)?;
        let r = self.store.read()?;
        let users = hits
            .items
            .iter()
            .filter_map(|hit| match hit {
                SearchHit::User(id) => Some(*id),
                SearchHit::Tweet(_) => None,
            })
            .filter_map(|id| r.user(id).transpose())
            .map(|user| user.and_then(|u| profile::view(&r, u)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items: users,
            page: hits.page,
            page_size: hits.page_size,
            has_more: hits.has_more,
        })
    }

    // ── Tweets ──

    pub fn create_tweet(&self, caller: UserId, req: NewTweet) -> Result<TweetView, ServiceError> {
        let mut w = self.store.write()?;
        let tweet = tweet::create(&mut w, caller, req, self.config.max_tweet_chars)?;
        let view = timeline::annotate(&w, caller, tweet)?;
        w.commit()?;
        info!(
            tweet = %view.tweet.id,
            author = %caller,
            parent = ?view.tweet.parent_tweet_id.map(|p| p.0),
            "tweet created"
        );
        Ok(view)
    }

    pub fn delete_tweet(&self, caller: UserId, id: TweetId) -> Result<(), ServiceError> {
        let mut w = self.store.write()?;
        tweet::delete(&mut w, caller, id)?;
        w.commit()?;
        info!(tweet = %id, author = %caller, "tweet deleted");
        Ok(())
    }

    pub fn get_tweet(&self, caller: UserId, id: TweetId) -> Result<TweetDetail, ServiceError> {
        let r = self.store.read()?;
        timeline::detail(&r, caller, id)
    }

    // ── Engagement ──

    pub fn like_tweet(&self, caller: UserId, id: TweetId) -> Result<(), ServiceError> {
        let mut w = self.store.write()?;
        engagement::like(&mut w, caller, id)?;
        w.commit()?;
        info!(user = %caller, tweet = %id, "tweet liked");
        Ok(())
    }

    pub fn unlike_tweet(&self, caller: UserId, id: TweetId) -> Result<(), ServiceError> {
        let mut w = self.store.write()?;
        engagement::unlike(&mut w, caller, id)?;
        w.commit()?;
        info!(user = %caller, tweet = %id, "tweet unliked");
        Ok(())
    }

    pub fn follow_user(&self, caller: UserId, target: UserId) -> Result<(), ServiceError> {
        let mut w = self.store.write()?;
        engagement::follow(&mut w, caller, target)?;
        w.commit()?;
        info!(user = %caller, target = %target, "user followed");
        Ok(())
    }

    pub fn unfollow_user(&self, caller: UserId, target: UserId) -> Result<(), ServiceError> {
        let mut w = self.store.write()?;
        engagement::unfollow(&mut w, caller, target)?;
        w.commit()?;
        info!(user = %caller, target = %target, "user unfollowed");
        Ok(())
    }

    // ── Timelines ──

    pub fn list_timeline(
        &self,
        caller: UserId,
        params: &PageParams,
    ) -> Result<Page<TweetView>, ServiceError> {
        let window = self.config.window(params)?;
        let r = self.store.read()?;
        timeline::list_timeline(&r, caller, window)
    }

    pub fn list_by_user(
        &self,
        caller: UserId,
        user_id: UserId,
        params: &PageParams,
    ) -> Result<Page<TweetView>, ServiceError> {
        let window = self.config.window(params)?;
        let r = self.store.read()?;
        timeline::list_by_user(&r, caller, user_id, window)
    }

    /// Tweets whose content contains the query, newest first. Replies included.
    pub fn search_tweets(
        &self,
        caller: UserId,
        params: &PageParams,
    ) -> Result<Page<TweetView>, ServiceError> {
        let query = search::normalize_query(params.query.as_deref())?;
        let window = self.config.window(params)?;
        let hits = self.index.search(SearchKind::Tweets, &query, window)?;
        let r = self.store.read()?;
        let views = hits
            .items
            .iter()
            .filter_map(|hit| match hit {
                SearchHit::Tweet(id) => Some(*id),
                SearchHit::User(_) => None,
            })
            // a hit deleted since the index answered is skipped
            .filter_map(|id| r.tweet(id).transpose())
            .map(|tweet| tweet.and_then(|t| timeline::annotate(&r, caller, t)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items: views,
            page: hits.page,
            page_size: hits.page_size,
            has_more: hits.has_more,
        })
    }

    // ── Notifications ──

    pub fn list_notifications(
        &self,
        caller: UserId,
        params: &PageParams,
    ) -> Result<Page<NotificationView>, ServiceError> {
        let window = self.config.window(params)?;
        let r = self.store.read()?;
        notify::list(&r, caller, window)
    }

    pub fn unread_count(&self, caller: UserId) -> Result<usize, ServiceError> {
        let r = self.store.read()?;
        notify::unread_count(&r, caller)
    }

    pub fn mark_read(&self, caller: UserId, id: NotificationId) -> Result<(), ServiceError> {
        let mut w = self.store.write()?;
        notify::mark_read(&mut w, caller, id)?;
        w.commit()
    }

    pub fn mark_all_read(&self, caller: UserId) -> Result<usize, ServiceError> {
        let mut w = self.store.write()?;
        let changed = notify::mark_all_read(&mut w, caller)?;
        w.commit()?;
        Ok(changed)
    }

    // ── Maintenance ──

    pub fn audit_counters(&self) -> Result<Vec<CounterDrift>, ServiceError> {
        let r = self.store.read()?;
        let drift = audit::audit(&r)?;
        if !drift.is_empty() {
            warn!(drifted = drift.len(), "counter audit found drift");
        }
        Ok(drift)
    }

    pub fn repair_counters(&self) -> Result<Vec<CounterDrift>, ServiceError> {
        let mut w = self.store.write()?;
        let drift = audit::repair(&mut w)?;
        w.commit()?;
        if !drift.is_empty() {
            info!(repaired = drift.len(), "counters repaired");
        }
        Ok(drift)
    }
}
