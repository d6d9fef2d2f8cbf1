pub mod api;
pub mod audit;
pub mod config;
pub mod counter;
pub mod engagement;
pub mod model;
pub mod notify;
pub mod profile;
pub mod search;
pub mod service;
pub mod store;
pub mod timeline;
pub mod tweet;

use std::sync::Arc;

use axum::Router;
use chirp_core::{Clock, IdentityResolver, Module};
use chirp_kv::KVStore;

pub use config::FeedConfig;
pub use service::SocialService;

/// The social module: users, tweets, likes, follows and notifications.
///
/// Mount its routes under `/social`. Caller identity comes from the injected
/// `IdentityResolver`; this module never handles credentials.
pub struct SocialModule {
    service: Arc<SocialService>,
    identity: Arc<dyn IdentityResolver>,
}

impl SocialModule {
    pub fn new(
        kv: Arc<dyn KVStore>,
        clock: Arc<dyn Clock>,
        config: FeedConfig,
        identity: Arc<dyn IdentityResolver>,
    ) -> Self {
        Self::with_service(Arc::new(SocialService::new(kv, clock, config)), identity)
    }

    /// Wrap an already-built service, e.g. one with a custom search index.
    pub fn with_service(service: Arc<SocialService>, identity: Arc<dyn IdentityResolver>) -> Self {
        Self { service, identity }
    }

    /// Get the service for programmatic calls (seeding, audits).
    pub fn service(&self) -> &Arc<SocialService> {
        &self.service
    }
}

impl Module for SocialModule {
    fn name(&self) -> &str {
        "social"
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.service), Arc::clone(&self.identity))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI64, Ordering};

    use chrono::{DateTime, TimeZone, Utc};

    use chirp_core::Clock;
    use chirp_kv::RedbStore;

    use crate::model::{Tweet, TweetId, User, UserId};
    use crate::store::{EntityStore, Writer};
    use crate::{FeedConfig, SocialService};

    pub fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    pub struct FixedClock(pub DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    /// Advances one second per reading.
    #[derive(Default)]
    pub struct StepClock(AtomicI64);

    impl Clock for StepClock {
        fn now(&self) -> DateTime<Utc> {
            at(self.0.fetch_add(1, Ordering::SeqCst))
        }
    }

    pub fn make_store() -> (tempfile::TempDir, EntityStore) {
        let dir = tempfile::tempdir().unwrap();
        let kv = RedbStore::open(&dir.path().join("test.redb")).unwrap();
        (dir, EntityStore::new(Arc::new(kv), Arc::new(FixedClock(at(0)))))
    }

    pub fn make_service() -> (tempfile::TempDir, SocialService) {
        let dir = tempfile::tempdir().unwrap();
        let kv = RedbStore::open(&dir.path().join("test.redb")).unwrap();
        let svc = SocialService::new(Arc::new(kv), Arc::new(StepClock::default()), FeedConfig::default());
        (dir, svc)
    }

    /// Write a user record directly, bypassing registration.
    pub fn put_user(w: &mut Writer<'_>, id: u64, handle: &str) -> User {
        let user = User {
            id: UserId(id),
            handle: handle.into(),
            email: format!("{handle}@example.com"),
            display_name: handle.to_uppercase(),
            bio: None,
            avatar_url: None,
            location: None,
            website: None,
            verified: false,
            created_at: at(0),
            updated_at: at(0),
        };
        w.save_user(&user).unwrap();
        user
    }

    /// Write a tweet record directly. Counters are not touched.
    pub fn put_tweet_at(w: &mut Writer<'_>, id: u64, author: u64, parent: Option<u64>, secs: i64) {
        w.insert_tweet(&Tweet {
            id: TweetId(id),
            author_id: UserId(author),
            content: format!("tweet {id}"),
            parent_tweet_id: parent.map(TweetId),
            created_at: at(secs),
        })
        .unwrap();
    }

    pub fn put_tweet(w: &mut Writer<'_>, id: u64, author: u64, parent: Option<u64>) {
        put_tweet_at(w, id, author, parent, 0);
    }

    /// Tweet by user 1 with the given content.
    pub fn put_tweet_text(w: &mut Writer<'_>, id: u64, parent: Option<u64>, content: &str) {
        w.insert_tweet(&Tweet {
            id: TweetId(id),
            author_id: UserId(1),
            content: content.into(),
            parent_tweet_id: parent.map(TweetId),
            created_at: at(0),
        })
        .unwrap();
    }
}
