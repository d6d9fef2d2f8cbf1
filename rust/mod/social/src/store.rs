//! Entity Store: typed records over the KV layer.
//!
//! Records are JSON under `social:{kind}:{id}` keys. Relationship rows use
//! composite keys (`social:like:{tweet}:{user}`), so "at most one per pair"
//! is enforced by `KVTxn::insert_new` rather than by a read-then-write check.
//! Numeric ids are zero-padded so prefix scans come back in id order.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use chirp_core::{Clock, ServiceError};
use chirp_kv::{KVError, KVRead, KVStore, KVTxn};

use crate::model::{Follow, Like, Notification, NotificationId, Tweet, TweetId, User, UserId};

pub(crate) fn storage(e: KVError) -> ServiceError {
    ServiceError::Storage(e.to_string())
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T, ServiceError> {
    serde_json::from_slice(bytes).map_err(|e| ServiceError::Internal(format!("decode {key}: {e}")))
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ServiceError> {
    serde_json::to_vec(value).map_err(|e| ServiceError::Internal(format!("encode: {e}")))
}

pub(crate) mod keys {
    use crate::model::{NotificationId, TweetId, UserId};

    pub const USERS: &str = "social:user:";
    pub const TWEETS: &str = "social:tweet:";
    pub const LIKES: &str = "social:like:";
    pub const FOLLOWS: &str = "social:follow:";
    pub const NOTIFICATIONS: &str = "social:notification:";

    pub fn seq(name: &str) -> String {
        format!("social:seq:{name}")
    }

    pub fn user(id: UserId) -> String {
        format!("{USERS}{:020}", id.0)
    }

    pub fn handle(handle: &str) -> String {
        format!("social:handle:{}", handle.to_lowercase())
    }

    pub fn email(email: &str) -> String {
        format!("social:email:{}", email.to_lowercase())
    }

    pub fn tweet(id: TweetId) -> String {
        format!("{TWEETS}{:020}", id.0)
    }

    pub fn likes_of(tweet: TweetId) -> String {
        format!("{LIKES}{:020}:", tweet.0)
    }

    pub fn like(tweet: TweetId, user: UserId) -> String {
        format!("{}{:020}", likes_of(tweet), user.0)
    }

    pub fn follow(follower: UserId, following: UserId) -> String {
        format!("{FOLLOWS}{:020}:{:020}", follower.0, following.0)
    }

    pub fn inbox(recipient: UserId) -> String {
        format!("{NOTIFICATIONS}{:020}:", recipient.0)
    }

    pub fn notification(recipient: UserId, id: NotificationId) -> String {
        format!("{}{:020}", inbox(recipient), id.0)
    }
}

/// Sequence names for `Writer::next_id`.
pub(crate) mod seq {
    pub const USER: &str = "user";
    pub const TWEET: &str = "tweet";
    pub const LIKE: &str = "like";
    pub const FOLLOW: &str = "follow";
    pub const NOTIFICATION: &str = "notification";
}

/// Handle to the persisted social graph.
#[derive(Clone)]
pub struct EntityStore {
    kv: Arc<dyn KVStore>,
    clock: Arc<dyn Clock>,
}

impl EntityStore {
    pub fn new(kv: Arc<dyn KVStore>, clock: Arc<dyn Clock>) -> Self {
        Self { kv, clock }
    }

    /// Open a consistent read-only view.
    pub fn read(&self) -> Result<Reader<'_>, ServiceError> {
        Ok(Reader {
            kv: self.kv.snapshot().map_err(storage)?,
        })
    }

    /// Open the single read-write transaction. Blocks while another is open.
    pub fn write(&self) -> Result<Writer<'_>, ServiceError> {
        let kv = self.kv.begin().map_err(storage)?;
        Ok(Writer {
            kv,
            now: self.clock.now(),
        })
    }
}

/// Typed lookups shared by snapshots and transactions.
pub trait Records {
    type Kv: KVRead + ?Sized;

    fn kv(&self) -> &Self::Kv;

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ServiceError> {
        match self.kv().get(key).map_err(storage)? {
            Some(bytes) => decode(key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    fn load_all<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>, ServiceError> {
        self.kv()
            .scan(prefix)
            .map_err(storage)?
            .into_iter()
            .map(|(key, bytes)| decode(&key, &bytes))
            .collect()
    }

    fn user(&self, id: UserId) -> Result<Option<User>, ServiceError> {
        self.load(&keys::user(id))
    }

    fn require_user(&self, id: UserId) -> Result<User, ServiceError> {
        self.user(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("user {id} not found")))
    }

    fn users(&self) -> Result<Vec<User>, ServiceError> {
        self.load_all(keys::USERS)
    }

    fn tweet(&self, id: TweetId) -> Result<Option<Tweet>, ServiceError> {
        self.load(&keys::tweet(id))
    }

    fn require_tweet(&self, id: TweetId) -> Result<Tweet, ServiceError> {
        self.tweet(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("tweet {id} not found")))
    }

    fn tweets(&self) -> Result<Vec<Tweet>, ServiceError> {
        self.load_all(keys::TWEETS)
    }

    fn is_liked(&self, user: UserId, tweet: TweetId) -> Result<bool, ServiceError> {
        Ok(self.kv().get(&keys::like(tweet, user)).map_err(storage)?.is_some())
    }

    fn likes_of(&self, tweet: TweetId) -> Result<Vec<Like>, ServiceError> {
        self.load_all(&keys::likes_of(tweet))
    }

    fn likes(&self) -> Result<Vec<Like>, ServiceError> {
        self.load_all(keys::LIKES)
    }

    fn is_following(&self, follower: UserId, following: UserId) -> Result<bool, ServiceError> {
        Ok(self
            .kv()
            .get(&keys::follow(follower, following))
            .map_err(storage)?
            .is_some())
    }

    fn follows(&self) -> Result<Vec<Follow>, ServiceError> {
        self.load_all(keys::FOLLOWS)
    }

    fn notification(
        &self,
        recipient: UserId,
        id: NotificationId,
    ) -> Result<Option<Notification>, ServiceError> {
        self.load(&keys::notification(recipient, id))
    }

    fn inbox(&self, recipient: UserId) -> Result<Vec<Notification>, ServiceError> {
        self.load_all(&keys::inbox(recipient))
    }
}

/// A read-only snapshot.
pub struct Reader<'a> {
    kv: Box<dyn KVRead + 'a>,
}

impl<'a> Records for Reader<'a> {
    type Kv = dyn KVRead + 'a;

    fn kv(&self) -> &Self::Kv {
        &*self.kv
    }
}

/// A read-write transaction. Dropped without `commit`, nothing is written.
///
/// Every record created through one writer shares the same timestamp.
pub struct Writer<'a> {
    kv: Box<dyn KVTxn + 'a>,
    now: DateTime<Utc>,
}

impl<'a> Records for Writer<'a> {
    type Kv = dyn KVTxn + 'a;

    fn kv(&self) -> &Self::Kv {
        &*self.kv
    }
}

impl Writer<'_> {
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn commit(self) -> Result<(), ServiceError> {
        self.kv.commit().map_err(storage)
    }

    /// Next value of a named sequence, starting at 1.
    pub(crate) fn next_id(&mut self, name: &str) -> Result<u64, ServiceError> {
        let key = keys::seq(name);
        let next = self.load::<u64>(&key)?.unwrap_or(0) + 1;
        self.put(&key, &next)?;
        Ok(next)
    }

    pub(crate) fn put<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), ServiceError> {
        let bytes = encode(value)?;
        self.kv.set(key, &bytes).map_err(storage)
    }

    fn put_new<T: Serialize>(&mut self, key: &str, value: &T) -> Result<bool, ServiceError> {
        let bytes = encode(value)?;
        self.kv.insert_new(key, &bytes).map_err(storage)
    }

    pub(crate) fn remove(&mut self, key: &str) -> Result<bool, ServiceError> {
        self.kv.delete(key).map_err(storage)
    }

    /// Claim the user's handle and email, then write the record.
    pub(crate) fn insert_user(&mut self, user: &User) -> Result<(), ServiceError> {
        if !self.put_new(&keys::handle(&user.handle), &user.id)? {
            return Err(ServiceError::AlreadyExists(format!(
                "handle '{}' is taken",
                user.handle
            )));
        }
        if !self.put_new(&keys::email(&user.email), &user.id)? {
            return Err(ServiceError::AlreadyExists(format!(
                "email '{}' is already registered",
                user.email
            )));
        }
        self.put(&keys::user(user.id), user)
    }

    /// Overwrite profile fields. Handle and email never change here.
    pub(crate) fn save_user(&mut self, user: &User) -> Result<(), ServiceError> {
        self.put(&keys::user(user.id), user)
    }

    pub(crate) fn insert_tweet(&mut self, tweet: &Tweet) -> Result<(), ServiceError> {
        self.put(&keys::tweet(tweet.id), tweet)
    }

    /// Remove a tweet and every like on it. Returns the number of likes removed.
    pub(crate) fn remove_tweet(&mut self, id: TweetId) -> Result<usize, ServiceError> {
        let like_keys: Vec<String> = self
            .kv
            .scan(&keys::likes_of(id))
            .map_err(storage)?
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        for key in &like_keys {
            self.remove(key)?;
        }
        self.remove(&keys::tweet(id))?;
        Ok(like_keys.len())
    }

    /// Insert a like row. Returns `false` when the pair already exists.
    pub(crate) fn insert_like(&mut self, like: &Like) -> Result<bool, ServiceError> {
        self.put_new(&keys::like(like.tweet_id, like.user_id), like)
    }

    pub(crate) fn remove_like(&mut self, user: UserId, tweet: TweetId) -> Result<bool, ServiceError> {
        self.remove(&keys::like(tweet, user))
    }

    /// Insert a follow row. Returns `false` when the pair already exists.
    pub(crate) fn insert_follow(&mut self, follow: &Follow) -> Result<bool, ServiceError> {
        self.put_new(&keys::follow(follow.follower_id, follow.following_id), follow)
    }

    pub(crate) fn remove_follow(
        &mut self,
        follower: UserId,
        following: UserId,
    ) -> Result<bool, ServiceError> {
        self.remove(&keys::follow(follower, following))
    }

    pub(crate) fn save_notification(&mut self, n: &Notification) -> Result<(), ServiceError> {
        self.put(&keys::notification(n.recipient_id, n.id), n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, make_store};

    fn user(id: u64, handle: &str) -> User {
        User {
            id: UserId(id),
            handle: handle.into(),
            email: format!("{handle}@example.com"),
            display_name: handle.into(),
            bio: None,
            avatar_url: None,
            location: None,
            website: None,
            verified: false,
            created_at: at(0),
            updated_at: at(0),
        }
    }

    #[test]
    fn sequences_start_at_one_and_roll_back_with_the_txn() {
        let (_dir, store) = make_store();
        {
            let mut w = store.write().unwrap();
            assert_eq!(w.next_id(seq::TWEET).unwrap(), 1);
            assert_eq!(w.next_id(seq::TWEET).unwrap(), 2);
            // dropped
        }
        let mut w = store.write().unwrap();
        assert_eq!(w.next_id(seq::TWEET).unwrap(), 1);
        assert_eq!(w.next_id(seq::USER).unwrap(), 1);
    }

    #[test]
    fn handle_and_email_are_unique_ignoring_case() {
        let (_dir, store) = make_store();
        let mut w = store.write().unwrap();
        w.insert_user(&user(1, "Jane")).unwrap();
        w.commit().unwrap();

        let mut w = store.write().unwrap();
        let err = w.insert_user(&user(2, "jane")).unwrap_err();
        assert_eq!(err.error_code(), "ALREADY_EXISTS");
        drop(w);

        let mut other = user(3, "other");
        other.email = "JANE@example.com".into();
        let mut w = store.write().unwrap();
        let err = w.insert_user(&other).unwrap_err();
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn remove_tweet_cascades_its_likes_only() {
        let (_dir, store) = make_store();
        let mut w = store.write().unwrap();
        for (tweet, by) in [(1, 1), (1, 2), (2, 1)] {
            let like = Like {
                id: w.next_id(seq::LIKE).unwrap(),
                user_id: UserId(by),
                tweet_id: TweetId(tweet),
                created_at: w.now(),
            };
            assert!(w.insert_like(&like).unwrap());
        }
        assert_eq!(w.remove_tweet(TweetId(1)).unwrap(), 2);
        w.commit().unwrap();

        let r = store.read().unwrap();
        assert!(r.likes_of(TweetId(1)).unwrap().is_empty());
        assert!(r.is_liked(UserId(1), TweetId(2)).unwrap());
        assert_eq!(r.likes().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_pair_rows_are_rejected() {
        let (_dir, store) = make_store();
        let mut w = store.write().unwrap();
        let follow = Follow {
            id: 1,
            follower_id: UserId(1),
            following_id: UserId(2),
            created_at: w.now(),
        };
        assert!(w.insert_follow(&follow).unwrap());
        assert!(!w.insert_follow(&Follow { id: 2, ..follow.clone() }).unwrap());
        assert!(w.is_following(UserId(1), UserId(2)).unwrap());
        assert!(!w.is_following(UserId(2), UserId(1)).unwrap());
    }
}
