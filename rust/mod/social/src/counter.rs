//! Counter Maintainer.
//!
//! Denormalized counts live in one block per entity under
//! `social:counter:{user|tweet}:{id}`, separate from the entity record. This
//! module is the only code that knows that key, so every count change goes
//! through `adjust` inside the caller's transaction.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::error;

use chirp_core::ServiceError;

use crate::model::{TweetCounts, TweetId, UserCounts, UserId};
use crate::store::{Records, Writer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Tweet,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Tweet => "tweet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CounterField {
    #[serde(rename = "followersCount")]
    Followers,
    #[serde(rename = "followingCount")]
    Following,
    #[serde(rename = "tweetsCount")]
    Tweets,
    #[serde(rename = "likesCount")]
    Likes,
    #[serde(rename = "repliesCount")]
    Replies,
    #[serde(rename = "retweetsCount")]
    Retweets,
}

impl CounterField {
    pub const USER: [CounterField; 3] = [Self::Followers, Self::Following, Self::Tweets];
    pub const TWEET: [CounterField; 3] = [Self::Likes, Self::Replies, Self::Retweets];

    pub fn entity(self) -> EntityKind {
        match self {
            Self::Followers | Self::Following | Self::Tweets => EntityKind::User,
            Self::Likes | Self::Replies | Self::Retweets => EntityKind::Tweet,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Followers => "followersCount",
            Self::Following => "followingCount",
            Self::Tweets => "tweetsCount",
            Self::Likes => "likesCount",
            Self::Replies => "repliesCount",
            Self::Retweets => "retweetsCount",
        }
    }
}

/// Stored as `{"likesCount": 3, ...}`. Missing fields read as zero.
type Block = BTreeMap<String, u64>;

fn block_key(kind: EntityKind, id: u64) -> String {
    format!("social:counter:{}:{id:020}", kind.as_str())
}

fn read_block<R: Records + ?Sized>(r: &R, kind: EntityKind, id: u64) -> Result<Block, ServiceError> {
    Ok(r.load(&block_key(kind, id))?.unwrap_or_default())
}

fn entity_exists(w: &Writer<'_>, kind: EntityKind, id: u64) -> Result<bool, ServiceError> {
    Ok(match kind {
        EntityKind::User => w.user(UserId(id))?.is_some(),
        EntityKind::Tweet => w.tweet(TweetId(id))?.is_some(),
    })
}

/// Apply `delta` to one counter. Returns the new value.
///
/// Fails with `Internal` when the entity is missing or the counter would go
/// negative; both are logged with the operation that asked for the change.
pub fn adjust(
    w: &mut Writer<'_>,
    field: CounterField,
    id: u64,
    delta: i64,
    op: &'static str,
) -> Result<u64, ServiceError> {
    let kind = field.entity();
    if !entity_exists(w, kind, id)? {
        error!(
            entity = kind.as_str(),
            id,
            field = field.as_str(),
            delta,
            op,
            "counter adjust on missing entity"
        );
        return Err(ServiceError::Internal(format!(
            "{op}: cannot adjust {} of missing {} {id}",
            field.as_str(),
            kind.as_str()
        )));
    }

    let mut block = read_block(&*w, kind, id)?;
    let slot = block.entry(field.as_str().to_string()).or_insert(0);
    let Some(next) = slot.checked_add_signed(delta) else {
        error!(
            entity = kind.as_str(),
            id,
            field = field.as_str(),
            delta,
            current = *slot,
            op,
            "counter adjust out of range"
        );
        return Err(ServiceError::Internal(format!(
            "{op}: {} of {} {id} would leave range",
            field.as_str(),
            kind.as_str()
        )));
    };
    *slot = next;
    w.put(&block_key(kind, id), &block)?;
    Ok(next)
}

/// Force one counter to an exact value. Used only by counter repair.
pub(crate) fn overwrite(
    w: &mut Writer<'_>,
    field: CounterField,
    id: u64,
    value: u64,
) -> Result<(), ServiceError> {
    let kind = field.entity();
    let mut block = read_block(&*w, kind, id)?;
    block.insert(field.as_str().to_string(), value);
    w.put(&block_key(kind, id), &block)
}

/// Drop a deleted tweet's counter block.
pub(crate) fn discard_tweet(w: &mut Writer<'_>, id: TweetId) -> Result<(), ServiceError> {
    w.remove(&block_key(EntityKind::Tweet, id.0))?;
    Ok(())
}

pub fn user_counts<R: Records + ?Sized>(r: &R, id: UserId) -> Result<UserCounts, ServiceError> {
    let block = read_block(r, EntityKind::User, id.0)?;
    let get = |f: CounterField| block.get(f.as_str()).copied().unwrap_or(0);
    Ok(UserCounts {
        followers_count: get(CounterField::Followers),
        following_count: get(CounterField::Following),
        tweets_count: get(CounterField::Tweets),
    })
}

pub fn tweet_counts<R: Records + ?Sized>(r: &R, id: TweetId) -> Result<TweetCounts, ServiceError> {
    let block = read_block(r, EntityKind::Tweet, id.0)?;
    let get = |f: CounterField| block.get(f.as_str()).copied().unwrap_or(0);
    Ok(TweetCounts {
        likes_count: get(CounterField::Likes),
        replies_count: get(CounterField::Replies),
        retweets_count: get(CounterField::Retweets),
    })
}

/// Stored value of a single counter.
pub fn get<R: Records + ?Sized>(r: &R, field: CounterField, id: u64) -> Result<u64, ServiceError> {
    let block = read_block(r, field.entity(), id)?;
    Ok(block.get(field.as_str()).copied().unwrap_or(0))
}
