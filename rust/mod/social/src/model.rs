//! Social graph records and the views handed to callers.
//!
//! Stored records (`User`, `Tweet`, `Like`, `Follow`, `Notification`) carry no
//! counters. Counts live in blocks owned by [`crate::counter`] and are joined
//! in when a view is built.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chirp_core::ServiceError;

macro_rules! id_type {
    ($name:ident, $what:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ServiceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map($name)
                    .map_err(|_| ServiceError::InvalidArgument(format!("invalid {} id '{}'", $what, s)))
            }
        }
    };
}

id_type!(UserId, "user");
id_type!(TweetId, "tweet");
id_type!(NotificationId, "notification");

// ── Records ──

/// A registered account. Credentials are held by the identity layer, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub handle: String,
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub bio: Option<String>,
    /// Opaque media reference; never validated.
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post. `parent_tweet_id` marks it as a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    pub id: TweetId,
    pub author_id: UserId,
    pub content: String,
    #[serde(default)]
    pub parent_tweet_id: Option<TweetId>,
    pub created_at: DateTime<Utc>,
}

impl Tweet {
    pub fn is_reply(&self) -> bool {
        self.parent_tweet_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: u64,
    pub user_id: UserId,
    pub tweet_id: TweetId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub id: u64,
    pub follower_id: UserId,
    pub following_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// What a notification is about. The related tweet exists only for the
/// kinds that concern a tweet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum NotificationKind {
    Like { tweet_id: TweetId },
    Follow,
    Retweet { tweet_id: TweetId },
    Reply { tweet_id: TweetId },
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like { .. } => "LIKE",
            Self::Follow => "FOLLOW",
            Self::Retweet { .. } => "RETWEET",
            Self::Reply { .. } => "REPLY",
        }
    }

    pub fn related_tweet(&self) -> Option<TweetId> {
        match self {
            Self::Like { tweet_id } | Self::Retweet { tweet_id } | Self::Reply { tweet_id } => {
                Some(*tweet_id)
            }
            Self::Follow => None,
        }
    }

    /// Human-readable message shown to the recipient.
    pub fn message(&self, actor_handle: &str) -> String {
        match self {
            Self::Like { .. } => format!("@{actor_handle} liked your tweet"),
            Self::Follow => format!("@{actor_handle} started following you"),
            Self::Retweet { .. } => format!("@{actor_handle} retweeted your tweet"),
            Self::Reply { .. } => format!("@{actor_handle} replied to your tweet"),
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub actor_id: UserId,
    pub kind: NotificationKind,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

// ── Counter snapshots ──

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCounts {
    pub followers_count: u64,
    pub following_count: u64,
    pub tweets_count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetCounts {
    pub likes_count: u64,
    pub replies_count: u64,
    pub retweets_count: u64,
}

// ── Views ──

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(flatten)]
    pub user: User,
    #[serde(flatten)]
    pub counts: UserCounts,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    #[serde(flatten)]
    pub user: UserView,
    pub is_following: bool,
}

/// The slice of a user embedded in tweets and notifications.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: UserId,
    pub handle: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub verified: bool,
}

impl From<&User> for AuthorSummary {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            handle: u.handle.clone(),
            display_name: u.display_name.clone(),
            avatar_url: u.avatar_url.clone(),
            verified: u.verified,
        }
    }
}

/// A tweet annotated for one caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetView {
    #[serde(flatten)]
    pub tweet: Tweet,
    #[serde(flatten)]
    pub counts: TweetCounts,
    pub author: AuthorSummary,
    pub is_liked: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetDetail {
    pub tweet: TweetView,
    /// Direct replies, oldest first.
    pub replies: Vec<TweetView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: Notification,
    pub actor: Option<AuthorSummary>,
}

// ── Requests ──

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub handle: String,
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTweet {
    pub content: String,
    #[serde(default)]
    pub parent_tweet_id: Option<TweetId>,
}

/// Partial profile update. `None` leaves a field unchanged; an empty string
/// clears an optional field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}
