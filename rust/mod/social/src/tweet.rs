//! Posting and deleting tweets.

use tracing::debug;

use chirp_core::ServiceError;

use crate::counter::{self, CounterField};
use crate::model::{NewTweet, NotificationKind, Tweet, TweetId, UserId};
use crate::notify;
use crate::store::{Records, Writer, seq};

/// Content must be non-blank and at most `max_chars` characters.
pub fn validate_content(content: &str, max_chars: usize) -> Result<(), ServiceError> {
    if content.trim().is_empty() {
        return Err(ServiceError::InvalidArgument("tweet content must not be empty".into()));
    }
    let len = content.chars().count();
    if len > max_chars {
        return Err(ServiceError::InvalidArgument(format!(
            "tweet content is {len} characters, limit is {max_chars}"
        )));
    }
    Ok(())
}

/// Post a tweet or reply. Bumps the author's `tweetsCount` and, for a reply,
/// the parent's `repliesCount`, and notifies the parent's author.
pub fn create(
    w: &mut Writer<'_>,
    author: UserId,
    req: NewTweet,
    max_chars: usize,
) -> Result<Tweet, ServiceError> {
    validate_content(&req.content, max_chars)?;
    w.require_user(author)?;
    let parent = match req.parent_tweet_id {
        Some(id) => Some(w.require_tweet(id)?),
        None => None,
    };

    let tweet = Tweet {
        id: TweetId(w.next_id(seq::TWEET)?),
        author_id: author,
        content: req.content,
        parent_tweet_id: parent.as_ref().map(|p| p.id),
        created_at: w.now(),
    };
    w.insert_tweet(&tweet)?;
    counter::adjust(w, CounterField::Tweets, author.0, 1, "create_tweet")?;

    if let Some(parent) = parent {
        counter::adjust(w, CounterField::Replies, parent.id.0, 1, "create_tweet")?;
        notify::emit(
            w,
            parent.author_id,
            author,
            NotificationKind::Reply { tweet_id: tweet.id },
        )?;
    }
    debug!(tweet = %tweet.id, author = %author, reply = tweet.is_reply(), "tweet stored");
    Ok(tweet)
}

/// Delete the caller's own tweet.
///
/// Likes on the tweet and its counter block go with it. Replies stay, with
/// a dangling parent id. Notifications that mention it are kept.
pub fn delete(w: &mut Writer<'_>, caller: UserId, id: TweetId) -> Result<Tweet, ServiceError> {
    let tweet = w.require_tweet(id)?;
    if tweet.author_id != caller {
        return Err(ServiceError::Forbidden(format!(
            "tweet {id} belongs to another user"
        )));
    }

    let likes = w.remove_tweet(id)?;
    counter::discard_tweet(w, id)?;
    counter::adjust(w, CounterField::Tweets, caller.0, -1, "delete_tweet")?;
    if let Some(parent_id) = tweet.parent_tweet_id {
        if w.tweet(parent_id)?.is_some() {
            counter::adjust(w, CounterField::Replies, parent_id.0, -1, "delete_tweet")?;
        }
    }
    debug!(tweet = %id, likes, "tweet removed");
    Ok(tweet)
}
