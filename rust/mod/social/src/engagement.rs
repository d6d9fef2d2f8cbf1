//! Like and follow toggles.
//!
//! Each toggle is a small state machine per pair: `NotLiked <-> Liked` and
//! `NotFollowing <-> Following`. Every transition writes the relationship
//! row, the counters and the notification through one `Writer`, so either
//! all of it lands or none of it does. A repeated transition is rejected
//! with `AlreadyExists` / `NotFound` and leaves the store untouched.

use tracing::debug;

use chirp_core::ServiceError;

use crate::counter::{self, CounterField};
use crate::model::{Follow, Like, NotificationKind, TweetId, UserId};
use crate::notify;
use crate::store::{Records, Writer, seq};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    NotLiked,
    Liked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowState {
    NotFollowing,
    Following,
}

pub fn like_state<R: Records + ?Sized>(
    r: &R,
    user: UserId,
    tweet: TweetId,
) -> Result<LikeState, ServiceError> {
    Ok(if r.is_liked(user, tweet)? {
        LikeState::Liked
    } else {
        LikeState::NotLiked
    })
}

pub fn follow_state<R: Records + ?Sized>(
    r: &R,
    follower: UserId,
    following: UserId,
) -> Result<FollowState, ServiceError> {
    Ok(if r.is_following(follower, following)? {
        FollowState::Following
    } else {
        FollowState::NotFollowing
    })
}

/// `actor` likes `tweet_id`.
///
/// Errors: `NotFound` if the tweet is gone, `AlreadyExists` if already liked.
pub fn like(w: &mut Writer<'_>, actor: UserId, tweet_id: TweetId) -> Result<Like, ServiceError> {
    w.require_user(actor)?;
    let tweet = w.require_tweet(tweet_id)?;

    let like = Like {
        id: w.next_id(seq::LIKE)?,
        user_id: actor,
        tweet_id,
        created_at: w.now(),
    };
    if !w.insert_like(&like)? {
        return Err(ServiceError::AlreadyExists(format!(
            "user {actor} already liked tweet {tweet_id}"
        )));
    }
    counter::adjust(w, CounterField::Likes, tweet_id.0, 1, "like")?;
    notify::emit(w, tweet.author_id, actor, NotificationKind::Like { tweet_id })?;
    debug!(actor = %actor, tweet = %tweet_id, "like recorded");
    Ok(like)
}

/// `actor` withdraws a like. `NotFound` if there was none.
pub fn unlike(w: &mut Writer<'_>, actor: UserId, tweet_id: TweetId) -> Result<(), ServiceError> {
    if !w.remove_like(actor, tweet_id)? {
        return Err(ServiceError::NotFound(format!(
            "user {actor} has not liked tweet {tweet_id}"
        )));
    }
    counter::adjust(w, CounterField::Likes, tweet_id.0, -1, "unlike")?;
    debug!(actor = %actor, tweet = %tweet_id, "like removed");
    Ok(())
}

/// `actor` follows `target`.
///
/// Errors: `InvalidOperation` for self-follow (checked first, before any
/// lookup), `NotFound` if the target is missing, `AlreadyExists` if already
/// following.
pub fn follow(w: &mut Writer<'_>, actor: UserId, target: UserId) -> Result<Follow, ServiceError> {
    if actor == target {
        return Err(ServiceError::InvalidOperation("cannot follow yourself".into()));
    }
    w.require_user(actor)?;
    w.require_user(target)?;

    let follow = Follow {
        id: w.next_id(seq::FOLLOW)?,
        follower_id: actor,
        following_id: target,
        created_at: w.now(),
    };
    if !w.insert_follow(&follow)? {
        return Err(ServiceError::AlreadyExists(format!(
            "user {actor} already follows user {target}"
        )));
    }
    counter::adjust(w, CounterField::Following, actor.0, 1, "follow")?;
    counter::adjust(w, CounterField::Followers, target.0, 1, "follow")?;
    notify::emit(w, target, actor, NotificationKind::Follow)?;
    debug!(actor = %actor, target = %target, "follow recorded");
    Ok(follow)
}

/// `actor` stops following `target`. `NotFound` if not following.
pub fn unfollow(w: &mut Writer<'_>, actor: UserId, target: UserId) -> Result<(), ServiceError> {
    if actor == target {
        return Err(ServiceError::InvalidOperation("cannot unfollow yourself".into()));
    }
    if !w.remove_follow(actor, target)? {
        return Err(ServiceError::NotFound(format!(
            "user {actor} does not follow user {target}"
        )));
    }
    counter::adjust(w, CounterField::Following, actor.0, -1, "unfollow")?;
    counter::adjust(w, CounterField::Followers, target.0, -1, "unfollow")?;
    debug!(actor = %actor, target = %target, "follow removed");
    Ok(())
}

/// Treat "already in the requested state" as success.
///
/// Toggles report a repeated transition as `AlreadyExists` (like, follow) or
/// `NotFound` (unlike, unfollow). A client retrying after a lost response
/// can pass the result through here to get at-most-once semantics without
/// double counting. Only use it for toggle results: a `NotFound` from a
/// missing tweet looks the same as one from a missing like.
pub fn settle<T>(result: Result<T, ServiceError>) -> Result<(), ServiceError> {
    match result {
        Ok(_) | Err(ServiceError::AlreadyExists(_)) | Err(ServiceError::NotFound(_)) => Ok(()),
        Err(e) => Err(e),
    }
}
