//! Timeline Assembler.
//!
//! Timelines are read from one snapshot: filter, order newest first, cut the
//! page window, then annotate only the tweets on the page. Offset paging is
//! not cursor-stable; rows inserted ahead of the window shift later pages.

use std::cmp::Ordering;

use chirp_core::{Page, ServiceError};

use crate::counter;
use crate::model::{AuthorSummary, PageRequest, Tweet, TweetDetail, TweetId, TweetView, UserId};
use crate::store::Records;

/// Creation time descending, then id descending.
pub fn newest_first(a: &Tweet, b: &Tweet) -> Ordering {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
}

/// Attach counts, author summary and the caller's like status.
pub fn annotate<R: Records + ?Sized>(
    r: &R,
    caller: UserId,
    tweet: Tweet,
) -> Result<TweetView, ServiceError> {
    let author = r.user(tweet.author_id)?.ok_or_else(|| {
        ServiceError::Internal(format!(
            "tweet {} references missing author {}",
            tweet.id, tweet.author_id
        ))
    })?;
    Ok(TweetView {
        counts: counter::tweet_counts(r, tweet.id)?,
        author: AuthorSummary::from(&author),
        is_liked: r.is_liked(caller, tweet.id)?,
        tweet,
    })
}

pub(crate) fn annotate_page<R: Records + ?Sized>(
    r: &R,
    caller: UserId,
    tweets: Vec<Tweet>,
    window: PageRequest,
) -> Result<Page<TweetView>, ServiceError> {
    Page::slice(tweets, window.page, window.page_size).try_map(|t| annotate(r, caller, t))
}

/// Top-level tweets, optionally restricted to one author, newest first.
fn top_level<R: Records + ?Sized>(r: &R, author: Option<UserId>) -> Result<Vec<Tweet>, ServiceError> {
    let mut tweets: Vec<Tweet> = r
        .tweets()?
        .into_iter()
        .filter(|t| !t.is_reply())
        .filter(|t| author.is_none_or(|a| t.author_id == a))
        .collect();
    tweets.sort_by(newest_first);
    Ok(tweets)
}

/// The primary feed: every top-level tweet, newest first.
pub fn list_timeline<R: Records + ?Sized>(
    r: &R,
    caller: UserId,
    window: PageRequest,
) -> Result<Page<TweetView>, ServiceError> {
    annotate_page(r, caller, top_level(r, None)?, window)
}

/// One user's top-level tweets. An unknown user has an empty timeline.
pub fn list_by_user<R: Records + ?Sized>(
    r: &R,
    caller: UserId,
    user_id: UserId,
    window: PageRequest,
) -> Result<Page<TweetView>, ServiceError> {
    annotate_page(r, caller, top_level(r, Some(user_id))?, window)
}

/// A tweet with its direct replies, oldest reply first.
pub fn detail<R: Records + ?Sized>(
    r: &R,
    caller: UserId,
    id: TweetId,
) -> Result<TweetDetail, ServiceError> {
    let tweet = r.require_tweet(id)?;
    let mut replies: Vec<Tweet> = r
        .tweets()?
        .into_iter()
        .filter(|t| t.parent_tweet_id == Some(id))
        .collect();
    replies.sort_by(|a, b| newest_first(b, a));
    Ok(TweetDetail {
        tweet: annotate(r, caller, tweet)?,
        replies: replies
            .into_iter()
            .map(|t| annotate(r, caller, t))
            .collect::<Result<_, _>>()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engagement;
    use crate::testing::{make_store, put_tweet_at, put_user};

    fn window(page: usize, page_size: usize) -> PageRequest {
        PageRequest { page, page_size }
    }

    fn ids(page: &Page<TweetView>) -> Vec<u64> {
        page.items.iter().map(|v| v.tweet.id.0).collect()
    }

    #[test]
    fn excludes_replies_and_orders_newest_first() {
        let (_dir, store) = make_store();
        let mut w = store.write().unwrap();
        put_user(&mut w, 1, "alice");
        put_tweet_at(&mut w, 1, 1, None, 10);
        put_tweet_at(&mut w, 2, 1, None, 30);
        put_tweet_at(&mut w, 3, 1, Some(1), 40);
        put_tweet_at(&mut w, 4, 1, None, 20);

        let page = list_timeline(&w, UserId(1), window(1, 10)).unwrap();
        assert_eq!(ids(&page), vec![2, 4, 1]);
        assert!(!page.has_more);
    }

    #[test]
    fn equal_timestamps_fall_back_to_id() {
        let (_dir, store) = make_store();
        let mut w = store.write().unwrap();
        put_user(&mut w, 1, "alice");
        for id in 1..=3 {
            put_tweet_at(&mut w, id, 1, None, 5);
        }
        let page = list_timeline(&w, UserId(1), window(1, 10)).unwrap();
        assert_eq!(ids(&page), vec![3, 2, 1]);
    }

    #[test]
    fn pages_partition_the_timeline() {
        let (_dir, store) = make_store();
        let mut w = store.write().unwrap();
        put_user(&mut w, 1, "alice");
        for id in 1..=5 {
            put_tweet_at(&mut w, id, 1, None, id as i64);
        }
        let p1 = list_timeline(&w, UserId(1), window(1, 2)).unwrap();
        let p2 = list_timeline(&w, UserId(1), window(2, 2)).unwrap();
        let p3 = list_timeline(&w, UserId(1), window(3, 2)).unwrap();
        let p4 = list_timeline(&w, UserId(1), window(4, 2)).unwrap();
        assert_eq!(ids(&p1), vec![5, 4]);
        assert_eq!(ids(&p2), vec![3, 2]);
        assert_eq!(ids(&p3), vec![1]);
        assert!(p4.items.is_empty());
        assert!(p1.has_more && p2.has_more && !p3.has_more);
    }

    #[test]
    fn annotates_like_status_per_caller() {
        let (_dir, store) = make_store();
        let mut w = store.write().unwrap();
        put_user(&mut w, 1, "alice");
        put_user(&mut w, 2, "bob");
        put_tweet_at(&mut w, 1, 1, None, 1);
        engagement::like(&mut w, UserId(2), TweetId(1)).unwrap();

        let for_bob = list_timeline(&w, UserId(2), window(1, 10)).unwrap();
        assert!(for_bob.items[0].is_liked);
        assert_eq!(for_bob.items[0].counts.likes_count, 1);
        assert_eq!(for_bob.items[0].author.handle, "alice");
        let for_alice = list_timeline(&w, UserId(1), window(1, 10)).unwrap();
        assert!(!for_alice.items[0].is_liked);
    }

    #[test]
    fn by_user_filters_author() {
        let (_dir, store) = make_store();
        let mut w = store.write().unwrap();
        put_user(&mut w, 1, "alice");
        put_user(&mut w, 2, "bob");
        put_tweet_at(&mut w, 1, 1, None, 1);
        put_tweet_at(&mut w, 2, 2, None, 2);
        put_tweet_at(&mut w, 3, 2, Some(1), 3);

        let bobs = list_by_user(&w, UserId(1), UserId(2), window(1, 10)).unwrap();
        assert_eq!(ids(&bobs), vec![2]);
        let nobody = list_by_user(&w, UserId(1), UserId(42), window(1, 10)).unwrap();
        assert!(nobody.items.is_empty());
    }

    #[test]
    fn detail_lists_replies_oldest_first() {
        let (_dir, store) = make_store();
        let mut w = store.write().unwrap();
        put_user(&mut w, 1, "alice");
        put_tweet_at(&mut w, 1, 1, None, 1);
        put_tweet_at(&mut w, 2, 1, Some(1), 3);
        put_tweet_at(&mut w, 3, 1, Some(1), 2);

        let d = detail(&w, UserId(1), TweetId(1)).unwrap();
        let reply_ids: Vec<u64> = d.replies.iter().map(|v| v.tweet.id.0).collect();
        assert_eq!(reply_ids, vec![3, 2]);
        assert_eq!(detail(&w, UserId(1), TweetId(9)).unwrap_err().error_code(), "NOT_FOUND");
    }
}
