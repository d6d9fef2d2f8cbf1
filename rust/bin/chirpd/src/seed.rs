//! Demo data for a fresh store.
//!
//! Everything goes through `SocialService`, so counters and notifications
//! come out exactly as if real users had done it.

use std::collections::HashMap;

use anyhow::{Context, bail};
use serde::Deserialize;
use tracing::info;

use chirp_social::SocialService;
use chirp_social::model::{NewTweet, NewUser, TweetId, UserId};
use chirp_social::store::Records;

const DEMO: &str = include_str!("seed.toml");

#[derive(Debug, Deserialize)]
struct SeedFile {
    users: Vec<SeedUser>,
    #[serde(default)]
    tweets: Vec<SeedTweet>,
    #[serde(default)]
    likes: Vec<SeedLike>,
    #[serde(default)]
    follows: Vec<SeedFollow>,
}

#[derive(Debug, Deserialize)]
struct SeedUser {
    handle: String,
    email: String,
    display_name: String,
    #[serde(default)]
    bio: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeedTweet {
    author: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct SeedLike {
    user: String,
    /// 1-based position in `tweets`.
    tweet: usize,
}

#[derive(Debug, Deserialize)]
struct SeedFollow {
    follower: String,
    following: String,
}

/// Load the built-in demo data unless the store already has users.
/// Returns whether anything was written.
pub fn apply_demo(service: &SocialService) -> anyhow::Result<bool> {
    if !service.store().read()?.users()?.is_empty() {
        info!("store already has users, skipping seed");
        return Ok(false);
    }
    let file: SeedFile = toml::from_str(DEMO).context("parsing built-in seed data")?;
    apply(service, file)?;
    Ok(true)
}

fn apply(service: &SocialService, file: SeedFile) -> anyhow::Result<()> {
    let mut users: HashMap<String, UserId> = HashMap::new();
    for u in file.users {
        let view = service.register_user(NewUser {
            handle: u.handle.clone(),
            email: u.email,
            display_name: u.display_name,
            bio: u.bio,
        })?;
        users.insert(u.handle, view.user.id);
    }
    let user = |handle: &str| -> anyhow::Result<UserId> {
        match users.get(handle) {
            Some(id) => Ok(*id),
            None => bail!("seed references unknown user '{handle}'"),
        }
    };

    let mut tweets: Vec<TweetId> = Vec::with_capacity(file.tweets.len());
    for t in &file.tweets {
        let view = service.create_tweet(
            user(&t.author)?,
            NewTweet {
                content: t.content.clone(),
                parent_tweet_id: None,
            },
        )?;
        tweets.push(view.tweet.id);
    }

    for like in &file.likes {
        let Some(tweet) = like.tweet.checked_sub(1).and_then(|i| tweets.get(i)) else {
            bail!("seed like references tweet #{} of {}", like.tweet, tweets.len());
        };
        service.like_tweet(user(&like.user)?, *tweet)?;
    }

    for f in &file.follows {
        service.follow_user(user(&f.follower)?, user(&f.following)?)?;
    }

    info!(
        users = users.len(),
        tweets = tweets.len(),
        likes = file.likes.len(),
        follows = file.follows.len(),
        "seed data loaded"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chirp_core::{PageParams, SystemClock};
    use chirp_kv::RedbStore;
    use chirp_social::FeedConfig;

    fn make_service() -> (tempfile::TempDir, SocialService) {
        let dir = tempfile::tempdir().unwrap();
        let kv = RedbStore::open(&dir.path().join("seed.redb")).unwrap();
        let svc = SocialService::new(Arc::new(kv), Arc::new(SystemClock), FeedConfig::default());
        (dir, svc)
    }

    #[test]
    fn demo_seed_produces_consistent_counters() {
        let (_dir, svc) = make_service();
        assert!(apply_demo(&svc).unwrap());
        assert!(svc.audit_counters().unwrap().is_empty());

        let john = svc.get_user(UserId(1)).unwrap();
        assert_eq!(john.user.handle, "john_doe");
        assert_eq!(john.counts.tweets_count, 3);
        assert_eq!(john.counts.followers_count, 2);
        assert_eq!(john.counts.following_count, 2);

        let timeline = svc.list_timeline(UserId(1), &PageParams::new(1, 100)).unwrap();
        assert_eq!(timeline.items.len(), 8);
    }

    #[test]
    fn second_seed_is_skipped() {
        let (_dir, svc) = make_service();
        assert!(apply_demo(&svc).unwrap());
        assert!(!apply_demo(&svc).unwrap());
    }

    #[test]
    fn unknown_references_fail() {
        let (_dir, svc) = make_service();
        let file: SeedFile = toml::from_str(
            r#"
            [[users]]
            handle = "a"
            email = "a@x.io"
            display_name = "A"

            [[follows]]
            follower = "a"
            following = "ghost"
            "#,
        )
        .unwrap();
        let err = apply(&svc, file).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }
}
