//! Counter reconciliation.
//!
//! Recomputes every counter from the relationship rows and reports the ones
//! whose stored value disagrees. `repair` writes the recomputed values back
//! in a single transaction.

use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use chirp_core::ServiceError;

use crate::counter::{self, CounterField, EntityKind};
use crate::store::{Records, Writer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterDrift {
    pub entity: EntityKind,
    pub id: u64,
    pub field: CounterField,
    pub stored: u64,
    pub actual: u64,
}

/// Every counter whose stored value differs from the recomputed one.
pub fn audit<R: Records + ?Sized>(r: &R) -> Result<Vec<CounterDrift>, ServiceError> {
    let mut actual: HashMap<(CounterField, u64), u64> = HashMap::new();
    let mut bump = |field: CounterField, id: u64| *actual.entry((field, id)).or_insert(0) += 1;

    let tweets = r.tweets()?;
    for t in &tweets {
        bump(CounterField::Tweets, t.author_id.0);
        if let Some(parent) = t.parent_tweet_id {
            bump(CounterField::Replies, parent.0);
        }
    }
    for like in r.likes()? {
        bump(CounterField::Likes, like.tweet_id.0);
    }
    for f in r.follows()? {
        bump(CounterField::Following, f.follower_id.0);
        bump(CounterField::Followers, f.following_id.0);
    }

    let mut entities: Vec<(CounterField, u64)> = Vec::new();
    for u in r.users()? {
        entities.extend(CounterField::USER.iter().map(|f| (*f, u.id.0)));
    }
    for t in &tweets {
        entities.extend(CounterField::TWEET.iter().map(|f| (*f, t.id.0)));
    }

    let mut drift = Vec::new();
    for (field, id) in entities {
        let stored = counter::get(r, field, id)?;
        let expected = actual.get(&(field, id)).copied().unwrap_or(0);
        if stored != expected {
            drift.push(CounterDrift {
                entity: field.entity(),
                id,
                field,
                stored,
                actual: expected,
            });
        }
    }
    Ok(drift)
}

/// Overwrite every drifted counter with its recomputed value.
pub fn repair(w: &mut Writer<'_>) -> Result<Vec<CounterDrift>, ServiceError> {
    let drift = audit(&*w)?;
    for d in &drift {
        warn!(
            entity = d.entity.as_str(),
            id = d.id,
            field = d.field.as_str(),
            stored = d.stored,
            actual = d.actual,
            "repairing counter"
        );
        counter::overwrite(w, d.field, d.id, d.actual)?;
    }
    Ok(drift)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TweetId, UserId};
    use crate::testing::{make_store, put_tweet, put_user};
    use crate::{engagement, tweet};

    #[test]
    fn consistent_graph_has_no_drift() {
        let (_dir, store) = make_store();
        let mut w = store.write().unwrap();
        put_user(&mut w, 1, "alice");
        put_user(&mut w, 2, "bob");
        let root = tweet::create(
            &mut w,
            UserId(1),
            crate::model::NewTweet { content: "hi".into(), parent_tweet_id: None },
            280,
        )
        .unwrap();
        engagement::like(&mut w, UserId(2), root.id).unwrap();
        engagement::follow(&mut w, UserId(2), UserId(1)).unwrap();
        assert!(audit(&w).unwrap().is_empty());
    }

    #[test]
    fn repair_fixes_rows_written_without_counters() {
        let (_dir, store) = make_store();
        let mut w = store.write().unwrap();
        put_user(&mut w, 1, "alice");
        // raw insert: no counter adjustment
        put_tweet(&mut w, 7, 1, None);
        counter::adjust(&mut w, CounterField::Likes, 7, 2, "test").unwrap();

        let drift = audit(&w).unwrap();
        assert_eq!(drift.len(), 2);
        assert!(drift.contains(&CounterDrift {
            entity: EntityKind::User,
            id: 1,
            field: CounterField::Tweets,
            stored: 0,
            actual: 1,
        }));

        let repaired = repair(&mut w).unwrap();
        assert_eq!(repaired, drift);
        assert!(audit(&w).unwrap().is_empty());
        assert_eq!(counter::tweet_counts(&w, TweetId(7)).unwrap().likes_count, 0);
    }
}
