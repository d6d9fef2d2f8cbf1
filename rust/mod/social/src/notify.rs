//! Notification Emitter and inbox queries.
//!
//! Notifications are written in the same transaction as the action that
//! caused them, keyed by recipient so an inbox is one prefix scan. Repeated
//! actions produce repeated notifications; there is no dedup.

use tracing::debug;

use chirp_core::{Page, ServiceError};

use crate::model::{
    AuthorSummary, Notification, NotificationId, NotificationKind, NotificationView, PageRequest,
    UserId,
};
use crate::store::{Records, Writer, seq};

/// Record a notification for `recipient` about something `actor` did.
///
/// Returns `None` without writing when the actor is the recipient.
pub fn emit(
    w: &mut Writer<'_>,
    recipient: UserId,
    actor: UserId,
    kind: NotificationKind,
) -> Result<Option<Notification>, ServiceError> {
    if recipient == actor {
        debug!(user = %actor, kind = %kind, "skipping self notification");
        return Ok(None);
    }
    let from = w.require_user(actor)?;
    let notification = Notification {
        id: NotificationId(w.next_id(seq::NOTIFICATION)?),
        recipient_id: recipient,
        actor_id: actor,
        kind,
        message: kind.message(&from.handle),
        is_read: false,
        created_at: w.now(),
    };
    w.save_notification(&notification)?;
    debug!(
        recipient = %recipient,
        actor = %actor,
        kind = %kind,
        id = %notification.id,
        "notification emitted"
    );
    Ok(Some(notification))
}

/// The recipient's inbox, newest first.
pub fn list<R: Records + ?Sized>(
    r: &R,
    recipient: UserId,
    window: PageRequest,
) -> Result<Page<NotificationView>, ServiceError> {
    let mut all = r.inbox(recipient)?;
    all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Page::slice(all, window.page, window.page_size).try_map(|notification| -> Result<_, ServiceError> {
        let actor = r.user(notification.actor_id)?.as_ref().map(AuthorSummary::from);
        Ok(NotificationView { notification, actor })
    })
}

pub fn unread_count<R: Records + ?Sized>(r: &R, recipient: UserId) -> Result<usize, ServiceError> {
    Ok(r.inbox(recipient)?.iter().filter(|n| !n.is_read).count())
}

/// Mark one notification read. Only the recipient can see it, so any other
/// caller gets `NotFound`.
pub fn mark_read(
    w: &mut Writer<'_>,
    recipient: UserId,
    id: NotificationId,
) -> Result<(), ServiceError> {
    let mut n = w
        .notification(recipient, id)?
        .ok_or_else(|| ServiceError::NotFound(format!("notification {id} not found")))?;
    if !n.is_read {
        n.is_read = true;
        w.save_notification(&n)?;
    }
    Ok(())
}

/// Mark the whole inbox read. Returns how many changed.
pub fn mark_all_read(w: &mut Writer<'_>, recipient: UserId) -> Result<usize, ServiceError> {
    let mut changed = 0;
    for mut n in w.inbox(recipient)? {
        if !n.is_read {
            n.is_read = true;
            w.save_notification(&n)?;
            changed += 1;
        }
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TweetId;
    use crate::testing::{make_store, put_user};

    fn window() -> PageRequest {
        PageRequest { page: 1, page_size: 20 }
    }

    #[test]
    fn self_actions_emit_nothing() {
        let (_dir, store) = make_store();
        let mut w = store.write().unwrap();
        put_user(&mut w, 1, "alice");
        let n = emit(&mut w, UserId(1), UserId(1), NotificationKind::Follow).unwrap();
        assert!(n.is_none());
        assert_eq!(unread_count(&w, UserId(1)).unwrap(), 0);
    }

    #[test]
    fn repeated_actions_are_not_deduplicated() {
        let (_dir, store) = make_store();
        let mut w = store.write().unwrap();
        put_user(&mut w, 1, "alice");
        put_user(&mut w, 2, "bob");
        let kind = NotificationKind::Like { tweet_id: TweetId(9) };
        emit(&mut w, UserId(1), UserId(2), kind).unwrap();
        let second = emit(&mut w, UserId(1), UserId(2), kind).unwrap().unwrap();
        assert_eq!(second.message, "@bob liked your tweet");
        w.commit().unwrap();

        let r = store.read().unwrap();
        let page = list(&r, UserId(1), window()).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].notification.id, second.id);
        assert_eq!(page.items[0].actor.as_ref().unwrap().handle, "bob");
    }

    #[test]
    fn mark_read_is_scoped_to_recipient() {
        let (_dir, store) = make_store();
        let mut w = store.write().unwrap();
        put_user(&mut w, 1, "alice");
        put_user(&mut w, 2, "bob");
        let n = emit(&mut w, UserId(1), UserId(2), NotificationKind::Follow)
            .unwrap()
            .unwrap();
        emit(&mut w, UserId(1), UserId(2), NotificationKind::Follow).unwrap();

        let err = mark_read(&mut w, UserId(2), n.id).unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");

        mark_read(&mut w, UserId(1), n.id).unwrap();
        assert_eq!(unread_count(&w, UserId(1)).unwrap(), 1);
        assert_eq!(mark_all_read(&mut w, UserId(1)).unwrap(), 1);
        assert_eq!(unread_count(&w, UserId(1)).unwrap(), 0);
    }
}
