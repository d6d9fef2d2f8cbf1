//! User registration, profile edits and user views.

use tracing::debug;

use chirp_core::ServiceError;

use crate::counter;
use crate::model::{NewUser, ProfileUpdate, ProfileView, User, UserId, UserView};
use crate::store::{Records, Writer, seq};

pub const MAX_HANDLE: usize = 50;
pub const MAX_EMAIL: usize = 100;
pub const MAX_DISPLAY_NAME: usize = 100;
pub const MAX_LOCATION: usize = 100;
pub const MAX_WEBSITE: usize = 255;

fn check_len(field: &str, value: &str, max: usize) -> Result<(), ServiceError> {
    if value.chars().count() > max {
        return Err(ServiceError::InvalidArgument(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

pub fn validate_handle(handle: &str) -> Result<(), ServiceError> {
    if handle.is_empty() {
        return Err(ServiceError::InvalidArgument("handle must not be empty".into()));
    }
    check_len("handle", handle, MAX_HANDLE)?;
    if !handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ServiceError::InvalidArgument(format!(
            "handle '{handle}' may only contain letters, digits and underscores"
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ServiceError> {
    check_len("email", email, MAX_EMAIL)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ServiceError::InvalidArgument(format!("invalid email '{email}'"))),
    }
}

fn display_name(value: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidArgument("display name must not be blank".into()));
    }
    check_len("display name", trimmed, MAX_DISPLAY_NAME)?;
    Ok(trimmed.to_string())
}

/// Empty means "clear".
fn optional(field: &str, value: String, max: Option<usize>) -> Result<Option<String>, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if let Some(max) = max {
        check_len(field, trimmed, max)?;
    }
    Ok(Some(trimmed.to_string()))
}

pub fn register(w: &mut Writer<'_>, req: NewUser) -> Result<User, ServiceError> {
    let handle = req.handle.trim().to_string();
    let email = req.email.trim().to_string();
    validate_handle(&handle)?;
    validate_email(&email)?;
    let display_name = display_name(&req.display_name)?;
    let bio = req.bio.map(|b| optional("bio", b, None)).transpose()?.flatten();

    let now = w.now();
    let user = User {
        id: UserId(w.next_id(seq::USER)?),
        handle,
        email,
        display_name,
        bio,
        avatar_url: None,
        location: None,
        website: None,
        verified: false,
        created_at: now,
        updated_at: now,
    };
    w.insert_user(&user)?;
    debug!(user = %user.id, handle = %user.handle, "user registered");
    Ok(user)
}

/// Apply a partial update to the caller's own profile.
pub fn update(w: &mut Writer<'_>, caller: UserId, update: ProfileUpdate) -> Result<User, ServiceError> {
    let mut user = w.require_user(caller)?;
    if let Some(name) = update.display_name {
        user.display_name = display_name(&name)?;
    }
    if let Some(bio) = update.bio {
        user.bio = optional("bio", bio, None)?;
    }
    if let Some(location) = update.location {
        user.location = optional("location", location, Some(MAX_LOCATION))?;
    }
    if let Some(website) = update.website {
        user.website = optional("website", website, Some(MAX_WEBSITE))?;
    }
    if let Some(avatar) = update.avatar_url {
        user.avatar_url = optional("avatar url", avatar, None)?;
    }
    user.updated_at = w.now();
    w.save_user(&user)?;
    Ok(user)
}

pub fn view<R: Records + ?Sized>(r: &R, user: User) -> Result<UserView, ServiceError> {
    let counts = counter::user_counts(r, user.id)?;
    Ok(UserView { user, counts })
}

/// `user_id`'s profile as seen by `caller`.
pub fn profile<R: Records + ?Sized>(
    r: &R,
    caller: UserId,
    user_id: UserId,
) -> Result<ProfileView, ServiceError> {
    let user = r.require_user(user_id)?;
    let is_following = caller != user_id && r.is_following(caller, user_id)?;
    Ok(ProfileView {
        user: view(r, user)?,
        is_following,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::make_store;

    fn new_user(handle: &str, email: &str) -> NewUser {
        NewUser {
            handle: handle.into(),
            email: email.into(),
            display_name: "Someone".into(),
            bio: None,
        }
    }

    #[test]
    fn handle_rules() {
        assert!(validate_handle("john_doe42").is_ok());
        assert!(validate_handle("").is_err());
        assert!(validate_handle("has space").is_err());
        assert!(validate_handle("dash-ed").is_err());
        assert!(validate_handle(&"a".repeat(51)).is_err());
    }

    #[test]
    fn email_rules() {
        assert!(validate_email("a@b.io").is_ok());
        assert!(validate_email("nope").is_err());
        assert!(validate_email("@b.io").is_err());
        assert!(validate_email("a@").is_err());
    }

    #[test]
    fn register_assigns_ids_and_rejects_duplicates() {
        let (_dir, store) = make_store();
        let mut w = store.write().unwrap();
        let a = register(&mut w, new_user("alice", "alice@x.io")).unwrap();
        let b = register(&mut w, new_user("bob", "bob@x.io")).unwrap();
        assert_eq!(a.id, UserId(1));
        assert_eq!(b.id, UserId(2));
        w.commit().unwrap();

        let mut w = store.write().unwrap();
        let err = register(&mut w, new_user("ALICE", "other@x.io")).unwrap_err();
        assert_eq!(err.error_code(), "ALREADY_EXISTS");
    }

    #[test]
    fn update_is_partial_and_empty_clears() {
        let (_dir, store) = make_store();
        let mut w = store.write().unwrap();
        let mut req = new_user("alice", "alice@x.io");
        req.bio = Some("hello".into());
        let a = register(&mut w, req).unwrap();

        let updated = update(
            &mut w,
            a.id,
            ProfileUpdate {
                location: Some("Berlin".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("hello"));
        assert_eq!(updated.location.as_deref(), Some("Berlin"));

        let cleared = update(
            &mut w,
            a.id,
            ProfileUpdate {
                bio: Some(String::new()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(cleared.bio, None);
        assert_eq!(cleared.location.as_deref(), Some("Berlin"));

        let err = update(
            &mut w,
            a.id,
            ProfileUpdate {
                display_name: Some("   ".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn own_profile_is_never_following() {
        let (_dir, store) = make_store();
        let mut w = store.write().unwrap();
        let a = register(&mut w, new_user("alice", "alice@x.io")).unwrap();
        let p = profile(&w, a.id, a.id).unwrap();
        assert!(!p.is_following);
        assert_eq!(p.user.user.handle, "alice");
        assert_eq!(profile(&w, a.id, UserId(9)).unwrap_err().error_code(), "NOT_FOUND");
    }
}
