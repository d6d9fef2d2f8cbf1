mod notifications;
mod tweets;
mod users;

use std::sync::Arc;

use axum::Router;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use chirp_core::{IdentityResolver, ServiceError};

use crate::model::UserId;
use crate::service::SocialService;

pub struct ApiState {
    pub service: Arc<SocialService>,
    pub identity: Arc<dyn IdentityResolver>,
}

pub(crate) type AppState = Arc<ApiState>;

/// The authenticated caller, resolved by the injected `IdentityResolver`.
pub struct Caller(pub UserId);

impl FromRequestParts<AppState> for Caller {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let raw = state.identity.resolve(&parts.headers)?;
        raw.parse::<u64>()
            .map(|id| Caller(UserId(id)))
            .map_err(|_| ServiceError::Unauthenticated(format!("caller id '{raw}' is not a user id")))
    }
}

/// Build the complete social module router.
///
/// Routes:
/// - `POST   /users`                        register
/// - `GET    /users/search?q=`              search users
/// - `GET    /users/{id}`                   profile
/// - `GET    /users/{id}/tweets`            user's top-level tweets
/// - `POST   /users/{id}/follow`            follow
/// - `DELETE /users/{id}/follow`            unfollow
/// - `GET    /me`                           caller's own profile
/// - `PUT    /me/profile`                   edit profile
/// - `POST   /tweets`                       create tweet or reply
/// - `GET    /tweets/search?q=`             search tweets
/// - `GET    /tweets/{id}`                  tweet with replies
/// - `DELETE /tweets/{id}`                  delete own tweet
/// - `POST   /tweets/{id}/like`             like
/// - `DELETE /tweets/{id}/like`             unlike
/// - `GET    /timeline`                     primary timeline
/// - `GET    /notifications`                inbox
/// - `GET    /notifications/unread-count`   unread count
/// - `PUT    /notifications/read-all`       mark all read
/// - `PUT    /notifications/{id}/read`      mark one read
pub fn router(service: Arc<SocialService>, identity: Arc<dyn IdentityResolver>) -> Router {
    let state = Arc::new(ApiState { service, identity });
    Router::new()
        .merge(users::router())
        .merge(tweets::router())
        .merge(notifications::router())
        .with_state(state)
}
