//! Caller identity extractor.
//!
//! The login service that shares the session table writes a [`CurrentUser`]
//! under [`session_keys::CURRENT_USER`]. `OptionalAuth` reads it back; a
//! missing session, missing key or unreadable payload all mean "no caller".

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::set_sentry_user;
use crate::models::{CurrentUser, session_keys};

/// Extractor that optionally gets the current caller.
///
/// Never rejects. Review mutations take the `Option` and let the service
/// decide, so the unauthenticated check stays ordered with the others.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(OptionalAuth(caller): OptionalAuth) -> impl IntoResponse {
///     match caller {
///         Some(user) => format!("Hello, {}!", user.user_id),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await))
    }
}

async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    // Set by SessionManagerLayer
    let session = parts.extensions.get::<Session>()?;

    let user = match session.get::<CurrentUser>(session_keys::CURRENT_USER).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable session; treating caller as anonymous");
            None
        }
    }?;

    set_sentry_user(&user.user_id);
    Some(user)
}
