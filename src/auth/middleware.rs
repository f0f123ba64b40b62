//! Authentication extractors.
//!
//! The session token travels in an HTTP-only cookie; resolving it is a
//! read-only lookup in the in-memory [`crate::session::SessionRegistry`].

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::config::SESSION_DURATION_HOURS;
use crate::session::{Identity, ScriptPreference};
use crate::state::AppState;

pub const SESSION_COOKIE_NAME: &str = "session";

/// Authenticated request context.
/// Add this as a handler parameter to require authentication.
/// Redirects to /login if not authenticated.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub script: ScriptPreference,
    /// Raw session token, for handlers that mutate the session
    pub token: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        MaybeUser::from_request_parts(parts, state)
            .await
            .ok()
            .and_then(|MaybeUser(user)| user)
            .ok_or_else(|| Redirect::to("/login").into_response())
    }
}

/// Optional authentication extractor.
/// Use for pages that work both with and without authentication.
pub struct MaybeUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = jar.get(SESSION_COOKIE_NAME).map(|c| c.value().to_string()) else {
            return Ok(MaybeUser(None));
        };

        let user = match state.sessions.authenticate(Some(&token)) {
            Identity::User { user_id, script } => Some(AuthUser {
                user_id,
                script,
                token,
            }),
            Identity::Anonymous => None,
        };
        Ok(MaybeUser(user))
    }
}

/// Session cookie with the standard multi-day lifetime
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(SESSION_DURATION_HOURS))
        .build()
}

/// Expired cookie that clears the session on the client
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(0))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc".to_string());
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(168)));
    }

    #[test]
    fn test_removal_cookie_expires() {
        let cookie = removal_cookie();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }
}
