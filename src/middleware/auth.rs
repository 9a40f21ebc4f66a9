use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;

use crate::error::ProfileError;
use crate::router::ProfileState;

/// Read the session cookie named by `session.cookie_name`.
/// Requests without one are rejected before any lookup happens.
pub fn session_token(jar: &CookieJar, cookie_name: &str) -> Result<String, ProfileError> {
    jar.get(cookie_name)
        .map(|c| c.value().trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or(ProfileError::MissingSession)
}

/// Opaque session token taken from the request cookie.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

impl FromRequestParts<ProfileState> for SessionToken {
    type Rejection = ProfileError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ProfileState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        session_token(&jar, &state.session.cookie_name).map(Self)
    }
}
