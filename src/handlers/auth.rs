use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;
use tracing::info;

use crate::config::SessionConfig;
use crate::middleware::auth::session_token;
use crate::service::ports::CredentialVerifier;
use crate::types::{LoginRequest, ProfileReply, SignUpRequest};
use crate::{ProfileError, router::ProfileState};

const LOGGED_IN_MESSAGE: &str = "로그인되었습니다.";
const LOGGED_OUT_MESSAGE: &str = "로그아웃되었습니다.";

/// POST /auth/signup
pub async fn sign_up(
    State(state): State<ProfileState>,
    Json(req): Json<SignUpRequest>,
) -> Result<ProfileReply, ProfileError> {
    state
        .auth
        .sign_up(&req.email, &req.nickname, &req.password)
        .await
}

/// POST /auth/login -> sets the session cookie.
pub async fn login(
    State(state): State<ProfileState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ProfileError> {
    let session = state.auth.login(&req.email, &req.password).await?;
    let jar = jar.add(build_session_cookie(&state.session, session.token));
    Ok((jar, ProfileReply::ok(LOGGED_IN_MESSAGE)))
}

/// POST /auth/logout -> revokes the session and clears the cookie.
pub async fn logout(State(state): State<ProfileState>, jar: CookieJar) -> Response {
    if let Ok(token) = session_token(&jar, &state.session.cookie_name) {
        let email = state.auth.token_to_email(&token).await.ok();
        if let Err(e) = state.auth.logout(&token).await {
            return (jar, e.into_response()).into_response();
        }
        info!(email = email.as_deref().unwrap_or("<expired>"), "session closed");
    }
    let jar = jar.remove(clear_session_cookie(&state.session));
    (jar, ProfileReply::ok(LOGGED_OUT_MESSAGE)).into_response()
}

fn build_session_cookie(cfg: &SessionConfig, token: String) -> Cookie<'static> {
    Cookie::build((cfg.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(!cfg.insecure_cookie)
        .same_site(SameSite::Lax)
        .max_age(Duration::hours(cfg.ttl_hours))
        .build()
}

fn clear_session_cookie(cfg: &SessionConfig) -> Cookie<'static> {
    Cookie::build((cfg.cookie_name.clone(), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}
