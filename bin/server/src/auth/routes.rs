//! Authentication routes for login, callback, and logout.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use orggate_access::{AuthOutcome, Session};
use serde::Deserialize;
use time::Duration as TimeDuration;
use tracing::instrument;

use super::AppState;
use crate::error::AuthError;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "session";

/// Auth state cookie name (for CSRF protection during the OAuth flow).
pub const AUTH_STATE_COOKIE: &str = "auth_state";

/// Query parameters GitHub sends to the callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Starts the OAuth flow by redirecting to GitHub.
pub async fn login(State(state): State<AppState>, jar: PrivateCookieJar) -> impl IntoResponse {
    let (auth_url, csrf_token) = state.auth.oauth.authorization_url();

    let cookie = Cookie::build((AUTH_STATE_COOKIE, csrf_token))
        .path("/")
        .http_only(true)
        .secure(state.auth.session_config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(10));

    (jar.add(cookie), Redirect::to(&auth_url))
}

/// Completes the OAuth flow: exchanges the code, loads the profile, runs the
/// organization gate and stores the session.
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, AuthError> {
    if let Some(error) = query.error {
        return Err(AuthError::ProviderError(error));
    }

    let expected = jar
        .get(AUTH_STATE_COOKIE)
        .ok_or(AuthError::MissingAuthState)?;
    if query.state.as_deref() != Some(expected.value()) {
        return Err(AuthError::CsrfMismatch);
    }
    let code = query
        .code
        .ok_or_else(|| AuthError::ProviderError("no authorization code".to_string()))?;

    let credential = state
        .auth
        .oauth
        .exchange_code(&code)
        .await
        .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

    let identity = state
        .auth
        .github
        .fetch_identity(&credential)
        .await
        .map_err(AuthError::ProfileLoad)?;

    let authorized = match state.auth.strategy.on_authenticated(&credential, identity).await {
        AuthOutcome::Accepted(authorized) => authorized,
        AuthOutcome::Rejected(rejection) => return Err(AuthError::Rejected(rejection)),
        AuthOutcome::Failed(report) => return Err(AuthError::Failed(report)),
    };

    let duration = state.auth.session_duration;
    let session = Session::new(authorized, duration);
    let session_json =
        serde_json::to_string(&session).map_err(|e| AuthError::Session(e.to_string()))?;
    tracing::info!(session = %session.id(), "session created");

    let session_cookie = Cookie::build((SESSION_COOKIE, session_json))
        .path("/")
        .http_only(true)
        .secure(state.auth.session_config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::seconds(duration.num_seconds()));

    let jar = jar
        .remove(Cookie::build(AUTH_STATE_COOKIE).path("/"))
        .add(session_cookie);

    Ok((jar, Redirect::to("/")))
}

/// Logs out by dropping the session cookie.
pub async fn logout(jar: PrivateCookieJar) -> impl IntoResponse {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        "Logged out",
    )
}
