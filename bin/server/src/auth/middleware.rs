//! Authentication middleware and extractors for Axum.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;
use orggate_access::{GateAction, Session};

use super::AppState;
use super::routes::SESSION_COOKIE;

/// Lets requests with a live session through and routes the rest.
///
/// Without a session, the callback path passes through so the login can
/// complete, the login path is a wiring error, and everything else is
/// redirected to the login path.
pub async fn require_session(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(session) = current_session(&jar) {
        request.extensions_mut().insert(session);
        return next.run(request).await;
    }

    let endpoints = &state.auth.endpoints;
    match endpoints.gate(request.uri().path()) {
        GateAction::CompleteCallback => next.run(request).await,
        GateAction::LoginWrapped => {
            tracing::error!(
                path = request.uri().path(),
                "login endpoint is behind the authentication middleware"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login endpoint should not be authenticated",
            )
                .into_response()
        }
        GateAction::RedirectToLogin => Redirect::to(endpoints.login_path()).into_response(),
    }
}

fn current_session(jar: &PrivateCookieJar) -> Option<Session> {
    let cookie = jar.get(SESSION_COOKIE)?;
    match serde_json::from_str::<Session>(cookie.value()) {
        Ok(session) if !session.is_expired() => Some(session),
        Ok(session) => {
            tracing::debug!(session = %session.id(), "session expired");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable session cookie");
            None
        }
    }
}

/// Extractor for the session that [`require_session`] attached.
pub struct RequireSession(pub Session);

impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(RequireSession)
            .ok_or(AuthRejection::MissingMiddleware)
    }
}

/// Rejection type for [`RequireSession`].
#[derive(Debug)]
pub enum AuthRejection {
    /// The route is not behind [`require_session`], or the request reached
    /// it through the callback pass-through.
    MissingMiddleware,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::MissingMiddleware => {
                tracing::error!("session extractor used without authentication middleware");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
