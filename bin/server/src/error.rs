//! Error types for the server's startup path and its auth routes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use orggate_access::{AuthenticationError, IdentityApiError, Rejection};
use rootcause::Report;
use std::fmt;

/// Failures while building application state from configuration.
#[derive(Debug)]
pub enum StartupError {
    /// The session cookie key could not be used.
    CookieKey(String),
    /// The session lifetime is out of range.
    SessionDuration(String),
    /// The login or callback path cannot be routed.
    Endpoints(String),
    /// The OAuth client could not be configured.
    OAuth(String),
    /// The GitHub API client could not be configured.
    GithubClient,
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CookieKey(reason) => write!(f, "invalid session cookie key: {reason}"),
            Self::SessionDuration(reason) => write!(f, "invalid session duration: {reason}"),
            Self::Endpoints(reason) => write!(f, "invalid auth endpoints: {reason}"),
            Self::OAuth(reason) => write!(f, "invalid OAuth configuration: {reason}"),
            Self::GithubClient => write!(f, "failed to configure the GitHub API client"),
        }
    }
}

impl std::error::Error for StartupError {}

/// Failures while completing a login.
#[derive(Debug)]
pub enum AuthError {
    /// The callback arrived without the state cookie set by the login route.
    MissingAuthState,
    /// The callback's `state` parameter did not match the cookie.
    CsrfMismatch,
    /// GitHub redirected back with an error instead of a code.
    ProviderError(String),
    /// The authorization code could not be exchanged for a token.
    TokenExchange(String),
    /// The authenticated user's profile could not be loaded.
    ProfileLoad(Report<IdentityApiError>),
    /// The organization gate refused the user.
    Rejected(Rejection),
    /// The organization gate could not reach a decision.
    Failed(Report<AuthenticationError>),
    /// The session could not be serialized into its cookie.
    Session(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::MissingAuthState => (StatusCode::BAD_REQUEST, "Missing auth state").into_response(),
            Self::CsrfMismatch => (StatusCode::BAD_REQUEST, "CSRF token mismatch").into_response(),
            Self::ProviderError(error) => {
                tracing::info!(%error, "authorization was not granted");
                (StatusCode::UNAUTHORIZED, "Authorization was not granted").into_response()
            }
            Self::TokenExchange(msg) => {
                tracing::error!("Token exchange failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed").into_response()
            }
            Self::ProfileLoad(report) => {
                tracing::error!("Profile load failed: {}", report);
                (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed").into_response()
            }
            Self::Rejected(rejection) => {
                (StatusCode::FORBIDDEN, rejection.message().to_string()).into_response()
            }
            Self::Failed(report) => {
                tracing::error!("Authorization failed: {}", report);
                (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed").into_response()
            }
            Self::Session(msg) => {
                tracing::error!("Session error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
