//! Authentication for the orggate server.
//!
//! This module provides:
//! - The GitHub OAuth web flow (login, callback, logout routes)
//! - Encrypted cookie sessions carrying the authorized identity
//! - The middleware that keeps unauthenticated requests out
//!
//! # Authorization Model
//!
//! Whether a user may log in at all is decided once, in the callback, by the
//! organization gate. Roles resolved from the user's teams are embedded in
//! the session, so team changes take effect on the next login or when the
//! session expires.

pub mod middleware;
pub mod oauth;
pub mod routes;

use crate::config::{ServerConfig, SessionConfig};
use crate::app::RESERVED_PATHS;
use crate::error::StartupError;
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use orggate_access::{AuthEndpoints, AuthenticationStrategy};
use orggate_core::Result;
use orggate_github::GithubClient;
use std::sync::Arc;

pub use middleware::{RequireSession, require_session};
pub use oauth::{GithubOAuthClient, OAuthError};
pub use routes::{callback, login, logout};

/// Everything the auth routes need, shared across requests.
pub struct AuthContext {
    pub strategy: AuthenticationStrategy,
    pub github: GithubClient,
    pub oauth: GithubOAuthClient,
    pub endpoints: AuthEndpoints,
    pub session_config: SessionConfig,
    /// Validated lifetime of new sessions.
    pub session_duration: chrono::Duration,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthContext>,
    cookie_key: Key,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

impl AppState {
    /// Creates application state from its parts.
    pub fn new(auth: AuthContext, cookie_key: Key) -> Self {
        Self {
            auth: Arc::new(auth),
            cookie_key,
        }
    }

    /// Builds the API client, OAuth client and strategy from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any part of the configuration is unusable.
    pub fn from_config(config: ServerConfig) -> Result<Self, StartupError> {
        let cookie_key = config.session.cookie_key()?;
        let session_duration = config.session.session_duration()?;
        check_endpoints(&config.endpoints)?;

        let github = GithubClient::new(&config.github)
            .map_err(|report| report.context(StartupError::GithubClient))?;
        let oauth = GithubOAuthClient::new(&config.github)
            .map_err(|e| StartupError::OAuth(e.to_string()))?;
        let strategy = AuthenticationStrategy::new(&config.auth, Arc::new(github.clone()));

        match strategy.organization() {
            Some(organization) => tracing::info!(organization, "organization gate enabled"),
            None => tracing::warn!("no organization configured; any GitHub user may log in"),
        }

        Ok(Self::new(
            AuthContext {
                strategy,
                github,
                oauth,
                endpoints: config.endpoints,
                session_config: config.session,
                session_duration,
            },
            cookie_key,
        ))
    }
}

/// Rejects login or callback paths the router cannot mount.
fn check_endpoints(endpoints: &AuthEndpoints) -> Result<(), StartupError> {
    endpoints
        .validate()
        .map_err(|report| StartupError::Endpoints(report.to_string()))?;
    for path in [endpoints.login_path(), endpoints.callback_path()] {
        if RESERVED_PATHS.contains(&path) {
            return Err(StartupError::Endpoints(format!(
                "endpoint path '{path}' is already routed by the application"
            ))
            .into());
        }
    }
    Ok(())
}
