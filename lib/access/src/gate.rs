//! Routing contract for requests that arrive without a session.
//!
//! The host wraps every route except the login endpoint in authentication
//! middleware. For an unauthenticated request the middleware asks
//! [`AuthEndpoints::gate`] what to do.

use crate::error::ConfigError;
use orggate_core::Result;
use serde::Deserialize;

/// Paths of the login and callback endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthEndpoints {
    /// Starts the OAuth flow. Must never sit behind authentication.
    #[serde(default = "default_login_path")]
    login_path: String,
    /// Receives the provider redirect and completes authentication.
    #[serde(default = "default_callback_path")]
    callback_path: String,
}

fn default_login_path() -> String {
    "/auth/login".to_string()
}

fn default_callback_path() -> String {
    "/auth/callback".to_string()
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            callback_path: default_callback_path(),
        }
    }
}

/// What the middleware should do with an unauthenticated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    /// Let the request through so the callback can complete the login.
    CompleteCallback,
    /// The login endpoint was wrapped by authentication. This is a
    /// programming error in the host's router.
    LoginWrapped,
    /// Send the client to the login endpoint.
    RedirectToLogin,
}

impl AuthEndpoints {
    #[must_use]
    pub fn new(login_path: impl Into<String>, callback_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
            callback_path: callback_path.into(),
        }
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn callback_path(&self) -> &str {
        &self.callback_path
    }

    /// Checks that both paths can be mounted as routes.
    ///
    /// Each must be an absolute path other than `/`, free of route
    /// parameters and wildcards, and the two must differ.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEndpoint` naming the offending path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for path in [&self.login_path, &self.callback_path] {
            let reason = if !path.starts_with('/') {
                "must start with '/'"
            } else if path == "/" {
                "must not be the root path"
            } else if path.contains(['{', '}', '*', '?', '#']) {
                "must be a literal path"
            } else {
                continue;
            };
            return Err(ConfigError::InvalidEndpoint {
                path: path.clone(),
                reason: reason.to_string(),
            }
            .into());
        }

        if self.login_path == self.callback_path {
            return Err(ConfigError::InvalidEndpoint {
                path: self.login_path.clone(),
                reason: "login and callback paths must differ".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Classifies an unauthenticated request path.
    ///
    /// Matching is by prefix. The callback is checked first so that a
    /// callback nested under the login path still completes.
    #[must_use]
    pub fn gate(&self, path: &str) -> GateAction {
        if path.starts_with(&self.callback_path) {
            GateAction::CompleteCallback
        } else if path.starts_with(&self.login_path) {
            GateAction::LoginWrapped
        } else {
            GateAction::RedirectToLogin
        }
    }
}
