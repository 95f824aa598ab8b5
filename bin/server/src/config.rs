//! Centralized server configuration.
//!
//! Loaded via the `config` crate from an optional `orggate.toml` (override
//! the path with `ORGGATE_CONFIG`) and from environment variables such as
//! `ORGGATE_GITHUB__CLIENT_ID`. Role maps are easiest to express in the file.
//!
//! See [`GithubConfig`] for the OAuth app settings and [`StrategyConfig`]
//! for the organization gate and role map.

use crate::error::StartupError;
use axum_extra::extract::cookie::Key;
use base64::Engine;
use orggate_access::{AuthEndpoints, StrategyConfig};
use orggate_github::GithubConfig;
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// GitHub OAuth app and API client configuration.
    pub github: GithubConfig,

    /// Organization gate, role map and default roles.
    #[serde(default)]
    pub auth: StrategyConfig,

    /// Login and callback paths.
    #[serde(default)]
    pub endpoints: AuthEndpoints,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session duration in minutes. Roles are re-resolved only on the next
    /// login, so this bounds how long a removed team member keeps a role.
    #[serde(default = "default_session_duration_minutes")]
    pub duration_minutes: i64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,

    /// Base64-encoded key (at least 64 bytes) for encrypting session
    /// cookies. Without it a random key is generated and sessions do not
    /// survive a restart.
    #[serde(default)]
    pub cookie_key: Option<String>,
}

fn default_session_duration_minutes() -> i64 {
    480
}

/// Longest accepted session: 30 days.
const MAX_SESSION_MINUTES: i64 = 30 * 24 * 60;

fn default_secure_cookies() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_minutes: default_session_duration_minutes(),
            secure_cookies: default_secure_cookies(),
            cookie_key: None,
        }
    }
}

impl SessionConfig {
    /// Returns the validated session lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error unless `duration_minutes` is between one minute and
    /// 30 days.
    pub fn session_duration(&self) -> Result<chrono::Duration, StartupError> {
        let minutes = self.duration_minutes;
        if !(1..=MAX_SESSION_MINUTES).contains(&minutes) {
            return Err(StartupError::SessionDuration(format!(
                "{minutes} minutes is outside 1..={MAX_SESSION_MINUTES}"
            )));
        }
        chrono::Duration::try_minutes(minutes).ok_or_else(|| {
            StartupError::SessionDuration(format!("{minutes} minutes overflows"))
        })
    }

    /// Returns the cookie encryption key.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured key is not valid base64 or is
    /// shorter than 64 bytes.
    pub fn cookie_key(&self) -> Result<Key, StartupError> {
        let Some(encoded) = &self.cookie_key else {
            tracing::warn!("no session cookie key configured; generating an ephemeral one");
            return Ok(Key::generate());
        };

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| StartupError::CookieKey(format!("not valid base64: {e}")))?;
        Key::try_from(bytes.as_slice())
            .map_err(|e| StartupError::CookieKey(format!("unusable key: {e}")))
    }
}

impl ServerConfig {
    /// Loads configuration from the optional file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var("ORGGATE_CONFIG").unwrap_or_else(|_| "orggate.toml".to_string());

        config::Config::builder()
            .add_source(config::File::with_name(&path).required(false))
            .add_source(
                config::Environment::with_prefix("ORGGATE")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.default_roles")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
