//! GitHub OAuth application and REST API configuration.
//!
//! Fields with defaults can be omitted when loading from environment
//! variables. Point the URLs at a GitHub Enterprise Server instance to use
//! one instead of github.com.

use serde::{Deserialize, Serialize};

/// Configuration for the GitHub OAuth app and the REST API client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// The OAuth app's client ID.
    client_id: String,
    /// The OAuth app's client secret.
    client_secret: String,
    /// Where GitHub redirects after authorization
    /// (e.g., "https://app.example.com/auth/callback").
    callback_url: String,
    /// OAuth scopes as a comma-separated string.
    /// Default: "user:email,read:org"
    #[serde(default = "default_scopes")]
    scopes: String,
    /// REST API base URL. Default: "https://api.github.com"
    #[serde(default = "default_api_url")]
    api_url: String,
    #[serde(default = "default_authorize_url")]
    authorize_url: String,
    #[serde(default = "default_token_url")]
    token_url: String,
    /// User-Agent sent with every API request. GitHub rejects requests
    /// without one.
    #[serde(default = "default_user_agent")]
    user_agent: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    /// How many times a request is re-sent after a connection failure or
    /// timeout. HTTP error statuses are never retried.
    #[serde(default)]
    max_retries: u32,
}

fn default_scopes() -> String {
    "user:email,read:org".to_string()
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_authorize_url() -> String {
    "https://github.com/login/oauth/authorize".to_string()
}

fn default_token_url() -> String {
    "https://github.com/login/oauth/access_token".to_string()
}

fn default_user_agent() -> String {
    concat!("orggate/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl GithubConfig {
    /// Creates a configuration with defaults for optional fields.
    #[must_use]
    pub fn new(client_id: String, client_secret: String, callback_url: String) -> Self {
        GithubConfigBuilder::new(client_id, client_secret, callback_url).build()
    }

    /// Creates a configuration builder for more customization.
    #[must_use]
    pub fn builder(
        client_id: String,
        client_secret: String,
        callback_url: String,
    ) -> GithubConfigBuilder {
        GithubConfigBuilder::new(client_id, client_secret, callback_url)
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    #[must_use]
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    /// Returns the OAuth scopes, parsed from the comma-separated string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    #[must_use]
    pub fn authorize_url(&self) -> &str {
        &self.authorize_url
    }

    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    #[must_use]
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

/// Builder for `GithubConfig`.
#[derive(Debug)]
pub struct GithubConfigBuilder {
    client_id: String,
    client_secret: String,
    callback_url: String,
    scopes: Vec<String>,
    api_url: String,
    authorize_url: String,
    token_url: String,
    user_agent: String,
    timeout_secs: u64,
    max_retries: u32,
}

impl GithubConfigBuilder {
    /// Creates a new builder with required fields.
    #[must_use]
    pub fn new(client_id: String, client_secret: String, callback_url: String) -> Self {
        Self {
            client_id,
            client_secret,
            callback_url,
            scopes: default_scopes().split(',').map(str::to_string).collect(),
            api_url: default_api_url(),
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
        }
    }

    /// Adds a scope unless it is already requested.
    #[must_use]
    pub fn add_scope(mut self, scope: String) -> Self {
        if !self.scopes.contains(&scope) {
            self.scopes.push(scope);
        }
        self
    }

    #[must_use]
    pub fn api_url(mut self, url: String) -> Self {
        self.api_url = url;
        self
    }

    /// Points both OAuth endpoints at a different host, keeping GitHub's
    /// paths.
    #[must_use]
    pub fn oauth_host(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.authorize_url = format!("{base}/login/oauth/authorize");
        self.token_url = format!("{base}/login/oauth/access_token");
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    #[must_use]
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn build(self) -> GithubConfig {
        GithubConfig {
            client_id: self.client_id,
            client_secret: self.client_secret,
            callback_url: self.callback_url,
            scopes: self.scopes.join(","),
            api_url: self.api_url,
            authorize_url: self.authorize_url,
            token_url: self.token_url,
            user_agent: self.user_agent,
            timeout_secs: self.timeout_secs,
            max_retries: self.max_retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> GithubConfigBuilder {
        GithubConfig::builder(
            "THE_CLIENT_ID".to_string(),
            "THE_CLIENT_SECRET".to_string(),
            "https://www.example.net/auth/callback".to_string(),
        )
    }

    #[test]
    fn new_config_has_defaults() {
        let config = builder().build();

        assert_eq!(config.client_id(), "THE_CLIENT_ID");
        assert_eq!(config.scopes(), vec!["user:email", "read:org"]);
        assert_eq!(config.api_url(), "https://api.github.com");
        assert_eq!(
            config.token_url(),
            "https://github.com/login/oauth/access_token"
        );
        assert!(config.user_agent().starts_with("orggate/"));
        assert_eq!(config.timeout_secs(), 10);
        assert_eq!(config.max_retries(), 0);
    }

    #[test]
    fn builder_add_scope_does_not_duplicate() {
        let config = builder()
            .add_scope("read:org".to_string())
            .add_scope("repo".to_string())
            .build();

        assert_eq!(config.scopes(), vec!["user:email", "read:org", "repo"]);
    }

    #[test]
    fn oauth_host_rewrites_both_endpoints() {
        let config = builder().oauth_host("https://ghe.example.com/").build();
        assert_eq!(
            config.authorize_url(),
            "https://ghe.example.com/login/oauth/authorize"
        );
        assert_eq!(
            config.token_url(),
            "https://ghe.example.com/login/oauth/access_token"
        );
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let json = r#"{
            "client_id": "id",
            "client_secret": "secret",
            "callback_url": "https://app.example.com/auth/callback"
        }"#;

        let config: GithubConfig = serde_json::from_str(json).expect("deserialize");

        assert_eq!(config.scopes(), vec!["user:email", "read:org"]);
        assert_eq!(config.authorize_url(), "https://github.com/login/oauth/authorize");
        assert_eq!(config.timeout_secs(), 10);
    }

    #[test]
    fn scopes_tolerate_whitespace() {
        let json = r#"{
            "client_id": "id",
            "client_secret": "secret",
            "callback_url": "https://app.example.com/auth/callback",
            "scopes": "user:email, read:org, "
        }"#;

        let config: GithubConfig = serde_json::from_str(json).expect("deserialize");
        assert_eq!(config.scopes(), vec!["user:email", "read:org"]);
    }
}
