//! GitHub OAuth web flow using the oauth2 crate.

use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use orggate_access::AccessCredential;
use orggate_github::GithubConfig;
use std::fmt;

type ConfiguredClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// OAuth client for GitHub's authorization code flow.
pub struct GithubOAuthClient {
    client: ConfiguredClient,
    http: reqwest::Client,
    scopes: Vec<String>,
}

impl GithubOAuthClient {
    /// Creates the client, validating the configured URLs.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::Configuration` if a URL is invalid.
    pub fn new(config: &GithubConfig) -> Result<Self, OAuthError> {
        let auth_url = AuthUrl::new(config.authorize_url().to_string())
            .map_err(|e| OAuthError::Configuration(format!("invalid authorize URL: {e}")))?;
        let token_url = TokenUrl::new(config.token_url().to_string())
            .map_err(|e| OAuthError::Configuration(format!("invalid token URL: {e}")))?;
        let redirect_url = RedirectUrl::new(config.callback_url().to_string())
            .map_err(|e| OAuthError::Configuration(format!("invalid callback URL: {e}")))?;

        let client = BasicClient::new(ClientId::new(config.client_id().to_string()))
            .set_client_secret(ClientSecret::new(config.client_secret().to_string()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);

        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| {
                OAuthError::Configuration(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            http,
            scopes: config.scopes().into_iter().map(str::to_string).collect(),
        })
    }

    /// Generates the authorization URL and the CSRF token to remember.
    pub fn authorization_url(&self) -> (String, String) {
        let mut auth_request = self.client.authorize_url(CsrfToken::new_random);
        for scope in &self.scopes {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }

        let (auth_url, csrf_token) = auth_request.url();
        (auth_url.to_string(), csrf_token.secret().clone())
    }

    /// Exchanges the authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<AccessCredential, OAuthError> {
        let token_response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| OAuthError::TokenExchange(format!("token exchange failed: {e}")))?;

        Ok(AccessCredential::new(
            token_response.access_token().secret().clone(),
        ))
    }
}

/// OAuth flow errors.
#[derive(Debug)]
pub enum OAuthError {
    /// Invalid URLs or HTTP client setup.
    Configuration(String),
    /// Token exchange failed.
    TokenExchange(String),
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "OAuth configuration error: {msg}"),
            Self::TokenExchange(msg) => write!(f, "OAuth token exchange error: {msg}"),
        }
    }
}

impl std::error::Error for OAuthError {}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(oauth_host: &str) -> GithubConfig {
        GithubConfig::builder(
            "THE_CLIENT_ID".to_string(),
            "THE_CLIENT_SECRET".to_string(),
            "https://www.example.net/auth/callback".to_string(),
        )
        .oauth_host(oauth_host)
        .build()
    }

    #[test]
    fn authorization_url_carries_client_scopes_and_state() {
        let client = GithubOAuthClient::new(&config("https://github.com")).expect("client");
        let (url, csrf) = client.authorization_url();

        assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
        assert!(url.contains("client_id=THE_CLIENT_ID"));
        assert!(url.contains("scope=user%3Aemail+read%3Aorg"));
        assert!(url.contains(&format!("state={csrf}")));
        assert!(!csrf.is_empty());
    }

    #[test]
    fn each_authorization_url_has_fresh_state() {
        let client = GithubOAuthClient::new(&config("https://github.com")).expect("client");
        let (_, first) = client.authorization_url();
        let (_, second) = client.authorization_url();
        assert_ne!(first, second);
    }

    #[test]
    fn invalid_callback_url_is_rejected() {
        let config = GithubConfig::new(
            "id".to_string(),
            "secret".to_string(),
            "not a url".to_string(),
        );
        assert!(matches!(
            GithubOAuthClient::new(&config),
            Err(OAuthError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn exchange_code_returns_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .and(body_string_contains("code=THE_CODE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "THE_ACCESS_TOKEN",
                "token_type": "bearer",
                "scope": "user:email,read:org"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GithubOAuthClient::new(&config(&server.uri())).expect("client");
        let credential = client.exchange_code("THE_CODE").await.expect("token");

        assert_eq!(credential.secret(), "THE_ACCESS_TOKEN");
    }

    #[tokio::test]
    async fn exchange_code_surfaces_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "The code passed is incorrect or expired."
            })))
            .mount(&server)
            .await;

        let client = GithubOAuthClient::new(&config(&server.uri())).expect("client");
        let result = client.exchange_code("STALE_CODE").await;

        assert!(matches!(result, Err(OAuthError::TokenExchange(_))));
    }
}
