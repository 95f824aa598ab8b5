//! GitHub REST API client.

use crate::config::GithubConfig;
use async_trait::async_trait;
use orggate_access::{
    AccessCredential, GroupMembership, Identity, IdentityApi, IdentityApiError, Membership,
};
use orggate_core::Result;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, LINK};
use reqwest::{Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, instrument};

const GITHUB_JSON: &str = "application/vnd.github+json";

/// Teams per page requested from `/user/teams`.
const TEAMS_PER_PAGE: &str = "100";

/// Upper bound on `/user/teams` pages read for one listing.
const MAX_TEAM_PAGES: usize = 100;

/// Client for the GitHub endpoints used during authentication.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_url: Url,
    max_retries: u32,
}

#[derive(Debug, Deserialize)]
struct TeamPayload {
    name: String,
    organization: OrganizationPayload,
}

#[derive(Debug, Deserialize)]
struct OrganizationPayload {
    login: String,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: u64,
    login: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmailPayload {
    email: String,
    #[serde(default)]
    primary: bool,
    #[serde(default)]
    verified: bool,
}

impl GithubClient {
    /// Creates a client from configuration.
    ///
    /// Redirects are not followed: GitHub answers some membership checks
    /// with a 302, which must surface as an error rather than be chased.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the API URL or user agent is invalid.
    pub fn new(config: &GithubConfig) -> Result<Self, IdentityApiError> {
        let api_url = Url::parse(config.api_url()).map_err(|e| IdentityApiError::InvalidRequest {
            reason: format!("invalid API URL '{}': {e}", config.api_url()),
        })?;
        if api_url.cannot_be_a_base() {
            return Err(IdentityApiError::InvalidRequest {
                reason: format!("API URL '{}' cannot be a base", config.api_url()),
            }
            .into());
        }

        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(config.timeout_secs()))
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| IdentityApiError::InvalidRequest {
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            api_url,
            max_retries: config.max_retries(),
        })
    }

    /// Loads the credential owner's profile and verified email addresses.
    ///
    /// # Errors
    ///
    /// Fails if either request fails or returns a non-success status.
    #[instrument(skip_all)]
    pub async fn fetch_identity(
        &self,
        credential: &AccessCredential,
    ) -> Result<Identity, IdentityApiError> {
        let user: UserPayload = self
            .get_json(credential, self.endpoint(&["user"]), "profile")
            .await?;
        let mut emails: Vec<EmailPayload> = self
            .get_json(credential, self.endpoint(&["user", "emails"]), "email listing")
            .await?;

        emails.retain(|e| e.verified);
        emails.sort_by_key(|e| !e.primary);

        debug!(login = %user.login, emails = emails.len(), "loaded profile");
        Ok(Identity::new(user.id.to_string(), user.login)
            .with_display_name(user.name)
            .with_emails(emails.into_iter().map(|e| e.email).collect()))
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        // Checked in `new`: the base URL can always take path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn check_next_page(
        &self,
        url: &Url,
        visited: &HashSet<Url>,
    ) -> Result<(), IdentityApiError> {
        let reason = if url.origin() != self.api_url.origin() {
            format!("next page link leaves the API origin: {}", url.origin().ascii_serialization())
        } else if visited.contains(url) {
            format!("next page link repeats {url}")
        } else if visited.len() >= MAX_TEAM_PAGES {
            format!("more than {MAX_TEAM_PAGES} pages")
        } else {
            return Ok(());
        };

        Err(IdentityApiError::Decode {
            operation: "team listing".to_string(),
            reason,
        }
        .into())
    }

    async fn get(
        &self,
        credential: &AccessCredential,
        url: &Url,
    ) -> Result<Response, IdentityApiError> {
        let mut attempt = 0;
        loop {
            let sent = self
                .http
                .get(url.clone())
                .header(AUTHORIZATION, format!("token {}", credential.secret()))
                .header(ACCEPT, GITHUB_JSON)
                .send()
                .await;

            match sent {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.max_retries && (e.is_connect() || e.is_timeout()) => {
                    attempt += 1;
                    debug!(attempt, error = %e, "retrying GitHub request");
                }
                Err(e) => {
                    return Err(IdentityApiError::Transport {
                        reason: e.to_string(),
                    }
                    .into());
                }
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        credential: &AccessCredential,
        url: Url,
        operation: &str,
    ) -> Result<T, IdentityApiError> {
        let response = self.get(credential, &url).await?;
        Ok(Self::decode(response, operation).await?.0)
    }

    /// Checks the status and decodes the body, returning the next page link
    /// alongside.
    async fn decode<T: DeserializeOwned>(
        response: Response,
        operation: &str,
    ) -> Result<(T, Option<Url>), IdentityApiError> {
        let status = response.status();
        debug!(operation, status = status.as_u16(), "GitHub response");
        if !status.is_success() {
            return Err(IdentityApiError::UnexpectedStatus {
                operation: operation.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let next = next_page(response.headers());
        let body = response
            .json::<T>()
            .await
            .map_err(|e| IdentityApiError::Decode {
                operation: operation.to_string(),
                reason: e.to_string(),
            })?;
        Ok((body, next))
    }
}

/// Extracts the `rel="next"` target from a `Link` header.
fn next_page(headers: &HeaderMap) -> Option<Url> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        let is_next = params.split(';').any(|p| p.trim() == r#"rel="next""#);
        if !is_next {
            return None;
        }
        let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        Url::parse(target).ok()
    })
}

#[async_trait]
impl IdentityApi for GithubClient {
    /// Only 204 (member) and 404 (not a member) are authoritative. Anything
    /// else, including the 302 GitHub sends when the requester cannot see
    /// the organization's members, is an error.
    #[instrument(skip(self, credential))]
    async fn check_membership(
        &self,
        credential: &AccessCredential,
        username: &str,
        organization: &str,
    ) -> Result<Membership, IdentityApiError> {
        let url = self.endpoint(&["orgs", organization, "members", username]);
        let response = self.get(credential, &url).await?;
        let status = response.status();
        debug!(status = status.as_u16(), "membership check response");

        match status {
            StatusCode::NO_CONTENT => Ok(Membership::Member),
            StatusCode::NOT_FOUND => Ok(Membership::NotMember),
            other => Err(IdentityApiError::UnexpectedStatus {
                operation: "membership check".to_string(),
                status: other.as_u16(),
            }
            .into()),
        }
    }

    /// Follows `Link` pagination until every team has been read.
    ///
    /// Next links must stay on the API origin, may not repeat, and are
    /// followed for at most `MAX_TEAM_PAGES` pages.
    #[instrument(skip_all)]
    async fn list_group_memberships(
        &self,
        credential: &AccessCredential,
    ) -> Result<Vec<GroupMembership>, IdentityApiError> {
        let mut url = self.endpoint(&["user", "teams"]);
        url.query_pairs_mut().append_pair("per_page", TEAMS_PER_PAGE);

        let mut memberships = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(url);
        while let Some(url) = next {
            self.check_next_page(&url, &visited)?;
            let response = self.get(credential, &url).await?;
            let (page, following): (Vec<TeamPayload>, _) =
                Self::decode(response, "team listing").await?;
            memberships.extend(
                page.into_iter()
                    .map(|t| GroupMembership::new(t.name, t.organization.login)),
            );
            visited.insert(url);
            next = following;
        }

        debug!(teams = memberships.len(), "listed team memberships");
        Ok(memberships)
    }
}
