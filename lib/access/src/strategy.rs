//! Post-exchange authentication strategy.
//!
//! Runs after the host has exchanged the authorization code for an access
//! credential and loaded the provider profile. The pipeline is sequential:
//! membership check, then (only if allowed) team listing. Dropping the
//! returned future abandons any in-flight call and nothing partial is kept.

use crate::api::IdentityApi;
use crate::error::AuthenticationError;
use crate::identity::{AccessCredential, AuthorizedIdentity, Identity};
use crate::org::{Decision, Denial, OrgAuthorizer};
use crate::role::{RoleMapConfig, RoleMapper};
use orggate_core::AuthEventId;
use rootcause::Report;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Authorization settings for the strategy.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrategyConfig {
    /// Organization the user must belong to. Absent or blank disables the
    /// gate and role resolution.
    #[serde(default)]
    organization: Option<String>,
    /// Role label to team names. Requires `organization`.
    #[serde(default)]
    roles: Option<RoleMapConfig>,
    /// Roles granted to every authorized identity.
    #[serde(default)]
    default_roles: Vec<String>,
}

impl StrategyConfig {
    /// A configuration with no organization gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    #[must_use]
    pub fn with_roles(mut self, roles: RoleMapConfig) -> Self {
        self.roles = Some(roles);
        self
    }

    #[must_use]
    pub fn with_default_roles(mut self, default_roles: Vec<String>) -> Self {
        self.default_roles = default_roles;
        self
    }

    /// Returns the required organization, treating blank as absent.
    #[must_use]
    pub fn organization(&self) -> Option<&str> {
        self.organization
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
    }

    #[must_use]
    pub fn roles(&self) -> Option<&RoleMapConfig> {
        self.roles.as_ref()
    }

    #[must_use]
    pub fn default_roles(&self) -> &[String] {
        &self.default_roles
    }
}

/// Result of one authentication event.
#[derive(Debug)]
pub enum AuthOutcome {
    /// The identity is authorized. Roles are attached when an organization
    /// gate is configured.
    Accepted(AuthorizedIdentity),
    /// The identity was authoritatively refused.
    Rejected(Rejection),
    /// The event could not be decided. Carries full diagnostics for the
    /// server log; never show them to the end user.
    Failed(Report<AuthenticationError>),
}

/// A user-facing rejection reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    message: String,
}

impl Rejection {
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<Denial> for Rejection {
    fn from(denial: Denial) -> Self {
        Self {
            message: denial.message(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Authorizes identities and attaches their roles.
pub struct AuthenticationStrategy {
    organization: Option<String>,
    authorizer: OrgAuthorizer,
    mapper: RoleMapper,
    api: Arc<dyn IdentityApi>,
}

impl AuthenticationStrategy {
    /// Builds the strategy from validated configuration.
    ///
    /// A role map configured without an organization has no teams to scope
    /// it; it is ignored with a warning and sessions carry no roles.
    pub fn new(config: &StrategyConfig, api: Arc<dyn IdentityApi>) -> Self {
        let organization = config.organization().map(str::to_string);
        let roles = match (&organization, config.roles()) {
            (None, Some(_)) => {
                warn!("role map ignored: no organization configured");
                None
            }
            (_, roles) => roles,
        };

        Self {
            organization,
            authorizer: OrgAuthorizer::new(api.clone()),
            mapper: RoleMapper::new(roles, config.default_roles().to_vec()),
            api,
        }
    }

    #[must_use]
    pub fn organization(&self) -> Option<&str> {
        self.organization.as_deref()
    }

    /// Decides one authentication event.
    ///
    /// Makes at most one membership call and at most one team listing call.
    #[instrument(
        skip_all,
        fields(event = %AuthEventId::new(), username = %identity.username())
    )]
    pub async fn on_authenticated(
        &self,
        credential: &AccessCredential,
        identity: Identity,
    ) -> AuthOutcome {
        let Some(organization) = self.organization.as_deref() else {
            info!("accepted without organization gate");
            return AuthOutcome::Accepted(AuthorizedIdentity::without_roles(identity));
        };

        match self
            .authorizer
            .authorize(identity.username(), credential, Some(organization))
            .await
        {
            Decision::Allowed => {}
            Decision::Denied(denial) => {
                info!(organization, "rejected: not an organization member");
                return AuthOutcome::Rejected(denial.into());
            }
            Decision::Failed(report) => {
                warn!(organization, error = %report, "membership check failed");
                return AuthOutcome::Failed(report.context(
                    AuthenticationError::MembershipCheckFailed {
                        organization: organization.to_string(),
                    },
                ));
            }
        }

        match self
            .mapper
            .resolve_for(self.api.as_ref(), credential, organization)
            .await
        {
            Ok(roles) => {
                info!(roles = ?roles.as_slice(), "accepted");
                AuthOutcome::Accepted(AuthorizedIdentity::with_roles(identity, roles))
            }
            Err(report) => {
                warn!(error = %report, "team listing failed");
                AuthOutcome::Failed(report.context(AuthenticationError::GroupListingFailed))
            }
        }
    }
}
