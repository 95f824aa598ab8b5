//! Organization membership gate.

use crate::api::{IdentityApi, Membership};
use crate::error::IdentityApiError;
use crate::identity::AccessCredential;
use rootcause::Report;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Outcome of an organization membership check.
#[derive(Debug)]
pub enum Decision {
    /// The user is a member, or no organization is required.
    Allowed,
    /// The provider authoritatively reported that the user is not a member.
    Denied(Denial),
    /// Membership could not be determined. Not a denial.
    Failed(Report<IdentityApiError>),
}

impl Decision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// An authoritative rejection for lack of organization membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    organization: String,
}

impl Denial {
    #[must_use]
    pub fn new(organization: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
        }
    }

    #[must_use]
    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// User-facing explanation of the denial.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "User is not a member of the {} organization.",
            self.organization
        )
    }
}

/// Decides whether an identity belongs to a required organization.
#[derive(Clone)]
pub struct OrgAuthorizer {
    api: Arc<dyn IdentityApi>,
}

impl OrgAuthorizer {
    #[must_use]
    pub fn new(api: Arc<dyn IdentityApi>) -> Self {
        Self { api }
    }

    /// Checks `username` against `organization`.
    ///
    /// An absent or blank organization allows everyone without calling the
    /// API.
    #[instrument(skip(self, credential))]
    pub async fn authorize(
        &self,
        username: &str,
        credential: &AccessCredential,
        organization: Option<&str>,
    ) -> Decision {
        let Some(organization) = organization.map(str::trim).filter(|o| !o.is_empty()) else {
            return Decision::Allowed;
        };

        match self
            .api
            .check_membership(credential, username, organization)
            .await
        {
            Ok(Membership::Member) => {
                debug!("organization membership confirmed");
                Decision::Allowed
            }
            Ok(Membership::NotMember) => {
                debug!("organization membership denied");
                Decision::Denied(Denial::new(organization))
            }
            Err(report) => Decision::Failed(report),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{FakeIdentityApi, MembershipReply};

    fn authorizer(reply: MembershipReply) -> (Arc<FakeIdentityApi>, OrgAuthorizer) {
        let api = Arc::new(FakeIdentityApi::new(reply));
        (api.clone(), OrgAuthorizer::new(api))
    }

    #[tokio::test]
    async fn no_organization_allows_without_api_call() {
        let (api, authorizer) = authorizer(MembershipReply::Fail);
        let credential = AccessCredential::new("anything");

        for organization in [None, Some(""), Some("   ")] {
            let decision = authorizer.authorize("dev1", &credential, organization).await;
            assert!(decision.is_allowed());
        }
        assert_eq!(api.membership_calls(), 0);
    }

    #[tokio::test]
    async fn member_is_allowed() {
        let (api, authorizer) = authorizer(MembershipReply::Member);
        let decision = authorizer
            .authorize("dev1", &AccessCredential::new("t"), Some("Acme"))
            .await;
        assert!(decision.is_allowed());
        assert_eq!(api.membership_calls(), 1);
    }

    #[tokio::test]
    async fn non_member_is_denied_with_message() {
        let (_, authorizer) = authorizer(MembershipReply::NotMember);
        let decision = authorizer
            .authorize("dev1", &AccessCredential::new("t"), Some("Acme"))
            .await;
        match decision {
            Decision::Denied(denial) => {
                assert_eq!(denial.organization(), "Acme");
                assert_eq!(
                    denial.message(),
                    "User is not a member of the Acme organization."
                );
            }
            other => panic!("expected denial, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_error_fails_rather_than_denies() {
        let (_, authorizer) = authorizer(MembershipReply::Fail);
        let decision = authorizer
            .authorize("dev1", &AccessCredential::new("t"), Some("Acme"))
            .await;
        match decision {
            Decision::Failed(report) => {
                assert!(report.to_string().contains("connection reset"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
