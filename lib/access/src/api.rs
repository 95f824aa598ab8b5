//! The identity provider API consumed by the access core.
//!
//! Implementations own transport concerns (timeouts, retries, base URLs).
//! The core calls each operation at most once per authentication event.

use crate::error::IdentityApiError;
use crate::identity::AccessCredential;
use async_trait::async_trait;
use orggate_core::Result;
use serde::{Deserialize, Serialize};

/// Authoritative answer to "is this user a member of that organization?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Member,
    NotMember,
}

/// A team the user belongs to, and the organization that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group: String,
    pub organization: String,
}

impl GroupMembership {
    #[must_use]
    pub fn new(group: impl Into<String>, organization: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            organization: organization.into(),
        }
    }
}

/// Read operations against the identity provider.
///
/// Implementations must keep "not a member" and "could not find out" apart:
/// only a well-defined negative signal from the provider may map to
/// `Membership::NotMember`; everything else is an error.
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Checks whether `username` is a member of `organization`.
    async fn check_membership(
        &self,
        credential: &AccessCredential,
        username: &str,
        organization: &str,
    ) -> Result<Membership, IdentityApiError>;

    /// Lists every team the credential's owner belongs to, across all
    /// organizations.
    async fn list_group_memberships(
        &self,
        credential: &AccessCredential,
    ) -> Result<Vec<GroupMembership>, IdentityApiError>;
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scripted in-memory `IdentityApi` that counts calls.

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) enum MembershipReply {
        Member,
        NotMember,
        Fail,
    }

    pub(crate) struct FakeIdentityApi {
        membership: MembershipReply,
        teams: Option<Vec<GroupMembership>>,
        pub(crate) membership_calls: AtomicUsize,
        pub(crate) team_calls: AtomicUsize,
    }

    impl FakeIdentityApi {
        pub(crate) fn new(membership: MembershipReply) -> Self {
            Self {
                membership,
                teams: Some(Vec::new()),
                membership_calls: AtomicUsize::new(0),
                team_calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn with_teams(mut self, teams: Vec<GroupMembership>) -> Self {
            self.teams = Some(teams);
            self
        }

        /// Makes team listing fail.
        pub(crate) fn failing_teams(mut self) -> Self {
            self.teams = None;
            self
        }

        pub(crate) fn membership_calls(&self) -> usize {
            self.membership_calls.load(Ordering::SeqCst)
        }

        pub(crate) fn team_calls(&self) -> usize {
            self.team_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IdentityApi for FakeIdentityApi {
        async fn check_membership(
            &self,
            _credential: &AccessCredential,
            _username: &str,
            _organization: &str,
        ) -> Result<Membership, IdentityApiError> {
            self.membership_calls.fetch_add(1, Ordering::SeqCst);
            match self.membership {
                MembershipReply::Member => Ok(Membership::Member),
                MembershipReply::NotMember => Ok(Membership::NotMember),
                MembershipReply::Fail => Err(IdentityApiError::Transport {
                    reason: "connection reset".to_string(),
                }
                .into()),
            }
        }

        async fn list_group_memberships(
            &self,
            _credential: &AccessCredential,
        ) -> Result<Vec<GroupMembership>, IdentityApiError> {
            self.team_calls.fetch_add(1, Ordering::SeqCst);
            match &self.teams {
                Some(teams) => Ok(teams.clone()),
                None => Err(IdentityApiError::UnexpectedStatus {
                    operation: "team listing".to_string(),
                    status: 502,
                }
                .into()),
            }
        }
    }
}
