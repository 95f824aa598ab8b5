//! Identity types produced by the provider and by authorization.
//!
//! An [`Identity`] is what the provider says about the user. It is never
//! mutated; authorization wraps it in an [`AuthorizedIdentity`] that may carry
//! a role set.

use crate::role::ResolvedRoleSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The authenticated user's profile as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-assigned identifier, opaque to us.
    id: String,
    /// Login name; used for the organization membership check.
    username: String,
    display_name: Option<String>,
    /// Verified email addresses, primary first.
    emails: Vec<String>,
}

impl Identity {
    /// Creates an identity with no display name and no emails.
    #[must_use]
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            display_name: None,
            emails: Vec::new(),
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: Option<String>) -> Self {
        self.display_name = display_name;
        self
    }

    /// Sets the verified email addresses.
    #[must_use]
    pub fn with_emails(mut self, emails: Vec<String>) -> Self {
        self.emails = emails;
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    #[must_use]
    pub fn emails(&self) -> &[String] {
        &self.emails
    }
}

/// An identity that passed authorization.
///
/// `roles` is `None` when no organization gate is configured, meaning the
/// role concept is not in use. `Some` with an empty set means the user was
/// authorized and holds zero roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedIdentity {
    identity: Identity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    roles: Option<ResolvedRoleSet>,
}

impl AuthorizedIdentity {
    /// Wraps an identity without a role set.
    #[must_use]
    pub fn without_roles(identity: Identity) -> Self {
        Self {
            identity,
            roles: None,
        }
    }

    /// Wraps an identity together with its resolved roles.
    #[must_use]
    pub fn with_roles(identity: Identity, roles: ResolvedRoleSet) -> Self {
        Self {
            identity,
            roles: Some(roles),
        }
    }

    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Returns the resolved roles, or `None` when roles are not in use.
    #[must_use]
    pub fn roles(&self) -> Option<&ResolvedRoleSet> {
        self.roles.as_ref()
    }

    /// Returns true if the identity holds the given role label.
    ///
    /// Role labels compare exactly; only group names are case-insensitive.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.as_ref().is_some_and(|r| r.contains(role))
    }
}

/// Bearer token obtained from the OAuth code exchange.
///
/// Scoped to one authentication event. It is not serializable and its
/// `Debug` output is redacted so it cannot leak into sessions or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessCredential(String);

impl AccessCredential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token for use in an `Authorization` header.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessCredential(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn johnny() -> Identity {
        Identity::new("1337", "JohnnyDeveloper")
            .with_display_name(Some("Johnny Developer".to_string()))
            .with_emails(vec!["JohnnyDeveloper@example.net".to_string()])
    }

    #[test]
    fn identity_exposes_profile_fields() {
        let identity = johnny();
        assert_eq!(identity.id(), "1337");
        assert_eq!(identity.username(), "JohnnyDeveloper");
        assert_eq!(identity.display_name(), Some("Johnny Developer"));
        assert_eq!(identity.emails(), ["JohnnyDeveloper@example.net"]);
    }

    #[test]
    fn absent_roles_differ_from_empty_roles() {
        let none = AuthorizedIdentity::without_roles(johnny());
        let empty = AuthorizedIdentity::with_roles(johnny(), ResolvedRoleSet::default());
        assert!(none.roles().is_none());
        assert_eq!(empty.roles().map(ResolvedRoleSet::len), Some(0));
        assert_ne!(none, empty);
    }

    #[test]
    fn has_role_is_exact_match() {
        let authorized = AuthorizedIdentity::with_roles(
            johnny(),
            ResolvedRoleSet::from_labels(["Developer".to_string()]),
        );
        assert!(authorized.has_role("Developer"));
        assert!(!authorized.has_role("developer"));
    }

    #[test]
    fn unset_roles_are_omitted_from_json() {
        let json = serde_json::to_value(AuthorizedIdentity::without_roles(johnny()))
            .expect("serialize");
        assert!(json.get("roles").is_none());
    }

    #[test]
    fn credential_debug_is_redacted() {
        let credential = AccessCredential::new("gho_secret");
        assert!(!format!("{credential:?}").contains("gho_secret"));
        assert_eq!(credential.secret(), "gho_secret");
    }
}
