//! Error types for the access crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `IdentityApiError`: failures talking to the identity provider
//! - `AuthenticationError`: an authentication event could not be decided
//! - `ConfigError`: malformed strategy or role-map configuration
//!
//! An authoritative "not a member" answer is not an error; it is
//! `Decision::Denied`.

use std::fmt;

/// Errors from calls to the identity provider API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityApiError {
    /// The request never produced an HTTP response (connect, TLS, timeout).
    Transport { reason: String },
    /// The provider answered with a status that carries no defined meaning
    /// for the operation.
    UnexpectedStatus { operation: String, status: u16 },
    /// The response body could not be decoded.
    Decode { operation: String, reason: String },
    /// The request could not be built (bad base URL, bad header value).
    InvalidRequest { reason: String },
}

impl fmt::Display for IdentityApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { reason } => {
                write!(f, "identity API transport failure: {reason}")
            }
            Self::UnexpectedStatus { operation, status } => {
                write!(f, "identity API returned status {status} for {operation}")
            }
            Self::Decode { operation, reason } => {
                write!(f, "failed to decode {operation} response: {reason}")
            }
            Self::InvalidRequest { reason } => {
                write!(f, "invalid identity API request: {reason}")
            }
        }
    }
}

impl std::error::Error for IdentityApiError {}

/// Errors that prevent an authentication event from being decided.
///
/// These are non-authoritative: the user may well be a member, we just
/// could not find out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// The organization membership check failed.
    MembershipCheckFailed { organization: String },
    /// Listing the user's teams failed.
    GroupListingFailed,
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MembershipCheckFailed { organization } => {
                write!(f, "could not verify membership in organization '{organization}'")
            }
            Self::GroupListingFailed => write!(f, "could not list team memberships"),
        }
    }
}

impl std::error::Error for AuthenticationError {}

/// Errors from validating configuration at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A role label in the role map is empty.
    EmptyRoleLabel,
    /// The same role label is configured twice.
    DuplicateRole { role: String },
    /// A role lists an empty group name.
    EmptyGroupName { role: String },
    /// A role lists the same group twice (compared case-insensitively).
    DuplicateGroup { role: String, group: String },
    /// A login or callback path cannot be used as a route.
    InvalidEndpoint { path: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRoleLabel => write!(f, "role map contains an empty role label"),
            Self::DuplicateRole { role } => write!(f, "role '{role}' is configured twice"),
            Self::EmptyGroupName { role } => {
                write!(f, "role '{role}' lists an empty group name")
            }
            Self::DuplicateGroup { role, group } => {
                write!(f, "role '{role}' lists group '{group}' more than once")
            }
            Self::InvalidEndpoint { path, reason } => {
                write!(f, "endpoint path '{path}' {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_status_names_operation_and_status() {
        let err = IdentityApiError::UnexpectedStatus {
            operation: "membership check".to_string(),
            status: 401,
        };
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("membership check"));
    }

    #[test]
    fn membership_check_failed_names_organization() {
        let err = AuthenticationError::MembershipCheckFailed {
            organization: "Acme".to_string(),
        };
        assert!(err.to_string().contains("Acme"));
    }

    #[test]
    fn duplicate_group_display() {
        let err = ConfigError::DuplicateGroup {
            role: "admin".to_string(),
            group: "Admins".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "role 'admin' lists group 'Admins' more than once"
        );
    }
}
