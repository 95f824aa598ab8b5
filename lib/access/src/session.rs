//! Sessions for authorized identities.
//!
//! A session is created after a successful authentication event and carries
//! the authorized identity unchanged. The host decides where it lives; the
//! server keeps it in an encrypted cookie.

use chrono::{DateTime, Duration, Utc};
use orggate_core::SessionId;
use serde::{Deserialize, Serialize};

use crate::identity::AuthorizedIdentity;
use crate::role::ResolvedRoleSet;

/// An authenticated browser session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    identity: AuthorizedIdentity,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session valid for `duration` from now.
    #[must_use]
    pub fn new(identity: AuthorizedIdentity, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            identity,
            created_at: now,
            expires_at: now + duration,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn identity(&self) -> &AuthorizedIdentity {
        &self.identity
    }

    /// Returns the roles attached at login, if roles are in use.
    #[must_use]
    pub fn roles(&self) -> Option<&ResolvedRoleSet> {
        self.identity.roles()
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.identity.has_role(role)
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}
