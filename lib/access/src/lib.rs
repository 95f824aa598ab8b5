//! Organization gate and team-to-role mapping for orggate.
//!
//! This crate holds the authorization core that runs after an OAuth code
//! exchange:
//! - [`OrgAuthorizer`]: is the identity a member of the required organization?
//! - [`RoleMapper`]: which application roles do the identity's teams grant?
//! - [`AuthenticationStrategy`]: ties both together per authentication event
//! - [`IdentityApi`]: the provider operations the core consumes
//!
//! Transport, token exchange and session storage belong to the host.
//!
//! # Example
//!
//! ```
//! use orggate_access::{GroupMembership, RoleMapConfig, TeamRoleIndex};
//!
//! let roles = RoleMapConfig::new([
//!     ("admin", vec!["Admins"]),
//!     ("developer", vec!["Developers", "Admins"]),
//! ])
//! .expect("valid role map");
//! let index = TeamRoleIndex::build(&roles);
//!
//! let memberships = vec![GroupMembership::new("Developers", "Acme")];
//! let resolved = index.resolve(&memberships, "acme", &["user".to_string()]);
//!
//! assert_eq!(resolved.as_slice(), ["developer", "user"]);
//! ```

pub mod api;
pub mod error;
pub mod gate;
pub mod identity;
pub mod org;
pub mod role;
pub mod session;
pub mod strategy;

pub use api::{GroupMembership, IdentityApi, Membership};
pub use error::{AuthenticationError, ConfigError, IdentityApiError};
pub use gate::{AuthEndpoints, GateAction};
pub use identity::{AccessCredential, AuthorizedIdentity, Identity};
pub use org::{Decision, Denial, OrgAuthorizer};
pub use role::{ResolvedRoleSet, RoleGrant, RoleMapConfig, RoleMapper, TeamRoleIndex};
pub use session::Session;
pub use strategy::{AuthOutcome, AuthenticationStrategy, Rejection, StrategyConfig};
