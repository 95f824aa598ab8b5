//! Team-to-role mapping.
//!
//! Roles are application-defined labels. A [`RoleMapConfig`] says which
//! teams grant which role; it is compiled once into a [`TeamRoleIndex`]
//! keyed by lower-cased team name. Resolution filters the user's teams to the
//! required organization, collects every mapped role, appends the default
//! roles and removes duplicates while keeping first-occurrence order.

use crate::api::{GroupMembership, IdentityApi};
use crate::error::{ConfigError, IdentityApiError};
use crate::identity::AccessCredential;
use orggate_core::Result;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

/// One role label and the teams that grant it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
    role: String,
    groups: Vec<String>,
}

impl RoleGrant {
    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }
}

/// Declarative mapping from role label to the teams that grant it.
///
/// Grant order is preserved; it decides the order in which roles granted by
/// the same team appear in a resolved set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoleMapConfig {
    grants: Vec<RoleGrant>,
}

impl RoleMapConfig {
    /// Builds and validates a role map from `(role, teams)` pairs.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for empty labels or team names, a role listed
    /// twice, or a team listed twice under the same role.
    pub fn new<I, R, G, S>(grants: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (R, G)>,
        R: Into<String>,
        G: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let grants = grants
            .into_iter()
            .map(|(role, groups)| RoleGrant {
                role: role.into(),
                groups: groups.into_iter().map(Into::into).collect(),
            })
            .collect();
        Ok(Self::validated(grants)?)
    }

    fn validated(grants: Vec<RoleGrant>) -> std::result::Result<Self, ConfigError> {
        let mut roles = HashSet::new();
        for grant in &grants {
            if grant.role.trim().is_empty() {
                return Err(ConfigError::EmptyRoleLabel);
            }
            if !roles.insert(grant.role.as_str()) {
                return Err(ConfigError::DuplicateRole {
                    role: grant.role.clone(),
                });
            }

            let mut groups = HashSet::new();
            for group in &grant.groups {
                if group.trim().is_empty() {
                    return Err(ConfigError::EmptyGroupName {
                        role: grant.role.clone(),
                    });
                }
                if !groups.insert(group.to_lowercase()) {
                    return Err(ConfigError::DuplicateGroup {
                        role: grant.role.clone(),
                        group: group.clone(),
                    });
                }
            }
        }
        Ok(Self { grants })
    }

    #[must_use]
    pub fn grants(&self) -> &[RoleGrant] {
        &self.grants
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

impl<'de> Deserialize<'de> for RoleMapConfig {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct GrantsVisitor;

        impl<'de> Visitor<'de> for GrantsVisitor {
            type Value = Vec<RoleGrant>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of role labels to lists of team names")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut grants = Vec::new();
                while let Some((role, groups)) = map.next_entry::<String, Vec<String>>()? {
                    grants.push(RoleGrant { role, groups });
                }
                Ok(grants)
            }
        }

        let grants = deserializer.deserialize_map(GrantsVisitor)?;
        Self::validated(grants).map_err(de::Error::custom)
    }
}

/// Lookup from lower-cased team name to the role labels it grants.
///
/// A team listed under several roles appears once, with all of its roles in
/// configuration order.
#[derive(Debug, Clone, Default)]
pub struct TeamRoleIndex {
    roles_by_group: HashMap<String, Vec<String>>,
}

impl TeamRoleIndex {
    /// Compiles a role map. Linear in the total number of listed teams.
    #[must_use]
    pub fn build(config: &RoleMapConfig) -> Self {
        let mut roles_by_group: HashMap<String, Vec<String>> = HashMap::new();
        for grant in &config.grants {
            for group in &grant.groups {
                roles_by_group
                    .entry(group.to_lowercase())
                    .or_default()
                    .push(grant.role.clone());
            }
        }
        Self { roles_by_group }
    }

    /// Returns the roles granted by a team, matched case-insensitively.
    #[must_use]
    pub fn roles_for(&self, group: &str) -> &[String] {
        self.roles_by_group
            .get(&group.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of distinct teams in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roles_by_group.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles_by_group.is_empty()
    }

    /// Resolves team memberships into roles.
    ///
    /// Memberships owned by any organization other than `organization`
    /// (compared case-insensitively) are ignored. Teams missing from the
    /// index contribute nothing.
    #[must_use]
    pub fn resolve(
        &self,
        memberships: &[GroupMembership],
        organization: &str,
        default_roles: &[String],
    ) -> ResolvedRoleSet {
        let organization = organization.to_lowercase();
        let mapped = memberships
            .iter()
            .filter(|m| m.organization.to_lowercase() == organization)
            .flat_map(|m| self.roles_for(&m.group).iter().cloned());

        ResolvedRoleSet::from_labels(mapped.chain(default_roles.iter().cloned()))
    }
}

/// Deduplicated role labels in first-occurrence order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ResolvedRoleSet {
    roles: Vec<String>,
}

impl ResolvedRoleSet {
    /// Collects labels, keeping only the first occurrence of each.
    #[must_use]
    pub fn from_labels(labels: impl IntoIterator<Item = String>) -> Self {
        let mut seen = HashSet::new();
        let roles = labels
            .into_iter()
            .filter(|label| seen.insert(label.clone()))
            .collect();
        Self { roles }
    }

    #[must_use]
    pub fn contains(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.roles
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl From<Vec<String>> for ResolvedRoleSet {
    fn from(labels: Vec<String>) -> Self {
        Self::from_labels(labels)
    }
}

impl From<ResolvedRoleSet> for Vec<String> {
    fn from(set: ResolvedRoleSet) -> Self {
        set.roles
    }
}

/// Resolves the roles of an authorized identity.
///
/// Built once from configuration and shared read-only across events.
#[derive(Debug, Clone)]
pub struct RoleMapper {
    index: Option<TeamRoleIndex>,
    default_roles: Vec<String>,
}

impl RoleMapper {
    /// Creates a mapper. Without a role map every identity receives exactly
    /// the default roles.
    #[must_use]
    pub fn new(role_map: Option<&RoleMapConfig>, default_roles: Vec<String>) -> Self {
        Self {
            index: role_map.map(TeamRoleIndex::build),
            default_roles,
        }
    }

    #[must_use]
    pub fn has_role_map(&self) -> bool {
        self.index.is_some()
    }

    #[must_use]
    pub fn default_roles(&self) -> &[String] {
        &self.default_roles
    }

    /// Resolves roles for the credential's owner within `organization`.
    ///
    /// Without a role map this returns the default roles exactly as
    /// configured, duplicates included, and makes no API call. Otherwise it
    /// lists the user's teams exactly once.
    ///
    /// # Errors
    ///
    /// Propagates the API error if team listing fails.
    pub async fn resolve_for(
        &self,
        api: &dyn IdentityApi,
        credential: &AccessCredential,
        organization: &str,
    ) -> Result<ResolvedRoleSet, IdentityApiError> {
        let Some(index) = &self.index else {
            return Ok(ResolvedRoleSet {
                roles: self.default_roles.clone(),
            });
        };

        let memberships = api.list_group_memberships(credential).await?;
        let roles = index.resolve(&memberships, organization, &self.default_roles);
        debug!(
            teams = memberships.len(),
            roles = ?roles.as_slice(),
            "resolved roles from team memberships"
        );
        Ok(roles)
    }
}
