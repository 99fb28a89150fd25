//! Configuration model: role definitions and the fluent builder
//!
//! An [`AclConfig`] maps role identifiers to [`RoleDefinition`]s and
//! optionally names a default role for subjects that carry no roles of their
//! own. Configurations are immutable once installed: every write path in the
//! engine clones the current value, mutates the clone, and swaps it in
//! atomically.
//!
//! Construction always passes through [`AclConfig::validated`], which walks
//! the structure field by field. The walk doubles as schema validation:
//! unexpected shapes (empty role set, dangling default role, malformed
//! identifiers) are rejected up front rather than surfacing mid-query.

use crate::error::{AuthzError, Result};
use crate::validate::validate_identifier;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Permissions a role holds, keyed by resource.
///
/// `BTreeSet` collapses duplicate permissions and keeps externally observable
/// iteration deterministic.
pub type GrantMap = HashMap<String, BTreeSet<String>>;

/// A named bundle of permissions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Resource → permission set
    #[serde(default)]
    pub grants: GrantMap,
}

impl RoleDefinition {
    /// Create an empty role definition
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a description
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Allow the given permissions on a resource.
    ///
    /// Chaining `allow` for the same resource unions into the existing set;
    /// duplicates collapse.
    pub fn allow<I, S>(mut self, resource: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grants
            .entry(resource.into())
            .or_default()
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    /// Validate every identifier in this definition.
    ///
    /// Empty permission sets are legal: "no permissions" and "resource not
    /// mentioned" are equivalent for queries.
    pub(crate) fn validate(&self) -> Result<()> {
        for (resource, permissions) in &self.grants {
            validate_identifier(resource, "resource")?;
            for permission in permissions {
                validate_identifier(permission, "permission")?;
            }
        }
        Ok(())
    }
}

/// A validated authorization configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AclConfig {
    pub(crate) roles: HashMap<String, RoleDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) default_role: Option<String>,
}

impl AclConfig {
    /// Start a fluent builder
    pub fn builder() -> AclBuilder {
        AclBuilder::new()
    }

    /// Build a configuration from parts, validating the whole structure.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError::InvalidConfig`] when the role set is empty or
    /// the default role does not resolve, and [`AuthzError::InvalidInput`]
    /// for any malformed identifier.
    pub fn validated(
        roles: HashMap<String, RoleDefinition>,
        default_role: Option<String>,
    ) -> Result<Self> {
        if roles.is_empty() {
            return Err(AuthzError::InvalidConfig(
                "configuration must define at least one role".to_string(),
            ));
        }

        for (name, definition) in &roles {
            validate_identifier(name, "role")?;
            definition.validate()?;
        }

        if let Some(default) = &default_role {
            validate_identifier(default, "default role")?;
            if !roles.contains_key(default) {
                return Err(AuthzError::InvalidConfig(format!(
                    "default role '{default}' is not defined"
                )));
            }
        }

        Ok(Self {
            roles,
            default_role,
        })
    }

    /// Look up a role definition
    pub fn role(&self, name: &str) -> Option<&RoleDefinition> {
        self.roles.get(name)
    }

    /// All defined role names
    pub fn role_names(&self) -> Vec<String> {
        self.roles.keys().cloned().collect()
    }

    /// The configured default role, if any
    pub fn default_role(&self) -> Option<&str> {
        self.default_role.as_deref()
    }

    /// Number of defined roles
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Whether the configuration defines no roles (never true for a
    /// validated configuration)
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Fluent constructor for [`AclConfig`]
///
/// # Example
///
/// ```
/// use rolegate::{AclConfig, RoleDefinition};
///
/// let config = AclConfig::builder()
///     .role(
///         "ADMIN",
///         RoleDefinition::new()
///             .describe("Full product access")
///             .allow("Products", ["CREATE", "READ", "UPDATE", "DELETE"]),
///     )
///     .role("CLIENT", RoleDefinition::new().allow("Products", ["READ"]))
///     .default_role("CLIENT")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.default_role(), Some("CLIENT"));
/// ```
#[derive(Debug, Default)]
pub struct AclBuilder {
    roles: HashMap<String, RoleDefinition>,
    default_role: Option<String>,
}

impl AclBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a role definition
    pub fn role(mut self, name: impl Into<String>, definition: RoleDefinition) -> Self {
        self.roles.insert(name.into(), definition);
        self
    }

    /// Name the default role used for subjects without roles
    pub fn default_role(mut self, name: impl Into<String>) -> Self {
        self.default_role = Some(name.into());
        self
    }

    /// Validate and emit the configuration
    ///
    /// # Errors
    ///
    /// Same contract as [`AclConfig::validated`].
    pub fn build(self) -> Result<AclConfig> {
        AclConfig::validated(self.roles, self.default_role)
    }
}
