//! Authorization facade
//!
//! [`AccessControl`] is the public surface of the engine: role checks, user
//! checks, dynamic grant/revoke, role add/remove, hierarchy installation,
//! and cache control.
//!
//! Error posture follows the split the engine is built around: mutation
//! entry points expect well-formed callers and propagate errors; the
//! security-sensitive read paths ([`AccessControl::user_can`],
//! [`AccessControl::evaluate_policy`], the request guard) catch everything
//! internally and resolve to denial.
//!
//! Every write clones the live configuration, mutates the clone, swaps it in
//! atomically, invalidates the decision cache, and emits one audit record.

use crate::audit::{AuditAction, AuditEntry, AuditSink, LogAuditSink};
use crate::cache::{CacheOptions, CacheStats, DecisionCache};
use crate::config::{AclConfig, RoleDefinition};
use crate::engine::{PolicyDecision, PolicyRequest, ResolutionEngine};
use crate::error::{AuthzError, Result};
use crate::hierarchy::RoleHierarchy;
use crate::validate::validate_identifier;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Engine construction options
#[derive(Clone, Default)]
pub struct AclOptions {
    /// Decision cache tuning
    pub cache: CacheOptions,

    /// Raise on unknown-role queries instead of denying silently
    pub strict: bool,

    /// Audit destination; defaults to [`LogAuditSink`]
    pub audit: Option<Arc<dyn AuditSink>>,
}

/// A user record carrying its assigned roles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Optional caller identifier, used only for logging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Roles assigned to the user
    #[serde(default)]
    pub roles: Vec<String>,
}

/// The subject of a user-level check: either a bare role list or a user
/// record exposing one.
///
/// The two variants are explicit, not duck-typed: callers state which shape
/// they hold and the engine resolves it with a type check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subject {
    /// A raw list of role identifiers
    Roles(Vec<String>),

    /// A user record carrying a role list
    User(UserRecord),
}

impl Subject {
    fn roles(&self) -> &[String] {
        match self {
            Subject::Roles(roles) => roles,
            Subject::User(user) => &user.roles,
        }
    }
}

impl From<Vec<String>> for Subject {
    fn from(roles: Vec<String>) -> Self {
        Subject::Roles(roles)
    }
}

impl From<Vec<&str>> for Subject {
    fn from(roles: Vec<&str>) -> Self {
        Subject::Roles(roles.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for Subject {
    fn from(roles: &[&str]) -> Self {
        Subject::Roles(roles.iter().map(|r| r.to_string()).collect())
    }
}

impl From<UserRecord> for Subject {
    fn from(user: UserRecord) -> Self {
        Subject::User(user)
    }
}

impl<T: Into<Subject>> From<Option<T>> for Subject {
    /// An absent subject is the empty role list (default-deny, or the
    /// configured default role)
    fn from(subject: Option<T>) -> Self {
        subject.map(Into::into).unwrap_or(Subject::Roles(Vec::new()))
    }
}

/// Public authorization surface
pub struct AccessControl {
    engine: ResolutionEngine,
    audit: Arc<dyn AuditSink>,
}

impl AccessControl {
    /// Create an access-control instance over a validated configuration.
    ///
    /// Configuration invariants (non-empty role set, resolving default
    /// role, well-formed identifiers) are enforced when the [`AclConfig`]
    /// value is built, so construction itself cannot fail.
    pub fn new(config: AclConfig, options: AclOptions) -> Self {
        let audit = options
            .audit
            .unwrap_or_else(|| Arc::new(LogAuditSink));

        Self {
            engine: ResolutionEngine::new(
                config,
                RoleHierarchy::empty(),
                DecisionCache::new(options.cache),
                options.strict,
            ),
            audit,
        }
    }

    /// Create an instance with default options
    pub fn with_defaults(config: AclConfig) -> Self {
        Self::new(config, AclOptions::default())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// May `role` perform `permission` on `resource`?
    ///
    /// # Errors
    ///
    /// Propagates the engine's contract: [`AuthzError::InvalidInput`] for
    /// malformed identifiers, [`AuthzError::UnknownRole`] in strict mode.
    pub fn can(&self, role: &str, resource: &str, permission: &str) -> Result<bool> {
        self.engine.can(role, resource, permission)
    }

    /// May a user holding these roles perform `permission` on `resource`?
    ///
    /// A user's effective rights are the union of all their roles' rights,
    /// including inherited ones; the check is a logical OR across roles.
    /// An empty role list falls back to the configured default role, or
    /// denies when none is configured.
    ///
    /// This path never fails: every internal error is logged and converted
    /// to a denial.
    pub fn user_can(
        &self,
        subject: impl Into<Subject>,
        resource: &str,
        permission: &str,
    ) -> bool {
        let subject = subject.into();
        let roles = subject.roles();

        let fallback;
        let roles: &[String] = if roles.is_empty() {
            match self.engine.config().default_role() {
                Some(default) => {
                    debug!(default, "subject has no roles; checking default role");
                    fallback = [default.to_string()];
                    &fallback
                }
                None => {
                    debug!("subject has no roles and no default role is configured");
                    return false;
                }
            }
        } else {
            roles
        };

        roles.iter().any(|role| {
            match self.engine.can(role, resource, permission) {
                Ok(allowed) => allowed,
                Err(err) => {
                    warn!(role = %role, error = %err, "user check failed for role; denying");
                    false
                }
            }
        })
    }

    /// All permissions `role` holds on `resource`, direct and inherited
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::can`].
    pub fn permissions_for(&self, role: &str, resource: &str) -> Result<BTreeSet<String>> {
        self.engine.permissions_for(role, resource)
    }

    /// All resources reachable from `role`, direct and inherited
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::can`].
    pub fn resources_for(&self, role: &str) -> Result<BTreeSet<String>> {
        self.engine.resources_for(role)
    }

    /// Names of all defined roles
    pub fn roles(&self) -> Vec<String> {
        self.engine.config().role_names()
    }

    /// Evaluate a policy request into a structured, fail-closed decision
    pub fn evaluate_policy(&self, policy: &PolicyRequest) -> PolicyDecision {
        self.engine.evaluate(policy)
    }

    /// Decision cache state
    pub fn cache_stats(&self) -> CacheStats {
        self.engine.cache().stats()
    }

    /// Deep copy of the live configuration
    pub fn config(&self) -> AclConfig {
        (*self.engine.config()).clone()
    }

    /// Empty the decision cache
    pub fn clear_cache(&self) {
        self.engine.cache().clear();
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Merge permissions into a role's grant set for a resource.
    ///
    /// Set semantics: granting an already-held permission does not grow the
    /// set.
    ///
    /// # Errors
    ///
    /// [`AuthzError::InvalidInput`] for malformed identifiers or an empty
    /// permission list; [`AuthzError::UnknownRole`] when the role is not
    /// defined.
    pub fn grant<I, S>(&self, role: &str, resource: &str, permissions: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        validate_identifier(role, "role")?;
        validate_identifier(resource, "resource")?;
        let permissions = collect_permission_args(permissions)?;

        let mut config = self.config();
        let definition = config
            .roles
            .get_mut(role)
            .ok_or_else(|| AuthzError::UnknownRole(role.to_string()))?;
        definition
            .grants
            .entry(resource.to_string())
            .or_default()
            .extend(permissions.iter().cloned());

        self.engine.replace_config(config);
        self.audit.record(
            &AuditEntry::new(AuditAction::Grant)
                .with_role(role)
                .with_resource(resource)
                .with_permissions(permissions),
        );
        Ok(())
    }

    /// Remove the listed permissions from a role's grant set for a
    /// resource. Absent role or resource makes this a no-op, not an error;
    /// the cache is invalidated either way.
    ///
    /// # Errors
    ///
    /// [`AuthzError::InvalidInput`] for malformed identifiers or an empty
    /// permission list.
    pub fn revoke<I, S>(&self, role: &str, resource: &str, permissions: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        validate_identifier(role, "role")?;
        validate_identifier(resource, "resource")?;
        let permissions = collect_permission_args(permissions)?;

        let mut config = self.config();
        if let Some(held) = config
            .roles
            .get_mut(role)
            .and_then(|definition| definition.grants.get_mut(resource))
        {
            for permission in &permissions {
                held.remove(permission);
            }
        }

        self.engine.replace_config(config);
        self.audit.record(
            &AuditEntry::new(AuditAction::Revoke)
                .with_role(role)
                .with_resource(resource)
                .with_permissions(permissions),
        );
        Ok(())
    }

    /// Clear a role's entire permission set for a resource.
    ///
    /// The resource key is kept with an empty set: "no permissions" and
    /// "resource not mentioned" are equivalent for queries, and keeping the
    /// key avoids relying on deletion semantics. Absent role or resource is
    /// a no-op, not an error.
    ///
    /// # Errors
    ///
    /// [`AuthzError::InvalidInput`] for malformed identifiers.
    pub fn revoke_all(&self, role: &str, resource: &str) -> Result<()> {
        validate_identifier(role, "role")?;
        validate_identifier(resource, "resource")?;

        let mut config = self.config();
        if let Some(held) = config
            .roles
            .get_mut(role)
            .and_then(|definition| definition.grants.get_mut(resource))
        {
            held.clear();
        }

        self.engine.replace_config(config);
        self.audit.record(
            &AuditEntry::new(AuditAction::Revoke)
                .with_role(role)
                .with_resource(resource),
        );
        Ok(())
    }

    /// Install (or replace) a role definition.
    ///
    /// # Errors
    ///
    /// [`AuthzError::InvalidInput`] for a malformed role name or any
    /// malformed identifier inside the definition.
    pub fn add_role(&self, role: &str, definition: RoleDefinition) -> Result<()> {
        validate_identifier(role, "role")?;
        definition.validate()?;

        let mut config = self.config();
        config.roles.insert(role.to_string(), definition);

        self.engine.replace_config(config);
        self.audit
            .record(&AuditEntry::new(AuditAction::RoleAdded).with_role(role));
        Ok(())
    }

    /// Remove a role definition.
    ///
    /// Absent role is a no-op with a warning. Removal clears a default-role
    /// pointer at the removed role. The hierarchy is left untouched: any
    /// child still naming the removed role as a parent is logged as an
    /// integrity warning, and the dangling edge resolves to "parent has no
    /// permissions" at query time.
    ///
    /// # Errors
    ///
    /// [`AuthzError::InvalidInput`] for a malformed role name.
    pub fn remove_role(&self, role: &str) -> Result<()> {
        validate_identifier(role, "role")?;

        let mut config = self.config();
        if config.roles.remove(role).is_none() {
            warn!(role, "remove_role: role is not defined; nothing to do");
            return Ok(());
        }

        if config.default_role.as_deref() == Some(role) {
            debug!(role, "removed role was the default role; clearing default");
            config.default_role = None;
        }

        let hierarchy = self.engine.hierarchy();
        for child in hierarchy.children_of(role) {
            warn!(
                child,
                parent = role,
                "hierarchy still references removed role; edge will resolve to no permissions"
            );
        }

        self.engine.replace_config(config);
        self.audit
            .record(&AuditEntry::new(AuditAction::RoleRemoved).with_role(role));
        Ok(())
    }

    /// Replace the role hierarchy wholesale.
    ///
    /// The mapping is validated acyclic before anything is installed; a
    /// rejected mapping leaves the previous hierarchy in place.
    ///
    /// # Errors
    ///
    /// [`AuthzError::InvalidInput`] for malformed identifiers,
    /// [`AuthzError::CircularHierarchy`] when the mapping contains a cycle.
    pub fn set_role_hierarchy(&self, mapping: HashMap<String, Vec<String>>) -> Result<()> {
        let hierarchy = RoleHierarchy::validated(mapping)?;
        self.engine.replace_hierarchy(hierarchy);
        self.audit
            .record(&AuditEntry::new(AuditAction::HierarchyReplaced));
        Ok(())
    }

    /// Replace the configuration wholesale.
    ///
    /// The replacement was validated when it was built; installation swaps
    /// it in atomically and invalidates the cache.
    pub fn update_config(&self, config: AclConfig) {
        self.engine.replace_config(config);
        self.audit
            .record(&AuditEntry::new(AuditAction::ConfigReplaced));
    }
}

fn collect_permission_args<I, S>(permissions: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let permissions: Vec<String> = permissions.into_iter().map(Into::into).collect();
    if permissions.is_empty() {
        return Err(AuthzError::invalid_input("permission"));
    }
    for permission in &permissions {
        validate_identifier(permission, "permission")?;
    }
    Ok(permissions)
}
