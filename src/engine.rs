//! Permission resolution engine
//!
//! Orchestrates configuration lookup, hierarchy traversal, and the decision
//! cache to answer permission queries.
//!
//! # Pipeline
//!
//! ```text
//! can(role, resource, permission)
//!   → validate identifiers
//!   → cache lookup ──────────────── hit → return
//!   → direct grant check
//!   → parents, in declared order, recursively (short-circuit on grant)
//!   → cache fill (version-stamped) → return
//! ```
//!
//! Reads operate on `Arc` snapshots of configuration and hierarchy; writes
//! build a new value and swap the pointer, then invalidate the cache. A
//! reader therefore observes fully-old or fully-new state, never a partial
//! mutation, and the cache's version stamp discards results that a reader
//! computed against pre-swap state.

use crate::cache::DecisionCache;
use crate::config::AclConfig;
use crate::error::{AuthzError, Result};
use crate::hierarchy::RoleHierarchy;
use crate::validate::{validate_triple, validate_identifier};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A role/resource/permission triple submitted for evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRequest {
    /// Role to check
    pub role: String,

    /// Resource the action targets
    pub resource: String,

    /// Action being performed
    pub permission: String,
}

/// Structured allow/deny decision with a human-readable reason.
///
/// The reason is a templated sentence; it never carries raw error text,
/// and it only names the triple's values once they have passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// Whether the action is allowed
    pub allowed: bool,

    /// Why
    pub reason: String,
}

impl PolicyDecision {
    fn granted(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
        }
    }

    fn denied(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

/// Resolution engine: configuration + hierarchy + cache
pub struct ResolutionEngine {
    config: RwLock<Arc<AclConfig>>,
    hierarchy: RwLock<Arc<RoleHierarchy>>,
    cache: DecisionCache,
    strict: bool,
}

impl ResolutionEngine {
    /// Create an engine over a validated configuration
    pub fn new(
        config: AclConfig,
        hierarchy: RoleHierarchy,
        cache: DecisionCache,
        strict: bool,
    ) -> Self {
        info!(
            roles = config.len(),
            strict,
            cache_enabled = cache.stats().enabled,
            "resolution engine initialized"
        );

        Self {
            config: RwLock::new(Arc::new(config)),
            hierarchy: RwLock::new(Arc::new(hierarchy)),
            cache,
            strict,
        }
    }

    /// Snapshot of the live configuration
    pub fn config(&self) -> Arc<AclConfig> {
        Arc::clone(&self.config.read())
    }

    /// Snapshot of the live hierarchy
    pub fn hierarchy(&self) -> Arc<RoleHierarchy> {
        Arc::clone(&self.hierarchy.read())
    }

    /// The decision cache
    pub fn cache(&self) -> &DecisionCache {
        &self.cache
    }

    /// Whether unknown-role queries raise instead of denying
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Install a new configuration and invalidate the cache
    pub fn replace_config(&self, config: AclConfig) {
        *self.config.write() = Arc::new(config);
        self.cache.clear();
    }

    /// Install a new hierarchy and invalidate the cache
    pub fn replace_hierarchy(&self, hierarchy: RoleHierarchy) {
        *self.hierarchy.write() = Arc::new(hierarchy);
        self.cache.clear();
    }

    /// May `role` perform `permission` on `resource`?
    ///
    /// Unknown resources and permissions always resolve to a plain `false`;
    /// unknown *roles* raise in strict mode and deny (with a warning)
    /// otherwise. The asymmetry is intentional: an unknown role usually
    /// means caller misconfiguration, an unknown resource is a routine
    /// "not granted".
    ///
    /// # Errors
    ///
    /// [`AuthzError::InvalidInput`] for malformed identifiers;
    /// [`AuthzError::UnknownRole`] in strict mode when `role` is undefined.
    pub fn can(&self, role: &str, resource: &str, permission: &str) -> Result<bool> {
        validate_triple(role, resource, permission)?;

        // Version first, snapshots second: if a clear lands in between, our
        // eventual cache writes carry a stale stamp and are discarded.
        let version = self.cache.version();
        let config = self.config();
        let hierarchy = self.hierarchy();

        if config.role(role).is_none() {
            if self.strict {
                return Err(AuthzError::UnknownRole(role.to_string()));
            }
            warn!(role, "permission check against unknown role");
        }

        let mut visited = HashSet::new();
        Ok(self.resolve(
            role, resource, permission, &config, &hierarchy, version, &mut visited,
        ))
    }

    /// Recursive resolution step. Fills the cache for every role it fully
    /// resolves, so ancestor results are reused across queries.
    #[allow(clippy::too_many_arguments)]
    fn resolve(
        &self,
        role: &str,
        resource: &str,
        permission: &str,
        config: &AclConfig,
        hierarchy: &RoleHierarchy,
        version: u64,
        visited: &mut HashSet<String>,
    ) -> bool {
        if let Some(allowed) = self.cache.get(role, resource, permission) {
            return allowed;
        }

        // Revisits only happen on diamond-shaped hierarchies (cycles are
        // rejected at installation); the first visit already resolved to
        // false or we would have short-circuited.
        if !visited.insert(role.to_string()) {
            return false;
        }

        // A role must be defined to contribute permissions. An undefined
        // role (dangling parent edge, or an unknown query in non-strict
        // mode) resolves to deny without consulting parents of its own.
        let Some(definition) = config.role(role) else {
            self.cache.put(role, resource, permission, false, version);
            return false;
        };

        let direct = definition
            .grants
            .get(resource)
            .is_some_and(|permissions| permissions.contains(permission));

        let allowed = direct
            || hierarchy
                .parents(role)
                .iter()
                .any(|parent| {
                    self.resolve(parent, resource, permission, config, hierarchy, version, visited)
                });

        debug!(role, resource, permission, allowed, "resolved");
        self.cache.put(role, resource, permission, allowed, version);
        allowed
    }

    /// All permissions `role` holds on `resource`, directly or by
    /// inheritance.
    ///
    /// # Errors
    ///
    /// Same unknown-role contract as [`Self::can`].
    pub fn permissions_for(&self, role: &str, resource: &str) -> Result<BTreeSet<String>> {
        validate_identifier(role, "role")?;
        validate_identifier(resource, "resource")?;

        let config = self.config();
        let hierarchy = self.hierarchy();
        self.check_known(role, &config)?;

        let mut permissions = BTreeSet::new();
        let mut visited = HashSet::new();
        collect_permissions(role, resource, &config, &hierarchy, &mut permissions, &mut visited);
        Ok(permissions)
    }

    /// All resources reachable from `role`, directly or by inheritance.
    ///
    /// # Errors
    ///
    /// Same unknown-role contract as [`Self::can`].
    pub fn resources_for(&self, role: &str) -> Result<BTreeSet<String>> {
        validate_identifier(role, "role")?;

        let config = self.config();
        let hierarchy = self.hierarchy();
        self.check_known(role, &config)?;

        let mut resources = BTreeSet::new();
        let mut visited = HashSet::new();
        collect_resources(role, &config, &hierarchy, &mut resources, &mut visited);
        Ok(resources)
    }

    /// Evaluate a policy request into a structured decision.
    ///
    /// Fail-closed: any validation failure or resolution error yields a
    /// denial whose reason is a generic templated sentence. Raw error text
    /// never reaches the decision.
    pub fn evaluate(&self, policy: &PolicyRequest) -> PolicyDecision {
        if validate_triple(&policy.role, &policy.resource, &policy.permission).is_err() {
            return PolicyDecision::denied(
                "policy rejected: one or more fields failed validation",
            );
        }

        // Values are known-safe past this point and may appear in reasons.
        match self.can(&policy.role, &policy.resource, &policy.permission) {
            Ok(true) => PolicyDecision::granted(format!(
                "role '{}' is allowed to '{}' on '{}'",
                policy.role, policy.permission, policy.resource
            )),
            Ok(false) => PolicyDecision::denied(format!(
                "role '{}' is not allowed to '{}' on '{}'",
                policy.role, policy.permission, policy.resource
            )),
            Err(err) => {
                warn!(role = %policy.role, error = %err, "policy evaluation failed");
                PolicyDecision::denied(format!(
                    "authorization could not be established for role '{}'",
                    policy.role
                ))
            }
        }
    }

    fn check_known(&self, role: &str, config: &AclConfig) -> Result<()> {
        if config.role(role).is_none() {
            if self.strict {
                return Err(AuthzError::UnknownRole(role.to_string()));
            }
            warn!(role, "lookup against unknown role");
        }
        Ok(())
    }
}

fn collect_permissions(
    role: &str,
    resource: &str,
    config: &AclConfig,
    hierarchy: &RoleHierarchy,
    permissions: &mut BTreeSet<String>,
    visited: &mut HashSet<String>,
) {
    if !visited.insert(role.to_string()) {
        return;
    }

    // Undefined roles contribute nothing and their parents are not
    // consulted, matching `can`.
    let Some(definition) = config.role(role) else {
        return;
    };

    if let Some(direct) = definition.grants.get(resource) {
        permissions.extend(direct.iter().cloned());
    }
    for parent in hierarchy.parents(role) {
        collect_permissions(parent, resource, config, hierarchy, permissions, visited);
    }
}

fn collect_resources(
    role: &str,
    config: &AclConfig,
    hierarchy: &RoleHierarchy,
    resources: &mut BTreeSet<String>,
    visited: &mut HashSet<String>,
) {
    if !visited.insert(role.to_string()) {
        return;
    }

    let Some(definition) = config.role(role) else {
        return;
    };

    resources.extend(definition.grants.keys().cloned());
    for parent in hierarchy.parents(role) {
        collect_resources(parent, config, hierarchy, resources, visited);
    }
}
