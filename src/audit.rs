//! Audit records for configuration mutations
//!
//! Every successful mutation on the facade (grant, revoke, role add/remove,
//! hierarchy or configuration replacement) emits one [`AuditEntry`] to the
//! configured [`AuditSink`]. The default sink writes structured log events;
//! [`MemoryAuditSink`] retains entries in a bounded buffer for tests and
//! introspection.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::info;
use uuid::Uuid;

/// What kind of mutation produced an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Grant,
    Revoke,
    RoleAdded,
    RoleRemoved,
    HierarchyReplaced,
    ConfigReplaced,
}

/// One recorded mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry identifier
    pub id: String,

    /// When the mutation was applied
    pub at: DateTime<Utc>,

    /// Mutation kind
    pub action: AuditAction,

    /// Role the mutation targeted, when one was named
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Resource the mutation targeted, when one was named
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    /// Permissions involved in the mutation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
}

impl AuditEntry {
    /// Create an entry stamped with a fresh id and the current time
    pub fn new(action: AuditAction) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            at: Utc::now(),
            action,
            role: None,
            resource: None,
            permissions: Vec::new(),
        }
    }

    /// Name the targeted role
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Name the targeted resource
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Attach the permissions involved
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }
}

/// Destination for audit entries
pub trait AuditSink: Send + Sync {
    /// Record one entry. Implementations must not fail the calling
    /// mutation; recording errors are theirs to swallow.
    fn record(&self, entry: &AuditEntry);
}

/// Default sink: structured log events under the `rolegate::audit` target
#[derive(Debug, Default)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn record(&self, entry: &AuditEntry) {
        info!(
            target: "rolegate::audit",
            id = %entry.id,
            action = ?entry.action,
            role = entry.role.as_deref().unwrap_or("-"),
            resource = entry.resource.as_deref().unwrap_or("-"),
            permissions = ?entry.permissions,
            "configuration mutated"
        );
    }
}

/// Bounded in-memory sink, oldest entries dropped first
#[derive(Debug)]
pub struct MemoryAuditSink {
    entries: Mutex<VecDeque<AuditEntry>>,
    capacity: usize,
}

impl MemoryAuditSink {
    /// Create a sink retaining at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Snapshot of the retained entries, oldest first
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no entries are retained
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryAuditSink {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: &AuditEntry) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry.clone());
    }
}
