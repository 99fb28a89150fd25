//! # rolegate
//!
//! In-process role-based authorization engine.
//!
//! ## Features
//!
//! - **Role definitions** mapping roles to per-resource permission sets,
//!   built through a fluent builder or assembled directly
//! - **Role inheritance** through a child → parents hierarchy, validated
//!   acyclic at installation time
//! - **Decision caching** with a bounded LRU store, per-entry TTL, and
//!   version-stamped invalidation on every configuration change
//! - **Fail-closed evaluation**: user checks, policy evaluation, and the
//!   request guard convert every internal error into a denial
//! - **Audit records** for every configuration mutation, routed through a
//!   pluggable sink
//!
//! ## Example
//!
//! ```rust
//! use rolegate::{AccessControl, AclConfig, RoleDefinition};
//! use std::collections::HashMap;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AclConfig::builder()
//!         .role(
//!             "ADMIN",
//!             RoleDefinition::new()
//!                 .describe("Full product access")
//!                 .allow("Products", ["CREATE", "READ", "UPDATE", "DELETE"]),
//!         )
//!         .role("CLIENT", RoleDefinition::new().allow("Products", ["READ", "VIEW"]))
//!         .build()?;
//!
//!     let acl = AccessControl::with_defaults(config);
//!
//!     assert!(acl.can("ADMIN", "Products", "DELETE")?);
//!     assert!(!acl.can("CLIENT", "Products", "DELETE")?);
//!
//!     // EDITOR inherits everything ADMIN holds.
//!     let mut hierarchy = HashMap::new();
//!     hierarchy.insert("EDITOR".to_string(), vec!["ADMIN".to_string()]);
//!     acl.set_role_hierarchy(hierarchy)?;
//!     assert!(acl.can("EDITOR", "Products", "UPDATE")?);
//!
//!     Ok(())
//! }
//! ```

pub mod acl;
pub mod audit;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod hierarchy;
pub mod middleware;
pub mod validate;

// Re-export commonly used types
pub use acl::{AccessControl, AclOptions, Subject, UserRecord};
pub use audit::{AuditAction, AuditEntry, AuditSink, LogAuditSink, MemoryAuditSink};
pub use cache::{CacheOptions, CacheStats};
pub use config::{AclBuilder, AclConfig, GrantMap, RoleDefinition};
pub use engine::{PolicyDecision, PolicyRequest, ResolutionEngine};
pub use error::{AuthzError, Result};
pub use hierarchy::RoleHierarchy;
pub use middleware::{
    DeniedResponse, GuardOptions, GuardOutcome, RequestGuard, RoleSource, StaticRoles,
    ValueSource,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
