//! Request guard: the middleware adapter contract
//!
//! [`RequestGuard`] translates a framework request into a
//! (roles, resource, permission) check against an [`AccessControl`]
//! instance. It is generic over the request type, so any web framework's
//! middleware can wrap it with a few lines of glue.
//!
//! Every branch is fail-closed:
//! - a failing or rejecting role source is treated as "no roles", which
//!   falls through to the default role or a denial;
//! - a failing resource or permission selector is a denial;
//! - no path returns an error or panics on malformed input.
//!
//! Role resolution is the one asynchronous seam in the crate: sources often
//! consult a session store or token verifier, so the trait is async and the
//! guard awaits it before proceeding.

use crate::acl::AccessControl;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Resolves the caller's roles from a request
#[async_trait]
pub trait RoleSource<Req>: Send + Sync {
    /// Extract the caller's role identifiers.
    ///
    /// An `Err` is not propagated by the guard; it resolves to the empty
    /// role list.
    async fn roles(&self, request: &Req) -> Result<Vec<String>>;
}

/// A role source that ignores the request and returns a fixed list
pub struct StaticRoles(pub Vec<String>);

#[async_trait]
impl<Req: Sync> RoleSource<Req> for StaticRoles {
    async fn roles(&self, _request: &Req) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

/// A resource or permission selector: a fixed value or a function of the
/// request
pub enum ValueSource<Req> {
    /// Always this value
    Fixed(String),

    /// Computed per request; an `Err` is a denial, not a propagated error
    FromRequest(Arc<dyn Fn(&Req) -> Result<String> + Send + Sync>),
}

impl<Req> ValueSource<Req> {
    /// A fixed value
    pub fn fixed(value: impl Into<String>) -> Self {
        Self::Fixed(value.into())
    }

    /// A per-request selector
    pub fn from_request<F>(selector: F) -> Self
    where
        F: Fn(&Req) -> Result<String> + Send + Sync + 'static,
    {
        Self::FromRequest(Arc::new(selector))
    }

    fn resolve(&self, request: &Req) -> Result<String> {
        match self {
            Self::Fixed(value) => Ok(value.clone()),
            Self::FromRequest(selector) => selector(request),
        }
    }
}

impl<Req> Clone for ValueSource<Req> {
    fn clone(&self) -> Self {
        match self {
            Self::Fixed(value) => Self::Fixed(value.clone()),
            Self::FromRequest(selector) => Self::FromRequest(Arc::clone(selector)),
        }
    }
}

/// Structured denial payload handed back to the framework glue
#[derive(Debug, Clone, PartialEq)]
pub struct DeniedResponse {
    /// Suggested HTTP status
    pub status: u16,

    /// Response body; carries no internal detail
    pub body: serde_json::Value,
}

impl Default for DeniedResponse {
    fn default() -> Self {
        Self {
            status: 403,
            body: json!({
                "error": "Forbidden",
                "message": "access denied",
            }),
        }
    }
}

/// Outcome of a guard check
#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome {
    /// Proceed with the request
    Granted,

    /// Stop the request and answer with the payload
    Denied(DeniedResponse),
}

impl GuardOutcome {
    /// Whether the request may proceed
    pub fn is_granted(&self) -> bool {
        matches!(self, GuardOutcome::Granted)
    }
}

/// Guard configuration
pub struct GuardOptions<Req> {
    /// How to resolve the caller's roles
    pub roles: Arc<dyn RoleSource<Req>>,

    /// Which resource the request targets
    pub resource: ValueSource<Req>,

    /// Which permission the request needs
    pub permission: ValueSource<Req>,

    /// Custom denial payload builder; defaults to a generic 403
    pub on_denied: Option<Arc<dyn Fn(&Req) -> DeniedResponse + Send + Sync>>,

    /// Log each decision at info level
    pub audit_log: bool,
}

/// The middleware adapter
pub struct RequestGuard<Req> {
    acl: Arc<AccessControl>,
    options: GuardOptions<Req>,
}

impl AccessControl {
    /// Produce a request guard bound to this instance
    pub fn guard<Req>(self: &Arc<Self>, options: GuardOptions<Req>) -> RequestGuard<Req> {
        RequestGuard {
            acl: Arc::clone(self),
            options,
        }
    }
}

impl<Req> RequestGuard<Req> {
    /// Check one request. Infallible by contract: the result is always a
    /// grant or a structured denial.
    pub async fn check(&self, request: &Req) -> GuardOutcome {
        let roles = match self.options.roles.roles(request).await {
            Ok(roles) => roles,
            Err(err) => {
                warn!(error = %err, "role resolution failed; proceeding with no roles");
                Vec::new()
            }
        };

        let resource = match self.options.resource.resolve(request) {
            Ok(resource) => resource,
            Err(err) => {
                warn!(error = %err, "resource selector failed; denying");
                return self.deny(request);
            }
        };
        let permission = match self.options.permission.resolve(request) {
            Ok(permission) => permission,
            Err(err) => {
                warn!(error = %err, "permission selector failed; denying");
                return self.deny(request);
            }
        };

        let allowed = self.acl.user_can(roles, &resource, &permission);
        if self.options.audit_log {
            info!(
                target: "rolegate::audit",
                allowed,
                resource,
                permission,
                "guard decision"
            );
        }

        if allowed {
            GuardOutcome::Granted
        } else {
            self.deny(request)
        }
    }

    fn deny(&self, request: &Req) -> GuardOutcome {
        let response = match &self.options.on_denied {
            Some(handler) => handler(request),
            None => DeniedResponse::default(),
        };
        GuardOutcome::Denied(response)
    }
}
