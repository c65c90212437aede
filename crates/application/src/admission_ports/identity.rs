use tollgate_domain::{RequestContext, ResolvedIdentity};

/// Resolves the caller's identity tier from request credentials.
///
/// Must be pure: resolving the same request twice yields the same identity.
/// Missing or invalid credentials resolve to anonymous; resolution never fails.
pub trait IdentityResolver: Send + Sync {
    /// Resolves the caller identity for one request.
    fn resolve(&self, request: &RequestContext) -> ResolvedIdentity;
}
