//! Route-level authorization middleware.
//!
//! `resolve_owner_from_path` must run before `enforce` on routes guarded by
//! `OwnerOrAdmin`; both expect the identity middleware to have run first.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    middleware::Next,
    response::Response,
};

use larder_auth::{AuthError, AuthorizationPolicy, ResourceContext, UserId, authorize};

use crate::app::errors;
use crate::context::{IdentityContext, OwnerContext};

pub const OWNER_PATH_PARAM: &str = "user_id";

/// Record the `user_id` path parameter as the resource owner.
///
/// An id that cannot name a user is answered with 404.
pub async fn resolve_owner_from_path(
    Path(params): Path<HashMap<String, String>>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    if let Some(raw) = params.get(OWNER_PATH_PARAM) {
        let owner_id: UserId = raw.parse().map_err(|_| {
            tracing::debug!(value = %raw, "unresolvable owner id in path");
            errors::not_found()
        })?;
        req.extensions_mut().insert(OwnerContext::new(owner_id));
    }

    Ok(next.run(req).await)
}

/// Evaluate `policy` for the current request; failure is 403.
pub async fn enforce(
    State(policy): State<AuthorizationPolicy>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let resource = req
        .extensions()
        .get::<OwnerContext>()
        .map(|owner| ResourceContext::owned_by(owner.owner_id()))
        .unwrap_or_default();
    let identity = req.extensions().get::<IdentityContext>().map(IdentityContext::identity);

    if let Err(e) = authorize(identity, policy, &resource) {
        tracing::warn!(
            ?policy,
            user_id = identity.map(|i| i.user_id().get()),
            reason = %e,
            "authorization denied"
        );
        return Err(errors::auth_error_to_response(&AuthError::from(e)));
    }

    Ok(next.run(req).await)
}
