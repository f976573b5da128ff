//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: token issuer/verifier, user directory and session store
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower::ServiceBuilder;

use larder_auth::AuthorizationPolicy;

use crate::{guard, middleware};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, ServiceError};

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: AppServices) -> Router {
    let auth_state = middleware::AuthState {
        verifier: Arc::new(services.verifier.clone()),
        sessions: services.sessions.clone(),
    };
    let services = Arc::new(services);

    // Owner must be resolved before the policy runs; route layers run in
    // reverse order of declaration.
    let owned = Router::new()
        .route("/users/:user_id", get(routes::users::get_user))
        .route_layer(from_fn_with_state(AuthorizationPolicy::OwnerOrAdmin, guard::enforce))
        .route_layer(from_fn(guard::resolve_owner_from_path));

    // Protected routes: require a verified, live session.
    let protected = Router::new()
        .route("/whoami", get(routes::system::whoami))
        .route("/auth/logout", post(routes::auth::logout))
        .merge(owned)
        .nest("/admin", routes::admin::router())
        .layer(from_fn_with_state(auth_state.clone(), middleware::require_identity));

    let optional = Router::new()
        .route("/auth/status", get(routes::auth::status))
        .layer(from_fn_with_state(auth_state, middleware::optional_identity));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/sign-up", post(routes::auth::sign_up))
        .merge(optional)
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
