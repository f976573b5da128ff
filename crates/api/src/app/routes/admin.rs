//! Admin-only routes, all behind the `AdminOnly` guard.

use std::sync::Arc;

use axum::{Extension, Json, Router, middleware::from_fn_with_state, response::IntoResponse, routing::get};

use larder_auth::AuthorizationPolicy;

use crate::guard;
use crate::app::{
    dto::{UserList, UserView},
    errors,
    services::AppServices,
};

pub fn router() -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route_layer(from_fn_with_state(AuthorizationPolicy::AdminOnly, guard::enforce))
}

/// GET /admin/users - list every known user
pub async fn list_users(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.directory.list().await {
        Ok(records) => Json(UserList {
            users: records.iter().map(|r| UserView::from(&r.identity)).collect(),
        })
        .into_response(),
        Err(e) => errors::directory_error_to_response(&e),
    }
}
