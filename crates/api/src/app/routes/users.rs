use std::sync::Arc;

use axum::{Extension, Json, response::IntoResponse};

use crate::app::{dto::UserView, errors, services::AppServices};
use crate::context::OwnerContext;

/// GET /users/:user_id - visible to the user themselves and to admins
pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
) -> axum::response::Response {
    match services.directory.find_by_id(owner.owner_id()).await {
        Ok(Some(record)) => Json(UserView::from(&record.identity)).into_response(),
        Ok(None) => errors::not_found(),
        Err(e) => errors::directory_error_to_response(&e),
    }
}
