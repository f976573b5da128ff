use axum::{Extension, Json, http::StatusCode, response::IntoResponse};

use crate::app::dto::UserView;
use crate::context::IdentityContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(ctx): Extension<IdentityContext>) -> impl IntoResponse {
    Json(UserView::from(ctx.identity()))
}
