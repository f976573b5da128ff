use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::rejection::JsonRejection,
    http::{StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;

use larder_auth::{AuthError, Identity, Role, SessionRecord, TokenIssuer, authenticate};

use crate::app::{
    dto::{LoginRequest, LoginResponse, SignUpRequest, UserView},
    errors,
    services::AppServices,
};
use crate::context::IdentityContext;
use crate::cookie;

/// POST /auth/login - exchange credentials for a session token
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(e) => return errors::bad_request(e.body_text()),
    };

    let Some(issuer) = &services.issuer else {
        return errors::json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "service_unavailable",
            "login is disabled on this instance",
        );
    };

    let identity = match authenticate(services.directory.as_ref(), &body.username, &body.password).await {
        Ok(Some(identity)) => identity,
        Ok(None) => {
            tracing::info!(username = %body.username, "login rejected");
            return errors::json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "invalid credentials");
        }
        Err(e) => return errors::directory_error_to_response(&e),
    };

    open_session(&services, issuer, &identity).await
}

/// POST /auth/sign-up - create a `user` account and open its first session
pub async fn sign_up(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<SignUpRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(e) => return errors::bad_request(e.body_text()),
    };

    let Some(issuer) = &services.issuer else {
        return errors::json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "service_unavailable",
            "sign-up is disabled on this instance",
        );
    };

    if body.confirm_password.as_deref().is_some_and(|confirm| confirm != body.password) {
        return errors::bad_request("passwords do not match");
    }

    let identity = match services
        .directory
        .register(&body.username, &body.password, vec![Role::USER])
        .await
    {
        Ok(identity) => identity,
        Err(e) => {
            tracing::info!(username = %body.username, reason = %e, "sign-up rejected");
            return errors::directory_error_to_response(&e);
        }
    };

    open_session(&services, issuer, &identity).await
}

/// Issue a token, record its session and hand it back as body and cookie.
async fn open_session(
    services: &AppServices,
    issuer: &TokenIssuer,
    identity: &Identity,
) -> axum::response::Response {
    let token = match issuer.issue_default(identity) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, user_id = %identity.user_id(), "token issuance failed");
            return errors::auth_error_to_response(&AuthError::from(e));
        }
    };

    if let Err(e) = services.sessions.record(SessionRecord::from_token(&token)).await {
        return errors::session_error_to_response(&e);
    }

    tracing::info!(
        user_id = %identity.user_id(),
        session_id = %token.session_id,
        expires_at = %token.expires_at,
        "session opened"
    );

    let max_age = token.remaining(Utc::now()).num_seconds();
    let set_cookie = cookie::session_cookie(&token.raw, max_age, services.secure_cookies);

    (
        [(SET_COOKIE, set_cookie)],
        Json(LoginResponse {
            access_token: token.raw,
            token_type: "Bearer",
            expires_at: token.expires_at,
        }),
    )
        .into_response()
}

/// POST /auth/logout - revoke the current session and drop the cookie
pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<IdentityContext>,
) -> axum::response::Response {
    let revoked = match services.sessions.revoke(ctx.session_id()).await {
        Ok(revoked) => revoked,
        Err(e) => return errors::session_error_to_response(&e),
    };

    tracing::info!(
        user_id = %ctx.identity().user_id(),
        session_id = %ctx.session_id(),
        revoked,
        "session closed"
    );

    (
        [(SET_COOKIE, cookie::cleared_cookie(services.secure_cookies))],
        Json(json!({ "revoked": revoked })),
    )
        .into_response()
}

/// GET /auth/status - whether the caller presented a valid session
pub async fn status(ctx: Option<Extension<IdentityContext>>) -> impl IntoResponse {
    match ctx {
        Some(Extension(ctx)) => Json(json!({
            "authenticated": true,
            "user": UserView::from(ctx.identity()),
            "expires_at": ctx.expires_at(),
        })),
        None => Json(json!({ "authenticated": false })),
    }
}
