use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use larder_auth::{AuthError, TokenVerifier};

use crate::app::errors;
use crate::context::IdentityContext;
use crate::cookie::{self, ACCESS_TOKEN_COOKIE};
use crate::sessions::Sessions;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<TokenVerifier>,
    pub sessions: Sessions,
}

/// Reject requests without a valid session token.
pub async fn require_identity(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let Some(token) = extract_token(req.headers()) else {
        tracing::debug!("no session token presented");
        return Err(errors::unauthenticated());
    };

    let ctx = resolve_identity(&state, &token).await?;
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}

/// Attach an identity when a token is presented; anonymous requests pass.
///
/// A token that is present but invalid is still rejected.
pub async fn optional_identity(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    if let Some(token) = extract_token(req.headers()) {
        let ctx = resolve_identity(&state, &token).await?;
        req.extensions_mut().insert(ctx);
    }

    Ok(next.run(req).await)
}

async fn resolve_identity(state: &AuthState, token: &str) -> Result<IdentityContext, Response> {
    let now = Utc::now();

    let session = state.verifier.verify_session(token, now).map_err(|e| {
        tracing::warn!(reason = %e, "rejected session token");
        errors::auth_error_to_response(&AuthError::from(e))
    })?;

    let active = state
        .sessions
        .is_active(session.session_id, now)
        .await
        .map_err(|e| errors::session_error_to_response(&e))?;
    if !active {
        tracing::warn!(
            session_id = %session.session_id,
            user_id = %session.identity.user_id(),
            "session revoked or unknown"
        );
        return Err(errors::unauthenticated());
    }

    Ok(IdentityContext::new(session))
}

/// `Authorization: Bearer` header first, then the `access_token` cookie.
///
/// The scheme name is matched case-insensitively.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim().to_string());

    bearer.or_else(|| cookie::find(headers, ACCESS_TOKEN_COOKIE).filter(|token| !token.is_empty()))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use axum::http::header::{AUTHORIZATION, COOKIE};

    use super::*;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(COOKIE, HeaderValue::from_static("access_token=from-cookie"));
        assert_eq!(extract_token(&headers).as_deref(), Some("from-header"));
    }

    #[test]
    fn cookie_is_used_without_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        headers.insert(COOKIE, HeaderValue::from_static("access_token=from-cookie"));
        assert_eq!(extract_token(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn nothing_presented() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("access_token="));
        assert_eq!(extract_token(&headers), None);
    }

    #[test]
    fn bearer_scheme_ignores_case() {
        for header in ["bearer tok", "BEARER tok", "BeArEr tok"] {
            let mut headers = HeaderMap::new();
            headers.insert(AUTHORIZATION, HeaderValue::from_static(header));
            headers.insert(COOKIE, HeaderValue::from_static("access_token=from-cookie"));
            assert_eq!(extract_token(&headers).as_deref(), Some("tok"), "{header}");
        }
    }

    #[test]
    fn empty_bearer_is_still_a_presented_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_token(&headers).as_deref(), Some(""));
    }
}
