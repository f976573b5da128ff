//! Session token issuance (RS256).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, Header};
use thiserror::Error;

use crate::claims::SessionClaims;
use crate::keys::SigningKey;
use crate::{Identity, SessionId, SessionToken};

/// Fixed signing scheme; the verifier accepts nothing else.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::RS256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IssueError {
    #[error("token ttl must be at least one second, got {0}")]
    InvalidTtl(Duration),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Builds and signs session tokens. Stateless apart from its key.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    key: SigningKey,
    default_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(key: SigningKey, default_ttl: Duration) -> Self {
        Self { key, default_ttl }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn issue_default(&self, identity: &Identity) -> Result<SessionToken, IssueError> {
        self.issue(identity, self.default_ttl)
    }

    pub fn issue(&self, identity: &Identity, ttl: Duration) -> Result<SessionToken, IssueError> {
        self.issue_at(identity, ttl, Utc::now())
    }

    /// Issue a token as of `now`.
    ///
    /// Claims carry whole seconds, so `now` is truncated before use and the
    /// returned timestamps match the signed ones exactly.
    pub fn issue_at(
        &self,
        identity: &Identity,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<SessionToken, IssueError> {
        if ttl < Duration::seconds(1) {
            return Err(IssueError::InvalidTtl(ttl));
        }

        let issued_at = DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now);
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or(IssueError::InvalidTtl(ttl))?;

        let session_id = SessionId::new();
        let claims = SessionClaims::new(identity, session_id, issued_at, expires_at);

        let raw = jsonwebtoken::encode(&Header::new(TOKEN_ALGORITHM), &claims, self.key.encoding_key())
            .map_err(|e| IssueError::Signing(e.to_string()))?;

        tracing::debug!(
            user_id = %identity.user_id(),
            session_id = %session_id,
            expires_at = %expires_at,
            "issued session token"
        );

        Ok(SessionToken {
            raw,
            session_id,
            identity: identity.clone(),
            issued_at,
            not_before: issued_at,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    use super::*;
    use crate::keys::testkeys::PRIVATE_PEM;
    use crate::{Role, UserId};

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            SigningKey::from_pem(PRIVATE_PEM.as_bytes()).unwrap(),
            Duration::minutes(15),
        )
    }

    fn alice() -> Identity {
        Identity::new(UserId::new(1).unwrap(), "alice", vec![Role::USER])
    }

    fn segment(raw: &str, index: usize) -> serde_json::Value {
        let part = raw.split('.').nth(index).unwrap();
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(part).unwrap()).unwrap()
    }

    #[test]
    fn issued_token_has_expected_window() {
        let now = Utc::now();
        let token = issuer().issue_at(&alice(), Duration::minutes(15), now).unwrap();

        assert_eq!(token.issued_at, token.not_before);
        assert!(token.expires_at > token.issued_at);
        assert_eq!(token.expires_at - token.issued_at, Duration::minutes(15));
        assert_eq!(token.identity, alice());
        assert_eq!(token.raw.split('.').count(), 3);
    }

    #[test]
    fn wire_format_carries_subject_and_registered_claims() {
        let token = issuer().issue_default(&alice()).unwrap();

        let header = segment(&token.raw, 0);
        assert_eq!(header["alg"], "RS256");

        let payload = segment(&token.raw, 1);
        assert_eq!(payload["sub"]["id"], 1);
        assert_eq!(payload["sub"]["name"], "alice");
        assert_eq!(payload["sub"]["roles"], serde_json::json!(["user"]));
        assert_eq!(payload["token_uuid"], token.session_id.to_string());
        assert_eq!(payload["iat"], token.issued_at.timestamp());
        assert_eq!(payload["nbf"], token.not_before.timestamp());
        assert_eq!(payload["exp"], token.expires_at.timestamp());
    }

    #[test]
    fn every_token_gets_a_fresh_session_id() {
        let issuer = issuer();
        let a = issuer.issue_default(&alice()).unwrap();
        let b = issuer.issue_default(&alice()).unwrap();
        assert_ne!(a.session_id, b.session_id);
        assert_eq!(a.session_id.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn non_positive_ttl_is_rejected() {
        let issuer = issuer();
        assert!(matches!(
            issuer.issue(&alice(), Duration::zero()),
            Err(IssueError::InvalidTtl(_))
        ));
        assert!(matches!(
            issuer.issue(&alice(), Duration::seconds(-1)),
            Err(IssueError::InvalidTtl(_))
        ));
        assert!(matches!(
            issuer.issue(&alice(), Duration::milliseconds(500)),
            Err(IssueError::InvalidTtl(_))
        ));
    }
}
