//! Session token verification.
//!
//! Order matters: the declared algorithm is pinned before any signature work,
//! and no claim is interpreted before the signature has checked out.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::claims::{SessionClaims, TokenValidationError, check_time_window};
use crate::issuer::TOKEN_ALGORITHM;
use crate::keys::VerifyingKey;
use crate::{Identity, VerifiedSession};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("unexpected signing algorithm '{0}'")]
    UnexpectedAlgorithm(String),

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token has expired")]
    Expired,

    #[error("token is not valid yet")]
    NotYetValid,

    #[error("unexpected claim shape: {0}")]
    ClaimShape(String),
}

impl From<TokenValidationError> for VerifyError {
    fn from(value: TokenValidationError) -> Self {
        match value {
            TokenValidationError::Expired => Self::Expired,
            TokenValidationError::NotYetValid => Self::NotYetValid,
            TokenValidationError::InvalidTimeWindow => Self::ClaimShape(value.to_string()),
            TokenValidationError::Shape(msg) => Self::ClaimShape(msg),
        }
    }
}

/// Only the `alg` member matters before the signature is checked.
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Verifies session tokens against the configured public key.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    key: VerifyingKey,
    leeway_secs: u64,
}

impl TokenVerifier {
    pub fn new(key: VerifyingKey) -> Self {
        Self { key, leeway_secs: 0 }
    }

    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    pub fn verify(&self, raw: &str, now: DateTime<Utc>) -> Result<Identity, VerifyError> {
        self.verify_session(raw, now).map(|session| session.identity)
    }

    pub fn verify_session(&self, raw: &str, now: DateTime<Utc>) -> Result<VerifiedSession, VerifyError> {
        let segments = split_token(raw.trim())?;

        let header = decode_segment::<RawHeader>(segments.header)
            .map_err(|e| VerifyError::Malformed(format!("header: {e}")))?;
        if header.alg != EXPECTED_ALGORITHM {
            return Err(VerifyError::UnexpectedAlgorithm(header.alg));
        }

        self.check_signature(&segments)?;

        let claims = decode_segment::<Map<String, Value>>(segments.payload)
            .map_err(|e| VerifyError::ClaimShape(format!("payload: {e}")))?;
        check_time_window(&claims, now, self.leeway_secs)?;

        let claims = SessionClaims::from_map(claims)?;
        Ok(VerifiedSession {
            identity: claims.to_identity()?,
            session_id: claims.session_id()?,
            expires_at: claims.expires_at()?,
        })
    }

    fn check_signature(&self, segments: &Segments<'_>) -> Result<(), VerifyError> {
        let valid = jsonwebtoken::crypto::verify(
            segments.signature,
            segments.signed_message.as_bytes(),
            self.key.decoding_key(),
            TOKEN_ALGORITHM,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::Base64(_) => VerifyError::Malformed("signature encoding".to_string()),
            _ => VerifyError::SignatureInvalid,
        })?;

        if valid {
            Ok(())
        } else {
            Err(VerifyError::SignatureInvalid)
        }
    }
}

const EXPECTED_ALGORITHM: &str = "RS256";

struct Segments<'a> {
    header: &'a str,
    payload: &'a str,
    signature: &'a str,
    /// `header.payload`, the bytes the signature covers.
    signed_message: &'a str,
}

fn split_token(raw: &str) -> Result<Segments<'_>, VerifyError> {
    let malformed = || VerifyError::Malformed("expected three segments".to_string());

    let (signed_message, signature) = raw.rsplit_once('.').ok_or_else(malformed)?;
    let (header, payload) = signed_message.split_once('.').ok_or_else(malformed)?;
    if header.is_empty() || payload.is_empty() || payload.contains('.') {
        return Err(malformed());
    }

    Ok(Segments {
        header,
        payload,
        signature,
        signed_message,
    })
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, String> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| e.to_string())?;
    serde_json::from_slice(&bytes).map_err(|e| e.to_string())
}
