use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::{Identity, Role, SessionId, UserId};

/// The `sub` claim: who the token was issued to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubjectClaims {
    pub id: i64,
    pub name: String,
    pub roles: Vec<Role>,
}

/// Typed claim schema of a session token.
///
/// Timestamps are Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: SubjectClaims,
    pub token_uuid: Uuid,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (nbf is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("claim shape: {0}")]
    Shape(String),
}

impl SessionClaims {
    pub fn new(identity: &Identity, session_id: SessionId, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: SubjectClaims {
                id: identity.user_id().get(),
                name: identity.username().to_string(),
                roles: identity.roles().iter().cloned().collect(),
            },
            token_uuid: *session_id.as_uuid(),
            iat: issued_at.timestamp(),
            nbf: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Decode an already signature-checked claim map into the typed schema.
    pub fn from_map(map: Map<String, Value>) -> Result<Self, TokenValidationError> {
        serde_json::from_value(Value::Object(map))
            .map_err(|e| TokenValidationError::Shape(e.to_string()))
    }

    pub fn session_id(&self) -> Result<SessionId, TokenValidationError> {
        if self.token_uuid.get_version_num() != 4 {
            return Err(TokenValidationError::Shape(
                "token_uuid is not a v4 uuid".to_string(),
            ));
        }
        Ok(SessionId::from_uuid(self.token_uuid))
    }

    pub fn expires_at(&self) -> Result<DateTime<Utc>, TokenValidationError> {
        DateTime::from_timestamp(self.exp, 0)
            .ok_or_else(|| TokenValidationError::Shape("exp out of range".to_string()))
    }

    pub fn to_identity(&self) -> Result<Identity, TokenValidationError> {
        let user_id =
            UserId::new(self.sub.id).map_err(|e| TokenValidationError::Shape(e.to_string()))?;
        if self.sub.name.trim().is_empty() {
            return Err(TokenValidationError::Shape("sub.name is empty".to_string()));
        }
        Ok(Identity::new(
            user_id,
            self.sub.name.clone(),
            self.sub.roles.iter().cloned(),
        ))
    }
}

/// Check `iat`/`nbf`/`exp` of a verified but still untyped claim map.
///
/// Valid iff `nbf - leeway <= now <= exp + leeway` and `exp > iat`.
pub fn check_time_window(
    claims: &Map<String, Value>,
    now: DateTime<Utc>,
    leeway_secs: u64,
) -> Result<(), TokenValidationError> {
    let iat = numeric_claim(claims, "iat")?;
    let nbf = numeric_claim(claims, "nbf")?;
    let exp = numeric_claim(claims, "exp")?;

    if exp <= iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }

    let now = now.timestamp();
    let leeway = i64::try_from(leeway_secs).unwrap_or(i64::MAX);
    if now < nbf.saturating_sub(leeway) {
        return Err(TokenValidationError::NotYetValid);
    }
    if now > exp.saturating_add(leeway) {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

fn numeric_claim(claims: &Map<String, Value>, name: &'static str) -> Result<i64, TokenValidationError> {
    match claims.get(name) {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| TokenValidationError::Shape(format!("{name} is not an integer"))),
        Some(_) => Err(TokenValidationError::Shape(format!("{name} is not a number"))),
        None => Err(TokenValidationError::Shape(format!("missing {name}"))),
    }
}
