//! Session store contract used for revocation.
//!
//! A session record exists from login until natural expiry or logout. A
//! verified token whose session is no longer recorded is treated as revoked.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{SessionId, SessionToken, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn from_token(token: &SessionToken) -> Self {
        Self {
            session_id: token.session_id,
            user_id: token.identity.user_id(),
            issued_at: token.issued_at,
            expires_at: token.expires_at,
        }
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }

    /// Whole seconds the record must be kept, rounded up. `None` once past.
    pub fn ttl_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        let millis = (self.expires_at - now).num_milliseconds();
        if millis <= 0 {
            return None;
        }
        u64::try_from(millis).ok().map(|ms| ms.div_ceil(1000))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionStoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    #[error("session record codec: {0}")]
    Codec(String),
}

/// Key-value store of live sessions, keyed by session id.
///
/// Implementations must drop records once `expires_at` has passed; callers
/// bound every call with their own timeout.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, record: SessionRecord) -> Result<(), SessionStoreError>;

    async fn get(&self, session_id: SessionId) -> Result<Option<SessionRecord>, SessionStoreError>;

    /// Remove a session. Returns `true` when a live record was removed.
    async fn revoke(&self, session_id: SessionId) -> Result<bool, SessionStoreError>;

    async fn is_active(&self, session_id: SessionId, now: DateTime<Utc>) -> Result<bool, SessionStoreError> {
        Ok(self
            .get(session_id)
            .await?
            .is_some_and(|record| record.is_live(now)))
    }
}
