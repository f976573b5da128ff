//! Session store access with a bounded wait.
//!
//! Without a store, every verified token counts as active and nothing is
//! recorded. With one, any timeout or store failure surfaces as an error so
//! callers can fail closed. Records outlive the token by the verifier's
//! leeway so a token accepted past `exp` still finds its session.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use larder_auth::{SessionId, SessionRecord, SessionStore, SessionStoreError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store did not answer within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Store(#[from] SessionStoreError),
}

#[derive(Clone)]
pub struct Sessions {
    store: Option<Arc<dyn SessionStore>>,
    timeout: Duration,
    leeway: chrono::Duration,
}

impl Sessions {
    pub fn new(store: Arc<dyn SessionStore>, timeout: Duration) -> Self {
        Self {
            store: Some(store),
            timeout,
            leeway: chrono::Duration::zero(),
        }
    }

    /// Keep records `leeway_secs` past token expiry; match the verifier.
    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway = i64::try_from(leeway_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX);
        self
    }

    pub fn disabled() -> Self {
        Self {
            store: None,
            timeout: Duration::ZERO,
            leeway: chrono::Duration::zero(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub async fn record(&self, mut record: SessionRecord) -> Result<(), SessionError> {
        record.expires_at = record
            .expires_at
            .checked_add_signed(self.leeway)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        match &self.store {
            Some(store) => self.bounded(store.put(record)).await,
            None => Ok(()),
        }
    }

    pub async fn is_active(&self, session_id: SessionId, now: DateTime<Utc>) -> Result<bool, SessionError> {
        match &self.store {
            Some(store) => self.bounded(store.is_active(session_id, now)).await,
            None => Ok(true),
        }
    }

    /// Returns `true` when a live session was removed.
    pub async fn revoke(&self, session_id: SessionId) -> Result<bool, SessionError> {
        match &self.store {
            Some(store) => self.bounded(store.revoke(session_id)).await,
            None => Ok(false),
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, SessionStoreError>>,
    ) -> Result<T, SessionError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(SessionError::Timeout(self.timeout)),
        }
    }
}

impl std::fmt::Debug for Sessions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sessions")
            .field("enabled", &self.is_enabled())
            .field("timeout", &self.timeout)
            .field("leeway", &self.leeway)
            .finish()
    }
}
