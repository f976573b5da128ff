//! Redis-backed session store (optional).
//!
//! Records are stored as JSON under `<prefix><session id>` with a Redis TTL
//! matching the token's remaining lifetime, so expiry needs no sweeper.

use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use larder_auth::{SessionId, SessionRecord, SessionStore, SessionStoreError};

pub const DEFAULT_KEY_PREFIX: &str = "session:";

#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisSessionStore {
    pub async fn connect(redis_url: impl AsRef<str>, prefix: impl Into<String>) -> Result<Self, SessionStoreError> {
        let client = redis::Client::open(redis_url.as_ref()).map_err(unavailable)?;
        let conn = ConnectionManager::new(client).await.map_err(unavailable)?;
        Ok(Self {
            conn,
            prefix: prefix.into(),
        })
    }

    fn key(&self, session_id: SessionId) -> String {
        format!("{}{}", self.prefix, session_id)
    }
}

impl core::fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RedisSessionStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

fn unavailable(e: redis::RedisError) -> SessionStoreError {
    SessionStoreError::Unavailable(e.to_string())
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, record: SessionRecord) -> Result<(), SessionStoreError> {
        let Some(ttl) = record.ttl_secs(Utc::now()) else {
            return Ok(());
        };

        let payload =
            serde_json::to_string(&record).map_err(|e| SessionStoreError::Codec(e.to_string()))?;

        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(self.key(record.session_id), payload, ttl)
            .await
            .map_err(unavailable)
    }

    async fn get(&self, session_id: SessionId) -> Result<Option<SessionRecord>, SessionStoreError> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(self.key(session_id)).await.map_err(unavailable)?;

        payload
            .map(|p| serde_json::from_str(&p).map_err(|e| SessionStoreError::Codec(e.to_string())))
            .transpose()
    }

    async fn revoke(&self, session_id: SessionId) -> Result<bool, SessionStoreError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(self.key(session_id)).await.map_err(unavailable)?;
        Ok(removed > 0)
    }
}
