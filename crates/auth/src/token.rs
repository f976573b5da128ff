use chrono::{DateTime, Utc};

use crate::{Identity, SessionId};

/// A signed session token as handed out at login.
///
/// `raw` is the compact `header.payload.signature` string; the remaining fields
/// mirror what was signed into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub raw: String,
    pub session_id: SessionId,
    pub identity: Identity,
    pub issued_at: DateTime<Utc>,
    pub not_before: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionToken {
    /// Remaining lifetime at `now`, zero once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> chrono::Duration {
        (self.expires_at - now).max(chrono::Duration::zero())
    }
}

/// What a successful verification yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSession {
    pub identity: Identity,
    pub session_id: SessionId,
    pub expires_at: DateTime<Utc>,
}
