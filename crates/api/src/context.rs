use chrono::{DateTime, Utc};

use larder_auth::{Identity, SessionId, UserId, VerifiedSession};

/// Verified identity for a request.
///
/// Inserted into request extensions by the identity middleware; handlers
/// behind `require_identity` can rely on its presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    identity: Identity,
    session_id: SessionId,
    expires_at: DateTime<Utc>,
}

impl IdentityContext {
    pub fn new(session: VerifiedSession) -> Self {
        Self {
            identity: session.identity,
            session_id: session.session_id,
            expires_at: session.expires_at,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// Owner of the resource addressed by the request path.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OwnerContext {
    owner_id: UserId,
}

impl OwnerContext {
    pub fn new(owner_id: UserId) -> Self {
        Self { owner_id }
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }
}
