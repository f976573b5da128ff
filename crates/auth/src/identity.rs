use std::collections::BTreeSet;

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("user id must be positive, got {0}")]
pub struct InvalidUserId(pub i64);

/// Numeric identifier of a user account. Always positive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    pub fn new(value: i64) -> Result<Self, InvalidUserId> {
        if value <= 0 {
            return Err(InvalidUserId(value));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<i64> for UserId {
    type Error = InvalidUserId;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for UserId {
    type Err = InvalidUserId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<i64>().map_err(|_| InvalidUserId(0))?;
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = i64::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

/// Identifier of one issued session token (the `token_uuid` claim).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Fresh random (v4) session id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SessionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// The authenticated caller of a request.
///
/// Built once per request from verified claims and read-only afterwards, so
/// the fields are private and only exposed through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    user_id: UserId,
    username: String,
    roles: BTreeSet<Role>,
}

impl Identity {
    pub fn new(
        user_id: UserId,
        username: impl Into<String>,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        Self {
            user_id,
            username: username.into(),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.as_str() == role)
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(Role::is_admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_rejects_non_positive_values() {
        assert!(UserId::new(0).is_err());
        assert!(UserId::new(-3).is_err());
        assert_eq!(UserId::new(5).unwrap().get(), 5);
        assert!("abc".parse::<UserId>().is_err());
        assert_eq!("42".parse::<UserId>().unwrap().get(), 42);
    }

    #[test]
    fn user_id_deserialization_is_validated() {
        assert!(serde_json::from_str::<UserId>("0").is_err());
        assert!(serde_json::from_str::<UserId>("\"1\"").is_err());
        assert_eq!(serde_json::from_str::<UserId>("9").unwrap().get(), 9);
    }

    #[test]
    fn duplicate_roles_collapse() {
        let identity = Identity::new(
            UserId::new(1).unwrap(),
            "alice",
            vec![Role::USER, Role::new("user"), Role::ADMIN],
        );

        assert_eq!(identity.roles().len(), 2);
        assert!(identity.is_admin());
        assert!(identity.has_role("user"));
        assert!(!identity.has_role("manager"));
    }

    #[test]
    fn role_order_does_not_affect_equality() {
        let uid = UserId::new(3).unwrap();
        let a = Identity::new(uid, "bob", vec![Role::USER, Role::ADMIN]);
        let b = Identity::new(uid, "bob", vec![Role::ADMIN, Role::USER, Role::USER]);
        assert_eq!(a, b);
    }
}
