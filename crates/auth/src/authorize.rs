use serde::Serialize;
use thiserror::Error;

use crate::{Identity, UserId};

/// Authorization policies gating routes after authentication.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationPolicy {
    /// Caller must hold the `admin` role.
    AdminOnly,
    /// Caller must own the resource or hold the `admin` role.
    OwnerOrAdmin,
}

/// What the policy knows about the resource being accessed.
///
/// The owner id is resolved upstream (typically from the path); the policy
/// never looks it up itself.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ResourceContext {
    pub owner_id: Option<UserId>,
}

impl ResourceContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn owned_by(owner_id: UserId) -> Self {
        Self {
            owner_id: Some(owner_id),
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: no identity on request")]
    MissingIdentity,

    #[error("forbidden: resource owner could not be resolved")]
    MissingOwner,

    #[error("forbidden: admin role required")]
    NotAdmin,

    #[error("forbidden: caller does not own the resource")]
    NotOwner,
}

impl AuthorizationPolicy {
    pub fn evaluate(
        self,
        identity: Option<&Identity>,
        resource: &ResourceContext,
    ) -> Result<(), AuthzError> {
        authorize(identity, self, resource)
    }
}

/// Evaluate `policy` for the request's identity and resource.
///
/// - No IO
/// - No panics
/// - Never mutates the identity
pub fn authorize(
    identity: Option<&Identity>,
    policy: AuthorizationPolicy,
    resource: &ResourceContext,
) -> Result<(), AuthzError> {
    match policy {
        AuthorizationPolicy::AdminOnly => {
            let identity = identity.ok_or(AuthzError::MissingIdentity)?;
            if identity.is_admin() {
                Ok(())
            } else {
                Err(AuthzError::NotAdmin)
            }
        }
        AuthorizationPolicy::OwnerOrAdmin => {
            let owner_id = resource.owner_id.ok_or(AuthzError::MissingOwner)?;
            let identity = identity.ok_or(AuthzError::MissingIdentity)?;
            if identity.user_id() == owner_id || identity.is_admin() {
                Ok(())
            } else {
                Err(AuthzError::NotOwner)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    fn identity(id: i64, roles: Vec<Role>) -> Identity {
        Identity::new(UserId::new(id).unwrap(), format!("user{id}"), roles)
    }

    fn owner(id: i64) -> ResourceContext {
        ResourceContext::owned_by(UserId::new(id).unwrap())
    }

    #[test]
    fn admin_only_requires_admin_role() {
        let user = identity(1, vec![Role::USER]);
        let admin = identity(2, vec![Role::ADMIN]);

        assert_eq!(
            authorize(Some(&user), AuthorizationPolicy::AdminOnly, &ResourceContext::none()),
            Err(AuthzError::NotAdmin)
        );
        assert_eq!(
            authorize(Some(&admin), AuthorizationPolicy::AdminOnly, &ResourceContext::none()),
            Ok(())
        );
    }

    #[test]
    fn admin_only_without_identity_is_forbidden() {
        assert_eq!(
            AuthorizationPolicy::AdminOnly.evaluate(None, &ResourceContext::none()),
            Err(AuthzError::MissingIdentity)
        );
    }

    #[test]
    fn owner_passes_owner_or_admin() {
        let caller = identity(5, vec![]);
        assert_eq!(
            AuthorizationPolicy::OwnerOrAdmin.evaluate(Some(&caller), &owner(5)),
            Ok(())
        );
    }

    #[test]
    fn non_owner_is_forbidden() {
        let caller = identity(7, vec![]);
        assert_eq!(
            AuthorizationPolicy::OwnerOrAdmin.evaluate(Some(&caller), &owner(5)),
            Err(AuthzError::NotOwner)
        );
    }

    #[test]
    fn admin_overrides_ownership() {
        let caller = identity(7, vec![Role::ADMIN]);
        assert_eq!(
            AuthorizationPolicy::OwnerOrAdmin.evaluate(Some(&caller), &owner(5)),
            Ok(())
        );
    }

    #[test]
    fn unresolved_owner_is_forbidden_even_for_admins() {
        let caller = identity(7, vec![Role::ADMIN]);
        assert_eq!(
            AuthorizationPolicy::OwnerOrAdmin.evaluate(Some(&caller), &ResourceContext::none()),
            Err(AuthzError::MissingOwner)
        );
    }

    #[test]
    fn role_names_are_case_sensitive() {
        let caller = identity(7, vec![Role::new("Admin")]);
        assert_eq!(
            AuthorizationPolicy::AdminOnly.evaluate(Some(&caller), &ResourceContext::none()),
            Err(AuthzError::NotAdmin)
        );
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: OwnerOrAdmin passes exactly for the owner or an admin.
            #[test]
            fn owner_or_admin_matches_definition(
                caller in 1i64..1_000,
                resource_owner in 1i64..1_000,
                admin in any::<bool>(),
            ) {
                let roles = if admin { vec![Role::ADMIN] } else { vec![Role::USER] };
                let who = identity(caller, roles);
                let outcome = authorize(Some(&who), AuthorizationPolicy::OwnerOrAdmin, &owner(resource_owner));
                prop_assert_eq!(outcome.is_ok(), admin || caller == resource_owner);
            }

            /// Property: AdminOnly ignores the resource entirely.
            #[test]
            fn admin_only_ignores_owner(caller in 1i64..1_000, admin in any::<bool>()) {
                let roles = if admin { vec![Role::ADMIN] } else { vec![Role::USER] };
                let who = identity(caller, roles);
                let on_own = authorize(Some(&who), AuthorizationPolicy::AdminOnly, &owner(caller));
                let on_none = authorize(Some(&who), AuthorizationPolicy::AdminOnly, &ResourceContext::none());
                prop_assert_eq!(on_own, on_none);
                prop_assert_eq!(on_none.is_ok(), admin);
            }
        }
    }
}
