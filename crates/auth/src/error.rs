//! Error taxonomy of the auth boundary.

use thiserror::Error;

use crate::{AuthzError, IssueError, KeyError, VerifyError};

/// How a failure surfaces to callers.
///
/// - `Config`: bad key material, fatal at startup
/// - `Issuance`: signing failed, a server error that is never retried
/// - `Verification`: any token problem, reported uniformly as unauthenticated
/// - `Authorization`: identity established but policy denied
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("configuration: {0}")]
    Config(#[from] KeyError),

    #[error("issuance: {0}")]
    Issuance(#[from] IssueError),

    #[error("verification: {0}")]
    Verification(#[from] VerifyError),

    #[error("authorization: {0}")]
    Authorization(#[from] AuthzError),
}

impl AuthError {
    /// HTTP status code this error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::Config(_) | AuthError::Issuance(_) => 500,
            AuthError::Verification(_) => 401,
            AuthError::Authorization(_) => 403,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        assert_eq!(AuthError::from(VerifyError::Expired).status_code(), 401);
        assert_eq!(AuthError::from(VerifyError::SignatureInvalid).status_code(), 401);
        assert_eq!(AuthError::from(AuthzError::NotAdmin).status_code(), 403);
        assert_eq!(
            AuthError::from(IssueError::Signing("boom".to_string())).status_code(),
            500
        );
        assert_eq!(AuthError::from(KeyError::MissingPrivateKey).status_code(), 500);
    }
}
