//! Session token lifecycle and authorization policies.
//!
//! No HTTP and no storage here: this crate signs and verifies tokens,
//! evaluates policies, and defines the session store and user directory
//! contracts that adapters implement.

pub mod authorize;
pub mod claims;
pub mod directory;
pub mod error;
pub mod identity;
pub mod issuer;
pub mod keys;
pub mod password;
pub mod roles;
pub mod session;
pub mod token;
pub mod verifier;

pub use authorize::{AuthorizationPolicy, AuthzError, ResourceContext, authorize};
pub use claims::{SessionClaims, SubjectClaims, TokenValidationError, check_time_window};
pub use directory::{DirectoryError, UserDirectory, UserRecord, authenticate};
pub use error::AuthError;
pub use identity::{Identity, InvalidUserId, SessionId, UserId};
pub use issuer::{IssueError, TOKEN_ALGORITHM, TokenIssuer};
pub use keys::{KeyError, KeyMaterial, SigningKey, VerifyingKey};
pub use password::{PasswordError, hash_password, verify_password};
pub use roles::Role;
pub use session::{SessionRecord, SessionStore, SessionStoreError};
pub use token::{SessionToken, VerifiedSession};
pub use verifier::{TokenVerifier, VerifyError};
