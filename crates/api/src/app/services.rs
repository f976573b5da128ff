//! Service wiring shared by all handlers.

use std::sync::Arc;

use thiserror::Error;

use larder_auth::{
    DirectoryError, Identity, Role, SessionStore, TokenIssuer, TokenVerifier, UserDirectory, UserId,
};
use larder_infra::{InMemorySessionStore, InMemoryUserDirectory};

use crate::config::{ApiConfig, BootstrapAdmin, SessionStoreKind};
use crate::sessions::Sessions;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("session store: {0}")]
    SessionStore(String),

    #[error("bootstrap admin: {0}")]
    Bootstrap(#[from] DirectoryError),
}

#[derive(Clone)]
pub struct AppServices {
    /// Absent when the process only verifies tokens.
    pub issuer: Option<TokenIssuer>,
    pub verifier: TokenVerifier,
    pub directory: Arc<dyn UserDirectory>,
    pub sessions: Sessions,
    pub secure_cookies: bool,
}

impl AppServices {
    pub async fn from_config(config: &ApiConfig) -> Result<Self, ServiceError> {
        let issuer = config
            .keys
            .signing()
            .ok()
            .map(|key| TokenIssuer::new(key.clone(), config.token_ttl));
        let verifier = TokenVerifier::new(config.keys.verifying().clone()).with_leeway(config.leeway_secs);

        let directory = InMemoryUserDirectory::new();
        if let Some(admin) = &config.bootstrap_admin {
            seed_admin(&directory, admin)?;
        }

        let sessions = match &config.session_store {
            SessionStoreKind::Memory => {
                Sessions::new(Arc::new(InMemorySessionStore::new()), config.session_timeout)
                    .with_leeway(config.leeway_secs)
            }
            SessionStoreKind::Redis { url } => {
                Sessions::new(connect_redis(url).await?, config.session_timeout).with_leeway(config.leeway_secs)
            }
            SessionStoreKind::Disabled => {
                tracing::warn!("session store disabled; logout cannot revoke tokens");
                Sessions::disabled()
            }
        };

        Ok(Self {
            issuer,
            verifier,
            directory: Arc::new(directory),
            sessions,
            secure_cookies: config.secure_cookies,
        })
    }
}

fn seed_admin(directory: &InMemoryUserDirectory, admin: &BootstrapAdmin) -> Result<(), DirectoryError> {
    let user_id = UserId::new(1).map_err(|e| DirectoryError::Unavailable(e.to_string()))?;
    let identity = Identity::new(user_id, admin.username.clone(), [Role::ADMIN, Role::USER]);
    directory.insert(identity, &admin.password)?;
    tracing::info!(username = %admin.username, "bootstrap admin registered");
    Ok(())
}

#[cfg(feature = "redis")]
async fn connect_redis(url: &str) -> Result<Arc<dyn SessionStore>, ServiceError> {
    let store = larder_infra::RedisSessionStore::connect(url, larder_infra::session_store::redis::DEFAULT_KEY_PREFIX)
        .await
        .map_err(|e| ServiceError::SessionStore(e.to_string()))?;
    tracing::info!("using redis session store");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "redis"))]
async fn connect_redis(_url: &str) -> Result<Arc<dyn SessionStore>, ServiceError> {
    Err(ServiceError::SessionStore(
        "redis session store requested but the `redis` feature is not enabled".to_string(),
    ))
}
