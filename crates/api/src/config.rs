//! Process configuration, read once from the environment at startup.

use std::path::PathBuf;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

use larder_auth::{KeyError, KeyMaterial};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 15;
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1/";
pub const DEFAULT_SESSION_STORE_TIMEOUT_MS: u64 = 250;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Key(#[from] KeyError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStoreKind {
    Memory,
    Redis { url: String },
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub keys: KeyMaterial,
    pub token_ttl: chrono::Duration,
    pub leeway_secs: u64,
    pub secure_cookies: bool,
    pub session_store: SessionStoreKind,
    pub session_timeout: Duration,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let private_pem = read_pem(&var, "AUTH_PRIVATE_KEY", "AUTH_PRIVATE_KEY_FILE")?;
        let public_pem = read_pem(&var, "AUTH_PUBLIC_KEY", "AUTH_PUBLIC_KEY_FILE")?
            .ok_or(ConfigError::Missing("AUTH_PUBLIC_KEY or AUTH_PUBLIC_KEY_FILE"))?;
        let keys = KeyMaterial::from_pem(private_pem.as_deref(), &public_pem)?;
        if !keys.can_issue() {
            tracing::warn!("no private key configured; login is disabled");
        }

        let ttl_minutes = parse_or(&var, "AUTH_TOKEN_TTL_MINUTES", DEFAULT_TOKEN_TTL_MINUTES)?;
        if ttl_minutes <= 0 {
            return Err(ConfigError::Invalid {
                var: "AUTH_TOKEN_TTL_MINUTES",
                reason: "must be positive".to_string(),
            });
        }
        let token_ttl = chrono::Duration::try_minutes(ttl_minutes).ok_or_else(|| ConfigError::Invalid {
            var: "AUTH_TOKEN_TTL_MINUTES",
            reason: format!("{ttl_minutes} minutes is out of range"),
        })?;

        let store = var("SESSION_STORE").map(|v| v.to_ascii_lowercase());
        let session_store = match store.as_deref() {
            None | Some("memory") => SessionStoreKind::Memory,
            Some("redis") => SessionStoreKind::Redis {
                url: var("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
            },
            Some("none") => SessionStoreKind::Disabled,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "SESSION_STORE",
                    reason: format!("expected memory, redis or none, got '{other}'"),
                });
            }
        };

        let bootstrap_admin = match (var("BOOTSTRAP_ADMIN_USERNAME"), var("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(BootstrapAdmin { username, password }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid {
                    var: "BOOTSTRAP_ADMIN_USERNAME",
                    reason: "username and password must be set together".to_string(),
                });
            }
        };

        Ok(Self {
            bind_addr,
            keys,
            token_ttl,
            leeway_secs: parse_or(&var, "AUTH_LEEWAY_SECONDS", 0)?,
            secure_cookies: parse_or(&var, "AUTH_SECURE_COOKIES", false)?,
            session_store,
            session_timeout: Duration::from_millis(parse_or(
                &var,
                "SESSION_STORE_TIMEOUT_MS",
                DEFAULT_SESSION_STORE_TIMEOUT_MS,
            )?),
            bootstrap_admin,
        })
    }
}

/// Inline base64 PEM wins over a PEM file path.
fn read_pem(
    var: &impl Fn(&str) -> Option<String>,
    inline: &'static str,
    file: &'static str,
) -> Result<Option<Vec<u8>>, ConfigError> {
    if let Some(encoded) = var(inline) {
        return STANDARD
            .decode(encoded)
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                var: inline,
                reason: format!("not base64: {e}"),
            });
    }

    match var(file) {
        Some(path) => {
            let path = PathBuf::from(path);
            std::fs::read(&path)
                .map(Some)
                .map_err(|source| ConfigError::Io { path, source })
        }
        None => Ok(None),
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const PRIVATE_PEM: &str = include_str!("../../auth/testdata/primary.pem");
    const PUBLIC_PEM: &str = include_str!("../../auth/testdata/primary.pub.pem");

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_with_only_a_public_key() {
        let public = STANDARD.encode(PUBLIC_PEM);
        let cfg = ApiConfig::from_lookup(lookup(&[("AUTH_PUBLIC_KEY", &public)])).unwrap();

        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR);
        assert!(!cfg.keys.can_issue());
        assert_eq!(cfg.token_ttl, chrono::Duration::minutes(15));
        assert_eq!(cfg.leeway_secs, 0);
        assert!(!cfg.secure_cookies);
        assert_eq!(cfg.session_store, SessionStoreKind::Memory);
        assert_eq!(cfg.session_timeout, Duration::from_millis(250));
        assert!(cfg.bootstrap_admin.is_none());
    }

    #[test]
    fn full_configuration_is_parsed() {
        let private = STANDARD.encode(PRIVATE_PEM);
        let public = STANDARD.encode(PUBLIC_PEM);
        let cfg = ApiConfig::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("AUTH_PRIVATE_KEY", &private),
            ("AUTH_PUBLIC_KEY", &public),
            ("AUTH_TOKEN_TTL_MINUTES", "60"),
            ("AUTH_LEEWAY_SECONDS", "5"),
            ("AUTH_SECURE_COOKIES", "true"),
            ("SESSION_STORE", "redis"),
            ("SESSION_STORE_TIMEOUT_MS", "100"),
            ("BOOTSTRAP_ADMIN_USERNAME", "root"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "hunter2"),
        ]))
        .unwrap();

        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
        assert!(cfg.keys.can_issue());
        assert_eq!(cfg.token_ttl, chrono::Duration::minutes(60));
        assert_eq!(cfg.leeway_secs, 5);
        assert!(cfg.secure_cookies);
        assert_eq!(
            cfg.session_store,
            SessionStoreKind::Redis {
                url: DEFAULT_REDIS_URL.to_string()
            }
        );
        assert_eq!(cfg.session_timeout, Duration::from_millis(100));
        assert_eq!(cfg.bootstrap_admin.unwrap().username, "root");
    }

    #[test]
    fn public_key_is_required() {
        let err = ApiConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn bad_key_material_is_a_config_error() {
        let garbage = STANDARD.encode("not a pem");
        let err = ApiConfig::from_lookup(lookup(&[("AUTH_PUBLIC_KEY", &garbage)])).unwrap_err();
        assert!(matches!(err, ConfigError::Key(KeyError::Parse { .. })));

        let err = ApiConfig::from_lookup(lookup(&[("AUTH_PUBLIC_KEY", "%%%")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "AUTH_PUBLIC_KEY", .. }));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let public = STANDARD.encode(PUBLIC_PEM);
        for (name, value) in [
            ("AUTH_TOKEN_TTL_MINUTES", "0"),
            ("AUTH_TOKEN_TTL_MINUTES", "soon"),
            ("AUTH_TOKEN_TTL_MINUTES", "9223372036854775807"),
            ("AUTH_SECURE_COOKIES", "yes please"),
            ("SESSION_STORE", "postgres"),
            ("BOOTSTRAP_ADMIN_USERNAME", "root"),
        ] {
            let res = ApiConfig::from_lookup(lookup(&[("AUTH_PUBLIC_KEY", &public), (name, value)]));
            assert!(
                matches!(res, Err(ConfigError::Invalid { .. })),
                "{name}={value} should be rejected"
            );
        }
    }

    #[test]
    fn session_store_can_be_disabled() {
        let public = STANDARD.encode(PUBLIC_PEM);
        let cfg = ApiConfig::from_lookup(lookup(&[("AUTH_PUBLIC_KEY", &public), ("SESSION_STORE", "NONE")])).unwrap();
        assert_eq!(cfg.session_store, SessionStoreKind::Disabled);
    }
}
