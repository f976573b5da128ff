//! Session store implementations.
//!
//! The contract lives in `larder-auth` (`SessionStore`); this module provides
//! an in-memory store for tests/dev and a Redis-backed one for deployments.

pub mod in_memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use in_memory::InMemorySessionStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisSessionStore;
