//! Infrastructure layer: session store and user directory adapters.

pub mod session_store;
pub mod user_directory;

pub use session_store::InMemorySessionStore;
#[cfg(feature = "redis")]
pub use session_store::RedisSessionStore;
pub use user_directory::InMemoryUserDirectory;
