//! HTTP API: configuration, identity middleware, policy guards and routes.

pub mod app;
pub mod config;
pub mod context;
pub mod cookie;
pub mod guard;
pub mod middleware;
pub mod sessions;
