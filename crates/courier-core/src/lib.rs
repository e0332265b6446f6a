//! Cross-cutting plumbing shared by Courier services: tracing setup,
//! request-id middleware, JSON error bodies, health probes and config loading.

pub mod config;
pub mod error;
pub mod health;
pub mod identity;
pub mod middleware;
pub mod serde;
pub mod tracing;
