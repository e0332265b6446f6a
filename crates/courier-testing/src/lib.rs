//! Test utilities for Courier services.
//!
//! Provides header builders, webhook signing and a fixture loader.
//! Import from dev-dependencies only, never in production code.

pub mod auth;
pub mod fixture;
pub mod signature;
