//! Domain types shared across Courier crates.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers; `infra/` converts to and from them.

pub mod auto_reply;
pub mod id;
pub mod message;
pub mod pagination;
