//! sea-orm entities owned by the dispatch service.

pub mod auto_reply_rules;
pub mod messages;
pub mod tenants;
