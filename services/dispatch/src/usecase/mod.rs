pub mod auto_reply;
pub mod broadcast;
pub mod delivery;
pub mod message;
pub mod scheduler;
pub mod signature;
pub mod webhook;
