pub mod channel;
pub mod db;
pub mod retry;
