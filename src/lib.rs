//! Daily market and weather digests pushed to chat webhooks.

pub mod config;
pub mod errors;
pub mod http_client;
pub mod jobs;
pub mod logger;
pub mod message;
pub mod notify;
pub mod quotes;
pub mod weather;
