pub mod config;
pub mod metrics;
pub mod nrc_client;
pub mod types;
