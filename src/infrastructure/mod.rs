pub mod blockchain;
pub mod cache;
pub mod config;
pub mod explorer;
pub mod logger;
