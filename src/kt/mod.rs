pub mod bkt;
pub mod config;
pub mod difficulty;
pub mod engine;
pub mod session;
pub mod store;
pub mod types;
