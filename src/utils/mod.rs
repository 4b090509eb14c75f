pub mod config;
pub mod constants;
pub mod env_guard;
pub mod word;
