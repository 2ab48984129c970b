pub mod config;
pub mod paiza;
pub mod types;
