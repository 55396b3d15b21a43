pub mod backend;
pub mod client;
pub mod config;
pub mod models;
pub mod server;
pub mod session;
pub mod telemetry;
pub mod views;
