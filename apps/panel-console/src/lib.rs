pub mod client;
pub mod config;
pub mod history;
pub mod output;
pub mod session;
pub mod telemetry;
pub mod terminal;
