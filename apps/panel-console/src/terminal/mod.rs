pub mod agent;
pub mod app;
pub mod cli;
pub mod error;
pub mod render;
pub mod transcript;
