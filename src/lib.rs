// src/lib.rs
// Library interface for subsentry
pub mod baseline;
pub mod cli;
pub mod config;
pub mod crtsh;
pub mod diff;
pub mod monitor;
pub mod notifier;
pub mod types;
