pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod notifier;
pub mod state;
pub mod tasks;
pub mod validation;
