//! Terminal host for the server list page.

pub mod commands;
pub mod config;
pub mod service;

pub use commands::ViewerCommand;
pub use config::DashboardConfig;
pub use service::{CommandEffect, DashboardService, run};
