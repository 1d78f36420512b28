pub mod dashboard;
pub mod data_source;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod view_state;

#[macro_use]
extern crate rust_i18n;

// Load all translations from the locales directory
i18n!("locales", fallback = "en");

pub use error::DashboardError;
