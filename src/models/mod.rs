pub mod server_record;
pub mod view_models;

pub use server_record::{OnlineState, ServerListSnapshot, ServerRecord};
