use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid status filter: {0}")]
    InvalidStatus(String),
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}
