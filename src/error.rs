//! Error type shared by the store, configuration and command layers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskMasterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Item {0} not found")]
    NotFound(u64),

    #[error("No item found with title '{0}'")]
    NoMatch(String),

    #[error("Multiple items are titled '{title}' (IDs: {ids}). Please use the specific ID instead.")]
    Ambiguous { title: String, ids: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, TaskMasterError>;
