use std::io;

use herd_core::remote::RemoteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] herd_core::Error),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No record fields provided; use --data or --field")]
    EmptyPayload,
    #[error("Invalid field {0:?}; expected key=value")]
    InvalidField(String),
    #[error("Invalid record data: {0}")]
    InvalidPayload(String),
    #[error("Record ID cannot be empty")]
    EmptyRecordId,
    #[error("Configuration error: {0}")]
    Config(String),
}
