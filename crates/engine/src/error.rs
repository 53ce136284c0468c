//! Application-wide error types.

use thiserror::Error;

use crate::cache::SubKey;
use crate::domain::PipelineId;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{title}: {detail}")]
    NotFound { title: String, detail: String },

    #[error("{title}: {detail}")]
    Internal { title: String, detail: String },

    #[error("no cached value for {sub_key} under pipeline {id}")]
    CacheMiss { id: PipelineId, sub_key: SubKey },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Preparation error: {0}")]
    Preparation(String),

    #[error("Setup error: {0}")]
    Setup(String),

    #[error("exit status {0}")]
    CommandExit(i32),

    #[error(transparent)]
    Capture(#[from] process_capture::CaptureError),

    #[error("pipeline deadline elapsed")]
    DeadlineElapsed,

    #[error("code processing was canceled")]
    Canceled,
}

impl Error {
    pub fn not_found(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::NotFound {
            title: title.into(),
            detail: detail.into(),
        }
    }

    pub fn internal(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Internal {
            title: title.into(),
            detail: detail.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn setup(msg: impl Into<String>) -> Self {
        Self::Setup(msg.into())
    }
}
