//! Shared result cache for pipeline executions.
//!
//! Each pipeline owns a set of typed slots selected by [`SubKey`]. The
//! engine writes status and output into them; clients poll them through the
//! read API in [`api`]. Slots carry a [`CacheValue`] arm matching their
//! meaning, so a reader that finds the wrong arm reports an internal error
//! instead of downcasting blindly.

mod api;
mod memory;

pub use api::{get_last_index, get_processing_output, get_processing_status};
pub use memory::InMemoryCache;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::domain::{PipelineId, Status};
use crate::error::Result;

/// Slot selector under one pipeline's cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SubKey {
    /// Current [`Status`] of the pipeline.
    Status,
    /// Output of the run stage, appended to incrementally while running.
    RunOutput,
    /// Error payload of a failed run stage.
    RunError,
    /// Output of the compile stage (or its error payload on failure).
    CompileOutput,
    /// Client-driven cancel flag.
    Canceled,
    /// Index of the last streamed run-output chunk, for incremental readers.
    RunOutputIndex,
}

/// Value stored in one cache slot.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Status(Status),
    Text(String),
    Flag(bool),
    Index(usize),
}

impl CacheValue {
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_status(&self) -> Option<Status> {
        match self {
            Self::Status(status) => Some(*status),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(*index),
            _ => None,
        }
    }
}

impl From<Status> for CacheValue {
    fn from(status: Status) -> Self {
        Self::Status(status)
    }
}

impl From<String> for CacheValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for CacheValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<bool> for CacheValue {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl From<usize> for CacheValue {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Keyed store shared between the engine and its readers.
///
/// Absence of a slot is an error. Implementations must be safe for
/// concurrent access across different pipeline ids; the engine serializes
/// writes within one pipeline itself.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, id: PipelineId, sub_key: SubKey) -> Result<CacheValue>;

    async fn set(&self, id: PipelineId, sub_key: SubKey, value: CacheValue) -> Result<()>;
}
