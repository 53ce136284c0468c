//! Core identifiers and lifecycle types for snippet processing.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Unique identifier for one code submission; doubles as the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineId(Uuid);

impl PipelineId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PipelineId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for PipelineId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Source language of a submitted snippet; selects the stage set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Sdk {
    Java,
    Go,
    Python,
}

impl Sdk {
    /// Source file extension for this language.
    pub fn source_extension(&self) -> &'static str {
        match self {
            Self::Java => "java",
            Self::Go => "go",
            Self::Python => "py",
        }
    }

    /// Whether snippets go through a separate compile step.
    pub fn is_compiled(&self) -> bool {
        !matches!(self, Self::Python)
    }
}

/// Lifecycle status of a pipeline, as published to the cache.
///
/// Happy path: `Validating → Preparing → Compiling → Executing → Finished`.
/// Everything from `Finished` onward is terminal; once a terminal status is
/// written no further status writes happen for that pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Unspecified,
    Validating,
    Preparing,
    Compiling,
    Executing,
    Finished,
    ValidationError,
    PreparationError,
    CompileError,
    RunError,
    RunTimeout,
    Canceled,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "UNSPECIFIED",
            Self::Validating => "VALIDATING",
            Self::Preparing => "PREPARING",
            Self::Compiling => "COMPILING",
            Self::Executing => "EXECUTING",
            Self::Finished => "FINISHED",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::PreparationError => "PREPARATION_ERROR",
            Self::CompileError => "COMPILE_ERROR",
            Self::RunError => "RUN_ERROR",
            Self::RunTimeout => "RUN_TIMEOUT",
            Self::Canceled => "CANCELED",
            Self::Error => "ERROR",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Finished
                | Self::ValidationError
                | Self::PreparationError
                | Self::CompileError
                | Self::RunError
                | Self::RunTimeout
                | Self::Canceled
                | Self::Error
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of pipeline work, racing against cancel and the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    Validate,
    Prepare,
    Compile,
    Run,
}

impl Stage {
    /// Status entered when this stage succeeds.
    pub fn success_status(&self) -> Status {
        match self {
            Self::Validate => Status::Preparing,
            Self::Prepare => Status::Compiling,
            Self::Compile => Status::Executing,
            Self::Run => Status::Finished,
        }
    }

    /// Terminal status reported when this stage fails.
    pub fn error_status(&self) -> Status {
        match self {
            Self::Validate => Status::ValidationError,
            Self::Prepare => Status::PreparationError,
            Self::Compile => Status::CompileError,
            Self::Run => Status::RunError,
        }
    }
}
