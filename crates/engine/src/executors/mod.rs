//! SDK executors: how each language validates, prepares, compiles and runs.
//!
//! Validate and prepare run in-process; compile and run describe external
//! commands. The driver stays language-agnostic by working against
//! [`SdkExecutor`] and [`ExecutorFactory`]; language selection happens once,
//! inside the factory.

mod go;
mod java;
mod python;

pub use go::GoExecutor;
pub use java::JavaExecutor;
pub use python::PythonExecutor;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;

use crate::domain::Sdk;
use crate::error::{Error, Result};
use crate::workspace::PipelineWorkspace;

/// Capability bundle for one submission.
#[async_trait]
pub trait SdkExecutor: Send + Sync {
    /// Check the submitted snippet before any work is spent on it.
    async fn validate(&self) -> Result<()>;

    /// Put the workspace in shape for compilation and execution.
    async fn prepare(&self) -> Result<()>;

    /// External compile command, or `None` for languages that run from source.
    fn compile_command(&self) -> Option<Command>;

    /// External run command.
    fn run_command(&self) -> Command;
}

/// Builds executors for a pipeline, including the run-specialized rebuild
/// used once compilation has revealed the executable's name.
pub trait ExecutorFactory: Send + Sync {
    fn build(&self) -> Result<Arc<dyn SdkExecutor>>;

    fn with_executable_name(&self, name: &str) -> Result<Arc<dyn SdkExecutor>>;
}

/// Production factory dispatching on the workspace's SDK.
pub struct SdkExecutorFactory {
    workspace: PipelineWorkspace,
}

impl SdkExecutorFactory {
    pub fn new(workspace: PipelineWorkspace) -> Self {
        Self { workspace }
    }
}

impl ExecutorFactory for SdkExecutorFactory {
    fn build(&self) -> Result<Arc<dyn SdkExecutor>> {
        Ok(match self.workspace.sdk() {
            Sdk::Java => Arc::new(JavaExecutor::new(self.workspace.clone())),
            Sdk::Go => Arc::new(GoExecutor::new(self.workspace.clone())),
            Sdk::Python => Arc::new(PythonExecutor::new(self.workspace.clone())),
        })
    }

    fn with_executable_name(&self, name: &str) -> Result<Arc<dyn SdkExecutor>> {
        match self.workspace.sdk() {
            Sdk::Java => Ok(Arc::new(JavaExecutor::with_main_class(
                self.workspace.clone(),
                name,
            ))),
            _ => self.build(),
        }
    }
}

/// Shared validate implementation: the snippet must exist as a regular file.
///
/// An empty file is acceptable; deciding what empty input means is the
/// interpreter's or compiler's job.
pub(crate) async fn validate_source(workspace: &PipelineWorkspace) -> Result<()> {
    let path = workspace.source_file();
    let metadata = tokio::fs::metadata(&path).await.map_err(|_| {
        Error::Validation(format!("source file {} is missing", path.display()))
    })?;
    if !metadata.is_file() {
        return Err(Error::Validation(format!(
            "{} is not a regular file",
            path.display()
        )));
    }
    Ok(())
}

/// Shared prepare implementation: make sure the artifact directory exists.
pub(crate) async fn ensure_bin_dir(workspace: &PipelineWorkspace) -> Result<()> {
    let bin_dir = workspace.bin_dir();
    tokio::fs::create_dir_all(&bin_dir).await.map_err(|error| {
        Error::Preparation(format!("cannot create {}: {error}", bin_dir.display()))
    })
}
