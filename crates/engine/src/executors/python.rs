//! Python executor: no compile step, run straight from source.

use async_trait::async_trait;
use tokio::process::Command;

use super::{SdkExecutor, validate_source};
use crate::error::Result;
use crate::workspace::PipelineWorkspace;

pub struct PythonExecutor {
    workspace: PipelineWorkspace,
}

impl PythonExecutor {
    pub fn new(workspace: PipelineWorkspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl SdkExecutor for PythonExecutor {
    async fn validate(&self) -> Result<()> {
        validate_source(&self.workspace).await
    }

    async fn prepare(&self) -> Result<()> {
        // Nothing to lay out; the interpreter reads the source in place.
        Ok(())
    }

    fn compile_command(&self) -> Option<Command> {
        None
    }

    fn run_command(&self) -> Command {
        let mut command = Command::new("python3");
        command
            .current_dir(self.workspace.base_dir())
            .arg(self.workspace.source_file());
        command
    }
}
