//! Go executor: `go build` into `bin/`, run the produced binary.

use async_trait::async_trait;
use tokio::process::Command;

use super::{SdkExecutor, ensure_bin_dir, validate_source};
use crate::error::Result;
use crate::workspace::PipelineWorkspace;

pub struct GoExecutor {
    workspace: PipelineWorkspace,
}

impl GoExecutor {
    pub fn new(workspace: PipelineWorkspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl SdkExecutor for GoExecutor {
    async fn validate(&self) -> Result<()> {
        validate_source(&self.workspace).await
    }

    async fn prepare(&self) -> Result<()> {
        ensure_bin_dir(&self.workspace).await
    }

    fn compile_command(&self) -> Option<Command> {
        let mut command = Command::new("go");
        command
            .current_dir(self.workspace.base_dir())
            .arg("build")
            .arg("-o")
            .arg(self.workspace.executable_file())
            .arg(self.workspace.source_file());
        Some(command)
    }

    fn run_command(&self) -> Command {
        let mut command = Command::new(self.workspace.executable_file());
        command.current_dir(self.workspace.base_dir());
        command
    }
}
