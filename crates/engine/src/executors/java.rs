//! Java executor: `javac` into `bin/`, run via the discovered main class.

use async_trait::async_trait;
use tokio::process::Command;

use super::{SdkExecutor, ensure_bin_dir, validate_source};
use crate::error::Result;
use crate::workspace::PipelineWorkspace;

/// Class launched when compilation has not revealed a better candidate.
const FALLBACK_MAIN_CLASS: &str = "Main";

pub struct JavaExecutor {
    workspace: PipelineWorkspace,
    main_class: Option<String>,
}

impl JavaExecutor {
    pub fn new(workspace: PipelineWorkspace) -> Self {
        Self {
            workspace,
            main_class: None,
        }
    }

    /// Run-specialized executor launching the given class.
    pub fn with_main_class(workspace: PipelineWorkspace, main_class: &str) -> Self {
        Self {
            workspace,
            main_class: Some(main_class.to_string()),
        }
    }
}

#[async_trait]
impl SdkExecutor for JavaExecutor {
    async fn validate(&self) -> Result<()> {
        validate_source(&self.workspace).await
    }

    async fn prepare(&self) -> Result<()> {
        ensure_bin_dir(&self.workspace).await
    }

    fn compile_command(&self) -> Option<Command> {
        let mut command = Command::new("javac");
        command
            .current_dir(self.workspace.base_dir())
            .arg("-d")
            .arg(self.workspace.bin_dir())
            .arg(self.workspace.source_file());
        Some(command)
    }

    fn run_command(&self) -> Command {
        let mut command = Command::new("java");
        command
            .current_dir(self.workspace.base_dir())
            .arg("-cp")
            .arg(self.workspace.bin_dir())
            .arg(self.main_class.as_deref().unwrap_or(FALLBACK_MAIN_CLASS));
        command
    }
}
