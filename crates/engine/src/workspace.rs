//! Per-pipeline scratch directories.
//!
//! Every pipeline owns `{root}/{id}` with `src/` holding the submitted
//! snippet and `bin/` receiving compilation artifacts. The workspace knows
//! how to derive the source/executable path triple per SDK and how to
//! recover the compiled executable's name after the compile stage.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::{PipelineId, Sdk};
use crate::error::{Error, Result};

const SRC_DIR: &str = "src";
const BIN_DIR: &str = "bin";
const SOURCE_STEM: &str = "snippet";

#[derive(Debug, Clone)]
pub struct PipelineWorkspace {
    id: PipelineId,
    sdk: Sdk,
    base_dir: PathBuf,
}

impl PipelineWorkspace {
    /// Create the directory layout under `root` and write the snippet source.
    pub async fn create(root: &Path, id: PipelineId, sdk: Sdk, source: &str) -> Result<Self> {
        let base_dir = root.join(id.to_string());
        tokio::fs::create_dir_all(base_dir.join(SRC_DIR)).await?;
        tokio::fs::create_dir_all(base_dir.join(BIN_DIR)).await?;

        let workspace = Self { id, sdk, base_dir };
        tokio::fs::write(workspace.source_file(), source).await?;

        debug!(pipeline_id = %id, dir = %workspace.base_dir.display(), "workspace created");
        Ok(workspace)
    }

    pub fn id(&self) -> PipelineId {
        self.id
    }

    pub fn sdk(&self) -> Sdk {
        self.sdk
    }

    /// Directory the pipeline's stages run in.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the submitted source file.
    pub fn source_file(&self) -> PathBuf {
        self.base_dir
            .join(SRC_DIR)
            .join(format!("{SOURCE_STEM}.{}", self.sdk.source_extension()))
    }

    /// Directory receiving compilation artifacts.
    pub fn bin_dir(&self) -> PathBuf {
        self.base_dir.join(BIN_DIR)
    }

    /// Where the runnable artifact lives after a successful compile.
    ///
    /// For Java this is the classpath directory; interpreted languages run
    /// straight from the source file.
    pub fn executable_file(&self) -> PathBuf {
        match self.sdk {
            Sdk::Java => self.bin_dir(),
            Sdk::Go => self.bin_dir().join(SOURCE_STEM),
            Sdk::Python => self.source_file(),
        }
    }

    /// Name of the executable produced by compilation.
    ///
    /// Java scans `bin/` for a top-level class file, since the snippet's
    /// class name is not constrained by the source file name.
    pub async fn executable_name(&self) -> Result<String> {
        match self.sdk {
            Sdk::Java => {
                let bin_dir = self.bin_dir();
                let mut entries = tokio::fs::read_dir(&bin_dir).await?;
                while let Some(entry) = entries.next_entry().await? {
                    let path = entry.path();
                    if path.extension().and_then(|ext| ext.to_str()) == Some("class")
                        && let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
                        && !stem.contains('$')
                    {
                        return Ok(stem.to_string());
                    }
                }
                Err(Error::setup(format!(
                    "no compiled class found in {}",
                    bin_dir.display()
                )))
            }
            Sdk::Go => Ok(SOURCE_STEM.to_string()),
            Sdk::Python => Ok(format!("{SOURCE_STEM}.{}", self.sdk.source_extension())),
        }
    }

    /// Delete the scratch directory tree.
    ///
    /// Synchronous so [`WorkspaceGuard`] can run it from `Drop`. A second
    /// call fails (the directory is gone); callers log that rather than
    /// propagate it.
    pub fn delete_folders(&self) -> Result<()> {
        std::fs::remove_dir_all(&self.base_dir)?;
        Ok(())
    }
}

/// Deletes the workspace when dropped, so cleanup runs on every exit path of
/// the driver, including panics.
pub struct WorkspaceGuard {
    workspace: PipelineWorkspace,
}

impl WorkspaceGuard {
    pub fn new(workspace: PipelineWorkspace) -> Self {
        Self { workspace }
    }

    pub fn workspace(&self) -> &PipelineWorkspace {
        &self.workspace
    }
}

impl Drop for WorkspaceGuard {
    fn drop(&mut self) {
        if let Err(error) = self.workspace.delete_folders() {
            warn!(
                pipeline_id = %self.workspace.id,
                %error,
                "failed to delete pipeline workspace"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn workspace(sdk: Sdk, source: &str) -> (TempDir, PipelineWorkspace) {
        let root = TempDir::new().unwrap();
        let workspace = PipelineWorkspace::create(root.path(), PipelineId::new(), sdk, source)
            .await
            .unwrap();
        (root, workspace)
    }

    #[tokio::test]
    async fn create_writes_the_source_file() {
        let (_root, workspace) = workspace(Sdk::Go, "package main").await;

        let written = tokio::fs::read_to_string(workspace.source_file())
            .await
            .unwrap();
        assert_eq!(written, "package main");
        assert!(workspace.bin_dir().is_dir());
    }

    #[tokio::test]
    async fn path_triple_per_sdk() {
        let (_root, java) = workspace(Sdk::Java, "class A {}").await;
        assert!(java.source_file().ends_with("src/snippet.java"));
        assert_eq!(java.executable_file(), java.bin_dir());

        let (_root, python) = workspace(Sdk::Python, "print(1)").await;
        assert_eq!(python.executable_file(), python.source_file());
    }

    #[tokio::test]
    async fn java_executable_name_skips_inner_classes() {
        let (_root, workspace) = workspace(Sdk::Java, "class A {}").await;
        tokio::fs::write(workspace.bin_dir().join("Main$1.class"), b"")
            .await
            .unwrap();
        tokio::fs::write(workspace.bin_dir().join("Main.class"), b"")
            .await
            .unwrap();

        assert_eq!(workspace.executable_name().await.unwrap(), "Main");
    }

    #[tokio::test]
    async fn java_executable_name_fails_without_classes() {
        let (_root, workspace) = workspace(Sdk::Java, "class A {}").await;
        assert!(matches!(
            workspace.executable_name().await,
            Err(Error::Setup(_))
        ));
    }

    #[tokio::test]
    async fn delete_twice_errors_the_second_time() {
        let (_root, workspace) = workspace(Sdk::Python, "print(1)").await;

        workspace.delete_folders().unwrap();
        assert!(!workspace.base_dir().exists());
        assert!(workspace.delete_folders().is_err());
    }

    #[tokio::test]
    async fn guard_deletes_on_drop() {
        let (_root, workspace) = workspace(Sdk::Python, "print(1)").await;
        let base_dir = workspace.base_dir().to_path_buf();

        drop(WorkspaceGuard::new(workspace));
        assert!(!base_dir.exists());
    }
}
