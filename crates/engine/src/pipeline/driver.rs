//! Top-level stage sequencing for one pipeline execution.

use std::sync::Arc;
use std::time::Duration;

use process_capture::MemorySink;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cache::Cache;
use crate::domain::{Sdk, Stage, Status};
use crate::error::{Error, Result};
use crate::executors::ExecutorFactory;
use crate::pipeline::reporter::StatusReporter;
use crate::pipeline::runner::{spawn_check_stage, spawn_command_stage};
use crate::pipeline::watcher::watch_cancellation;
use crate::streaming::RunOutputWriter;
use crate::workspace::{PipelineWorkspace, WorkspaceGuard};

/// Execute the full stage sequence for one submission.
///
/// Exactly one terminal status is published to the cache before this
/// returns, and the workspace is deleted on every exit path. The caller is
/// expected to have published [`Status::Validating`] when it accepted the
/// submission (see [`super::begin_processing`]); results are polled from the
/// cache, so nothing is returned here.
pub async fn execute(
    cache: Arc<dyn Cache>,
    factory: Arc<dyn ExecutorFactory>,
    workspace: PipelineWorkspace,
    timeout: Duration,
    parent: CancellationToken,
) {
    let id = workspace.id();
    let sdk = workspace.sdk();
    let reporter = StatusReporter::new(cache.clone(), id);

    let guard = WorkspaceGuard::new(workspace);
    let token = parent.child_token();
    let _stop_background = token.clone().drop_guard();
    let deadline = Instant::now() + timeout;

    // One watcher for the whole pipeline. The driver keeps a sender clone so
    // the channel stays open after the watcher reports and exits.
    let (cancel_tx, cancel_rx) = mpsc::channel(1);
    let _cancel_tx = cancel_tx.clone();
    tokio::spawn(watch_cancellation(cache.clone(), id, token.clone(), cancel_tx));

    let mut arbiter = StageArbiter {
        reporter: &reporter,
        deadline,
        token: &token,
        cancel_rx,
    };

    let mut executor = match factory.build() {
        Ok(executor) => executor,
        Err(error) => {
            reporter.setup_error(&error).await;
            return;
        }
    };

    info!(pipeline_id = %id, %sdk, "starting pipeline");

    let stage_executor = executor.clone();
    let (mut completed_rx, mut error_rx) =
        spawn_check_stage(async move { stage_executor.validate().await });
    if arbiter
        .settle(Stage::Validate, &mut completed_rx, &mut error_rx, None, None)
        .await
        .is_err()
    {
        return;
    }

    let stage_executor = executor.clone();
    let (mut completed_rx, mut error_rx) =
        spawn_check_stage(async move { stage_executor.prepare().await });
    if arbiter
        .settle(Stage::Prepare, &mut completed_rx, &mut error_rx, None, None)
        .await
        .is_err()
    {
        return;
    }

    match executor.compile_command() {
        Some(command) => {
            let stdout = MemorySink::new();
            let stderr = MemorySink::new();
            let (mut completed_rx, mut error_rx) = spawn_command_stage(
                command,
                Arc::new(stdout.clone()),
                Arc::new(stderr.clone()),
                token.child_token(),
            );
            if arbiter
                .settle(
                    Stage::Compile,
                    &mut completed_rx,
                    &mut error_rx,
                    Some(&stdout),
                    Some(&stderr),
                )
                .await
                .is_err()
            {
                return;
            }
        }
        None => {
            // Source-only languages transition straight through an empty
            // compile result.
            reporter
                .stage_success(Status::Executing, Some(String::new()))
                .await;
        }
    }

    // Java resolves the run entry point from what compilation produced.
    if sdk == Sdk::Java {
        let name = match guard.workspace().executable_name().await {
            Ok(name) => name,
            Err(error) => {
                reporter.setup_error(&error).await;
                return;
            }
        };
        executor = match factory.with_executable_name(&name) {
            Ok(executor) => executor,
            Err(error) => {
                reporter.setup_error(&error).await;
                return;
            }
        };
    }

    let stderr = MemorySink::new();
    let (mut completed_rx, mut error_rx) = spawn_command_stage(
        executor.run_command(),
        Arc::new(RunOutputWriter::new(cache.clone(), id)),
        Arc::new(stderr.clone()),
        token.child_token(),
    );
    if arbiter
        .settle(
            Stage::Run,
            &mut completed_rx,
            &mut error_rx,
            None,
            Some(&stderr),
        )
        .await
        .is_ok()
    {
        info!(pipeline_id = %id, "pipeline finished");
    }
}

/// Reduces each stage's three concurrent events to one winner.
///
/// The cancel receiver lives here for the whole pipeline: a report arriving
/// between stages stays buffered and is picked up by the next stage's wait.
struct StageArbiter<'a> {
    reporter: &'a StatusReporter,
    deadline: Instant,
    token: &'a CancellationToken,
    cancel_rx: mpsc::Receiver<bool>,
}

impl StageArbiter<'_> {
    /// Block until the stage completes, a cancel report arrives, or the
    /// deadline elapses (or the caller's context shuts down, which counts
    /// the same). Publishes the matching cache state and returns `Ok` only
    /// when the pipeline should advance.
    async fn settle(
        &mut self,
        stage: Stage,
        completed_rx: &mut mpsc::Receiver<bool>,
        error_rx: &mut mpsc::Receiver<Error>,
        stdout: Option<&MemorySink>,
        stderr: Option<&MemorySink>,
    ) -> Result<()> {
        tokio::select! {
            _ = self.token.cancelled() => {
                self.reporter.timeout().await;
                Err(Error::DeadlineElapsed)
            }
            _ = tokio::time::sleep_until(self.deadline) => {
                self.reporter.timeout().await;
                Err(Error::DeadlineElapsed)
            }
            _ = self.cancel_rx.recv() => {
                self.reporter.canceled().await;
                Err(Error::Canceled)
            }
            completed = completed_rx.recv() => {
                if completed.unwrap_or(false) {
                    self.reporter
                        .stage_success(stage.success_status(), stdout.map(MemorySink::contents))
                        .await;
                    Ok(())
                } else {
                    let error = error_rx.try_recv().unwrap_or_else(|_| {
                        Error::internal(
                            "stage failure",
                            format!("{stage} stage ended without reporting an error"),
                        )
                    });
                    self.reporter
                        .stage_error(stage, &error, stderr.map(MemorySink::contents))
                        .await;
                    Err(error)
                }
            }
        }
    }
}
