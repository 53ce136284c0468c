//! Stage execution tasks feeding the arbiter's channels.
//!
//! Every stage reports through a pair of capacity-1 channels: on failure the
//! error is pushed first, then `false` on the completion channel, so a
//! receiver that sees `false` can always drain the error. Success pushes
//! `true` alone. Output sinks are owned by the caller and read only after
//! the completion channel has fired.

use std::future::Future;
use std::sync::Arc;

use process_capture::{OutputSink, run_captured};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Launch an external command stage.
pub(crate) fn spawn_command_stage(
    command: Command,
    stdout: Arc<dyn OutputSink>,
    stderr: Arc<dyn OutputSink>,
    token: CancellationToken,
) -> (mpsc::Receiver<bool>, mpsc::Receiver<Error>) {
    let (completed_tx, completed_rx) = mpsc::channel(1);
    let (error_tx, error_rx) = mpsc::channel(1);

    tokio::spawn(async move {
        match run_captured(command, stdout, stderr, token).await {
            Ok(status) if status.success() => {
                let _ = completed_tx.send(true).await;
            }
            Ok(status) => {
                let _ = error_tx
                    .send(Error::CommandExit(status.code().unwrap_or(-1)))
                    .await;
                let _ = completed_tx.send(false).await;
            }
            Err(error) => {
                let _ = error_tx.send(error.into()).await;
                let _ = completed_tx.send(false).await;
            }
        }
    });

    (completed_rx, error_rx)
}

/// Launch an in-process stage (validate, prepare).
pub(crate) fn spawn_check_stage<F>(check: F) -> (mpsc::Receiver<bool>, mpsc::Receiver<Error>)
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    let (completed_tx, completed_rx) = mpsc::channel(1);
    let (error_tx, error_rx) = mpsc::channel(1);

    tokio::spawn(async move {
        match check.await {
            Ok(()) => {
                let _ = completed_tx.send(true).await;
            }
            Err(error) => {
                let _ = error_tx.send(error).await;
                let _ = completed_tx.send(false).await;
            }
        }
    });

    (completed_rx, error_rx)
}
