//! Single choke point for publishing pipeline state to the cache.

use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::{Cache, CacheValue, SubKey};
use crate::domain::{PipelineId, Stage, Status};
use crate::error::Error;

/// Writes `{status, output, error}` tuples for one pipeline.
///
/// All writes are best-effort: by the time a terminal condition is being
/// reported the pipeline is committed to stopping, so cache failures are
/// logged and swallowed.
pub struct StatusReporter {
    cache: Arc<dyn Cache>,
    id: PipelineId,
}

impl StatusReporter {
    pub fn new(cache: Arc<dyn Cache>, id: PipelineId) -> Self {
        Self { cache, id }
    }

    /// Executor construction or the post-compile lookup failed outside a stage.
    pub async fn setup_error(&self, error: &Error) {
        warn!(pipeline_id = %self.id, %error, "pipeline setup failed");
        self.set(SubKey::Status, Status::Error.into()).await;
    }

    /// A stage signalled failure. Compile and run persist the captured
    /// output alongside the error; validate and prepare report status only.
    pub async fn stage_error(&self, stage: Stage, error: &Error, captured: Option<String>) {
        info!(pipeline_id = %self.id, %stage, %error, "stage failed");

        match stage {
            Stage::Compile => {
                self.set(
                    SubKey::CompileOutput,
                    failure_payload(error, captured).into(),
                )
                .await;
            }
            Stage::Run => {
                self.set(SubKey::RunError, failure_payload(error, captured).into())
                    .await;
            }
            Stage::Validate | Stage::Prepare => {}
        }

        self.set(SubKey::Status, stage.error_status().into()).await;
    }

    /// A stage completed; publish the next stage's entry status.
    ///
    /// Entering `Executing` also publishes the compile output and clears the
    /// run-output slots for the streaming writer.
    pub async fn stage_success(&self, next: Status, captured: Option<String>) {
        if next == Status::Executing {
            self.set(SubKey::CompileOutput, captured.unwrap_or_default().into())
                .await;
            self.set(SubKey::RunOutput, String::new().into()).await;
            self.set(SubKey::RunOutputIndex, 0usize.into()).await;
        }
        self.set(SubKey::Status, next.into()).await;
    }

    /// The execution deadline elapsed.
    pub async fn timeout(&self) {
        info!(pipeline_id = %self.id, "pipeline hit its execution deadline");
        self.set(SubKey::Status, Status::RunTimeout.into()).await;
    }

    /// A client cancel was observed.
    pub async fn canceled(&self) {
        info!(pipeline_id = %self.id, "pipeline canceled");
        self.set(SubKey::Status, Status::Canceled.into()).await;
    }

    async fn set(&self, sub_key: SubKey, value: CacheValue) {
        if let Err(error) = self.cache.set(self.id, sub_key, value).await {
            warn!(pipeline_id = %self.id, %sub_key, %error, "cache write failed");
        }
    }
}

fn failure_payload(error: &Error, captured: Option<String>) -> String {
    format!("error: {error}, output: {}", captured.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;

    fn reporter() -> (Arc<InMemoryCache>, PipelineId, StatusReporter) {
        let cache = Arc::new(InMemoryCache::new());
        let id = PipelineId::new();
        (cache.clone(), id, StatusReporter::new(cache, id))
    }

    #[tokio::test]
    async fn compile_failure_persists_the_captured_output() {
        let (cache, id, reporter) = reporter();

        reporter
            .stage_error(
                Stage::Compile,
                &Error::CommandExit(1),
                Some("syntax error at 3:1".to_string()),
            )
            .await;

        let output = cache.get(id, SubKey::CompileOutput).await.unwrap();
        assert_eq!(
            output,
            CacheValue::Text("error: exit status 1, output: syntax error at 3:1".to_string())
        );
        let status = cache.get(id, SubKey::Status).await.unwrap();
        assert_eq!(status.as_status(), Some(Status::CompileError));
    }

    #[tokio::test]
    async fn validate_failure_writes_status_only() {
        let (cache, id, reporter) = reporter();

        reporter
            .stage_error(
                Stage::Validate,
                &Error::Validation("bad snippet".to_string()),
                None,
            )
            .await;

        let status = cache.get(id, SubKey::Status).await.unwrap();
        assert_eq!(status.as_status(), Some(Status::ValidationError));
        assert!(cache.get(id, SubKey::CompileOutput).await.is_err());
        assert!(cache.get(id, SubKey::RunError).await.is_err());
    }

    #[tokio::test]
    async fn entering_executing_resets_the_run_slots() {
        let (cache, id, reporter) = reporter();

        cache
            .set(id, SubKey::RunOutput, CacheValue::from("stale"))
            .await
            .unwrap();

        reporter
            .stage_success(Status::Executing, Some("warnings: 0".to_string()))
            .await;

        let compile = cache.get(id, SubKey::CompileOutput).await.unwrap();
        assert_eq!(compile, CacheValue::Text("warnings: 0".to_string()));
        let run = cache.get(id, SubKey::RunOutput).await.unwrap();
        assert_eq!(run, CacheValue::Text(String::new()));
        let index = cache.get(id, SubKey::RunOutputIndex).await.unwrap();
        assert_eq!(index.as_index(), Some(0));
    }

    #[tokio::test]
    async fn intermediate_success_writes_status_only() {
        let (cache, id, reporter) = reporter();

        reporter.stage_success(Status::Preparing, None).await;

        let status = cache.get(id, SubKey::Status).await.unwrap();
        assert_eq!(status.as_status(), Some(Status::Preparing));
        assert!(cache.get(id, SubKey::CompileOutput).await.is_err());
    }
}
