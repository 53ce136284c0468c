//! Incremental run-output publishing.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use process_capture::OutputSink;
use tracing::warn;

use crate::cache::{Cache, CacheValue, SubKey};
use crate::domain::PipelineId;

/// Stdout sink for the run stage.
///
/// Every chunk is appended to the pipeline's `RunOutput` slot and the chunk
/// index is bumped, so pollers can fetch output increments while the
/// snippet is still running. Writes are best-effort: a failed cache write
/// loses that chunk's publication, not the pipeline.
pub struct RunOutputWriter {
    cache: Arc<dyn Cache>,
    id: PipelineId,
    chunks_written: AtomicUsize,
}

impl RunOutputWriter {
    pub fn new(cache: Arc<dyn Cache>, id: PipelineId) -> Self {
        Self {
            cache,
            id,
            chunks_written: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl OutputSink for RunOutputWriter {
    async fn write_chunk(&self, chunk: &[u8]) {
        let text = String::from_utf8_lossy(chunk);

        // Single writer per pipeline, so read-append-write is not racy.
        let current = match self.cache.get(self.id, SubKey::RunOutput).await {
            Ok(value) => value.into_text().unwrap_or_default(),
            Err(_) => String::new(),
        };

        let updated = format!("{current}{text}");
        if let Err(error) = self
            .cache
            .set(self.id, SubKey::RunOutput, CacheValue::Text(updated))
            .await
        {
            warn!(pipeline_id = %self.id, %error, "failed to publish run output chunk");
            return;
        }

        let index = self.chunks_written.fetch_add(1, Ordering::SeqCst) + 1;
        if let Err(error) = self
            .cache
            .set(self.id, SubKey::RunOutputIndex, CacheValue::Index(index))
            .await
        {
            warn!(pipeline_id = %self.id, %error, "failed to publish run output index");
        }
    }
}
