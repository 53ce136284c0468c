//! Background poll of the client-driven cancel flag.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cache::{Cache, SubKey};
use crate::domain::PipelineId;

/// How often the cancel flag is re-read from the cache.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Poll the `Canceled` slot until it reads `true`, then report once on the
/// cancel channel and exit. The watcher itself never touches the pipeline
/// status; the arbiter of whichever stage is running acts on the report.
///
/// Exits silently when `token` fires (the pipeline is ending for another
/// reason). A missing flag or a cache hiccup just means another tick.
pub(crate) async fn watch_cancellation(
    cache: Arc<dyn Cache>,
    id: PipelineId,
    token: CancellationToken,
    cancel_tx: mpsc::Sender<bool>,
) {
    let mut tick = tokio::time::interval(CANCEL_POLL_INTERVAL);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                debug!(pipeline_id = %id, "pipeline ended, cancel watcher exiting");
                return;
            }
            _ = tick.tick() => {
                let canceled = cache
                    .get(id, SubKey::Canceled)
                    .await
                    .ok()
                    .and_then(|value| value.as_flag())
                    .unwrap_or(false);
                if canceled {
                    debug!(pipeline_id = %id, "cancel flag observed");
                    let _ = cancel_tx.send(true).await;
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheValue, InMemoryCache};

    #[tokio::test]
    async fn reports_within_one_tick_of_the_flag() {
        let cache = Arc::new(InMemoryCache::new());
        let id = PipelineId::new();
        cache
            .set(id, SubKey::Canceled, CacheValue::Flag(true))
            .await
            .unwrap();

        let (cancel_tx, mut cancel_rx) = mpsc::channel(1);
        tokio::spawn(watch_cancellation(
            cache.clone(),
            id,
            CancellationToken::new(),
            cancel_tx,
        ));

        let observed = tokio::time::timeout(Duration::from_millis(250), cancel_rx.recv())
            .await
            .expect("cancel should be observed on the first tick");
        assert_eq!(observed, Some(true));
    }

    #[tokio::test]
    async fn keeps_polling_through_a_missing_flag() {
        let cache = Arc::new(InMemoryCache::new());
        let id = PipelineId::new();

        let (cancel_tx, mut cancel_rx) = mpsc::channel(1);
        tokio::spawn(watch_cancellation(
            cache.clone(),
            id,
            CancellationToken::new(),
            cancel_tx,
        ));

        // Flag appears only after the first tick already missed it.
        tokio::time::sleep(Duration::from_millis(100)).await;
        cache
            .set(id, SubKey::Canceled, CacheValue::Flag(true))
            .await
            .unwrap();

        let observed = tokio::time::timeout(Duration::from_secs(2), cancel_rx.recv())
            .await
            .expect("cancel should be observed on a later tick");
        assert_eq!(observed, Some(true));
    }

    #[tokio::test]
    async fn exits_without_reporting_when_the_pipeline_ends() {
        let cache = Arc::new(InMemoryCache::new());
        let token = CancellationToken::new();

        let (cancel_tx, mut cancel_rx) = mpsc::channel(1);
        let watcher = tokio::spawn(watch_cancellation(
            cache.clone(),
            PipelineId::new(),
            token.clone(),
            cancel_tx,
        ));

        token.cancel();
        watcher.await.unwrap();
        assert_eq!(cancel_rx.recv().await, None);
    }
}
