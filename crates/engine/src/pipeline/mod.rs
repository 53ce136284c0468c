//! Stage orchestration for snippet processing.
//!
//! The driver walks a submission through its stages, each stage racing
//! against the execution deadline and the client cancel flag; the status
//! reporter is the only place that writes pipeline state, and the cancel
//! watcher is the only reader of the cancel flag.

mod driver;
mod reporter;
mod runner;
mod watcher;

pub use driver::execute;
pub use reporter::StatusReporter;
pub use watcher::CANCEL_POLL_INTERVAL;

use crate::cache::{Cache, CacheValue, SubKey};
use crate::domain::{PipelineId, Status};
use crate::error::Result;

/// Publish the initial state for an accepted submission.
///
/// Called by the receiving endpoint before the driver starts, so pollers see
/// the pipeline as soon as it exists.
pub async fn begin_processing(cache: &dyn Cache, id: PipelineId) -> Result<()> {
    cache
        .set(id, SubKey::Status, Status::Validating.into())
        .await?;
    cache.set(id, SubKey::Canceled, CacheValue::Flag(false)).await
}

/// Ask a running pipeline to stop.
///
/// Observed by the cancel watcher within one poll tick; the pipeline then
/// terminates with [`Status::Canceled`].
pub async fn request_cancel(cache: &dyn Cache, id: PipelineId) -> Result<()> {
    cache.set(id, SubKey::Canceled, CacheValue::Flag(true)).await
}
