//! Read API over the cache for the surrounding service.
//!
//! Callers supply an error title so failures surface with the vocabulary of
//! the endpoint that hit them. Absence and backend failures map to the
//! not-found kind; a slot holding the wrong value arm maps to the internal
//! kind.

use super::{Cache, SubKey};
use crate::domain::{PipelineId, Status};
use crate::error::{Error, Result};

/// Fetch a string-typed slot (run output, run error, compile output).
pub async fn get_processing_output(
    cache: &dyn Cache,
    id: PipelineId,
    sub_key: SubKey,
    error_title: &str,
) -> Result<String> {
    let value = cache
        .get(id, sub_key)
        .await
        .map_err(|error| Error::not_found(error_title, error.to_string()))?;

    value.into_text().ok_or_else(|| {
        Error::internal(
            error_title,
            format!("value under {sub_key} for pipeline {id} is not a string"),
        )
    })
}

/// Fetch the pipeline's current status.
pub async fn get_processing_status(
    cache: &dyn Cache,
    id: PipelineId,
    error_title: &str,
) -> Result<Status> {
    let value = cache
        .get(id, SubKey::Status)
        .await
        .map_err(|error| Error::not_found(error_title, error.to_string()))?;

    value.as_status().ok_or_else(|| {
        Error::internal(
            error_title,
            format!("value under {} for pipeline {id} is not a status", SubKey::Status),
        )
    })
}

/// Fetch the last streamed chunk index for incremental output readers.
pub async fn get_last_index(
    cache: &dyn Cache,
    id: PipelineId,
    sub_key: SubKey,
    error_title: &str,
) -> Result<usize> {
    let value = cache
        .get(id, sub_key)
        .await
        .map_err(|error| Error::not_found(error_title, error.to_string()))?;

    value.as_index().ok_or_else(|| {
        Error::internal(
            error_title,
            format!("value under {sub_key} for pipeline {id} is not an index"),
        )
    })
}
