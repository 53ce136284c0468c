//! Stage orchestration engine for a multi-language code playground.
//!
//! A submitted snippet, identified by a [`domain::PipelineId`], is driven
//! through validate → prepare → compile → run. Each stage races against the
//! execution deadline and a client-driven cancel flag; every terminal
//! condition is translated into a status written to the shared cache, which
//! concurrent clients poll for progress and results.

pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod executors;
pub mod logging;
pub mod pipeline;
pub mod streaming;
pub mod workspace;

pub use error::{Error, Result};
