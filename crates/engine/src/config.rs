//! Environment-driven service configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::Sdk;
use crate::error::{Error, Result};

const WORKING_DIR_ENV: &str = "PLAYGROUND_WORKING_DIR";
const EXECUTE_TIMEOUT_ENV: &str = "PIPELINE_EXECUTE_TIMEOUT_SECS";
const SDK_ENV: &str = "PLAYGROUND_SDK";

const DEFAULT_WORKING_DIR: &str = "./pipelines";
const DEFAULT_EXECUTE_TIMEOUT_SECS: u64 = 600;

/// Configuration for one runner instance.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root under which per-pipeline scratch directories are created.
    pub working_dir: PathBuf,
    /// Wall-clock budget for a whole pipeline execution.
    pub pipeline_execute_timeout: Duration,
    /// Language this runner instance serves.
    pub sdk: Sdk,
}

impl AppConfig {
    /// Load configuration from the process environment (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let working_dir = env::var(WORKING_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_WORKING_DIR));

        let pipeline_execute_timeout = match env::var(EXECUTE_TIMEOUT_ENV) {
            Ok(raw) => Duration::from_secs(raw.parse::<u64>().map_err(|_| {
                Error::config(format!(
                    "{EXECUTE_TIMEOUT_ENV} must be an integer number of seconds, got {raw:?}"
                ))
            })?),
            Err(_) => Duration::from_secs(DEFAULT_EXECUTE_TIMEOUT_SECS),
        };

        let sdk = match env::var(SDK_ENV) {
            Ok(raw) => raw.parse::<Sdk>().map_err(|_| {
                Error::config(format!(
                    "{SDK_ENV} must be one of JAVA, GO, PYTHON, got {raw:?}"
                ))
            })?,
            Err(_) => return Err(Error::config(format!("{SDK_ENV} is required"))),
        };

        Ok(Self {
            working_dir,
            pipeline_execute_timeout,
            sdk,
        })
    }
}
