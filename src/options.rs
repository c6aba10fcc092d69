//! Loader configuration.
//!
//! Every loader in a `LoaderScope` shares one `LoaderOptions`. Defaults suit request-scoped
//! loading; `from_environment` lets deployments turn caching off, cap batch sizes or widen the
//! batch window without a rebuild.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const CACHE_ENV: &str = "LOADER_CACHE";
pub const MAX_BATCH_SIZE_ENV: &str = "LOADER_MAX_BATCH_SIZE";
pub const BATCH_DELAY_MS_ENV: &str = "LOADER_BATCH_DELAY_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderOptions {
    /// Keep loaded values for the lifetime of the loader. When disabled, keys requested in the same
    /// frame are still deduplicated, but nothing survives the frame and primes are ignored.
    pub cache: bool,
    /// Upper bound on the number of keys handed to one batch function call.
    pub max_batch_size: Option<usize>,
    /// How long the worker waits for more requests before closing a frame. The frame stays open
    /// for as long as each wait brings in new requests. `0` only yields to the scheduler once.
    pub batch_delay_ms: u64,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            cache: true,
            max_batch_size: None,
            batch_delay_ms: 1,
        }
    }
}

impl LoaderOptions {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    /// Default options with environment variable overrides applied.
    pub fn from_environment() -> Self {
        let options = Self::default().with_overrides(|name| env::var(name).ok());
        info!(?options, "Loaded loader options");
        options
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value. Unparsable values
    /// are logged and ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(CACHE_ENV) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" => self.cache = true,
                "0" | "false" | "off" => self.cache = false,
                _ => warn!(variable = CACHE_ENV, value = %raw, "Ignoring invalid boolean"),
            }
        }
        if let Some(raw) = lookup(MAX_BATCH_SIZE_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(0) => self.max_batch_size = None,
                Ok(size) => self.max_batch_size = Some(size),
                Err(e) => {
                    warn!(variable = MAX_BATCH_SIZE_ENV, value = %raw, %e, "Ignoring invalid size")
                }
            }
        }
        if let Some(raw) = lookup(BATCH_DELAY_MS_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(delay) => self.batch_delay_ms = delay,
                Err(e) => {
                    warn!(variable = BATCH_DELAY_MS_ENV, value = %raw, %e, "Ignoring invalid delay")
                }
            }
        }
        self
    }
}
