//! Configuration for the variable store.

use serde::{Deserialize, Serialize};

/// Configuration for the variable cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Memory budget for cached variables in megabytes.
    ///
    /// `None` disables eviction entirely (the default).
    pub cache_size_mb: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cache_size_mb: None,
        }
    }
}

impl StoreConfig {
    /// Create a configuration with the given budget in megabytes.
    pub fn with_cache_size_mb(cache_size_mb: usize) -> Self {
        Self {
            cache_size_mb: Some(cache_size_mb),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("VARIABLE_CACHE_SIZE_MB") {
            if let Ok(size) = val.parse() {
                config.cache_size_mb = Some(size);
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_size_mb == Some(0) {
            return Err("cache_size_mb must be > 0 when set".to_string());
        }
        Ok(())
    }

    /// Get the cache budget in bytes, or `usize::MAX` when unbounded.
    pub fn cache_size_bytes(&self) -> usize {
        match self.cache_size_mb {
            Some(mb) => mb.saturating_mul(1024 * 1024),
            None => usize::MAX,
        }
    }
}
