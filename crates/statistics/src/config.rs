//! Configuration for the statistics engine.

use serde::{Deserialize, Serialize};

/// Configuration for statistical reductions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsConfig {
    /// Delta degrees of freedom subtracted from `n` in the standard
    /// deviation denominator.
    pub ddof: usize,

    /// Plotting-position parameter `alpha` for the quantile estimator.
    pub alpha: f64,

    /// Plotting-position parameter `beta` for the quantile estimator.
    pub beta: f64,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        // alpha = beta = 1 is the classic linear interpolation variant
        Self {
            ddof: 0,
            alpha: 1.0,
            beta: 1.0,
        }
    }
}

impl StatisticsConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("STATS_DDOF") {
            if let Ok(ddof) = val.parse() {
                config.ddof = ddof;
            }
        }

        if let Ok(val) = std::env::var("STATS_ALPHA") {
            if let Ok(alpha) = val.parse() {
                config.alpha = alpha;
            }
        }

        if let Ok(val) = std::env::var("STATS_BETA") {
            if let Ok(beta) = val.parse() {
                config.beta = beta;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.alpha) || !(0.0..=1.0).contains(&self.beta) {
            return Err("alpha and beta must lie in [0, 1]".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StatisticsConfig::default();
        assert_eq!(config.ddof, 0);
        assert_eq!(config.alpha, 1.0);
        assert_eq!(config.beta, 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_out_of_range_parameters() {
        let config = StatisticsConfig {
            alpha: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
