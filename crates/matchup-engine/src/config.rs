//! Configuration for the matchup search windows.

use serde::{Deserialize, Serialize};

/// Tolerances and window size for the matchup search.
///
/// A degenerate configuration (window size 1, near-zero deltas) collapses to
/// strict nearest-cell matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchupConfig {
    /// Side length of the square search window around the nearest cell, in
    /// grid cells. Must be odd.
    pub macro_pixel_size: usize,

    /// Maximum Euclidean lat/lon distance between reference and cell, in
    /// degrees. Cells qualify strictly below this value.
    pub geo_delta: f64,

    /// Maximum absolute time difference, in the time axis unit.
    pub time_delta: f64,

    /// Maximum absolute depth difference, in the depth axis unit.
    pub depth_delta: f64,
}

impl Default for MatchupConfig {
    fn default() -> Self {
        Self {
            macro_pixel_size: 3,
            geo_delta: 12.0,
            time_delta: 86400.0,
            depth_delta: 10.0,
        }
    }
}

impl MatchupConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("MACRO_PIXEL_SIZE") {
            if let Ok(size) = val.parse() {
                config.macro_pixel_size = size;
            }
        }

        if let Ok(val) = std::env::var("GEO_DELTA") {
            if let Ok(delta) = val.parse() {
                config.geo_delta = delta;
            }
        }

        if let Ok(val) = std::env::var("TIME_DELTA") {
            if let Ok(delta) = val.parse() {
                config.time_delta = delta;
            }
        }

        if let Ok(val) = std::env::var("DEPTH_DELTA") {
            if let Ok(delta) = val.parse() {
                config.depth_delta = delta;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.macro_pixel_size == 0 || self.macro_pixel_size % 2 == 0 {
            return Err("macro_pixel_size must be a positive odd number".to_string());
        }
        if self.geo_delta < 0.0 || self.time_delta < 0.0 || self.depth_delta < 0.0 {
            return Err("deltas must be non-negative".to_string());
        }
        Ok(())
    }

    /// Window offset to each side of the nearest cell.
    pub fn window_offset(&self) -> usize {
        self.macro_pixel_size / 2
    }
}
