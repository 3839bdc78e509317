//! Agreement statistics over matched model/reference value pairs.
//!
//! [`StatisticsEngine`] harmonizes the validity masks of two positionally
//! aligned sequences (or of the pairs extracted from a matchup list) and
//! computes a fixed battery of summary and agreement statistics: error,
//! bias, correlation, and skill scores.

pub mod config;
pub mod engine;
pub mod record;
pub mod series;

pub use config::StatisticsConfig;
pub use engine::{StatisticsEngine, StatisticsRequest};
pub use record::{SeriesSummary, StatisticsRecord};
pub use series::{harmonize, MaskedSeries};
