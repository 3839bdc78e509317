//! Spatiotemporal matchup search.
//!
//! [`MatchupEngine`] locates, for every reference observation of a variable,
//! the model grid cell(s) whose coordinates fall within configured
//! tolerances, producing [`Matchup`](validation_common::Matchup) records for
//! the statistics engine and reporting collaborators.

pub mod config;
pub mod engine;

pub use config::MatchupConfig;
pub use engine::MatchupEngine;
