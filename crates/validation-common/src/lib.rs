//! Common types and utilities shared across the grid-validation workspace.

pub mod array;
pub mod dataset;
pub mod error;
pub mod matchup;

pub use array::NdArray;
pub use dataset::{GridVariable, GriddedDataset};
pub use error::{Result, ValidationError};
pub use matchup::{CellPosition, Matchup, MatchupDeltas, ReferenceRecord, SpacetimePosition};
