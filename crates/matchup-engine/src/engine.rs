//! The matchup search engine.

use std::collections::HashMap;

use tracing::{debug, info, warn};
use validation_common::{
    CellPosition, GridVariable, Matchup, MatchupDeltas, ReferenceRecord, Result,
    SpacetimePosition, ValidationError,
};
use variable_store::VariableStore;

use crate::config::MatchupConfig;

/// Logical axis category of a dimension or coordinate variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisKind {
    Time,
    Depth,
    Lat,
    Lon,
}

/// Classify a dimension or coordinate name by substring.
fn classify(name: &str) -> Option<AxisKind> {
    let lower = name.to_lowercase();
    if lower.contains("lat") {
        Some(AxisKind::Lat)
    } else if lower.contains("lon") {
        Some(AxisKind::Lon)
    } else if lower.contains("depth") {
        Some(AxisKind::Depth)
    } else if lower.contains("time") {
        Some(AxisKind::Time)
    } else {
        None
    }
}

/// Round half up: `floor(x + 0.5)`.
///
/// Differs from banker's rounding at exact halves: 2.5 rounds to 3, not 2.
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Nearest grid index to a target coordinate along a uniformly spaced axis,
/// clamped to `[0, axis_length - 1]`.
fn nearest_index(target: f64, axis: &[f64]) -> usize {
    if axis.len() < 2 {
        return 0;
    }
    let step = axis[1] - axis[0];
    let raw = round_half_up((target - axis[0]) / step);
    if raw < 0.0 {
        0
    } else {
        (raw as usize).min(axis.len() - 1)
    }
}

/// Square window indices around a center, clipped to grid bounds.
fn window_range(center: usize, offset: usize, len: usize) -> std::ops::RangeInclusive<usize> {
    let start = center.saturating_sub(offset);
    let end = (center + offset).min(len.saturating_sub(1));
    start..=end
}

/// Resolved model axes for one variable, in its declared dimension order.
struct ModelAxes {
    variable: GridVariable,
    /// Axis category per declared dimension, declaration order.
    order: Vec<AxisKind>,
    lon: Vec<f64>,
    lat: Vec<f64>,
    time: Vec<f64>,
    depth: Option<Vec<f64>>,
}

impl ModelAxes {
    /// Build the read origin for a cell, following the variable's declared
    /// dimension order.
    fn origin_for(&self, cell: &CellPosition) -> Vec<usize> {
        self.order
            .iter()
            .map(|kind| match kind {
                AxisKind::Time => cell.time_index,
                AxisKind::Depth => cell.depth_index.unwrap_or(0),
                AxisKind::Lat => cell.lat_index,
                AxisKind::Lon => cell.lon_index,
            })
            .collect()
    }
}

/// Coordinate variable names discovered for a reference variable.
struct ReferenceAxes {
    lat: String,
    lon: String,
    time: String,
    depth: Option<String>,
}

/// Locates the model grid cells matching each reference observation.
///
/// One engine serves one matching session over a [`VariableStore`]; records
/// and matchups are not persisted between sessions.
pub struct MatchupEngine {
    store: VariableStore,
    config: MatchupConfig,
}

impl MatchupEngine {
    /// Create an engine over a store.
    pub fn new(store: VariableStore, config: MatchupConfig) -> Self {
        Self { store, config }
    }

    /// The underlying variable store.
    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    /// Mutable access to the underlying variable store, for ad hoc reads by
    /// reporting collaborators.
    pub fn store_mut(&mut self) -> &mut VariableStore {
        &mut self.store
    }

    /// Consume the engine, returning the store.
    pub fn into_store(self) -> VariableStore {
        self.store
    }

    /// Names of the observation variables in the reference dataset: 1-D
    /// variables carrying a `coordinates` attribute.
    pub fn reference_variables(&self) -> Vec<String> {
        let dataset = self.store.observation_dataset();
        dataset
            .variable_names()
            .into_iter()
            .filter(|name| dataset.has_coordinates_attribute(name))
            .collect()
    }

    /// Enumerate the reference records of an observation variable.
    ///
    /// Indices whose observation value is the fill sentinel are skipped. A
    /// variable absent from the dataset yields zero records, not an error.
    pub fn find_reference_records(
        &mut self,
        reference_variable: &str,
    ) -> Result<Vec<ReferenceRecord>> {
        let Some(var) = self
            .store
            .observation_dataset()
            .get_variable(reference_variable)
        else {
            warn!(
                variable = reference_variable,
                "reference variable absent, no records"
            );
            return Ok(Vec::new());
        };
        let Some(record_dim) = var.dimensions.first().cloned() else {
            return Ok(Vec::new());
        };
        let count = var.shape[0];
        let axes = self.discover_reference_axes(reference_variable, &record_dim)?;

        let observations = self.store.read_values(reference_variable)?;
        let lats = self.store.read_values(&axes.lat)?;
        let lons = self.store.read_values(&axes.lon)?;
        let times = self.store.read_values(&axes.time)?;
        let depths = match &axes.depth {
            Some(name) => Some(self.store.read_values(name)?),
            None => None,
        };

        let mut records = Vec::new();
        for index in 0..count {
            if !var.is_valid(observations[index]) {
                debug!(record = index, "skipping record with fill observation");
                continue;
            }
            records.push(ReferenceRecord {
                record_index: index,
                lat: lats[index],
                lon: lons[index],
                time: times[index],
                depth: depths.as_ref().map(|d| d[index]),
            });
        }
        info!(
            variable = reference_variable,
            records = records.len(),
            "enumerated reference records"
        );
        Ok(records)
    }

    /// Find every matchup between a reference variable's observations and a
    /// model variable.
    ///
    /// Results follow reference-record enumeration order, then within a
    /// record the nested iteration order spatial window (lon-major,
    /// lat-minor), time window, depth window. Each matchup carries the model
    /// value under the model variable name and the observation under the
    /// reference variable name.
    pub fn find_matchups(
        &mut self,
        reference_variable: &str,
        model_variable: &str,
    ) -> Result<Vec<Matchup>> {
        let records = self.find_reference_records(reference_variable)?;
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let axes = self.resolve_model_axes(model_variable)?;
        let observations = self.store.read_values(reference_variable)?;

        let mut matchups = Vec::new();
        for record in &records {
            let mut found = self.record_matchups(record, &axes, model_variable)?;
            for matchup in &mut found {
                matchup.set_value(reference_variable, observations[record.record_index]);
            }
            matchups.extend(found);
        }
        info!(
            reference = reference_variable,
            model = model_variable,
            matchups = matchups.len(),
            "matchup session complete"
        );
        Ok(matchups)
    }

    /// Find the matchups of a single reference record against a model
    /// variable.
    pub fn find_record_matchups(
        &mut self,
        record: &ReferenceRecord,
        model_variable: &str,
    ) -> Result<Vec<Matchup>> {
        let axes = self.resolve_model_axes(model_variable)?;
        self.record_matchups(record, &axes, model_variable)
    }

    /// Populate the value map of existing matchups for one more variable.
    ///
    /// Cells holding the fill sentinel are left unpopulated.
    pub fn load_values(&mut self, matchups: &mut [Matchup], variable: &str) -> Result<()> {
        let axes = self.resolve_model_axes(variable)?;
        for matchup in matchups.iter_mut() {
            if matchup.values.contains_key(variable) {
                continue;
            }
            let origin = axes.origin_for(&matchup.cell);
            let value = self.store.read_cell(variable, &origin)?;
            if axes.variable.is_valid(value) {
                matchup.set_value(variable, value);
            }
        }
        Ok(())
    }

    fn discover_reference_axes(
        &self,
        reference_variable: &str,
        record_dim: &str,
    ) -> Result<ReferenceAxes> {
        let dataset = self.store.observation_dataset();
        let mut lat = None;
        let mut lon = None;
        let mut time = None;
        let mut depth = None;

        for name in dataset.variable_names() {
            if name == reference_variable || dataset.has_coordinates_attribute(&name) {
                continue;
            }
            let Some(var) = dataset.get_variable(&name) else {
                continue;
            };
            if var.dimensions.len() != 1 || var.dimensions[0] != record_dim {
                continue;
            }
            // first match wins per category
            match classify(&name) {
                Some(AxisKind::Lat) => lat.get_or_insert(name),
                Some(AxisKind::Lon) => lon.get_or_insert(name),
                Some(AxisKind::Time) => time.get_or_insert(name),
                Some(AxisKind::Depth) => depth.get_or_insert(name),
                None => continue,
            };
        }

        let missing = |category: &str| {
            ValidationError::not_found(format!(
                "{} coordinate for '{}'",
                category, reference_variable
            ))
        };
        Ok(ReferenceAxes {
            lat: lat.ok_or_else(|| missing("lat"))?,
            lon: lon.ok_or_else(|| missing("lon"))?,
            time: time.ok_or_else(|| missing("time"))?,
            depth,
        })
    }

    fn resolve_model_axes(&mut self, model_variable: &str) -> Result<ModelAxes> {
        let variable = self
            .store
            .variable(model_variable)
            .ok_or_else(|| ValidationError::not_found(model_variable))?;

        let mut order = Vec::with_capacity(variable.rank());
        for dim in &variable.dimensions {
            let kind = classify(dim).ok_or_else(|| ValidationError::not_found(dim.clone()))?;
            order.push(kind);
        }

        let axis_name = |kind: AxisKind| {
            order
                .iter()
                .zip(variable.dimensions.iter())
                .find(|(&k, _)| k == kind)
                .map(|(_, name)| name.clone())
        };
        let required = |kind: AxisKind, label: &str| {
            axis_name(kind).ok_or_else(|| {
                ValidationError::not_found(format!("{} axis of '{}'", label, model_variable))
            })
        };

        let lon_name = required(AxisKind::Lon, "lon")?;
        let lat_name = required(AxisKind::Lat, "lat")?;
        let time_name = required(AxisKind::Time, "time")?;
        let depth_name = axis_name(AxisKind::Depth);

        let lon = self.store.read_values(&lon_name)?;
        let lat = self.store.read_values(&lat_name)?;
        let time = self.store.read_values(&time_name)?;
        let depth = match depth_name {
            Some(name) => Some(self.store.read_values(&name)?),
            None => None,
        };

        Ok(ModelAxes {
            variable,
            order,
            lon,
            lat,
            time,
            depth,
        })
    }

    fn record_matchups(
        &mut self,
        record: &ReferenceRecord,
        axes: &ModelAxes,
        model_variable: &str,
    ) -> Result<Vec<Matchup>> {
        if axes.lon.is_empty() || axes.lat.is_empty() || axes.time.is_empty() {
            return Ok(Vec::new());
        }

        let offset = self.config.window_offset();
        let lon_center = nearest_index(record.lon, &axes.lon);
        let lat_center = nearest_index(record.lat, &axes.lat);

        // spatial window, lon-major lat-minor
        let mut cells = Vec::new();
        for lon_index in window_range(lon_center, offset, axes.lon.len()) {
            for lat_index in window_range(lat_center, offset, axes.lat.len()) {
                let dlon = (axes.lon[lon_index] - record.lon).abs();
                let dlat = (axes.lat[lat_index] - record.lat).abs();
                if (dlat * dlat + dlon * dlon).sqrt() < self.config.geo_delta {
                    cells.push((lon_index, lat_index, dlon, dlat));
                }
            }
        }

        let times: Vec<(usize, f64)> = axes
            .time
            .iter()
            .enumerate()
            .filter_map(|(index, &t)| {
                let dt = (t - record.time).abs();
                (dt < self.config.time_delta).then_some((index, dt))
            })
            .collect();

        // the single "no depth" sentinel when the variable has no depth axis
        let depths: Vec<(Option<usize>, Option<f64>)> = match &axes.depth {
            None => vec![(None, None)],
            Some(axis) => match record.depth {
                // a record without depth cannot be located along a depth axis
                None => Vec::new(),
                Some(depth) => axis
                    .iter()
                    .enumerate()
                    .filter_map(|(index, &d)| {
                        let dd = (d - depth).abs();
                        (dd < self.config.depth_delta).then_some((Some(index), Some(dd)))
                    })
                    .collect(),
            },
        };

        debug!(
            record = record.record_index,
            cells = cells.len(),
            times = times.len(),
            depths = depths.len(),
            "resolved search windows"
        );

        let mut matchups = Vec::new();
        for &(lon_index, lat_index, dlon, dlat) in &cells {
            for &(time_index, dt) in &times {
                for &(depth_index, dd) in &depths {
                    let cell = CellPosition {
                        lon_index,
                        lat_index,
                        time_index,
                        depth_index,
                    };
                    let origin = axes.origin_for(&cell);
                    let value = self.store.read_cell(model_variable, &origin)?;
                    if !axes.variable.is_valid(value) {
                        continue;
                    }

                    let mut values = HashMap::new();
                    values.insert(model_variable.to_string(), value);
                    matchups.push(Matchup {
                        reference: record.clone(),
                        cell,
                        position: SpacetimePosition {
                            lon: axes.lon[lon_index],
                            lat: axes.lat[lat_index],
                            time: axes.time[time_index],
                            depth: depth_index
                                .and_then(|i| axes.depth.as_ref().map(|axis| axis[i])),
                        },
                        deltas: MatchupDeltas {
                            lat: dlat,
                            lon: dlon,
                            time: dt,
                            depth: dd,
                        },
                        values,
                    });
                }
            }
        }
        Ok(matchups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_up_tie_break() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(2.499999), 2.0);
        assert_eq!(round_half_up(2.500001), 3.0);
        assert_eq!(round_half_up(-0.5), 0.0);
    }

    #[test]
    fn test_nearest_index_clamps() {
        let axis = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(nearest_index(1.4, &axis), 1);
        assert_eq!(nearest_index(1.5, &axis), 2);
        assert_eq!(nearest_index(-10.0, &axis), 0);
        assert_eq!(nearest_index(99.0, &axis), 3);
    }

    #[test]
    fn test_nearest_index_descending_axis() {
        let axis = [3.0, 2.0, 1.0, 0.0];
        assert_eq!(nearest_index(2.9, &axis), 0);
        assert_eq!(nearest_index(0.1, &axis), 3);
    }

    #[test]
    fn test_nearest_index_short_axis() {
        assert_eq!(nearest_index(42.0, &[7.0]), 0);
    }

    #[test]
    fn test_window_range_clips() {
        assert_eq!(window_range(0, 1, 4), 0..=1);
        assert_eq!(window_range(3, 1, 4), 2..=3);
        assert_eq!(window_range(2, 1, 4), 1..=3);
        assert_eq!(window_range(0, 0, 1), 0..=0);
    }

    #[test]
    fn test_classify_names() {
        assert_eq!(classify("latitude"), Some(AxisKind::Lat));
        assert_eq!(classify("lon_ref"), Some(AxisKind::Lon));
        assert_eq!(classify("TIME"), Some(AxisKind::Time));
        assert_eq!(classify("depth_ref"), Some(AxisKind::Depth));
        assert_eq!(classify("record"), None);
    }
}
