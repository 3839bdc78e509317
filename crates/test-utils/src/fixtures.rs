//! Common dataset fixtures shared across the workspace tests.

use crate::dataset::{InMemoryDataset, VariableDef};

/// Fill value used by the fixture variables.
pub const FIXTURE_FILL: f64 = -1.0;

/// The model grid used by the window-search tests: lon axis
/// `{5.3, 5.8, 6.3, 6.8}`, lat axis `{55.2, 56.8}`, a single time step, and
/// a `chl` variable on `(time, lat, lon)`.
///
/// Cell values encode their position: `10 * (lat_index + 1) + lon_index + 1`,
/// so `(lon 5.8, lat 55.2)` holds `12.0`.
pub fn window_model_dataset() -> InMemoryDataset {
    InMemoryDataset::builder("memory:window-model")
        .coordinate("time", &[0.0])
        .coordinate("lat", &[55.2, 56.8])
        .coordinate("lon", &[5.3, 5.8, 6.3, 6.8])
        .variable(
            VariableDef::new(
                "chl",
                &["time", "lat", "lon"],
                &[11.0, 12.0, 13.0, 14.0, 21.0, 22.0, 23.0, 24.0],
            )
            .fill(FIXTURE_FILL)
            .units("mg m-3"),
        )
        .build()
}

/// A reference dataset of `chl_ref` observations, one per record, each given
/// as `(lat, lon, time, value)`.
pub fn window_reference_dataset(records: &[(f64, f64, f64, f64)]) -> InMemoryDataset {
    let lats: Vec<f64> = records.iter().map(|r| r.0).collect();
    let lons: Vec<f64> = records.iter().map(|r| r.1).collect();
    let times: Vec<f64> = records.iter().map(|r| r.2).collect();
    let values: Vec<f64> = records.iter().map(|r| r.3).collect();

    InMemoryDataset::builder("memory:window-reference")
        .dimension("record", records.len())
        .variable(VariableDef::new("lat_ref", &["record"], &lats))
        .variable(VariableDef::new("lon_ref", &["record"], &lons))
        .variable(VariableDef::new("time_ref", &["record"], &times))
        .variable(
            VariableDef::new("chl_ref", &["record"], &values)
                .fill(FIXTURE_FILL)
                .units("mg m-3")
                .coordinates("lat_ref lon_ref time_ref"),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use validation_common::GriddedDataset;

    #[test]
    fn test_window_model_dataset_shape() {
        let ds = window_model_dataset();
        let var = ds.get_variable("chl").unwrap();
        assert_eq!(var.shape, vec![1, 2, 4]);
        let data = ds.read_all("chl").unwrap();
        assert_eq!(data.get(&[0, 0, 1]), Some(12.0));
    }

    #[test]
    fn test_window_reference_dataset_records() {
        let ds = window_reference_dataset(&[(55.0, 6.0, 0.0, 0.4), (56.0, 5.5, 10.0, 0.5)]);
        assert_eq!(ds.dimension_size("record"), Some(2));
        assert!(ds.has_coordinates_attribute("chl_ref"));
        assert_eq!(ds.read_all("lon_ref").unwrap().values(), &[6.0, 5.5]);
    }
}
