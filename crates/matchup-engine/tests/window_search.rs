//! Integration tests for the spatiotemporal window search.

use matchup_engine::{MatchupConfig, MatchupEngine};
use test_utils::{
    window_model_dataset, window_reference_dataset, InMemoryDataset, VariableDef, FIXTURE_FILL,
};
use variable_store::{StoreConfig, VariableStore};

fn engine_for(records: &[(f64, f64, f64, f64)], config: MatchupConfig) -> MatchupEngine {
    let store = VariableStore::with_reference(
        Box::new(window_model_dataset()),
        Box::new(window_reference_dataset(records)),
        StoreConfig::default(),
    );
    MatchupEngine::new(store, config)
}

#[test]
fn tight_geo_delta_selects_single_cell() {
    // Query at (lat 55, lon 6.0) against lon {5.3, 5.8, 6.3, 6.8},
    // lat {55.2, 56.8}: only (5.8, 55.2) lies within 0.3 degrees.
    let config = MatchupConfig {
        macro_pixel_size: 3,
        geo_delta: 0.3,
        ..Default::default()
    };
    let mut engine = engine_for(&[(55.0, 6.0, 0.0, 0.4)], config);

    let matchups = engine.find_matchups("chl_ref", "chl").unwrap();
    assert_eq!(matchups.len(), 1);

    let m = &matchups[0];
    assert_eq!(m.cell.lon_index, 1);
    assert_eq!(m.cell.lat_index, 0);
    assert_eq!(m.position.lon, 5.8);
    assert_eq!(m.position.lat, 55.2);
    assert_eq!(m.cell.arity(), 3);
    assert_eq!(m.value("chl"), Some(12.0));
    assert_eq!(m.value("chl_ref"), Some(0.4));
}

#[test]
fn wide_geo_delta_returns_window_in_lon_major_order() {
    let config = MatchupConfig {
        macro_pixel_size: 3,
        geo_delta: 200.0,
        ..Default::default()
    };
    let mut engine = engine_for(&[(55.0, 6.0, 0.0, 0.4)], config);

    let matchups = engine.find_matchups("chl_ref", "chl").unwrap();
    let cells: Vec<(usize, usize)> = matchups
        .iter()
        .map(|m| (m.cell.lon_index, m.cell.lat_index))
        .collect();
    assert_eq!(
        cells,
        vec![(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1)],
        "expected lon-major, lat-minor iteration order"
    );
}

#[test]
fn matchup_deltas_are_axiswise_absolutes() {
    let config = MatchupConfig {
        macro_pixel_size: 1,
        geo_delta: 1.0,
        ..Default::default()
    };
    let mut engine = engine_for(&[(55.0, 6.0, 100.0, 0.4)], config);

    let matchups = engine.find_matchups("chl_ref", "chl").unwrap();
    assert_eq!(matchups.len(), 1);
    let deltas = &matchups[0].deltas;
    test_utils::assert_approx_eq!(deltas.lon, 0.2, 1e-12);
    test_utils::assert_approx_eq!(deltas.lat, 0.2, 1e-12);
    test_utils::assert_approx_eq!(deltas.time, 100.0, 1e-12);
    assert_eq!(deltas.depth, None);
}

#[test]
fn out_of_window_time_yields_no_matchups() {
    let config = MatchupConfig {
        geo_delta: 200.0,
        time_delta: 50.0,
        ..Default::default()
    };
    // model time axis is {0.0}; the record sits 1000 time units away
    let mut engine = engine_for(&[(55.0, 6.0, 1000.0, 0.4)], config);
    let matchups = engine.find_matchups("chl_ref", "chl").unwrap();
    assert!(matchups.is_empty());
}

#[test]
fn fill_observations_are_skipped() {
    let mut engine = engine_for(
        &[
            (55.0, 6.0, 0.0, FIXTURE_FILL),
            (55.0, 6.0, 0.0, 0.7),
            (55.0, 6.0, 0.0, f64::NAN),
        ],
        MatchupConfig {
            macro_pixel_size: 1,
            geo_delta: 1.0,
            ..Default::default()
        },
    );

    let records = engine.find_reference_records("chl_ref").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record_index, 1);

    let matchups = engine.find_matchups("chl_ref", "chl").unwrap();
    assert_eq!(matchups.len(), 1);
    assert_eq!(matchups[0].value("chl_ref"), Some(0.7));
}

#[test]
fn fill_model_cells_are_skipped() {
    let model = InMemoryDataset::builder("memory:filled-model")
        .coordinate("time", &[0.0])
        .coordinate("lat", &[55.2, 56.8])
        .coordinate("lon", &[5.3, 5.8, 6.3, 6.8])
        .variable(
            VariableDef::new(
                "chl",
                &["time", "lat", "lon"],
                &[
                    FIXTURE_FILL,
                    12.0,
                    FIXTURE_FILL,
                    14.0,
                    21.0,
                    FIXTURE_FILL,
                    23.0,
                    24.0,
                ],
            )
            .fill(FIXTURE_FILL),
        )
        .build();
    let store = VariableStore::with_reference(
        Box::new(model),
        Box::new(window_reference_dataset(&[(55.0, 6.0, 0.0, 0.4)])),
        StoreConfig::default(),
    );
    let mut engine = MatchupEngine::new(
        store,
        MatchupConfig {
            macro_pixel_size: 3,
            geo_delta: 200.0,
            ..Default::default()
        },
    );

    let matchups = engine.find_matchups("chl_ref", "chl").unwrap();
    let cells: Vec<(usize, usize)> = matchups
        .iter()
        .map(|m| (m.cell.lon_index, m.cell.lat_index))
        .collect();
    // cells (0,0), (1,1) and (2,0) hold the fill value
    assert_eq!(cells, vec![(0, 1), (1, 0), (2, 1)]);
}

#[test]
fn absent_reference_variable_yields_zero_records() {
    let mut engine = engine_for(&[(55.0, 6.0, 0.0, 0.4)], MatchupConfig::default());
    assert!(engine.find_reference_records("no_such_var").unwrap().is_empty());
    assert!(engine.find_matchups("no_such_var", "chl").unwrap().is_empty());
}

#[test]
fn depth_axis_widens_cell_arity() {
    let model = InMemoryDataset::builder("memory:depth-model")
        .coordinate("time", &[0.0])
        .coordinate("depth", &[0.0, 5.0, 50.0])
        .coordinate("lat", &[55.2, 56.8])
        .coordinate("lon", &[5.3, 5.8, 6.3, 6.8])
        .variable(
            VariableDef::new(
                "chl",
                &["time", "depth", "lat", "lon"],
                &(0..24).map(|i| i as f64).collect::<Vec<_>>(),
            )
            .fill(FIXTURE_FILL),
        )
        .build();

    let reference = InMemoryDataset::builder("memory:depth-reference")
        .dimension("record", 1)
        .variable(VariableDef::new("lat_ref", &["record"], &[55.0]))
        .variable(VariableDef::new("lon_ref", &["record"], &[6.0]))
        .variable(VariableDef::new("time_ref", &["record"], &[0.0]))
        .variable(VariableDef::new("depth_ref", &["record"], &[4.0]))
        .variable(
            VariableDef::new("chl_ref", &["record"], &[0.4])
                .coordinates("lat_ref lon_ref time_ref depth_ref"),
        )
        .build();

    let store = VariableStore::with_reference(
        Box::new(model),
        Box::new(reference),
        StoreConfig::default(),
    );
    let mut engine = MatchupEngine::new(
        store,
        MatchupConfig {
            macro_pixel_size: 1,
            geo_delta: 1.0,
            depth_delta: 3.0,
            ..Default::default()
        },
    );

    let matchups = engine.find_matchups("chl_ref", "chl").unwrap();
    // only depth 5.0 lies within 3.0 of the record depth 4.0
    assert_eq!(matchups.len(), 1);
    let m = &matchups[0];
    assert_eq!(m.cell.arity(), 4);
    assert_eq!(m.cell.depth_index, Some(1));
    assert_eq!(m.position.depth, Some(5.0));
    test_utils::assert_approx_eq!(m.deltas.depth.unwrap(), 1.0, 1e-12);
    // (time 0, depth 1, lat 0, lon 1) in the 1x3x2x4 value cube
    assert_eq!(m.value("chl"), Some(9.0));
}

#[test]
fn load_values_populates_additional_variable() {
    let model = InMemoryDataset::builder("memory:two-var-model")
        .coordinate("time", &[0.0])
        .coordinate("lat", &[55.2, 56.8])
        .coordinate("lon", &[5.3, 5.8, 6.3, 6.8])
        .variable(
            VariableDef::new(
                "chl",
                &["time", "lat", "lon"],
                &[11.0, 12.0, 13.0, 14.0, 21.0, 22.0, 23.0, 24.0],
            )
            .fill(FIXTURE_FILL),
        )
        .variable(
            VariableDef::new(
                "sst",
                &["time", "lat", "lon"],
                &[281.0, 282.0, FIXTURE_FILL, 284.0, 291.0, 292.0, 293.0, 294.0],
            )
            .fill(FIXTURE_FILL),
        )
        .build();
    let store = VariableStore::with_reference(
        Box::new(model),
        Box::new(window_reference_dataset(&[(55.0, 6.0, 0.0, 0.4)])),
        StoreConfig::default(),
    );
    let mut engine = MatchupEngine::new(
        store,
        MatchupConfig {
            macro_pixel_size: 3,
            geo_delta: 200.0,
            ..Default::default()
        },
    );

    let mut matchups = engine.find_matchups("chl_ref", "chl").unwrap();
    assert_eq!(matchups.len(), 6);
    engine.load_values(&mut matchups, "sst").unwrap();

    // cell (lon 1, lat 0) holds sst 282.0; cell (lon 2, lat 0) holds the fill
    let at = |lon: usize, lat: usize| {
        matchups
            .iter()
            .find(|m| m.cell.lon_index == lon && m.cell.lat_index == lat)
            .unwrap()
    };
    assert_eq!(at(1, 0).value("sst"), Some(282.0));
    assert_eq!(at(2, 0).value("sst"), None);
}

#[test]
fn reference_variables_lists_observation_variables() {
    let engine = engine_for(&[(55.0, 6.0, 0.0, 0.4)], MatchupConfig::default());
    assert_eq!(engine.reference_variables(), vec!["chl_ref".to_string()]);
}
