//! Full pipeline: matchup search feeding the statistics engine.

use matchup_engine::{MatchupConfig, MatchupEngine};
use statistics::{StatisticsConfig, StatisticsEngine, StatisticsRequest};
use test_utils::{assert_approx_eq, window_model_dataset, window_reference_dataset};
use variable_store::{StoreConfig, VariableStore};

#[test]
fn matchups_to_statistics() {
    // four observations, each resolving to exactly one grid cell:
    // cells (1,0)=12, (0,1)=21, (3,0)=14, (2,1)=23
    let records = [
        (55.0, 6.0, 0.0, 11.5),
        (56.8, 5.3, 0.0, 20.5),
        (55.2, 6.8, 0.0, 14.2),
        (56.8, 6.3, 0.0, 23.1),
    ];
    let store = VariableStore::with_reference(
        Box::new(window_model_dataset()),
        Box::new(window_reference_dataset(&records)),
        StoreConfig::default(),
    );
    let mut engine = MatchupEngine::new(
        store,
        MatchupConfig {
            macro_pixel_size: 1,
            geo_delta: 1.0,
            ..Default::default()
        },
    );

    let matchups = engine.find_matchups("chl_ref", "chl").unwrap();
    assert_eq!(matchups.len(), 4);

    let unit = engine.store().units_of("chl");
    let mut request = StatisticsRequest::from_matchups(&matchups, "chl_ref", "chl");
    if let Some(unit) = unit {
        request = request.with_unit(unit);
    }
    let record = StatisticsEngine::new(StatisticsConfig::default())
        .compute(&request)
        .unwrap();

    assert_eq!(record.valid_count, 4);
    assert_eq!(record.unit.as_deref(), Some("mg m-3"));
    assert_approx_eq!(record.bias, -0.175, 1e-12);
    assert_approx_eq!(record.rmse, 0.370810, 1e-5);
    assert_approx_eq!(record.corrcoeff, 0.997592, 1e-5);
    assert_approx_eq!(
        record.rmse * record.rmse,
        record.bias * record.bias + record.unbiased_rmse * record.unbiased_rmse,
        1e-5
    );
}

#[test]
fn macro_pixel_window_averages_more_cells_per_observation() {
    let store = VariableStore::with_reference(
        Box::new(window_model_dataset()),
        Box::new(window_reference_dataset(&[(55.0, 6.0, 0.0, 15.0)])),
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
    assert_eq!(matchups.len(), 6);

    let record = StatisticsEngine::new(StatisticsConfig::default())
        .compute(&StatisticsRequest::from_matchups(&matchups, "chl_ref", "chl"))
        .unwrap();

    // one observation validated against all six window cells
    assert_eq!(record.valid_count, 6);
    assert!(record.reference.stddev.abs() < 1e-12);
    assert!(record.corrcoeff.is_nan());
}
