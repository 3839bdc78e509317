//! The statistics engine and its reductions.

use tracing::debug;
use validation_common::{Matchup, Result, ValidationError};

use crate::config::StatisticsConfig;
use crate::record::{SeriesSummary, StatisticsRecord};
use crate::series::{harmonize, MaskedSeries};

/// Input to a statistics computation: explicit value pairs, or a matchup
/// list from which the pairs are extracted.
#[derive(Debug, Clone, Default)]
pub struct StatisticsRequest<'a> {
    /// Reference (observed truth) values.
    pub reference: Option<MaskedSeries>,
    /// Model (value under test) values.
    pub model: Option<MaskedSeries>,
    /// Matchups to extract value pairs from.
    pub matchups: Option<&'a [Matchup]>,
    /// Model variable name; required for matchup extraction.
    pub model_name: Option<String>,
    /// Reference variable name; required for matchup extraction.
    pub reference_name: Option<String>,
    /// Units string carried through to the record.
    pub unit: Option<String>,
}

impl<'a> StatisticsRequest<'a> {
    /// Build a request from two positionally aligned sequences.
    pub fn from_pairs(reference: MaskedSeries, model: MaskedSeries) -> Self {
        Self {
            reference: Some(reference),
            model: Some(model),
            ..Default::default()
        }
    }

    /// Build a request from a matchup list. The reference value of each pair
    /// is the matchup's entry under `reference_name`, the model value its
    /// entry under `model_name`.
    pub fn from_matchups(
        matchups: &'a [Matchup],
        reference_name: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            matchups: Some(matchups),
            reference_name: Some(reference_name.into()),
            model_name: Some(model_name.into()),
            ..Default::default()
        }
    }

    /// Tag the resulting record with variable names.
    pub fn named(mut self, reference_name: impl Into<String>, model_name: impl Into<String>) -> Self {
        self.reference_name = Some(reference_name.into());
        self.model_name = Some(model_name.into());
        self
    }

    /// Tag the resulting record with a units string.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// Computes the fixed battery of agreement statistics over matched pairs.
pub struct StatisticsEngine {
    config: StatisticsConfig,
}

impl StatisticsEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: StatisticsConfig) -> Self {
        Self { config }
    }

    /// Compute a statistics record for a request.
    ///
    /// Fails with `MissingInput` when the request carries neither matchups
    /// nor both value sequences, and with `LengthMismatch` when explicit
    /// sequences disagree in length.
    pub fn compute(&self, request: &StatisticsRequest) -> Result<StatisticsRecord> {
        let (reference, model) = match (&request.reference, &request.model, request.matchups) {
            (Some(reference), Some(model), _) => (reference.clone(), model.clone()),
            (_, _, Some(matchups)) => {
                let (Some(reference_name), Some(model_name)) =
                    (&request.reference_name, &request.model_name)
                else {
                    return Err(ValidationError::MissingInput);
                };
                extract_pairs(matchups, reference_name, model_name)
            }
            _ => return Err(ValidationError::MissingInput),
        };

        let (reference, model) = harmonize(&reference, &model)?;
        let ref_values = reference.valid_values();
        let model_values = model.valid_values();
        let n = ref_values.len();
        debug!(pairs = n, "computing statistics");

        let ref_mean = mean(&ref_values);
        let model_mean = mean(&model_values);
        let rmse = rmse(&ref_values, &model_values);
        let bias = ref_mean - model_mean;

        Ok(StatisticsRecord {
            model_name: request.model_name.clone(),
            reference_name: request.reference_name.clone(),
            unit: request.unit.clone(),
            valid_count: n,
            model: self.summarize(&model_values),
            reference: self.summarize(&ref_values),
            rmse,
            unbiased_rmse: unbiased_rmse(&ref_values, &model_values),
            bias,
            pbias: pbias(&ref_values, &model_values),
            corrcoeff: corrcoeff(&ref_values, &model_values),
            reliability_index: reliability_index(&ref_values, &model_values),
            model_efficiency: model_efficiency(&ref_values, &model_values),
        })
    }

    fn summarize(&self, values: &[f64]) -> SeriesSummary {
        if values.is_empty() {
            return SeriesSummary::nan();
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        SeriesSummary {
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean: mean(values),
            stddev: stddev(values, self.config.ddof),
            median: quantile(&sorted, 0.5, self.config.alpha, self.config.beta),
            p90: quantile(&sorted, 0.9, self.config.alpha, self.config.beta),
            p95: quantile(&sorted, 0.95, self.config.alpha, self.config.beta),
        }
    }
}

/// Extract positionally aligned (reference, model) series from matchups.
///
/// A matchup lacking a value under either name yields an invalid position.
fn extract_pairs(
    matchups: &[Matchup],
    reference_name: &str,
    model_name: &str,
) -> (MaskedSeries, MaskedSeries) {
    let mut ref_values = Vec::with_capacity(matchups.len());
    let mut ref_mask = Vec::with_capacity(matchups.len());
    let mut model_values = Vec::with_capacity(matchups.len());
    let mut model_mask = Vec::with_capacity(matchups.len());
    for matchup in matchups {
        match matchup.value(reference_name) {
            Some(v) if !v.is_nan() => {
                ref_values.push(v);
                ref_mask.push(true);
            }
            _ => {
                ref_values.push(f64::NAN);
                ref_mask.push(false);
            }
        }
        match matchup.value(model_name) {
            Some(v) if !v.is_nan() => {
                model_values.push(v);
                model_mask.push(true);
            }
            _ => {
                model_values.push(f64::NAN);
                model_mask.push(false);
            }
        }
    }
    (
        MaskedSeries::new(ref_values, ref_mask),
        MaskedSeries::new(model_values, model_mask),
    )
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn stddev(values: &[f64], ddof: usize) -> f64 {
    let n = values.len();
    if n == 0 || n <= ddof {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>();
    (sum_sq / (n - ddof) as f64).sqrt()
}

/// Empirical quantile with Weibull-family plotting positions.
///
/// `sorted` must be ascending. With `alpha = beta = 1` this is the classic
/// linear interpolation between order statistics.
fn quantile(sorted: &[f64], p: f64, alpha: f64, beta: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return sorted[0];
    }
    let m = alpha + p * (1.0 - alpha - beta);
    let position = n as f64 * p + m;
    let k = position.floor().clamp(1.0, (n - 1) as f64);
    let gamma = (position - k).clamp(0.0, 1.0);
    let k = k as usize;
    (1.0 - gamma) * sorted[k - 1] + gamma * sorted[k]
}

fn rmse(reference: &[f64], model: &[f64]) -> f64 {
    let n = reference.len();
    if n == 0 {
        return f64::NAN;
    }
    let sum_sq = reference
        .iter()
        .zip(model.iter())
        .map(|(r, m)| (m - r) * (m - r))
        .sum::<f64>();
    (sum_sq / n as f64).sqrt()
}

fn unbiased_rmse(reference: &[f64], model: &[f64]) -> f64 {
    let n = reference.len();
    if n == 0 {
        return f64::NAN;
    }
    let ref_mean = mean(reference);
    let model_mean = mean(model);
    let sum_sq = reference
        .iter()
        .zip(model.iter())
        .map(|(r, m)| {
            let centered = (m - model_mean) - (r - ref_mean);
            centered * centered
        })
        .sum::<f64>();
    (sum_sq / n as f64).sqrt()
}

fn pbias(reference: &[f64], model: &[f64]) -> f64 {
    if reference.is_empty() {
        return f64::NAN;
    }
    let diff_sum = reference
        .iter()
        .zip(model.iter())
        .map(|(r, m)| r - m)
        .sum::<f64>();
    100.0 * diff_sum / reference.iter().sum::<f64>()
}

fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|&v| v == values[0])
}

/// Pearson correlation; NaN whenever either sequence has only one distinct
/// value.
fn corrcoeff(reference: &[f64], model: &[f64]) -> f64 {
    let n = reference.len();
    if n == 0 || is_constant(reference) || is_constant(model) {
        return f64::NAN;
    }
    let ref_mean = mean(reference);
    let model_mean = mean(model);
    let mut cov = 0.0;
    let mut ref_var = 0.0;
    let mut model_var = 0.0;
    for (r, m) in reference.iter().zip(model.iter()) {
        let dr = r - ref_mean;
        let dm = m - model_mean;
        cov += dr * dm;
        ref_var += dr * dr;
        model_var += dm * dm;
    }
    cov / (ref_var * model_var).sqrt()
}

fn reliability_index(reference: &[f64], model: &[f64]) -> f64 {
    let n = reference.len();
    if n == 0 {
        return f64::NAN;
    }
    let sum_sq = reference
        .iter()
        .zip(model.iter())
        .map(|(r, m)| {
            let log_ratio = (r / m).log10();
            log_ratio * log_ratio
        })
        .sum::<f64>();
    (sum_sq / n as f64).sqrt().exp()
}

/// Nash-Sutcliffe model efficiency; NaN when the reference is constant.
fn model_efficiency(reference: &[f64], model: &[f64]) -> f64 {
    let n = reference.len();
    if n == 0 || is_constant(reference) {
        return f64::NAN;
    }
    let ref_mean = mean(reference);
    let err_sq = reference
        .iter()
        .zip(model.iter())
        .map(|(r, m)| (r - m) * (r - m))
        .sum::<f64>();
    let var_sq = reference.iter().map(|r| (r - ref_mean) * (r - ref_mean)).sum::<f64>();
    1.0 - err_sq / var_sq
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_stddev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), 5.0);
        assert!((stddev(&values, 0) - 2.0).abs() < 1e-12);
        assert!(stddev(&[1.0], 1).is_nan());
        assert!(stddev(&[], 0).is_nan());
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        // alpha = beta = 1: median of 1..=4 is 2.5
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((quantile(&sorted, 0.5, 1.0, 1.0) - 2.5).abs() < 1e-12);
        assert!((quantile(&sorted, 0.9, 1.0, 1.0) - 3.7).abs() < 1e-12);
        assert_eq!(quantile(&sorted, 0.0, 1.0, 1.0), 1.0);
        assert_eq!(quantile(&sorted, 1.0, 1.0, 1.0), 4.0);
        assert_eq!(quantile(&[42.0], 0.5, 1.0, 1.0), 42.0);
    }

    #[test]
    fn test_quantile_weibull_positions() {
        // alpha = beta = 0 is the Weibull plotting position
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((quantile(&sorted, 0.5, 0.0, 0.0) - 2.5).abs() < 1e-12);
        assert!((quantile(&sorted, 0.2, 0.0, 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_detection() {
        assert!(is_constant(&[3.0, 3.0, 3.0]));
        assert!(!is_constant(&[3.0, 3.1]));
    }
}
