//! The fixed-shape statistics record consumed by reporting collaborators.

use serde::{Deserialize, Serialize};

/// Summary statistics of one value sequence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub stddev: f64,
    pub median: f64,
    pub p90: f64,
    pub p95: f64,
}

impl SeriesSummary {
    /// A summary with every metric undefined.
    pub fn nan() -> Self {
        Self {
            min: f64::NAN,
            max: f64::NAN,
            mean: f64::NAN,
            stddev: f64::NAN,
            median: f64::NAN,
            p90: f64::NAN,
            p95: f64::NAN,
        }
    }
}

/// Summary and agreement statistics over one matched pair of sequences.
///
/// Metrics that are undefined for the given input (empty input, degenerate
/// variance, nonpositive log ratios) hold NaN rather than being omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsRecord {
    /// Name of the model variable, when known.
    pub model_name: Option<String>,
    /// Name of the reference variable, when known.
    pub reference_name: Option<String>,
    /// Physical units shared by both sequences, when known.
    pub unit: Option<String>,
    /// Number of pairs surviving mask harmonization.
    pub valid_count: usize,
    /// Per-sequence summaries.
    pub model: SeriesSummary,
    pub reference: SeriesSummary,
    /// Root mean square error.
    pub rmse: f64,
    /// RMSE with both sequences centered on their means.
    pub unbiased_rmse: f64,
    /// `mean(reference) - mean(model)`.
    pub bias: f64,
    /// Percentage bias, normalized by the reference sum.
    pub pbias: f64,
    /// Pearson correlation coefficient.
    pub corrcoeff: f64,
    /// Exponential of the RMS log-ratio error.
    pub reliability_index: f64,
    /// Nash-Sutcliffe model efficiency.
    pub model_efficiency: f64,
}

impl StatisticsRecord {
    /// The metric names exposed by [`get`](Self::get), in a stable order.
    pub fn metric_names() -> &'static [&'static str] {
        &[
            "model_min",
            "model_max",
            "model_mean",
            "model_stddev",
            "model_median",
            "model_p90",
            "model_p95",
            "ref_min",
            "ref_max",
            "ref_mean",
            "ref_stddev",
            "ref_median",
            "ref_p90",
            "ref_p95",
            "rmse",
            "unbiased_rmse",
            "bias",
            "pbias",
            "corrcoeff",
            "reliability_index",
            "model_efficiency",
        ]
    }

    /// Look up a metric by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        let value = match name {
            "model_min" => self.model.min,
            "model_max" => self.model.max,
            "model_mean" => self.model.mean,
            "model_stddev" => self.model.stddev,
            "model_median" => self.model.median,
            "model_p90" => self.model.p90,
            "model_p95" => self.model.p95,
            "ref_min" => self.reference.min,
            "ref_max" => self.reference.max,
            "ref_mean" => self.reference.mean,
            "ref_stddev" => self.reference.stddev,
            "ref_median" => self.reference.median,
            "ref_p90" => self.reference.p90,
            "ref_p95" => self.reference.p95,
            "rmse" => self.rmse,
            "unbiased_rmse" => self.unbiased_rmse,
            "bias" => self.bias,
            "pbias" => self.pbias,
            "corrcoeff" => self.corrcoeff,
            "reliability_index" => self.reliability_index,
            "model_efficiency" => self.model_efficiency,
            _ => return None,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_metric_name_resolves() {
        let record = StatisticsRecord {
            model_name: None,
            reference_name: None,
            unit: None,
            valid_count: 0,
            model: SeriesSummary::nan(),
            reference: SeriesSummary::nan(),
            rmse: f64::NAN,
            unbiased_rmse: f64::NAN,
            bias: f64::NAN,
            pbias: f64::NAN,
            corrcoeff: f64::NAN,
            reliability_index: f64::NAN,
            model_efficiency: f64::NAN,
        };
        for name in StatisticsRecord::metric_names() {
            assert!(record.get(name).is_some(), "unresolved metric {}", name);
        }
        assert!(record.get("not_a_metric").is_none());
    }
}
