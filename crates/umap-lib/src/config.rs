/*!
Configuration for the UMAP estimator.

`UmapConfig` is a plain serializable struct with project defaults; every
range check the API promises happens in [`UmapConfig::validate`], which runs
from `Umap::new` before any computation. Nothing re-validates mid-pipeline.
*/

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::UmapError;
use crate::metric::Metric;

/// Default neighborhood size.
pub const DEFAULT_N_NEIGHBORS: usize = 15;
/// Default embedding dimension.
pub const DEFAULT_N_COMPONENTS: usize = 2;
/// Default minimum separation of embedded points.
pub const DEFAULT_MIN_DIST: f32 = 0.1;
/// Default kernel spread.
pub const DEFAULT_SPREAD: f32 = 1.0;
/// Default number of negative samples per positive update.
pub const DEFAULT_NEGATIVE_SAMPLE_RATE: usize = 5;

/// How the embedding is seeded before SGD.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Initialization {
    /// Eigenvectors of the fuzzy graph's normalized Laplacian; falls back to
    /// random for graphs too large for the dense solve.
    Spectral,
    /// Uniform in `[-10, 10]` per coordinate.
    Random,
    /// Caller-supplied coordinates of shape `(n, n_components)`.
    Matrix(Array2<f32>),
}

/// Distance used between supervision targets in `fit(X, y)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetMetric {
    /// Labels; handled by the categorical intersection path.
    Categorical,
    /// Continuous targets under L1 distance over one dimension.
    Euclidean,
}

/// All knobs of the estimator.
///
/// Fields mirror the public option surface one to one; see
/// [`UmapConfig::validate`] for the accepted ranges.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UmapConfig {
    /// Neighborhood size (>= 2).
    pub n_neighbors: usize,
    /// Embedding dimension (>= 1).
    pub n_components: usize,
    /// Optional override of the epoch schedule (> 10 when given).
    pub n_epochs: Option<usize>,
    /// Dissimilarity over input rows.
    pub metric: Metric,
    /// Initial SGD learning rate (> 0).
    pub learning_rate: f32,
    /// Repulsion strength gamma (>= 0).
    pub repulsion_strength: f32,
    /// Minimum separation of embedded points (> 0, < spread).
    pub min_dist: f32,
    /// Kernel spread (in [0.5, 1.5]).
    pub spread: f32,
    /// Fuzzy union/intersection mix (in [0, 1]; 1 is a pure union).
    pub set_op_mix_ratio: f32,
    /// Assumed perfectly-connected neighbor count (>= 1).
    pub local_connectivity: usize,
    /// Negative samples per positive SGD update (>= 1).
    pub negative_sample_rate: usize,
    /// Search-queue width multiplier used by `transform` (> 0).
    pub transform_queue_size: f32,
    /// Distance between supervision targets.
    pub target_metric: TargetMetric,
    /// Neighborhood size over targets; `-1` inherits `n_neighbors`.
    pub target_n_neighbors: i32,
    /// Blend between data structure and target structure (in [0, 1]).
    pub target_weight: f32,
    /// Embedding seed strategy.
    pub init: Initialization,
    /// Force angular splits in the random-projection forest.
    pub angular_rp_forest: bool,
    /// Seed of the single PRNG threaded through all stochastic choices.
    pub random_seed: u64,
    /// Emit progress through the `log` facade.
    pub verbose: bool,
}

impl Default for UmapConfig {
    fn default() -> Self {
        UmapConfig {
            n_neighbors: DEFAULT_N_NEIGHBORS,
            n_components: DEFAULT_N_COMPONENTS,
            n_epochs: None,
            metric: Metric::Euclidean,
            learning_rate: 1.0,
            repulsion_strength: 1.0,
            min_dist: DEFAULT_MIN_DIST,
            spread: DEFAULT_SPREAD,
            set_op_mix_ratio: 1.0,
            local_connectivity: 1,
            negative_sample_rate: DEFAULT_NEGATIVE_SAMPLE_RATE,
            transform_queue_size: 4.0,
            target_metric: TargetMetric::Categorical,
            target_n_neighbors: -1,
            target_weight: 0.5,
            init: Initialization::Spectral,
            angular_rp_forest: false,
            random_seed: 42,
            verbose: false,
        }
    }
}

impl UmapConfig {
    /// Check every parameter range. Called from `Umap::new`; errors never
    /// surface mid-computation.
    ///
    /// # Errors
    ///
    /// `UmapError::InvalidParameter` naming the offending option.
    pub fn validate(&self) -> Result<(), UmapError> {
        if self.n_neighbors < 2 {
            return Err(UmapError::invalid(
                "n_neighbors",
                format!("must be at least 2, got {}", self.n_neighbors),
            ));
        }
        if self.n_components < 1 {
            return Err(UmapError::invalid("n_components", "must be at least 1"));
        }
        if let Some(e) = self.n_epochs {
            if e <= 10 {
                return Err(UmapError::invalid(
                    "n_epochs",
                    format!("must be greater than 10, got {e}"),
                ));
            }
        }
        if !(self.learning_rate > 0.0) || !self.learning_rate.is_finite() {
            return Err(UmapError::invalid(
                "learning_rate",
                format!("must be positive, got {}", self.learning_rate),
            ));
        }
        if !(self.repulsion_strength >= 0.0) {
            return Err(UmapError::invalid(
                "repulsion_strength",
                format!("must be non-negative, got {}", self.repulsion_strength),
            ));
        }
        if !(0.5..=1.5).contains(&self.spread) {
            return Err(UmapError::invalid(
                "spread",
                format!("must lie in [0.5, 1.5], got {}", self.spread),
            ));
        }
        if !(self.min_dist > 0.0) || self.min_dist >= self.spread {
            return Err(UmapError::invalid(
                "min_dist",
                format!(
                    "must lie in (0, spread), got {} with spread {}",
                    self.min_dist, self.spread
                ),
            ));
        }
        if !(0.0..=1.0).contains(&self.set_op_mix_ratio) {
            return Err(UmapError::invalid(
                "set_op_mix_ratio",
                format!("must lie in [0, 1], got {}", self.set_op_mix_ratio),
            ));
        }
        if self.local_connectivity < 1 {
            return Err(UmapError::invalid(
                "local_connectivity",
                "must be at least 1",
            ));
        }
        if self.negative_sample_rate < 1 {
            return Err(UmapError::invalid(
                "negative_sample_rate",
                "must be at least 1",
            ));
        }
        if !(self.transform_queue_size > 0.0) {
            return Err(UmapError::invalid(
                "transform_queue_size",
                format!("must be positive, got {}", self.transform_queue_size),
            ));
        }
        if self.target_n_neighbors != -1 && self.target_n_neighbors < 2 {
            return Err(UmapError::invalid(
                "target_n_neighbors",
                format!("must be -1 or at least 2, got {}", self.target_n_neighbors),
            ));
        }
        if !(0.0..=1.0).contains(&self.target_weight) {
            return Err(UmapError::invalid(
                "target_weight",
                format!("must lie in [0, 1], got {}", self.target_weight),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        UmapConfig::default().validate().expect("defaults valid");
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        // Each closure perturbs exactly one option into an illegal value.
        let cases: Vec<(&str, Box<dyn Fn(&mut UmapConfig)>)> = vec![
            ("spread -1", Box::new(|c| c.spread = -1.0)),
            ("spread 0", Box::new(|c| c.spread = 0.0)),
            ("spread 2", Box::new(|c| c.spread = 2.0)),
            ("min_dist 0", Box::new(|c| c.min_dist = 0.0)),
            ("min_dist = spread", Box::new(|c| c.min_dist = c.spread)),
            ("n_neighbors 0", Box::new(|c| c.n_neighbors = 0)),
            ("n_neighbors 1", Box::new(|c| c.n_neighbors = 1)),
            ("negative_sample_rate 0", Box::new(|c| c.negative_sample_rate = 0)),
            ("learning_rate 0", Box::new(|c| c.learning_rate = 0.0)),
            ("set_op_mix_ratio -1", Box::new(|c| c.set_op_mix_ratio = -1.0)),
            ("set_op_mix_ratio 1.5", Box::new(|c| c.set_op_mix_ratio = 1.5)),
            ("n_epochs 10", Box::new(|c| c.n_epochs = Some(10))),
            ("local_connectivity 0", Box::new(|c| c.local_connectivity = 0)),
            ("target_weight 1.5", Box::new(|c| c.target_weight = 1.5)),
            ("target_n_neighbors 1", Box::new(|c| c.target_n_neighbors = 1)),
            ("transform_queue_size 0", Box::new(|c| c.transform_queue_size = 0.0)),
        ];
        for (name, mutate) in cases {
            let mut cfg = UmapConfig::default();
            mutate(&mut cfg);
            assert!(cfg.validate().is_err(), "`{name}` should be rejected");
        }
    }

    #[test]
    fn test_unknown_metric_name_rejected() {
        assert!(Metric::from_name("not-a-metric").is_err());
    }

    #[test]
    fn test_config_serde_round_trip() {
        let cfg = UmapConfig {
            n_neighbors: 10,
            metric: Metric::Cosine,
            ..UmapConfig::default()
        };
        let json = serde_json::to_string(&cfg).expect("serialize");
        let back: UmapConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.n_neighbors, 10);
        assert_eq!(back.metric.name(), "cosine");
        back.validate().expect("round-tripped config valid");
    }
}
