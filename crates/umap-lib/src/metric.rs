/*!
Distance functions for the high-dimensional input space.

Every metric is a symmetric dissimilarity `d(x, y) >= 0` over equal-length
dense `f32` vectors. A metric additionally declares whether it is *angular*,
which changes the splitting rule of the random-projection forest. Two marker
variants carry no kernel at all:

- `Precomputed` — the input matrix already holds pairwise distances; kNN is
  obtained by sorting rows and `distance` is never called.
- custom kernels are injected through `Metric::custom`, which accepts any
  closure honoring the contract above.
*/

use std::fmt;
use std::sync::Arc;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::UmapError;

/// Type of the pluggable distance kernel.
pub type DistanceFn = Arc<dyn Fn(&[f32], &[f32]) -> f32 + Send + Sync>;

/// A dissimilarity function over dense `f32` vectors.
#[derive(Clone)]
pub enum Metric {
    Euclidean,
    Manhattan,
    Chebyshev,
    Cosine,
    Correlation,
    Hamming,
    Jaccard,
    /// The input matrix is itself a pairwise distance matrix.
    Precomputed,
    /// User-supplied kernel. `angular` selects the forest splitting rule.
    Custom {
        name: String,
        func: DistanceFn,
        angular: bool,
    },
}

impl Metric {
    /// Construct a custom metric from any closure honoring the distance
    /// contract (symmetric, non-negative, zero on identical inputs).
    pub fn custom(
        name: impl Into<String>,
        angular: bool,
        func: impl Fn(&[f32], &[f32]) -> f32 + Send + Sync + 'static,
    ) -> Self {
        Metric::Custom {
            name: name.into(),
            func: Arc::new(func),
            angular,
        }
    }

    /// Resolve a metric by its canonical name.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for names this build does not know.
    pub fn from_name(name: &str) -> Result<Self, UmapError> {
        match name {
            "euclidean" | "l2" => Ok(Metric::Euclidean),
            "manhattan" | "l1" | "taxicab" => Ok(Metric::Manhattan),
            "chebyshev" | "linf" => Ok(Metric::Chebyshev),
            "cosine" => Ok(Metric::Cosine),
            "correlation" => Ok(Metric::Correlation),
            "hamming" => Ok(Metric::Hamming),
            "jaccard" => Ok(Metric::Jaccard),
            "precomputed" => Ok(Metric::Precomputed),
            other => Err(UmapError::invalid(
                "metric",
                format!("unknown metric name `{other}`"),
            )),
        }
    }

    /// Canonical name, used for persistence and diagnostics.
    pub fn name(&self) -> &str {
        match self {
            Metric::Euclidean => "euclidean",
            Metric::Manhattan => "manhattan",
            Metric::Chebyshev => "chebyshev",
            Metric::Cosine => "cosine",
            Metric::Correlation => "correlation",
            Metric::Hamming => "hamming",
            Metric::Jaccard => "jaccard",
            Metric::Precomputed => "precomputed",
            Metric::Custom { name, .. } => name,
        }
    }

    /// Whether the metric is angular (affects forest split choice).
    pub fn is_angular(&self) -> bool {
        match self {
            Metric::Cosine | Metric::Correlation => true,
            Metric::Custom { angular, .. } => *angular,
            _ => false,
        }
    }

    /// Evaluate the kernel.
    ///
    /// `Precomputed` carries no kernel; callers must take the
    /// sort-rows path instead of calling this.
    pub fn distance(&self, x: &[f32], y: &[f32]) -> f32 {
        debug_assert_eq!(x.len(), y.len());
        match self {
            Metric::Euclidean => euclidean(x, y),
            Metric::Manhattan => manhattan(x, y),
            Metric::Chebyshev => chebyshev(x, y),
            Metric::Cosine => cosine(x, y),
            Metric::Correlation => correlation(x, y),
            Metric::Hamming => hamming(x, y),
            Metric::Jaccard => jaccard(x, y),
            Metric::Custom { func, .. } => func(x, y),
            Metric::Precomputed => {
                unreachable!("precomputed input carries no distance kernel")
            }
        }
    }
}

impl fmt::Debug for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Metric").field(&self.name()).finish()
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Metric {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Metric::from_name(&name).map_err(D::Error::custom)
    }
}

fn euclidean(x: &[f32], y: &[f32]) -> f32 {
    x.iter()
        .zip(y.iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f32>()
        .sqrt()
}

fn manhattan(x: &[f32], y: &[f32]) -> f32 {
    x.iter().zip(y.iter()).map(|(a, b)| (a - b).abs()).sum()
}

fn chebyshev(x: &[f32], y: &[f32]) -> f32 {
    x.iter()
        .zip(y.iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0_f32, f32::max)
}

fn cosine(x: &[f32], y: &[f32]) -> f32 {
    let mut dot = 0.0_f32;
    let mut nx = 0.0_f32;
    let mut ny = 0.0_f32;
    for (a, b) in x.iter().zip(y.iter()) {
        dot += a * b;
        nx += a * a;
        ny += b * b;
    }
    if nx == 0.0 && ny == 0.0 {
        0.0
    } else if nx == 0.0 || ny == 0.0 {
        1.0
    } else {
        // Guard tiny negative values produced by rounding.
        (1.0 - dot / (nx.sqrt() * ny.sqrt())).max(0.0)
    }
}

fn correlation(x: &[f32], y: &[f32]) -> f32 {
    let n = x.len() as f32;
    let mu_x = x.iter().sum::<f32>() / n;
    let mu_y = y.iter().sum::<f32>() / n;
    let mut dot = 0.0_f32;
    let mut nx = 0.0_f32;
    let mut ny = 0.0_f32;
    for (a, b) in x.iter().zip(y.iter()) {
        let sa = a - mu_x;
        let sb = b - mu_y;
        dot += sa * sb;
        nx += sa * sa;
        ny += sb * sb;
    }
    if nx == 0.0 && ny == 0.0 {
        0.0
    } else if nx == 0.0 || ny == 0.0 {
        1.0
    } else {
        (1.0 - dot / (nx.sqrt() * ny.sqrt())).max(0.0)
    }
}

fn hamming(x: &[f32], y: &[f32]) -> f32 {
    let unequal = x.iter().zip(y.iter()).filter(|(a, b)| a != b).count();
    unequal as f32 / x.len() as f32
}

fn jaccard(x: &[f32], y: &[f32]) -> f32 {
    let mut either = 0usize;
    let mut both = 0usize;
    for (a, b) in x.iter().zip(y.iter()) {
        let xa = *a != 0.0;
        let yb = *b != 0.0;
        if xa || yb {
            either += 1;
        }
        if xa && yb {
            both += 1;
        }
    }
    if either == 0 {
        0.0
    } else {
        (either - both) as f32 / either as f32
    }
}
