/*!
The UMAP estimator and fitted model.

`Umap` wires the numerical building blocks into the fit pipeline:

1. approximate (or exact, for small inputs) kNN over the chosen metric
2. per-point bandwidth calibration and membership strengths
3. symmetric fuzzy union, optionally intersected with supervision targets
4. kernel calibration `(a, b)` from `(spread, min_dist)`
5. embedding initialization (spectral, random, or supplied)
6. negative-sampling SGD over the graph's edges

`UmapModel` keeps everything `transform` needs to embed new points against
the frozen training embedding: the training data, kNN arrays, forest, fuzzy
graph, symmetric search graph, and the calibrated kernel.
*/

use log::{info, warn};
use ndarray::{Array2, ArrayView2};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::{Initialization, TargetMetric, UmapConfig};
use crate::curve::find_ab_params;
use crate::error::UmapError;
use crate::fuzzy::{
    categorical_intersection, compute_membership_strengths, fuzzy_set_union, general_intersection,
    reset_local_connectivity, smooth_knn_dist,
};
use crate::knn::descent::{
    initialise_search, initialized_nnd_search, nn_descent, DescentParams,
};
use crate::knn::forest::{leaf_array, make_forest, FlatTree};
use crate::layout::{make_epochs_per_sample, optimize_layout, LayoutParams};
use crate::metric::Metric;
use crate::sparse::{CooMatrix, CsrMatrix};
use crate::spectral::spectral_layout;

/// Below this many points the exact pairwise path replaces forest + descent.
const SMALL_DATA_LIMIT: usize = 4096;

/// Scale of the categorical damping applied to unknown-label edges.
const UNKNOWN_TARGET_DIST: f32 = 1.0;

/// A configured (but not yet fitted) estimator.
#[derive(Clone, Debug)]
pub struct Umap {
    config: UmapConfig,
}

/// Everything `fit` learns; the embedding is the only part mutated after
/// construction, and only by `fit` itself.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UmapModel {
    pub(crate) config: UmapConfig,
    pub(crate) raw_data: Array2<f32>,
    pub(crate) a: f32,
    pub(crate) b: f32,
    pub(crate) n_neighbors: usize,
    pub(crate) knn_indices: Array2<i32>,
    pub(crate) knn_dists: Array2<f32>,
    pub(crate) rp_forest: Vec<FlatTree>,
    pub(crate) graph: CooMatrix,
    pub(crate) search_graph: CsrMatrix,
    pub(crate) embedding: Array2<f32>,
}

impl Umap {
    /// Validate the configuration and wrap it.
    ///
    /// # Errors
    ///
    /// Any range violation from [`UmapConfig::validate`], plus the curve-fit
    /// preconditions on `(spread, min_dist)`.
    pub fn new(config: UmapConfig) -> Result<Self, UmapError> {
        config.validate()?;
        Ok(Umap { config })
    }

    /// Estimator with all-default options.
    pub fn with_defaults() -> Self {
        Umap {
            config: UmapConfig::default(),
        }
    }

    pub fn config(&self) -> &UmapConfig {
        &self.config
    }

    /// Fit and return the embedding in one call.
    pub fn fit_transform(
        &self,
        x: &Array2<f32>,
        y: Option<&[f32]>,
    ) -> Result<Array2<f32>, UmapError> {
        Ok(self.fit(x, y)?.embedding)
    }

    /// Fit the model to `x`, optionally supervised by per-row targets `y`.
    ///
    /// # Errors
    ///
    /// Shape mismatches (empty input, ragged supervision, non-square
    /// precomputed matrix, wrongly shaped init matrix). Numerical
    /// degeneracies are warnings: too few distinct points truncates the
    /// neighborhood, unfilled kNN slots are skipped downstream.
    pub fn fit(&self, x: &Array2<f32>, y: Option<&[f32]>) -> Result<UmapModel, UmapError> {
        let cfg = &self.config;
        let x = x.as_standard_layout().into_owned();
        let n = x.nrows();
        if n == 0 {
            return Err(UmapError::ShapeMismatch {
                context: "fit input",
                expected: "at least one row".to_string(),
                actual: "0 rows".to_string(),
            });
        }
        if let Some(targets) = y {
            if targets.len() != n {
                return Err(UmapError::ShapeMismatch {
                    context: "fit targets",
                    expected: format!("{n} targets"),
                    actual: format!("{}", targets.len()),
                });
            }
        }
        if matches!(cfg.metric, Metric::Precomputed) && x.ncols() != n {
            return Err(UmapError::ShapeMismatch {
                context: "precomputed distances",
                expected: format!("{n}x{n}"),
                actual: format!("{n}x{}", x.ncols()),
            });
        }

        let (a, b) = find_ab_params(cfg.spread, cfg.min_dist)?;
        let mut rng = SmallRng::seed_from_u64(cfg.random_seed);

        // Degenerate sizes: a single point embeds at the origin; otherwise
        // shrink the neighborhood to what the data can support.
        if n == 1 {
            let embedding = Array2::zeros((1, cfg.n_components));
            return Ok(UmapModel {
                config: cfg.clone(),
                raw_data: x,
                a,
                b,
                n_neighbors: 0,
                knn_indices: Array2::zeros((0, 0)),
                knn_dists: Array2::zeros((0, 0)),
                rp_forest: Vec::new(),
                graph: CooMatrix::new(1, 1),
                search_graph: CooMatrix::new(1, 1).to_csr(),
                embedding,
            });
        }
        let mut n_neighbors = cfg.n_neighbors;
        if n <= n_neighbors {
            warn!(
                "n_neighbors {} is larger than the dataset ({} points); truncating to {}",
                n_neighbors,
                n,
                n - 1
            );
            n_neighbors = n - 1;
        }

        // 1) kNN graph: exact for small or precomputed inputs, forest +
        //    NN-descent beyond.
        if cfg.verbose {
            info!("computing {n_neighbors}-NN graph over {n} points");
        }
        let angular = cfg.angular_rp_forest || cfg.metric.is_angular();
        let (knn_indices, knn_dists, rp_forest) = if matches!(cfg.metric, Metric::Precomputed) {
            let (idx, dist) = exact_knn_precomputed(&x.view(), n_neighbors);
            (idx, dist, Vec::new())
        } else if n < SMALL_DATA_LIMIT {
            let (idx, dist) = exact_knn(&x.view(), &x.view(), n_neighbors, &cfg.metric);
            (idx, dist, Vec::new())
        } else {
            let n_trees = 5 + (n as f32).sqrt().round() as usize / 20;
            let forest = make_forest(&x.view(), n_neighbors, n_trees, &mut rng, angular);
            let leaves = leaf_array(&forest);
            let params = DescentParams::for_size(n);
            let (idx, dist) = nn_descent(
                &x.view(),
                n_neighbors,
                &cfg.metric,
                Some(&leaves),
                &params,
                &mut rng,
            );
            if idx.iter().any(|&i| i < 0) {
                warn!("NN-descent left unfilled neighbor slots; they will be skipped");
            }
            (idx, dist, forest)
        };

        // 2) + 3) Calibrate bandwidths and build the symmetric fuzzy graph.
        if cfg.verbose {
            info!("constructing fuzzy simplicial set");
        }
        let (sigmas, rhos) = smooth_knn_dist(
            &knn_dists.view(),
            n_neighbors as f32,
            cfg.local_connectivity as f32,
            1.0,
        );
        let membership = compute_membership_strengths(
            &knn_indices.view(),
            &knn_dists.view(),
            &sigmas,
            &rhos,
            (n, n),
        )?;
        let mut graph = fuzzy_set_union(&membership, cfg.set_op_mix_ratio)?;

        // Supervision: intersect with the target structure.
        if let Some(targets) = y {
            graph = match cfg.target_metric {
                TargetMetric::Categorical => {
                    let far_dist = if cfg.target_weight < 1.0 {
                        2.5 / (1.0 - cfg.target_weight)
                    } else {
                        1.0e12
                    };
                    categorical_intersection(&graph, targets, UNKNOWN_TARGET_DIST, far_dist)?
                }
                TargetMetric::Euclidean => {
                    let target_k = if cfg.target_n_neighbors == -1 {
                        n_neighbors
                    } else {
                        (cfg.target_n_neighbors as usize).min(n - 1)
                    };
                    let y_mat =
                        Array2::from_shape_vec((n, 1), targets.to_vec()).expect("column vector");
                    let target_graph =
                        fuzzy_graph_1d(&y_mat.view(), target_k, &mut rng)?;
                    let blended = general_intersection(&graph, &target_graph, cfg.target_weight)?;
                    reset_local_connectivity(&blended.eliminate_zeros())?
                }
            };
        }

        // 4) Symmetric 0/1 search graph for `transform`: both directions of
        //    every kNN edge.
        let mut edges = std::collections::BTreeSet::new();
        for i in 0..knn_indices.nrows() {
            for &j in knn_indices.row(i) {
                if j >= 0 && j as usize != i {
                    edges.insert((i as u32, j as u32));
                    edges.insert((j as u32, i as u32));
                }
            }
        }
        let search_graph = CooMatrix::from_triplets(
            n,
            n,
            edges.into_iter().map(|(r, c)| (r, c, 1.0)).collect(),
        )?
        .to_csr();

        // 5) Seed the embedding.
        let mut embedding = match &cfg.init {
            Initialization::Random => random_init(n, cfg.n_components, &mut rng),
            Initialization::Spectral => match spectral_layout(&graph, cfg.n_components, &mut rng) {
                Some(init) => init,
                None => {
                    warn!("graph too large for dense spectral init; falling back to random");
                    random_init(n, cfg.n_components, &mut rng)
                }
            },
            Initialization::Matrix(m) => {
                if m.nrows() != n || m.ncols() != cfg.n_components {
                    return Err(UmapError::ShapeMismatch {
                        context: "init matrix",
                        expected: format!("{n}x{}", cfg.n_components),
                        actual: format!("{}x{}", m.nrows(), m.ncols()),
                    });
                }
                m.clone()
            }
        };

        // 6) SGD over the thresholded edge set.
        let n_epochs = cfg.n_epochs.unwrap_or(if n <= 10_000 { 500 } else { 200 });
        if cfg.verbose {
            info!("optimizing layout for {n_epochs} epochs");
        }
        let (head, tail, epochs_per_sample) = simplex_schedule(&graph, n_epochs);
        let params = LayoutParams {
            a,
            b,
            gamma: cfg.repulsion_strength,
            initial_alpha: cfg.learning_rate,
            negative_sample_rate: cfg.negative_sample_rate as f32,
            n_epochs,
        };
        optimize_layout(
            &mut embedding,
            None,
            &head,
            &tail,
            &epochs_per_sample,
            &params,
            &mut rng,
        );

        Ok(UmapModel {
            config: cfg.clone(),
            raw_data: x,
            a,
            b,
            n_neighbors,
            knn_indices,
            knn_dists,
            rp_forest,
            graph,
            search_graph,
            embedding,
        })
    }
}

impl UmapModel {
    /// The training embedding, shape `(n, n_components)`.
    pub fn embedding(&self) -> &Array2<f32> {
        &self.embedding
    }

    /// The symmetric fuzzy graph the layout was optimized against.
    pub fn graph(&self) -> &CooMatrix {
        &self.graph
    }

    pub fn config(&self) -> &UmapConfig {
        &self.config
    }

    /// Embed new points against the fitted model. The training embedding is
    /// held fixed; only the new points move.
    ///
    /// # Errors
    ///
    /// Unsupported after a single-sample fit or a precomputed-metric fit;
    /// shape mismatch when the feature count differs from the training data.
    pub fn transform(&self, x: &Array2<f32>) -> Result<Array2<f32>, UmapError> {
        let cfg = &self.config;
        if self.raw_data.nrows() == 1 {
            return Err(UmapError::Unsupported(
                "transform after fitting a single sample",
            ));
        }
        if matches!(cfg.metric, Metric::Precomputed) {
            return Err(UmapError::Unsupported(
                "transform with a precomputed distance matrix",
            ));
        }
        let x = x.as_standard_layout().into_owned();
        if x.ncols() != self.raw_data.ncols() {
            return Err(UmapError::ShapeMismatch {
                context: "transform input",
                expected: format!("{} features", self.raw_data.ncols()),
                actual: format!("{}", x.ncols()),
            });
        }
        let m = x.nrows();
        if m == 0 {
            return Ok(Array2::zeros((0, cfg.n_components)));
        }
        let n_train = self.raw_data.nrows();
        let k = self.n_neighbors;
        let mut rng = SmallRng::seed_from_u64(cfg.random_seed.wrapping_add(1));

        // kNN of the queries in the training set.
        let (indices, dists) = if n_train < SMALL_DATA_LIMIT {
            exact_knn(&x.view(), &self.raw_data.view(), k, &cfg.metric)
        } else {
            let queue_size = (((k as f32) * cfg.transform_queue_size) as usize).max(k);
            let init = initialise_search(
                &self.rp_forest,
                &self.raw_data.view(),
                &x.view(),
                queue_size,
                &cfg.metric,
                &mut rng,
            );
            let refined = initialized_nnd_search(
                &self.raw_data.view(),
                &self.search_graph,
                init,
                &x.view(),
                &cfg.metric,
            );
            let (idx_full, dist_full) = refined.deheap_sort();
            (
                idx_full.slice(ndarray::s![.., ..k]).to_owned(),
                dist_full.slice(ndarray::s![.., ..k]).to_owned(),
            )
        };

        // Membership weights with the transform-adjusted connectivity.
        let (sigmas, rhos) = smooth_knn_dist(
            &dists.view(),
            k as f32,
            (cfg.local_connectivity - 1) as f32,
            1.0,
        );
        let membership = compute_membership_strengths(
            &indices.view(),
            &dists.view(),
            &sigmas,
            &rhos,
            (m, n_train),
        )?;
        let normalized = membership.to_csr().row_normalize_l1();

        // Constant-degree reshape of the normalized rows into (m, k) arrays;
        // short rows (skipped -1 neighbors) pad with weight zero.
        let mut inds = Array2::<u32>::zeros((m, k));
        let mut weights = Array2::<f32>::zeros((m, k));
        for r in 0..m {
            let (cols, vals) = normalized.row(r);
            for (t, (&c, &v)) in cols.iter().zip(vals.iter()).take(k).enumerate() {
                inds[[r, t]] = c;
                weights[[r, t]] = v;
            }
        }

        // Weighted average of the anchoring training positions.
        let mut embedding = Array2::<f32>::zeros((m, cfg.n_components));
        for r in 0..m {
            for t in 0..k {
                let w = weights[[r, t]];
                if w == 0.0 {
                    continue;
                }
                for d in 0..cfg.n_components {
                    embedding[[r, d]] += w * self.embedding[[inds[[r, t]] as usize, d]];
                }
            }
        }

        // SGD against the frozen training embedding.
        let n_epochs = cfg.n_epochs.unwrap_or(if m <= 10_000 { 100 } else { 30 });
        let graph = normalized.to_coo();
        let (head, tail, epochs_per_sample) = simplex_schedule(&graph, n_epochs);
        let params = LayoutParams {
            a: self.a,
            b: self.b,
            gamma: cfg.repulsion_strength,
            initial_alpha: cfg.learning_rate / 4.0,
            negative_sample_rate: cfg.negative_sample_rate as f32,
            n_epochs,
        };
        optimize_layout(
            &mut embedding,
            Some(&self.embedding),
            &head,
            &tail,
            &epochs_per_sample,
            &params,
            &mut rng,
        );
        Ok(embedding)
    }
}

/// Threshold the graph so the total sample count stays bounded, then derive
/// the per-edge firing schedule.
fn simplex_schedule(graph: &CooMatrix, n_epochs: usize) -> (Vec<u32>, Vec<u32>, Vec<f32>) {
    let cutoff = graph.max_value() / n_epochs as f32;
    let pruned = graph
        .map_data(|v| if v < cutoff { 0.0 } else { v })
        .eliminate_zeros();
    let mut head = Vec::with_capacity(pruned.nnz());
    let mut tail = Vec::with_capacity(pruned.nnz());
    let mut weights = Vec::with_capacity(pruned.nnz());
    for (r, c, v) in pruned.iter() {
        head.push(r);
        tail.push(c);
        weights.push(v);
    }
    let epochs_per_sample = make_epochs_per_sample(&weights, n_epochs);
    (head, tail, epochs_per_sample)
}

/// Exact kNN of every `queries` row within `train`. When the query set is
/// the training set itself, the zero-distance self column comes out first.
fn exact_knn(
    queries: &ArrayView2<f32>,
    train: &ArrayView2<f32>,
    k: usize,
    metric: &Metric,
) -> (Array2<i32>, Array2<f32>) {
    use rayon::prelude::*;

    let n = train.nrows();
    let rows: Vec<(Vec<i32>, Vec<f32>)> = (0..queries.nrows())
        .into_par_iter()
        .map(|i| {
            let q = queries.row(i);
            let q_slice = q.to_slice().expect("row-major input");
            let dists: Vec<f32> = (0..n)
                .map(|j| {
                    metric.distance(q_slice, train.row(j).to_slice().expect("row-major input"))
                })
                .collect();
            sorted_prefix(&dists, k)
        })
        .collect();
    pack_knn(rows, k)
}

/// kNN by sorting the rows of a precomputed distance matrix.
fn exact_knn_precomputed(distances: &ArrayView2<f32>, k: usize) -> (Array2<i32>, Array2<f32>) {
    use rayon::prelude::*;

    let rows: Vec<(Vec<i32>, Vec<f32>)> = (0..distances.nrows())
        .into_par_iter()
        .map(|i| {
            let row: Vec<f32> = distances.row(i).to_vec();
            sorted_prefix(&row, k)
        })
        .collect();
    pack_knn(rows, k)
}

fn sorted_prefix(dists: &[f32], k: usize) -> (Vec<i32>, Vec<f32>) {
    let mut order: Vec<usize> = (0..dists.len()).collect();
    order.sort_by(|&a, &b| dists[a].total_cmp(&dists[b]));
    order.truncate(k);
    (
        order.iter().map(|&j| j as i32).collect(),
        order.iter().map(|&j| dists[j]).collect(),
    )
}

fn pack_knn(rows: Vec<(Vec<i32>, Vec<f32>)>, k: usize) -> (Array2<i32>, Array2<f32>) {
    let n = rows.len();
    let mut indices = Array2::from_elem((n, k), -1);
    let mut dists = Array2::from_elem((n, k), f32::INFINITY);
    for (i, (idx, d)) in rows.into_iter().enumerate() {
        for (j, (ii, dd)) in idx.into_iter().zip(d.into_iter()).enumerate() {
            indices[[i, j]] = ii;
            dists[[i, j]] = dd;
        }
    }
    (indices, dists)
}

/// Uniform random layout in the optimizer's working range.
fn random_init(n: usize, dim: usize, rng: &mut SmallRng) -> Array2<f32> {
    Array2::from_shape_fn((n, dim), |_| rng.gen_range(-10.0_f32..10.0))
}

/// Fuzzy graph over a 1-D continuous target column (L1 distance), used by
/// the general target intersection.
fn fuzzy_graph_1d(
    y: &ArrayView2<f32>,
    k: usize,
    rng: &mut SmallRng,
) -> Result<CooMatrix, UmapError> {
    let n = y.nrows();
    let (idx, dist) = if n < SMALL_DATA_LIMIT {
        exact_knn(y, y, k, &Metric::Manhattan)
    } else {
        let params = DescentParams::for_size(n);
        nn_descent(y, k, &Metric::Manhattan, None, &params, rng)
    };
    let (sigmas, rhos) = smooth_knn_dist(&dist.view(), k as f32, 1.0, 1.0);
    let membership =
        compute_membership_strengths(&idx.view(), &dist.view(), &sigmas, &rhos, (n, n))?;
    fuzzy_set_union(&membership, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_exact_knn_self_first() {
        let data = array![[0.0_f32, 0.0], [1.0, 0.0], [5.0, 5.0]];
        let (idx, dist) = exact_knn(&data.view(), &data.view(), 2, &Metric::Euclidean);
        assert_eq!(idx[[0, 0]], 0);
        assert_eq!(dist[[0, 0]], 0.0);
        assert_eq!(idx[[0, 1]], 1);
        assert_eq!(idx[[1, 1]], 0);
    }

    #[test]
    fn test_exact_knn_precomputed_sorts_rows() {
        let d = array![[0.0_f32, 3.0, 1.0], [3.0, 0.0, 2.0], [1.0, 2.0, 0.0]];
        let (idx, dist) = exact_knn_precomputed(&d.view(), 2);
        assert_eq!(idx.row(0).to_vec(), vec![0, 2]);
        assert_eq!(dist.row(0).to_vec(), vec![0.0, 1.0]);
        assert_eq!(idx.row(1).to_vec(), vec![1, 2]);
    }

    #[test]
    fn test_simplex_schedule_prunes_weak_edges() {
        let g = CooMatrix::from_triplets(
            2,
            2,
            vec![(0, 1, 1.0), (1, 0, 0.0005)],
        )
        .unwrap();
        let (head, tail, eps) = simplex_schedule(&g, 100);
        // The weak edge falls under max/n_epochs = 0.01 and is dropped.
        assert_eq!(head, vec![0]);
        assert_eq!(tail, vec![1]);
        assert_eq!(eps, vec![1.0]);
    }

    #[test]
    fn test_fit_rejects_bad_shapes() {
        let umap = Umap::with_defaults();
        let empty = Array2::<f32>::zeros((0, 4));
        assert!(matches!(
            umap.fit(&empty, None),
            Err(UmapError::ShapeMismatch { .. })
        ));

        let data = Array2::<f32>::zeros((5, 4));
        let bad_y = vec![1.0_f32; 3];
        assert!(matches!(
            umap.fit(&data, Some(&bad_y)),
            Err(UmapError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_single_sample_fit_and_transform_refusal() {
        let umap = Umap::with_defaults();
        let data = array![[1.0_f32, 2.0, 3.0]];
        let model = umap.fit(&data, None).expect("single-sample fit");
        assert_eq!(model.embedding().shape(), &[1, 2]);
        assert!(model.embedding().iter().all(|&v| v == 0.0));
        assert!(matches!(
            model.transform(&data),
            Err(UmapError::Unsupported(_))
        ));
    }

    #[test]
    fn test_precomputed_transform_refusal() {
        let cfg = UmapConfig {
            metric: Metric::Precomputed,
            n_neighbors: 2,
            init: Initialization::Random,
            ..UmapConfig::default()
        };
        let umap = Umap::new(cfg).unwrap();
        // Symmetric 4x4 distance matrix.
        let d = array![
            [0.0_f32, 1.0, 2.0, 3.0],
            [1.0, 0.0, 1.5, 2.5],
            [2.0, 1.5, 0.0, 1.0],
            [3.0, 2.5, 1.0, 0.0]
        ];
        let model = umap.fit(&d, None).expect("precomputed fit");
        assert_eq!(model.embedding().shape(), &[4, 2]);
        assert!(matches!(
            model.transform(&d),
            Err(UmapError::Unsupported(_))
        ));
    }

    #[test]
    fn test_precomputed_requires_square() {
        let cfg = UmapConfig {
            metric: Metric::Precomputed,
            ..UmapConfig::default()
        };
        let umap = Umap::new(cfg).unwrap();
        let d = Array2::<f32>::zeros((4, 3));
        assert!(matches!(
            umap.fit(&d, None),
            Err(UmapError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_init_matrix_shape_checked() {
        let cfg = UmapConfig {
            init: Initialization::Matrix(Array2::zeros((3, 2))),
            n_neighbors: 2,
            ..UmapConfig::default()
        };
        let umap = Umap::new(cfg).unwrap();
        let data = Array2::<f32>::from_shape_fn((5, 3), |(i, j)| (i * 3 + j) as f32);
        assert!(matches!(
            umap.fit(&data, None),
            Err(UmapError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_transform_rejects_wrong_feature_count() {
        let cfg = UmapConfig {
            n_neighbors: 3,
            init: Initialization::Random,
            ..UmapConfig::default()
        };
        let umap = Umap::new(cfg).unwrap();
        let data = Array2::<f32>::from_shape_fn((12, 4), |(i, j)| ((i * 7 + j * 3) % 5) as f32);
        let model = umap.fit(&data, None).expect("fit");
        let wrong = Array2::<f32>::zeros((2, 3));
        assert!(matches!(
            model.transform(&wrong),
            Err(UmapError::ShapeMismatch { .. })
        ));
    }
}
