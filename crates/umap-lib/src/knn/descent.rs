/*!
Nearest-neighbor descent.

Approximate kNN refinement over per-point candidate heaps: starting from
random samples plus the leaves of a random-projection forest, each round
considers pairs drawn from every point's bounded "new"/"old" candidate lists
and offers each pair to both endpoints' heaps. The round counter of accepted
pushes drives the early exit — once fewer than `delta * k * N` updates land,
the graph has converged.

Also hosts the transform-time search: `initialise_search` seeds query heaps
from the forest and `initialized_nnd_search` expands them greedily along the
stored search graph.
*/

use std::collections::HashSet;

use ndarray::{Array2, ArrayView2};
use rand::rngs::SmallRng;
use rand::Rng;

use crate::knn::forest::{search_flat_tree, FlatTree};
use crate::knn::NeighborHeap;
use crate::metric::Metric;
use crate::sparse::CsrMatrix;

/// Fraction of candidate rows skipped at random each round (sample rate).
const SAMPLE_RATE: f32 = 0.5;

/// Tuning knobs for [`nn_descent`].
#[derive(Clone, Debug)]
pub struct DescentParams {
    /// Bound on the per-point "new"/"old" candidate lists.
    pub max_candidates: usize,
    /// Round limit; the conventional choice is `max(5, log2 N)`.
    pub n_iters: usize,
    /// Early-exit threshold on the fraction of heap updates per round.
    pub delta: f32,
}

impl DescentParams {
    /// Defaults for a dataset of `n` points.
    pub fn for_size(n: usize) -> Self {
        DescentParams {
            max_candidates: 60,
            n_iters: 5.max((n.max(2) as f32).log2().round() as usize),
            delta: 0.001,
        }
    }
}

/// Refine an approximate kNN graph by neighbor-of-neighbor updates.
///
/// # Arguments
///
/// * `data` - input matrix (n x dim)
/// * `n_neighbors` - neighborhood size k
/// * `metric` - distance kernel (must not be `Precomputed`)
/// * `leaf_seeds` - optional `-1`-padded leaf rows from the forest
/// * `params` - candidate bound, round limit, early-exit threshold
/// * `rng` - seedable source for sampling
///
/// # Returns
///
/// `(indices, distances)` of shape `(n, k)`, each row sorted by ascending
/// distance. An index of `-1` marks a slot the descent failed to fill;
/// downstream consumers skip such entries.
pub fn nn_descent(
    data: &ArrayView2<f32>,
    n_neighbors: usize,
    metric: &Metric,
    leaf_seeds: Option<&Array2<i32>>,
    params: &DescentParams,
    rng: &mut SmallRng,
) -> (Array2<i32>, Array2<f32>) {
    let n = data.nrows();
    let mut current = NeighborHeap::new(n, n_neighbors);

    // Random initialization: k distinct samples per point, linked both ways.
    for i in 0..n {
        for j in rejection_sample(n_neighbors.min(n), n, rng) {
            let d = metric.distance(
                data.row(i).to_slice().expect("row-major input"),
                data.row(j as usize).to_slice().expect("row-major input"),
            );
            current.push(i, d, j as i32, true);
            current.push(j as usize, d, i as i32, true);
        }
    }

    // Forest seeding: every pair sharing a leaf is a candidate edge.
    if let Some(leaves) = leaf_seeds {
        for leaf in leaves.rows() {
            for (a, &p) in leaf.iter().enumerate() {
                if p < 0 {
                    break;
                }
                for &q in leaf.iter().skip(a + 1) {
                    if q < 0 {
                        break;
                    }
                    let d = metric.distance(
                        data.row(p as usize).to_slice().expect("row-major input"),
                        data.row(q as usize).to_slice().expect("row-major input"),
                    );
                    current.push(p as usize, d, q, true);
                    current.push(q as usize, d, p, true);
                }
            }
        }
    }

    for _ in 0..params.n_iters {
        let candidates = build_candidates(&mut current, params.max_candidates, rng);
        let mut updates = 0usize;
        for i in 0..n {
            for j in 0..params.max_candidates {
                let (p, _, p_new) = candidates.slot(i, j);
                if p < 0 || rng.gen::<f32>() < SAMPLE_RATE {
                    continue;
                }
                for l in 0..params.max_candidates {
                    let (q, _, q_new) = candidates.slot(i, l);
                    // A pair where neither side is new was already tried.
                    if q < 0 || (!p_new && !q_new) {
                        continue;
                    }
                    let d = metric.distance(
                        data.row(p as usize).to_slice().expect("row-major input"),
                        data.row(q as usize).to_slice().expect("row-major input"),
                    );
                    updates += current.push(p as usize, d, q, true);
                    updates += current.push(q as usize, d, p, true);
                }
            }
        }
        if updates as f32 <= params.delta * n_neighbors as f32 * n as f32 {
            break;
        }
    }

    current.deheap_sort()
}

/// Bounded "new"/"old" candidate lists: each stored neighbor edge is offered
/// to both endpoints' candidate heaps under a random priority, and the
/// originating slot is downgraded to "old" for later rounds.
fn build_candidates(
    current: &mut NeighborHeap,
    max_candidates: usize,
    rng: &mut SmallRng,
) -> NeighborHeap {
    let n = current.n_points();
    let k = current.k();
    let mut candidates = NeighborHeap::new(n, max_candidates);
    for i in 0..n {
        for s in 0..k {
            let (idx, _, is_new) = current.slot(i, s);
            if idx < 0 {
                continue;
            }
            let priority = rng.gen::<f32>();
            candidates.push(i, priority, idx, is_new);
            candidates.push(idx as usize, priority, i as i32, is_new);
            current.set_flag(i, s, false);
        }
    }
    candidates
}

/// Distinct uniform samples from `0..pool`.
fn rejection_sample(k: usize, pool: usize, rng: &mut SmallRng) -> Vec<u32> {
    let mut out: Vec<u32> = Vec::with_capacity(k);
    while out.len() < k {
        let j = rng.gen_range(0..pool) as u32;
        if !out.contains(&j) {
            out.push(j);
        }
    }
    out
}

/// Seed per-query search heaps for `transform`: random training points plus
/// the leaf each tree routes the query to.
pub fn initialise_search(
    forest: &[FlatTree],
    train: &ArrayView2<f32>,
    queries: &ArrayView2<f32>,
    queue_size: usize,
    metric: &Metric,
    rng: &mut SmallRng,
) -> NeighborHeap {
    let n_queries = queries.nrows();
    let mut heap = NeighborHeap::new(n_queries, queue_size);
    for i in 0..n_queries {
        let q = queries.row(i);
        let q_slice = q.to_slice().expect("row-major input");
        for j in rejection_sample(queue_size.min(train.nrows()), train.nrows(), rng) {
            let d = metric.distance(
                q_slice,
                train.row(j as usize).to_slice().expect("row-major input"),
            );
            heap.push(i, d, j as i32, true);
        }
        for tree in forest {
            for &idx in search_flat_tree(q_slice, tree, rng) {
                if idx < 0 {
                    continue;
                }
                let d = metric.distance(
                    q_slice,
                    train.row(idx as usize).to_slice().expect("row-major input"),
                );
                heap.push(i, d, idx, true);
            }
        }
    }
    heap
}

/// Greedy best-first expansion of the seeded heaps along the symmetric
/// search graph: repeatedly take the closest unexpanded candidate and offer
/// its graph neighbors to the heap, until no flagged candidate remains.
pub fn initialized_nnd_search(
    train: &ArrayView2<f32>,
    search_graph: &CsrMatrix,
    mut init: NeighborHeap,
    queries: &ArrayView2<f32>,
    metric: &Metric,
) -> NeighborHeap {
    for i in 0..queries.nrows() {
        let q = queries.row(i);
        let q_slice = q.to_slice().expect("row-major input");
        let mut tried: HashSet<i32> =
            init.row_indices(i).iter().copied().filter(|&x| x >= 0).collect();
        loop {
            let vertex = init.smallest_flagged(i);
            if vertex < 0 {
                break;
            }
            let (cols, _) = search_graph.row(vertex as usize);
            for &c in cols {
                let candidate = c as i32;
                if candidate == vertex || tried.contains(&candidate) {
                    continue;
                }
                let d = metric.distance(
                    q_slice,
                    train
                        .row(candidate as usize)
                        .to_slice()
                        .expect("row-major input"),
                );
                init.push(i, d, candidate, true);
                tried.insert(candidate);
            }
        }
    }
    init
}
