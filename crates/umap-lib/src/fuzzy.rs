/*!
Fuzzy simplicial set construction.

This module turns a kNN graph into the symmetric weighted graph the layout
optimizer consumes:

- Per-point bandwidth calibration (`smooth_knn_dist`): binary-search the
  scale `sigma_i` so the exponential kernel over a point's neighbors sums to
  `log2(k) * bandwidth`, with the local-connectivity offset `rho_i` taken
  from the nearest strictly-positive neighbor distances.
- Membership strengths: one directed edge per (point, neighbor) pair.
- Fuzzy set algebra under the product t-norm: union `A + B - A∘B`,
  intersection `A∘B`, the symmetrization mix, local-connectivity reset, and
  the categorical / general target intersections used by supervised fits.

Row loops are independent and run under `rayon`.
*/

use ndarray::ArrayView2;

use crate::error::UmapError;
use crate::sparse::CooMatrix;

/// Convergence tolerance of the bandwidth binary search.
pub const SMOOTH_K_TOLERANCE: f32 = 1e-5;

/// Floor on `sigma` as a fraction of the mean neighbor distance.
pub const MIN_K_DIST_SCALE: f32 = 1e-3;

/// Iteration cap of the bandwidth binary search.
const N_SMOOTH_ITER: usize = 64;

/// Per-point bandwidth `sigma` and connectivity offset `rho`.
///
/// # Arguments
///
/// * `distances` - sorted neighbor distances, shape `(n, k_actual)`; column 0
///   is conventionally the self distance and is excluded from the kernel sum
/// * `k` - target neighbor count (fractional values allowed)
/// * `local_connectivity` - how many neighbors are assumed perfectly
///   connected; fractional values interpolate
/// * `bandwidth` - scale applied to the `log2(k)` target
///
/// # Returns
///
/// `(sigmas, rhos)`, each of length `n`. For every row either the kernel sum
/// hit the target within [`SMOOTH_K_TOLERANCE`] or the iteration cap was
/// reached.
pub fn smooth_knn_dist(
    distances: &ArrayView2<f32>,
    k: f32,
    local_connectivity: f32,
    bandwidth: f32,
) -> (Vec<f32>, Vec<f32>) {
    use rayon::prelude::*;

    let n = distances.nrows();
    let target = k.log2() * bandwidth;
    let mean_distance = {
        let mut sum = 0.0_f64;
        let mut count = 0usize;
        for &d in distances.iter() {
            if d.is_finite() {
                sum += d as f64;
                count += 1;
            }
        }
        if count > 0 {
            (sum / count as f64) as f32
        } else {
            0.0
        }
    };

    let per_row: Vec<(f32, f32)> = (0..n)
        .into_par_iter()
        .map(|i| {
            let row = distances.row(i);
            let non_zero: Vec<f32> = row.iter().copied().filter(|&d| d > 0.0 && d.is_finite()).collect();

            // rho: interpolate between the floor(local_connectivity)-th and
            // the next strictly positive distance.
            let mut rho = 0.0_f32;
            if non_zero.len() as f32 >= local_connectivity {
                let index = local_connectivity.floor() as usize;
                let interpolation = local_connectivity - index as f32;
                if index > 0 {
                    rho = non_zero[index - 1];
                    if interpolation > SMOOTH_K_TOLERANCE {
                        rho += interpolation * (non_zero[index] - non_zero[index - 1]);
                    }
                } else if !non_zero.is_empty() {
                    rho = interpolation * non_zero[0];
                }
            } else if !non_zero.is_empty() {
                rho = non_zero.iter().copied().fold(0.0_f32, f32::max);
            }

            // Binary search for sigma: double upward until bounded, then
            // bisect toward the target kernel sum.
            let mut lo = 0.0_f32;
            let mut hi = f32::INFINITY;
            let mut mid = 1.0_f32;
            for _ in 0..N_SMOOTH_ITER {
                let mut psum = 0.0_f32;
                for &d in row.iter().skip(1) {
                    if !d.is_finite() {
                        continue;
                    }
                    let shifted = d - rho;
                    if shifted > 0.0 {
                        psum += (-shifted / mid).exp();
                    } else {
                        psum += 1.0;
                    }
                }
                if (psum - target).abs() < SMOOTH_K_TOLERANCE {
                    break;
                }
                if psum > target {
                    hi = mid;
                    mid = (lo + hi) / 2.0;
                } else {
                    lo = mid;
                    if hi.is_infinite() {
                        mid *= 2.0;
                    } else {
                        mid = (lo + hi) / 2.0;
                    }
                }
            }
            let mut sigma = mid;

            // Keep sigma away from zero relative to the distance scale.
            let row_mean = {
                let finite: Vec<f32> = row.iter().copied().filter(|d| d.is_finite()).collect();
                if finite.is_empty() {
                    0.0
                } else {
                    finite.iter().sum::<f32>() / finite.len() as f32
                }
            };
            let floor = if rho > 0.0 {
                MIN_K_DIST_SCALE * row_mean
            } else {
                MIN_K_DIST_SCALE * mean_distance
            };
            if sigma < floor {
                sigma = floor;
            }
            (sigma, rho)
        })
        .collect();

    let sigmas = per_row.iter().map(|&(s, _)| s).collect();
    let rhos = per_row.iter().map(|&(_, r)| r).collect();
    (sigmas, rhos)
}

/// Directed membership strengths as a canonical COO matrix of `shape`.
///
/// For neighbor `j` of point `i`: skipped if `j == -1`, weight 0 if
/// `j == i`, weight 1 when the distance is within `rho_i`, and
/// `exp(-(d - rho_i) / sigma_i)` beyond it.
pub fn compute_membership_strengths(
    knn_indices: &ArrayView2<i32>,
    knn_dists: &ArrayView2<f32>,
    sigmas: &[f32],
    rhos: &[f32],
    shape: (usize, usize),
) -> Result<CooMatrix, UmapError> {
    use rayon::prelude::*;

    let rows: Vec<Vec<(u32, u32, f32)>> = (0..knn_indices.nrows())
        .into_par_iter()
        .map(|i| {
            let mut out = Vec::with_capacity(knn_indices.ncols());
            for p in 0..knn_indices.ncols() {
                let j = knn_indices[[i, p]];
                if j < 0 {
                    continue;
                }
                let val = if j as usize == i {
                    0.0
                } else if knn_dists[[i, p]] - rhos[i] <= 0.0 {
                    1.0
                } else {
                    (-(knn_dists[[i, p]] - rhos[i]) / sigmas[i]).exp()
                };
                out.push((i as u32, j as u32, val));
            }
            out
        })
        .collect();

    CooMatrix::from_triplets(shape.0, shape.1, rows.into_iter().flatten().collect())
}

/// Symmetrize a directed membership matrix by the fuzzy-set mix
/// `alpha * (A + At - A∘At) + (1 - alpha) * (A∘At)`, then drop explicit
/// zeros.
pub fn fuzzy_set_union(
    membership: &CooMatrix,
    set_op_mix_ratio: f32,
) -> Result<CooMatrix, UmapError> {
    let sum = membership.add_transpose()?;
    let prod = membership.hadamard_transpose()?;
    let union = sum.subtract(&prod)?;
    let mixed = union
        .multiply_scalar(set_op_mix_ratio)
        .add(&prod.multiply_scalar(1.0 - set_op_mix_ratio))?;
    Ok(mixed.eliminate_zeros())
}

/// Restore local connectivity after an intersection:
/// `R + Rt - R∘Rt` for `R = row_normalize(G)` (max-norm rows).
pub fn reset_local_connectivity(graph: &CooMatrix) -> Result<CooMatrix, UmapError> {
    let r = graph.row_normalize();
    let out = r.add_transpose()?.subtract(&r.hadamard_transpose()?)?;
    Ok(out.eliminate_zeros())
}

/// Intersect the fuzzy graph with a categorical target: edges across
/// differing labels are damped by `exp(-far_dist)`, edges touching an
/// unknown label (`-1`) by `exp(-unknown_dist)`, and matching labels are
/// left alone. Local connectivity is reset afterwards.
pub fn categorical_intersection(
    graph: &CooMatrix,
    target: &[f32],
    unknown_dist: f32,
    far_dist: f32,
) -> Result<CooMatrix, UmapError> {
    let triplets: Vec<(u32, u32, f32)> = graph
        .iter()
        .map(|(r, c, v)| {
            let ti = target[r as usize];
            let tj = target[c as usize];
            let v = if ti == -1.0 || tj == -1.0 {
                v * (-unknown_dist).exp()
            } else if ti != tj {
                v * (-far_dist).exp()
            } else {
                v
            };
            (r, c, v)
        })
        .collect();
    let damped = CooMatrix::from_triplets(graph.rows(), graph.cols(), triplets)?;
    reset_local_connectivity(&damped.eliminate_zeros())
}

/// Intersect two fuzzy graphs built over the same points, weighting the
/// contribution of the second by `mix_weight` in `[0, 1]`. A side missing an
/// edge contributes its floor value to the geometric blend; an edge genuinely
/// present on neither side (an explicit stored zero, such as a self edge) is
/// zeroed. Callers reset local connectivity afterwards.
pub fn general_intersection(
    left: &CooMatrix,
    right: &CooMatrix,
    mix_weight: f32,
) -> Result<CooMatrix, UmapError> {
    let combined = left.add(right)?;
    let left_min = (stored_min(left) / 2.0).max(1e-8);
    let right_min = (stored_min(right) / 2.0).max(1e-8);

    let triplets: Vec<(u32, u32, f32)> = combined
        .iter()
        .map(|(r, c, _)| {
            let lv = lookup_or(left, r, c, left_min);
            let rv = lookup_or(right, r, c, right_min);
            let val = if lv > left_min || rv > right_min {
                if mix_weight < 0.5 {
                    lv * rv.powf(mix_weight / (1.0 - mix_weight))
                } else {
                    rv * lv.powf((1.0 - mix_weight) / mix_weight)
                }
            } else {
                0.0
            };
            (r, c, val)
        })
        .collect();
    CooMatrix::from_triplets(combined.rows(), combined.cols(), triplets)
}

fn stored_min(m: &CooMatrix) -> f32 {
    m.iter().map(|(_, _, v)| v).fold(f32::INFINITY, f32::min)
}

fn lookup_or(m: &CooMatrix, r: u32, c: u32, default: f32) -> f32 {
    let v = m.get(r, c);
    // A zero from `get` is ambiguous between "absent" and "stored zero";
    // both read as the floor value, treating the edge as barely present.
    if v == 0.0 {
        default
    } else {
        v
    }
}
