/*!
Stochastic-gradient layout optimization.

Negative-sampling SGD over the 1-simplices of the fuzzy graph: each edge
fires on a schedule proportional to its membership strength, pulling its
endpoints together along the gradient of the low-dimensional kernel, and
every firing is followed by a batch of repulsive updates against uniformly
sampled vertices. Per-dimension gradient steps are clipped to `[-4, 4]`.

The loop is serial and deterministic for a fixed seed; embedding rows are
mutated in place.
*/

use ndarray::Array2;
use rand::rngs::SmallRng;
use rand::Rng;

/// Gradient clipping bound.
const CLIP_BOUND: f32 = 4.0;

/// Clamp one gradient component to `[-4, 4]`. Infinite inputs saturate.
#[inline]
pub fn clip(x: f32) -> f32 {
    if x > CLIP_BOUND {
        CLIP_BOUND
    } else if x < -CLIP_BOUND {
        -CLIP_BOUND
    } else {
        x
    }
}

/// Per-edge firing periods from membership weights.
///
/// The strongest edge fires every epoch (`epochs_per_sample = 1`); an edge
/// with weight `w` fires every `max(w) / w` epochs. Zero weights map to `-1`,
/// meaning the edge never fires.
pub fn make_epochs_per_sample(weights: &[f32], n_epochs: usize) -> Vec<f32> {
    let max_weight = weights.iter().copied().fold(0.0_f32, f32::max);
    weights
        .iter()
        .map(|&w| {
            let n_samples = w * n_epochs as f32 / max_weight;
            if n_samples > 0.0 {
                n_epochs as f32 / n_samples
            } else {
                -1.0
            }
        })
        .collect()
}

/// Scalars steering [`optimize_layout`].
#[derive(Clone, Debug)]
pub struct LayoutParams {
    pub a: f32,
    pub b: f32,
    /// Repulsion strength gamma.
    pub gamma: f32,
    /// Initial learning rate; decays linearly to zero over the epochs.
    pub initial_alpha: f32,
    pub negative_sample_rate: f32,
    pub n_epochs: usize,
}

/// Run negative-sampling SGD over the graph's edges.
///
/// # Arguments
///
/// * `head_embedding` - embedding mutated in place; rows indexed by `head`
/// * `tail_embedding` - `None` when edges land in `head_embedding` itself
///   (the fit case: both endpoints move); `Some` freezes a separate matrix
///   the `tail` indices point into (the transform case: only heads move)
/// * `head` / `tail` - edge endpoint indices, one pair per edge
/// * `epochs_per_sample` - per-edge firing period; `-1` disables an edge
/// * `params` - kernel and schedule scalars
/// * `rng` - source for negative samples
pub fn optimize_layout(
    head_embedding: &mut Array2<f32>,
    tail_embedding: Option<&Array2<f32>>,
    head: &[u32],
    tail: &[u32],
    epochs_per_sample: &[f32],
    params: &LayoutParams,
    rng: &mut SmallRng,
) {
    let dim = head_embedding.ncols();
    let move_other = tail_embedding.is_none();
    let n_vertices = tail_embedding.map_or(head_embedding.nrows(), |t| t.nrows());
    let n_edges = epochs_per_sample.len();

    let epochs_per_negative_sample: Vec<f32> = epochs_per_sample
        .iter()
        .map(|&e| e / params.negative_sample_rate)
        .collect();
    let mut epoch_of_next_sample = epochs_per_sample.to_vec();
    let mut epoch_of_next_negative_sample = epochs_per_negative_sample.clone();

    let mut other = vec![0.0_f32; dim];

    for n in 0..params.n_epochs {
        let alpha = params.initial_alpha * (1.0 - n as f32 / params.n_epochs as f32);
        let epoch = n as f32;

        for i in 0..n_edges {
            if epochs_per_sample[i] <= 0.0 || epoch_of_next_sample[i] > epoch {
                continue;
            }
            let j = head[i] as usize;
            let k = tail[i] as usize;

            // Attractive update along edge (j, k).
            for (d, o) in other.iter_mut().enumerate() {
                *o = match tail_embedding {
                    Some(t) => t[[k, d]],
                    None => head_embedding[[k, d]],
                };
            }
            let dist_squared = squared_distance(head_embedding, j, &other);
            let grad_coeff = if dist_squared > 0.0 {
                let powd = dist_squared.powf(params.b);
                -2.0 * params.a * params.b * dist_squared.powf(params.b - 1.0)
                    / (params.a * powd + 1.0)
            } else {
                0.0
            };
            for (d, o) in other.iter().enumerate() {
                let grad_d = clip(grad_coeff * (head_embedding[[j, d]] - o));
                head_embedding[[j, d]] += grad_d * alpha;
                if move_other {
                    head_embedding[[k, d]] -= grad_d * alpha;
                }
            }
            epoch_of_next_sample[i] += epochs_per_sample[i];

            // Repulsive updates against uniformly drawn vertices; only the
            // head end moves.
            let n_neg_samples = ((epoch - epoch_of_next_negative_sample[i])
                / epochs_per_negative_sample[i]) as i64;
            for _ in 0..n_neg_samples.max(0) {
                let k = rng.gen_range(0..n_vertices);
                for (d, o) in other.iter_mut().enumerate() {
                    *o = match tail_embedding {
                        Some(t) => t[[k, d]],
                        None => head_embedding[[k, d]],
                    };
                }
                let dist_squared = squared_distance(head_embedding, j, &other);
                if dist_squared > 0.0 {
                    let powd = dist_squared.powf(params.b);
                    let grad_coeff =
                        2.0 * params.gamma * params.b / ((0.001 + dist_squared) * (params.a * powd + 1.0));
                    for (d, o) in other.iter().enumerate() {
                        let grad_d = clip(grad_coeff * (head_embedding[[j, d]] - o));
                        head_embedding[[j, d]] += grad_d * alpha;
                    }
                } else if j == k {
                    continue;
                } else {
                    // Coincident but distinct points: push hard in every
                    // dimension to break the tie.
                    for d in 0..dim {
                        head_embedding[[j, d]] += CLIP_BOUND * alpha;
                    }
                }
            }
            epoch_of_next_negative_sample[i] +=
                n_neg_samples.max(0) as f32 * epochs_per_negative_sample[i];
        }
    }
}

#[inline]
fn squared_distance(emb: &Array2<f32>, row: usize, other: &[f32]) -> f32 {
    let mut sum = 0.0_f32;
    for (d, o) in other.iter().enumerate() {
        let diff = emb[[row, d]] - o;
        sum += diff * diff;
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    #[test]
    fn test_clip_bounds_and_idempotence() {
        assert_eq!(clip(0.0), 0.0);
        assert_eq!(clip(1.5), 1.5);
        assert_eq!(clip(4.01), 4.0);
        assert_eq!(clip(f32::INFINITY), 4.0);
        assert_eq!(clip(f32::NEG_INFINITY), -4.0);
        for x in [-100.0_f32, -4.0, -0.3, 0.0, 2.7, 4.0, 55.0] {
            assert_eq!(clip(clip(x)), clip(x));
            assert!((-4.0..=4.0).contains(&clip(x)));
        }
    }

    #[test]
    fn test_make_epochs_per_sample_known_vector() {
        let eps = make_epochs_per_sample(&[0.5, 1.0, 4.0, 42.0], 10);
        assert_eq!(eps, vec![84.0, 42.0, 10.5, 1.0]);
    }

    #[test]
    fn test_make_epochs_per_sample_zero_weight_disabled() {
        let eps = make_epochs_per_sample(&[0.0, 2.0], 10);
        assert_eq!(eps[0], -1.0);
        assert_eq!(eps[1], 1.0);
    }

    #[test]
    fn test_attraction_pulls_linked_points_together() {
        let mut emb = array![[0.0_f32, 0.0], [10.0, 0.0]];
        let params = LayoutParams {
            a: 1.577,
            b: 0.8951,
            gamma: 1.0,
            initial_alpha: 1.0,
            negative_sample_rate: 1.0,
            n_epochs: 50,
        };
        let mut rng = SmallRng::seed_from_u64(42);
        optimize_layout(
            &mut emb,
            None,
            &[0, 1],
            &[1, 0],
            &[1.0, 1.0],
            &params,
            &mut rng,
        );
        let dist = ((emb[[0, 0]] - emb[[1, 0]]).powi(2) + (emb[[0, 1]] - emb[[1, 1]]).powi(2)).sqrt();
        assert!(dist < 10.0, "linked points did not approach: {dist}");
        assert!(emb.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_frozen_tail_is_not_written() {
        let mut head = array![[5.0_f32, 5.0]];
        let tail = array![[0.0_f32, 0.0], [1.0, 1.0]];
        let tail_before = tail.clone();
        let params = LayoutParams {
            a: 1.577,
            b: 0.8951,
            gamma: 1.0,
            initial_alpha: 1.0,
            negative_sample_rate: 2.0,
            n_epochs: 30,
        };
        let mut rng = SmallRng::seed_from_u64(7);
        optimize_layout(
            &mut head,
            Some(&tail),
            &[0],
            &[0],
            &[1.0],
            &params,
            &mut rng,
        );
        assert_eq!(tail, tail_before);
        // The lone head point is attracted toward training point 0.
        let before = (5.0_f32 * 5.0 + 5.0 * 5.0).sqrt();
        let after = (head[[0, 0]].powi(2) + head[[0, 1]].powi(2)).sqrt();
        assert!(after < before, "head did not move toward its anchor");
    }

    #[test]
    fn test_disabled_edges_never_fire() {
        let mut emb = array![[0.0_f32, 0.0], [10.0, 0.0]];
        let before = emb.clone();
        let params = LayoutParams {
            a: 1.577,
            b: 0.8951,
            gamma: 1.0,
            initial_alpha: 1.0,
            negative_sample_rate: 1.0,
            n_epochs: 20,
        };
        let mut rng = SmallRng::seed_from_u64(1);
        optimize_layout(
            &mut emb,
            None,
            &[0],
            &[1],
            &[-1.0],
            &params,
            &mut rng,
        );
        assert_eq!(emb, before);
    }
}
