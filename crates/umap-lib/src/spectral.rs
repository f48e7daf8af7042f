/*!
Spectral initialization of the embedding.

Builds the symmetric normalized Laplacian `L = I - D^{-1/2} W D^{-1/2}` of
the fuzzy graph, eigendecomposes it densely with `nalgebra`, and seeds the
embedding from the eigenvectors of the smallest non-trivial eigenvalues,
rescaled to the optimizer's working range with a little seeded jitter so no
two points start exactly coincident.

The dense solve is cubic, so graphs beyond [`SPECTRAL_MAX_POINTS`] are
refused; the caller falls back to random initialization.
*/

use nalgebra::DMatrix;
use nalgebra::linalg::SymmetricEigen;
use ndarray::Array2;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::sparse::CooMatrix;

/// Largest graph the dense eigensolver is asked to handle.
pub const SPECTRAL_MAX_POINTS: usize = 2048;

/// Working range the initial coordinates are scaled into.
const EMBEDDING_SCALE: f32 = 10.0;

/// Jitter amplitude added after scaling.
const NOISE_SCALE: f32 = 1e-4;

/// Spectral coordinates of `graph`'s vertices, shape `(n, dim)`, or `None`
/// when the graph is too large for the dense solve.
///
/// # Arguments
///
/// * `graph` - symmetric fuzzy graph (square COO)
/// * `dim` - number of embedding dimensions
/// * `rng` - source for the jitter
pub fn spectral_layout(graph: &CooMatrix, dim: usize, rng: &mut SmallRng) -> Option<Array2<f32>> {
    let n = graph.rows();
    if n > SPECTRAL_MAX_POINTS || n < dim + 2 {
        return None;
    }

    // Dense adjacency and degree.
    let mut w = DMatrix::<f32>::zeros(n, n);
    let mut degree = vec![0.0_f32; n];
    for (r, c, v) in graph.iter() {
        w[(r as usize, c as usize)] = v;
        degree[r as usize] += v;
    }
    let d_inv_sqrt: Vec<f32> = degree
        .iter()
        .map(|&d| if d > 0.0 { 1.0 / d.sqrt() } else { 0.0 })
        .collect();

    // L = I - D^{-1/2} W D^{-1/2}
    let mut lap = DMatrix::<f32>::zeros(n, n);
    for i in 0..n {
        for j in 0..n {
            lap[(i, j)] = -d_inv_sqrt[i] * w[(i, j)] * d_inv_sqrt[j];
        }
        lap[(i, i)] += 1.0;
    }

    let eigen = SymmetricEigen::new(lap);

    // nalgebra does not order the spectrum; sort ascending and skip the
    // trivial component.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));
    let chosen = &order[1..=dim];

    let mut init = Array2::<f32>::zeros((n, dim));
    for (d, &col) in chosen.iter().enumerate() {
        for i in 0..n {
            init[[i, d]] = eigen.eigenvectors[(i, col)];
        }
    }

    // Scale into the optimizer's working range and break exact ties.
    let max_abs = init.iter().fold(0.0_f32, |m, v| m.max(v.abs()));
    if max_abs > 0.0 {
        let expansion = EMBEDDING_SCALE / max_abs;
        for v in init.iter_mut() {
            *v *= expansion;
        }
    }
    for v in init.iter_mut() {
        *v += rng.gen_range(-NOISE_SCALE..NOISE_SCALE);
    }
    Some(init)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    /// Two 3-cliques joined by one weak bridge: the Fiedler vector flips
    /// sign between the blocks.
    fn bridged_cliques() -> CooMatrix {
        let mut triplets = Vec::new();
        for block in 0..2u32 {
            let base = block * 3;
            for i in 0..3u32 {
                for j in 0..3u32 {
                    if i != j {
                        triplets.push((base + i, base + j, 1.0));
                    }
                }
            }
        }
        triplets.push((2, 3, 0.05));
        triplets.push((3, 2, 0.05));
        CooMatrix::from_triplets(6, 6, triplets).expect("valid triplets")
    }

    #[test]
    fn test_spectral_layout_shape_and_finiteness() {
        let g = bridged_cliques();
        let mut rng = SmallRng::seed_from_u64(42);
        let init = spectral_layout(&g, 2, &mut rng).expect("small graph");
        assert_eq!(init.shape(), &[6, 2]);
        assert!(init.iter().all(|v| v.is_finite()));
        let max_abs = init.iter().fold(0.0_f32, |m, v| m.max(v.abs()));
        assert!(max_abs <= EMBEDDING_SCALE + 1.0);
    }

    #[test]
    fn test_weakly_linked_blocks_separate_in_first_component() {
        let g = bridged_cliques();
        let mut rng = SmallRng::seed_from_u64(3);
        let init = spectral_layout(&g, 2, &mut rng).expect("small graph");
        // Component 0 is the Fiedler vector, near-constant per block with
        // opposite signs, so the two blocks land apart.
        let block_a: Vec<f32> = (0..3).map(|i| init[[i, 0]]).collect();
        let block_b: Vec<f32> = (3..6).map(|i| init[[i, 0]]).collect();
        let mean_a: f32 = block_a.iter().sum::<f32>() / 3.0;
        let mean_b: f32 = block_b.iter().sum::<f32>() / 3.0;
        assert!(
            (mean_a - mean_b).abs() > 1.0,
            "blocks not separated: {mean_a} vs {mean_b}"
        );
    }

    #[test]
    fn test_oversized_graph_is_refused() {
        let n = SPECTRAL_MAX_POINTS + 1;
        let triplets: Vec<(u32, u32, f32)> = (0..n as u32 - 1)
            .flat_map(|i| [(i, i + 1, 1.0), (i + 1, i, 1.0)])
            .collect();
        let g = CooMatrix::from_triplets(n, n, triplets).unwrap();
        let mut rng = SmallRng::seed_from_u64(0);
        assert!(spectral_layout(&g, 2, &mut rng).is_none());
    }
}
