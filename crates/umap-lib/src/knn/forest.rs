/*!
Random-projection tree forest.

Each tree recursively bisects the data with a hyperplane through the
midpoint of two randomly chosen points (Euclidean splits) or through the
great circle between their directions (angular splits), stopping once a node
holds at most `max(10, n_neighbors)` points. Trees are flattened into
parallel arrays so a search is a branch-free walk over indices.

The forest is used twice: its concatenated leaves seed NN-descent during
`fit`, and `search_flat_tree` seeds per-query candidate heaps during
`transform`.
*/

use ndarray::{Array2, ArrayView2};
use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Margins closer to zero than this are treated as ties and sided randomly.
const SPLIT_EPS: f32 = 1e-8;

/// Hard floor on leaf capacity.
const MIN_LEAF_SIZE: usize = 10;

/// One flattened random-projection tree.
///
/// Internal node `n` stores its hyperplane in `hyperplanes` row `n` and its
/// bias in `offsets[n]`; `children[n]` holds the two child node ids. A leaf
/// stores `-(leaf_id + 1)` in `children[n][0]`, and `leaf_id` selects a row
/// of `indices` (padded with `-1` past the leaf's population).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlatTree {
    hyperplanes: Array2<f32>,
    offsets: Vec<f32>,
    children: Vec<[i32; 2]>,
    indices: Array2<i32>,
    leaf_size: usize,
}

impl FlatTree {
    pub fn n_leaves(&self) -> usize {
        self.indices.nrows()
    }

    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    /// Leaf rows, `-1`-padded, for seeding NN-descent.
    pub fn leaf_indices(&self) -> &Array2<i32> {
        &self.indices
    }
}

/// Recursive form used only while building; flattened before it is returned.
enum TreeNode {
    Leaf {
        indices: Vec<u32>,
    },
    Internal {
        hyperplane: Vec<f32>,
        offset: f32,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Build a forest of `n_trees` independent trees over `data`.
///
/// # Arguments
///
/// * `data` - input matrix (n x dim)
/// * `n_neighbors` - neighborhood size; leaf capacity is `max(10, n_neighbors)`
/// * `n_trees` - number of independent trees
/// * `rng` - seedable source for split point choices and tie breaks
/// * `angular` - use great-circle splits instead of midpoint splits
pub fn make_forest(
    data: &ArrayView2<f32>,
    n_neighbors: usize,
    n_trees: usize,
    rng: &mut SmallRng,
    angular: bool,
) -> Vec<FlatTree> {
    let leaf_size = MIN_LEAF_SIZE.max(n_neighbors);
    (0..n_trees)
        .map(|_| {
            let all: Vec<u32> = (0..data.nrows() as u32).collect();
            let root = build_node(data, all, leaf_size, rng, angular);
            flatten(root, data.ncols(), leaf_size)
        })
        .collect()
}

/// Concatenate the leaves of every tree into one padded 2-D array used to
/// seed NN-descent. Short leaves are padded with `-1`.
pub fn leaf_array(forest: &[FlatTree]) -> Array2<i32> {
    if forest.is_empty() {
        return Array2::from_elem((1, 1), -1);
    }
    let leaf_size = forest[0].leaf_size;
    let total: usize = forest.iter().map(FlatTree::n_leaves).sum();
    let mut out = Array2::from_elem((total, leaf_size), -1);
    let mut row = 0usize;
    for tree in forest {
        for leaf in tree.indices.rows() {
            for (j, &idx) in leaf.iter().enumerate() {
                out[[row, j]] = idx;
            }
            row += 1;
        }
    }
    out
}

/// Walk `tree` by hyperplane signs and return the reached leaf's index row
/// (`-1`-padded). Margin ties are broken randomly from `rng`.
pub fn search_flat_tree<'t>(
    query: &[f32],
    tree: &'t FlatTree,
    rng: &mut SmallRng,
) -> &'t [i32] {
    let mut node = 0usize;
    while tree.children[node][0] >= 0 {
        let row = tree.hyperplanes.row(node);
        let mut margin = tree.offsets[node];
        for (h, x) in row.iter().zip(query.iter()) {
            margin += h * x;
        }
        let side = if margin.abs() < SPLIT_EPS {
            rng.gen_range(0..2usize)
        } else if margin > 0.0 {
            0
        } else {
            1
        };
        node = tree.children[node][side] as usize;
    }
    let leaf = (-tree.children[node][0] - 1) as usize;
    tree.indices.row(leaf).to_slice().expect("row-major leaf row")
}

fn build_node(
    data: &ArrayView2<f32>,
    indices: Vec<u32>,
    leaf_size: usize,
    rng: &mut SmallRng,
    angular: bool,
) -> TreeNode {
    if indices.len() <= leaf_size {
        return TreeNode::Leaf { indices };
    }
    let (left_idx, right_idx, hyperplane, offset) = if angular {
        angular_split(data, &indices, rng)
    } else {
        euclidean_split(data, &indices, rng)
    };
    let left = build_node(data, left_idx, leaf_size, rng, angular);
    let right = build_node(data, right_idx, leaf_size, rng, angular);
    TreeNode::Internal {
        hyperplane,
        offset,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Pick two distinct anchor points from `indices`.
fn pick_anchors(indices: &[u32], rng: &mut SmallRng) -> (usize, usize) {
    let a = rng.gen_range(0..indices.len());
    let mut b = rng.gen_range(0..indices.len());
    if a == b {
        b = (b + 1) % indices.len();
    }
    (a, b)
}

/// Midpoint-perpendicular split: the hyperplane normal is `l - r` and the
/// offset places the plane through the midpoint of the anchors.
fn euclidean_split(
    data: &ArrayView2<f32>,
    indices: &[u32],
    rng: &mut SmallRng,
) -> (Vec<u32>, Vec<u32>, Vec<f32>, f32) {
    let (a, b) = pick_anchors(indices, rng);
    let l = data.row(indices[a] as usize);
    let r = data.row(indices[b] as usize);
    let mut hyperplane = vec![0.0_f32; data.ncols()];
    let mut offset = 0.0_f32;
    for d in 0..data.ncols() {
        hyperplane[d] = l[d] - r[d];
        offset -= hyperplane[d] * (l[d] + r[d]) / 2.0;
    }
    let (left, right) = partition(data, indices, &hyperplane, offset, rng);
    (left, right, hyperplane, offset)
}

/// Great-circle split between the two anchor directions; the offset is zero.
fn angular_split(
    data: &ArrayView2<f32>,
    indices: &[u32],
    rng: &mut SmallRng,
) -> (Vec<u32>, Vec<u32>, Vec<f32>, f32) {
    let (a, b) = pick_anchors(indices, rng);
    let l = data.row(indices[a] as usize);
    let r = data.row(indices[b] as usize);
    let mut ln = l.iter().map(|v| v * v).sum::<f32>().sqrt();
    let mut rn = r.iter().map(|v| v * v).sum::<f32>().sqrt();
    if ln == 0.0 {
        ln = 1.0;
    }
    if rn == 0.0 {
        rn = 1.0;
    }
    let hyperplane: Vec<f32> = (0..data.ncols()).map(|d| l[d] / ln - r[d] / rn).collect();
    let (left, right) = partition(data, indices, &hyperplane, 0.0, rng);
    (left, right, hyperplane, 0.0)
}

/// Assign each point to a side by signed distance; ties go to a random side.
/// If numerics push everything to one side, fall back to an alternating
/// assignment so recursion always terminates.
fn partition(
    data: &ArrayView2<f32>,
    indices: &[u32],
    hyperplane: &[f32],
    offset: f32,
    rng: &mut SmallRng,
) -> (Vec<u32>, Vec<u32>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    for &idx in indices {
        let point = data.row(idx as usize);
        let mut margin = offset;
        for (h, x) in hyperplane.iter().zip(point.iter()) {
            margin += h * x;
        }
        if margin.abs() < SPLIT_EPS {
            if rng.gen_range(0..2) == 0 {
                left.push(idx);
            } else {
                right.push(idx);
            }
        } else if margin > 0.0 {
            left.push(idx);
        } else {
            right.push(idx);
        }
    }
    if left.is_empty() || right.is_empty() {
        left.clear();
        right.clear();
        for (i, &idx) in indices.iter().enumerate() {
            if i % 2 == 0 {
                left.push(idx);
            } else {
                right.push(idx);
            }
        }
    }
    (left, right)
}

/// Flatten the recursive tree into parallel arrays, pre-order. Leaves are
/// numbered in visit order and pointed to through negative child ids.
fn flatten(root: TreeNode, dim: usize, leaf_size: usize) -> FlatTree {
    let (n_nodes, n_leaves) = count(&root);
    let mut tree = FlatTree {
        hyperplanes: Array2::zeros((n_nodes, dim)),
        offsets: vec![0.0; n_nodes],
        children: vec![[-1, -1]; n_nodes],
        indices: Array2::from_elem((n_leaves, leaf_size), -1),
        leaf_size,
    };
    let mut next_node = 0usize;
    let mut next_leaf = 0usize;
    flatten_into(root, &mut tree, &mut next_node, &mut next_leaf);
    tree
}

fn count(node: &TreeNode) -> (usize, usize) {
    match node {
        TreeNode::Leaf { .. } => (1, 1),
        TreeNode::Internal { left, right, .. } => {
            let (ln, ll) = count(left);
            let (rn, rl) = count(right);
            (1 + ln + rn, ll + rl)
        }
    }
}

fn flatten_into(
    node: TreeNode,
    tree: &mut FlatTree,
    next_node: &mut usize,
    next_leaf: &mut usize,
) -> usize {
    let id = *next_node;
    *next_node += 1;
    match node {
        TreeNode::Leaf { indices } => {
            let leaf = *next_leaf;
            *next_leaf += 1;
            tree.children[id][0] = -(leaf as i32) - 1;
            for (j, idx) in indices.into_iter().enumerate() {
                tree.indices[[leaf, j]] = idx as i32;
            }
        }
        TreeNode::Internal {
            hyperplane,
            offset,
            left,
            right,
        } => {
            for (d, h) in hyperplane.into_iter().enumerate() {
                tree.hyperplanes[[id, d]] = h;
            }
            tree.offsets[id] = offset;
            let left_id = flatten_into(*left, tree, next_node, next_leaf);
            let right_id = flatten_into(*right, tree, next_node, next_leaf);
            tree.children[id] = [left_id as i32, right_id as i32];
        }
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use rand::SeedableRng;

    fn grid_data(n: usize, dim: usize, seed: u64) -> Array2<f32> {
        let mut rng = SmallRng::seed_from_u64(seed);
        Array2::from_shape_fn((n, dim), |_| rng.gen_range(-1.0_f32..1.0))
    }

    #[test]
    fn test_forest_leaves_partition_all_points() {
        let data = grid_data(100, 5, 42);
        let mut rng = SmallRng::seed_from_u64(42);
        let forest = make_forest(&data.view(), 8, 4, &mut rng, false);
        assert_eq!(forest.len(), 4);
        for tree in &forest {
            let mut seen = vec![false; 100];
            for leaf in tree.leaf_indices().rows() {
                for &idx in leaf.iter().filter(|&&i| i >= 0) {
                    assert!(!seen[idx as usize], "point {idx} appears in two leaves");
                    seen[idx as usize] = true;
                }
            }
            assert!(seen.iter().all(|&s| s), "a point is missing from the leaves");
        }
    }

    #[test]
    fn test_leaf_capacity_respected() {
        let data = grid_data(200, 3, 7);
        let mut rng = SmallRng::seed_from_u64(7);
        let forest = make_forest(&data.view(), 15, 2, &mut rng, false);
        for tree in &forest {
            assert_eq!(tree.leaf_size(), 15);
            for leaf in tree.leaf_indices().rows() {
                let filled = leaf.iter().filter(|&&i| i >= 0).count();
                assert!(filled <= 15);
                assert!(filled > 0, "empty leaf");
            }
        }
    }

    #[test]
    fn test_search_reaches_own_leaf() {
        // A query that is a data point should land in a leaf containing it
        // (deterministically here: no margin ties in random data).
        let data = grid_data(120, 4, 3);
        let mut rng = SmallRng::seed_from_u64(3);
        let forest = make_forest(&data.view(), 10, 3, &mut rng, false);
        let q: Vec<f32> = data.row(17).to_vec();
        let mut hits = 0;
        for tree in &forest {
            let leaf = search_flat_tree(&q, tree, &mut rng);
            if leaf.contains(&17) {
                hits += 1;
            }
        }
        assert!(hits >= 1, "no tree routed the point to its own leaf");
    }

    #[test]
    fn test_leaf_array_concatenates_forest() {
        let data = grid_data(60, 3, 11);
        let mut rng = SmallRng::seed_from_u64(11);
        let forest = make_forest(&data.view(), 5, 2, &mut rng, true);
        let leaves = leaf_array(&forest);
        let expected_rows: usize = forest.iter().map(FlatTree::n_leaves).sum();
        assert_eq!(leaves.nrows(), expected_rows);
        assert_eq!(leaves.ncols(), forest[0].leaf_size());
    }

    #[test]
    fn test_small_input_yields_single_leaf() {
        let data = grid_data(6, 3, 5);
        let mut rng = SmallRng::seed_from_u64(5);
        let forest = make_forest(&data.view(), 4, 1, &mut rng, false);
        assert_eq!(forest[0].n_leaves(), 1);
        let leaf = search_flat_tree(&[0.0, 0.0, 0.0], &forest[0], &mut rng);
        assert_eq!(leaf.iter().filter(|&&i| i >= 0).count(), 6);
    }
}
