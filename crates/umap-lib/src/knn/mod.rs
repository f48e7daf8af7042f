/*!
Approximate k-nearest-neighbor search.

The large-N path of `fit` seeds per-point candidate heaps from the leaves of
a random-projection forest and refines them by nearest-neighbor descent:

1. [`forest::make_forest`] builds `n_trees` binary space-partitioning trees
   and [`forest::leaf_array`] concatenates their leaves.
2. [`descent::nn_descent`] iterates neighbor-of-neighbor updates over the
   leaf-seeded heaps until updates die down.

`transform` reuses the forest through [`descent::initialise_search`] and
walks the stored search graph with [`descent::initialized_nnd_search`].
*/

pub mod descent;
pub mod forest;
pub mod heap;

pub use heap::NeighborHeap;
