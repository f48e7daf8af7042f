/*!
Sparse matrix primitives for the fuzzy-graph pipeline.

Two storage forms are provided:

- [`CooMatrix`] — coordinate form, canonical (lexicographically sorted,
  duplicate-free) triplet arrays. The workhorse for elementwise arithmetic
  and the symmetric combinators `A + Aᵀ` and `A ∘ Aᵀ`.
- [`CsrMatrix`] — compressed-row form used where row slicing matters: the
  search graph walked at transform time and L1 row normalization.

Matrices are created once and treated as immutable; "mutating" operations
return a fresh matrix. Arithmetic may introduce explicit zero entries;
`eliminate_zeros` is the only place they are pruned.
*/

mod coo;
mod csr;

pub use coo::CooMatrix;
pub use csr::CsrMatrix;
