//! Coordinate-form sparse matrix.

use serde::{Deserialize, Serialize};

use crate::error::UmapError;
use crate::sparse::CsrMatrix;

/// Sparse matrix in coordinate form.
///
/// Invariants, established at construction and preserved by every operation:
/// entries are sorted lexicographically by `(row, col)`, no `(row, col)` pair
/// occurs twice, and all indices are within the declared shape. Explicit zero
/// values are legal; [`CooMatrix::eliminate_zeros`] removes them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CooMatrix {
    rows: usize,
    cols: usize,
    row: Vec<u32>,
    col: Vec<u32>,
    data: Vec<f32>,
}

impl CooMatrix {
    /// An empty matrix of the given shape.
    pub fn new(rows: usize, cols: usize) -> Self {
        CooMatrix {
            rows,
            cols,
            row: Vec::new(),
            col: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Build a canonical COO matrix from unsorted triplets.
    ///
    /// Triplets are sorted lexicographically and duplicate coordinates are
    /// merged by summation.
    ///
    /// # Errors
    ///
    /// Returns a shape mismatch if any index lies outside `rows x cols`.
    pub fn from_triplets(
        rows: usize,
        cols: usize,
        mut triplets: Vec<(u32, u32, f32)>,
    ) -> Result<Self, UmapError> {
        for &(r, c, _) in &triplets {
            if r as usize >= rows || c as usize >= cols {
                return Err(UmapError::ShapeMismatch {
                    context: "COO construction",
                    expected: format!("indices within {rows}x{cols}"),
                    actual: format!("entry at ({r}, {c})"),
                });
            }
        }
        triplets.sort_unstable_by_key(|&(r, c, _)| (r, c));

        let mut row = Vec::with_capacity(triplets.len());
        let mut col = Vec::with_capacity(triplets.len());
        let mut data = Vec::with_capacity(triplets.len());
        for (r, c, v) in triplets {
            if row.last() == Some(&r) && col.last() == Some(&c) {
                *data.last_mut().expect("parallel arrays") += v;
            } else {
                row.push(r);
                col.push(c);
                data.push(v);
            }
        }
        Ok(CooMatrix {
            rows,
            cols,
            row,
            col,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored entries (explicit zeros included).
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Iterate stored entries in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, f32)> + '_ {
        self.row
            .iter()
            .zip(self.col.iter())
            .zip(self.data.iter())
            .map(|((&r, &c), &v)| (r, c, v))
    }

    /// Element access by binary search on the sorted entry order.
    pub fn get(&self, r: u32, c: u32) -> f32 {
        match self.find(r, c) {
            Some(pos) => self.data[pos],
            None => 0.0,
        }
    }

    fn find(&self, r: u32, c: u32) -> Option<usize> {
        let mut lo = self.row.partition_point(|&x| x < r);
        let hi = self.row.partition_point(|&x| x <= r);
        lo += self.col[lo..hi].partition_point(|&x| x < c);
        if lo < hi && self.col[lo] == c {
            Some(lo)
        } else {
            None
        }
    }

    /// Largest stored value, or 0 for an empty matrix.
    pub fn max_value(&self) -> f32 {
        self.data.iter().copied().fold(0.0_f32, f32::max)
    }

    /// Transpose, returned in canonical COO form.
    pub fn transpose(&self) -> Self {
        let triplets: Vec<(u32, u32, f32)> = self.iter().map(|(r, c, v)| (c, r, v)).collect();
        CooMatrix::from_triplets(self.cols, self.rows, triplets)
            .expect("transposed indices stay in range")
    }

    /// Drop explicit zero entries.
    pub fn eliminate_zeros(&self) -> Self {
        let triplets: Vec<(u32, u32, f32)> = self.iter().filter(|&(_, _, v)| v != 0.0).collect();
        CooMatrix::from_triplets(self.rows, self.cols, triplets).expect("indices unchanged")
    }

    /// Apply a function to every stored value, keeping the sparsity pattern.
    pub fn map_data(&self, f: impl Fn(f32) -> f32) -> Self {
        CooMatrix {
            rows: self.rows,
            cols: self.cols,
            row: self.row.clone(),
            col: self.col.clone(),
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Multiply every stored value by a scalar.
    pub fn multiply_scalar(&self, s: f32) -> Self {
        self.map_data(|v| v * s)
    }

    /// Elementwise sum. Shapes must agree.
    pub fn add(&self, other: &Self) -> Result<Self, UmapError> {
        self.check_same_shape(other, "sparse add")?;
        Ok(self.merge_union(other, |a, b| a + b))
    }

    /// Elementwise difference. Shapes must agree.
    pub fn subtract(&self, other: &Self) -> Result<Self, UmapError> {
        self.check_same_shape(other, "sparse subtract")?;
        Ok(self.merge_union(other, |a, b| a - b))
    }

    /// Elementwise maximum. Shapes must agree.
    pub fn maximum(&self, other: &Self) -> Result<Self, UmapError> {
        self.check_same_shape(other, "sparse maximum")?;
        Ok(self.merge_union(other, f32::max))
    }

    /// Elementwise (Hadamard) product. Only coordinates stored on both sides
    /// can be non-zero, so the result is the intersection of the patterns.
    pub fn hadamard(&self, other: &Self) -> Result<Self, UmapError> {
        self.check_same_shape(other, "sparse hadamard")?;
        Ok(self.merge_intersection(other))
    }

    /// `A + Aᵀ` for square `A`, built by merging the entry list with its
    /// swapped form rather than going through a dense combine.
    pub fn add_transpose(&self) -> Result<Self, UmapError> {
        self.check_square("A + At")?;
        self.add(&self.transpose())
    }

    /// `A ∘ Aᵀ` for square `A`: each stored `(i, j, v)` pairs with the
    /// mirrored entry looked up by binary search, so the output order is
    /// already canonical.
    pub fn hadamard_transpose(&self) -> Result<Self, UmapError> {
        self.check_square("A o At")?;
        let mut row = Vec::new();
        let mut col = Vec::new();
        let mut data = Vec::new();
        for (r, c, v) in self.iter() {
            if let Some(pos) = self.find(c, r) {
                row.push(r);
                col.push(c);
                data.push(v * self.data[pos]);
            }
        }
        Ok(CooMatrix {
            rows: self.rows,
            cols: self.cols,
            row,
            col,
            data,
        })
    }

    /// Divide each row by its maximum absolute element (rows of all zeros are
    /// left untouched).
    pub fn row_normalize(&self) -> Self {
        let mut row_max = vec![0.0_f32; self.rows];
        for (r, _, v) in self.iter() {
            let m = &mut row_max[r as usize];
            *m = m.max(v.abs());
        }
        let mut out = self.clone();
        for i in 0..out.data.len() {
            let m = row_max[out.row[i] as usize];
            if m > 0.0 {
                out.data[i] /= m;
            }
        }
        out
    }

    /// Convert to compressed-row form.
    pub fn to_csr(&self) -> CsrMatrix {
        CsrMatrix::from_coo(self)
    }

    fn check_same_shape(&self, other: &Self, context: &'static str) -> Result<(), UmapError> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(UmapError::ShapeMismatch {
                context,
                expected: format!("{}x{}", self.rows, self.cols),
                actual: format!("{}x{}", other.rows, other.cols),
            });
        }
        Ok(())
    }

    fn check_square(&self, context: &'static str) -> Result<(), UmapError> {
        if self.rows != self.cols {
            return Err(UmapError::ShapeMismatch {
                context,
                expected: "square matrix".to_string(),
                actual: format!("{}x{}", self.rows, self.cols),
            });
        }
        Ok(())
    }

    /// Merge walk over two canonical entry lists, applying `f` with 0 for the
    /// absent side. Output stays canonical by construction.
    fn merge_union(&self, other: &Self, f: impl Fn(f32, f32) -> f32) -> Self {
        let mut row = Vec::with_capacity(self.nnz() + other.nnz());
        let mut col = Vec::with_capacity(self.nnz() + other.nnz());
        let mut data = Vec::with_capacity(self.nnz() + other.nnz());
        let (mut i, mut j) = (0usize, 0usize);
        while i < self.nnz() || j < other.nnz() {
            let ka = if i < self.nnz() {
                Some((self.row[i], self.col[i]))
            } else {
                None
            };
            let kb = if j < other.nnz() {
                Some((other.row[j], other.col[j]))
            } else {
                None
            };
            let (r, c, v) = match (ka, kb) {
                (Some(a), Some(b)) if a == b => {
                    let v = f(self.data[i], other.data[j]);
                    i += 1;
                    j += 1;
                    (a.0, a.1, v)
                }
                (Some(a), Some(b)) if a < b => {
                    let v = f(self.data[i], 0.0);
                    i += 1;
                    (a.0, a.1, v)
                }
                (Some(_), Some(b)) => {
                    let v = f(0.0, other.data[j]);
                    j += 1;
                    (b.0, b.1, v)
                }
                (Some(a), None) => {
                    let v = f(self.data[i], 0.0);
                    i += 1;
                    (a.0, a.1, v)
                }
                (None, Some(b)) => {
                    let v = f(0.0, other.data[j]);
                    j += 1;
                    (b.0, b.1, v)
                }
                (None, None) => unreachable!(),
            };
            row.push(r);
            col.push(c);
            data.push(v);
        }
        CooMatrix {
            rows: self.rows,
            cols: self.cols,
            row,
            col,
            data,
        }
    }

    fn merge_intersection(&self, other: &Self) -> Self {
        let mut row = Vec::new();
        let mut col = Vec::new();
        let mut data = Vec::new();
        let (mut i, mut j) = (0usize, 0usize);
        while i < self.nnz() && j < other.nnz() {
            let ka = (self.row[i], self.col[i]);
            let kb = (other.row[j], other.col[j]);
            if ka == kb {
                row.push(ka.0);
                col.push(ka.1);
                data.push(self.data[i] * other.data[j]);
                i += 1;
                j += 1;
            } else if ka < kb {
                i += 1;
            } else {
                j += 1;
            }
        }
        CooMatrix {
            rows: self.rows,
            cols: self.cols,
            row,
            col,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CooMatrix {
        CooMatrix::from_triplets(
            3,
            3,
            vec![(2, 1, 4.0), (0, 0, 1.0), (0, 2, 2.0), (1, 1, 3.0)],
        )
        .expect("valid triplets")
    }

    #[test]
    fn test_canonical_order_after_construction() {
        let m = sample();
        let keys: Vec<(u32, u32)> = m.iter().map(|(r, c, _)| (r, c)).collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(keys, sorted, "entries must be strictly increasing");
        for (r, c, _) in m.iter() {
            assert!((r as usize) < m.rows() && (c as usize) < m.cols());
        }
    }

    #[test]
    fn test_duplicates_are_summed() {
        let m = CooMatrix::from_triplets(2, 2, vec![(0, 1, 1.0), (0, 1, 2.5)]).unwrap();
        assert_eq!(m.nnz(), 1);
        assert!((m.get(0, 1) - 3.5).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        assert!(CooMatrix::from_triplets(2, 2, vec![(2, 0, 1.0)]).is_err());
    }

    #[test]
    fn test_get_hits_and_misses() {
        let m = sample();
        assert_eq!(m.get(0, 0), 1.0);
        assert_eq!(m.get(2, 1), 4.0);
        assert_eq!(m.get(1, 0), 0.0);
        assert_eq!(m.get(2, 2), 0.0);
    }

    #[test]
    fn test_transpose_round_trip() {
        let m = sample();
        let tt = m.transpose().transpose();
        assert_eq!(tt.nnz(), m.nnz());
        for (r, c, v) in m.iter() {
            assert_eq!(tt.get(r, c), v);
        }
    }

    #[test]
    fn test_eliminate_zeros_prunes_only_zeros() {
        let m = CooMatrix::from_triplets(2, 2, vec![(0, 0, 0.0), (1, 1, 2.0)]).unwrap();
        let e = m.eliminate_zeros();
        assert_eq!(e.nnz(), 1);
        assert_eq!(e.get(1, 1), 2.0);
    }

    #[test]
    fn test_add_and_subtract_keep_union_pattern() {
        let a = CooMatrix::from_triplets(2, 2, vec![(0, 0, 1.0), (1, 1, 2.0)]).unwrap();
        let b = CooMatrix::from_triplets(2, 2, vec![(0, 0, 3.0), (0, 1, 5.0)]).unwrap();
        let s = a.add(&b).unwrap();
        assert_eq!(s.get(0, 0), 4.0);
        assert_eq!(s.get(0, 1), 5.0);
        assert_eq!(s.get(1, 1), 2.0);
        let d = a.subtract(&b).unwrap();
        assert_eq!(d.get(0, 0), -2.0);
        assert_eq!(d.get(0, 1), -5.0);
    }

    #[test]
    fn test_hadamard_is_intersection() {
        let a = CooMatrix::from_triplets(2, 2, vec![(0, 0, 2.0), (1, 1, 2.0)]).unwrap();
        let b = CooMatrix::from_triplets(2, 2, vec![(0, 0, 3.0), (0, 1, 5.0)]).unwrap();
        let h = a.hadamard(&b).unwrap();
        assert_eq!(h.nnz(), 1);
        assert_eq!(h.get(0, 0), 6.0);
    }

    #[test]
    fn test_symmetric_combinator_sparsity_bounds() {
        let a = CooMatrix::from_triplets(
            3,
            3,
            vec![(0, 1, 1.0), (1, 0, 0.5), (1, 2, 2.0), (2, 2, 1.0)],
        )
        .unwrap();
        let prod = a.hadamard_transpose().unwrap();
        let sum = a.add_transpose().unwrap();
        assert!(prod.nnz() <= a.nnz());
        assert!(sum.nnz() <= 2 * a.nnz());
        // A o At keeps only mutually linked pairs plus the symmetric diagonal.
        assert!((prod.get(0, 1) - 0.5).abs() < 1e-6);
        assert!((prod.get(1, 0) - 0.5).abs() < 1e-6);
        assert_eq!(prod.get(1, 2), 0.0);
        assert!((sum.get(1, 2) - 2.0).abs() < 1e-6);
        assert!((sum.get(2, 1) - 2.0).abs() < 1e-6);
        assert!((sum.get(2, 2) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_combinators_reject_non_square() {
        let a = CooMatrix::from_triplets(2, 3, vec![(0, 2, 1.0)]).unwrap();
        assert!(a.add_transpose().is_err());
        assert!(a.hadamard_transpose().is_err());
    }

    #[test]
    fn test_row_normalize_divides_by_row_max() {
        let m = CooMatrix::from_triplets(2, 3, vec![(0, 0, 2.0), (0, 2, 4.0), (1, 1, 0.5)]).unwrap();
        let n = m.row_normalize();
        assert!((n.get(0, 0) - 0.5).abs() < 1e-6);
        assert!((n.get(0, 2) - 1.0).abs() < 1e-6);
        assert!((n.get(1, 1) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_maximum_elementwise() {
        let a = CooMatrix::from_triplets(2, 2, vec![(0, 0, 1.0), (1, 0, 4.0)]).unwrap();
        let b = CooMatrix::from_triplets(2, 2, vec![(0, 0, 3.0), (1, 1, 2.0)]).unwrap();
        let m = a.maximum(&b).unwrap();
        assert_eq!(m.get(0, 0), 3.0);
        assert_eq!(m.get(1, 0), 4.0);
        assert_eq!(m.get(1, 1), 2.0);
    }
}
