//! Compressed-row sparse matrix.

use serde::{Deserialize, Serialize};

use crate::sparse::CooMatrix;

/// Sparse matrix in compressed-row form: `indptr[r]..indptr[r + 1]` locates
/// row `r`'s entries in `indices` / `data`.
///
/// Column order inside a row is not part of the contract; conversions from
/// COO produce sorted rows, and [`CsrMatrix::sort_indices`] restores the
/// sorted order after operations that disturb it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    indptr: Vec<usize>,
    indices: Vec<u32>,
    data: Vec<f32>,
}

impl CsrMatrix {
    /// Build from a canonical COO matrix. Row order is inherited, so rows
    /// come out sorted.
    pub fn from_coo(coo: &CooMatrix) -> Self {
        let rows = coo.rows();
        let mut indptr = vec![0usize; rows + 1];
        for (r, _, _) in coo.iter() {
            indptr[r as usize + 1] += 1;
        }
        for r in 0..rows {
            indptr[r + 1] += indptr[r];
        }
        let mut indices = Vec::with_capacity(coo.nnz());
        let mut data = Vec::with_capacity(coo.nnz());
        for (_, c, v) in coo.iter() {
            indices.push(c);
            data.push(v);
        }
        CsrMatrix {
            rows,
            cols: coo.cols(),
            indptr,
            indices,
            data,
        }
    }

    /// Convert back to canonical COO form.
    pub fn to_coo(&self) -> CooMatrix {
        let mut triplets = Vec::with_capacity(self.nnz());
        for r in 0..self.rows {
            for k in self.indptr[r]..self.indptr[r + 1] {
                triplets.push((r as u32, self.indices[k], self.data[k]));
            }
        }
        CooMatrix::from_triplets(self.rows, self.cols, triplets).expect("indices in range")
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Column indices and values of row `r`.
    pub fn row(&self, r: usize) -> (&[u32], &[f32]) {
        let lo = self.indptr[r];
        let hi = self.indptr[r + 1];
        (&self.indices[lo..hi], &self.data[lo..hi])
    }

    /// Element access by linear scan of the row (O(deg)).
    pub fn get(&self, r: usize, c: u32) -> f32 {
        let (cols, vals) = self.row(r);
        cols.iter()
            .position(|&x| x == c)
            .map(|p| vals[p])
            .unwrap_or(0.0)
    }

    /// Sort column indices inside each row.
    pub fn sort_indices(&mut self) {
        for r in 0..self.rows {
            let lo = self.indptr[r];
            let hi = self.indptr[r + 1];
            let mut paired: Vec<(u32, f32)> = self.indices[lo..hi]
                .iter()
                .copied()
                .zip(self.data[lo..hi].iter().copied())
                .collect();
            paired.sort_unstable_by_key(|&(c, _)| c);
            for (k, (c, v)) in paired.into_iter().enumerate() {
                self.indices[lo + k] = c;
                self.data[lo + k] = v;
            }
        }
    }

    /// Transpose by counting sort over columns, returned in CSR form with
    /// sorted rows.
    pub fn transpose(&self) -> Self {
        let mut indptr = vec![0usize; self.cols + 1];
        for &c in &self.indices {
            indptr[c as usize + 1] += 1;
        }
        for c in 0..self.cols {
            indptr[c + 1] += indptr[c];
        }
        let mut cursor = indptr.clone();
        let mut indices = vec![0u32; self.nnz()];
        let mut data = vec![0.0_f32; self.nnz()];
        for r in 0..self.rows {
            for k in self.indptr[r]..self.indptr[r + 1] {
                let c = self.indices[k] as usize;
                indices[cursor[c]] = r as u32;
                data[cursor[c]] = self.data[k];
                cursor[c] += 1;
            }
        }
        CsrMatrix {
            rows: self.cols,
            cols: self.rows,
            indptr,
            indices,
            data,
        }
    }

    /// Divide each row by the sum of its absolute values (all-zero rows are
    /// left untouched).
    pub fn row_normalize_l1(&self) -> Self {
        let mut out = self.clone();
        for r in 0..out.rows {
            let lo = out.indptr[r];
            let hi = out.indptr[r + 1];
            let sum: f32 = out.data[lo..hi].iter().map(|v| v.abs()).sum();
            if sum > 0.0 {
                for v in &mut out.data[lo..hi] {
                    *v /= sum;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_coo() -> CooMatrix {
        CooMatrix::from_triplets(
            3,
            4,
            vec![(0, 1, 1.0), (0, 3, 2.0), (1, 0, 3.0), (2, 2, 4.0)],
        )
        .expect("valid triplets")
    }

    #[test]
    fn test_coo_csr_round_trip_is_identity_mapping() {
        let coo = sample_coo();
        let back = coo.to_csr().to_coo();
        assert_eq!(back.nnz(), coo.nnz());
        for (r, c, v) in coo.iter() {
            assert_eq!(back.get(r, c), v, "mismatch at ({r}, {c})");
        }
    }

    #[test]
    fn test_row_slicing() {
        let csr = sample_coo().to_csr();
        let (cols, vals) = csr.row(0);
        assert_eq!(cols, &[1, 3]);
        assert_eq!(vals, &[1.0, 2.0]);
        let (cols, _) = csr.row(1);
        assert_eq!(cols, &[0]);
    }

    #[test]
    fn test_get_by_row_scan() {
        let csr = sample_coo().to_csr();
        assert_eq!(csr.get(0, 3), 2.0);
        assert_eq!(csr.get(2, 2), 4.0);
        assert_eq!(csr.get(2, 0), 0.0);
    }

    #[test]
    fn test_transpose_counting_sort() {
        let csr = sample_coo().to_csr();
        let t = csr.transpose();
        assert_eq!(t.rows(), 4);
        assert_eq!(t.cols(), 3);
        assert_eq!(t.get(1, 0), 1.0);
        assert_eq!(t.get(3, 0), 2.0);
        assert_eq!(t.get(0, 1), 3.0);
    }

    #[test]
    fn test_row_normalize_l1() {
        let coo = CooMatrix::from_triplets(2, 2, vec![(0, 0, 1.0), (0, 1, 3.0)]).unwrap();
        let n = coo.to_csr().row_normalize_l1();
        assert!((n.get(0, 0) - 0.25).abs() < 1e-6);
        assert!((n.get(0, 1) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_sort_indices_restores_order() {
        let mut csr = sample_coo().to_csr();
        csr.sort_indices();
        for r in 0..csr.rows() {
            let (cols, _) = csr.row(r);
            assert!(cols.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
