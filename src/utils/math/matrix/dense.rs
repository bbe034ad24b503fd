use std::fmt::{self, Debug};

use serde::Serialize;

use crate::error::{Result, SimilarityError};
use crate::similarity::hits::Hits;

/// Row-major dense `f64` matrix.
/// Holds the output of a similarity call: entry (i, j) compares query row i
/// with target row j.
#[derive(Clone, PartialEq, Serialize)]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    #[inline]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        DenseMatrix { rows, cols, data: vec![0.0; rows * cols] }
    }

    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(SimilarityError::InvalidLayout(format!(
                "dense buffer has {} entries, expected {}x{}",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(DenseMatrix { rows, cols, data })
    }

    /// `rows` x `cols` の f64 バッファのバイト数
    #[inline]
    pub fn bytes_for(rows: usize, cols: usize) -> usize {
        rows * cols * std::mem::size_of::<f64>()
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.data[row * self.cols + col])
    }

    #[inline]
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row >= self.rows {
            return None;
        }
        Some(&self.data[row * self.cols..(row + 1) * self.cols])
    }

    #[inline]
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        // cols == 0 だと chunks が使えない
        (0..self.rows).map(move |row| &self.data[row * self.cols..(row + 1) * self.cols])
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    #[inline]
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Best `k` columns of row `row`, highest score first.
    /// Returns an empty list when the row does not exist.
    pub fn top_k(&self, row: usize, k: usize) -> Hits {
        let Some(scores) = self.row(row) else {
            return Hits::new(Vec::new());
        };
        let mut hits = Hits::new(scores.iter().copied().enumerate().collect());
        hits.sort_by_score();
        hits.list.truncate(k);
        hits
    }
}

impl Debug for DenseMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "DenseMatrix {}x{} [", self.rows, self.cols)?;
            for row in self.iter_rows() {
                writeln!(f, "    {:.6?}", row)?;
            }
            write!(f, "]")
        } else {
            f.debug_list().entries(self.iter_rows()).finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_vec_checks_length() {
        assert!(DenseMatrix::from_vec(2, 2, vec![0.0; 3]).is_err());
        let m = DenseMatrix::from_vec(2, 3, (0..6).map(f64::from).collect()).unwrap();
        assert_eq!(m.get(1, 2), Some(5.0));
        assert_eq!(m.row(1), Some(&[3.0, 4.0, 5.0][..]));
        assert_eq!(m.get(2, 0), None);
    }

    #[test]
    fn top_k_orders_descending_and_truncates() {
        let m = DenseMatrix::from_vec(1, 4, vec![0.2, 0.9, 0.5, 0.9]).unwrap();
        let hits = m.top_k(0, 3);
        let cols: Vec<usize> = hits.list.iter().map(|(c, _)| *c).collect();
        assert_eq!(cols, vec![1, 3, 2]);
        assert!(m.top_k(1, 3).list.is_empty());
    }

    #[test]
    fn zero_width_rows_iterate() {
        let m = DenseMatrix::zeros(3, 0);
        assert_eq!(m.iter_rows().count(), 3);
        assert_eq!(m.row(2), Some(&[][..]));
    }
}
