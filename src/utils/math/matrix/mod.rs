pub mod dense;
pub mod serde;

use std::fmt::{self, Debug};
use std::mem;

use num::Num;

use crate::error::{Result, SimilarityError};
use crate::utils::math::checked::CheckedWeight;
use crate::utils::math::vector::SpRow;

/// CsrMatrixは0要素を疎とした圧縮行格納 (CSR) の疎行列です
///
/// - `indptr` : 行 i の要素は `indptr[i]..indptr[i + 1]` の範囲
/// - `indices`: 列インデックス
/// - `values` : 値
///
/// 各行の中で列インデックスは厳密に昇順で `cols` 未満、
/// 明示的な0は格納しないことを保証します
#[derive(Clone, PartialEq)]
pub struct CsrMatrix<N>
where N: Num
{
    cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    values: Vec<N>,
}

impl<N> CsrMatrix<N>
where N: Num + Copy
{
    /// 行を持たない `cols` 列の行列を作る
    #[inline]
    pub fn new(cols: usize) -> Self {
        CsrMatrix {
            cols,
            indptr: vec![0],
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    #[inline]
    pub fn with_capacity(cols: usize, rows: usize, nnz: usize) -> Self {
        let mut indptr = Vec::with_capacity(rows + 1);
        indptr.push(0);
        CsrMatrix {
            cols,
            indptr,
            indices: Vec::with_capacity(nnz),
            values: Vec::with_capacity(nnz),
        }
    }

    /// Append a row given as `(column, value)` pairs in any order.
    /// Duplicate columns are summed and zeros are dropped.
    /// On error the matrix is left unchanged.
    pub fn push_row<I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (usize, N)>,
        N: CheckedWeight,
    {
        let row = self.rows();
        let mut entries: Vec<(usize, N)> = entries.into_iter().collect();
        if let Some(&(col, _)) = entries.iter().find(|(col, _)| *col >= self.cols) {
            return Err(SimilarityError::ColumnOutOfRange { row, col, cols: self.cols });
        }
        entries.sort_unstable_by_key(|(col, _)| *col);

        let mut merged: Vec<(usize, N)> = Vec::with_capacity(entries.len());
        for (col, value) in entries {
            match merged.last_mut() {
                Some((p_col, p_val)) if *p_col == col => {
                    *p_val = p_val
                        .weight_add(value)
                        .ok_or(SimilarityError::WeightOverflow { row, col })?;
                }
                _ => merged.push((col, value)),
            }
        }
        for entry in merged {
            self.raw_push(entry);
        }
        self.indptr.push(self.indices.len());
        Ok(())
    }

    /// ゼロは捨てる
    #[inline]
    fn raw_push(&mut self, (col, value): (usize, N)) {
        if value != N::zero() {
            self.indices.push(col);
            self.values.push(value);
        }
    }

    /// Build a `rows` x `cols` matrix from `(row, column, value)` triplets.
    pub fn from_triplets(rows: usize, cols: usize, triplets: &[(usize, usize, N)]) -> Result<Self>
    where N: CheckedWeight
    {
        let mut buckets: Vec<Vec<(usize, N)>> = vec![Vec::new(); rows];
        for &(row, col, value) in triplets {
            let bucket = buckets.get_mut(row).ok_or_else(|| {
                SimilarityError::InvalidLayout(format!("triplet row {row} out of range for {rows} rows"))
            })?;
            bucket.push((col, value));
        }
        let mut matrix = CsrMatrix::with_capacity(cols, rows, triplets.len());
        for bucket in buckets {
            matrix.push_row(bucket)?;
        }
        Ok(matrix)
    }

    /// 密な行のスライスから作る
    /// 全ての行は同じ長さである必要がある (空なら0列)
    pub fn from_dense<R>(dense: &[R]) -> Result<Self>
    where
        R: AsRef<[N]>,
        N: CheckedWeight,
    {
        let cols = dense.first().map_or(0, |row| row.as_ref().len());
        let mut matrix = CsrMatrix::with_capacity(cols, dense.len(), 0);
        for (row, values) in dense.iter().enumerate() {
            let values = values.as_ref();
            if values.len() != cols {
                return Err(SimilarityError::RaggedRows { row, expected: cols, found: values.len() });
            }
            matrix.push_row(values.iter().copied().enumerate())?;
        }
        Ok(matrix)
    }

    /// Take ownership of raw CSR parts after checking every layout invariant.
    pub fn try_from_raw(
        rows: usize,
        cols: usize,
        indptr: Vec<usize>,
        indices: Vec<usize>,
        values: Vec<N>,
    ) -> Result<Self> {
        let invalid = |msg: String| Err(SimilarityError::InvalidLayout(msg));
        let Some(expected) = rows.checked_add(1) else {
            return invalid(format!("too many rows: {rows}"));
        };
        if indptr.len() != expected {
            return invalid(format!("indptr has {} entries, expected {expected}", indptr.len()));
        }
        if indptr[0] != 0 {
            return invalid("indptr must start at 0".to_string());
        }
        if indices.len() != values.len() {
            return invalid(format!("{} indices but {} values", indices.len(), values.len()));
        }
        if indptr[rows] != indices.len() {
            return invalid(format!("indptr ends at {}, expected {}", indptr[rows], indices.len()));
        }
        for (row, bounds) in indptr.windows(2).enumerate() {
            let (start, end) = (bounds[0], bounds[1]);
            if start > end || end > indices.len() {
                return invalid(format!("indptr out of order at row {row}"));
            }
            let row_inds = &indices[start..end];
            if let Some(&col) = row_inds.iter().find(|&&col| col >= cols) {
                return Err(SimilarityError::ColumnOutOfRange { row, col, cols });
            }
            if row_inds.windows(2).any(|w| w[0] >= w[1]) {
                return invalid(format!("row {row} indices are not strictly ascending"));
            }
            if values[start..end].iter().any(|v| *v == N::zero()) {
                return invalid(format!("row {row} stores an explicit zero"));
            }
        }
        Ok(CsrMatrix { cols, indptr, indices, values })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.indptr.len() - 1
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols)
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows() == 0
    }

    #[inline]
    pub fn indptr(&self) -> &[usize] {
        &self.indptr
    }

    #[inline]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    #[inline]
    pub fn values(&self) -> &[N] {
        &self.values
    }

    #[inline]
    pub fn row(&self, row: usize) -> Option<SpRow<'_, N>> {
        if row >= self.rows() {
            return None;
        }
        let (start, end) = (self.indptr[row], self.indptr[row + 1]);
        Some(SpRow::new(self.cols, &self.indices[start..end], &self.values[start..end]))
    }

    #[inline]
    pub fn iter_rows(&self) -> impl Iterator<Item = SpRow<'_, N>> + '_ {
        self.indptr.windows(2).map(move |bounds| {
            let (start, end) = (bounds[0], bounds[1]);
            SpRow::new(self.cols, &self.indices[start..end], &self.values[start..end])
        })
    }

    /// 行 `row` の全要素に `factor` を掛ける
    /// 結果が0になった要素は取り除く
    pub fn scale_row(&mut self, row: usize, factor: N) -> Result<()>
    where N: CheckedWeight
    {
        if row >= self.rows() {
            return Err(SimilarityError::InvalidLayout(format!(
                "row {row} out of range for {} rows",
                self.rows()
            )));
        }
        let (start, end) = (self.indptr[row], self.indptr[row + 1]);
        let mut scaled: Vec<(usize, N)> = Vec::with_capacity(end - start);
        for (&col, &value) in self.indices[start..end].iter().zip(&self.values[start..end]) {
            let value = value
                .weight_mul(factor)
                .ok_or(SimilarityError::WeightOverflow { row, col })?;
            if value != N::zero() {
                scaled.push((col, value));
            }
        }
        let removed = (end - start) - scaled.len();
        self.indices.splice(start..end, scaled.iter().map(|(col, _)| *col));
        self.values.splice(start..end, scaled.iter().map(|(_, value)| *value));
        if removed > 0 {
            for ptr in &mut self.indptr[row + 1..] {
                *ptr -= removed;
            }
        }
        Ok(())
    }

    /// 転置行列を作る (CSR の転置 = 列ごとの転置インデックス)
    /// 各行 (元の列) の中で元の行番号は昇順になる
    pub fn transpose(&self) -> CsrMatrix<N> {
        let mut counts = vec![0usize; self.cols + 1];
        for &col in &self.indices {
            counts[col + 1] += 1;
        }
        for col in 0..self.cols {
            counts[col + 1] += counts[col];
        }
        let indptr = counts.clone();
        let mut next = counts;
        let mut indices = vec![0usize; self.nnz()];
        let mut values = vec![N::zero(); self.nnz()];
        for (row, bounds) in self.indptr.windows(2).enumerate() {
            for pos in bounds[0]..bounds[1] {
                let col = self.indices[pos];
                let dst = next[col];
                indices[dst] = row;
                values[dst] = self.values[pos];
                next[col] += 1;
            }
        }
        CsrMatrix { cols: self.rows(), indptr, indices, values }
    }

    /// ヒープ上の確保量 (バイト)
    #[inline]
    pub fn heap_bytes(&self) -> usize {
        (self.indptr.len() + self.indices.len()) * mem::size_of::<usize>()
            + self.values.len() * mem::size_of::<N>()
    }

    /// 各行のL2ノルム
    pub fn row_norms(&self) -> Vec<f64>
    where N: Into<f64>
    {
        self.iter_rows().map(|row| row.norm()).collect()
    }

    /// 各行をその行の最大絶対値で割った `f64` の行列
    /// 空でない行の最大絶対値はちょうど1になり、ノルムは `1..=sqrt(nnz)` に収まる
    /// 割った結果が0に落ちた要素は格納しない
    pub fn unit_scaled(&self) -> CsrMatrix<f64>
    where N: Into<f64>
    {
        let mut out: CsrMatrix<f64> = CsrMatrix::with_capacity(self.cols, self.rows(), self.nnz());
        for row in self.iter_rows() {
            let scale = row.max_abs();
            for (col, &value) in row.raw_iter() {
                let value: f64 = value.into();
                let value = value / scale;
                if value != 0.0 {
                    out.indices.push(col);
                    out.values.push(value);
                }
            }
            out.indptr.push(out.indices.len());
        }
        out
    }
}

impl<N: Num + Copy + Debug> Debug for CsrMatrix<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "CsrMatrix {}x{} (nnz: {}) [", self.rows(), self.cols, self.nnz())?;
            for row in self.iter_rows() {
                writeln!(f, "    {:#?}", row)?;
            }
            write!(f, "]")
        } else {
            f.debug_struct("CsrMatrix")
                .field("cols", &self.cols)
                .field("indptr", &self.indptr)
                .field("indices", &self.indices)
                .field("values", &self.values)
                .finish()
        }
    }
}
