pub mod backend;
pub mod config;
pub mod hits;

use tracing::{debug, warn};

use crate::error::{Result, Side, SimilarityError};
use crate::utils::math::matrix::{dense::DenseMatrix, CsrMatrix};

use self::backend::{HostBackend, SimilarityBackend, Weight};
use self::hits::Hits;

/// Cosine similarity between every query row and every target row,
/// computed on the calling thread.
///
/// See [`SimilarityEngine::cosine_similarity`] for the error and zero-norm
/// rules.
pub fn cosine_similarity<N: Weight>(query: &CsrMatrix<N>, target: &CsrMatrix<N>) -> Result<DenseMatrix> {
    SimilarityEngine::new(HostBackend).cosine_similarity(query, target)
}

/// Cosine similarity engine over a pluggable [`SimilarityBackend`].
///
/// The engine owns no state besides its backend: every call validates its
/// inputs, asks the backend for the dot-product matrix and the row norms,
/// and normalizes in place.
#[derive(Debug, Clone, Default)]
pub struct SimilarityEngine<B = HostBackend> {
    backend: B,
}

impl<B: SimilarityBackend> SimilarityEngine<B> {
    pub fn new(backend: B) -> Self {
        SimilarityEngine { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Pairwise cosine similarity, `query.rows()` x `target.rows()`.
    ///
    /// # Errors
    /// - `DimensionMismatch` when the two matrices do not share a feature space
    /// - `EmptyInput` when either matrix has no rows
    /// - whatever the backend reports (e.g. `PoolExhausted`)
    ///
    /// A row with no non-zero weight scores exactly `0.0` against everything.
    /// Scores are clamped into `[-1, 1]`.
    ///
    /// Every row is divided by its largest absolute weight before the backend
    /// sees it. Cosine similarity does not change under row scaling, and the
    /// scaled rows keep the dot products and norms clear of f64 overflow and
    /// underflow for any finite weights.
    pub fn cosine_similarity<N: Weight>(&self, query: &CsrMatrix<N>, target: &CsrMatrix<N>) -> Result<DenseMatrix> {
        validate(query, target)?;
        debug!(
            backend = self.backend.name(),
            query_rows = query.rows(),
            target_rows = target.rows(),
            cols = query.cols(),
            query_nnz = query.nnz(),
            target_nnz = target.nnz(),
            "cosine similarity"
        );

        let query = query.unit_scaled();
        let target = target.unit_scaled();
        let mut scores = self.backend.dot_product(&query, &target)?;
        let query_norms = self.backend.row_norms(&query)?;
        let target_norms = self.backend.row_norms(&target)?;
        normalize(&mut scores, &query_norms, &target_norms);
        Ok(scores)
    }

    /// Best `k` targets for every query row.
    pub fn cosine_similarity_top_k<N: Weight>(
        &self,
        query: &CsrMatrix<N>,
        target: &CsrMatrix<N>,
        k: usize,
    ) -> Result<Vec<Hits>> {
        let scores = self.cosine_similarity(query, target)?;
        Ok((0..scores.rows()).map(|row| scores.top_k(row, k)).collect())
    }
}

fn validate<N: Weight>(query: &CsrMatrix<N>, target: &CsrMatrix<N>) -> Result<()> {
    if query.cols() != target.cols() {
        return Err(SimilarityError::DimensionMismatch {
            query_cols: query.cols(),
            target_cols: target.cols(),
        });
    }
    if query.rows() == 0 {
        return Err(SimilarityError::EmptyInput { side: Side::Query });
    }
    if target.rows() == 0 {
        return Err(SimilarityError::EmptyInput { side: Side::Target });
    }
    Ok(())
}

/// S[i, j] = D[i, j] / (qn[i] * tn[j])
/// 行は最大絶対値で割ってあるので、ノルムが0になるのは非ゼロ要素のない行だけ
/// その行・列は0で上書きする (NaNを出さない)
fn normalize(scores: &mut DenseMatrix, query_norms: &[f64], target_norms: &[f64]) {
    debug_assert_eq!(scores.shape(), (query_norms.len(), target_norms.len()));
    let width = target_norms.len();

    let zero_queries = query_norms.iter().filter(|n| **n == 0.0).count();
    let zero_targets = target_norms.iter().filter(|n| **n == 0.0).count();
    if zero_queries > 0 || zero_targets > 0 {
        warn!(zero_queries, zero_targets, "all-zero rows scored as 0");
    }

    for (row, &qn) in scores.as_mut_slice().chunks_mut(width).zip(query_norms) {
        if qn == 0.0 {
            row.fill(0.0);
            continue;
        }
        for (score, &tn) in row.iter_mut().zip(target_norms) {
            let ratio = *score / (qn * tn);
            // 入力に inf / NaN が混ざった時だけ有限でなくなる
            *score = if tn == 0.0 || !ratio.is_finite() {
                0.0
            } else {
                ratio.clamp(-1.0, 1.0)
            };
        }
    }
}
