use std::sync::Arc;

use num::Num;
use rayon::prelude::*;
use tracing::trace;

use crate::error::Result;
use crate::utils::math::matrix::{dense::DenseMatrix, CsrMatrix};
use crate::utils::math::vector::SpRow;
use crate::utils::pool::BufferPool;

/// Numeric weight types a feature matrix can hold.
/// Every weight is widened to `f64` before any arithmetic.
pub trait Weight: Num + Copy + Into<f64> + Send + Sync {}

impl<N> Weight for N where N: Num + Copy + Into<f64> + Send + Sync {}

/// Strategy for the two primitives cosine similarity is built from:
/// the sparse dot-product matrix `Q · Tᵀ` and per-row L2 norms.
///
/// Implementations may differ in where and how they run, but must agree
/// on results up to floating-point summation order. Shape validation is
/// done by the engine before either method is called.
pub trait SimilarityBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn row_norms<N: Weight>(&self, matrix: &CsrMatrix<N>) -> Result<Vec<f64>>;

    /// Raw dot products, `query.rows()` x `target.rows()`.
    fn dot_product<N: Weight>(&self, query: &CsrMatrix<N>, target: &CsrMatrix<N>) -> Result<DenseMatrix>;
}

/// クエリの1行を転置インデックス経由で出力行に足し込む
/// 入力は密にしない
#[inline]
fn scatter_row<N: Weight>(row: SpRow<'_, N>, target_t: &CsrMatrix<N>, out: &mut [f64]) {
    for (feature, &q_val) in row.raw_iter() {
        let q_val: f64 = q_val.into();
        if let Some(postings) = target_t.row(feature) {
            for (target, &t_val) in postings.raw_iter() {
                let t_val: f64 = t_val.into();
                out[target] += q_val * t_val;
            }
        }
    }
}

/// Single-threaded backend running on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostBackend;

impl SimilarityBackend for HostBackend {
    fn name(&self) -> &'static str {
        "host"
    }

    fn row_norms<N: Weight>(&self, matrix: &CsrMatrix<N>) -> Result<Vec<f64>> {
        Ok(matrix.row_norms())
    }

    fn dot_product<N: Weight>(&self, query: &CsrMatrix<N>, target: &CsrMatrix<N>) -> Result<DenseMatrix> {
        let mut out = DenseMatrix::zeros(query.rows(), target.rows());
        if target.rows() == 0 {
            return Ok(out);
        }
        let target_t = target.transpose();
        trace!(postings = target_t.rows(), nnz = target_t.nnz(), "staged target index");
        for (row, out_row) in query.iter_rows().zip(out.as_mut_slice().chunks_mut(target.rows())) {
            scatter_row(row, &target_t, out_row);
        }
        Ok(out)
    }
}

/// Backend spreading output rows over a rayon thread pool.
/// Without a dedicated pool the global rayon pool is used.
#[derive(Debug, Clone, Default)]
pub struct ParallelBackend {
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl ParallelBackend {
    pub fn new() -> Self {
        ParallelBackend { pool: None }
    }

    pub fn with_threads(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("sparse-cosine-{i}"))
            .build()?;
        Ok(ParallelBackend { pool: Some(Arc::new(pool)) })
    }

    pub fn threads(&self) -> usize {
        self.pool
            .as_ref()
            .map_or_else(rayon::current_num_threads, |pool| pool.current_num_threads())
    }

    fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

impl SimilarityBackend for ParallelBackend {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn row_norms<N: Weight>(&self, matrix: &CsrMatrix<N>) -> Result<Vec<f64>> {
        Ok(self.install(|| {
            (0..matrix.rows())
                .into_par_iter()
                .map(|row| matrix.row(row).map_or(0.0, |r| r.norm()))
                .collect()
        }))
    }

    fn dot_product<N: Weight>(&self, query: &CsrMatrix<N>, target: &CsrMatrix<N>) -> Result<DenseMatrix> {
        let mut out = DenseMatrix::zeros(query.rows(), target.rows());
        if target.rows() == 0 {
            return Ok(out);
        }
        let width = target.rows();
        self.install(|| {
            let target_t = target.transpose();
            trace!(
                postings = target_t.rows(),
                nnz = target_t.nnz(),
                threads = rayon::current_num_threads(),
                "staged target index"
            );
            out.as_mut_slice()
                .par_chunks_mut(width)
                .enumerate()
                .for_each(|(row, out_row)| {
                    if let Some(row) = query.row(row) {
                        scatter_row(row, &target_t, out_row);
                    }
                });
        });
        Ok(out)
    }
}

/// Wraps another backend and charges its transient buffers against a
/// shared [`BufferPool`]. The lease lives exactly as long as the call.
#[derive(Debug, Clone)]
pub struct PooledBackend<B> {
    inner: B,
    pool: Arc<BufferPool>,
}

impl<B> PooledBackend<B> {
    pub fn new(inner: B, pool: Arc<BufferPool>) -> Self {
        PooledBackend { inner, pool }
    }

    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }
}

impl<B: SimilarityBackend> SimilarityBackend for PooledBackend<B> {
    fn name(&self) -> &'static str {
        "pooled"
    }

    fn row_norms<N: Weight>(&self, matrix: &CsrMatrix<N>) -> Result<Vec<f64>> {
        let lease = self.pool.lease(matrix.heap_bytes() + matrix.rows() * std::mem::size_of::<f64>())?;
        trace!(bytes = lease.bytes(), in_use = self.pool.in_use(), "leased norm buffers");
        self.inner.row_norms(matrix)
    }

    fn dot_product<N: Weight>(&self, query: &CsrMatrix<N>, target: &CsrMatrix<N>) -> Result<DenseMatrix> {
        // 入力の写し + 転置インデックス (ターゲットと同じ nnz) + 出力バッファ
        let staged = query.heap_bytes() + 2 * target.heap_bytes();
        let output = DenseMatrix::bytes_for(query.rows(), target.rows());
        let lease = self.pool.lease(staged + output)?;
        trace!(
            bytes = lease.bytes(),
            in_use = self.pool.in_use(),
            "leased dot-product buffers"
        );
        self.inner.dot_product(query, target)
    }
}

/// Backend chosen at runtime from a [`SimilarityConfig`](crate::SimilarityConfig).
#[derive(Debug, Clone)]
pub enum AnyBackend {
    Host(HostBackend),
    Parallel(ParallelBackend),
    PooledHost(PooledBackend<HostBackend>),
    PooledParallel(PooledBackend<ParallelBackend>),
}

impl SimilarityBackend for AnyBackend {
    fn name(&self) -> &'static str {
        match self {
            AnyBackend::Host(b) => b.name(),
            AnyBackend::Parallel(b) => b.name(),
            AnyBackend::PooledHost(b) => b.name(),
            AnyBackend::PooledParallel(b) => b.name(),
        }
    }

    fn row_norms<N: Weight>(&self, matrix: &CsrMatrix<N>) -> Result<Vec<f64>> {
        match self {
            AnyBackend::Host(b) => b.row_norms(matrix),
            AnyBackend::Parallel(b) => b.row_norms(matrix),
            AnyBackend::PooledHost(b) => b.row_norms(matrix),
            AnyBackend::PooledParallel(b) => b.row_norms(matrix),
        }
    }

    fn dot_product<N: Weight>(&self, query: &CsrMatrix<N>, target: &CsrMatrix<N>) -> Result<DenseMatrix> {
        match self {
            AnyBackend::Host(b) => b.dot_product(query, target),
            AnyBackend::Parallel(b) => b.dot_product(query, target),
            AnyBackend::PooledHost(b) => b.dot_product(query, target),
            AnyBackend::PooledParallel(b) => b.dot_product(query, target),
        }
    }
}
