/// This crate computes pairwise cosine similarity between two sparse feature
/// matrices, e.g. the TF-IDF rows of a query corpus and a target corpus.
pub mod error;
pub mod similarity;
pub mod utils;

/// Cosine Similarity
/// Compares every query row with every target row and returns a dense
/// `query.rows()` x `target.rows()` matrix of scores in `[-1, 1]`
/// (`[0, 1]` for non-negative weights such as TF-IDF).
///
/// - Fails with `DimensionMismatch` when the column counts differ
/// - Fails with `EmptyInput` when either side has no rows
/// - A row with no non-zero weight scores exactly `0.0` against everything
///
/// Runs on the calling thread. Use `SimilarityEngine` to pick another backend.
pub use similarity::cosine_similarity;

/// Similarity Engine
/// Validates inputs, delegates the sparse dot products and row norms to its
/// backend, then normalizes. Holds no state between calls.
pub use similarity::SimilarityEngine;

/// Similarity Backends
/// `SimilarityBackend` is the seam for "sparse dot-product matrix + row norms".
/// - `HostBackend`: calling thread only
/// - `ParallelBackend`: rayon, optionally with a dedicated thread pool
/// - `PooledBackend`: wraps another backend and charges its transient buffers
///   against a byte-limited `BufferPool`, released when the call returns
/// - `AnyBackend`: one of the above, chosen at runtime by `SimilarityConfig`
pub use similarity::backend::{
    AnyBackend, HostBackend, ParallelBackend, PooledBackend, SimilarityBackend, Weight,
};

/// Engine configuration
/// Serde-deserializable (JSON file or string), defaults to the host backend.
pub use similarity::config::{BackendKind, SimilarityConfig};

/// Per-row matches, sorted by score.
pub use similarity::hits::Hits;

/// Sparse feature matrix in CSR layout.
/// Generic over the weight type (f32, f64, u8, u16, u32, i32, ...).
///
/// # Serialization
/// Supported, validated on load. CBOR helpers: `to_cbor` / `from_cbor`.
pub use utils::math::matrix::CsrMatrix;

/// Overflow-checked weight arithmetic used while building a `CsrMatrix`.
/// Implemented for the primitive integer and float types.
pub use utils::math::checked::CheckedWeight;

/// Dense row-major `f64` result matrix.
pub use utils::math::matrix::dense::DenseMatrix;

/// Borrowed view of one sparse row.
pub use utils::math::vector::SpRow;

/// Shared byte budget for `PooledBackend`.
pub use utils::pool::{BufferLease, BufferPool};

pub use error::{Result, Side, SimilarityError};
