use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SimilarityError};
use crate::similarity::backend::{AnyBackend, HostBackend, ParallelBackend, PooledBackend};
use crate::similarity::SimilarityEngine;
use crate::utils::pool::BufferPool;

/// Where similarity calls run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Calling thread only
    #[default]
    Host,
    /// rayon thread pool
    Parallel,
    /// Host or parallel, with every transient buffer charged against `pool_limit_bytes`
    Pooled,
}

/// Engine configuration, usually read from a JSON file:
///
/// ```json
/// { "backend": "pooled", "threads": 4, "pool_limit_bytes": 268435456 }
/// ```
///
/// Missing fields fall back to the host backend with no limits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimilarityConfig {
    pub backend: BackendKind,
    /// Dedicated worker count for the parallel backend. `None` uses the global rayon pool.
    pub threads: Option<usize>,
    /// Byte budget for the pooled backend.
    pub pool_limit_bytes: Option<usize>,
}

impl SimilarityConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading similarity config from {}", path.display());
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn build(&self) -> Result<SimilarityEngine<AnyBackend>> {
        if self.threads == Some(0) {
            return Err(SimilarityError::Config("threads must be at least 1".to_string()));
        }
        let backend = match self.backend {
            BackendKind::Host => {
                if self.threads.is_some() {
                    warn!("threads is ignored by the host backend");
                }
                AnyBackend::Host(HostBackend)
            }
            BackendKind::Parallel => AnyBackend::Parallel(self.parallel()?),
            BackendKind::Pooled => {
                let limit = self.pool_limit_bytes.ok_or_else(|| {
                    SimilarityError::Config("pooled backend requires pool_limit_bytes".to_string())
                })?;
                let pool = BufferPool::new(limit);
                match self.threads {
                    Some(_) => AnyBackend::PooledParallel(PooledBackend::new(self.parallel()?, pool)),
                    None => AnyBackend::PooledHost(PooledBackend::new(HostBackend, pool)),
                }
            }
        };
        debug!(
            backend = ?self.backend,
            threads = ?self.threads,
            pool_limit_bytes = ?self.pool_limit_bytes,
            "built similarity engine"
        );
        Ok(SimilarityEngine::new(backend))
    }

    fn parallel(&self) -> Result<ParallelBackend> {
        match self.threads {
            Some(threads) => ParallelBackend::with_threads(threads),
            None => Ok(ParallelBackend::new()),
        }
    }
}
