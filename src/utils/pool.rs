use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{trace, warn};

use crate::error::{Result, SimilarityError};

/// Byte budget shared by every call that stages buffers through it.
///
/// A call reserves what it needs up front with [`BufferPool::lease`] and gets
/// back a [`BufferLease`] guard. Dropping the guard gives the bytes back, so
/// the reservation ends with the call on the success path and on every error
/// path alike.
pub struct BufferPool {
    limit: usize,
    in_use: AtomicUsize,
}

impl BufferPool {
    pub fn new(limit: usize) -> Arc<Self> {
        Arc::new(BufferPool { limit, in_use: AtomicUsize::new(0) })
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[inline]
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.limit.saturating_sub(self.in_use())
    }

    /// `bytes` を予約する
    /// 上限を超える場合は何も確保せず `PoolExhausted` を返す
    pub fn lease(self: &Arc<Self>, bytes: usize) -> Result<BufferLease> {
        let mut current = self.in_use.load(Ordering::Acquire);
        loop {
            let next = match current.checked_add(bytes) {
                Some(next) if next <= self.limit => next,
                _ => {
                    let available = self.limit.saturating_sub(current);
                    warn!(requested = bytes, available, limit = self.limit, "buffer pool exhausted");
                    return Err(SimilarityError::PoolExhausted { requested: bytes, available });
                }
            };
            match self.in_use.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        trace!(bytes, in_use = current + bytes, "buffer lease acquired");
        Ok(BufferLease { pool: Arc::clone(self), bytes })
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("limit", &self.limit)
            .field("in_use", &self.in_use())
            .finish()
    }
}

/// RAII guard over bytes reserved from a [`BufferPool`].
#[derive(Debug)]
pub struct BufferLease {
    pool: Arc<BufferPool>,
    bytes: usize,
}

impl BufferLease {
    #[inline]
    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl Drop for BufferLease {
    fn drop(&mut self) {
        self.pool.in_use.fetch_sub(self.bytes, Ordering::AcqRel);
        trace!(bytes = self.bytes, "buffer lease released");
    }
}
