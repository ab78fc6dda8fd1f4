//! Lock-free pool of block-sized signal buffers.
//!
//! Edge buffers are acquired when a graph resolves its DSP order and released
//! when it reorders or is destroyed, so steady-state processing never
//! allocates. The pool degrades gracefully: when empty it falls back to a
//! fresh allocation and counts the miss.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_queue::ArrayQueue;

/// Recycles `Vec<f32>` buffers of one fixed block size.
pub struct BufferPool {
    free: Arc<ArrayQueue<Vec<f32>>>,
    block_size: usize,
    allocations: AtomicUsize,
    reuses: AtomicUsize,
}

impl BufferPool {
    /// A pool of up to `capacity` buffers, each `block_size` samples long.
    pub fn new(block_size: usize, capacity: usize) -> Self {
        BufferPool {
            free: Arc::new(ArrayQueue::new(capacity.max(1))),
            block_size,
            allocations: AtomicUsize::new(0),
            reuses: AtomicUsize::new(0),
        }
    }

    /// Allocate `count` buffers up front so the audio path starts warm.
    pub fn prefill(&self, count: usize) {
        for _ in 0..count {
            if self.free.push(vec![0.0; self.block_size]).is_err() {
                break;
            }
        }
    }

    /// A zeroed buffer of exactly `block_size` samples.
    pub fn acquire(&self) -> Vec<f32> {
        match self.free.pop() {
            Some(mut buffer) => {
                buffer.fill(0.0);
                self.reuses.fetch_add(1, Ordering::Relaxed);
                buffer
            }
            None => {
                self.allocations.fetch_add(1, Ordering::Relaxed);
                vec![0.0; self.block_size]
            }
        }
    }

    /// Return a buffer. Wrong-sized buffers are resized, and if the pool is
    /// full the buffer is simply dropped.
    pub fn release(&self, mut buffer: Vec<f32>) {
        if buffer.len() != self.block_size {
            buffer.resize(self.block_size, 0.0);
        }
        let _ = self.free.push(buffer);
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// `(allocations, reuses)` counters since creation.
    pub fn stats(&self) -> (usize, usize) {
        (
            self.allocations.load(Ordering::Relaxed),
            self.reuses.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_allocates_when_empty() {
        let pool = BufferPool::new(64, 8);
        let buffer = pool.acquire();
        assert_eq!(buffer.len(), 64);
        assert!(buffer.iter().all(|&x| x == 0.0));
        assert_eq!(pool.stats(), (1, 0));
    }

    #[test]
    fn release_then_acquire_reuses() {
        let pool = BufferPool::new(64, 8);
        let mut buffer = pool.acquire();
        buffer.fill(0.5);
        pool.release(buffer);

        let again = pool.acquire();
        assert!(again.iter().all(|&x| x == 0.0), "reused buffer is zeroed");
        assert_eq!(pool.stats(), (1, 1));
    }

    #[test]
    fn prefill_avoids_allocation() {
        let pool = BufferPool::new(128, 4);
        pool.prefill(4);
        for _ in 0..4 {
            let _ = pool.acquire();
        }
        assert_eq!(pool.stats(), (0, 4));
    }

    #[test]
    fn wrong_size_release_is_corrected() {
        let pool = BufferPool::new(64, 2);
        pool.release(vec![1.0; 17]);
        let buffer = pool.acquire();
        assert_eq!(buffer.len(), 64);
    }
}
