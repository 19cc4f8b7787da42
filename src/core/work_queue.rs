//! Shared cursor over subject ordinals
//!
//! Workers claim consecutive ranges of ordinals; each ordinal is handed
//! out exactly once.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug)]
pub struct WorkQueue {
    next: AtomicUsize,
    end: usize,
    chunk_size: usize,
    aborted: AtomicBool,
}

impl WorkQueue {
    pub fn new(end: usize, chunk_size: usize) -> Self {
        Self {
            next: AtomicUsize::new(0),
            end,
            chunk_size: chunk_size.max(1),
            aborted: AtomicBool::new(false),
        }
    }

    /// Next range of ordinals, or `None` once the queue is drained or the
    /// search was aborted.
    pub fn next_range(&self) -> Option<Range<usize>> {
        if self.is_aborted() {
            return None;
        }
        let start = self.next.fetch_add(self.chunk_size, Ordering::Relaxed);
        if start >= self.end {
            return None;
        }
        Some(start..(start + self.chunk_size).min(self.end))
    }

    /// Stop handing out work.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }
}
