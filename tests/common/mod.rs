//! Test-only [`ChunkSource`] that hands out chunks from one large,
//! contiguous, leaked buffer instead of real `mmap` calls. Deterministic
//! contiguity lets the chunk-fusion tests force two OS chunks to abut,
//! which a real `mmap`-backed source cannot guarantee.

use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use segalloc::error::{AllocError, AllocErrorKind, AllocResult};
use segalloc::ChunkSource;

pub struct ContiguousSource {
    base: *mut u8,
    len: usize,
    offset: AtomicUsize,
}

// SAFETY: `base` points at a `Box::leak`-ed buffer this `ContiguousSource`
// exclusively owns for the process lifetime; `offset` serializes the only
// mutation (advancing the cursor).
unsafe impl Send for ContiguousSource {}
unsafe impl Sync for ContiguousSource {}

impl ContiguousSource {
    /// Leaks a zeroed buffer of `total` bytes to back every chunk this
    /// source will ever hand out.
    pub fn new(total: usize) -> Self {
        let buf = vec![0u8; total].into_boxed_slice();
        let base = Box::leak(buf).as_mut_ptr();
        Self { base, len: total, offset: AtomicUsize::new(0) }
    }
}

impl ChunkSource for ContiguousSource {
    fn extend(&self, size: usize) -> AllocResult<NonNull<u8>> {
        let start = self.offset.fetch_add(size, Ordering::SeqCst);
        if start + size > self.len {
            return Err(AllocError::new(AllocErrorKind::OutOfMemory));
        }
        // SAFETY: `start + size <= self.len`, so this stays in bounds of
        // the leaked buffer.
        let ptr = unsafe { self.base.add(start) };
        Ok(NonNull::new(ptr).expect("offset within a non-null leaked buffer is never null"))
    }
}
