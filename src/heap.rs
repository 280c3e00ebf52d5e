//! Top-level allocator state: the free-list sentinel array, OS chunk
//! bookkeeping, and initialization (SPEC_FULL.md §4.1). The single-mutex
//! concurrency discipline lives one layer up, in [`crate::global`]; this
//! type is freely `&mut`-usable on its own for tests.

use core::ptr::NonNull;

use crate::block::Header;
use crate::chunk::{self, FormattedChunk, OsChunks};
use crate::config::{HeapConfig, MAX_OS_CHUNKS, N_LISTS};
use crate::core_alloc;
use crate::core_dealloc;
use crate::error::AllocResult;
use crate::freelist;
use crate::os::ChunkSource;
use crate::verify;

/// Process-wide (or, in tests, standalone) allocator state.
///
/// Must live behind a [`Box`]: [`Heap::new`] writes self-referential
/// sentinel pointers into `free_lists` once the struct has its final
/// heap address, which holds for the rest of its lifetime only because
/// moving a `Box` handle never moves the allocation it points at.
pub struct Heap<S: ChunkSource> {
    free_lists: [Header; N_LISTS],
    pub(crate) last_fencepost: *mut Header,
    base: *mut Header,
    os_chunks: OsChunks<MAX_OS_CHUNKS>,
    pub(crate) config: HeapConfig,
    chunk_source: S,
}

// SAFETY: every raw pointer reachable from a `Heap` points into memory
// this `Heap` exclusively owns via its `ChunkSource`. `crate::global`
// serializes all access behind a single `Mutex`; standalone (test) use
// requires an exclusive `&mut Heap` already, which rules out concurrent
// access by construction.
unsafe impl<S: ChunkSource + Send> Send for Heap<S> {}

impl<S: ChunkSource> Heap<S> {
    /// Builds a fresh heap: requests the first OS chunk and installs it in
    /// the last free list (SPEC_FULL.md §4.1).
    pub fn new(config: HeapConfig, chunk_source: S) -> AllocResult<Box<Self>> {
        let mut heap = Box::new(Heap {
            free_lists: core::array::from_fn(|_| Header::zeroed()),
            last_fencepost: core::ptr::null_mut(),
            base: core::ptr::null_mut(),
            os_chunks: OsChunks::new(),
            config,
            chunk_source,
        });

        for class in 0..N_LISTS {
            let sentinel = heap.sentinel(class);
            // SAFETY: `sentinel` points inside the just-boxed heap, whose
            // address is now stable for the rest of its lifetime.
            unsafe { freelist::init_sentinel(sentinel) };
        }

        let formatted = heap.acquire_chunk()?;
        heap.os_chunks.record(formatted.left_fencepost, heap.config.max_os_chunks);
        heap.base = formatted.left_fencepost;
        heap.last_fencepost = formatted.right_fencepost;

        let sentinel = heap.sentinel(freelist::LAST_CLASS);
        // SAFETY: `formatted.inner` is a fresh, unlinked UNALLOCATED block.
        unsafe { freelist::insert_head(sentinel, formatted.inner) };

        Ok(heap)
    }

    /// Requests and formats one fresh OS chunk. Does not link it into any
    /// list or update `last_fencepost`/`os_chunks`; callers handle that
    /// bookkeeping differently depending on whether the chunk abuts the
    /// previous one (see [`crate::core_alloc`]).
    pub(crate) fn acquire_chunk(&self) -> AllocResult<FormattedChunk> {
        let mem = self.chunk_source.extend(self.config.arena_size)?;
        #[cfg(feature = "logging")]
        tracing::debug!(size = self.config.arena_size, "acquired OS chunk");
        // SAFETY: `mem` is exactly `arena_size` fresh bytes from `ChunkSource`.
        Ok(unsafe { chunk::format_chunk(mem, self.config.arena_size) })
    }

    /// Address of size class `class`'s sentinel. Valid for the lifetime of
    /// `self` (the sentinel array never moves once boxed).
    pub(crate) fn sentinel(&self, class: usize) -> *mut Header {
        (&self.free_lists[class] as *const Header) as *mut Header
    }

    pub(crate) fn record_chunk(&mut self, left_fencepost: *mut Header) {
        if !self.os_chunks.record(left_fencepost, self.config.max_os_chunks) {
            #[cfg(feature = "logging")]
            tracing::warn!(
                limit = self.config.max_os_chunks,
                "OS chunk recording capacity reached; verify() will not walk this chunk"
            );
        }
    }

    pub(crate) fn os_chunks_iter(&self) -> impl Iterator<Item = &*mut Header> {
        self.os_chunks.iter()
    }

    /// Services one allocation request (SPEC_FULL.md §4.3).
    pub fn allocate(&mut self, requested: usize) -> Option<NonNull<u8>> {
        core_alloc::allocate(self, requested)
    }

    /// Services one deallocation (SPEC_FULL.md §4.4). Aborts the process
    /// on double-free.
    ///
    /// # Safety
    /// `ptr` must be `None` or a pointer previously returned by
    /// `allocate` on this same heap, not yet freed.
    pub unsafe fn deallocate(&mut self, ptr: Option<NonNull<u8>>) {
        unsafe { core_dealloc::deallocate(self, ptr) }
    }

    /// Checks every invariant in SPEC_FULL.md §3/§8 against the heap's
    /// current state.
    pub fn verify(&self) -> bool {
        verify::verify(self)
    }

    /// Address of the first chunk's left fencepost, kept for debug
    /// printing only (SPEC_FULL.md §3 "process-wide state").
    pub(crate) fn base(&self) -> *mut Header {
        self.base
    }
}
