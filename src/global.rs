//! Process-wide singleton and the public entry points (SPEC_FULL.md §5/§6):
//! a single `parking_lot::Mutex`-guarded [`Heap`], lazily built on first use
//! via `once_cell::sync::OnceCell`, plus a [`core::alloc::GlobalAlloc`]
//! facade so this allocator can be installed with `#[global_allocator]`.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::NonNull;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::config::HeapConfig;
use crate::error::{AllocError, AllocErrorKind};
use crate::heap::Heap;
use crate::os::MmapChunkSource;

static HEAP: OnceCell<Mutex<Box<Heap<MmapChunkSource>>>> = OnceCell::new();

/// Builds the process-wide heap on first use (SPEC_FULL.md §4.1/§5
/// "Initialization ordering"). `OnceCell::get_or_init` itself serializes
/// concurrent first callers; the closure never re-enters (no allocator
/// call inside `Heap::new` recurses into this module).
fn heap() -> &'static Mutex<Box<Heap<MmapChunkSource>>> {
    HEAP.get_or_init(|| {
        Heap::new(HeapConfig::default_config(), MmapChunkSource)
            .expect("initial OS chunk allocation failed; cannot bring up the global heap")
    })
}

/// Returns a block of at least `size` bytes, 8-byte aligned, or null.
/// `size == 0` returns null (SPEC_FULL.md §6).
pub fn allocate(size: usize) -> *mut u8 {
    let mut guard = heap().lock();
    guard.allocate(size).map_or(core::ptr::null_mut(), NonNull::as_ptr)
}

/// Frees a pointer previously returned by [`allocate`]/[`zallocate`]/
/// [`resize`]. Null is a no-op. Double free aborts the process.
///
/// # Safety
/// `ptr` must be null or a live, not-yet-freed pointer from this
/// allocator.
pub unsafe fn free(ptr: *mut u8) {
    let non_null = NonNull::new(ptr);
    let mut guard = heap().lock();
    // SAFETY: forwarded from the caller's contract.
    unsafe { guard.deallocate(non_null) };
}

/// `allocate(n * size)` followed by zeroing, with overflow-checked
/// multiplication (SPEC_FULL.md §6). An overflowing product is the same
/// `SizeOverflow` kind [`crate::core_alloc::block_size_for_request`]
/// reports internally; both convert to null at this public boundary.
pub fn zallocate(n: usize, size: usize) -> *mut u8 {
    let total = match n.checked_mul(size) {
        Some(total) => total,
        None => {
            let err = AllocError::new(AllocErrorKind::SizeOverflow);
            #[cfg(feature = "logging")]
            tracing::warn!(n, size, %err, "zallocate size overflow");
            #[cfg(not(feature = "logging"))]
            let _ = err;
            return core::ptr::null_mut();
        }
    };
    let ptr = allocate(total);
    if !ptr.is_null() {
        // SAFETY: `allocate` just returned a region of at least `total`
        // writable bytes.
        unsafe { core::ptr::write_bytes(ptr, 0, total) };
    }
    ptr
}

/// Resizes the allocation at `ptr` to `size` bytes, preserving the first
/// `min(old_size, size)` bytes (SPEC_FULL.md §6/§9 — the corrected
/// over-read behavior). `ptr == null` behaves as [`allocate`]; `size == 0`
/// behaves as [`free`]; neither wrapper holds the lock while calling the
/// other (SPEC_FULL.md §5 reentrancy discipline).
///
/// # Safety
/// `ptr` must be null or a live, not-yet-freed pointer from this
/// allocator.
pub unsafe fn resize(ptr: *mut u8, size: usize) -> *mut u8 {
    let Some(old) = NonNull::new(ptr) else {
        return allocate(size);
    };
    if size == 0 {
        // SAFETY: forwarded from the caller's contract.
        unsafe { free(ptr) };
        return core::ptr::null_mut();
    }

    let old_size = {
        // SAFETY: `old` is a live payload pointer from this allocator.
        let header = unsafe { crate::block::header_from_payload(old) };
        // SAFETY: `header` is a live, currently ALLOCATED header.
        unsafe { crate::block::block_size(header) } - crate::config::ALLOC_HEADER_SIZE
    };

    let new_ptr = allocate(size);
    if new_ptr.is_null() {
        return core::ptr::null_mut();
    }

    let copy_len = old_size.min(size);
    // SAFETY: `old` is valid for `copy_len` reads (<= its own usable
    // size) and `new_ptr` for `copy_len` writes (`allocate` guaranteed
    // at least `size >= copy_len` bytes); the two regions never overlap
    // since `new_ptr` was freshly allocated.
    unsafe { core::ptr::copy_nonoverlapping(old.as_ptr(), new_ptr, copy_len) };

    // SAFETY: forwarded from the caller's contract.
    unsafe { free(ptr) };
    new_ptr
}

/// Checks every invariant in SPEC_FULL.md §3/§8 against the live
/// process-wide heap.
pub fn verify() -> bool {
    heap().lock().verify()
}

/// [`GlobalAlloc`]-compatible facade over the four entry points above,
/// letting this allocator be installed with `#[global_allocator]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SegListAllocator;

// SAFETY: `allocate`/`free`/`zallocate`/`resize` each acquire the single
// process-wide mutex for their entire duration and never recurse into
// the allocator while holding it (SPEC_FULL.md §5). Alignments beyond 8
// bytes are served best-effort (the 8-byte guarantee still holds) rather
// than rejected.
unsafe impl GlobalAlloc for SegListAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        allocate(layout.size())
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        // SAFETY: forwarded from `GlobalAlloc`'s own contract.
        unsafe { free(ptr) };
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        zallocate(1, layout.size())
    }

    unsafe fn realloc(&self, ptr: *mut u8, _layout: Layout, new_size: usize) -> *mut u8 {
        // SAFETY: forwarded from `GlobalAlloc`'s own contract.
        unsafe { resize(ptr, new_size) }
    }
}
