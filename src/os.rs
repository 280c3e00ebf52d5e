//! The raw heap-extension primitive from the host OS.
//!
//! Explicitly out-of-core (SPEC_FULL.md §1): a monotonic "grow the heap by
//! N bytes" call. The production implementation requests anonymous,
//! private pages via `mmap` (Unix) / `VirtualAlloc` (Windows).
//!
//! `mmap` does not guarantee the new region abuts the previous one the
//! way a `brk`-based heap would; [`crate::core_alloc`] treats contiguity
//! as an opportunistic fast path (fusion) rather than an assumption, and
//! falls back to recording a disjoint chunk otherwise (SPEC_FULL.md §6).

use core::ptr::NonNull;

use crate::error::{AllocError, AllocErrorKind, AllocResult};

/// A source of fresh heap memory. Implementors extend the process's
/// address space monotonically; this crate never calls the inverse
/// (no reclamation back to the OS).
pub trait ChunkSource {
    /// Requests `size` fresh bytes from the OS. On success the returned
    /// region is exactly `size` bytes, zero-initialized, and 8-byte (in
    /// practice, page-) aligned.
    fn extend(&self, size: usize) -> AllocResult<NonNull<u8>>;
}

/// Production [`ChunkSource`]: anonymous private pages from the OS.
///
/// Gated on the `std` feature, which is also what pulls in `libc`/`winapi`
/// (see `Cargo.toml`): a standalone [`crate::heap::Heap`] can be built
/// against any other [`ChunkSource`] without it.
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct MmapChunkSource;

#[cfg(all(feature = "std", unix))]
impl ChunkSource for MmapChunkSource {
    fn extend(&self, size: usize) -> AllocResult<NonNull<u8>> {
        // SAFETY: requesting an anonymous, private mapping with no backing
        // file descriptor; `size` is validated non-zero by every caller
        // (chunk sizes are always ARENA_SIZE, a compile-time constant).
        let ptr = unsafe {
            libc::mmap(
                core::ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };

        if ptr == libc::MAP_FAILED {
            #[cfg(feature = "logging")]
            tracing::warn!(size, "mmap failed while extending heap");
            return Err(AllocError::new(AllocErrorKind::OutOfMemory));
        }

        // SAFETY: mmap succeeded, so `ptr` is non-null.
        Ok(unsafe { NonNull::new_unchecked(ptr as *mut u8) })
    }
}

#[cfg(all(feature = "std", windows, not(unix)))]
impl ChunkSource for MmapChunkSource {
    fn extend(&self, size: usize) -> AllocResult<NonNull<u8>> {
        use winapi::um::memoryapi::VirtualAlloc;
        use winapi::um::winnt::{MEM_COMMIT, MEM_RESERVE, PAGE_READWRITE};

        // SAFETY: requesting a fresh, OS-chosen address range.
        let ptr = unsafe {
            VirtualAlloc(
                core::ptr::null_mut(),
                size,
                MEM_COMMIT | MEM_RESERVE,
                PAGE_READWRITE,
            )
        };

        NonNull::new(ptr as *mut u8).ok_or_else(|| {
            #[cfg(feature = "logging")]
            tracing::warn!(size, "VirtualAlloc failed while extending heap");
            AllocError::new(AllocErrorKind::OutOfMemory)
        })
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn mmap_extend_succeeds_and_is_writable() {
        let src = MmapChunkSource;
        let region = src.extend(4096).expect("mmap should succeed for one page");
        unsafe {
            core::ptr::write_bytes(region.as_ptr(), 0xAB, 4096);
            assert_eq!(*region.as_ptr(), 0xAB);
        }
    }
}
