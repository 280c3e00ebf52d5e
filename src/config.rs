//! Compile-time tunables and a standalone [`HeapConfig`] builder.
//!
//! The process-wide singleton in [`crate::global`] always uses
//! [`HeapConfig::default`] (exactly one live heap per process), but
//! [`crate::heap::Heap`] can be built directly with a custom config for
//! tests, via named presets in the style of a `production()`/`debug()`
//! config builder.

use static_assertions::const_assert;

use crate::block::Header;
use crate::error::{AllocError, AllocErrorKind, AllocResult};

/// Size of one block header in bytes, including the boundary tag and the
/// two free-list links. Always a multiple of 8.
pub const ALLOC_HEADER_SIZE: usize = core::mem::size_of::<Header>();

/// Number of segregated size classes. Class `i < N_LISTS - 1` holds only
/// blocks whose user payload is exactly `(i + 1) * 8` bytes; class
/// `N_LISTS - 1` holds every larger free block.
pub const N_LISTS: usize = 59;

/// Size, in bytes, of one region requested from the OS in a single
/// heap-extension call. 16 pages on a 4 KiB-page platform.
pub const ARENA_SIZE: usize = 16 * 4096;

/// Upper bound on the number of OS chunks the verifier can track.
pub const MAX_OS_CHUNKS: usize = 1024;

const_assert!(ALLOC_HEADER_SIZE % 8 == 0);
const_assert!(ALLOC_HEADER_SIZE >= core::mem::size_of::<usize>() * 2 + core::mem::size_of::<usize>() * 2);
const_assert!(ARENA_SIZE > 2 * ALLOC_HEADER_SIZE);
const_assert!(N_LISTS >= 2);

/// Configuration for a standalone [`crate::heap::Heap`].
///
/// Mirrors the compile-time tunables above so tests can exercise smaller
/// arenas and fewer size classes without touching the process-wide
/// singleton's constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
    pub(crate) arena_size: usize,
    pub(crate) max_os_chunks: usize,
}

impl HeapConfig {
    /// The configuration used by the process-wide singleton.
    pub const fn default_config() -> Self {
        Self { arena_size: ARENA_SIZE, max_os_chunks: MAX_OS_CHUNKS }
    }

    /// Overrides the arena size. Must leave room for two fenceposts plus at
    /// least one minimal free block.
    pub fn with_arena_size(mut self, arena_size: usize) -> AllocResult<Self> {
        if arena_size <= 2 * ALLOC_HEADER_SIZE {
            return Err(AllocError::with_message(
                AllocErrorKind::InvalidConfig,
                "arena_size must exceed 2 * ALLOC_HEADER_SIZE",
            ));
        }
        if arena_size % 8 != 0 {
            return Err(AllocError::with_message(
                AllocErrorKind::InvalidConfig,
                "arena_size must be a multiple of 8",
            ));
        }
        self.arena_size = arena_size;
        Ok(self)
    }

    /// Overrides the bound on recorded OS chunks.
    pub fn with_max_os_chunks(mut self, max_os_chunks: usize) -> AllocResult<Self> {
        if max_os_chunks == 0 || max_os_chunks > MAX_OS_CHUNKS {
            return Err(AllocError::with_message(
                AllocErrorKind::InvalidConfig,
                "max_os_chunks must be in 1..=MAX_OS_CHUNKS",
            ));
        }
        self.max_os_chunks = max_os_chunks;
        Ok(self)
    }

    /// A configuration with a small arena, useful for exercising chunk
    /// acquisition and fusion without allocating hundreds of kilobytes per
    /// test.
    pub fn small() -> Self {
        Self::default_config()
            .with_arena_size(4096)
            .expect("4096 satisfies the arena_size invariants")
    }
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self::default_config()
    }
}
