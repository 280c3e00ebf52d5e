//! # segalloc
//!
//! A segregated free-list allocator with boundary-tag coalescing.
//!
//! Blocks are tracked by an array of size-classed free lists; the heap
//! grows by mapping fixed-size chunks from the OS on demand, bracketed by
//! fencepost sentinels that make boundary-tag coalescing safe even across
//! chunks acquired at different times. A single process-wide mutex guards
//! every public entry point — this crate targets single-process,
//! multi-threaded workloads, not per-thread arenas or lock-free paths.
//!
//! Install as the process's global allocator:
//!
//! ```no_run
//! #[global_allocator]
//! static ALLOC: segalloc::SegListAllocator = segalloc::SegListAllocator;
//! ```
//!
//! Or call the four entry points directly (`allocate`, `free`,
//! `zallocate`, `resize`), mirroring `malloc`/`free`/`calloc`/`realloc`.
//!
//! Out of scope: reclaiming memory back to the OS, per-thread caches, and
//! alignments beyond the natural 8-byte block alignment.

mod block;
mod chunk;
mod core_alloc;
mod core_dealloc;
mod freelist;
mod verify;

#[cfg(feature = "logging")]
mod debug;

pub mod config;
pub mod error;
pub mod heap;
pub mod os;

#[cfg(feature = "std")]
pub mod global;

pub use config::HeapConfig;
pub use error::{AllocError, AllocErrorKind, AllocResult};
pub use heap::Heap;
pub use os::ChunkSource;

#[cfg(feature = "std")]
pub use global::{allocate, free, resize, verify, zallocate, SegListAllocator};

#[cfg(feature = "std")]
pub use os::MmapChunkSource;

#[cfg(feature = "logging")]
pub use debug::dump_heap_state;
