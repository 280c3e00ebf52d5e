//! Minimal heap-state dump for debugging (SPEC_FULL.md §1 "out of scope
//! for the core data structure" — a `tracing`-backed summary, not a full
//! visualizer).

use crate::block;
use crate::config::N_LISTS;
use crate::heap::Heap;
use crate::os::ChunkSource;

/// Logs free-list occupancy and the recorded OS chunk count via
/// `tracing::debug!`. Intended for interactive debugging, not parsing.
pub fn dump_heap_state<S: ChunkSource>(heap: &Heap<S>) {
    for class in 0..N_LISTS {
        let sentinel = heap.sentinel(class);
        let mut count = 0usize;
        // SAFETY: `sentinel` is one of `heap`'s initialized sentinels.
        unsafe {
            let mut cur = block::next(sentinel);
            while cur != sentinel {
                count += 1;
                cur = block::next(cur);
            }
        }
        if count > 0 {
            tracing::debug!(class, count, "free list occupancy");
        }
    }
    tracing::debug!(
        base = ?heap.base(),
        chunks = heap.os_chunks_iter().count(),
        "recorded OS chunks"
    );
}
