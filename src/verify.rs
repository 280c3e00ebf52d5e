//! Structural verifier (SPEC_FULL.md §4.5 / §8). A single boolean-returning
//! check, not a repair tool: any violation is reported via `tracing::warn!`
//! and the whole check short-circuits to `false`.

use crate::block::{self, BlockState, Header};
use crate::config::N_LISTS;
use crate::heap::Heap;
use crate::os::ChunkSource;

/// Checks every invariant in SPEC_FULL.md §3 against `heap`'s current
/// state: each free list is acyclic and internally consistent, and every
/// recorded OS chunk's boundary tags agree with its neighbors.
pub fn verify<S: ChunkSource>(heap: &Heap<S>) -> bool {
    for class in 0..N_LISTS {
        let sentinel = heap.sentinel(class);
        // SAFETY: `sentinel` is one of `heap`'s initialized sentinels.
        unsafe {
            if has_cycle(sentinel) {
                warn_violation(&format_args!("cycle detected in free list {class}"));
                return false;
            }
            if !links_consistent(sentinel) {
                warn_violation(&format_args!("prev/next mismatch in free list {class}"));
                return false;
            }
            if !sizes_match_class(sentinel, class) {
                warn_violation(&format_args!("block in list {class} has the wrong size class"));
                return false;
            }
        }
    }

    for &left_fencepost in heap.os_chunks_iter() {
        // SAFETY: every recorded left fencepost is a live header belonging
        // to a chunk this heap still owns.
        if !unsafe { chunk_boundary_tags_consistent(left_fencepost) } {
            warn_violation(&format_args!("boundary tag mismatch walking chunk at {left_fencepost:p}"));
            return false;
        }
    }

    true
}

#[cfg(feature = "logging")]
fn warn_violation(msg: &core::fmt::Arguments<'_>) {
    tracing::warn!("{msg}");
}

#[cfg(not(feature = "logging"))]
fn warn_violation(_msg: &core::fmt::Arguments<'_>) {}

/// Floyd's tortoise-and-hare: both pointers start at `sentinel` and walk
/// forward (the hare twice as fast); they are guaranteed to coincide
/// within one traversal of the ring. They meet at `sentinel` iff the ring
/// closes normally; meeting anywhere else means a corrupted pointer has
/// created a sub-cycle that never returns to the sentinel.
///
/// # Safety
/// `sentinel` must be an initialized sentinel of a list that is at least
/// superficially well-formed (every reachable `next` pointer valid).
unsafe fn has_cycle(sentinel: *mut Header) -> bool {
    unsafe {
        let mut slow = sentinel;
        let mut fast = sentinel;
        loop {
            slow = block::next(slow);
            fast = block::next(block::next(fast));
            if slow == fast {
                return slow != sentinel;
            }
        }
    }
}

/// Single forward walk checking `cur.next.prev == cur` and
/// `cur.prev.next == cur` for every node, including the sentinel.
///
/// # Safety
/// `sentinel` must anchor a cycle-free ring (callers run this only after
/// [`has_cycle`] returns `false`).
unsafe fn links_consistent(sentinel: *mut Header) -> bool {
    unsafe {
        let mut cur = sentinel;
        loop {
            let next = block::next(cur);
            if block::prev(next) != cur {
                return false;
            }
            if block::next(block::prev(cur)) != cur {
                return false;
            }
            cur = next;
            if cur == sentinel {
                return true;
            }
        }
    }
}

/// Confirms every node linked into list `class` actually belongs there
/// per [`crate::freelist::class_for_total_size`].
///
/// # Safety
/// Same as [`links_consistent`].
unsafe fn sizes_match_class(sentinel: *mut Header, class: usize) -> bool {
    unsafe {
        let mut cur = block::next(sentinel);
        while cur != sentinel {
            let size = block::block_size(cur);
            if crate::freelist::class_for_total_size(size) != class {
                return false;
            }
            if block::state(cur) != BlockState::Unallocated {
                return false;
            }
            cur = block::next(cur);
        }
        true
    }
}

/// Walks one OS chunk from its left fencepost rightward, checking that
/// every block's boundary tag agrees with its right neighbor's
/// `left_size`, and that the walk terminates at a fencepost.
///
/// # Safety
/// `left_fencepost` must be a live fencepost header belonging to a chunk
/// this heap currently owns.
unsafe fn chunk_boundary_tags_consistent(left_fencepost: *mut Header) -> bool {
    unsafe {
        let mut cur = block::right_neighbor(left_fencepost);
        loop {
            if block::state(cur) == BlockState::Fencepost {
                return true;
            }

            let right = block::right_neighbor(cur);
            if (right as usize) <= (cur as usize) {
                // Address must strictly increase; anything else is
                // corruption, not a legitimately large block.
                return false;
            }
            if block::left_size(right) != block::block_size(cur) {
                return false;
            }
            cur = right;
        }
    }
}
