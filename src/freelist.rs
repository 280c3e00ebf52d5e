//! Segregated free lists: sentinel array, size-class selection, and the
//! doubly-linked circular splice/insert/remove operations every other
//! core module builds on.
//!
//! List `i` for `i < N_LISTS - 1` holds only free blocks whose *total*
//! size is `(i + 1) * 8 + ALLOC_HEADER_SIZE`; list `N_LISTS - 1` holds
//! every larger free block, in no particular size order. Each list is a
//! doubly-linked circular list through a sentinel node; `sentinel.next ==
//! sentinel` means the list is empty (design note, SPEC_FULL.md §9:
//! "the sentinel-node trick removes null checks at list boundaries").

use crate::block::{self, Header};
use crate::config::{ALLOC_HEADER_SIZE, N_LISTS};

/// Index of the last ("catch-all") size class.
pub const LAST_CLASS: usize = N_LISTS - 1;

/// Computes the size class a free block of the given *total* size belongs
/// to, capped at [`LAST_CLASS`].
///
/// `total_size` must be at least `ALLOC_HEADER_SIZE`. A zero-payload block
/// (`total_size == ALLOC_HEADER_SIZE`, possible only as a split remainder,
/// never from a user request since the minimum requested payload is 16)
/// is folded into class 0 rather than underflowing.
#[inline]
pub fn class_for_total_size(total_size: usize) -> usize {
    debug_assert!(total_size >= ALLOC_HEADER_SIZE);
    let payload = total_size - ALLOC_HEADER_SIZE;
    // Class 0 holds 8-byte payloads, so an 8-byte payload maps to index 0.
    let class = payload / 8;
    class.saturating_sub(1).min(LAST_CLASS)
}

/// Initializes a sentinel so it represents an empty circular list.
///
/// # Safety
/// `sentinel` must be a stable address (it will be self-referenced) that
/// stays alive and at the same address for the lifetime of the list —
/// true once it lives inside a boxed [`crate::heap::Heap`].
pub unsafe fn init_sentinel(sentinel: *mut Header) {
    unsafe {
        block::set_prev(sentinel, sentinel);
        block::set_next(sentinel, sentinel);
    }
}

/// True if the list anchored at `sentinel` has no nodes.
///
/// # Safety
/// `sentinel` must be an initialized sentinel.
#[inline]
pub unsafe fn is_empty(sentinel: *mut Header) -> bool {
    unsafe { block::next(sentinel) == sentinel }
}

/// Unlinks `node` from whatever list currently holds it. Does not touch
/// `node`'s own `prev`/`next` fields (callers overwrite or discard them).
///
/// # Safety
/// `node` must currently be linked into some doubly-linked circular list
/// (its `prev`/`next` must point at live neighbors in that list).
pub unsafe fn unlink(node: *mut Header) {
    unsafe {
        let p = block::prev(node);
        let n = block::next(node);
        block::set_next(p, n);
        block::set_prev(n, p);
    }
}

/// Inserts `node` at the head of the list anchored at `sentinel` (i.e.
/// immediately after the sentinel).
///
/// # Safety
/// `sentinel` must be an initialized sentinel; `node` must not already be
/// linked into any list.
pub unsafe fn insert_head(sentinel: *mut Header, node: *mut Header) {
    unsafe {
        let old_head = block::next(sentinel);
        block::set_next(sentinel, node);
        block::set_prev(node, sentinel);
        block::set_next(node, old_head);
        block::set_prev(old_head, node);
    }
}

/// Inserts `node` immediately before `at` (i.e. between `at.prev` and
/// `at`), preserving whatever relative order existed around `at`. Used to
/// splice a grown or shrunk block back into the exact slot a just-removed
/// node occupied, without losing the last-class list's existing order
/// (SPEC_FULL.md §4.3/§4.4 "splice back into the exact prev/next
/// position").
///
/// # Safety
/// `at` must be a live node or sentinel in some list; `node` must not
/// already be linked into any list.
pub unsafe fn insert_before(at: *mut Header, node: *mut Header) {
    unsafe {
        let p = block::prev(at);
        block::set_next(p, node);
        block::set_prev(node, p);
        block::set_next(node, at);
        block::set_prev(at, node);
    }
}

/// Walks the list anchored at `sentinel` looking for the first block with
/// `block_size >= min_size`. Used only for [`LAST_CLASS`], whose blocks
/// are not size-ordered.
///
/// # Safety
/// `sentinel` must be an initialized sentinel.
pub unsafe fn find_first_fit(sentinel: *mut Header, min_size: usize) -> Option<*mut Header> {
    unsafe {
        let mut cur = block::next(sentinel);
        while cur != sentinel {
            if block::block_size(cur) >= min_size {
                return Some(cur);
            }
            cur = block::next(cur);
        }
        None
    }
}
