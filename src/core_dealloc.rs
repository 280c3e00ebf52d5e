//! Deallocation core: double-free/fencepost guards and bidirectional
//! coalescing with the re-insertion optimization (SPEC_FULL.md §4.4).

use core::ptr::NonNull;

use crate::block::{self, BlockState, Header};
use crate::freelist;
use crate::heap::Heap;
use crate::os::ChunkSource;

/// Services one deallocation against `heap`. `None` (a null pointer) is a
/// no-op.
///
/// # Safety
/// `ptr`, if `Some`, must be a pointer previously returned by `allocate`
/// on this same heap and not yet freed.
pub unsafe fn deallocate<S: ChunkSource>(heap: &mut Heap<S>, ptr: Option<NonNull<u8>>) {
    let Some(ptr) = ptr else { return };

    unsafe {
        let header = block::header_from_payload(ptr);
        match block::state(header) {
            BlockState::Unallocated => double_free_abort(header),
            // Defensive: freeing a fencepost can only happen from a
            // corrupted or already-invalid pointer; ignore rather than
            // corrupt chunk boundaries.
            BlockState::Fencepost => {}
            BlockState::Allocated => free_and_coalesce(heap, header),
        }
    }
}

/// Marks `header` free and coalesces with whichever neighbors are also
/// free, then re-inserts the (possibly grown) block per the SPEC_FULL.md
/// §4.4 re-insertion optimization.
///
/// # Safety
/// `header` must be a live, currently ALLOCATED block belonging to `heap`.
unsafe fn free_and_coalesce<S: ChunkSource>(heap: &mut Heap<S>, header: *mut Header) {
    unsafe {
        block::set_state(header, BlockState::Unallocated);

        let mut working = header;
        let mut coalesced = false;
        let mut splice_at: *mut Header = core::ptr::null_mut();

        let right = block::right_neighbor(working);
        if block::state(right) == BlockState::Unallocated {
            splice_at = block::next(right);
            freelist::unlink(right);
            let new_size = block::block_size(working) + block::block_size(right);
            block::set_block_size(working, new_size);
            let new_right = block::right_neighbor(working);
            block::set_left_size(new_right, new_size);
            coalesced = true;
        }

        let left = block::left_neighbor(working);
        if block::state(left) == BlockState::Unallocated {
            splice_at = block::next(left);
            freelist::unlink(left);
            let new_size = block::block_size(left) + block::block_size(working);
            block::set_block_size(left, new_size);
            let new_right = block::right_neighbor(left);
            block::set_left_size(new_right, new_size);
            working = left;
            coalesced = true;
        }

        if coalesced {
            freelist::insert_before(splice_at, working);
        } else {
            let class = freelist::class_for_total_size(block::block_size(working));
            let sentinel = heap.sentinel(class);
            freelist::insert_head(sentinel, working);
        }
    }
}

/// Reports a double free and terminates the process (SPEC_FULL.md §7: a
/// programmer error, not a recoverable one). The diagnostic goes out on
/// the error channel via both `tracing` (when a subscriber is installed)
/// and a direct `eprintln!` (so the message survives when one isn't).
fn double_free_abort(header: *mut Header) -> ! {
    #[cfg(feature = "logging")]
    tracing::error!(?header, "double free detected");
    eprintln!("segalloc: double free detected at {header:p}, aborting");
    std::process::abort();
}

