//! Allocation core: size-class search, splitting, and chunk-exhaustion
//! handling with opportunistic cross-chunk fusion (SPEC_FULL.md §4.3).

use core::ptr::NonNull;

use crate::block::{self, BlockState, Header};
use crate::chunk;
use crate::config::ALLOC_HEADER_SIZE;
use crate::error::{AllocError, AllocErrorKind};
use crate::freelist::{self, LAST_CLASS};
use crate::heap::Heap;
use crate::os::ChunkSource;

/// Rounds a requested user payload up to this allocator's granularity and
/// adds the header, per the sizing rule in SPEC_FULL.md §4.3.
///
/// `Ok(None)` for a zero-size request (an invalid request, not an error —
/// SPEC_FULL.md §7 kind 2); `Err(SizeOverflow)` when the rounding or the
/// header addition would overflow `usize` (kind-3-adjacent: the allocator
/// cannot possibly satisfy a request this large, so it is treated like any
/// other internal fallible collaborator and converted to null by
/// [`allocate`], mirroring how [`crate::os::ChunkSource::extend`]'s
/// `Err(OutOfMemory)` is converted at the same boundary).
#[inline]
pub fn block_size_for_request(requested: usize) -> Result<Option<usize>, AllocError> {
    if requested == 0 {
        return Ok(None);
    }
    let payload = requested.max(16);
    let overflow = || AllocError::new(AllocErrorKind::SizeOverflow);
    let rounded = payload.checked_add(7).ok_or_else(overflow)? & !7;
    rounded.checked_add(ALLOC_HEADER_SIZE).ok_or_else(overflow).map(Some)
}

/// Services one allocation request against `heap`, returning a payload
/// pointer or `None` if the request is invalid, overflows, or the OS
/// refuses every heap-extension attempt.
pub fn allocate<S: ChunkSource>(heap: &mut Heap<S>, requested: usize) -> Option<NonNull<u8>> {
    let needed = match block_size_for_request(requested) {
        Ok(Some(needed)) => needed,
        Ok(None) => return None,
        Err(_) => return None,
    };

    loop {
        if let Some((block, old_next)) = find_and_remove(heap, needed) {
            // SAFETY: `block` was just unlinked from a free list, so it is
            // a live UNALLOCATED block of size >= `needed`; `old_next` is
            // the live node (or sentinel) that followed it.
            unsafe { split_and_mark(heap, block, needed, old_next) };
            // SAFETY: `block`'s header is valid and the block is ALLOCATED.
            let payload = unsafe { block::payload_ptr(block) };
            return NonNull::new(payload);
        }

        // SAFETY: heap invariants hold on loop entry.
        if !unsafe { grow_and_retry(heap) } {
            return None;
        }
    }
}

/// Finds the first free block able to hold `needed` bytes, starting from
/// its size class and scanning upward, and unlinks it. Returns the block
/// together with the node (or sentinel) that followed it in its list, so
/// a subsequent split can splice a last-class remainder back into the
/// same slot (SPEC_FULL.md §4.3 split re-insertion optimization).
fn find_and_remove<S: ChunkSource>(heap: &mut Heap<S>, needed: usize) -> Option<(*mut Header, *mut Header)> {
    let start = freelist::class_for_total_size(needed);
    for class in start..=LAST_CLASS {
        let sentinel = heap.sentinel(class);
        // SAFETY: `sentinel` is one of `heap`'s initialized sentinels.
        unsafe {
            if freelist::is_empty(sentinel) {
                continue;
            }
            let candidate = if class == LAST_CLASS {
                match freelist::find_first_fit(sentinel, needed) {
                    Some(c) => c,
                    None => continue,
                }
            } else {
                block::next(sentinel)
            };
            let old_next = block::next(candidate);
            freelist::unlink(candidate);
            return Some((candidate, old_next));
        }
    }
    None
}

/// Splits `block` (size >= `needed`) when the remainder is itself a legal
/// block, marks the returned high part ALLOCATED, and re-inserts any free
/// remainder (SPEC_FULL.md §4.3 split policy).
///
/// # Safety
/// `block` must be a live, just-unlinked UNALLOCATED block of size
/// `>= needed` belonging to `heap`; `old_next` must be the node (or
/// sentinel) that followed it before unlinking.
unsafe fn split_and_mark<S: ChunkSource>(heap: &mut Heap<S>, block: *mut Header, needed: usize, old_next: *mut Header) {
    unsafe {
        let total = block::block_size(block);
        let extra = total - needed;

        if extra >= ALLOC_HEADER_SIZE {
            // The low part keeps `block`'s address and left neighbor; the
            // high part becomes the returned allocation.
            let low = block;
            let high = (block as usize + extra) as *mut Header;

            Header::write(high, needed, BlockState::Allocated, extra);
            block::set_block_size(low, extra);

            let right_of_high = block::right_neighbor(high);
            block::set_left_size(right_of_high, needed);

            reinsert(heap, low, extra, old_next);
        } else {
            block::set_state(block, BlockState::Allocated);
        }
    }
}

/// Re-inserts a split-off remainder of `size`: into the head of its exact
/// size class if it has one, or spliced back into the slot the original
/// (pre-split) block occupied in the last class otherwise.
///
/// # Safety
/// `node` must not currently be linked into any list; `old_next` must be
/// the live node (or sentinel) that followed the original block before
/// removal.
unsafe fn reinsert<S: ChunkSource>(heap: &mut Heap<S>, node: *mut Header, size: usize, old_next: *mut Header) {
    unsafe {
        let class = freelist::class_for_total_size(size);
        if class < LAST_CLASS {
            let sentinel = heap.sentinel(class);
            freelist::insert_head(sentinel, node);
        } else {
            freelist::insert_before(old_next, node);
        }
    }
}

/// Handles list exhaustion: acquires one new OS chunk, opportunistically
/// fuses it with the most recently acquired chunk when they abut, and
/// installs the resulting free block at the head of the last list
/// (SPEC_FULL.md §4.3 "Exhaustion"). Returns `false` if the OS refused the
/// extension.
///
/// # Safety
/// `heap`'s invariants (§3) must hold on entry.
unsafe fn grow_and_retry<S: ChunkSource>(heap: &mut Heap<S>) -> bool {
    let formatted = match heap.acquire_chunk() {
        Ok(f) => f,
        Err(_) => return false,
    };

    let last_fencepost = heap.last_fencepost;
    let free_block = if chunk::abuts(last_fencepost, formatted.left_fencepost) {
        #[cfg(feature = "logging")]
        tracing::debug!("fusing newly acquired chunk with previous one");
        // SAFETY: `last_fencepost` is `heap`'s current fencepost; the new
        // chunk was just formatted and abuts it.
        unsafe { fuse(last_fencepost, formatted.inner, formatted.right_fencepost) }
    } else {
        heap.record_chunk(formatted.left_fencepost);
        formatted.inner
    };

    heap.last_fencepost = formatted.right_fencepost;

    let sentinel = heap.sentinel(LAST_CLASS);
    // SAFETY: `free_block` is a live UNALLOCATED block not linked anywhere.
    unsafe { freelist::insert_head(sentinel, free_block) };

    true
}

/// Fuses a newly acquired, adjacent chunk into the free region ending at
/// `last_fencepost`, per the two branches in SPEC_FULL.md §4.3.
///
/// # Safety
/// `last_fencepost` must be the heap's current last fencepost (a live
/// header); `new_inner`/`new_right_fencepost` must belong to the chunk
/// just formatted, abutting `last_fencepost`.
unsafe fn fuse(last_fencepost: *mut Header, new_inner: *mut Header, new_right_fencepost: *mut Header) -> *mut Header {
    unsafe {
        let new_inner_size = block::block_size(new_inner);
        let p = block::left_neighbor(last_fencepost);

        if block::state(p) == BlockState::Unallocated {
            freelist::unlink(p);
            let final_size = block::block_size(p) + 2 * ALLOC_HEADER_SIZE + new_inner_size;
            chunk::fuse_into(p, final_size, new_right_fencepost);
            p
        } else {
            block::set_state(last_fencepost, BlockState::Unallocated);
            let final_size = new_inner_size + 2 * ALLOC_HEADER_SIZE;
            chunk::fuse_into(last_fencepost, final_size, new_right_fencepost);
            last_fencepost
        }
    }
}
