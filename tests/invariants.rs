//! Property-style stress testing for the invariants and laws in
//! SPEC_FULL.md §8: `verify()` must hold after every single operation,
//! regardless of allocation/free order.

use proptest::prelude::*;
use segalloc::{Heap, HeapConfig, MmapChunkSource};

proptest! {
    /// Allocates a random sequence of sizes, checking `verify()` after
    /// each one, then frees every surviving allocation in a pseudo-random
    /// order (derived from `seed`, no external RNG dependency needed),
    /// checking `verify()` after each free too.
    #[test]
    fn verify_holds_after_every_operation(
        sizes in prop::collection::vec(1usize..=500, 1..40),
        seed in any::<u64>(),
    ) {
        let mut heap = Heap::new(HeapConfig::small(), MmapChunkSource).unwrap();
        let mut live = Vec::new();

        for &size in &sizes {
            let p = heap.allocate(size);
            prop_assert!(heap.verify());
            if let Some(p) = p {
                live.push(p);
            }
        }

        let mut order: Vec<usize> = (0..live.len()).collect();
        let mut state = seed | 1;
        for i in (1..order.len()).rev() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let j = (state >> 33) as usize % (i + 1);
            order.swap(i, j);
        }

        for &idx in &order {
            unsafe { heap.deallocate(Some(live[idx])) };
            prop_assert!(heap.verify());
        }
    }
}

#[test]
fn draining_all_matched_pairs_collapses_to_one_free_block() {
    let mut heap = Heap::new(HeapConfig::small(), MmapChunkSource).expect("first chunk");

    let sizes = [8usize, 64, 128, 256, 16, 512];
    let ptrs: Vec<_> = sizes.iter().map(|&s| heap.allocate(s).expect("allocate")).collect();
    assert!(heap.verify());

    for p in ptrs {
        unsafe { heap.deallocate(Some(p)) };
    }
    assert!(heap.verify());

    // A single free block spanning the whole chunk's inner region should
    // satisfy a near-full-capacity request.
    let near_full = 4096 - 4 * segalloc::config::ALLOC_HEADER_SIZE;
    assert!(heap.allocate(near_full).is_some());
}

#[test]
fn free_of_null_is_a_no_op() {
    let mut heap = Heap::new(HeapConfig::small(), MmapChunkSource).expect("first chunk");
    unsafe { heap.deallocate(None) };
    assert!(heap.verify());
}
