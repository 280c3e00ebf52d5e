//! Scenario 4 (SPEC_FULL.md §8): a double free must abort the process.
//! Driven out-of-process via a recursive `current_exe()` invocation, since
//! the behavior under test is process termination.

use std::process::Command;

const CHILD_ENV: &str = "SEGALLOC_DOUBLE_FREE_CHILD";

#[test]
fn double_free_aborts_the_process() {
    if std::env::var_os(CHILD_ENV).is_some() {
        run_double_free();
        panic!("double free should have aborted the process before reaching here");
    }

    let exe = std::env::current_exe().expect("test binary path");
    let status = Command::new(exe)
        .arg("--exact")
        .arg("double_free_aborts_the_process")
        .arg("--nocapture")
        .env(CHILD_ENV, "1")
        .status()
        .expect("failed to spawn child test process");

    assert!(!status.success(), "child process double-freed a block but did not abort");
}

fn run_double_free() {
    use segalloc::{Heap, HeapConfig, MmapChunkSource};

    let mut heap = Heap::new(HeapConfig::small(), MmapChunkSource).expect("first chunk");
    let p = heap.allocate(24).expect("allocate(24)");
    unsafe {
        heap.deallocate(Some(p));
        heap.deallocate(Some(p));
    }
}
