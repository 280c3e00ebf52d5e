//! Real-world scenario benchmarks
//!
//! Compares this crate's segregated free-list allocator against
//! `std::alloc::System` under the same usage patterns.

use std::alloc::{GlobalAlloc, Layout, System};

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use segalloc::{Heap, HeapConfig, MmapChunkSource};

type TestHeap = Heap<MmapChunkSource>;

fn new_heap() -> Box<TestHeap> {
    Heap::new(HeapConfig::default_config(), MmapChunkSource).expect("bench heap setup")
}

/// Simulate a request/response cycle: allocate, use, deallocate.
fn bench_request_response(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_response");
    group.throughput(Throughput::Elements(1));

    group.bench_function("segalloc", |b| {
        let mut heap = new_heap();
        b.iter(|| unsafe {
            let req = heap.allocate(256).unwrap();
            std::ptr::write_bytes(req.as_ptr(), 0x42, 256);

            let resp = heap.allocate(256).unwrap();
            std::ptr::write_bytes(resp.as_ptr(), 0x24, 256);

            black_box((req, resp));

            heap.deallocate(Some(req));
            heap.deallocate(Some(resp));
        });
    });

    group.bench_function("system", |b| {
        let layout = Layout::from_size_align(256, 8).unwrap();
        b.iter(|| unsafe {
            let req = System.alloc(layout);
            std::ptr::write_bytes(req, 0x42, 256);

            let resp = System.alloc(layout);
            std::ptr::write_bytes(resp, 0x24, 256);

            black_box((req, resp));

            System.dealloc(req, layout);
            System.dealloc(resp, layout);
        });
    });

    group.finish();
}

/// Allocate-then-free objects in the order they were created.
fn bench_object_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("object_lifecycle");
    group.throughput(Throughput::Elements(10));

    group.bench_function("segalloc", |b| {
        let mut heap = new_heap();
        b.iter(|| unsafe {
            let mut objects = Vec::with_capacity(10);
            for i in 0..10 {
                let obj = heap.allocate(128).unwrap();
                std::ptr::write_bytes(obj.as_ptr(), i as u8, 128);
                objects.push(obj);
            }
            for obj in objects {
                heap.deallocate(Some(obj));
            }
        });
    });

    group.bench_function("system", |b| {
        let layout = Layout::from_size_align(128, 8).unwrap();
        b.iter(|| unsafe {
            let mut objects = Vec::with_capacity(10);
            for i in 0..10 {
                let obj = System.alloc(layout);
                std::ptr::write_bytes(obj, i as u8, 128);
                objects.push(obj);
            }
            for obj in objects {
                System.dealloc(obj, layout);
            }
        });
    });

    group.finish();
}

/// A realistic mix of small, medium, and large allocations freed together.
fn bench_mixed_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_sizes");

    group.bench_function("segalloc", |b| {
        let mut heap = new_heap();
        b.iter(|| unsafe {
            let s1 = heap.allocate(16).unwrap();
            let s2 = heap.allocate(32).unwrap();
            let m1 = heap.allocate(256).unwrap();
            let m2 = heap.allocate(512).unwrap();
            let l1 = heap.allocate(4096).unwrap();

            black_box((s1, s2, m1, m2, l1));

            heap.deallocate(Some(s1));
            heap.deallocate(Some(s2));
            heap.deallocate(Some(m1));
            heap.deallocate(Some(m2));
            heap.deallocate(Some(l1));
        });
    });

    group.bench_function("system", |b| {
        b.iter(|| unsafe {
            let layouts = [
                Layout::from_size_align(16, 8).unwrap(),
                Layout::from_size_align(32, 8).unwrap(),
                Layout::from_size_align(256, 8).unwrap(),
                Layout::from_size_align(512, 8).unwrap(),
                Layout::from_size_align(4096, 8).unwrap(),
            ];
            let ptrs: Vec<_> = layouts.iter().map(|l| System.alloc(*l)).collect();
            black_box(&ptrs);
            for (ptr, layout) in ptrs.into_iter().zip(layouts) {
                System.dealloc(ptr, layout);
            }
        });
    });

    group.finish();
}

/// High-frequency allocate/deallocate cycles of a single fixed size.
fn bench_high_frequency(c: &mut Criterion) {
    let mut group = c.benchmark_group("high_frequency");
    group.throughput(Throughput::Elements(1000));

    group.bench_function("segalloc", |b| {
        let mut heap = new_heap();
        b.iter(|| unsafe {
            for _ in 0..1000 {
                let ptr = heap.allocate(64).unwrap();
                heap.deallocate(Some(ptr));
            }
        });
    });

    group.bench_function("system", |b| {
        let layout = Layout::from_size_align(64, 8).unwrap();
        b.iter(|| unsafe {
            for _ in 0..1000 {
                let ptr = System.alloc(layout);
                black_box(ptr);
                System.dealloc(ptr, layout);
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_request_response,
    bench_object_lifecycle,
    bench_mixed_sizes,
    bench_high_frequency,
);

criterion_main!(benches);
