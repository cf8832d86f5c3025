use std::hint::black_box;

use blockpool::{DynArray, FreeListAllocator};
use criterion::{criterion_group, criterion_main, Criterion};

/// Builds `rounds` short-lived arrays of `len` elements each. Every round
/// after the first can be served entirely from retired blocks.
fn short_lived_arrays(rounds: usize, len: u64) {
    let alloc = FreeListAllocator::new();

    for _ in 0..rounds {
        let mut array = DynArray::new_in(&alloc);
        for i in 0..len {
            array.push(i);
        }
        black_box(&array);
    }
}

fn short_lived_vecs_default_allocator(rounds: usize, len: u64) {
    for _ in 0..rounds {
        let mut vec = Vec::new();
        for i in 0..len {
            vec.push(i);
        }
        black_box(&vec);
    }
}

/// Keeps `live` arrays around and replaces the oldest one each round, so the
/// free list always holds a mix of block sizes.
fn rolling_arrays(rounds: usize, live: usize) {
    let alloc = FreeListAllocator::new();
    let mut arrays = Vec::with_capacity(live);

    for round in 0..rounds {
        if arrays.len() == live {
            arrays.remove(0);
        }

        let mut array = DynArray::new_in(&alloc);
        array.extend(0..(round % 64) as u64);
        arrays.push(array);
        black_box(&arrays);
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("short lived arrays (64, 128)", |b| {
        b.iter(|| short_lived_arrays(64, 128))
    });

    c.bench_function("short lived vecs (64, 128) default allocator", |b| {
        b.iter(|| short_lived_vecs_default_allocator(64, 128))
    });

    c.bench_function("rolling arrays (256, 8)", |b| b.iter(|| rolling_arrays(256, 8)));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
