// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use libdd_remote_unwind::{
    Arch, NoSymbols, RegisterSnapshot, Session, SnapshotMemory, StackWalker, SymbolTable,
    UnwindConfiguration, MAX_FRAMES_LIMIT,
};

const STACK_BASE: u64 = 0x7ff0_0000_0000;
const TEXT_BASE: u64 = 0x40_0000;

/// A well-formed riscv64 chain of `depth` frames, 0x40 bytes apart.
fn deep_stack(depth: u64) -> SnapshotMemory {
    let mut words = Vec::with_capacity(depth as usize * 8);
    for i in 1..=depth {
        let next_fp = if i == depth {
            0
        } else {
            STACK_BASE + (i + 1) * 0x40
        };
        words.extend([0, 0, 0, 0, 0, 0, next_fp, TEXT_BASE + i * 0x100]);
    }
    let mut memory = SnapshotMemory::new();
    #[allow(clippy::unwrap_used)]
    memory.add_words(STACK_BASE, &words).unwrap();
    memory
}

fn symbols(depth: u64) -> SymbolTable {
    let mut table = SymbolTable::new();
    for i in 0..=depth {
        let name = format!("_ZN5bench4leaf{i}17h0123456789abcdefE");
        table.insert(TEXT_BASE + i * 0x100, Some(0x100), name);
    }
    table
}

fn walk_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("walk");
    for depth in [16_u64, 256, 4000] {
        let memory = deep_stack(depth);
        let table = symbols(depth);
        let thread = RegisterSnapshot::new(STACK_BASE, STACK_BASE + 0x40, TEXT_BASE);

        #[allow(clippy::unwrap_used)]
        let raw = UnwindConfiguration::new(Arch::Riscv64, MAX_FRAMES_LIMIT, false, false).unwrap();
        let session = Session::new(&memory, &NoSymbols, Arch::Riscv64.layout());
        group.bench_with_input(BenchmarkId::new("frames", depth), &depth, |b, _| {
            #[allow(clippy::unwrap_used)]
            let walker = StackWalker::new(session, &raw).unwrap();
            b.iter(|| {
                #[allow(clippy::unwrap_used)]
                let root = thread.initial_frame(session).unwrap();
                black_box(walker.walk(&thread, root).count())
            })
        });

        #[allow(clippy::unwrap_used)]
        let full = UnwindConfiguration::new(Arch::Riscv64, MAX_FRAMES_LIMIT, true, true).unwrap();
        let session = Session::new(&memory, &table, Arch::Riscv64.layout());
        group.bench_with_input(BenchmarkId::new("trace", depth), &depth, |b, _| {
            #[allow(clippy::unwrap_used)]
            let walker = StackWalker::new(session, &full).unwrap();
            b.iter(|| {
                #[allow(clippy::unwrap_used)]
                let root = thread.initial_frame(session).unwrap();
                black_box(walker.collect_trace(&thread, root))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, walk_benches);
criterion_main!(benches);
