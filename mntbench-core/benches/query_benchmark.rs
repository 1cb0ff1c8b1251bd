//! Query throughput over a synthetic catalog
//! Every benchmark in every gate-level configuration, roughly 20k entries

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mntbench_core::catalog::{
    encode, query, BenchmarkIdentity, CatalogEntry, CatalogIndex, ClockingScheme, FilterSpec,
    GateLibrary, Level, KNOWN_BENCHMARKS,
};

const ALGORITHMS: &[&str] = &["exact", "ortho", "nanoplacer", "gold"];
const COSTS: &[&str] = &["area", "wires", "crossings", "acp"];

fn synthetic_index() -> CatalogIndex {
    let mut entries = Vec::new();
    let mut push = |identity: BenchmarkIdentity| {
        entries.push(CatalogEntry {
            path: encode(&identity).unwrap(),
            identity,
            size: 1024,
            dimensions: None,
        });
    };

    for info in KNOWN_BENCHMARKS {
        let name = info.file_name;
        push(BenchmarkIdentity::network(name).unwrap());
        for library in GateLibrary::ALL {
            push(BenchmarkIdentity::best(name, library).unwrap());
            for scheme in ClockingScheme::ALL {
                for algorithm in ALGORITHMS {
                    for cost in COSTS {
                        for (optimized, ordered) in
                            [(false, false), (false, true), (true, false), (true, true)]
                        {
                            push(
                                BenchmarkIdentity::gate(
                                    name, library, scheme, algorithm, optimized, ordered, cost,
                                )
                                .unwrap(),
                            );
                        }
                    }
                }
            }
        }
    }

    CatalogIndex::from_entries(entries).unwrap()
}

fn bench_build(c: &mut Criterion) {
    c.bench_function("index_from_entries", |b| {
        b.iter(|| black_box(synthetic_index()))
    });
}

fn bench_queries(c: &mut Criterion) {
    let index = synthetic_index();

    let narrow = FilterSpec::new()
        .benchmark("c17")
        .unwrap()
        .gate_library(GateLibrary::Bestagon)
        .clocking_scheme(ClockingScheme::Row);
    let wide = FilterSpec::new().level(Level::Gate);
    let alternatives = FilterSpec::parse([
        ("clocking_scheme", "2DDWave,USE"),
        ("algorithm", "exact,ortho"),
        ("optimized", "Opt"),
    ])
    .unwrap();

    c.bench_function("query_narrow", |b| {
        b.iter(|| black_box(query(&index, black_box(&narrow))))
    });
    c.bench_function("query_single_wide_attribute", |b| {
        b.iter(|| black_box(query(&index, black_box(&wide))))
    });
    c.bench_function("query_alternatives", |b| {
        b.iter(|| black_box(query(&index, black_box(&alternatives))))
    });
}

criterion_group!(benches, bench_build, bench_queries);
criterion_main!(benches);
