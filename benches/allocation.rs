//! Benchmarks for cluster allocation, stream I/O and path resolution

use clusterfs::{ClusterFs, NodeType, StoreConfig, Volume};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn config() -> StoreConfig {
    StoreConfig::with_clusters(16_384, 512)
}

fn benchmark_allocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate_clusters");

    for count in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let mut vol = Volume::new(&config()).unwrap();
                for _ in 0..count {
                    black_box(vol.allocate_cluster().unwrap());
                }
            });
        });
    }

    group.finish();
}

fn benchmark_allocate_after_wraparound(c: &mut Criterion) {
    c.bench_function("allocate_after_wraparound", |b| {
        let mut vol = Volume::new(&config()).unwrap();
        while vol.allocate_cluster().is_ok() {}
        let first = vol.geometry().first_usable;
        let last = vol.high_water_mark().unwrap();

        b.iter(|| {
            // Only the first usable cluster is free, so every call wraps
            vol.free_cluster(first);
            black_box(vol.allocate_cluster().unwrap());
            vol.free_cluster(last);
            black_box(vol.allocate_cluster().unwrap());
        });
    });
}

fn benchmark_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream");

    for size in [256usize, 4096, 65536].iter() {
        let data = vec![0x5Au8; *size];
        group.throughput(Throughput::Bytes(*size as u64));

        group.bench_with_input(BenchmarkId::new("write", size), &data, |b, data| {
            b.iter(|| {
                let mut vol = Volume::new(&config()).unwrap();
                let file = vol.create_object(NodeType::File, 0, "bench").unwrap();
                vol.write(file, black_box(data)).unwrap();
            });
        });

        let mut vol = Volume::new(&config()).unwrap();
        let file = vol.create_object(NodeType::File, 0, "bench").unwrap();
        vol.write(file, &data).unwrap();
        group.bench_with_input(BenchmarkId::new("read", size), size, |b, &size| {
            b.iter(|| black_box(vol.read(file, size)));
        });
    }

    group.finish();
}

fn benchmark_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for width in [10usize, 100, 500].iter() {
        let mut fs = ClusterFs::create(&config()).unwrap();
        for i in 0..*width {
            fs.mkdir(&format!("dir{}", i)).unwrap();
        }
        let target = format!("dir{}", width - 1);
        fs.touch(&format!("{}/file", target), b"x").unwrap();
        let path = format!("/{}/file", target);

        group.bench_with_input(BenchmarkId::from_parameter(width), &path, |b, path| {
            b.iter(|| black_box(fs.resolve(path).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_allocate,
    benchmark_allocate_after_wraparound,
    benchmark_stream,
    benchmark_resolve
);
criterion_main!(benches);
