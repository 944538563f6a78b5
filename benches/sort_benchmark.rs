//! Performance benchmarks for SortCopy
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fs::File;
use std::io::Write;
use tempfile::TempDir;

/// Create a test file of the specified size
fn create_test_file(dir: &std::path::Path, name: &str, size: usize) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();

    let chunk_size = 64 * 1024;
    let chunk: Vec<u8> = (0..chunk_size).map(|i| (i % 256) as u8).collect();
    let mut remaining = size;

    while remaining > 0 {
        let to_write = remaining.min(chunk_size);
        file.write_all(&chunk[..to_write]).unwrap();
        remaining -= to_write;
    }

    path
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Runtime::new().unwrap()
}

fn bench_sort_small_files(c: &mut Criterion) {
    let src_dir = TempDir::new().unwrap();
    let dst_dir = TempDir::new().unwrap();
    let extensions = ["txt", "jpg", "rs", "csv", "md"];

    // 10 directories x 100 files spread over a few buckets
    for i in 0..10 {
        let subdir = src_dir.path().join(format!("subdir_{}", i));
        std::fs::create_dir_all(&subdir).unwrap();
        for j in 0..100 {
            let ext = extensions[j % extensions.len()];
            create_test_file(&subdir, &format!("file_{}_{}.{}", i, j, ext), 1024);
        }
    }

    let rt = runtime();
    let dest = dst_dir.path().join("sorted");

    c.bench_function("sort_1000_small_files", |b| {
        b.iter(|| {
            let config = sortcopy::config::SortConfig {
                source: src_dir.path().to_path_buf(),
                destination: dest.clone(),
                ..Default::default()
            };

            let engine = sortcopy::core::SortEngine::new(config);
            let _ = black_box(rt.block_on(engine.run()));

            // Clean destination for next iteration
            let _ = sortcopy::fs::prepare_destination(&dest);
        });
    });
}

fn bench_stream_copy(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream_copy");
    let rt = runtime();

    for size in [1024 * 1024, 10 * 1024 * 1024, 100 * 1024 * 1024].iter() {
        let src_dir = TempDir::new().unwrap();
        let dst_dir = TempDir::new().unwrap();

        let src_file = create_test_file(src_dir.path(), "large.bin", *size);

        group.throughput(Throughput::Bytes(*size as u64));
        for chunk in [sortcopy::fs::CHUNK_SIZE, 1024 * 1024] {
            group.bench_with_input(
                BenchmarkId::new(
                    format!("chunk_{}", chunk),
                    humansize::format_size(*size as u64, humansize::BINARY),
                ),
                size,
                |b, _| {
                    let dst_file = dst_dir.path().join("large.bin");
                    let copier = sortcopy::fs::StreamCopier::new(chunk);

                    b.iter(|| {
                        let _ = black_box(rt.block_on(copier.copy(&src_file, &dst_file)));
                        let _ = std::fs::remove_file(&dst_file);
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_sort_small_files, bench_stream_copy);

criterion_main!(benches);
