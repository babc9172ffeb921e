//! Criterion benchmarks for monitor_runtime

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use crossbeam_channel::bounded;
use monitor_runtime::prelude::*;
use std::time::Duration;
use tempfile::TempDir;

// ============================================================================
// Dispatch Benchmarks
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));

    let dispatcher = Dispatcher::new(Logger::disabled());

    group.bench_function("send_with_room", |b| {
        let (tx, rx) = bounded(1);
        b.iter(|| {
            dispatcher.send(&tx, black_box(1u64), 1).ok();
            rx.recv().ok();
        });
    });

    group.bench_function("zero_timeout_full", |b| {
        let (tx, _rx) = bounded(1);
        tx.send(0u64).ok();
        b.iter(|| black_box(dispatcher.send(&tx, black_box(1u64), 0).is_err()));
    });

    group.bench_function("short_timeout_full", |b| {
        let (tx, _rx) = bounded(1);
        tx.send(0u64).ok();
        b.iter(|| {
            black_box(
                dispatcher
                    .send_timeout(&tx, 1u64, Duration::from_micros(50))
                    .is_err(),
            )
        });
    });

    group.finish();
}

// ============================================================================
// Logging Benchmarks
// ============================================================================

fn bench_level_gating(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_gating");
    group.throughput(Throughput::Elements(1));

    let logger = Logger::builder().level(LogLevel::Error).build();

    group.bench_function("filtered_debug", |b| {
        b.iter(|| logger.debug(black_box("not written")));
    });

    group.bench_function("filtered_with_context", |b| {
        b.iter(|| {
            logger.info_with_context(
                black_box("not written"),
                LogContext::new().with_field("request_id", 42u64),
            )
        });
    });

    group.bench_function("enabled_check", |b| {
        b.iter(|| black_box(logger.enabled(black_box(LogLevel::Warn))));
    });

    group.finish();
}

fn bench_file_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_logging");
    group.throughput(Throughput::Elements(1));

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = LoggingConfig::default().with_filename(temp_dir.path().join("bench.log"));
    let (logger, _level) = configure_logger(&config).expect("Failed to configure logger");

    group.bench_function("info", |b| {
        b.iter(|| logger.info(black_box("benchmark record")));
    });

    group.bench_function("info_with_fields", |b| {
        let logger = logger.with_field("component", "bench");
        b.iter(|| {
            logger.info_with_context(
                black_box("benchmark record"),
                LogContext::new()
                    .with_field("delivered", true)
                    .with_field("elapsed_ms", 3u64),
            )
        });
    });

    group.finish();
}

fn bench_rotation(c: &mut Criterion) {
    let mut group = c.benchmark_group("rotation");
    group.sample_size(20);

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let policy = RotationPolicy::new()
        .with_max_size_bytes(16 * 1024)
        .with_max_backups(3);
    let appender = RotatingFileAppender::with_policy(temp_dir.path().join("rotate.log"), policy)
        .expect("Failed to create appender");
    let logger = Logger::builder().appender(appender).build();

    group.bench_function("info_rotating", |b| {
        b.iter(|| logger.info(black_box("a record that eventually triggers rotation")));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_dispatch,
    bench_level_gating,
    bench_file_logging,
    bench_rotation
);
criterion_main!(benches);
