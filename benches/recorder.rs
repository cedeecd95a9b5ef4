// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Benchmarks for the instrumentation hot path and the generator.
//!
//! Pushing is disabled so only in-process work is measured:
//! - entry/exit hooks of the recorder
//! - label set construction
//! - OpenMetrics encoding
//! - instrumenting a Go function
//!
//! Run with: `cargo bench --bench recorder`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use autometer::generate::{Generator, GeneratorOptions};
use autometer::runtime::{counter_labels, Autometrics, CallInfo, Context, Outcome};

fn context() -> Context {
    Context::new(CallInfo::new("handle", "bench::recorder"))
        .with_slo_name("api")
        .with_alert_success(99.9)
}

/// Benchmark a full enter/exit cycle.
fn bench_hooks(c: &mut Criterion) {
    let mut group = c.benchmark_group("hooks");
    let recorder = Autometrics::default();

    group.bench_function("enter_exit", |b| {
        b.iter(|| {
            let marker = recorder.on_enter(black_box(context()));
            if let Some(marker) = marker {
                recorder.on_exit(marker, None);
            }
        });
    });

    group.bench_function("guard", |b| {
        b.iter(|| {
            let _guard = recorder.instrument(black_box(context()));
        });
    });

    group.bench_function("counter_labels", |b| {
        let ctx = context();
        b.iter(|| black_box(counter_labels(&ctx, Outcome::Ok)));
    });

    group.finish();
}

/// Benchmark encoding with a growing number of series.
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for functions in [1usize, 10, 100] {
        let recorder = Autometrics::default();
        for i in 0..functions {
            let name = format!("f{}", i);
            let _guard = recorder.instrument(Context::new(CallInfo::new(name, "bench")));
        }

        group.throughput(Throughput::Elements(functions as u64));
        group.bench_with_input(BenchmarkId::from_parameter(functions), &recorder, |b, recorder| {
            b.iter(|| black_box(recorder.encode()))
        });
    }

    group.finish();
}

const SOURCE: &str = r#"package api

import (
	"context"

	am "github.com/autometrics-dev/autometrics-go/prometheus/autometrics"
)

func Fetch(ctx context.Context, id string) (user string, err error) {
	user = "u-" + id
	return
}
"#;

/// Benchmark instrumenting one function.
fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    let mut generator = match Generator::new() {
        Ok(generator) => generator,
        Err(e) => panic!("failed to create generator: {}", e),
    };
    let options = GeneratorOptions::default();

    group.throughput(Throughput::Bytes(SOURCE.len() as u64));
    group.bench_function("instrument", |b| {
        b.iter(|| black_box(generator.instrument(SOURCE, "Fetch", &options)))
    });

    group.finish();
}

criterion_group!(benches, bench_hooks, bench_encode, bench_generate);
criterion_main!(benches);
