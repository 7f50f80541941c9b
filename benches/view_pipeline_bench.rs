//! Benchmark for the pure view pipeline over growing risk registers.

use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use riskmap::view::{prepare_view, sort_risks, SearchText};
use riskmap::{Category, Level, Risk, RiskFilter, SortDirection, SortField, ViewCriteria};
use std::hint::black_box;

fn create_register(size: usize) -> Vec<Risk> {
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    (0..size)
        .map(|i| {
            let probability = Level::ALL[i % 5];
            let impact = Level::ALL[(i / 5) % 5];
            let category = Category::ALL[i % Category::ALL.len()];
            Risk::new(
                format!("risk-{i}"),
                format!("Risk number {i}"),
                category,
                probability,
                impact,
                start + Duration::days((i % 365) as i64),
            )
            .with_review_date(start + Duration::days((i % 500) as i64))
        })
        .collect()
}

fn bench_prepare_view(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let mut group = c.benchmark_group("prepare_view");

    for size in [100, 1_000, 10_000] {
        let risks = create_register(size);
        group.bench_with_input(BenchmarkId::new("unfiltered", size), &risks, |b, risks| {
            b.iter(|| prepare_view(black_box(risks), &ViewCriteria::default(), now))
        });

        let searched = ViewCriteria {
            filter: RiskFilter {
                search: SearchText::new("number 1"),
                ..RiskFilter::default()
            },
            ..ViewCriteria::default()
        };
        group.bench_with_input(BenchmarkId::new("searched", size), &risks, |b, risks| {
            b.iter(|| prepare_view(black_box(risks), &searched, now))
        });
    }

    group.finish();
}

fn bench_sort_fields(c: &mut Criterion) {
    let risks = create_register(5_000);
    let mut group = c.benchmark_group("sort_risks");

    for field in [SortField::RiskScore, SortField::Title, SortField::ReviewDate] {
        group.bench_function(field.key(), |b| {
            b.iter(|| {
                let mut copy = risks.clone();
                sort_risks(black_box(&mut copy), field, SortDirection::Desc);
                copy
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_prepare_view, bench_sort_fields);
criterion_main!(benches);
