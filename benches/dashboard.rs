use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use chrono::{Duration, NaiveDate};
use review_risk_dashboard::{
    label_topics, render_seeded, Dataset, DateRange, FilterState, ListingId, RenderOptions,
    ReviewRecord, SentimentBinary, TopicLabels,
};

fn synthetic_dataset(rows: usize) -> Dataset {
    let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
    let records = (0..rows)
        .map(|index| {
            let non_positive = index % 3 == 0;
            ReviewRecord {
                listing_id: ListingId::new((index % 500).to_string()),
                date: (start + Duration::days((index % 900) as i64))
                    .and_hms_opt(12, 0, 0)
                    .unwrap(),
                topic: Some((index % 6) as i64),
                topic_label: None,
                sentiment_binary: if non_positive {
                    SentimentBinary::NonPositive
                } else {
                    SentimentBinary::Positive
                },
                sentiment_ml: if index % 7 == 0 { "Negative" } else { "Positive" }.to_string(),
                comments: format!("synthetic review {index}"),
            }
        })
        .collect();
    label_topics(Dataset::new(records), &TopicLabels::default())
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    for rows in [1_000usize, 10_000, 100_000] {
        let dataset = synthetic_dataset(rows);
        let filter = FilterState::for_dataset(&dataset);
        let options = RenderOptions::default();

        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &dataset, |b, dataset| {
            b.iter(|| black_box(render_seeded(black_box(dataset), &filter, &options)));
        });
    }
    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let dataset = synthetic_dataset(100_000);
    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
        NaiveDate::from_ymd_opt(2022, 1, 31).unwrap(),
    )
    .unwrap();
    let filter = FilterState::default()
        .with_date_range(range)
        .with_topic("Location & Walkability");

    c.bench_function("filter_date_and_topic", |b| {
        b.iter(|| black_box(filter.apply(black_box(&dataset))));
    });
}

criterion_group!(benches, bench_render, bench_filter);
criterion_main!(benches);
