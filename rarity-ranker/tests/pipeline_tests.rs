//! End-to-end pipeline tests against scripted metadata sources
//!
//! Covers dense item arrays, failure tolerance, frequency tables,
//! ranking stability, timeouts and cancellation.

mod helpers;

use helpers::{GaugeSource, StubSource};
use rarity_common::config::FrequencyMode;
use rarity_ranker::models::CollectionSpec;
use rarity_ranker::services::fetch_pool::{FetchEvent, FetchPool, FetchPoolConfig};
use rarity_ranker::services::Aggregator;
use rarity_ranker::{RankerError, RankerOptions, RarityPipeline};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const LOCATION: &str = "http://stub/azuki";

fn options(workers: usize, top_n: usize) -> RankerOptions {
    RankerOptions {
        pool: FetchPoolConfig {
            workers,
            fetch_timeout: Duration::from_secs(5),
            job_buffer: 1,
        },
        top_n,
        frequency_mode: FrequencyMode::Value,
    }
}

fn three_item_source() -> StubSource {
    StubSource::new()
        .ok(0, &[("bg", "red")])
        .ok(1, &[("bg", "red")])
        .ok(2, &[("bg", "blue")])
}

#[tokio::test]
async fn test_three_item_scenario() {
    let source = Arc::new(three_item_source());
    let spec = CollectionSpec::new(3, LOCATION).unwrap();

    let report = RarityPipeline::new(source.clone(), options(2, 1))
        .run(&spec, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.stats.value_counts()["red"], 2);
    assert_eq!(report.stats.value_counts()["blue"], 1);
    assert_eq!(report.stats.distinct_values("bg"), Some(2));

    assert_eq!(report.scorecards[0].rarity, 0.25);
    assert_eq!(report.scorecards[1].rarity, 0.25);
    assert_eq!(report.scorecards[2].rarity, 0.5);

    assert_eq!(report.top.len(), 1);
    assert_eq!(report.top[0].id, 2);
    assert_eq!(report.top[0].rank, 1);

    assert_eq!(source.calls(), 3);
    assert!(source.seen_locations().iter().all(|l| l == LOCATION));
}

#[tokio::test]
async fn test_failed_fetch_becomes_empty_item() {
    let source = Arc::new(
        StubSource::new()
            .ok(0, &[("bg", "red")])
            .fail(1)
            .ok(2, &[("bg", "blue")]),
    );
    let spec = CollectionSpec::new(3, LOCATION).unwrap();

    let report = RarityPipeline::new(source, options(3, 5))
        .run(&spec, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.items.len(), 3);
    assert_eq!(report.items[1].id, 1);
    assert!(report.items[1].is_empty());
    assert_eq!(report.scorecards.len(), 3);
    assert_eq!(report.scorecards[1].rarity, 0.0);

    // Failed item contributes to neither table
    assert_eq!(report.stats.value_counts().len(), 2);
    assert_eq!(report.stats.distinct_values("bg"), Some(2));

    assert_eq!(report.summary.requested, 3);
    assert_eq!(report.summary.dispatched, 3);
    assert_eq!(report.summary.fetched, 2);
    assert_eq!(report.summary.failed, 1);
    assert!(!report.summary.cancelled);
}

#[tokio::test]
async fn test_all_fetches_fail_still_completes() {
    let source = Arc::new(StubSource::new());
    let spec = CollectionSpec::new(6, LOCATION).unwrap();

    let report = RarityPipeline::new(source, options(2, 5))
        .run(&spec, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.items.len(), 6);
    assert!(report.scorecards.iter().all(|c| c.rarity == 0.0));
    assert_eq!(report.top.len(), 5);
    let ids: Vec<usize> = report.top.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    assert_eq!(report.summary.failed, 6);
}

#[tokio::test]
async fn test_top_n_larger_than_collection() {
    let source = Arc::new(StubSource::new().ok(0, &[("bg", "red")]).ok(1, &[("bg", "blue")]));
    let spec = CollectionSpec::new(2, LOCATION).unwrap();

    let report = RarityPipeline::new(source, options(4, 5))
        .run(&spec, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.top.len(), 2);
    assert_eq!(report.top[0].rank, 1);
    assert_eq!(report.top[1].rank, 2);
}

#[tokio::test]
async fn test_item_array_dense_under_mixed_outcomes() {
    let mut source = StubSource::new();
    for i in 0..40 {
        source = if i % 3 == 0 {
            source.fail(i)
        } else {
            source.ok(i, &[("bg", if i % 2 == 0 { "red" } else { "blue" })])
        };
    }
    let spec = CollectionSpec::new(40, LOCATION).unwrap();

    let report = RarityPipeline::new(Arc::new(source), options(5, 5))
        .run(&spec, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.items.len(), 40);
    for (i, item) in report.items.iter().enumerate() {
        assert_eq!(item.id, i);
        assert_eq!(item.is_empty(), i % 3 == 0);
    }
    for (_, count) in report.stats.value_counts() {
        assert!(*count <= 40);
    }
    for (_, values) in report.stats.values_in_category() {
        assert!(values.len() <= 40);
    }
    assert!(report.scorecards.iter().all(|c| c.rarity >= 0.0));
}

#[tokio::test]
async fn test_aggregation_independent_of_completion_order() {
    let base = || {
        StubSource::new()
            .ok(0, &[("bg", "red"), ("hat", "cap")])
            .ok(1, &[("bg", "gold"), ("hat", "cap")])
            .ok(2, &[("bg", "red"), ("hat", "crown")])
            .ok(3, &[("bg", "blue")])
    };

    let in_order = Arc::new(base());
    let reversed = Arc::new(
        base()
            .delay(0, Duration::from_millis(60))
            .delay(1, Duration::from_millis(40))
            .delay(2, Duration::from_millis(20)),
    );
    let spec = CollectionSpec::new(4, LOCATION).unwrap();

    let first = RarityPipeline::new(in_order, options(1, 4))
        .run(&spec, CancellationToken::new())
        .await
        .unwrap();
    let second = RarityPipeline::new(reversed, options(4, 4))
        .run(&spec, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(first.stats, second.stats);
    assert_eq!(first.items, second.items);
    assert_eq!(first.scorecards, second.scorecards);
    assert_eq!(first.top, second.top);
}

#[tokio::test]
async fn test_equal_rarity_keeps_id_order() {
    let source = Arc::new(
        StubSource::new()
            .ok(0, &[("bg", "red")])
            .ok(1, &[("bg", "blue")])
            .ok(2, &[("bg", "red")])
            .ok(3, &[("bg", "green")]),
    );
    let spec = CollectionSpec::new(4, LOCATION).unwrap();

    let report = RarityPipeline::new(source, options(3, 4))
        .run(&spec, CancellationToken::new())
        .await
        .unwrap();

    let ids: Vec<usize> = report.top.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![1, 3, 0, 2]);
}

#[tokio::test]
async fn test_category_value_mode_end_to_end() {
    let source = Arc::new(
        StubSource::new()
            .ok(0, &[("background", "none"), ("accessory", "hat")])
            .ok(1, &[("background", "sky"), ("accessory", "none")]),
    );
    let spec = CollectionSpec::new(2, LOCATION).unwrap();

    let mut corrected = options(2, 2);
    corrected.frequency_mode = FrequencyMode::CategoryValue;

    let faithful = RarityPipeline::new(source.clone(), options(2, 2))
        .run(&spec, CancellationToken::new())
        .await
        .unwrap();
    let corrected = RarityPipeline::new(source, corrected)
        .run(&spec, CancellationToken::new())
        .await
        .unwrap();

    // "none": shared count 2 in value mode, 1 per category otherwise
    assert_eq!(faithful.scorecards[0].rarity, 1.0 / 4.0 + 1.0 / 2.0);
    assert_eq!(corrected.scorecards[0].rarity, 1.0 / 2.0 + 1.0 / 2.0);
}

#[tokio::test]
async fn test_hung_fetch_times_out() {
    let source = Arc::new(StubSource::new().ok(0, &[("bg", "red")]).hang(1));
    let spec = CollectionSpec::new(2, LOCATION).unwrap();

    let mut opts = options(2, 2);
    opts.pool.fetch_timeout = Duration::from_millis(50);

    let report = tokio::time::timeout(
        Duration::from_secs(10),
        RarityPipeline::new(source, opts).run(&spec, CancellationToken::new()),
    )
    .await
    .expect("pipeline should not hang")
    .unwrap();

    assert_eq!(report.summary.failed, 1);
    assert!(report.items[1].is_empty());
    assert_eq!(report.scorecards[1].rarity, 0.0);
}

#[tokio::test]
async fn test_cancelled_before_start_dispatches_nothing() {
    let source = Arc::new(three_item_source());
    let spec = CollectionSpec::new(3, LOCATION).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = RarityPipeline::new(source.clone(), options(2, 5))
        .run(&spec, cancel)
        .await
        .unwrap();

    assert!(report.summary.cancelled);
    assert_eq!(report.summary.dispatched, 0);
    assert_eq!(report.summary.skipped(), 3);
    assert_eq!(source.calls(), 0);
    assert_eq!(report.items.len(), 3);
    assert!(report.items.iter().all(|i| i.is_empty()));
}

#[tokio::test]
async fn test_cancel_mid_run_drains_in_flight() {
    let mut source = StubSource::new();
    for i in 0..20 {
        source = source
            .ok(i, &[("bg", "red")])
            .delay(i, Duration::from_millis(50));
    }
    let source = Arc::new(source);
    let spec = CollectionSpec::new(20, LOCATION).unwrap();
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(80)).await;
        trigger.cancel();
    });

    let report = RarityPipeline::new(source.clone(), options(2, 5))
        .run(&spec, cancel)
        .await
        .unwrap();

    assert!(report.summary.cancelled);
    assert!(report.summary.dispatched < 20);
    // Every dispatched job finished and was recorded
    assert_eq!(report.summary.fetched, report.summary.dispatched);
    assert_eq!(source.calls(), report.summary.dispatched);
    assert_eq!(report.items.len(), 20);
    let populated = report.items.iter().filter(|i| !i.is_empty()).count();
    assert_eq!(populated, report.summary.fetched);
}

#[tokio::test]
async fn test_zero_workers_rejected_before_fetching() {
    let source = Arc::new(three_item_source());
    let spec = CollectionSpec::new(3, LOCATION).unwrap();

    let result = RarityPipeline::new(source.clone(), options(0, 5))
        .run(&spec, CancellationToken::new())
        .await;

    assert!(matches!(result, Err(RankerError::Config(_))));
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_pool_emits_one_event_per_job() {
    let source = Arc::new(StubSource::new().ok(0, &[("bg", "red")]).fail(1).ok(2, &[("bg", "blue")]));
    let spec = CollectionSpec::new(3, LOCATION).unwrap();

    let (event_tx, mut event_rx) = mpsc::channel(16);
    let (results_tx, results_rx) = mpsc::channel(4);
    let consumer = tokio::spawn(Aggregator::new(3, FrequencyMode::Value).consume(results_rx));

    let pool = FetchPool::with_events(options(2, 3).pool, source, event_tx);
    let summary = pool
        .run(&spec, results_tx, CancellationToken::new())
        .await
        .unwrap();
    drop(pool);

    let aggregator = consumer.await.unwrap();
    assert_eq!(aggregator.received(), 2);
    assert_eq!(summary.fetched, 2);

    let mut fetched = Vec::new();
    let mut failed = Vec::new();
    while let Some(event) = event_rx.recv().await {
        match event {
            FetchEvent::Fetched { index, worker_id } => {
                assert!(worker_id < 2);
                fetched.push(index);
            }
            FetchEvent::Failed { index, message, .. } => {
                assert!(message.contains("scripted failure"));
                failed.push(index);
            }
        }
    }
    fetched.sort();
    assert_eq!(fetched, vec![0, 2]);
    assert_eq!(failed, vec![1]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_in_flight_fetches_bounded_by_workers() {
    let source = Arc::new(GaugeSource::new(Duration::from_millis(20)));
    let spec = CollectionSpec::new(30, LOCATION).unwrap();

    let report = RarityPipeline::new(source.clone(), options(3, 5))
        .run(&spec, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(source.calls(), 30);
    assert_eq!(source.max_in_flight(), 3);
    assert_eq!(report.summary.fetched, 30);
    assert_eq!(report.items.len(), 30);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_worker_fetches_serially() {
    let source = Arc::new(GaugeSource::new(Duration::from_millis(5)));
    let spec = CollectionSpec::new(10, LOCATION).unwrap();

    RarityPipeline::new(source.clone(), options(1, 5))
        .run(&spec, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(source.calls(), 10);
    assert_eq!(source.max_in_flight(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_more_workers_than_items_never_exceeds_item_count() {
    let source = Arc::new(GaugeSource::new(Duration::from_millis(20)));
    let spec = CollectionSpec::new(2, LOCATION).unwrap();

    RarityPipeline::new(source.clone(), options(8, 5))
        .run(&spec, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(source.calls(), 2);
    assert!(source.max_in_flight() <= 2);
}
