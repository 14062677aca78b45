//! Failure handling tests
//!
//! These tests verify that:
//! - A hung sampler surfaces `SamplerTimeout`
//! - A hung store call surfaces `StorageError::Timeout`
//! - Pipeline errors reach direct callers unchanged

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use assert_matches::assert_matches;
use system_monitor::{
    error::MonitorError,
    service::MonitorService,
    storage::{StorageBackend, StorageError, TimeoutBackend},
    thresholds::ThresholdTable,
};

use crate::helpers::*;

#[tokio::test(start_paused = true)]
async fn test_hung_sampler_times_out() {
    let sampler = Arc::new(ScriptedSampler::new([10.0]));
    sampler.hanging.store(true, Ordering::SeqCst);

    let service = MonitorService::new(
        Arc::new(ThresholdTable::default()),
        Arc::new(FlakyBackend::new()),
        sampler,
    )
    .with_sampler_timeout(Duration::from_secs(5));

    let result = service.collect().await;
    assert_matches!(result, Err(MonitorError::SamplerTimeout(d)) if d == Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_hung_store_times_out() {
    let flaky = Arc::new(FlakyBackend::new());
    *flaky.find_delay.lock().unwrap() = Some(Duration::from_secs(60));
    let store: Arc<dyn StorageBackend> =
        Arc::new(TimeoutBackend::new(flaky.clone(), Duration::from_secs(10)));

    let service = create_service(store, Arc::new(ScriptedSampler::new([90.0])));

    let result = service.collect().await;
    let err = assert_matches!(result, Err(err) => err);
    assert!(err.is_transient());
    assert_matches!(err, MonitorError::Storage(StorageError::Timeout(_)));

    // the snapshot write completed before the stuck lookup
    assert_eq!(flaky.snapshot_writes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_sampler_error_reaches_caller() {
    let sampler = Arc::new(ScriptedSampler::new([10.0]));
    sampler.failing.store(true, Ordering::SeqCst);
    let service = memory_service(sampler);

    let result = service.current_metrics().await;
    assert_matches!(result, Err(MonitorError::SamplerUnavailable(_)));
}

#[tokio::test]
async fn test_store_error_leaves_no_alert() {
    let store = Arc::new(FlakyBackend::new());
    store.fail_writes.store(true, Ordering::SeqCst);
    let service = create_service(store.clone(), Arc::new(ScriptedSampler::default()));

    let result = service.evaluate_and_persist(&sample(95.0, 95.0, 95.0)).await;
    assert_matches!(
        result,
        Err(MonitorError::Storage(StorageError::ConnectionFailed(_)))
    );

    store.fail_writes.store(false, Ordering::SeqCst);
    assert!(service.get_active_alerts().await.unwrap().is_empty());

    // the store recovers on the next call
    let (_, outcomes) = service
        .evaluate_and_persist(&sample(95.0, 95.0, 95.0))
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(service.get_active_alerts().await.unwrap().len(), 3);
}
