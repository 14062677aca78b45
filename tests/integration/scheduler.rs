//! Scheduler lifecycle tests
//!
//! Time is paused in these tests, so intervals elapse instantly and tick
//! counts are exact.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use system_monitor::actors::{Scheduler, SchedulerOptions};

use crate::helpers::*;

fn options(interval_secs: u64) -> SchedulerOptions {
    SchedulerOptions {
        interval: Duration::from_secs(interval_secs),
        retention: None,
    }
}

#[tokio::test(start_paused = true)]
async fn test_failing_ticks_do_not_stop_the_loop() {
    let sampler = Arc::new(ScriptedSampler::new([90.0]));
    sampler.failing.store(true, Ordering::SeqCst);
    let service = memory_service(sampler.clone());
    let scheduler = Scheduler::new(service.clone(), options(30));

    scheduler.start().await;
    tokio::time::sleep(Duration::from_secs(65)).await;
    assert_eq!(sampler.calls(), 3);
    assert!(scheduler.is_running().await);

    sampler.failing.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(30)).await;
    scheduler.stop().await;

    assert_eq!(sampler.calls(), 4);
    assert_eq!(service.get_active_alerts().await.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_store_failures_are_contained() {
    let sampler = Arc::new(ScriptedSampler::new([50.0]));
    let store = Arc::new(FlakyBackend::new());
    store.fail_writes.store(true, Ordering::SeqCst);
    let scheduler = Scheduler::new(create_service(store.clone(), sampler.clone()), options(10));

    scheduler.start().await;
    tokio::time::sleep(Duration::from_secs(25)).await;
    store.fail_writes.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(10)).await;
    scheduler.stop().await;

    // ticks at 0, 10, 20 failed; 30 succeeded
    assert_eq!(sampler.calls(), 4);
    assert_eq!(store.snapshot_writes.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_start_twice_does_not_double_ticks() {
    let sampler = Arc::new(ScriptedSampler::new([10.0]));
    let scheduler = Scheduler::new(memory_service(sampler.clone()), options(30));

    scheduler.start().await;
    scheduler.start().await;
    assert!(scheduler.is_running().await);

    // let the immediate first tick settle
    tokio::time::sleep(Duration::from_secs(1)).await;
    let before = sampler.calls();
    tokio::time::sleep(Duration::from_secs(300)).await;
    scheduler.stop().await;

    // one loop at 30s yields 10 ticks in 300s; two loops would yield 20
    assert_eq!(sampler.calls() - before, 10);
}

#[tokio::test(start_paused = true)]
async fn test_stop_then_restart() {
    let sampler = Arc::new(ScriptedSampler::new([10.0]));
    let scheduler = Scheduler::new(memory_service(sampler.clone()), options(30));

    scheduler.start().await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    scheduler.stop().await;
    assert!(!scheduler.is_running().await);

    let stopped_at = sampler.calls();
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(sampler.calls(), stopped_at);

    scheduler.start().await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(sampler.calls(), stopped_at + 1);
    scheduler.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_run_now_goes_through_running_loop() {
    let sampler = Arc::new(ScriptedSampler::new([99.0]));
    let scheduler = Scheduler::new(memory_service(sampler.clone()), options(3600));

    scheduler.start().await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    let report = scheduler.run_now().await.unwrap();
    scheduler.stop().await;

    assert!(report.snapshot_id > 0);
    assert_eq!(report.record.cpu.usage_percent, 99.0);
    // the immediate first tick plus the on-demand run
    assert_eq!(sampler.calls(), 2);
}
