//! SchedulerActor - Runs the collection pipeline at a fixed cadence
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → MonitorService::collect → log summary
//!     ↑
//!     └─── Commands (RunNow, Cleanup, Shutdown)
//! ```
//!
//! Tick bodies run inside the actor loop, so ticks never overlap each other
//! or an on-demand run, and a `Shutdown` is only seen once the in-flight
//! tick has finished. Missed ticks are skipped rather than replayed.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior, interval, interval_at};
use tracing::{debug, error, info, instrument, warn};

use crate::error::MonitorResult;
use crate::service::{CollectionReport, MonitorService};

use super::messages::SchedulerCommand;

/// How long snapshots are kept and how often old ones are purged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub retention_days: u32,
    pub cleanup_interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Period between ticks
    pub interval: Duration,

    /// `None` disables snapshot cleanup
    pub retention: Option<RetentionPolicy>,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            retention: None,
        }
    }
}

fn ticker(period: Duration, immediate: bool) -> Interval {
    let mut ticker = if immediate {
        interval(period)
    } else {
        interval_at(tokio::time::Instant::now() + period, period)
    };
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Actor that owns the periodic collection loop
pub struct SchedulerActor {
    service: Arc<MonitorService>,
    options: SchedulerOptions,
    command_rx: mpsc::Receiver<SchedulerCommand>,
}

impl SchedulerActor {
    pub fn new(
        service: Arc<MonitorService>,
        options: SchedulerOptions,
        command_rx: mpsc::Receiver<SchedulerCommand>,
    ) -> Self {
        Self {
            service,
            options,
            command_rx,
        }
    }

    /// Run the actor's main loop
    ///
    /// This is the entry point for the actor. It runs until:
    /// - A Shutdown command is received
    /// - The command channel is closed
    #[instrument(skip(self), fields(interval = ?self.options.interval))]
    pub async fn run(mut self) {
        debug!("starting scheduler actor");

        let mut collect_ticker = ticker(self.options.interval, true);

        // the cleanup arm is disabled when there is no retention policy
        let retention = self.options.retention;
        let mut cleanup_ticker = retention.map(|r| ticker(r.cleanup_interval, false));

        loop {
            tokio::select! {
                // a queued Shutdown wins over a due tick
                biased;

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        SchedulerCommand::RunNow { respond_to } => {
                            debug!("received RunNow command");
                            let result = self.service.collect().await;
                            let _ = respond_to.send(result);
                        }

                        SchedulerCommand::Cleanup { respond_to } => {
                            let result = match retention {
                                Some(policy) => self.cleanup(policy).await,
                                None => Ok(0),
                            };
                            let _ = respond_to.send(result);
                        }

                        SchedulerCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                _ = collect_ticker.tick() => {
                    self.tick().await;
                }

                _ = async { cleanup_ticker.as_mut()?.tick().await; Some(()) }, if cleanup_ticker.is_some() => {
                    if let Some(policy) = retention
                        && let Err(e) = self.cleanup(policy).await
                    {
                        error!("snapshot cleanup failed: {}", e);
                    }
                }

                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        debug!("scheduler actor stopped");
    }

    /// One scheduled run; failures are logged and contained
    async fn tick(&self) {
        match self.service.collect().await {
            Ok(report) => log_report(&report),
            Err(e) if e.is_transient() => warn!("collection tick failed: {}", e),
            Err(e) => error!("collection tick failed: {}", e),
        }
    }

    async fn cleanup(&self, policy: RetentionPolicy) -> MonitorResult<usize> {
        let deleted = self.service.cleanup_snapshots(policy.retention_days).await?;
        if deleted > 0 {
            info!(
                "removed {} snapshots older than {} days",
                deleted, policy.retention_days
            );
        }
        Ok(deleted)
    }
}

fn log_report(report: &CollectionReport) {
    info!(
        "collected metrics: cpu {:.1}%, memory {:.1}%, {} new alert(s)",
        report.record.cpu.usage_percent,
        report.record.memory.usage_percent,
        report.created_count()
    );
}

/// Handle for controlling a SchedulerActor
///
/// This handle provides a typed API for sending commands to the actor.
/// It can be cloned and shared across tasks.
#[derive(Clone)]
pub struct SchedulerHandle {
    sender: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// Spawn a new scheduler actor
    ///
    /// This creates the actor, spawns it as a tokio task, and returns a
    /// handle together with the task's join handle.
    pub fn spawn(service: Arc<MonitorService>, options: SchedulerOptions) -> (Self, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = SchedulerActor::new(service, options, cmd_rx);
        let task = tokio::spawn(actor.run());

        (Self { sender: cmd_tx }, task)
    }

    /// Run the pipeline now, outside the interval timer
    pub async fn run_now(&self) -> Result<CollectionReport> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::RunNow { respond_to: tx })
            .await
            .context("failed to send RunNow command")?;

        let report = rx.await.context("failed to receive response")??;
        Ok(report)
    }

    /// Purge snapshots past the retention window now
    pub async fn cleanup(&self) -> Result<usize> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::Cleanup { respond_to: tx })
            .await
            .context("failed to send Cleanup command")?;

        let deleted = rx.await.context("failed to receive response")??;
        Ok(deleted)
    }

    /// Gracefully shut down the scheduler
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(SchedulerCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}

struct Running {
    handle: SchedulerHandle,
    task: JoinHandle<()>,
}

impl Running {
    async fn stop(self) {
        if let Err(e) = self.handle.shutdown().await {
            debug!("scheduler already gone: {:#}", e);
        }
        if let Err(e) = self.task.await {
            error!("scheduler task ended abnormally: {}", e);
        }
    }
}

/// Owner of the collection loop
///
/// At most one loop runs per `Scheduler`. Calling `start` while running
/// replaces the loop instead of adding a second one.
pub struct Scheduler {
    service: Arc<MonitorService>,
    options: SchedulerOptions,
    running: Mutex<Option<Running>>,
}

impl Scheduler {
    pub fn new(service: Arc<MonitorService>, options: SchedulerOptions) -> Self {
        Self {
            service,
            options,
            running: Mutex::new(None),
        }
    }

    pub fn options(&self) -> SchedulerOptions {
        self.options
    }

    /// Start the loop, stopping a previous one first
    #[instrument(skip(self))]
    pub async fn start(&self) {
        let mut running = self.running.lock().await;

        if let Some(previous) = running.take() {
            debug!("replacing running scheduler");
            previous.stop().await;
        }

        let (handle, task) = SchedulerHandle::spawn(self.service.clone(), self.options);
        *running = Some(Running { handle, task });

        info!(
            "scheduler started, collecting every {}s",
            self.options.interval.as_secs()
        );
    }

    /// Stop the loop after its in-flight tick; no tick runs afterwards
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        let previous = self.running.lock().await.take();

        if let Some(previous) = previous {
            previous.stop().await;
            info!("scheduler stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.running
            .lock()
            .await
            .as_ref()
            .is_some_and(|r| !r.task.is_finished())
    }

    /// Run the pipeline on demand
    ///
    /// Goes through the running loop when there is one, otherwise straight
    /// to the service. Either way the run is serialized with scheduled ticks.
    pub async fn run_now(&self) -> Result<CollectionReport> {
        let handle = self.running.lock().await.as_ref().map(|r| r.handle.clone());

        match handle {
            Some(handle) => handle.run_now().await,
            None => Ok(self.service.collect().await?),
        }
    }
}
