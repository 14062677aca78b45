//! Actor-based scheduling
//!
//! The periodic collection loop runs as an independent async task that is
//! controlled through a Tokio command channel.
//!
//! ## Architecture Overview
//!
//! ```text
//!   Scheduler (start / stop / run_now)
//!        │ spawns, sends commands
//!        ▼
//!   SchedulerActor ── tick ──▶ MonitorService::collect
//!        │                         │
//!        │                         ├─ Sampler::sample
//!        │                         ├─ StorageBackend::save_snapshot
//!        │                         └─ AlertEngine::evaluate
//!        └─ cleanup tick ──▶ StorageBackend::cleanup_old_snapshots
//! ```
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: the actor has an mpsc command channel for control messages
//! 2. **Request/Response**: oneshot channels for on-demand runs

pub mod messages;
pub mod scheduler;

pub use scheduler::{RetentionPolicy, Scheduler, SchedulerHandle, SchedulerOptions};
