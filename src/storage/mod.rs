//! Storage backends for snapshots and alerts
//!
//! This module provides a trait-based abstraction over the store the
//! pipeline writes samples and alerts to.
//!
//! ## Design
//!
//! - **Trait-based**: `StorageBackend` trait allows swapping implementations
//! - **Async**: All operations are async for compatibility with Tokio actors
//! - **Bounded**: `TimeoutBackend` caps every call so a hung store cannot
//!   stall a tick indefinitely
//!
//! ## Backends
//!
//! - **SQLite** (default): Embedded database with WAL and a small pool
//! - **In-Memory**: No persistence, for tests or `"backend": "none"`
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use system_monitor::storage::{StorageBackend, TimeoutBackend, sqlite::SqliteBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SqliteBackend::new("./system_monitor.db").await?;
//!     let store: Arc<dyn StorageBackend> =
//!         Arc::new(TimeoutBackend::new(Arc::new(backend), Duration::from_secs(10)));
//!     println!("{}", store.get_stats().await?);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod memory;
pub mod schema;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;
pub mod timeout;

pub use backend::{HealthStatus, StorageBackend};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryBackend;
pub use schema::{AlertId, AlertRecord, NewAlert, SnapshotId, SnapshotRecord};
pub use timeout::TimeoutBackend;
