//! Message types for actor communication
//!
//! Commands are request/response messages sent to a specific actor over
//! mpsc, with a oneshot channel for the reply where one is needed.

use tokio::sync::oneshot;

use crate::error::MonitorResult;
use crate::service::CollectionReport;

/// Commands that can be sent to a SchedulerActor
#[derive(Debug)]
pub enum SchedulerCommand {
    /// Run the pipeline immediately (bypassing the interval timer)
    ///
    /// The run is handled by the actor loop itself, so it never overlaps a
    /// scheduled tick.
    RunNow {
        /// Channel to send the result back
        respond_to: oneshot::Sender<MonitorResult<CollectionReport>>,
    },

    /// Delete snapshots past the retention window now
    Cleanup {
        respond_to: oneshot::Sender<MonitorResult<usize>>,
    },

    /// Gracefully shut down the scheduler
    ///
    /// The actor finishes any in-flight tick and then exits.
    Shutdown,
}
