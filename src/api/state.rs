//! API shared state

use std::sync::Arc;

use crate::actors::Scheduler;
use crate::service::MonitorService;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Pipeline and queries
    pub service: Arc<MonitorService>,

    /// Periodic loop, for status reporting
    pub scheduler: Arc<Scheduler>,
}

impl ApiState {
    pub fn new(service: Arc<MonitorService>, scheduler: Arc<Scheduler>) -> Self {
        Self { service, scheduler }
    }
}
