pub mod alerts;
pub mod export;
pub mod health;
pub mod index;
pub mod metrics;
pub mod stats;
