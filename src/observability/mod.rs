//! Observability module
//!
//! Logging and metrics for a running roulette host.

pub mod logging;
pub mod metrics;

pub use logging::{LogFormat, init_logging};
pub use metrics::init_metrics;
