//! Metrics collection for `roulette`.
//!
//! Prometheus-compatible counters and gauges for shots, rounds and
//! platform failures. Without an installed recorder every call is a no-op.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::RouletteError;
use crate::game::Shot;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Why an invocation never reached the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Sent outside a room (direct message)
    NoRoom,
    /// Content did not name the command
    NotCommand,
    /// Input line could not be parsed
    Malformed,
}

impl RejectReason {
    const fn label(self) -> &'static str {
        match self {
            Self::NoRoom => "no_room",
            Self::NotCommand => "not_command",
            Self::Malformed => "malformed",
        }
    }
}

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without
/// an HTTP endpoint.
///
/// # Errors
///
/// Returns `RouletteError::Io` if the recorder or HTTP listener
/// cannot be installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), RouletteError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| RouletteError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

/// Registers metric descriptions with the global recorder.
fn describe_metrics() {
    describe_counter!("roulette_shots_total", "Shots fired, by outcome");
    describe_counter!(
        "roulette_rounds_resolved_total",
        "Rounds ended by a hit"
    );
    describe_counter!(
        "roulette_mute_failures_total",
        "Hits whose mute call failed"
    );
    describe_counter!(
        "roulette_rejected_invocations_total",
        "Invocations dropped before reaching the game"
    );
    describe_gauge!(
        "roulette_current_mute_seconds",
        "Mute duration at stake in the active round (0 when no round)"
    );
}

/// Records a resolved shot and updates the at-stake gauge.
#[allow(clippy::cast_precision_loss)]
pub fn record_shot(shot: &Shot) {
    counter!("roulette_shots_total", "outcome" => shot.outcome().as_str()).increment(1);
    match shot {
        Shot::Hit { .. } => {
            counter!("roulette_rounds_resolved_total").increment(1);
            gauge!("roulette_current_mute_seconds").set(0.0);
        }
        Shot::Miss { mute_secs } => {
            gauge!("roulette_current_mute_seconds").set(*mute_secs as f64);
        }
    }
}

/// Records a hit whose mute call failed.
pub fn record_mute_failure() {
    counter!("roulette_mute_failures_total").increment(1);
}

/// Records an invocation dropped by the dispatcher.
pub fn record_rejected(reason: RejectReason) {
    counter!("roulette_rejected_invocations_total", "reason" => reason.label()).increment(1);
}
