//! Unit supervision.
//!
//! # Responsibilities
//! - Build a unit (fresh connections), run it, rebuild it after a failure
//! - Space restarts with exponential backoff and jitter
//!
//! # Design Decisions
//! - A unit that returns `Ok` has stopped for good (shutdown or end of input)
//! - Backoff resets once a run has stayed up for `HEALTHY_RUN`
//! - Shutdown interrupts both building and the backoff wait

use std::future::Future;
use std::time::{Duration, Instant};

use crate::config::ReconnectConfig;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::resilience::Backoff;
use crate::units::{Unit, UnitError};

/// A run at least this long counts as healthy.
pub const HEALTHY_RUN: Duration = Duration::from_secs(60);

/// How a supervised unit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The unit returned normally.
    Stopped,
    /// Shutdown was requested while building or backing off.
    Shutdown,
    /// `max_attempts` consecutive failures.
    GaveUp,
}

/// Keep unit `U` running until shutdown.
///
/// `build` is called for every (re)start and must open new connections.
pub async fn supervise<U, F, Fut>(shutdown: Shutdown, reconnect: ReconnectConfig, mut build: F) -> Exit
where
    U: Unit,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<U, UnitError>>,
{
    let mut backoff = Backoff::new(reconnect);
    let mut stop = shutdown.subscribe();

    loop {
        if shutdown.is_triggered() {
            return Exit::Shutdown;
        }

        let built = tokio::select! {
            biased;
            _ = stop.recv() => return Exit::Shutdown,
            built = build() => built,
        };

        let started = Instant::now();
        let outcome = match built {
            Ok(unit) => {
                let signal = shutdown.subscribe();
                if shutdown.is_triggered() {
                    return Exit::Shutdown;
                }
                tracing::info!(unit = U::NAME, "Unit started");
                unit.run(signal).await
            }
            Err(e) => Err(e),
        };

        let error = match outcome {
            Ok(()) => {
                tracing::info!(unit = U::NAME, "Unit stopped");
                return Exit::Stopped;
            }
            Err(e) => e,
        };

        if started.elapsed() >= HEALTHY_RUN {
            backoff.reset();
        }
        metrics::record_unit_restart(U::NAME);

        let Some(delay) = backoff.next_delay() else {
            tracing::error!(
                unit = U::NAME,
                attempts = backoff.attempt() - 1,
                error = %error,
                "Unit failed too many times, giving up"
            );
            return Exit::GaveUp;
        };

        tracing::warn!(
            unit = U::NAME,
            error = %error,
            attempt = backoff.attempt(),
            delay_ms = delay.as_millis() as u64,
            "Unit failed, restarting after backoff"
        );

        tokio::select! {
            biased;
            _ = stop.recv() => return Exit::Shutdown,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
