//! Memory-pressure monitoring and adaptive memory-tier ceilings.
//!
//! The monitor consumes pressure signals from an injected broadcast channel.
//! The production binding forwards the host's memory-pressure source and the
//! application low-memory notification into the channel; tests publish
//! synthetic signals.
//!
//! # Behavior
//!
//! - `Warning`: the memory tier's cost ceiling is throttled immediately
//!   (default 0.5x) and restoration of the base ceiling is scheduled after
//!   the restore delay. A newer signal cancels any pending restoration
//!   (cancel-and-reschedule), so overlapping warnings cannot race the timer.
//! - `Critical` / `LowMemory`: the memory tier is cleared synchronously and
//!   the base ceiling restored - no grace period, no residual throttle.
//! - The disk tier is never touched by pressure signals.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cache::config::PressureConfig;
use crate::cache::memory::MemoryCache;

/// A memory-pressure signal consumed by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureSignal {
    /// Host reports pressure back to normal. Informational; no action.
    Normal,
    /// Host reports elevated pressure: throttle the memory ceiling.
    Warning,
    /// Host reports critically low memory: clear the memory tier.
    Critical,
    /// Application-level low-memory notification: clear the memory tier.
    LowMemory,
}

/// Shared monitor state; signal handling is synchronous so transitions can
/// be unit-tested without the channel.
struct PressureState {
    /// Memory tier whose ceiling is managed.
    memory: Arc<MemoryCache>,
    /// Ceiling restored after a throttle expires.
    base_ceiling: u64,
    /// Factor applied to the base ceiling on a warning.
    throttle_factor: f64,
    /// Delay before a throttled ceiling is restored.
    restore_delay: std::time::Duration,
    /// Bumped on every acted-upon signal; a pending restoration only fires
    /// if its generation is still current.
    generation: AtomicU64,
    /// Count of warnings handled.
    warnings: AtomicU64,
    /// Count of critical/low-memory clears handled.
    clears: AtomicU64,
}

impl PressureState {
    fn apply(self: Arc<Self>, signal: PressureSignal) {
        match signal {
            PressureSignal::Normal => {}

            PressureSignal::Warning => {
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                let throttled = (self.base_ceiling as f64 * self.throttle_factor) as u64;

                self.memory.set_cost_ceiling(throttled);
                self.warnings.fetch_add(1, Ordering::Relaxed);

                warn!(
                    ceiling = throttled,
                    base = self.base_ceiling,
                    restore_secs = self.restore_delay.as_secs_f64(),
                    "memory pressure warning, throttling memory tier"
                );

                let state = Arc::clone(&self);
                tokio::spawn(async move {
                    tokio::time::sleep(state.restore_delay).await;

                    // A newer warning or a clear supersedes this restoration
                    if state.generation.load(Ordering::SeqCst) == generation {
                        state.memory.set_cost_ceiling(state.base_ceiling);
                        info!(
                            ceiling = state.base_ceiling,
                            "memory pressure throttle expired, ceiling restored"
                        );
                    }
                });
            }

            PressureSignal::Critical | PressureSignal::LowMemory => {
                self.generation.fetch_add(1, Ordering::SeqCst);
                self.memory.remove_all();
                self.memory.set_cost_ceiling(self.base_ceiling);
                self.clears.fetch_add(1, Ordering::Relaxed);

                warn!(?signal, "critical memory pressure, memory tier cleared");
            }
        }
    }
}

/// Background monitor task driving the memory tier from pressure signals.
pub struct PressureMonitor {
    state: Arc<PressureState>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PressureMonitor {
    /// Start the monitor on the given signal channel.
    ///
    /// The base ceiling restored after throttles is the memory tier's
    /// ceiling at start time.
    pub fn start(
        memory: Arc<MemoryCache>,
        config: PressureConfig,
        mut signals: broadcast::Receiver<PressureSignal>,
    ) -> Self {
        let state = Arc::new(PressureState {
            base_ceiling: memory.cost_ceiling(),
            memory,
            throttle_factor: config.throttle_factor,
            restore_delay: config.restore_delay,
            generation: AtomicU64::new(0),
            warnings: AtomicU64::new(0),
            clears: AtomicU64::new(0),
        });

        let shutdown = CancellationToken::new();
        let task_state = Arc::clone(&state);
        let task_shutdown = shutdown.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_shutdown.cancelled() => {
                        info!("pressure monitor shutting down");
                        break;
                    }
                    received = signals.recv() => match received {
                        Ok(signal) => Arc::clone(&task_state).apply(signal),
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            // Signals are idempotent enough that dropping a
                            // backlog only delays a transition
                            warn!(missed = missed, "pressure monitor lagged behind signal source");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            info!("pressure signal source closed, monitor stopping");
                            break;
                        }
                    },
                }
            }
        });

        Self {
            state,
            shutdown,
            task: Some(task),
        }
    }

    /// Number of warnings handled since start.
    pub fn warnings(&self) -> u64 {
        self.state.warnings.load(Ordering::Relaxed)
    }

    /// Number of critical/low-memory clears handled since start.
    pub fn clears(&self) -> u64 {
        self.state.clears.load(Ordering::Relaxed)
    }

    /// Stop the monitor task.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PressureMonitor {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
