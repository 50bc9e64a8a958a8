use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::obs::ExporterMetrics;

use super::job::RefreshJob;

/// What a tick did.
#[derive(Debug)]
pub enum Tick {
    /// A run was started.
    Started(InFlight),
    /// A run was still in flight, so this tick was dropped.
    Skipped,
}

/// A started run. The single-run guard is released when `done` resolves.
#[derive(Debug)]
pub struct InFlight {
    done: JoinHandle<()>,
    run: AbortHandle,
}

impl InFlight {
    pub fn is_finished(&self) -> bool {
        self.done.is_finished()
    }

    /// Wait for the run and its bookkeeping to finish.
    pub async fn wait(self) {
        let _ = self.done.await;
    }

    /// Wait up to `grace`, then cancel the run.
    async fn wait_or_abort(mut self, grace: Duration) {
        if tokio::time::timeout(grace, &mut self.done).await.is_err() {
            tracing::warn!("in-flight refresh did not finish in time, aborting it");
            self.run.abort();
            let _ = self.done.await;
        }
    }
}

/// Runs the refresh job on a fixed period after an initial delay.
///
/// At most one run is in flight at any time. A tick that lands while a run is
/// still going is skipped, not queued.
pub struct Scheduler {
    job: Arc<RefreshJob>,
    metrics: Arc<ExporterMetrics>,
    period: Duration,
    initial_delay: Duration,
    shutdown_grace: Duration,
    running: Arc<Mutex<()>>,
}

impl Scheduler {
    pub fn new(
        job: Arc<RefreshJob>,
        metrics: Arc<ExporterMetrics>,
        period: Duration,
        initial_delay: Duration,
    ) -> Self {
        Self {
            job,
            metrics,
            // interval_at panics on a zero period
            period: period.max(Duration::from_millis(1)),
            initial_delay,
            shutdown_grace: Duration::from_secs(10),
            running: Arc::new(Mutex::new(())),
        }
    }

    /// How long shutdown waits for an in-flight run before aborting it.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Start a run unless one is already in flight.
    pub fn tick(&self) -> Tick {
        let Ok(guard) = Arc::clone(&self.running).try_lock_owned() else {
            tracing::warn!("previous refresh still running, skipping tick");
            self.metrics.refresh_skipped.inc(&[]);
            return Tick::Skipped;
        };

        self.metrics.refresh_runs.inc(&[]);
        let job = Arc::clone(&self.job);
        let metrics = Arc::clone(&self.metrics);

        // The run gets its own task so a panic inside it surfaces as a
        // JoinError instead of tearing down the loop.
        let run = tokio::spawn(async move {
            job.run().await;
        });
        let abort = run.abort_handle();
        let done = tokio::spawn(async move {
            if let Err(e) = run.await {
                if e.is_panic() {
                    tracing::error!("refresh run panicked, next tick will still fire");
                    metrics.refresh_panics.inc(&[]);
                } else {
                    tracing::warn!("refresh run cancelled");
                }
            }
            drop(guard);
        });
        Tick::Started(InFlight { done, run: abort })
    }

    /// Spawn the loop in the background.
    pub fn spawn(self) -> SchedulerHandle {
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(self.run(rx));
        SchedulerHandle { tx, task }
    }

    /// Tick until `shutdown` flips to `true` (or its sender is dropped), then
    /// wait out the in-flight run.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + self.initial_delay, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            period_secs = self.period.as_secs(),
            initial_delay_secs = self.initial_delay.as_secs(),
            "refresh scheduler started"
        );

        let mut in_flight: Option<InFlight> = None;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Tick::Started(handle) = self.tick() {
                        in_flight = Some(handle);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        if let Some(run) = in_flight {
            if !run.is_finished() {
                tracing::info!(
                    grace_secs = self.shutdown_grace.as_secs(),
                    "waiting for in-flight refresh before shutdown"
                );
            }
            run.wait_or_abort(self.shutdown_grace).await;
        }
        tracing::info!("refresh scheduler stopped");
    }
}

/// Owner side of a spawned scheduler.
pub struct SchedulerHandle {
    tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the loop and wait for it to wind down.
    pub async fn shutdown(self) {
        let _ = self.tx.send(true);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "refresh scheduler task failed");
        }
    }
}
