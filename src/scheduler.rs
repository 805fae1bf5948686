//! Dual-cadence sampling loop.
//!
//! One `tokio::time::interval` ticks at the base tick (100 ms by default). Every
//! tick samples the rangefinder; every `potentiometer_every`-th tick (the first
//! tick included) then samples the potentiometer, so both readings of a shared
//! tick carry the same timestamp and the ultrasonic one is always dispatched
//! first.
//!
//! A tick whose reads overrun the period is served late, and the following
//! ticks return to the base-tick grid instead of shifting behind it.
//!
//! # Fault handling
//!
//! Each read runs under `tokio::time::timeout`. A timeout, a driver error or a
//! NaN value is a [`MonitorError::SensorFault`]: it is logged, the sample is
//! skipped and the loop carries on. A [`FaultTracker`] per sensor counts
//! consecutive faults; reaching the limit ends the run with
//! [`MonitorError::SensorFailure`].
//!
//! However the loop ends (shutdown signal, tick budget or fatal error) the
//! [`MonitorSession`] is shut down before `run_*` returns.

use chrono::{DateTime, Local, TimeDelta};
use std::future::Future;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{error::Elapsed, interval_at, timeout, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::TimingConfig;
use crate::error::{AppResult, MonitorError};
use crate::hardware::{Potentiometer, Rangefinder};
use crate::measurement::{SensorKind, SensorReading};
use crate::monitor::MonitorSession;
use crate::session::SessionSummary;

/// Counts consecutive faults of one sensor.
#[derive(Debug, Clone)]
pub struct FaultTracker {
    kind: SensorKind,
    limit: u32,
    consecutive: u32,
}

impl FaultTracker {
    /// Tracker that escalates after `limit` consecutive faults.
    pub fn new(kind: SensorKind, limit: u32) -> Self {
        Self {
            kind,
            limit: limit.max(1),
            consecutive: 0,
        }
    }

    /// A good reading resets the streak.
    pub fn record_success(&mut self) {
        self.consecutive = 0;
    }

    /// Count a fault, failing once the streak reaches the limit.
    pub fn record_fault(&mut self) -> AppResult<()> {
        self.consecutive += 1;
        if self.consecutive >= self.limit {
            Err(MonitorError::SensorFailure {
                kind: self.kind,
                consecutive: self.consecutive,
            })
        } else {
            Ok(())
        }
    }

    /// Current streak length.
    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }
}

/// What a finished run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Base ticks executed
    pub ticks: u64,
    /// Ultrasonic readings dispatched
    pub ultrasonic_samples: u64,
    /// Potentiometer readings dispatched
    pub potentiometer_samples: u64,
    /// Skipped samples across both sensors
    pub faults: u64,
    /// The closed session file, when recording
    pub session: Option<SessionSummary>,
}

/// Drives sampling for one [`MonitorSession`].
pub struct Scheduler<W: Write = io::Stdout> {
    session: MonitorSession<W>,
    potentiometer: Arc<dyn Potentiometer>,
    rangefinder: Arc<dyn Rangefinder>,
    base_tick: Duration,
    potentiometer_every: u64,
    read_timeout: Duration,
    ultrasonic_faults: FaultTracker,
    potentiometer_faults: FaultTracker,
}

impl<W: Write> Scheduler<W> {
    /// Create a scheduler with the given cadence and fault policy.
    pub fn new(
        session: MonitorSession<W>,
        potentiometer: Arc<dyn Potentiometer>,
        rangefinder: Arc<dyn Rangefinder>,
        timing: &TimingConfig,
    ) -> Self {
        Self {
            session,
            potentiometer,
            rangefinder,
            base_tick: timing.base_tick(),
            potentiometer_every: u64::from(timing.potentiometer_every.max(1)),
            read_timeout: timing.read_timeout(),
            ultrasonic_faults: FaultTracker::new(
                SensorKind::Ultrasonic,
                timing.max_consecutive_faults,
            ),
            potentiometer_faults: FaultTracker::new(
                SensorKind::Potentiometer,
                timing.max_consecutive_faults,
            ),
        }
    }

    /// The monitor context.
    pub fn session(&self) -> &MonitorSession<W> {
        &self.session
    }

    /// Run until `shutdown` resolves or a fatal error occurs.
    pub async fn run_until<F>(&mut self, shutdown: F) -> AppResult<RunSummary>
    where
        F: Future<Output = ()>,
    {
        self.run(None, shutdown).await
    }

    /// Run exactly `ticks` base ticks unless a fatal error occurs first.
    pub async fn run_ticks(&mut self, ticks: u64) -> AppResult<RunSummary> {
        self.run(Some(ticks), std::future::pending::<()>()).await
    }

    async fn run<F>(&mut self, budget: Option<u64>, shutdown: F) -> AppResult<RunSummary>
    where
        F: Future<Output = ()>,
    {
        let mut summary = RunSummary::default();

        self.session.start().await;
        let outcome = self.tick_loop(budget, shutdown, &mut summary).await;
        let closed = self.session.shutdown().await;

        match (outcome, closed) {
            (Ok(()), Ok(session)) => {
                summary.session = session;
                info!(
                    ticks = summary.ticks,
                    ultrasonic = summary.ultrasonic_samples,
                    potentiometer = summary.potentiometer_samples,
                    faults = summary.faults,
                    "Run complete"
                );
                Ok(summary)
            }
            (Ok(()), Err(e)) => Err(e),
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    error!(error = %close_err, "Failed to close session after fatal error");
                }
                Err(e)
            }
        }
    }

    async fn tick_loop<F>(
        &mut self,
        budget: Option<u64>,
        shutdown: F,
        summary: &mut RunSummary,
    ) -> AppResult<()>
    where
        F: Future<Output = ()>,
    {
        let started_wall = Local::now();
        let started = Instant::now();
        let mut ticker = interval_at(started, self.base_tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tokio::pin!(shutdown);

        loop {
            if budget.is_some_and(|limit| summary.ticks >= limit) {
                debug!(ticks = summary.ticks, "Tick budget reached");
                return Ok(());
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(ticks = summary.ticks, "Shutdown requested");
                    return Ok(());
                }
                tick_at = ticker.tick() => {
                    let elapsed = TimeDelta::from_std(tick_at.duration_since(started))
                        .unwrap_or(TimeDelta::zero());
                    let timestamp = started_wall + elapsed;
                    self.tick(summary.ticks, timestamp, summary).await?;
                    summary.ticks += 1;
                }
            }
        }
    }

    async fn tick(
        &mut self,
        index: u64,
        timestamp: DateTime<Local>,
        summary: &mut RunSummary,
    ) -> AppResult<()> {
        let distance = timeout(self.read_timeout, self.rangefinder.read_distance_cm()).await;
        if let Some(value) = self.accept(SensorKind::Ultrasonic, distance, summary)? {
            self.session
                .dispatch(SensorReading::new(timestamp, SensorKind::Ultrasonic, value))
                .await?;
            summary.ultrasonic_samples += 1;
        }

        if index % self.potentiometer_every == 0 {
            let percentage =
                timeout(self.read_timeout, self.potentiometer.read_percentage()).await;
            if let Some(value) = self.accept(SensorKind::Potentiometer, percentage, summary)? {
                self.session
                    .dispatch(SensorReading::new(
                        timestamp,
                        SensorKind::Potentiometer,
                        value,
                    ))
                    .await?;
                summary.potentiometer_samples += 1;
            }
        }
        Ok(())
    }

    /// Turn a timed read into a value, or count and log a fault.
    fn accept(
        &mut self,
        kind: SensorKind,
        outcome: Result<anyhow::Result<f64>, Elapsed>,
        summary: &mut RunSummary,
    ) -> AppResult<Option<f64>> {
        let tracker = match kind {
            SensorKind::Ultrasonic => &mut self.ultrasonic_faults,
            SensorKind::Potentiometer => &mut self.potentiometer_faults,
        };

        let reason = match outcome {
            Ok(Ok(value)) if !value.is_nan() => {
                tracker.record_success();
                return Ok(Some(value));
            }
            Ok(Ok(_)) => "reading is NaN".to_string(),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("no reading within {} ms", self.read_timeout.as_millis()),
        };

        let fault = MonitorError::SensorFault { kind, reason };
        summary.faults += 1;
        let escalation = tracker.record_fault();
        warn!(
            sensor = %kind,
            consecutive = tracker.consecutive(),
            error = %fault,
            "Sensor fault; sample skipped"
        );

        if let Err(failure) = escalation {
            error!(error = %failure, "Sensor failure; stopping");
            return Err(failure);
        }
        Ok(None)
    }
}
