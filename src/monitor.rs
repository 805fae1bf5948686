//! The per-run monitor context.
//!
//! [`MonitorSession`] holds everything that used to be process-wide state: the
//! fixed [`Mode`], the actuator outputs, the open session file (if recording)
//! and the console reporter. The scheduler feeds it one [`SensorReading`] at a
//! time through [`MonitorSession::dispatch`].
//!
//! Actuator commands are only sent when they differ from the last command that
//! was accepted, so a steady reading does not re-program the PWM every tick.
//!
//! Error policy:
//! - Actuator failures are logged and the command is retried on the next reading.
//! - A recorder write failure ends the run in ORD. In RDM the recorder is dropped
//!   and the run continues monitoring-only.

use chrono::{DateTime, Local};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::console::ConsoleReporter;
use crate::error::AppResult;
use crate::hardware::{hue_to_rgb, Actuators};
use crate::mapping::{distance_to_buzzer, percentage_to_hue, BuzzerCommand, LedColor};
use crate::measurement::{SensorKind, SensorReading};
use crate::mode::{Mode, StatusLedState};
use crate::session::{SessionRecorder, SessionSummary};

/// Context object for one monitoring run.
pub struct MonitorSession<W: Write = io::Stdout> {
    mode: Mode,
    actuators: Arc<dyn Actuators>,
    recorder: Option<SessionRecorder>,
    console: ConsoleReporter<W>,
    last_buzzer: Option<BuzzerCommand>,
    last_hue: Option<LedColor>,
    recording_degraded: bool,
    shut_down: bool,
}

impl MonitorSession<io::Stdout> {
    /// Build the context from settings, opening a session file when the mode records.
    ///
    /// Failing to open the session file is fatal: recording was requested.
    pub fn open(
        settings: &Settings,
        actuators: Arc<dyn Actuators>,
        start_time: DateTime<Local>,
    ) -> AppResult<Self> {
        let session = Self::new(settings.mode, actuators, io::stdout());
        if settings.mode.recording_enabled() {
            let recorder = SessionRecorder::from_settings(&settings.storage, start_time)?;
            Ok(session.with_recorder(recorder))
        } else {
            Ok(session)
        }
    }
}

impl<W: Write> MonitorSession<W> {
    /// Context without a recorder. Console output goes to `out` when the mode monitors.
    pub fn new(mode: Mode, actuators: Arc<dyn Actuators>, out: W) -> Self {
        Self {
            mode,
            actuators,
            recorder: None,
            console: ConsoleReporter::new(out, mode.monitoring_enabled()),
            last_buzzer: None,
            last_hue: None,
            recording_degraded: false,
            shut_down: false,
        }
    }

    /// Attach the session recorder. Ignored when the mode does not record.
    pub fn with_recorder(mut self, recorder: SessionRecorder) -> Self {
        if self.mode.recording_enabled() {
            self.recorder = Some(recorder);
        }
        self
    }

    /// Active mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The console reporter.
    pub fn console(&self) -> &ConsoleReporter<W> {
        &self.console
    }

    /// The open session file, if any.
    pub fn recorder(&self) -> Option<&SessionRecorder> {
        self.recorder.as_ref()
    }

    /// True after an RDM write failure turned recording off.
    pub fn recording_degraded(&self) -> bool {
        self.recording_degraded
    }

    /// Apply the mode's initial actuator state.
    pub async fn start(&mut self) {
        let status = self.mode.status_led_behavior();
        if let Err(e) = self.actuators.set_status_led(status).await {
            warn!(error = %e, ?status, "Failed to set status LED");
        }

        if !self.mode.monitoring_enabled() {
            self.silence().await;
        }

        info!(
            mode = %self.mode,
            recording = ?self.recorder.as_ref().map(|r| r.path().display().to_string()),
            "Monitor session started"
        );
    }

    /// Map, actuate, record and report one reading.
    pub async fn dispatch(&mut self, reading: SensorReading) -> AppResult<()> {
        match reading.kind {
            SensorKind::Ultrasonic => {
                let command = distance_to_buzzer(reading.value);
                if self.mode.monitoring_enabled() && self.last_buzzer != Some(command) {
                    match self.actuators.set_buzzer(command).await {
                        Ok(()) => self.last_buzzer = Some(command),
                        Err(e) => warn!(error = %e, "Failed to set buzzer"),
                    }
                }
                self.record(&reading)?;
                if let Err(e) = self.console.report_distance(&reading, &command) {
                    debug!(error = %e, "Console write failed");
                }
            }
            SensorKind::Potentiometer => {
                let color = percentage_to_hue(reading.value);
                if self.mode.monitoring_enabled() && self.last_hue != Some(color) {
                    match self.actuators.set_led_hue(color).await {
                        Ok(()) => self.last_hue = Some(color),
                        Err(e) => warn!(error = %e, "Failed to set color LED"),
                    }
                }
                self.record(&reading)?;
                if let Err(e) = self.console.report_potentiometer(&reading, hue_to_rgb(color)) {
                    debug!(error = %e, "Console write failed");
                }
            }
        }
        Ok(())
    }

    fn record(&mut self, reading: &SensorReading) -> AppResult<()> {
        let Some(recorder) = self.recorder.as_mut() else {
            return Ok(());
        };

        let result = recorder.append(reading);
        match result {
            Ok(()) => Ok(()),
            Err(err) if self.mode.monitoring_enabled() => {
                warn!(error = %err, "Session write failed; continuing monitoring-only");
                self.recorder = None;
                self.recording_degraded = true;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Silence outputs and close the session file.
    ///
    /// Safe to call more than once; only the first call does anything.
    pub async fn shutdown(&mut self) -> AppResult<Option<SessionSummary>> {
        if self.shut_down {
            return Ok(None);
        }
        self.shut_down = true;

        self.silence().await;
        if let Err(e) = self.actuators.set_status_led(StatusLedState::Off).await {
            warn!(error = %e, "Failed to turn status LED off");
        }

        let summary = match self.recorder.take() {
            Some(recorder) => Some(recorder.close()?),
            None => None,
        };
        info!(mode = %self.mode, "Monitor session shut down");
        Ok(summary)
    }

    async fn silence(&mut self) {
        match self.actuators.set_buzzer(BuzzerCommand::SILENT).await {
            Ok(()) => self.last_buzzer = Some(BuzzerCommand::SILENT),
            Err(e) => warn!(error = %e, "Failed to silence buzzer"),
        }
        match self.actuators.led_off().await {
            Ok(()) => self.last_hue = None,
            Err(e) => warn!(error = %e, "Failed to turn color LED off"),
        }
    }
}
