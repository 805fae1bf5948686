//! Mock Hardware Implementations
//!
//! Provides scripted devices for testing without physical hardware.
//! All mock devices use async-safe operations (tokio::time::sleep, not std::thread::sleep).
//!
//! # Available Mocks
//!
//! - `ScriptedSensor` - Replays a script of values, faults and hangs; works as
//!   either a `Potentiometer` or a `Rangefinder`
//! - `RecordingActuators` - Captures every actuator command in order

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::capabilities::{Buzzer, ColorLed, Potentiometer, Rangefinder, StatusLed};
use crate::mapping::{BuzzerCommand, LedColor};
use crate::mode::StatusLedState;

// =============================================================================
// ScriptedSensor - Replayed readings
// =============================================================================

/// One step of a sensor script.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    /// Return this value.
    Value(f64),
    /// Fail with this message.
    Fault(String),
    /// Block for this long before returning the last value.
    Hang(Duration),
}

/// Sensor that replays a script, then keeps returning its last value
///
/// # Example
///
/// ```rust,ignore
/// let sensor = ScriptedSensor::values([2.0, 10.0, 25.0]);
/// assert_eq!(sensor.read_distance_cm().await?, 2.0);
/// ```
pub struct ScriptedSensor {
    script: Mutex<VecDeque<ScriptStep>>,
    last: Mutex<f64>,
    reads: AtomicUsize,
}

impl ScriptedSensor {
    /// Sensor that replays the given steps.
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            script: Mutex::new(steps.into_iter().collect()),
            last: Mutex::new(0.0),
            reads: AtomicUsize::new(0),
        }
    }

    /// Sensor that replays plain values.
    pub fn values(values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(values.into_iter().map(ScriptStep::Value))
    }

    /// Sensor that always returns `value`.
    pub fn constant(value: f64) -> Self {
        Self::values([value])
    }

    /// Number of reads served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    async fn next(&self) -> Result<f64> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match step {
            Some(ScriptStep::Value(value)) => {
                *self.last.lock().unwrap_or_else(|e| e.into_inner()) = value;
                Ok(value)
            }
            Some(ScriptStep::Fault(reason)) => Err(anyhow!(reason)),
            Some(ScriptStep::Hang(duration)) => {
                tokio::time::sleep(duration).await;
                Ok(*self.last.lock().unwrap_or_else(|e| e.into_inner()))
            }
            None => Ok(*self.last.lock().unwrap_or_else(|e| e.into_inner())),
        }
    }
}

#[async_trait]
impl Potentiometer for ScriptedSensor {
    async fn read_percentage(&self) -> Result<f64> {
        self.next().await
    }
}

#[async_trait]
impl Rangefinder for ScriptedSensor {
    async fn read_distance_cm(&self) -> Result<f64> {
        self.next().await
    }
}

// =============================================================================
// RecordingActuators - Captured commands
// =============================================================================

/// One captured actuator command.
#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorEvent {
    /// `set_buzzer` was called.
    Buzzer(BuzzerCommand),
    /// `set_led_hue` was called.
    LedHue(LedColor),
    /// `led_off` was called.
    LedOff,
    /// `set_status_led` was called.
    StatusLed(StatusLedState),
}

/// Actuators that remember every command they receive
#[derive(Default)]
pub struct RecordingActuators {
    events: Mutex<Vec<ActuatorEvent>>,
    fail_buzzer: AtomicBool,
}

impl RecordingActuators {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set_buzzer` call fail.
    pub fn fail_buzzer(&self, fail: bool) {
        self.fail_buzzer.store(fail, Ordering::SeqCst);
    }

    /// All commands in arrival order.
    pub fn events(&self) -> Vec<ActuatorEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Buzzer commands only.
    pub fn buzzer_commands(&self) -> Vec<BuzzerCommand> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ActuatorEvent::Buzzer(cmd) => Some(cmd),
                _ => None,
            })
            .collect()
    }

    /// Hues only.
    pub fn hues(&self) -> Vec<LedColor> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ActuatorEvent::LedHue(color) => Some(color),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ActuatorEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

#[async_trait]
impl Buzzer for RecordingActuators {
    async fn set_buzzer(&self, command: BuzzerCommand) -> Result<()> {
        if self.fail_buzzer.load(Ordering::SeqCst) {
            anyhow::bail!("buzzer PWM unavailable");
        }
        self.push(ActuatorEvent::Buzzer(command));
        Ok(())
    }
}

#[async_trait]
impl ColorLed for RecordingActuators {
    async fn set_led_hue(&self, color: LedColor) -> Result<()> {
        self.push(ActuatorEvent::LedHue(color));
        Ok(())
    }

    async fn led_off(&self) -> Result<()> {
        self.push(ActuatorEvent::LedOff);
        Ok(())
    }
}

#[async_trait]
impl StatusLed for RecordingActuators {
    async fn set_status_led(&self, state: StatusLedState) -> Result<()> {
        self.push(ActuatorEvent::StatusLed(state));
        Ok(())
    }
}
