//! Simulated devices for running the monitor without a GPIO header.
//!
//! The simulated primitives sit *below* the raw-signal adapters, so a simulated
//! run still goes through [`EchoRangefinder`](super::adapter::EchoRangefinder)
//! calibration and [`AdcPotentiometer`](super::adapter::AdcPotentiometer)
//! scaling exactly like real hardware would.

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::adapter::{AdcChannel, EchoTimer};
use super::capabilities::{Buzzer, ColorLed, StatusLed};
use super::color::hue_to_rgb;
use crate::config::{BuzzerConfig, PinConfig, Settings};
use crate::mapping::{BuzzerCommand, LedColor};
use crate::mode::StatusLedState;

/// Triangle wave in [0, 1] with the given period.
fn triangle(elapsed: Duration, period: Duration) -> f64 {
    let phase = (elapsed.as_secs_f64() / period.as_secs_f64()).fract();
    1.0 - (2.0 * phase - 1.0).abs()
}

/// Knob slowly swept from 0 % to 100 % and back.
pub struct SimulatedAdc {
    started: Instant,
    period: Duration,
}

impl SimulatedAdc {
    /// Sweep with a full cycle every `period`.
    pub fn new(period: Duration) -> Self {
        Self {
            started: Instant::now(),
            period,
        }
    }
}

impl Default for SimulatedAdc {
    fn default() -> Self {
        Self::new(Duration::from_secs(20))
    }
}

#[async_trait]
impl AdcChannel for SimulatedAdc {
    async fn read_fraction(&self) -> Result<f64> {
        Ok(triangle(self.started.elapsed(), self.period))
    }
}

/// Object drifting between `near_cm` and `far_cm`, reported as echo time.
pub struct SimulatedEcho {
    started: Instant,
    period: Duration,
    near_cm: f64,
    far_cm: f64,
    divisor: f64,
}

impl SimulatedEcho {
    /// Simulate an echo for a module calibrated with `divisor` µs/cm.
    pub fn new(divisor: f64) -> Self {
        Self {
            started: Instant::now(),
            period: Duration::from_secs(12),
            near_cm: 2.0,
            far_cm: 30.0,
            divisor,
        }
    }
}

#[async_trait]
impl EchoTimer for SimulatedEcho {
    async fn measure_echo_us(&self) -> Result<f64> {
        let level = triangle(self.started.elapsed(), self.period);
        let distance_cm = self.near_cm + level * (self.far_cm - self.near_cm);
        Ok(distance_cm * self.divisor)
    }
}

/// PWM drive for the buzzer pin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuzzerPwm {
    /// GPIO pin carrying the PWM signal
    pub pin: u8,
    /// Carrier frequency, 0 when silent
    pub frequency_hz: f64,
    /// Duty cycle, 0 when silent
    pub duty_cycle_percent: u8,
}

/// Actuators that only emit `debug!` events for the configured pins.
#[derive(Debug, Clone, Default)]
pub struct LoggingActuators {
    pins: PinConfig,
    buzzer: BuzzerConfig,
}

impl LoggingActuators {
    /// Actuators wired as `pins`, sounding the buzzer at `buzzer` duty.
    pub fn new(pins: PinConfig, buzzer: BuzzerConfig) -> Self {
        Self { pins, buzzer }
    }

    /// Actuators wired as configured.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.pins.clone(), settings.buzzer.clone())
    }

    /// PWM output a buzzer command resolves to.
    pub fn buzzer_pwm(&self, command: &BuzzerCommand) -> BuzzerPwm {
        if command.active {
            BuzzerPwm {
                pin: self.pins.buzzer,
                frequency_hz: command.frequency_hz,
                duty_cycle_percent: self.buzzer.duty_cycle_percent,
            }
        } else {
            BuzzerPwm {
                pin: self.pins.buzzer,
                frequency_hz: 0.0,
                duty_cycle_percent: 0,
            }
        }
    }
}

#[async_trait]
impl Buzzer for LoggingActuators {
    async fn set_buzzer(&self, command: BuzzerCommand) -> Result<()> {
        let pwm = self.buzzer_pwm(&command);
        debug!(
            pin = pwm.pin,
            frequency_hz = pwm.frequency_hz,
            duty_cycle_percent = pwm.duty_cycle_percent,
            pattern = ?command.beep_pattern,
            "buzzer"
        );
        Ok(())
    }
}

#[async_trait]
impl ColorLed for LoggingActuators {
    async fn set_led_hue(&self, color: LedColor) -> Result<()> {
        debug!(
            pins = ?self.pins.rgb,
            hue = color.hue_degrees,
            rgb = %hue_to_rgb(color),
            "color LED"
        );
        Ok(())
    }

    async fn led_off(&self) -> Result<()> {
        debug!(pins = ?self.pins.rgb, "color LED off");
        Ok(())
    }
}

#[async_trait]
impl StatusLed for LoggingActuators {
    async fn set_status_led(&self, state: StatusLedState) -> Result<()> {
        debug!(pin = self.pins.status_led, ?state, "status LED");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::adapter::EchoRangefinder;
    use crate::hardware::capabilities::Rangefinder;
    use crate::mapping::{distance_to_buzzer, percentage_to_hue};

    #[test]
    fn triangle_wave_shape() {
        let period = Duration::from_secs(10);
        assert_eq!(triangle(Duration::ZERO, period), 0.0);
        assert_eq!(triangle(Duration::from_secs(5), period), 1.0);
        assert!((triangle(Duration::from_millis(2500), period) - 0.5).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_echo_stays_in_span() {
        let sensor = EchoRangefinder::new(SimulatedEcho::new(79.0), 79.0);
        for _ in 0..30 {
            let d = sensor.read_distance_cm().await.unwrap();
            assert!((2.0..=30.0).contains(&d), "distance {d} out of span");
            tokio::time::advance(Duration::from_millis(700)).await;
        }
    }

    #[test]
    fn sounding_buzzer_uses_configured_duty() {
        let mut settings = Settings::default();
        settings.pins.buzzer = 12;
        settings.buzzer.duty_cycle_percent = 35;
        let outputs = LoggingActuators::from_settings(&settings);

        let command = distance_to_buzzer(10.0);
        assert_eq!(
            outputs.buzzer_pwm(&command),
            BuzzerPwm {
                pin: 12,
                frequency_hz: command.frequency_hz,
                duty_cycle_percent: 35,
            }
        );
    }

    #[test]
    fn silent_buzzer_is_driven_low() {
        let outputs = LoggingActuators::from_settings(&Settings::default());
        let pwm = outputs.buzzer_pwm(&BuzzerCommand::SILENT);
        assert_eq!(pwm.pin, 18);
        assert_eq!(pwm.frequency_hz, 0.0);
        assert_eq!(pwm.duty_cycle_percent, 0);
        assert_eq!(outputs.buzzer_pwm(&distance_to_buzzer(25.0)), pwm);
    }

    #[tokio::test]
    async fn logging_actuators_accept_every_command() {
        let outputs = LoggingActuators::default();
        outputs.set_buzzer(distance_to_buzzer(2.0)).await.unwrap();
        outputs.set_led_hue(percentage_to_hue(50.0)).await.unwrap();
        outputs.led_off().await.unwrap();
        outputs.set_status_led(StatusLedState::On).await.unwrap();
    }
}
