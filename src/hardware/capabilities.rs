//! Sensor and Actuator Capabilities
//!
//! This module defines the narrow contracts the monitor consumes from sensor drivers
//! and produces to actuator drivers. Each device implements only the capability it
//! actually has:
//!
//! - A potentiometer on an ADC channel implements: `Potentiometer`
//! - An ultrasonic module implements: `Rangefinder`
//! - A PWM buzzer implements: `Buzzer`
//! - An RGB LED implements: `ColorLed`
//! - A plain LED implements: `StatusLed`
//!
//! # Design Philosophy
//!
//! Each capability trait:
//! - Is async (uses #[async_trait])
//! - Is thread-safe (requires Send + Sync)
//! - Uses anyhow::Result for errors
//! - Focuses on ONE thing
//!
//! Sensor reads must return within one base tick or fail. The scheduler enforces
//! this with a timeout, so a driver that hangs is treated exactly like one that
//! returns an error.

use anyhow::Result;
use async_trait::async_trait;

use crate::mapping::{BuzzerCommand, LedColor};
use crate::mode::StatusLedState;

/// Capability: Potentiometer Readout
///
/// # Contract
/// - Returns the knob position as a percentage in [0, 100]
/// - Must return within the read timeout or signal a fault
#[async_trait]
pub trait Potentiometer: Send + Sync {
    /// Read the current knob position
    ///
    /// # Returns
    /// - Ok(percentage) on successful read
    /// - Err on hardware fault
    async fn read_percentage(&self) -> Result<f64>;
}

/// Capability: Distance Readout
///
/// # Contract
/// - Returns distance to the nearest object in centimeters
/// - A missing echo is a fault, never a magic distance value
#[async_trait]
pub trait Rangefinder: Send + Sync {
    /// Measure distance
    ///
    /// # Returns
    /// - Ok(distance_cm) on successful measurement
    /// - Err on hardware fault or missing echo
    async fn read_distance_cm(&self) -> Result<f64>;
}

/// Capability: Tone Output
///
/// The driver owns tone generation, including the on/off timing of a
/// [`BeepPattern::Pulsed`](crate::mapping::BeepPattern::Pulsed) command, until the
/// next command replaces it.
#[async_trait]
pub trait Buzzer: Send + Sync {
    /// Apply a buzzer command
    async fn set_buzzer(&self, command: BuzzerCommand) -> Result<()>;
}

/// Capability: Color Output
#[async_trait]
pub trait ColorLed: Send + Sync {
    /// Show the given hue (the driver converts hue to channel duty cycles)
    async fn set_led_hue(&self, color: LedColor) -> Result<()>;

    /// Turn all channels off
    async fn led_off(&self) -> Result<()>;
}

/// Capability: Status Indicator
///
/// The driver owns blink timing for [`StatusLedState::Blink`].
#[async_trait]
pub trait StatusLed: Send + Sync {
    /// Set the indicator state
    async fn set_status_led(&self, state: StatusLedState) -> Result<()>;
}

// =============================================================================
// Combined Traits (for trait objects)
// =============================================================================

/// Combined trait for the full output side of the monitor
///
/// This trait exists solely to enable trait objects. Implement the individual
/// traits (Buzzer, ColorLed, StatusLed) and get this automatically via blanket impl.
///
/// # Usage
/// ```rust,ignore
/// fn use_outputs(outputs: Arc<dyn Actuators>) { /* ... */ }
/// ```
pub trait Actuators: Buzzer + ColorLed + StatusLed {}

/// Blanket implementation - any type implementing all three traits gets Actuators for free
impl<T: Buzzer + ColorLed + StatusLed> Actuators for T {}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRangefinder(f64);

    #[async_trait]
    impl Rangefinder for FixedRangefinder {
        async fn read_distance_cm(&self) -> Result<f64> {
            Ok(self.0)
        }
    }

    struct DeadPotentiometer;

    #[async_trait]
    impl Potentiometer for DeadPotentiometer {
        async fn read_percentage(&self) -> Result<f64> {
            anyhow::bail!("ADC not responding")
        }
    }

    #[tokio::test]
    async fn test_rangefinder_trait() {
        let sensor = FixedRangefinder(12.5);
        assert_eq!(sensor.read_distance_cm().await.unwrap(), 12.5);
    }

    #[tokio::test]
    async fn test_potentiometer_fault() {
        let sensor = DeadPotentiometer;
        let err = sensor.read_percentage().await.unwrap_err();
        assert!(err.to_string().contains("ADC"));
    }
}
