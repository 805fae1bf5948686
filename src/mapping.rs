//! Sensor-to-actuator mapping functions.
//!
//! Pure, stateless translations from the latest reading to an output command:
//!
//! - distance → buzzer: silent beyond 20 cm, a continuous tone sweeping from
//!   2 kHz (4 cm) down to 100 Hz (20 cm), and a 2 kHz beep pulsed 0.5 s on /
//!   0.5 s off when closer than 4 cm.
//! - percentage → hue: 0 % is red (0°), 100 % is violet (300°), linear between.
//!
//! Converting hue to PWM channels is the LED adapter's job, see
//! [`crate::hardware::color::hue_to_rgb`].

use std::time::Duration;

/// Closest distance of the continuous-tone band, in cm.
pub const MIN_DISTANCE_CM: f64 = 4.0;
/// Farthest distance that still sounds the buzzer, in cm.
pub const MAX_DISTANCE_CM: f64 = 20.0;
/// Tone at [`MAX_DISTANCE_CM`].
pub const MIN_FREQUENCY_HZ: f64 = 100.0;
/// Tone at [`MIN_DISTANCE_CM`] and for the close-range beep.
pub const MAX_FREQUENCY_HZ: f64 = 2000.0;
/// On and off time of the close-range beep.
pub const BEEP_INTERVAL: Duration = Duration::from_millis(500);
/// Hue reached at 100 %.
pub const MAX_HUE_DEGREES: f64 = 300.0;

/// How an active buzzer sounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BeepPattern {
    /// Steady tone.
    Continuous,
    /// Tone for `on`, silence for `off`, repeating.
    Pulsed {
        /// Time sounding.
        on: Duration,
        /// Time silent.
        off: Duration,
    },
}

/// Buzzer output derived from one distance reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuzzerCommand {
    /// Tone frequency, 0 when inactive.
    pub frequency_hz: f64,
    /// Whether the buzzer sounds at all.
    pub active: bool,
    /// Steady or pulsed.
    pub beep_pattern: BeepPattern,
}

impl BuzzerCommand {
    /// The silent command.
    pub const SILENT: BuzzerCommand = BuzzerCommand {
        frequency_hz: 0.0,
        active: false,
        beep_pattern: BeepPattern::Continuous,
    };
}

/// Color LED output derived from one potentiometer reading.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct LedColor {
    /// Position on the red-to-violet path, in [0, 300].
    pub hue_degrees: f64,
}

/// Map a distance reading to a buzzer command.
///
/// Both band edges (4 cm and 20 cm) belong to the interpolated band. Negative
/// and non-finite distances come out silent; the scheduler never forwards NaN.
pub fn distance_to_buzzer(distance_cm: f64) -> BuzzerCommand {
    if !distance_cm.is_finite() || distance_cm < 0.0 || distance_cm > MAX_DISTANCE_CM {
        return BuzzerCommand::SILENT;
    }

    if distance_cm < MIN_DISTANCE_CM {
        return BuzzerCommand {
            frequency_hz: MAX_FREQUENCY_HZ,
            active: true,
            beep_pattern: BeepPattern::Pulsed {
                on: BEEP_INTERVAL,
                off: BEEP_INTERVAL,
            },
        };
    }

    let proportion = (distance_cm - MIN_DISTANCE_CM) / (MAX_DISTANCE_CM - MIN_DISTANCE_CM);
    BuzzerCommand {
        frequency_hz: MAX_FREQUENCY_HZ - proportion * (MAX_FREQUENCY_HZ - MIN_FREQUENCY_HZ),
        active: true,
        beep_pattern: BeepPattern::Continuous,
    }
}

/// Map a potentiometer percentage to an LED hue, clamping to [0, 100] first.
pub fn percentage_to_hue(percentage: f64) -> LedColor {
    let percentage = if percentage.is_nan() {
        0.0
    } else {
        percentage.clamp(0.0, 100.0)
    };
    LedColor {
        hue_degrees: percentage * (MAX_HUE_DEGREES / 100.0),
    }
}
