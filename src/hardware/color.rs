//! Hue to RGB conversion for the color LED.
//!
//! Full saturation and value on the six-sector hue wheel, so the LED walks
//! red → yellow → green → cyan → blue → violet as the hue climbs to 300°.

use crate::mapping::{LedColor, MAX_HUE_DEGREES};
use std::fmt;

/// 8-bit duty cycle per LED channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.red, self.green, self.blue)
    }
}

/// Convert a hue to channel duty cycles.
pub fn hue_to_rgb(color: LedColor) -> Rgb {
    let hue = if color.hue_degrees.is_nan() {
        0.0
    } else {
        color.hue_degrees.clamp(0.0, MAX_HUE_DEGREES)
    };
    let sector = hue / 60.0;
    // Rising or falling channel within the sector.
    let x = 1.0 - ((sector % 2.0) - 1.0).abs();

    let (r, g, b) = match sector as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };

    Rgb {
        red: to_channel(r),
        green: to_channel(g),
        blue: to_channel(b),
    }
}

fn to_channel(level: f64) -> u8 {
    (level * 255.0).round() as u8
}
