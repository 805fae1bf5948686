//! Hardware Abstractions
//!
//! Sensor and actuator contracts, the raw-signal adapters that apply calibration,
//! the LED color conversion, and mock/simulated devices.

pub mod adapter;
pub mod capabilities;
pub mod color;
pub mod mock;
pub mod simulated;

pub use adapter::{AdcChannel, AdcPotentiometer, EchoRangefinder, EchoTimer};
pub use capabilities::{Actuators, Buzzer, ColorLed, Potentiometer, Rangefinder, StatusLed};
pub use color::{hue_to_rgb, Rgb};
