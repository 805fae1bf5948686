//! # Sensor Monitor Core Library
//!
//! Real-time monitor for a rotary potentiometer and an ultrasonic rangefinder.
//! Readings drive a buzzer and a color LED and can be recorded to a per-run
//! session file. The binary (`main.rs`) wires this library to simulated
//! hardware; real drivers plug in through the traits in [`hardware`].
//!
//! ## Crate Structure
//!
//! - **`config`**: Figment-based startup settings (defaults, TOML file, environment).
//! - **`console`**: One status line per reading while monitoring.
//! - **`error`**: The `MonitorError` enum and its recovery policy.
//! - **`hardware`**: Sensor and actuator capability traits, calibration adapters,
//!   hue-to-RGB conversion, mocks and simulated devices.
//! - **`logging`**: `tracing` subscriber setup.
//! - **`mapping`**: Pure distance→buzzer and percentage→hue functions.
//! - **`measurement`**: `SensorReading` and its session row encoding.
//! - **`mode`**: MS / RDM / ORD and the gates derived from them.
//! - **`monitor`**: `MonitorSession`, the per-run context that actuates, records
//!   and reports each reading.
//! - **`scheduler`**: The dual-cadence sampling loop and fault escalation.
//! - **`session`**: The append-only session recorder and retrieval helpers.

pub mod config;
pub mod console;
pub mod error;
pub mod hardware;
pub mod logging;
pub mod mapping;
pub mod measurement;
pub mod mode;
pub mod monitor;
pub mod scheduler;
pub mod session;

pub use error::{AppResult, MonitorError};
pub use mode::Mode;
pub use monitor::MonitorSession;
pub use scheduler::{RunSummary, Scheduler};
