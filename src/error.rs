//! Custom error types for the monitor.
//!
//! `MonitorError` is the single error type shared by the scheduler, the session
//! recorder and the startup path. Using the `thiserror` crate, each kind maps onto
//! one recovery policy:
//!
//! - **`SensorFault`**: one bad, missing or timed-out reading. Absorbed by the
//!   scheduler, which skips the tick.
//! - **`SensorFailure`**: the same sensor faulted too many times in a row. Fatal.
//! - **`Io`**: the session file could not be opened or written.
//! - **`Config`** / **`ConfigLoad`**: invalid settings, caught before the loop starts.
//! - **`Actuator`**: an output adapter rejected a command. Logged and ignored.
//!
//! By using `#[from]`, foreign errors convert with the `?` operator.

use crate::measurement::SensorKind;
use thiserror::Error;

/// Convenience alias for results using the monitor error type.
pub type AppResult<T> = std::result::Result<T, MonitorError>;

#[allow(missing_docs)]
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("{kind} sensor fault: {reason}")]
    SensorFault { kind: SensorKind, reason: String },

    #[error("{kind} sensor failed after {consecutive} consecutive faults")]
    SensorFailure { kind: SensorKind, consecutive: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration validation error: {0}")]
    Config(String),

    #[error("Configuration error: {0}")]
    ConfigLoad(#[from] Box<figment::Error>),

    #[error("Actuator error: {0}")]
    Actuator(String),
}

impl From<figment::Error> for MonitorError {
    fn from(value: figment::Error) -> Self {
        MonitorError::ConfigLoad(Box::new(value))
    }
}

impl MonitorError {
    /// Whether this error must unwind through the shutdown path.
    pub fn is_fatal(&self) -> bool {
        match self {
            MonitorError::SensorFault { .. } | MonitorError::Actuator(_) => false,
            MonitorError::SensorFailure { .. }
            | MonitorError::Io(_)
            | MonitorError::Config(_)
            | MonitorError::ConfigLoad(_) => true,
        }
    }

    /// Process exit status for a fatal error.
    pub fn exit_code(&self) -> i32 {
        match self {
            MonitorError::Config(_) | MonitorError::ConfigLoad(_) => 2,
            _ => 1,
        }
    }
}
