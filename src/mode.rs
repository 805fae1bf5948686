//! Operating modes.
//!
//! The mode is chosen once at startup and never changes during a run. Each mode
//! answers three independent questions:
//!
//! | Mode | monitoring | recording | status LED       |
//! |------|------------|-----------|------------------|
//! | MS   | yes        | no        | off              |
//! | RDM  | yes        | yes       | solid on         |
//! | ORD  | no         | yes       | blink 1 s / 1 s  |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Half-period of the status LED blink in record-only mode.
pub const STATUS_BLINK_INTERVAL: Duration = Duration::from_secs(1);

/// Process-lifetime operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Mode {
    /// MS: actuators and console follow the sensors, nothing is recorded.
    #[default]
    MonitorOnly,
    /// RDM: everything MS does, plus every sample is recorded.
    RecordAndMonitor,
    /// ORD: samples are recorded, buzzer, color LED and console stay quiet.
    RecordOnly,
}

/// How the status LED is driven for a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLedState {
    /// LED dark.
    Off,
    /// LED lit continuously.
    On,
    /// LED toggles with the given on/off half-period.
    Blink {
        /// Time lit, then time dark.
        interval: Duration,
    },
}

impl Mode {
    /// Short code used on the command line and in configuration.
    pub fn code(self) -> &'static str {
        match self {
            Mode::MonitorOnly => "MS",
            Mode::RecordAndMonitor => "RDM",
            Mode::RecordOnly => "ORD",
        }
    }

    /// Actuators and console reporter are live.
    pub fn monitoring_enabled(self) -> bool {
        matches!(self, Mode::MonitorOnly | Mode::RecordAndMonitor)
    }

    /// A session file is opened and every sample is appended.
    pub fn recording_enabled(self) -> bool {
        matches!(self, Mode::RecordAndMonitor | Mode::RecordOnly)
    }

    /// Status LED behavior for the whole run.
    pub fn status_led_behavior(self) -> StatusLedState {
        match self {
            Mode::MonitorOnly => StatusLedState::Off,
            Mode::RecordAndMonitor => StatusLedState::On,
            Mode::RecordOnly => StatusLedState::Blink {
                interval: STATUS_BLINK_INTERVAL,
            },
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ms" | "monitor" | "monitor-only" => Ok(Mode::MonitorOnly),
            "rdm" | "record-and-monitor" => Ok(Mode::RecordAndMonitor),
            "ord" | "record" | "record-only" => Ok(Mode::RecordOnly),
            other => Err(format!(
                "Invalid mode '{}'. Must be one of: MS, RDM, ORD",
                other
            )),
        }
    }
}

impl TryFrom<String> for Mode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.code().to_string()
    }
}
