//! Configuration System using Figment
//!
//! Startup settings are loaded once, validated, and then treated as immutable for
//! the rest of the run. Configuration is layered from:
//! 1. Built-in defaults
//! 2. A TOML file (`config/monitor.toml` unless another path is given)
//! 3. Environment variables prefixed with `SENSOR_MONITOR_`, nested keys split on `__`
//!
//! # Example
//! ```no_run
//! use sensor_monitor::config::Settings;
//!
//! let settings = Settings::load()?;
//! settings.validate()?;
//! println!("Mode: {}", settings.mode);
//! # Ok::<(), sensor_monitor::error::MonitorError>(())
//! ```
//!
//! Environment example: `SENSOR_MONITOR_CALIBRATION__ULTRASONIC_DIVISOR=58`

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppResult, MonitorError};
use crate::logging::OutputFormat;
use crate::mode::Mode;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/monitor.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "SENSOR_MONITOR_";

/// Top-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Operating mode for this run
    pub mode: Mode,
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Diagnostic output format (pretty, compact, json)
    pub log_format: OutputFormat,
    /// Session file storage
    pub storage: StorageConfig,
    /// Sensor calibration
    pub calibration: CalibrationConfig,
    /// Sampling cadence and fault policy
    pub timing: TimingConfig,
    /// GPIO and ADC channel assignments
    pub pins: PinConfig,
    /// Buzzer PWM settings
    pub buzzer: BuzzerConfig,
}

/// Session file storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory that holds session files
    pub output_dir: PathBuf,
    /// Rows buffered between flushes
    pub flush_every: usize,
    /// Create `output_dir` if it does not exist
    pub create_dir: bool,
}

/// Sensor calibration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Echo microseconds per centimeter. Empirically tuned per module.
    pub ultrasonic_divisor: f64,
}

/// Sampling cadence and fault policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Scheduling quantum; the ultrasonic sensor is sampled every tick
    pub base_tick_ms: u64,
    /// The potentiometer is sampled every N-th tick
    pub potentiometer_every: u32,
    /// Maximum time a single sensor read may take
    pub read_timeout_ms: u64,
    /// Consecutive faults on one sensor that end the run
    pub max_consecutive_faults: u32,
}

/// GPIO (BCM numbering) and ADC channel assignments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    /// Buzzer PWM pin
    pub buzzer: u8,
    /// Ultrasonic echo input
    pub echo: u8,
    /// Ultrasonic trigger output
    pub trigger: u8,
    /// Color LED red, green and blue pins
    pub rgb: [u8; 3],
    /// Status LED pin
    pub status_led: u8,
    /// MCP3008 channel wired to the potentiometer wiper
    pub potentiometer_channel: u8,
}

/// Buzzer PWM settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuzzerConfig {
    /// PWM duty cycle while sounding
    pub duty_cycle_percent: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            log_level: "info".to_string(),
            log_format: OutputFormat::default(),
            storage: StorageConfig::default(),
            calibration: CalibrationConfig::default(),
            timing: TimingConfig::default(),
            pins: PinConfig::default(),
            buzzer: BuzzerConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data"),
            flush_every: 10,
            create_dir: true,
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            ultrasonic_divisor: 79.0,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            base_tick_ms: 100,
            potentiometer_every: 5,
            read_timeout_ms: 100,
            max_consecutive_faults: 3,
        }
    }
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            buzzer: 18,
            echo: 24,
            trigger: 25,
            rgb: [5, 6, 13],
            status_led: 14,
            potentiometer_channel: 0,
        }
    }
}

impl Default for BuzzerConfig {
    fn default() -> Self {
        Self {
            duty_cycle_percent: 10,
        }
    }
}

impl TimingConfig {
    /// Base tick as a duration
    pub fn base_tick(&self) -> Duration {
        Duration::from_millis(self.base_tick_ms)
    }

    /// Sensor read timeout as a duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Settings {
    /// Load from the default file location and environment
    pub fn load() -> AppResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load from a specific file path and environment
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        Ok(Self::figment(path.as_ref()).extract()?)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate settings after loading
    pub fn validate(&self) -> AppResult<()> {
        let mut problems = Vec::new();

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            problems.push(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }

        let divisor = self.calibration.ultrasonic_divisor;
        if !divisor.is_finite() || divisor <= 0.0 {
            problems.push(format!(
                "Invalid ultrasonic_divisor {}. Must be a positive number",
                divisor
            ));
        }

        if self.storage.flush_every == 0 {
            problems.push("storage.flush_every must be at least 1".to_string());
        }

        let timing = &self.timing;
        if timing.base_tick_ms == 0 {
            problems.push("timing.base_tick_ms must be at least 1".to_string());
        }
        if timing.potentiometer_every == 0 {
            problems.push("timing.potentiometer_every must be at least 1".to_string());
        }
        if timing.read_timeout_ms == 0 || timing.read_timeout_ms > timing.base_tick_ms {
            problems.push(format!(
                "timing.read_timeout_ms {} must be between 1 and base_tick_ms ({})",
                timing.read_timeout_ms, timing.base_tick_ms
            ));
        }
        if timing.max_consecutive_faults == 0 {
            problems.push("timing.max_consecutive_faults must be at least 1".to_string());
        }

        if !(1..=100).contains(&self.buzzer.duty_cycle_percent) {
            problems.push(format!(
                "Invalid buzzer duty_cycle_percent {}. Must be 1-100",
                self.buzzer.duty_cycle_percent
            ));
        }

        if self.pins.potentiometer_channel > 7 {
            problems.push(format!(
                "Invalid potentiometer_channel {}. MCP3008 channels are 0-7",
                self.pins.potentiometer_channel
            ));
        }

        let pins = &self.pins;
        let gpio = [
            ("buzzer", pins.buzzer),
            ("echo", pins.echo),
            ("trigger", pins.trigger),
            ("rgb.red", pins.rgb[0]),
            ("rgb.green", pins.rgb[1]),
            ("rgb.blue", pins.rgb[2]),
            ("status_led", pins.status_led),
        ];
        let mut used = HashSet::new();
        for (name, pin) in gpio {
            if !used.insert(pin) {
                problems.push(format!("GPIO {} ({}) is assigned twice", pin, name));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(MonitorError::Config(problems.join("; ")))
        }
    }
}
