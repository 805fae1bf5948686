//! Console reporter.
//!
//! Prints one status line per reading while monitoring is enabled. The reporter
//! keeps no history; each line depends only on the reading it is given.

use std::io::{self, Write};

use crate::hardware::Rgb;
use crate::mapping::BuzzerCommand;
use crate::measurement::SensorReading;

/// Timestamp layout of console lines.
pub const CONSOLE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Line-oriented status output, `stdout` in the binary.
pub struct ConsoleReporter<W: Write = io::Stdout> {
    out: W,
    enabled: bool,
}

impl<W: Write> ConsoleReporter<W> {
    /// Reporter writing to `out`; a disabled reporter never writes.
    pub fn new(out: W, enabled: bool) -> Self {
        Self { out, enabled }
    }

    /// Whether lines are printed at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Report a potentiometer reading and the color it produced.
    pub fn report_potentiometer(&mut self, reading: &SensorReading, rgb: Rgb) -> io::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        writeln!(
            self.out,
            "Date and Time: {}, Potentiometer %: {}, RGB: {}",
            reading.timestamp.format(CONSOLE_TIMESTAMP_FORMAT),
            reading.value,
            rgb
        )?;
        self.out.flush()
    }

    /// Report a distance reading and the buzzer command it produced.
    pub fn report_distance(
        &mut self,
        reading: &SensorReading,
        command: &BuzzerCommand,
    ) -> io::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let freq = if command.active {
            command.frequency_hz.to_string()
        } else {
            "None".to_string()
        };
        writeln!(
            self.out,
            "Date and Time: {}, Distance: {}, freq: {}",
            reading.timestamp.format(CONSOLE_TIMESTAMP_FORMAT),
            reading.value,
            freq
        )?;
        self.out.flush()
    }

    /// Borrow the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.out
    }
}
