//! Sensor readings and their session-file row encoding.
//!
//! A row is `<timestamp> <kind> <value>`, one per line, single-space delimited.
//! The timestamp is local wall-clock time with millisecond precision and its UTC
//! offset (`2023-03-05T14:25:01.250+01:00`), so rows stay ordered and unambiguous
//! across a daylight-saving change. `kind` is `POT` or `DIST` and the value is
//! printed in shortest round-trip form so parsing a row yields the exact reading back.

use chrono::{DateTime, DurationRound, Local, TimeDelta};
use std::fmt;
use std::str::FromStr;

/// Timestamp layout used in session rows.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

/// Which sensor produced a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// Rotary potentiometer, percentage in [0, 100].
    Potentiometer,
    /// Ultrasonic rangefinder, distance in centimeters.
    Ultrasonic,
}

impl SensorKind {
    /// Session-file tag for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            SensorKind::Potentiometer => "POT",
            SensorKind::Ultrasonic => "DIST",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for SensorKind {
    type Err = ParseRowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "POT" => Ok(SensorKind::Potentiometer),
            "DIST" => Ok(SensorKind::Ultrasonic),
            other => Err(ParseRowError::UnknownKind(other.to_string())),
        }
    }
}

/// A single immutable sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    /// When the sample was taken (millisecond precision).
    pub timestamp: DateTime<Local>,
    /// Producing sensor.
    pub kind: SensorKind,
    /// Percentage for the potentiometer, centimeters for the rangefinder.
    pub value: f64,
}

/// Reasons a session row fails to parse.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseRowError {
    /// Row did not have exactly three fields.
    #[error("expected 3 fields, found {0}")]
    FieldCount(usize),
    /// Timestamp did not match [`TIMESTAMP_FORMAT`].
    #[error("invalid timestamp '{0}'")]
    Timestamp(String),
    /// Kind was neither `POT` nor `DIST`.
    #[error("unknown sensor kind '{0}'")]
    UnknownKind(String),
    /// Value was not a number.
    #[error("invalid value '{0}'")]
    Value(String),
}

impl SensorReading {
    /// Create a reading, truncating the timestamp to whole milliseconds.
    pub fn new(timestamp: DateTime<Local>, kind: SensorKind, value: f64) -> Self {
        let timestamp = timestamp
            .duration_trunc(TimeDelta::milliseconds(1))
            .unwrap_or(timestamp);
        Self {
            timestamp,
            kind,
            value,
        }
    }

    /// Encode as a session row (without the trailing newline).
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.kind.tag(),
            self.value
        )
    }

    /// Decode a session row.
    pub fn parse_line(line: &str) -> Result<Self, ParseRowError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [ts, kind, value] = fields.as_slice() else {
            return Err(ParseRowError::FieldCount(fields.len()));
        };

        let timestamp = DateTime::parse_from_str(ts, TIMESTAMP_FORMAT)
            .map_err(|_| ParseRowError::Timestamp(ts.to_string()))?
            .with_timezone(&Local);
        let kind = kind.parse()?;
        let value = value
            .parse::<f64>()
            .map_err(|_| ParseRowError::Value(value.to_string()))?;

        Ok(Self {
            timestamp,
            kind,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn at(h: u32, m: u32, s: u32, ms: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2023, 3, 5, h, m, s)
            .unwrap()
            .checked_add_signed(TimeDelta::milliseconds(ms as i64))
            .unwrap()
    }

    fn offset_of(ts: DateTime<Local>) -> String {
        ts.format("%:z").to_string()
    }

    #[test]
    fn line_layout() {
        let ts = at(14, 25, 1, 250);
        let reading = SensorReading::new(ts, SensorKind::Ultrasonic, 12.5);
        assert_eq!(
            reading.to_line(),
            format!("2023-03-05T14:25:01.250{} DIST 12.5", offset_of(ts))
        );

        let ts = at(9, 0, 0, 0);
        let pot = SensorReading::new(ts, SensorKind::Potentiometer, 100.0);
        assert_eq!(
            pot.to_line(),
            format!("2023-03-05T09:00:00.000{} POT 100", offset_of(ts))
        );
    }

    #[test]
    fn offset_keeps_repeated_wall_clock_hour_apart() {
        // 01:30 occurs twice when New York leaves daylight time
        let edt = FixedOffset::west_opt(4 * 3600).unwrap();
        let first = edt
            .with_ymd_and_hms(2023, 11, 5, 1, 30, 0)
            .unwrap()
            .with_timezone(&Local);
        let second = first + TimeDelta::hours(1);

        let a = SensorReading::new(first, SensorKind::Ultrasonic, 5.0);
        let b = SensorReading::new(second, SensorKind::Ultrasonic, 6.0);
        assert_ne!(a.to_line().split(' ').next(), b.to_line().split(' ').next());
        assert_eq!(SensorReading::parse_line(&a.to_line()).unwrap(), a);
        assert_eq!(SensorReading::parse_line(&b.to_line()).unwrap(), b);
    }

    #[test]
    fn foreign_offset_parses_to_same_instant() {
        let parsed = SensorReading::parse_line("2023-03-05T14:25:01.250+05:30 POT 7").unwrap();
        let expected = FixedOffset::east_opt(5 * 3600 + 1800)
            .unwrap()
            .with_ymd_and_hms(2023, 3, 5, 14, 25, 1)
            .unwrap()
            + TimeDelta::milliseconds(250);
        assert_eq!(parsed.timestamp, expected);
    }

    #[test]
    fn parse_recovers_reading() {
        let reading = SensorReading::new(at(14, 25, 1, 999), SensorKind::Potentiometer, 33.33);
        let parsed = SensorReading::parse_line(&reading.to_line()).unwrap();
        assert_eq!(parsed, reading);
    }

    #[test]
    fn sub_millisecond_precision_is_dropped() {
        let ts = at(14, 25, 1, 100) + TimeDelta::microseconds(789);
        let reading = SensorReading::new(ts, SensorKind::Ultrasonic, 4.0);
        assert_eq!(reading.timestamp, at(14, 25, 1, 100));
    }

    #[test]
    fn parse_rejects_malformed_rows() {
        assert_eq!(
            SensorReading::parse_line("2023-03-05T14:25:01.250+00:00 DIST"),
            Err(ParseRowError::FieldCount(2))
        );
        assert!(matches!(
            SensorReading::parse_line("yesterday DIST 4"),
            Err(ParseRowError::Timestamp(_))
        ));
        assert!(matches!(
            SensorReading::parse_line("2023-03-05T14:25:01.250+00:00 TEMP 4"),
            Err(ParseRowError::UnknownKind(_))
        ));
        assert!(matches!(
            SensorReading::parse_line("2023-03-05T14:25:01.250+00:00 POT abc"),
            Err(ParseRowError::Value(_))
        ));
    }
}
