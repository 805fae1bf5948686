//! Session rows across a daylight-saving fall-back
//!
//! Runs in its own test binary because it pins the process time zone.

use chrono::{FixedOffset, Local, TimeDelta, TimeZone};
use sensor_monitor::measurement::{SensorKind, SensorReading};
use sensor_monitor::session::{read_session, SessionRecorder};
use tempfile::tempdir;

#[test]
fn test_repeated_hour_stays_ordered_and_exact() {
    std::env::set_var("TZ", "America/New_York");

    // 01:30 EDT, then 01:30 EST one hour later
    let first = FixedOffset::west_opt(4 * 3600)
        .unwrap()
        .with_ymd_and_hms(2023, 11, 5, 1, 30, 0)
        .unwrap()
        .with_timezone(&Local);
    let written = vec![
        SensorReading::new(first, SensorKind::Ultrasonic, 8.0),
        SensorReading::new(first + TimeDelta::minutes(30), SensorKind::Ultrasonic, 9.0),
        SensorReading::new(first + TimeDelta::hours(1), SensorKind::Ultrasonic, 10.0),
    ];

    let dir = tempdir().unwrap();
    let mut recorder = SessionRecorder::open(dir.path(), first).unwrap();
    for reading in &written {
        recorder.append(reading).unwrap();
    }
    let summary = recorder.close().unwrap();

    let stamps: Vec<String> = written
        .iter()
        .map(|r| r.to_line().split(' ').next().unwrap().to_string())
        .collect();
    assert_ne!(stamps[0], stamps[2], "repeated hour printed identically");

    let rows = read_session(&summary.path).unwrap();
    assert_eq!(rows, written);
    assert!(rows.windows(2).all(|pair| pair[0].timestamp < pair[1].timestamp));
}
