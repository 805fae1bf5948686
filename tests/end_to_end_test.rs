//! End-to-end scenarios across modes
//!
//! Scripted sensors feed the real scheduler, monitor session and recorder;
//! `RecordingActuators` captures what the hardware would have been told.

use chrono::Local;
use sensor_monitor::config::{Settings, TimingConfig};
use sensor_monitor::hardware::mock::{ActuatorEvent, RecordingActuators, ScriptedSensor};
use sensor_monitor::mapping::{BeepPattern, BuzzerCommand, BEEP_INTERVAL};
use sensor_monitor::measurement::SensorKind;
use sensor_monitor::mode::StatusLedState;
use sensor_monitor::session::{list_sessions, read_session, SessionRecorder};
use sensor_monitor::{Mode, MonitorSession, Scheduler};
use std::sync::Arc;
use tempfile::tempdir;

fn scheduler_for(
    mode: Mode,
    outputs: Arc<RecordingActuators>,
    recorder: Option<SessionRecorder>,
    distances: Vec<f64>,
) -> Scheduler<Vec<u8>> {
    let mut session = MonitorSession::new(mode, outputs, Vec::new());
    if let Some(recorder) = recorder {
        session = session.with_recorder(recorder);
    }
    Scheduler::new(
        session,
        Arc::new(ScriptedSensor::constant(50.0)),
        Arc::new(ScriptedSensor::values(distances)),
        &TimingConfig::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn test_record_and_monitor_distance_sequence() {
    let dir = tempdir().unwrap();
    let outputs = Arc::new(RecordingActuators::new());
    let recorder = SessionRecorder::open(dir.path(), Local::now()).unwrap();
    let mut scheduler = scheduler_for(
        Mode::RecordAndMonitor,
        outputs.clone(),
        Some(recorder),
        vec![2.0, 10.0, 25.0],
    );

    let summary = scheduler.run_ticks(3).await.unwrap();

    let commands = outputs.buzzer_commands();
    assert_eq!(
        commands[0],
        BuzzerCommand {
            frequency_hz: 2000.0,
            active: true,
            beep_pattern: BeepPattern::Pulsed {
                on: BEEP_INTERVAL,
                off: BEEP_INTERVAL,
            },
        }
    );
    assert!(commands[1].active);
    assert_eq!(commands[1].beep_pattern, BeepPattern::Continuous);
    assert!((commands[1].frequency_hz - 1287.5).abs() < 1e-9);
    assert!(!commands[2].active);
    assert_eq!(commands[2].frequency_hz, 0.0);

    let rows = read_session(summary.session.unwrap().path).unwrap();
    let dist: Vec<f64> = rows
        .iter()
        .filter(|r| r.kind == SensorKind::Ultrasonic)
        .map(|r| r.value)
        .collect();
    assert_eq!(dist, vec![2.0, 10.0, 25.0]);

    let console = String::from_utf8(scheduler.session().console().get_ref().clone()).unwrap();
    assert_eq!(console.lines().filter(|l| l.contains("Distance:")).count(), 3);
    assert!(console.contains("freq: 2000"));
    assert!(console.contains("freq: None"));
}

#[tokio::test(start_paused = true)]
async fn test_record_only_is_silent_but_records() {
    let dir = tempdir().unwrap();
    let outputs = Arc::new(RecordingActuators::new());
    let recorder = SessionRecorder::open(dir.path(), Local::now()).unwrap();
    let mut scheduler = scheduler_for(
        Mode::RecordOnly,
        outputs.clone(),
        Some(recorder),
        vec![1.0, 5.0, 12.0, 19.0, 3.0],
    );

    let summary = scheduler.run_ticks(5).await.unwrap();

    assert!(scheduler.session().console().get_ref().is_empty());
    assert!(outputs
        .buzzer_commands()
        .iter()
        .all(|cmd| *cmd == BuzzerCommand::SILENT));
    assert!(outputs.hues().is_empty());
    assert_eq!(
        outputs.events()[0],
        ActuatorEvent::StatusLed(Mode::RecordOnly.status_led_behavior())
    );

    let session = summary.session.unwrap();
    assert_eq!(session.rows, 6);
    assert_eq!(read_session(session.path).unwrap().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_monitor_only_prints_and_drives_led() {
    let outputs = Arc::new(RecordingActuators::new());
    let mut scheduler = scheduler_for(Mode::MonitorOnly, outputs.clone(), None, vec![10.0]);

    let summary = scheduler.run_ticks(6).await.unwrap();
    assert!(summary.session.is_none());

    // Same knob position on both potentiometer ticks: one LED command
    let hues = outputs.hues();
    assert_eq!(hues.len(), 1);
    assert_eq!(hues[0].hue_degrees, 150.0);

    let console = String::from_utf8(scheduler.session().console().get_ref().clone()).unwrap();
    assert_eq!(console.lines().count(), 8);
    assert!(console.contains("Potentiometer %: 50, RGB: (0, 255, 128)"));

    assert_eq!(
        outputs.events().last(),
        Some(&ActuatorEvent::StatusLed(StatusLedState::Off))
    );
}

#[tokio::test]
async fn test_open_from_settings_follows_mode() {
    let dir = tempdir().unwrap();
    let mut settings = Settings::default();
    settings.storage.output_dir = dir.path().join("sessions");

    settings.mode = Mode::MonitorOnly;
    let session =
        MonitorSession::open(&settings, Arc::new(RecordingActuators::new()), Local::now()).unwrap();
    assert!(session.recorder().is_none());
    assert!(!settings.storage.output_dir.exists());

    settings.mode = Mode::RecordOnly;
    let mut session =
        MonitorSession::open(&settings, Arc::new(RecordingActuators::new()), Local::now()).unwrap();
    assert!(session.recorder().is_some());
    session.shutdown().await.unwrap();

    assert_eq!(list_sessions(&settings.storage.output_dir).unwrap().len(), 1);
}

#[tokio::test]
async fn test_unwritable_directory_fails_when_recording() {
    let dir = tempdir().unwrap();
    let mut settings = Settings::default();
    settings.mode = Mode::RecordAndMonitor;
    settings.storage.output_dir = dir.path().join("missing");
    settings.storage.create_dir = false;

    let err = MonitorSession::open(&settings, Arc::new(RecordingActuators::new()), Local::now())
        .err()
        .unwrap();
    assert!(err.is_fatal());
}
