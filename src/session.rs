//! Session recording.
//!
//! A session is one append-only text file per run, named after the moment the
//! run started (`data_20230305_142501.txt`). Every reading dispatched while
//! recording is enabled becomes exactly one row (see
//! [`SensorReading::to_line`]).
//!
//! ## Guarantees
//!
//! - **Immutable once finished**: files are created with create-new semantics,
//!   so a previous run's file is never reopened. Two runs starting within the
//!   same second get `-1`, `-2`, ... suffixes.
//! - **Bounded buffering**: rows go through a `BufWriter` that is flushed every
//!   `flush_every` rows.
//! - **Monotonic rows**: a reading older than the last written one is rejected.
//! - **Scoped release**: [`SessionRecorder::close`] flushes and syncs the file;
//!   if it is never called, `Drop` still flushes whatever is buffered.
//!
//! [`list_sessions`] and [`read_session`] are the retrieval-side helpers used by
//! the `sessions` subcommand.

use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::StorageConfig;
use crate::error::{AppResult, MonitorError};
use crate::measurement::SensorReading;

/// Prefix of every session file name.
pub const SESSION_PREFIX: &str = "data_";

/// Extension of every session file name.
pub const SESSION_EXTENSION: &str = "txt";

/// Rows buffered between flushes when no setting is given.
pub const DEFAULT_FLUSH_EVERY: usize = 10;

const MAX_NAME_SUFFIX: u32 = 100;

/// What a closed session left on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Final file location
    pub path: PathBuf,
    /// Rows written
    pub rows: u64,
}

/// Owner of the single open session file of a run.
#[derive(Debug)]
pub struct SessionRecorder {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    flush_every: usize,
    pending: usize,
    rows: u64,
    last_timestamp: Option<DateTime<Local>>,
}

impl SessionRecorder {
    /// Open a new session file in `dir`, named after `start_time`.
    ///
    /// Fails with [`MonitorError::Io`] if the directory does not exist or is not
    /// writable.
    pub fn open(dir: impl AsRef<Path>, start_time: DateTime<Local>) -> AppResult<Self> {
        Self::open_with(dir, start_time, DEFAULT_FLUSH_EVERY)
    }

    /// Open using the storage settings, creating the directory if allowed.
    pub fn from_settings(storage: &StorageConfig, start_time: DateTime<Local>) -> AppResult<Self> {
        if storage.create_dir && !storage.output_dir.exists() {
            fs::create_dir_all(&storage.output_dir)?;
            debug!(dir = %storage.output_dir.display(), "Created session directory");
        }
        Self::open_with(&storage.output_dir, start_time, storage.flush_every)
    }

    /// Open with an explicit flush interval.
    pub fn open_with(
        dir: impl AsRef<Path>,
        start_time: DateTime<Local>,
        flush_every: usize,
    ) -> AppResult<Self> {
        let dir = dir.as_ref();
        let stem = session_stem(start_time);

        for suffix in 0..MAX_NAME_SUFFIX {
            let name = if suffix == 0 {
                format!("{stem}.{SESSION_EXTENSION}")
            } else {
                format!("{stem}-{suffix}.{SESSION_EXTENSION}")
            };
            let path = dir.join(name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    info!(path = %path.display(), "Session file opened");
                    return Ok(Self {
                        path,
                        writer: Some(BufWriter::new(file)),
                        flush_every: flush_every.max(1),
                        pending: 0,
                        rows: 0,
                        last_timestamp: None,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(MonitorError::Io(io::Error::new(
            ErrorKind::AlreadyExists,
            format!(
                "no free session name for {} in {}",
                stem,
                dir.display()
            ),
        )))
    }

    /// Path of the open file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows appended so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Append one reading as a row.
    pub fn append(&mut self, reading: &SensorReading) -> AppResult<()> {
        if let Some(last) = self.last_timestamp {
            if reading.timestamp < last {
                return Err(MonitorError::Io(io::Error::new(
                    ErrorKind::InvalidInput,
                    format!(
                        "reading at {} precedes last row at {}",
                        reading.timestamp, last
                    ),
                )));
            }
        }

        let writer = self.writer.as_mut().ok_or_else(closed_error)?;
        writeln!(writer, "{}", reading.to_line())?;

        self.rows += 1;
        self.pending += 1;
        self.last_timestamp = Some(reading.timestamp);

        if self.pending >= self.flush_every {
            self.flush()?;
        }
        Ok(())
    }

    /// Push buffered rows to the file.
    pub fn flush(&mut self) -> AppResult<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        self.pending = 0;
        Ok(())
    }

    /// Flush, sync and release the file.
    pub fn close(mut self) -> AppResult<SessionSummary> {
        let writer = self.writer.take().ok_or_else(closed_error)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;

        info!(path = %self.path.display(), rows = self.rows, "Session file closed");
        Ok(SessionSummary {
            path: self.path.clone(),
            rows: self.rows,
        })
    }
}

impl Drop for SessionRecorder {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                warn!(path = %self.path.display(), error = %e, "Failed to flush session file on drop");
            }
        }
    }
}

fn closed_error() -> MonitorError {
    MonitorError::Io(io::Error::new(ErrorKind::BrokenPipe, "session file already closed"))
}

fn session_stem(start_time: DateTime<Local>) -> String {
    format!("{SESSION_PREFIX}{}", start_time.format("%Y%m%d_%H%M%S"))
}

/// Whether a file name looks like a session file.
pub fn is_session_file_name(name: &str) -> bool {
    name.starts_with(SESSION_PREFIX)
        && Path::new(name)
            .extension()
            .is_some_and(|ext| ext == SESSION_EXTENSION)
}

/// Session files in `dir`, oldest first.
pub fn list_sessions(dir: impl AsRef<Path>) -> AppResult<Vec<PathBuf>> {
    let mut sessions = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry
            .file_name()
            .to_str()
            .is_some_and(is_session_file_name)
        {
            sessions.push(entry.path());
        }
    }
    sessions.sort();
    Ok(sessions)
}

/// Parse a session file back into readings.
pub fn read_session(path: impl AsRef<Path>) -> AppResult<Vec<SensorReading>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            SensorReading::parse_line(line).map_err(|e| {
                MonitorError::Io(io::Error::new(
                    ErrorKind::InvalidData,
                    format!("{}:{}: {}", path.display(), index + 1, e),
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::SensorKind;
    use chrono::{TimeDelta, TimeZone};
    use tempfile::tempdir;

    fn start() -> DateTime<Local> {
        Local.with_ymd_and_hms(2023, 3, 5, 14, 25, 1).unwrap()
    }

    fn reading(offset_ms: i64, kind: SensorKind, value: f64) -> SensorReading {
        SensorReading::new(start() + TimeDelta::milliseconds(offset_ms), kind, value)
    }

    #[test]
    fn test_file_named_after_start_time() {
        let dir = tempdir().unwrap();
        let recorder = SessionRecorder::open(dir.path(), start()).unwrap();
        assert_eq!(
            recorder.path().file_name().unwrap(),
            "data_20230305_142501.txt"
        );
    }

    #[test]
    fn test_same_second_gets_suffix() {
        let dir = tempdir().unwrap();
        let first = SessionRecorder::open(dir.path(), start()).unwrap();
        let second = SessionRecorder::open(dir.path(), start()).unwrap();

        assert_ne!(first.path(), second.path());
        assert_eq!(
            second.path().file_name().unwrap(),
            "data_20230305_142501-1.txt"
        );
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let err = SessionRecorder::open(dir.path().join("absent"), start()).unwrap_err();
        assert!(matches!(err, MonitorError::Io(_)));
    }

    #[test]
    fn test_from_settings_creates_directory() {
        let dir = tempdir().unwrap();
        let storage = StorageConfig {
            output_dir: dir.path().join("nested/data"),
            flush_every: 2,
            create_dir: true,
        };
        let recorder = SessionRecorder::from_settings(&storage, start()).unwrap();
        assert!(recorder.path().starts_with(&storage.output_dir));
    }

    #[test]
    fn test_rows_round_trip() {
        let dir = tempdir().unwrap();
        let mut recorder = SessionRecorder::open(dir.path(), start()).unwrap();

        let written = vec![
            reading(0, SensorKind::Ultrasonic, 12.5),
            reading(0, SensorKind::Potentiometer, 40.0),
            reading(100, SensorKind::Ultrasonic, 3.17),
        ];
        for r in &written {
            recorder.append(r).unwrap();
        }

        let summary = recorder.close().unwrap();
        assert_eq!(summary.rows, 3);
        assert_eq!(read_session(&summary.path).unwrap(), written);
    }

    #[test]
    fn test_rejects_out_of_order_reading() {
        let dir = tempdir().unwrap();
        let mut recorder = SessionRecorder::open(dir.path(), start()).unwrap();

        recorder
            .append(&reading(500, SensorKind::Ultrasonic, 10.0))
            .unwrap();
        assert!(recorder
            .append(&reading(400, SensorKind::Ultrasonic, 11.0))
            .is_err());
        assert_eq!(recorder.rows(), 1);
    }

    #[test]
    fn test_buffer_flushed_every_n_rows() {
        let dir = tempdir().unwrap();
        let mut recorder = SessionRecorder::open_with(dir.path(), start(), 2).unwrap();
        let path = recorder.path().to_path_buf();

        recorder
            .append(&reading(0, SensorKind::Ultrasonic, 1.0))
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        recorder
            .append(&reading(100, SensorKind::Ultrasonic, 2.0))
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_drop_flushes_buffered_rows() {
        let dir = tempdir().unwrap();
        let path = {
            let mut recorder = SessionRecorder::open_with(dir.path(), start(), 100).unwrap();
            recorder
                .append(&reading(0, SensorKind::Potentiometer, 55.5))
                .unwrap();
            recorder.path().to_path_buf()
        };

        let rows = read_session(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, 55.5);
    }

    #[test]
    fn test_list_sessions_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        let later = start() + TimeDelta::seconds(90);

        SessionRecorder::open(dir.path(), later).unwrap().close().unwrap();
        SessionRecorder::open(dir.path(), start()).unwrap().close().unwrap();
        fs::write(dir.path().join("notes.txt"), "not a session").unwrap();
        fs::write(dir.path().join("data_backup.csv"), "").unwrap();

        let names: Vec<String> = list_sessions(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["data_20230305_142501.txt", "data_20230305_142631.txt"]
        );
    }

    #[test]
    fn test_read_session_reports_bad_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data_20230305_142501.txt");
        fs::write(&path, "2023-03-05T14:25:01.000+00:00 DIST 4\ngarbage\n").unwrap();

        let err = read_session(&path).unwrap_err();
        assert!(err.to_string().contains(":2:"));
    }
}
