//! Rolling Logger
//!
//! File logger for the questline client. Records go to stderr and to one
//! file per day under the log directory; only the newest `max_files` daily
//! files are kept. The most recent lines are also held in a circular buffer
//! so the app can show them without touching the filesystem.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use chrono::{Local, NaiveDate};
use thiserror::Error;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Daily files kept on disk before the oldest is removed
pub const DEFAULT_MAX_FILES: usize = 7;
/// Lines kept in the in-memory buffer
pub const DEFAULT_BUFFER_LINES: usize = 500;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("logger already initialized")]
    AlreadyInitialized,
    #[error("logger not initialized")]
    NotInitialized,
    #[error("failed to install subscriber: {0}")]
    Subscriber(String),
}

static WRITER: OnceLock<RollingFileWriter> = OnceLock::new();

/// Install the global subscriber writing to `log_dir`
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<(), LoggerError> {
    init_logger_with(log_dir, app_name, DEFAULT_MAX_FILES, DEFAULT_BUFFER_LINES)
}

/// Same as [`init_logger`] with explicit retention limits
pub fn init_logger_with(
    log_dir: impl AsRef<Path>,
    app_name: &str,
    max_files: usize,
    buffer_lines: usize,
) -> Result<(), LoggerError> {
    if WRITER.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }

    let writer = RollingFileWriter::new(log_dir, app_name, max_files, buffer_lines)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer.clone()),
        )
        .try_init()
        .map_err(|e| LoggerError::Subscriber(e.to_string()))?;

    WRITER.set(writer).map_err(|_| LoggerError::AlreadyInitialized)
}

/// Log an info line through the installed logger
pub fn info(message: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    tracing::info!(target: "rolling_logger", "{message}");
    Ok(())
}

/// Log an error line through the installed logger
pub fn error(message: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    tracing::error!(target: "rolling_logger", "{message}");
    Ok(())
}

/// Snapshot of the circular buffer, oldest line first
pub fn recent_lines() -> Vec<String> {
    WRITER
        .get()
        .map(RollingFileWriter::recent_lines)
        .unwrap_or_default()
}

fn ensure_initialized() -> Result<(), LoggerError> {
    if WRITER.get().is_some() {
        Ok(())
    } else {
        Err(LoggerError::NotInitialized)
    }
}

// ========================
// Writer
// ========================

struct Inner {
    dir: PathBuf,
    app_name: String,
    max_files: usize,
    capacity: usize,
    current: Option<(NaiveDate, File)>,
    recent: VecDeque<String>,
}

/// Shared handle to the daily log files and the line buffer
#[derive(Clone)]
pub struct RollingFileWriter {
    inner: Arc<Mutex<Inner>>,
}

impl RollingFileWriter {
    pub fn new(
        dir: impl AsRef<Path>,
        app_name: &str,
        max_files: usize,
        buffer_lines: usize,
    ) -> Result<Self, LoggerError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let capacity = buffer_lines.max(1);
        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                dir,
                app_name: app_name.to_string(),
                max_files: max_files.max(1),
                capacity,
                current: None,
                recent: VecDeque::with_capacity(capacity),
            })),
        })
    }

    pub fn recent_lines(&self) -> Vec<String> {
        self.lock().recent.iter().cloned().collect()
    }

    /// Append one formatted record to today's file
    pub fn write_record(&self, record: &[u8]) -> io::Result<()> {
        self.write_record_on(Local::now().date_naive(), record)
    }

    fn write_record_on(&self, day: NaiveDate, record: &[u8]) -> io::Result<()> {
        self.lock().append(day, record)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves the buffer usable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Inner {
    fn file_name(&self, day: NaiveDate) -> String {
        format!("{}_{}.log", self.app_name, day.format("%Y-%m-%d"))
    }

    fn append(&mut self, day: NaiveDate, record: &[u8]) -> io::Result<()> {
        for line in String::from_utf8_lossy(record).lines() {
            if line.is_empty() {
                continue;
            }
            if self.recent.len() == self.capacity {
                self.recent.pop_front();
            }
            self.recent.push_back(line.to_string());
        }

        let file = self.file_for(day)?;
        file.write_all(record)?;
        file.flush()
    }

    fn file_for(&mut self, day: NaiveDate) -> io::Result<&mut File> {
        let rolled = !matches!(&self.current, Some((current, _)) if *current == day);
        if rolled {
            let path = self.dir.join(self.file_name(day));
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            self.current = Some((day, file));
            self.prune()?;
        }

        self.current
            .as_mut()
            .map(|(_, file)| file)
            .ok_or_else(|| io::Error::other("log file unavailable"))
    }

    /// Remove the oldest daily files beyond `max_files`
    fn prune(&self) -> io::Result<()> {
        let prefix = format!("{}_", self.app_name);
        let mut logs: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(&prefix) && name.ends_with(".log"))
            })
            .collect();

        // Date-stamped names sort chronologically.
        logs.sort();
        while logs.len() > self.max_files {
            let oldest = logs.remove(0);
            fs::remove_file(oldest)?;
        }
        Ok(())
    }
}

/// One formatted event, written out when dropped
pub struct RecordGuard {
    writer: RollingFileWriter,
    buf: Vec<u8>,
}

impl Write for RecordGuard {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for RecordGuard {
    fn drop(&mut self) {
        if !self.buf.is_empty() {
            if let Err(e) = self.writer.write_record(&self.buf) {
                eprintln!("rolling-logger: failed to write record: {}", e);
            }
        }
    }
}

impl<'a> MakeWriter<'a> for RollingFileWriter {
    type Writer = RecordGuard;

    fn make_writer(&'a self) -> Self::Writer {
        RecordGuard {
            writer: self.clone(),
            buf: Vec::new(),
        }
    }
}
