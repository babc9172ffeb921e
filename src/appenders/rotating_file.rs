//! Rotating file appender with size-triggered rotation
//!
//! When a write would push the active file past its size limit, the file is
//! renamed to a timestamped backup next to it and a fresh file is opened.
//! Only the rename and reopen happen on the writing thread. Pruning by age
//! and count, and gzip compression of the survivors, run on a background
//! "mill" thread owned by the appender, so a rotation never holds a logging
//! call up for the time it takes to compress a segment.
//!
//! For `/var/log/monitor.log` a backup looks like
//! `/var/log/monitor-2025-01-08T10-30-45.123.log`, or
//! `/var/log/monitor-2025-01-08T10-30-45.123.log.gz` once compressed.

use crate::core::appender::Appender;
use crate::core::error::{LoggerError, Result};
use chrono::{DateTime, Local, NaiveDateTime, Offset, TimeZone, Utc};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

const MEGABYTE: u64 = 1024 * 1024;
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";
const COMPRESS_SUFFIX: &str = ".gz";
/// How long dropping an appender waits for backup cleanup still in progress
const MILL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Size limit and retention rules for a [`RotatingFileAppender`]
///
/// # Examples
///
/// ```
/// use monitor_runtime::appenders::RotationPolicy;
///
/// let policy = RotationPolicy::new()
///     .with_max_size_mb(50)
///     .with_max_backups(7)
///     .with_max_age_days(14)
///     .with_compression(true);
/// assert_eq!(policy.max_size_bytes, 50 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Rotate before the active file would exceed this many bytes
    pub max_size_bytes: u64,
    /// Backups to keep; 0 keeps all of them
    pub max_backups: usize,
    /// Backups older than this are removed; `None` disables age pruning
    pub max_age: Option<Duration>,
    /// Stamp backup names in local time rather than UTC
    pub local_time: bool,
    /// Gzip backups after rotation
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_SIZE_MB * MEGABYTE,
            max_backups: 10,
            max_age: Some(days(30)),
            local_time: false,
            compress: false,
        }
    }
}

fn days(n: u32) -> Duration {
    Duration::from_secs(u64::from(n) * 24 * 60 * 60)
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Size limit in megabytes; 0 selects the 100 MB default
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size_mb(self, megabytes: u64) -> Self {
        let megabytes = if megabytes == 0 {
            DEFAULT_MAX_SIZE_MB
        } else {
            megabytes
        };
        self.with_max_size_bytes(megabytes.saturating_mul(MEGABYTE))
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size_bytes(mut self, bytes: u64) -> Self {
        self.max_size_bytes = bytes.max(1);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    /// Age limit in days; 0 disables age pruning
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age_days(mut self, max_age_days: u32) -> Self {
        self.max_age = (max_age_days > 0).then(|| days(max_age_days));
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_local_time(mut self, enabled: bool) -> Self {
        self.local_time = enabled;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }
}

/// A backup found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    pub path: PathBuf,
    pub rotated_at: DateTime<Utc>,
    pub compressed: bool,
}

/// Naming and retention rules for the backups of one log file.
///
/// The appender uses it to name new backups; its mill thread uses it to find,
/// prune and compress them.
#[derive(Debug, Clone)]
struct Retention {
    base_path: PathBuf,
    policy: RotationPolicy,
}

impl Retention {
    /// Path of the uncompressed backup for a rotation at `at`
    fn backup_path(&self, at: DateTime<Utc>) -> PathBuf {
        let stamp = if self.policy.local_time {
            at.with_timezone(&Local).format(BACKUP_TIME_FORMAT).to_string()
        } else {
            at.format(BACKUP_TIME_FORMAT).to_string()
        };
        let (prefix, ext) = self.name_parts();
        self.base_path
            .with_file_name(format!("{}{}{}", prefix, stamp, ext))
    }

    /// `("monitor-", ".log")` for `monitor.log`.
    ///
    /// Both halves come from the same (lossy) file name, so a name that is
    /// not valid UTF-8 still splits consistently.
    fn name_parts(&self) -> (String, String) {
        let file_name = self
            .base_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "monitor.log".to_string());

        match file_name.rfind('.') {
            // A leading dot marks a hidden file, not an extension.
            Some(dot) if dot > 0 => (
                format!("{}-", &file_name[..dot]),
                file_name[dot..].to_string(),
            ),
            _ => (format!("{}-", file_name), String::new()),
        }
    }

    fn parse_backup(&self, path: &Path) -> Option<Backup> {
        let name = path.file_name()?.to_str()?;
        let (prefix, ext) = self.name_parts();

        let (rest, compressed) = match name.strip_suffix(COMPRESS_SUFFIX) {
            Some(rest) => (rest, true),
            None => (name, false),
        };
        let stamp = rest.strip_prefix(&prefix)?.strip_suffix(ext.as_str())?;
        let naive = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT).ok()?;

        let rotated_at = if self.policy.local_time {
            local_to_utc(&Local, &naive)
        } else {
            Utc.from_utc_datetime(&naive)
        };

        Some(Backup {
            path: path.to_path_buf(),
            rotated_at,
            compressed,
        })
    }

    fn backups(&self) -> Result<Vec<Backup>> {
        let dir = match self.base_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(dir) => dir.to_path_buf(),
            None => PathBuf::from("."),
        };

        let entries = fs::read_dir(&dir).map_err(|e| {
            LoggerError::io_operation(
                "list log backups",
                format!("Cannot read directory '{}'", dir.display()),
                e,
            )
        })?;

        let mut backups: Vec<Backup> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| self.parse_backup(&entry.path()))
            .collect();

        backups.sort_by(|a, b| b.rotated_at.cmp(&a.rotated_at));
        Ok(backups)
    }

    /// Apply age and count retention, then compress what is left
    fn prune(&self) -> Result<()> {
        let mut backups = self.backups()?;
        let mut doomed = Vec::new();

        let cutoff = self
            .policy
            .max_age
            .and_then(|age| chrono::Duration::from_std(age).ok())
            .and_then(|age| Utc::now().checked_sub_signed(age));
        if let Some(cutoff) = cutoff {
            let (keep, old): (Vec<_>, Vec<_>) =
                backups.into_iter().partition(|b| b.rotated_at >= cutoff);
            backups = keep;
            doomed.extend(old);
        }

        if self.policy.max_backups > 0 && backups.len() > self.policy.max_backups {
            doomed.extend(backups.split_off(self.policy.max_backups));
        }

        for backup in &doomed {
            if let Err(e) = fs::remove_file(&backup.path) {
                eprintln!(
                    "[LOGGER WARNING] Failed to remove old backup {}: {}",
                    backup.path.display(),
                    e
                );
            }
        }

        if self.policy.compress {
            for backup in backups.iter().filter(|b| !b.compressed) {
                compress_file(&backup.path)?;
            }
        }

        Ok(())
    }
}

/// Read a wall-clock stamp written in `tz` back as an instant.
///
/// A stamp that falls in a gap skipped by a DST change has no exact
/// instant; it is read with the offset in force around the gap so the
/// backup is still found and pruned.
fn local_to_utc<Tz: TimeZone>(tz: &Tz, naive: &NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(naive).earliest() {
        Some(at) => at.with_timezone(&Utc),
        None => {
            let offset = tz.offset_from_utc_datetime(naive).fix();
            Utc.from_utc_datetime(&(*naive - offset))
        }
    }
}

enum MillRequest {
    Prune,
    /// Answered once every earlier request has been handled
    Sync(Sender<()>),
}

/// Background cleanup thread owned by one appender
struct Mill {
    requests: Option<Sender<MillRequest>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Mill {
    fn spawn(retention: Retention) -> Result<Self> {
        let (requests, receiver) = unbounded();
        let handle = thread::Builder::new()
            .name("log-mill".to_string())
            .spawn(move || run_mill(&retention, &receiver))
            .map_err(|e| {
                LoggerError::io_operation("start log mill", "Failed to spawn backup cleanup thread", e)
            })?;

        Ok(Self {
            requests: Some(requests),
            handle: Some(handle),
        })
    }

    fn request_prune(&self) {
        if let Some(requests) = &self.requests {
            // Only fails once the thread is gone, which happens during drop.
            let _ = requests.send(MillRequest::Prune);
        }
    }

    fn sync(&self) {
        let Some(requests) = &self.requests else {
            return;
        };
        let (ack, done) = bounded(1);
        if requests.send(MillRequest::Sync(ack)).is_ok() {
            let _ = done.recv();
        }
    }
}

fn run_mill(retention: &Retention, receiver: &Receiver<MillRequest>) {
    while let Ok(first) = receiver.recv() {
        // Rotations that queued up while the last pass ran need one pass.
        let mut prune = false;
        let mut waiting = Vec::new();
        for request in std::iter::once(first).chain(receiver.try_iter()) {
            match request {
                MillRequest::Prune => prune = true,
                MillRequest::Sync(ack) => waiting.push(ack),
            }
        }

        if prune {
            if let Err(e) = retention.prune() {
                eprintln!("[LOGGER WARNING] Backup cleanup failed: {}", e);
            }
        }
        for ack in waiting {
            let _ = ack.send(());
        }
    }
}

impl Drop for Mill {
    fn drop(&mut self) {
        // Closing the queue lets the thread finish pending work and exit.
        drop(self.requests.take());

        if let Some(handle) = self.handle.take() {
            let start = Instant::now();
            loop {
                if handle.is_finished() {
                    if let Err(e) = handle.join() {
                        eprintln!("[LOGGER ERROR] Log mill thread panicked: {:?}", e);
                    }
                    break;
                }

                if start.elapsed() >= MILL_SHUTDOWN_TIMEOUT {
                    eprintln!(
                        "[LOGGER WARNING] Backup cleanup did not finish within {:?}; \
                         it continues in the background",
                        MILL_SHUTDOWN_TIMEOUT
                    );
                    break;
                }

                thread::sleep(Duration::from_millis(10));
            }
        }
    }
}

/// File appender that rotates on size and prunes old backups
///
/// # Examples
///
/// ```no_run
/// use monitor_runtime::appenders::{RotatingFileAppender, RotationPolicy};
///
/// let policy = RotationPolicy::new().with_max_size_mb(10).with_compression(true);
/// let appender = RotatingFileAppender::with_policy("/var/log/monitor.log", policy).unwrap();
/// ```
pub struct RotatingFileAppender {
    retention: Retention,
    writer: Option<BufWriter<File>>,
    current_size: u64,
    /// Stamp of the newest backup this appender produced
    last_backup_at: Option<DateTime<Utc>>,
    mill: Mill,
}

impl RotatingFileAppender {
    /// Create a new rotating file appender with the default policy
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be created or opened
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_policy(path, RotationPolicy::default())
    }

    /// Create a new rotating file appender with custom policy
    ///
    /// An existing file is appended to and its size counts toward the limit.
    ///
    /// # Errors
    ///
    /// Returns error if the parent directory or the file cannot be created,
    /// or the cleanup thread cannot be started
    pub fn with_policy<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let (file, current_size) = Self::open_append(&base_path)?;
        let retention = Retention { base_path, policy };
        let mill = Mill::spawn(retention.clone())?;

        Ok(Self {
            retention,
            writer: Some(BufWriter::new(file)),
            current_size,
            last_backup_at: None,
            mill,
        })
    }

    fn open_append(path: &Path) -> Result<(File, u64)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::file_appender(path.display().to_string(), format!("Failed to open: {}", e))
            })?;

        let size = file
            .metadata()
            .map_err(|e| {
                LoggerError::file_appender(
                    path.display().to_string(),
                    format!("Cannot access file metadata: {}", e),
                )
            })?
            .len();

        Ok((file, size))
    }

    /// Rename the active file to a timestamped backup and reopen.
    ///
    /// Retention and compression are queued for the mill thread.
    fn rotate(&mut self) -> Result<()> {
        let base_path = self.retention.base_path.clone();

        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    base_path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        if base_path.exists() {
            // Stamps must strictly increase or retention would treat the
            // newest backup as the oldest.
            let now = Utc::now();
            let at = match self.last_backup_at {
                Some(last) if last >= now => last + chrono::Duration::milliseconds(1),
                _ => now,
            };
            let (backup, at) = self.free_backup_path(at);
            self.last_backup_at = Some(at);
            fs::rename(&base_path, &backup).map_err(|e| {
                LoggerError::file_rotation(
                    base_path.display().to_string(),
                    format!("Failed to move log file to '{}': {}", backup.display(), e),
                )
            })?;
        }

        let (file, size) = Self::open_append(&base_path)?;
        self.writer = Some(BufWriter::new(file));
        self.current_size = size;

        self.mill.request_prune();
        Ok(())
    }

    /// Backup name for a rotation at `at`, moved forward a millisecond at a
    /// time while the name is taken
    fn free_backup_path(&self, mut at: DateTime<Utc>) -> (PathBuf, DateTime<Utc>) {
        loop {
            let candidate = self.retention.backup_path(at);
            if !candidate.exists() && !compressed_path(&candidate).exists() {
                return (candidate, at);
            }
            at += chrono::Duration::milliseconds(1);
        }
    }

    /// Path of the uncompressed backup for a rotation at `at`
    pub fn backup_path(&self, at: DateTime<Utc>) -> PathBuf {
        self.retention.backup_path(at)
    }

    /// Backups of this log file on disk, newest first
    ///
    /// # Errors
    ///
    /// Returns error if the log directory cannot be read
    pub fn backups(&self) -> Result<Vec<Backup>> {
        self.retention.backups()
    }

    /// Block until the cleanup queued by earlier rotations has finished
    pub fn wait_for_cleanup(&self) {
        self.mill.sync();
    }

    /// Get current file size
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    /// Get base path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.retention.base_path
    }

    /// Get rotation policy
    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.retention.policy
    }
}

fn compressed_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(COMPRESS_SUFFIX);
    PathBuf::from(name)
}

/// Gzip `path` to `path.gz`, removing the original only after the
/// compressed copy is fully written and renamed into place.
fn compress_file(path: &Path) -> Result<()> {
    use std::io::{BufReader, copy};

    let gz_path = compressed_path(path);
    let mut temp_name = gz_path.as_os_str().to_os_string();
    temp_name.push(".tmp");
    let temp_gz_path = PathBuf::from(temp_name);

    let input = File::open(path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to open file for compression: {}", path.display()),
            e,
        )
    })?;
    let mut reader = BufReader::with_capacity(64 * 1024, input);

    let output = File::create(&temp_gz_path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to create temporary compressed file: {}", temp_gz_path.display()),
            e,
        )
    })?;
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(64 * 1024, output),
        flate2::Compression::default(),
    );

    let streamed = copy(&mut reader, &mut encoder)
        .and_then(|_| encoder.finish())
        .and_then(|mut inner| inner.flush());
    if let Err(e) = streamed {
        let _ = fs::remove_file(&temp_gz_path);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress {}", path.display()),
            e,
        ));
    }

    fs::rename(&temp_gz_path, &gz_path).map_err(|e| {
        let _ = fs::remove_file(&temp_gz_path);
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to rename compressed file to: {}", gz_path.display()),
            e,
        )
    })?;

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[LOGGER WARNING] Compressed {} but could not remove the original: {}",
            path.display(),
            e
        );
    }

    Ok(())
}

impl Appender for RotatingFileAppender {
    fn name(&self) -> &str {
        "rotating_file"
    }

    fn append(&mut self, line: &str) -> Result<()> {
        let len = line.len() as u64;
        if len > self.retention.policy.max_size_bytes {
            return Err(LoggerError::file_appender(
                self.retention.base_path.display().to_string(),
                format!(
                    "record of {} bytes exceeds maximum file size of {} bytes",
                    len, self.retention.policy.max_size_bytes
                ),
            ));
        }

        if self.writer.is_none() || self.current_size + len > self.retention.policy.max_size_bytes {
            self.rotate()?;
        }

        let path = &self.retention.base_path;
        let writer = self.writer.as_mut().ok_or_else(|| {
            LoggerError::file_appender(path.display().to_string(), "Writer not initialized")
        })?;

        writer.write_all(line.as_bytes()).map_err(|e| {
            LoggerError::file_appender(
                path.display().to_string(),
                format!("Failed to write log entry: {}", e),
            )
        })?;
        self.current_size += len;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_appender(
                    self.retention.base_path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }
}

impl Drop for RotatingFileAppender {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}
