//! Rotating file sink with size, age and count bounds
//!
//! The active file always lives at the configured path. When a write would
//! push it past the size cap, the file is renamed to a backup carrying the
//! rotation time in its name (`app.log` becomes
//! `app-2025-01-08T10-30-45.123.log`) and a fresh file is started. Backups
//! beyond the count cap or older than the age cap are deleted, and the
//! survivors are optionally gzip-compressed.

use super::Sink;
use crate::core::error::{LoggerError, Result};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, Utc};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Timestamp embedded in backup file names (UTC, filesystem safe).
const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";
const COMPRESS_SUFFIX: &str = ".gz";

/// Limits applied by a [`RotatingFileSink`]
///
/// # Examples
///
/// ```
/// use scoped_log::sinks::RotationPolicy;
///
/// // 50 MB files, at most 7 backups, none older than 14 days, gzip backups
/// let policy = RotationPolicy::new()
///     .with_max_size_mb(50)
///     .with_max_backups(7)
///     .with_max_age_days(14)
///     .with_compression(true);
/// assert_eq!(policy.max_size_bytes, 50 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Size in bytes past which the active file is rotated
    pub max_size_bytes: u64,
    /// Backups older than this are deleted; `None` keeps them regardless of age
    pub max_age: Option<Duration>,
    /// Maximum number of backups to keep; 0 keeps all of them
    pub max_backups: usize,
    /// Whether to gzip rotated files
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_size_bytes: 100 * 1024 * 1024,
            max_age: Some(Duration::from_secs(30 * 24 * 3600)),
            max_backups: 1000,
            compress: false,
        }
    }
}

impl RotationPolicy {
    /// Create a new rotation policy with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size_bytes(mut self, bytes: u64) -> Self {
        self.max_size_bytes = bytes;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size_mb(self, megabytes: u64) -> Self {
        self.with_max_size_bytes(megabytes.saturating_mul(1024 * 1024))
    }

    /// Set the age cap in days; 0 disables age based pruning
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age_days(mut self, days: u64) -> Self {
        self.max_age = (days > 0).then(|| Duration::from_secs(days.saturating_mul(24 * 3600)));
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }
}

struct ActiveFile {
    writer: Option<LineWriter<File>>,
    current_size: u64,
    /// Millisecond stamp of the newest backup this sink produced
    last_rotation_ms: Option<i64>,
    closed: bool,
}

/// A backup found next to the active file.
#[derive(Debug)]
struct Backup {
    path: PathBuf,
    rotated_at: DateTime<Utc>,
}

pub struct RotatingFileSink {
    base_path: PathBuf,
    name: String,
    policy: RotationPolicy,
    active: Mutex<ActiveFile>,
}

impl RotatingFileSink {
    /// Open (or create) the active file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::SinkOpen`] if the directory or file cannot be
    /// created.
    pub fn with_policy<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        let name = base_path.display().to_string();

        // Create parent directory if it doesn't exist
        if let Some(parent) = base_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| LoggerError::sink_open(name.clone(), e))?;
        }

        let file = Self::open_append(&base_path).map_err(|e| LoggerError::sink_open(name.clone(), e))?;
        let current_size = file
            .metadata()
            .map_err(|e| LoggerError::sink_open(name.clone(), e))?
            .len();

        let sink = Self {
            base_path,
            name,
            policy,
            active: Mutex::new(ActiveFile {
                writer: Some(LineWriter::new(file)),
                current_size,
                last_rotation_ms: None,
                closed: false,
            }),
        };
        sink.prune_backups();
        Ok(sink)
    }

    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_policy(path, RotationPolicy::default())
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    fn open_append(path: &Path) -> io::Result<File> {
        OpenOptions::new().create(true).append(true).open(path)
    }

    /// Rename the active file to a timestamped backup and start a new one.
    fn rotate(&self, active: &mut ActiveFile) -> Result<()> {
        // Explicitly drop writer to release file handle before the rename
        if let Some(mut writer) = active.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.name.clone(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        if self.base_path.exists() {
            // backup names must sort in rotation order even within one millisecond
            let now_ms = Utc::now().timestamp_millis();
            let stamp_ms = active
                .last_rotation_ms
                .map_or(now_ms, |last| now_ms.max(last + 1));
            let (backup, stamp_ms) = self.free_backup_path(stamp_ms);
            active.last_rotation_ms = Some(stamp_ms);
            fs::rename(&self.base_path, &backup).map_err(|e| {
                LoggerError::file_rotation(
                    self.name.clone(),
                    format!("Failed to rename to '{}': {}", backup.display(), e),
                )
            })?;
        }

        let file = Self::open_append(&self.base_path).map_err(|e| {
            LoggerError::file_rotation(
                self.name.clone(),
                format!("Failed to create new log file: {}", e),
            )
        })?;
        active.writer = Some(LineWriter::new(file));
        active.current_size = 0;

        self.prune_backups();
        Ok(())
    }

    /// (stem, extension) of the active file, e.g. ("app", ".log").
    fn name_parts(&self) -> (String, String) {
        let file_name = self
            .base_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("app.log");
        match file_name.rfind('.') {
            Some(idx) if idx > 0 => (file_name[..idx].to_string(), file_name[idx..].to_string()),
            _ => (file_name.to_string(), String::new()),
        }
    }

    fn backup_path(&self, rotated_at: DateTime<Utc>) -> PathBuf {
        let (stem, ext) = self.name_parts();
        let stamp = rotated_at.format(BACKUP_TIME_FORMAT);
        self.base_path.with_file_name(format!("{}-{}{}", stem, stamp, ext))
    }

    /// A backup name not used by an existing (possibly compressed) backup,
    /// with the millisecond stamp it encodes.
    fn free_backup_path(&self, mut stamp_ms: i64) -> (PathBuf, i64) {
        loop {
            let rotated_at = DateTime::from_timestamp_millis(stamp_ms).unwrap_or_else(Utc::now);
            let candidate = self.backup_path(rotated_at);
            let compressed = Self::compressed_path(&candidate);
            if !candidate.exists() && !compressed.exists() {
                return (candidate, stamp_ms);
            }
            stamp_ms += 1;
        }
    }

    fn compressed_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(COMPRESS_SUFFIX);
        PathBuf::from(name)
    }

    /// Parse the rotation time out of a backup file name.
    fn parse_backup_name(&self, file_name: &str) -> Option<DateTime<Utc>> {
        let (stem, ext) = self.name_parts();
        let prefix = format!("{}-", stem);
        let rest = file_name.strip_prefix(&prefix)?;
        let rest = rest.strip_suffix(COMPRESS_SUFFIX).unwrap_or(rest);
        let stamp = rest.strip_suffix(ext.as_str())?;
        NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Backups of this file, newest first.
    fn list_backups(&self) -> io::Result<Vec<Backup>> {
        let dir = match self.base_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut backups = Vec::new();
        for dir_entry in fs::read_dir(&dir)? {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }
            let file_name = dir_entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(rotated_at) = self.parse_backup_name(file_name) {
                backups.push(Backup {
                    path: dir_entry.path(),
                    rotated_at,
                });
            }
        }
        backups.sort_by(|a, b| b.rotated_at.cmp(&a.rotated_at));
        Ok(backups)
    }

    /// Delete backups beyond the count and age caps, then compress the rest.
    ///
    /// Failures are reported on stderr and never fail the write that
    /// triggered the rotation.
    fn prune_backups(&self) {
        let backups = match self.list_backups() {
            Ok(backups) => backups,
            Err(e) => {
                eprintln!("[LOGGER WARNING] cannot list backups of {}: {}", self.name, e);
                return;
            }
        };

        let cutoff = self
            .policy
            .max_age
            .and_then(|age| ChronoDuration::from_std(age).ok())
            .map(|age| Utc::now() - age);

        let mut kept = 0usize;
        for backup in backups {
            let over_count = self.policy.max_backups > 0 && kept >= self.policy.max_backups;
            let too_old = cutoff.is_some_and(|cutoff| backup.rotated_at < cutoff);

            if over_count || too_old {
                if let Err(e) = fs::remove_file(&backup.path) {
                    eprintln!(
                        "[LOGGER WARNING] Failed to remove old backup {}: {}",
                        backup.path.display(),
                        e
                    );
                }
                continue;
            }

            kept += 1;
            let is_compressed = backup
                .path
                .to_str()
                .is_some_and(|p| p.ends_with(COMPRESS_SUFFIX));
            if self.policy.compress && !is_compressed {
                if let Err(e) = self.compress_file(&backup.path) {
                    eprintln!("[LOGGER WARNING] {}", e);
                }
            }
        }
    }

    /// Compress a backup with transactional safety using streaming I/O
    ///
    /// The original file is only deleted after the compressed copy is fully
    /// written and renamed into place.
    fn compress_file(&self, path: &Path) -> Result<()> {
        use std::io::{BufReader, BufWriter};

        let gz_path = Self::compressed_path(path);
        let mut temp_name = gz_path.as_os_str().to_os_string();
        temp_name.push(".tmp");
        let temp_gz_path = PathBuf::from(temp_name);

        let compress_err = |message: String, source: io::Error| {
            let _ = fs::remove_file(&temp_gz_path);
            LoggerError::file_rotation(path.display().to_string(), format!("{}: {}", message, source))
        };

        let input = File::open(path)
            .map_err(|e| compress_err("Failed to open file for compression".into(), e))?;
        let mut reader = BufReader::with_capacity(64 * 1024, input);

        let output = File::create(&temp_gz_path)
            .map_err(|e| compress_err("Failed to create temporary compressed file".into(), e))?;
        let buffered_output = BufWriter::with_capacity(64 * 1024, output);
        let mut encoder =
            flate2::write::GzEncoder::new(buffered_output, flate2::Compression::default());

        io::copy(&mut reader, &mut encoder)
            .map_err(|e| compress_err("Failed to compress data".into(), e))?;
        encoder
            .finish()
            .and_then(|mut out| out.flush())
            .map_err(|e| compress_err("Failed to finish compression".into(), e))?;

        fs::rename(&temp_gz_path, &gz_path)
            .map_err(|e| compress_err("Failed to move compressed file into place".into(), e))?;
        fs::remove_file(path).map_err(|e| {
            LoggerError::file_rotation(
                path.display().to_string(),
                format!("Failed to remove uncompressed backup: {}", e),
            )
        })?;
        Ok(())
    }
}

impl Sink for RotatingFileSink {
    fn write_all(&self, buf: &[u8]) -> Result<()> {
        let len = buf.len() as u64;
        if len > self.policy.max_size_bytes {
            return Err(LoggerError::write(
                self.name.clone(),
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "write length {} exceeds maximum file size {}",
                        len, self.policy.max_size_bytes
                    ),
                ),
            ));
        }

        let mut active = self.active.lock();
        if active.closed {
            return Err(LoggerError::write(
                self.name.clone(),
                io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"),
            ));
        }
        if active.writer.is_none() || active.current_size + len > self.policy.max_size_bytes {
            self.rotate(&mut active)?;
        }

        let writer = active.writer.as_mut().ok_or_else(|| {
            LoggerError::write(
                self.name.clone(),
                io::Error::new(io::ErrorKind::NotConnected, "no active file"),
            )
        })?;
        writer
            .write_all(buf)
            .map_err(|e| LoggerError::write(self.name.clone(), e))?;
        active.current_size += len;
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        if let Some(ref mut writer) = self.active.lock().writer {
            writer
                .flush()
                .map_err(|e| LoggerError::write(self.name.clone(), e))?;
            writer
                .get_ref()
                .sync_data()
                .map_err(|e| LoggerError::write(self.name.clone(), e))?;
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut active = self.active.lock();
        active.closed = true;
        if let Some(mut writer) = active.writer.take() {
            writer
                .flush()
                .map_err(|e| LoggerError::write(self.name.clone(), e))?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for RotatingFileSink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
