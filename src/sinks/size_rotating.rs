//! Size-based rotating file sink
//!
//! The active file keeps its configured name. When the next record would
//! push it past the size threshold, it is renamed to
//! `<stem>-<YYYY-MM-DDTHH-MM-SS.mmm><ext>` and a fresh file is opened.
//! Backups are then compressed and pruned by count and age.

use crate::core::{LoggerError, Result, Sink};
use chrono::{Local, NaiveDateTime, Utc};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Timestamp layout embedded in backup file names
pub const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";
const COMPRESS_SUFFIX: &str = ".gz";

/// Configuration for [`SizeRotatingWriter`]
///
/// # Examples
///
/// ```
/// use rust_leveled_logger::sinks::SizeRotationPolicy;
/// use std::time::Duration;
///
/// let policy = SizeRotationPolicy::new()
///     .with_max_bytes(50 * 1024 * 1024)
///     .with_max_backups(7)
///     .with_max_age(Duration::from_secs(7 * 24 * 3600))
///     .with_compression(true);
/// assert_eq!(policy.max_backups, 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeRotationPolicy {
    /// Rotate before a write that would exceed this many bytes
    pub max_bytes: u64,
    /// Backups to keep; 0 keeps all
    pub max_backups: usize,
    /// Backups older than this are removed
    pub max_age: Option<Duration>,
    /// Gzip rotated files
    pub compress: bool,
    /// Name backups in local time instead of UTC
    pub local_time: bool,
}

impl Default for SizeRotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 100 * 1024 * 1024,
            max_backups: 0,
            max_age: None,
            compress: false,
            local_time: true,
        }
    }
}

impl SizeRotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_max_age(mut self, age: Duration) -> Self {
        self.max_age = Some(age);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_local_time(mut self, enabled: bool) -> Self {
        self.local_time = enabled;
        self
    }
}

/// A rotated file found next to the active one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
    pub path: PathBuf,
    pub rotated_at: NaiveDateTime,
    pub compressed: bool,
}

/// Size-based rotating file sink
///
/// # Examples
///
/// ```no_run
/// use rust_leveled_logger::sinks::{SizeRotatingWriter, SizeRotationPolicy, Sink};
///
/// let policy = SizeRotationPolicy::new()
///     .with_max_bytes(1024 * 1024)
///     .with_max_backups(3)
///     .with_compression(true);
/// let mut writer = SizeRotatingWriter::with_policy("/var/log/app-info.log", policy).unwrap();
/// writer.write_record(b"{\"msg\":\"hello\"}\n").unwrap();
/// ```
pub struct SizeRotatingWriter {
    base_path: PathBuf,
    policy: SizeRotationPolicy,
    file: Option<File>,
    current_size: u64,
    name: String,
}

impl SizeRotatingWriter {
    /// Create a writer with the default policy
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created or opened
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_policy(path, SizeRotationPolicy::default())
    }

    /// Create a writer with a custom policy. The file is opened immediately
    /// so misconfiguration surfaces here rather than on the first write.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created or opened
    pub fn with_policy<P: AsRef<Path>>(path: P, policy: SizeRotationPolicy) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if policy.max_bytes == 0 {
            return Err(LoggerError::config(
                "SizeRotatingWriter",
                "max_bytes must be greater than zero",
            ));
        }

        if let Some(parent) = base_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let (file, current_size) = Self::open_file(&base_path)?;
        let name = base_path.display().to_string();

        Ok(Self {
            base_path,
            policy,
            file: Some(file),
            current_size,
            name,
        })
    }

    fn open_file(path: &Path) -> Result<(File, u64)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::sink(path.display().to_string(), format!("Failed to open: {}", e))
            })?;

        let size = file
            .metadata()
            .map_err(|e| {
                LoggerError::sink(
                    path.display().to_string(),
                    format!("Cannot access file metadata: {}", e),
                )
            })?
            .len();
        Ok((file, size))
    }

    /// Get current file size
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    /// Get base path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    #[must_use]
    pub fn policy(&self) -> &SizeRotationPolicy {
        &self.policy
    }

    fn now(&self) -> NaiveDateTime {
        if self.policy.local_time {
            Local::now().naive_local()
        } else {
            Utc::now().naive_utc()
        }
    }

    /// `("app-error", ".log")` for `app-error.log`
    fn stem_and_ext(&self) -> (String, String) {
        let stem = self
            .base_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("app")
            .to_string();
        let ext = self
            .base_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        (stem, ext)
    }

    fn backup_path(&self, at: NaiveDateTime) -> PathBuf {
        let (stem, ext) = self.stem_and_ext();
        self.base_path
            .with_file_name(format!("{}-{}{}", stem, at.format(BACKUP_TIME_FORMAT), ext))
    }

    /// First free backup name at or after `at`, so two rotations within the
    /// same millisecond do not overwrite each other
    fn free_backup_path(&self, mut at: NaiveDateTime) -> PathBuf {
        loop {
            let candidate = self.backup_path(at);
            if !candidate.exists() && !gz_path(&candidate).exists() {
                return candidate;
            }
            at += chrono::Duration::milliseconds(1);
        }
    }

    /// Rotated files belonging to this writer, newest first
    pub fn backups(&self) -> Result<Vec<BackupFile>> {
        let dir = match self.base_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let (stem, ext) = self.stem_and_ext();
        let prefix = format!("{}-", stem);
        let compressed_ext = format!("{}{}", ext, COMPRESS_SUFFIX);

        let mut backups = Vec::new();
        for dir_entry in fs::read_dir(&dir)? {
            let dir_entry = dir_entry?;
            let file_name = dir_entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let Some(rest) = file_name.strip_prefix(&prefix) else {
                continue;
            };

            let (stamp, compressed) = if let Some(stamp) = rest.strip_suffix(&compressed_ext) {
                (stamp, true)
            } else if let Some(stamp) = rest.strip_suffix(&ext) {
                (stamp, false)
            } else {
                continue;
            };

            if let Ok(rotated_at) = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT) {
                backups.push(BackupFile {
                    path: dir_entry.path(),
                    rotated_at,
                    compressed,
                });
            }
        }

        backups.sort_by(|a, b| b.rotated_at.cmp(&a.rotated_at));
        Ok(backups)
    }

    /// Perform log rotation
    fn rotate(&mut self) -> Result<()> {
        // Explicitly drop the handle so the rename works on every platform
        if let Some(mut file) = self.file.take() {
            file.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.name.clone(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        if self.base_path.exists() {
            let backup = self.free_backup_path(self.now());
            fs::rename(&self.base_path, &backup).map_err(|e| {
                LoggerError::file_rotation(
                    self.name.clone(),
                    format!("Failed to rotate current log file: {}", e),
                )
            })?;
        }

        let (file, size) = Self::open_file(&self.base_path).map_err(|e| {
            LoggerError::file_rotation(
                self.name.clone(),
                format!("Failed to create new log file: {}", e),
            )
        })?;
        self.file = Some(file);
        self.current_size = size;

        if let Err(e) = self.mill() {
            eprintln!("[WARN] Backup housekeeping failed for {}: {}", self.name, e);
        }
        Ok(())
    }

    /// Remove backups beyond the count and age limits, then compress the rest
    fn mill(&self) -> Result<()> {
        let mut remaining = Vec::new();
        let cutoff = self
            .policy
            .max_age
            .and_then(|age| chrono::Duration::from_std(age).ok())
            .and_then(|age| self.now().checked_sub_signed(age));

        for (index, backup) in self.backups()?.into_iter().enumerate() {
            let over_count = self.policy.max_backups > 0 && index >= self.policy.max_backups;
            let too_old = cutoff.is_some_and(|cutoff| backup.rotated_at < cutoff);
            if over_count || too_old {
                if let Err(e) = fs::remove_file(&backup.path) {
                    eprintln!(
                        "[WARN] Failed to remove old backup {}: {}",
                        backup.path.display(),
                        e
                    );
                }
            } else {
                remaining.push(backup);
            }
        }

        if self.policy.compress {
            for backup in remaining.iter().filter(|b| !b.compressed) {
                compress_file(&backup.path)?;
            }
        }
        Ok(())
    }

    /// Try to reopen the log file (used for recovery after rotation failure)
    fn try_reopen(&mut self) -> Result<()> {
        let (file, size) = Self::open_file(&self.base_path)?;
        self.file = Some(file);
        self.current_size = size;
        Ok(())
    }
}

impl Sink for SizeRotatingWriter {
    fn write_record(&mut self, record: &[u8]) -> Result<()> {
        let len = record.len() as u64;
        if len > self.policy.max_bytes {
            return Err(LoggerError::WriteTooLarge {
                len,
                max: self.policy.max_bytes,
            });
        }

        if self.current_size + len > self.policy.max_bytes {
            if let Err(e) = self.rotate() {
                // Keep logging into the current file rather than losing records
                eprintln!("[WARN] Log rotation failed: {}. Continuing with current file.", e);
                if self.file.is_none() {
                    if let Err(reopen_err) = self.try_reopen() {
                        eprintln!(
                            "[ERROR] Failed to reopen log file after rotation failure: {}",
                            reopen_err
                        );
                        return Err(e);
                    }
                }
                // Allow the file to grow past the limit instead of retrying every write
                self.current_size = 0;
            }
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| LoggerError::sink(self.name.clone(), "Writer not initialized"))?;
        file.write_all(record).map_err(|e| {
            LoggerError::sink(self.name.clone(), format!("Failed to write log entry: {}", e))
        })?;
        self.current_size += len;
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        if let Some(ref mut file) = self.file {
            file.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn gz_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(COMPRESS_SUFFIX);
    PathBuf::from(name)
}

/// Gzip `path` into `path.gz` via a temporary file, removing the original
/// only once the compressed copy is complete.
fn compress_file(path: &Path) -> Result<()> {
    let gz = gz_path(path);
    let mut temp_name = OsString::from(gz.as_os_str());
    temp_name.push(".tmp");
    let temp_gz = PathBuf::from(temp_name);

    let input = File::open(path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to open file for compression: {}", path.display()),
            e,
        )
    })?;
    let mut reader = BufReader::with_capacity(64 * 1024, input);

    let output = File::create(&temp_gz).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to create temporary compressed file: {}", temp_gz.display()),
            e,
        )
    })?;
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(64 * 1024, output),
        flate2::Compression::default(),
    );

    let streamed = (|| -> std::io::Result<()> {
        let mut buffer = vec![0u8; 64 * 1024];
        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            encoder.write_all(&buffer[..n])?;
        }
        encoder.finish()?.flush()
    })();

    if let Err(e) = streamed {
        let _ = fs::remove_file(&temp_gz);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress {}", path.display()),
            e,
        ));
    }

    fs::rename(&temp_gz, &gz).map_err(|e| {
        let _ = fs::remove_file(&temp_gz);
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to rename compressed file to: {}", gz.display()),
            e,
        )
    })?;

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[WARN] Compression succeeded but failed to remove original file {}: {}",
            path.display(),
            e
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use tempfile::tempdir;

    fn record(i: usize) -> Vec<u8> {
        format!("{{\"msg\":\"Test message number {}\"}}\n", i).into_bytes()
    }

    #[test]
    fn test_creation_opens_file() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("sub").join("test.log");

        let writer = SizeRotatingWriter::new(&log_path).unwrap();
        assert!(log_path.exists());
        assert_eq!(writer.path(), log_path);
        assert_eq!(writer.current_size(), 0);
    }

    #[test]
    fn test_existing_file_size_is_picked_up() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("resume.log");
        fs::write(&log_path, b"0123456789").unwrap();

        let writer = SizeRotatingWriter::new(&log_path).unwrap();
        assert_eq!(writer.current_size(), 10);
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let dir = tempdir().unwrap();
        let policy = SizeRotationPolicy::new().with_max_bytes(0);
        assert!(SizeRotatingWriter::with_policy(dir.path().join("x.log"), policy).is_err());
    }

    #[test]
    fn test_rotation_creates_timestamped_backup() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("app-info.log");
        let policy = SizeRotationPolicy::new().with_max_bytes(100).with_max_backups(3);
        let mut writer = SizeRotatingWriter::with_policy(&log_path, policy).unwrap();

        for i in 0..6 {
            writer.write_record(&record(i)).unwrap();
        }
        writer.sync().unwrap();

        let backups = writer.backups().unwrap();
        assert!(!backups.is_empty());
        for backup in &backups {
            let name = backup.path.file_name().unwrap().to_str().unwrap().to_string();
            assert!(name.starts_with("app-info-"));
            assert!(name.ends_with(".log"));
            assert!(!backup.compressed);
        }
        assert!(fs::metadata(&log_path).unwrap().len() <= 100);
    }

    #[test]
    fn test_record_never_split_across_files() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("whole.log");
        let policy = SizeRotationPolicy::new().with_max_bytes(120).with_max_backups(50);
        let mut writer = SizeRotatingWriter::with_policy(&log_path, policy).unwrap();

        for i in 0..30 {
            writer.write_record(&record(i)).unwrap();
        }

        let mut files = vec![log_path.clone()];
        files.extend(writer.backups().unwrap().into_iter().map(|b| b.path));
        let mut total = 0;
        for path in files {
            let content = fs::read_to_string(&path).unwrap();
            for line in content.lines() {
                serde_json::from_str::<serde_json::Value>(line).unwrap();
                total += 1;
            }
        }
        assert_eq!(total, 30);
    }

    #[test]
    fn test_backup_count_is_bounded() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("multi.log");
        let policy = SizeRotationPolicy::new().with_max_bytes(50).with_max_backups(2);
        let mut writer = SizeRotatingWriter::with_policy(&log_path, policy).unwrap();

        for i in 0..100 {
            writer.write_record(format!("Entry {}\n", i).as_bytes()).unwrap();
        }
        writer.sync().unwrap();

        assert_eq!(writer.backups().unwrap().len(), 2);
        let log_files = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_str().unwrap().starts_with("multi"))
            .count();
        assert_eq!(log_files, 3); // current + 2 backups
    }

    #[test]
    fn test_newest_backup_holds_latest_records() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("order.log");
        let policy = SizeRotationPolicy::new().with_max_bytes(10).with_max_backups(5);
        let mut writer = SizeRotatingWriter::with_policy(&log_path, policy).unwrap();

        for i in 0..4 {
            writer.write_record(format!("record-{}\n", i).as_bytes()).unwrap();
        }

        let backups = writer.backups().unwrap();
        assert_eq!(backups.len(), 3);
        assert_eq!(fs::read_to_string(&backups[0].path).unwrap(), "record-2\n");
        assert_eq!(fs::read_to_string(&backups[2].path).unwrap(), "record-0\n");
        assert_eq!(fs::read_to_string(&log_path).unwrap(), "record-3\n");
    }

    #[test]
    fn test_compression_of_backups() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("zip.log");
        let policy = SizeRotationPolicy::new()
            .with_max_bytes(30)
            .with_max_backups(5)
            .with_compression(true);
        let mut writer = SizeRotatingWriter::with_policy(&log_path, policy).unwrap();

        writer.write_record(b"first record line 0123456\n").unwrap();
        writer.write_record(b"second record line 012345\n").unwrap();

        let backups = writer.backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert!(backups[0].compressed);
        assert!(backups[0].path.to_str().unwrap().ends_with(".log.gz"));

        let mut decoded = String::new();
        GzDecoder::new(File::open(&backups[0].path).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "first record line 0123456\n");
    }

    #[test]
    fn test_expired_backups_removed() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("aged.log");
        let stale = dir.path().join("aged-2001-01-01T00-00-00.000.log");
        fs::write(&stale, b"old\n").unwrap();

        let policy = SizeRotationPolicy::new()
            .with_max_bytes(10)
            .with_max_age(Duration::from_secs(24 * 3600));
        let mut writer = SizeRotatingWriter::with_policy(&log_path, policy).unwrap();
        assert_eq!(writer.backups().unwrap().len(), 1);

        writer.write_record(b"123456789\n").unwrap();
        writer.write_record(b"abcdefghi\n").unwrap();

        assert!(!stale.exists());
        assert_eq!(writer.backups().unwrap().len(), 1);
    }

    #[test]
    fn test_oversized_record_rejected() {
        let dir = tempdir().unwrap();
        let policy = SizeRotationPolicy::new().with_max_bytes(8);
        let mut writer =
            SizeRotatingWriter::with_policy(dir.path().join("small.log"), policy).unwrap();

        let err = writer.write_record(b"0123456789\n").unwrap_err();
        assert!(matches!(err, LoggerError::WriteTooLarge { len: 11, max: 8 }));
    }

    #[test]
    fn test_unrelated_files_ignored() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("svc.log");
        fs::write(dir.path().join("svc-notes.log"), b"x").unwrap();
        fs::write(dir.path().join("other-2001-01-01T00-00-00.000.log"), b"x").unwrap();

        let writer = SizeRotatingWriter::new(&log_path).unwrap();
        assert!(writer.backups().unwrap().is_empty());
    }
}
