//! Builds sinks from a resolved [`Config`]

use super::console::ConsoleSink;
use super::file::FileSink;
use super::size_rotating::{SizeRotatingWriter, SizeRotationPolicy};
use super::time_rotating::{TimeRotatingWriter, TimeRotationPolicy};
use crate::core::{Config, CutType, LogLevel, Result, Sink};

/// One file sink per severity
pub struct LevelSinks {
    pub error: Box<dyn Sink>,
    pub warn: Box<dyn Sink>,
    pub info: Box<dyn Sink>,
    pub debug: Box<dyn Sink>,
}

impl IntoIterator for LevelSinks {
    type Item = (LogLevel, Box<dyn Sink>);
    type IntoIter = std::array::IntoIter<(LogLevel, Box<dyn Sink>), 4>;

    /// Most severe first
    fn into_iter(self) -> Self::IntoIter {
        [
            (LogLevel::Error, self.error),
            (LogLevel::Warn, self.warn),
            (LogLevel::Info, self.info),
            (LogLevel::Debug, self.debug),
        ]
        .into_iter()
    }
}

/// Development-mode console targets
pub struct ConsoleSinks {
    pub stdout: Box<dyn Sink>,
    pub stderr: Box<dyn Sink>,
}

impl Default for ConsoleSinks {
    fn default() -> Self {
        Self {
            stdout: Box::new(ConsoleSink::Stdout),
            stderr: Box::new(ConsoleSink::Stderr),
        }
    }
}

pub struct SinkFactory<'a> {
    config: &'a Config,
}

impl<'a> SinkFactory<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Open the rotating sink for one configured file name
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created or opened
    pub fn build(&self, file_name: &str) -> Result<Box<dyn Sink>> {
        let path = self.config.path_for(file_name);
        match self.config.cut_type {
            CutType::Size => {
                let policy = SizeRotationPolicy::new()
                    .with_max_bytes(self.config.max_size_bytes())
                    .with_max_backups(self.config.max_backups)
                    .with_max_age(self.config.max_age())
                    .with_compression(self.config.compress)
                    .with_local_time(true);
                Ok(Box::new(SizeRotatingWriter::with_policy(path, policy)?))
            }
            CutType::Time => {
                let policy = TimeRotationPolicy::new()
                    .with_pattern(self.config.time_pattern.clone())
                    .with_interval(self.config.rotation_interval)
                    .with_max_age(self.config.max_age());
                Ok(Box::new(TimeRotatingWriter::with_policy(path, policy)?))
            }
        }
    }

    /// All four per-severity sinks
    ///
    /// # Errors
    ///
    /// Fails on the first sink that cannot be opened
    pub fn level_sinks(&self) -> Result<LevelSinks> {
        Ok(LevelSinks {
            error: self.build(self.config.file_name(LogLevel::Error))?,
            warn: self.build(self.config.file_name(LogLevel::Warn))?,
            info: self.build(self.config.file_name(LogLevel::Info))?,
            debug: self.build(self.config.file_name(LogLevel::Debug))?,
        })
    }
}

/// Resolve an engine output path: `stdout`, `stderr`, or a plain file
///
/// # Errors
///
/// Returns error if the file cannot be opened
pub fn open_path(path: &str) -> Result<Box<dyn Sink>> {
    match path {
        "stdout" => Ok(Box::new(ConsoleSink::Stdout)),
        "stderr" => Ok(Box::new(ConsoleSink::Stderr)),
        file => Ok(Box::new(FileSink::new(file)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Options;
    use tempfile::tempdir;

    #[test]
    fn test_level_sinks_order() {
        let dir = tempdir().unwrap();
        let config = Options::new().with_directory(dir.path()).load();
        let sinks = SinkFactory::new(&config).level_sinks().unwrap();

        let order: Vec<LogLevel> = sinks.into_iter().map(|(level, _)| level).collect();
        assert_eq!(
            order,
            vec![LogLevel::Error, LogLevel::Warn, LogLevel::Info, LogLevel::Debug]
        );
    }

    #[test]
    fn test_size_backend_creates_files_eagerly() {
        let dir = tempdir().unwrap();
        let config = Options::new()
            .with_directory(dir.path().join("nested"))
            .with_app_name("svc")
            .load();
        SinkFactory::new(&config).level_sinks().unwrap();

        for name in ["svc-error.log", "svc-warn.log", "svc-info.log", "svc-debug.log"] {
            assert!(dir.path().join("nested").join(name).is_file(), "{} missing", name);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_time_backend_creates_links() {
        let dir = tempdir().unwrap();
        let config = Options::new()
            .with_directory(dir.path())
            .with_cut_type(1)
            .load();
        SinkFactory::new(&config).level_sinks().unwrap();

        let link = dir.path().join("app-info.log");
        assert!(std::fs::symlink_metadata(link).unwrap().file_type().is_symlink());
    }

    #[test]
    fn test_open_path_variants() {
        let dir = tempdir().unwrap();
        assert_eq!(open_path("stdout").unwrap().name(), "stdout");
        assert_eq!(open_path("stderr").unwrap().name(), "stderr");

        let file = dir.path().join("errors.txt");
        let mut sink = open_path(file.to_str().unwrap()).unwrap();
        sink.write_record(b"x\n").unwrap();
        assert!(file.exists());
    }
}
