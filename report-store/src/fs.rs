use crate::{PersistedReport, ReportStore, StorageError, format};
use fault_report::FaultReport;
use std::{
    fmt::Write as _,
    fs,
    io::{self, Write as _},
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

/// The default `strftime` style format used for artifact names, a medium
/// length date such as `Oct 19, 2026`.
///
/// As the name only has day granularity, every fault raised on the same day
/// replaces the artifact of the previous one.
pub const DEFAULT_DATE_FORMAT: &str = "%b %-d, %Y";

/// Name of the directory, relative to the per-user data directory, that
/// [`StoreConfig::for_app`] stores reports in
pub const DEFAULT_DIR_NAME: &str = "CrashReports";

const PREFIX: &str = "Crash-";
const EXTENSION: &str = "log";

/// True if the file name has the `Crash-*.log` shape of an artifact
fn is_artifact_name(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == EXTENSION)
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(PREFIX))
}

/// Configuration for a [`FsReportStore`]
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// The directory artifacts are written to, created on demand
    pub root: PathBuf,
    /// The chrono format used to build the date portion of artifact names
    pub file_date_format: String,
}

impl StoreConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            file_date_format: DEFAULT_DATE_FORMAT.to_owned(),
        }
    }

    /// Places the store in a dedicated directory for the app in the per-user
    /// local data directory, or the temp directory if there isn't one
    pub fn for_app(package: &str) -> Self {
        let base = dirs::data_local_dir().unwrap_or_else(std::env::temp_dir);
        Self::new(base.join(package).join(DEFAULT_DIR_NAME))
    }
}

/// Stores each report as a plain text file in a single directory
pub struct FsReportStore {
    config: StoreConfig,
}

impl FsReportStore {
    #[inline]
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self::new(StoreConfig::new(root))
    }

    #[inline]
    pub fn for_app(package: &str) -> Self {
        Self::new(StoreConfig::for_app(package))
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// The path the specified report is persisted to
    pub fn artifact_path(&self, report: &FaultReport) -> PathBuf {
        let timestamp = report.timestamp();

        let mut date = String::new();
        if write!(date, "{}", timestamp.format(&self.config.file_date_format)).is_err() {
            log::warn!(
                "invalid artifact date format '{}', falling back to the default",
                self.config.file_date_format
            );
            date.clear();
            let _ = write!(date, "{}", timestamp.format(DEFAULT_DATE_FORMAT));
        }

        // Keep locale formats with separators like `10/19/26` in a single
        // path component
        let date = date.replace(['/', '\\', ':'], "-");

        self.config
            .root
            .join(format!("{PREFIX}{date}.{EXTENSION}"))
    }

    /// The paths of every report artifact in the store, ordered by name
    pub fn list(&self) -> Result<Vec<PathBuf>, StorageError> {
        let root = self.root();
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::unreadable(root, e)),
        };

        let mut artifacts = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::unreadable(root, e))?;
            let path = entry.path();

            if path.is_file() && is_artifact_name(&path) {
                artifacts.push(path);
            }
        }

        artifacts.sort();
        Ok(artifacts)
    }

    /// Reads a persisted artifact back
    pub fn load(&self, path: &Path) -> Result<PersistedReport, StorageError> {
        let contents =
            fs::read_to_string(path).map_err(|e| StorageError::unreadable(path, e))?;
        format::parse_report(&contents).map_err(|e| StorageError::unreadable(path, e))
    }
}

impl ReportStore for FsReportStore {
    fn persist(&self, report: &FaultReport) -> Result<PathBuf, StorageError> {
        let root = self.root();
        fs::create_dir_all(root).map_err(|e| StorageError::unwritable(root, e))?;

        let path = self.artifact_path(report);

        // Never append to, or partially overwrite, an artifact that happens
        // to share the same name
        match fs::remove_file(&path) {
            Ok(()) => log::debug!("replacing existing report {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::unwritable(path, e)),
        }

        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| StorageError::unwritable(&path, e))?;

        let mut writer = io::BufWriter::new(file);
        format::write_report(&mut writer, report)
            .and_then(|()| writer.flush())
            .map_err(|e| StorageError::unwritable(&path, e))?;

        Ok(path)
    }

    fn purge_older_than(&self, max_age: Duration) -> usize {
        let root = self.root();
        let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
            return 0;
        };

        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() == io::ErrorKind::NotFound {
                    log::debug!("no reports to purge in {}", root.display());
                } else {
                    log::warn!("unable to enumerate reports in {}: {e}", root.display());
                }
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("unable to read entry in {}: {e}", root.display());
                    continue;
                }
            };

            // Only artifacts are ever removed, the root may be shared with
            // files the store doesn't own
            let path = entry.path();
            if !is_artifact_name(&path) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(md) => md,
                Err(e) => {
                    log::warn!("unable to stat {}: {e}", path.display());
                    continue;
                }
            };

            let modified = match metadata.modified() {
                Ok(modified) => modified,
                Err(e) => {
                    log::warn!("unable to get modification time of {}: {e}", path.display());
                    continue;
                }
            };

            if !metadata.is_file() || modified >= cutoff {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => {
                    log::debug!("removed outdated report {}", path.display());
                    removed += 1;
                }
                Err(e) => log::warn!("failed to remove outdated report {}: {e}", path.display()),
            }
        }

        removed
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{Local, TimeZone};
    use fault_report::{Environment, FaultSummary, ThreadIdentity, keys};

    fn report_at(timestamp: chrono::DateTime<Local>, lines: &[&str]) -> FaultReport {
        FaultReport::new(
            timestamp,
            ThreadIdentity::new(Some("main".to_owned()), "ThreadId(1)"),
            FaultSummary::from_lines(lines),
            Environment::new()
                .with(keys::MANUFACTURER, "Embark")
                .with(keys::MODEL, "Devkit 3")
                .with(keys::OS_VERSION, "Linux 6.1.0")
                .with(keys::APP_VERSION, "1.4.2(88)"),
        )
    }

    fn age(path: &Path, by: Duration) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - by).unwrap();
    }

    #[test]
    fn names_by_date() {
        let store = FsReportStore::with_root("/reports");
        let ts = Local.with_ymd_and_hms(2026, 10, 19, 13, 37, 0).unwrap();

        assert_eq!(
            store.artifact_path(&report_at(ts, &["boom"])),
            Path::new("/reports/Crash-Oct 19, 2026.log")
        );

        let mut config = StoreConfig::new("/reports");
        config.file_date_format = "%m/%d/%y".to_owned();
        assert_eq!(
            FsReportStore::new(config).artifact_path(&report_at(ts, &["boom"])),
            Path::new("/reports/Crash-10-19-26.log")
        );
    }

    #[test]
    fn persist_creates_root_and_round_trips() {
        let td = tempfile::tempdir().unwrap();
        let store = FsReportStore::with_root(td.path().join("nested").join("CrashReports"));

        let report = report_at(Local::now(), &["index out of bounds", "\tat level::load"]);
        let path = store.persist(&report).unwrap();

        assert_eq!(store.list().unwrap(), [path.clone()]);

        let read = store.load(&path).unwrap();
        assert_eq!(&read.environment, report.environment());
        assert_eq!(read.trace, *report.summary());
    }

    #[test]
    fn persist_replaces_same_name() {
        let td = tempfile::tempdir().unwrap();
        let store = FsReportStore::with_root(td.path());
        let ts = Local::now();

        let first = store
            .persist(&report_at(ts, &["a much longer first fault message", "\tat a"]))
            .unwrap();
        let second = store.persist(&report_at(ts, &["second"])).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.list().unwrap().len(), 1);
        assert_eq!(store.load(&second).unwrap().trace.lines(), ["second"]);
    }

    #[test]
    fn persist_fails_when_root_is_a_file() {
        let td = tempfile::tempdir().unwrap();
        let blocker = td.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let store = FsReportStore::with_root(&blocker);
        let err = store.persist(&report_at(Local::now(), &["boom"])).unwrap_err();
        assert_eq!(err.kind, crate::StorageErrorKind::Unwritable);
    }

    #[test]
    fn purges_only_outdated() {
        let td = tempfile::tempdir().unwrap();
        let store = FsReportStore::with_root(td.path());

        let fresh = td.path().join("Crash-fresh.log");
        let stale = td.path().join("Crash-stale.log");
        fs::write(&fresh, b"fresh").unwrap();
        fs::write(&stale, b"stale").unwrap();

        age(&fresh, Duration::from_secs(60 * 60));
        age(&stale, Duration::from_secs(8 * 24 * 60 * 60));

        assert_eq!(store.purge_default(), 1);
        assert!(fresh.exists());
        assert!(!stale.exists());
    }

    #[test]
    fn purge_leaves_foreign_entries() {
        let td = tempfile::tempdir().unwrap();
        let store = FsReportStore::with_root(td.path());
        let month = Duration::from_secs(30 * 24 * 60 * 60);

        let stale = td.path().join("Crash-stale.log");
        let notes = td.path().join("notes.txt");
        let other_log = td.path().join("server.log");
        let project = td.path().join("project");
        let lookalike = td.path().join("Crash-dir.log");

        for file in [&stale, &notes, &other_log] {
            fs::write(file, b"old").unwrap();
            age(file, month);
        }

        for dir in [&project, &lookalike] {
            fs::create_dir(dir).unwrap();
            fs::write(dir.join("Crash-inner.log"), b"old").unwrap();
            age(&dir.join("Crash-inner.log"), month);
            fs::File::open(dir)
                .unwrap()
                .set_modified(SystemTime::now() - month)
                .unwrap();
        }

        assert_eq!(store.purge_default(), 1);
        assert!(!stale.exists());
        assert!(notes.exists());
        assert!(other_log.exists());
        assert!(project.join("Crash-inner.log").exists());
        assert!(lookalike.join("Crash-inner.log").exists());
    }

    #[test]
    fn purge_missing_root_is_silent() {
        let td = tempfile::tempdir().unwrap();
        let store = FsReportStore::with_root(td.path().join("never-created"));
        assert_eq!(store.purge_older_than(Duration::ZERO), 0);
    }

    #[test]
    fn load_rejects_garbage() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("Crash-garbage.log");
        fs::write(&path, b"this is not a report").unwrap();

        let err = FsReportStore::with_root(td.path()).load(&path).unwrap_err();
        assert_eq!(err.kind, crate::StorageErrorKind::Unreadable);
        assert_eq!(err.path, path);
    }
}
