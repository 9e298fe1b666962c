//! Per-host output logs and live progress.
//!
//! Every finished host gets `<log_dir>/<hostname>.txt` holding the raw
//! combined output of its bootstrap. The progress bar only ever shows
//! aggregate counts; individual failures wait for the final report.

use anyhow::{Context, Result};
use fleetkit::{Classification, CommandOutput, Host, RunObserver};
use indicatif::ProgressBar;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Create the log directory if absent.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Could not create {}", dir.display()))
}

/// Log file for a host; path separators in the hostname are replaced.
pub fn log_path(dir: &Path, host: &Host) -> PathBuf {
    let name = host.hostname.replace(['/', '\\'], "_");
    dir.join(format!("{name}.txt"))
}

/// Observer writing log files and driving the progress bar.
pub struct LogObserver {
    dir: PathBuf,
    progress: ProgressBar,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    write_errors: AtomicUsize,
}

impl LogObserver {
    pub fn new(dir: PathBuf, progress: ProgressBar) -> Self {
        Self {
            dir,
            progress,
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            write_errors: AtomicUsize::new(0),
        }
    }

    /// Log files that could not be written
    pub fn write_errors(&self) -> usize {
        self.write_errors.load(Ordering::Relaxed)
    }
}

impl RunObserver for LogObserver {
    fn on_start(&self, host: &Host) {
        log::debug!("Bootstrapping {host}");
    }

    fn on_complete(&self, host: &Host, output: &CommandOutput, classification: Classification) {
        let path = log_path(&self.dir, host);
        if let Err(e) = fs::write(&path, &output.combined) {
            self.write_errors.fetch_add(1, Ordering::Relaxed);
            log::warn!("Could not write {}: {e}", path.display());
        }

        let (ok, failed) = if classification.is_success() {
            (self.succeeded.fetch_add(1, Ordering::Relaxed) + 1, self.failed.load(Ordering::Relaxed))
        } else {
            (self.succeeded.load(Ordering::Relaxed), self.failed.fetch_add(1, Ordering::Relaxed) + 1)
        };
        self.progress.set_message(format!("{ok} ok, {failed} failed"));
        self.progress.inc(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(name: &str) -> Host {
        Host::new(name, "example.com", "prod", "role[web]")
    }

    #[test]
    fn test_log_path() {
        let dir = Path::new("./logs");
        assert_eq!(log_path(dir, &host("web01")), PathBuf::from("./logs/web01.txt"));
        assert_eq!(log_path(dir, &host("../etc")), PathBuf::from("./logs/.._etc.txt"));
    }

    #[test]
    fn test_ensure_dir_creates_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("a").join("logs");
        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
        ensure_dir(&dir).unwrap();
    }

    #[test]
    fn test_on_complete_writes_raw_output() {
        let tmp = tempfile::tempdir().unwrap();
        let observer = LogObserver::new(tmp.path().to_path_buf(), ProgressBar::hidden());
        let output = CommandOutput::new("err\nout\n", 1);

        observer.on_complete(&host("web01"), &output, Classification::GeneralFailure);
        observer.on_complete(&host("web02"), &CommandOutput::default(), Classification::Success);

        let written = fs::read_to_string(tmp.path().join("web01.txt")).unwrap();
        assert_eq!(written, "err\nout\n");
        assert!(tmp.path().join("web02.txt").exists());
        assert_eq!(observer.succeeded.load(Ordering::Relaxed), 1);
        assert_eq!(observer.failed.load(Ordering::Relaxed), 1);
        assert_eq!(observer.write_errors(), 0);
    }

    #[test]
    fn test_unwritable_log_is_counted_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("does-not-exist");
        let observer = LogObserver::new(missing, ProgressBar::hidden());

        observer.on_complete(&host("web01"), &CommandOutput::default(), Classification::Success);
        assert_eq!(observer.write_errors(), 1);
    }
}
