//! Watched directory layout
//!
//! ```text
//! {watch_dir}/*.csv, *.CSV   inbound reports
//! {watch_dir}/processed/     uploaded successfully
//! {watch_dir}/failed/        upload failed
//! ```
//!
//! The directories double as the work queue: anything still in the root is
//! picked up again next cycle.

use crate::error::{AgentError, Result};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const PROCESSED_DIR: &str = "processed";
pub const FAILED_DIR: &str = "failed";

/// Only these two spellings match; `report.Csv` is not a candidate.
const CANDIDATE_PATTERNS: &[&str] = &["*.csv", "*.CSV"];

/// Where a report ends up after its upload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Processed,
    Failed,
}

impl Disposition {
    pub fn from_success(success: bool) -> Self {
        if success {
            Disposition::Processed
        } else {
            Disposition::Failed
        }
    }
}

#[derive(Debug, Clone)]
pub struct WatchLayout {
    root: PathBuf,
    processed: PathBuf,
    failed: PathBuf,
}

impl WatchLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            processed: root.join(PROCESSED_DIR),
            failed: root.join(FAILED_DIR),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn destination(&self, disposition: Disposition) -> &Path {
        match disposition {
            Disposition::Processed => &self.processed,
            Disposition::Failed => &self.failed,
        }
    }

    /// Create the root and both outcome directories, including parents.
    /// Safe to call repeatedly.
    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.root, &self.processed, &self.failed] {
            fs::create_dir_all(dir).map_err(|e| AgentError::io(dir, e))?;
        }
        Ok(())
    }

    /// Candidate reports directly under the root, sorted by path.
    ///
    /// An unreadable root is an error, as is a root whose path is not valid
    /// UTF-8. Unreadable individual entries are logged and skipped.
    pub fn pending_files(&self) -> Result<Vec<PathBuf>> {
        let _ = fs::read_dir(&self.root).map_err(|e| AgentError::io(&self.root, e))?;

        let root = self.root.to_str().ok_or_else(|| {
            AgentError::Config(format!(
                "watched directory {} is not valid UTF-8",
                self.root.display()
            ))
        })?;
        let escaped_root = glob::Pattern::escape(root);
        let mut found = BTreeSet::new();
        for pattern in CANDIDATE_PATTERNS {
            let full = format!("{}/{}", escaped_root.trim_end_matches('/'), pattern);
            for entry in glob::glob(&full)? {
                match entry {
                    Ok(path) if path.is_file() => {
                        found.insert(path);
                    }
                    Ok(_) => {}
                    Err(err) => warn!(error = %err, "Skipping unreadable entry"),
                }
            }
        }
        Ok(found.into_iter().collect())
    }
}

/// Move `file` into `dir`, keeping its base name. Returns the new path.
///
/// Falls back to copy and delete when the rename crosses filesystems. On any
/// failure the file stays at its original path and no copy is left behind.
pub fn move_into(file: &Path, dir: &Path) -> io::Result<PathBuf> {
    let name = file.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    let target = dir.join(name);

    match fs::rename(file, &target) {
        Ok(()) => Ok(target),
        Err(err) if is_cross_device(&err) => {
            if let Err(copy_err) = fs::copy(file, &target) {
                let _ = fs::remove_file(&target);
                return Err(copy_err);
            }
            if let Err(remove_err) = fs::remove_file(file) {
                let _ = fs::remove_file(&target);
                return Err(remove_err);
            }
            Ok(target)
        }
        Err(err) => Err(err),
    }
}

#[cfg(unix)]
fn is_cross_device(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EXDEV)
}

#[cfg(windows)]
fn is_cross_device(err: &io::Error) -> bool {
    // ERROR_NOT_SAME_DEVICE
    err.raw_os_error() == Some(17)
}

#[cfg(not(any(unix, windows)))]
fn is_cross_device(_err: &io::Error) -> bool {
    false
}
