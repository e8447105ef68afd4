//! One ingestion cycle: upload every pending report and file it by outcome.

use crate::error::Result;
use crate::layout::{move_into, Disposition, WatchLayout};
use courier_client::{ImportTransport, Uploader};
use std::path::PathBuf;
use tracing::{debug, error, info};

/// Final location of every report touched in a cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Paths under `processed/`.
    pub processed: Vec<PathBuf>,
    /// Paths under `failed/`.
    pub failed: Vec<PathBuf>,
    /// Reports whose move failed; still in the watched root.
    pub stranded: Vec<PathBuf>,
}

impl CycleReport {
    pub fn total(&self) -> usize {
        self.processed.len() + self.failed.len() + self.stranded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Upload each pending report in path order and move it to `processed/` or
/// `failed/`.
///
/// Per-file problems never abort the cycle. A report whose move fails stays
/// in place and is uploaded again next cycle. Only an unreadable watched
/// directory is returned as an error.
pub async fn process_pending_files<T: ImportTransport>(
    layout: &WatchLayout,
    uploader: &mut Uploader<T>,
) -> Result<CycleReport> {
    let pending = layout.pending_files()?;
    let mut report = CycleReport::default();
    if pending.is_empty() {
        debug!(dir = %layout.root().display(), "No pending reports");
        return Ok(report);
    }

    for file in pending {
        let success = uploader.upload_file(&file).await;
        let disposition = Disposition::from_success(success);
        let destination = layout.destination(disposition);

        match move_into(&file, destination) {
            Ok(moved) => {
                debug!(from = %file.display(), to = %moved.display(), "Moved report");
                match disposition {
                    Disposition::Processed => report.processed.push(moved),
                    Disposition::Failed => report.failed.push(moved),
                }
            }
            Err(err) => {
                error!(
                    file = %file.display(),
                    destination = %destination.display(),
                    error = %err,
                    "Failed to move report; leaving it in place"
                );
                report.stranded.push(file);
            }
        }
    }

    info!(
        processed = report.processed.len(),
        failed = report.failed.len(),
        stranded = report.stranded.len(),
        "Cycle complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use courier_client::{ClientError, ImportEndpoint, ImportResponse};
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;

    /// Answers every upload with a status chosen by endpoint.
    struct StatusByEndpoint {
        sast: u16,
        sca: u16,
        seen: Mutex<Vec<String>>,
    }

    impl StatusByEndpoint {
        fn new(sast: u16, sca: u16) -> Self {
            Self {
                sast,
                sca,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ImportTransport for StatusByEndpoint {
        async fn authenticate(&mut self) -> bool {
            false
        }

        async fn post_report(
            &self,
            endpoint: ImportEndpoint,
            path: &Path,
        ) -> std::result::Result<ImportResponse, ClientError> {
            fs::metadata(path).map_err(|source| ClientError::ReadReport {
                path: path.to_path_buf(),
                source,
            })?;
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            self.seen.lock().unwrap().push(name);
            let status = match endpoint {
                ImportEndpoint::Sast => self.sast,
                ImportEndpoint::Sca => self.sca,
            };
            Ok(ImportResponse {
                status,
                body: "{}".to_string(),
            })
        }
    }

    fn setup(names: &[&str]) -> (tempfile::TempDir, WatchLayout) {
        let dir = tempfile::tempdir().unwrap();
        let layout = WatchLayout::new(dir.path());
        layout.ensure().unwrap();
        for name in names {
            fs::write(dir.path().join(name), b"id,finding\n1,x\n").unwrap();
        }
        (dir, layout)
    }

    #[tokio::test]
    async fn test_files_routed_by_outcome() {
        let (dir, layout) = setup(&["sca_report.csv", "semgrep.csv"]);
        let mut uploader = Uploader::new(StatusByEndpoint::new(500, 200));

        let report = process_pending_files(&layout, &mut uploader).await.unwrap();

        assert_eq!(report.processed, vec![dir.path().join("processed/sca_report.csv")]);
        assert_eq!(report.failed, vec![dir.path().join("failed/semgrep.csv")]);
        assert!(report.stranded.is_empty());
        assert!(!dir.path().join("sca_report.csv").exists());
        assert!(!dir.path().join("semgrep.csv").exists());
    }

    #[tokio::test]
    async fn test_processed_in_sorted_order() {
        let (_dir, layout) = setup(&["b.csv", "a.CSV", "c.csv"]);
        let mut uploader = Uploader::new(StatusByEndpoint::new(200, 200));

        process_pending_files(&layout, &mut uploader).await.unwrap();

        let seen = uploader.transport().seen.lock().unwrap().clone();
        assert_eq!(seen, ["a.CSV", "b.csv", "c.csv"]);
    }

    #[tokio::test]
    async fn test_move_failure_leaves_file_in_place() {
        let (dir, layout) = setup(&["scan.csv"]);
        // A plain file where processed/ should be makes the rename fail.
        let processed = layout.destination(Disposition::Processed).to_path_buf();
        fs::remove_dir(&processed).unwrap();
        fs::write(&processed, b"").unwrap();
        let mut uploader = Uploader::new(StatusByEndpoint::new(200, 200));

        let report = process_pending_files(&layout, &mut uploader).await.unwrap();

        assert_eq!(report.stranded, vec![dir.path().join("scan.csv")]);
        assert!(dir.path().join("scan.csv").is_file());
        assert!(!dir.path().join("failed/scan.csv").exists());

        // Still a candidate next cycle.
        let report = process_pending_files(&layout, &mut uploader).await.unwrap();
        assert_eq!(report.stranded.len(), 1);
        assert_eq!(uploader.transport().seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_each_file_ends_in_exactly_one_place() {
        let names = ["dependency.csv", "sast_1.csv", "supply.CSV", "zz.csv"];
        let (dir, layout) = setup(&names);
        let mut uploader = Uploader::new(StatusByEndpoint::new(200, 503));

        let report = process_pending_files(&layout, &mut uploader).await.unwrap();
        assert_eq!(report.total(), names.len());

        for name in names {
            let locations = [
                dir.path().join(name),
                dir.path().join("processed").join(name),
                dir.path().join("failed").join(name),
            ];
            let present = locations.iter().filter(|p| p.exists()).count();
            assert_eq!(present, 1, "{name} should exist exactly once");
        }
    }

    #[tokio::test]
    async fn test_empty_directory_is_a_noop() {
        let (_dir, layout) = setup(&[]);
        let mut uploader = Uploader::new(StatusByEndpoint::new(200, 200));

        let report = process_pending_files(&layout, &mut uploader).await.unwrap();
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_root_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let layout = WatchLayout::new(dir.path().join("gone"));
        let mut uploader = Uploader::new(StatusByEndpoint::new(200, 200));

        assert!(process_pending_files(&layout, &mut uploader).await.is_err());
    }
}
