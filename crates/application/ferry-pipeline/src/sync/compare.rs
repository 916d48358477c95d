use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use ferry_core::classify::CompareReport;
use ferry_core::remote_path::MirrorPath;
use ferry_core::ExistenceReport;
use futures::future::BoxFuture;
use tracing::debug;

use crate::sync::{RemoteBackend, SyncError, SyncTask};

/// Live per-file report sink, called in traversal order.
pub type ReportSink<'a> = &'a mut (dyn FnMut(&CompareReport) + Send);

/// Walks a local tree and reports how each file relates to the remote
/// mirror. Never mutates remote state.
pub struct Comparator {
    backend: Box<dyn RemoteBackend>,
}

impl Comparator {
    pub fn new(backend: Box<dyn RemoteBackend>) -> Self {
        Self { backend }
    }

    /// Depth-first, strictly sequential walk of `task.local_root`: within a
    /// directory all files are resolved first (name order), then
    /// subdirectories are descended (name order).
    ///
    /// Remote lookup failures classify the file as missing and the walk
    /// continues; local I/O failures abort the whole run. Local errors mean
    /// a broken invocation, remote misses are normal sync drift.
    pub async fn compare(
        &self,
        task: &SyncTask,
        on_report: ReportSink<'_>,
    ) -> Result<Vec<CompareReport>, SyncError> {
        let meta = fs::metadata(&task.local_root)
            .map_err(|e| SyncError::Local(format!("Cannot stat '{}': {e}", task.local_root)))?;
        if !meta.is_dir() {
            return Err(SyncError::Invocation(format!(
                "'{}' is not a directory",
                task.local_root
            )));
        }

        let mut reports = Vec::new();
        self.walk(&task.local_root, task, &mut reports, on_report)
            .await?;
        Ok(reports)
    }

    fn walk<'a>(
        &'a self,
        dir: &'a Utf8Path,
        task: &'a SyncTask,
        reports: &'a mut Vec<CompareReport>,
        on_report: ReportSink<'a>,
    ) -> BoxFuture<'a, Result<(), SyncError>> {
        Box::pin(async move {
            let entries = fs::read_dir(dir)
                .map_err(|e| SyncError::Local(format!("Cannot read directory '{dir}': {e}")))?;

            let mut paths = Vec::new();
            for entry in entries {
                let entry = entry
                    .map_err(|e| SyncError::Local(format!("Cannot read directory '{dir}': {e}")))?;
                let path = Utf8PathBuf::from_path_buf(entry.path())
                    .map_err(|p| SyncError::Local(format!("Non-UTF-8 path: {}", p.display())))?;
                paths.push(path);
            }
            paths.sort();

            let mut files = Vec::new();
            let mut subdirs = Vec::new();
            for path in paths {
                let meta = fs::metadata(&path)
                    .map_err(|e| SyncError::Local(format!("Cannot stat '{path}': {e}")))?;
                if meta.is_dir() {
                    subdirs.push(path);
                } else {
                    files.push(path);
                }
            }

            for file in &files {
                let remote =
                    MirrorPath::map(task.local_root.as_str(), &task.remote_root, file.as_str())
                        .ok_or_else(|| {
                            SyncError::Local(format!(
                                "'{file}' is not under '{}'",
                                task.local_root
                            ))
                        })?;

                let existence = match self.backend.exists(&remote, file).await {
                    Ok(existence) => existence,
                    Err(e) => {
                        // Lookup failures are sync drift, not a broken run.
                        debug!("existence lookup failed for {remote}: {e}");
                        ExistenceReport::default()
                    }
                };

                let report = CompareReport::new(file.to_string(), remote, &existence);
                on_report(&report);
                reports.push(report);
            }

            for sub in &subdirs {
                self.walk(sub, task, &mut *reports, &mut *on_report).await?;
            }

            Ok(())
        })
    }
}
