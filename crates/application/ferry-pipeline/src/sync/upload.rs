use std::fs;

use camino::Utf8PathBuf;
use tracing::debug;

use crate::progress::TransferHooks;
use crate::sync::{RemoteBackend, SyncError, UploadOptions};

/// Pushes local files and directories to the backend, one at a time. The
/// only component that mutates remote state.
pub struct Uploader {
    backend: Box<dyn RemoteBackend>,
}

impl Uploader {
    pub fn new(backend: Box<dyn RemoteBackend>) -> Self {
        Self { backend }
    }

    /// Upload each local path into `remote_folder`, strictly in input
    /// order; path *n* is fully resolved before path *n+1* starts.
    ///
    /// A missing local path is fatal for the whole run, unlike the
    /// comparator's treatment of missing remote files. Per-file upload
    /// failures are surfaced through the completion hook and do not abort
    /// the batch; only transport-level backend errors do.
    pub async fn upload(
        &self,
        local_paths: &[Utf8PathBuf],
        remote_folder: &str,
        options: &UploadOptions,
        hooks: &mut dyn TransferHooks,
    ) -> Result<(), SyncError> {
        if local_paths.is_empty() {
            return Err(SyncError::Invocation(
                "Destination path must be specified".into(),
            ));
        }

        for local in local_paths {
            let meta = fs::metadata(local)
                .map_err(|_| SyncError::Invocation(format!("No file exists at '{local}'")))?;

            debug!("uploading {local} -> {remote_folder}");
            if meta.is_dir() {
                self.backend
                    .upload_directory(local, remote_folder, options, &mut *hooks)
                    .await?;
            } else {
                self.backend
                    .upload_file(local, remote_folder, options, &mut *hooks)
                    .await?;
            }
        }

        Ok(())
    }
}
