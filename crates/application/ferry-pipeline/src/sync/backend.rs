use camino::Utf8Path;
use ferry_core::ExistenceReport;

use crate::progress::TransferHooks;
use crate::sync::{SyncError, UploadOptions};

/// The remote storage collaborator.
///
/// `exists` never mutates remote state; the upload calls are the only
/// mutation path. Both upload calls drive the hook set: `on_file_start`
/// once per file, `on_file_progress` per chunk, `on_file_complete` once per
/// completion cycle. `upload_directory` walks the subtree itself and
/// applies `ignore_files` filtering.
#[async_trait::async_trait]
pub trait RemoteBackend: Send + Sync {
    async fn exists(
        &self,
        remote_path: &str,
        local_path: &Utf8Path,
    ) -> Result<ExistenceReport, SyncError>;

    async fn upload_file(
        &self,
        local_path: &Utf8Path,
        remote_folder: &str,
        options: &UploadOptions,
        hooks: &mut dyn TransferHooks,
    ) -> Result<(), SyncError>;

    async fn upload_directory(
        &self,
        local_path: &Utf8Path,
        remote_folder: &str,
        options: &UploadOptions,
        hooks: &mut dyn TransferHooks,
    ) -> Result<(), SyncError>;
}
