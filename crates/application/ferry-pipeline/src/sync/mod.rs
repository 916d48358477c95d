use camino::Utf8PathBuf;
use ferry_core::remote_path::MirrorPath;

pub mod backend;
pub mod compare;
pub mod remote;
pub mod upload;

pub use backend::RemoteBackend;
pub use compare::Comparator;
pub use remote::HttpBackend;
pub use upload::Uploader;

/// One sync task per command-line source argument. The remote root is the
/// destination folder with the local root's base name appended.
#[derive(Debug, Clone)]
pub struct SyncTask {
    pub local_root: Utf8PathBuf,
    pub remote_root: String,
}

impl SyncTask {
    pub fn new(local_root: Utf8PathBuf, dest_folder: &str) -> Result<Self, SyncError> {
        let remote_root = MirrorPath::destination_root(dest_folder, local_root.as_str())
            .ok_or_else(|| {
                SyncError::Invocation(format!("Cannot derive a remote root from '{local_root}'"))
            })?;
        Ok(Self {
            local_root,
            remote_root,
        })
    }
}

/// Per-invocation upload knobs. Immutable during a run except for the retry
/// counter, which the backend advances across its internal cycles.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub force: bool,
    pub overwrite: bool,
    pub ignore_files: Vec<String>,
    pub retry_attempt: u32,
    pub num_retries: u32,
    pub suppress_dedupe: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            force: false,
            overwrite: false,
            ignore_files: Vec::new(),
            retry_attempt: 0,
            num_retries: 2,
            suppress_dedupe: false,
        }
    }
}

/// High-level error type for sync operations.
///
/// Only `Invocation` and `Local` abort a multi-path batch; remote-side
/// outcomes stay local to one file and are surfaced through reports.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Invocation error: {0}")]
    Invocation(String),
    #[error("Local I/O error: {0}")]
    Local(String),
    #[error("Remote backend error: {0}")]
    Remote(String),
}
