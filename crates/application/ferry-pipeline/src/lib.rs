pub mod progress;
pub mod sync;

// Re-export core engine components
pub use progress::{emit_completion, ProgressState, QuietHooks, RenderFrame, TransferHooks};
pub use sync::{
    Comparator, HttpBackend, RemoteBackend, SyncError, SyncTask, UploadOptions, Uploader,
};

// Re-export domain types often needed by consumers
pub use ferry_core::classify::{CompareKind, CompareReport, CompletionReport};
pub use ferry_core::{ExistenceReport, FileCompletion, OutcomeData, ResponseInfo, UploadOutcome};
