use std::time::{Duration, Instant};

use camino::Utf8Path;
use ferry_core::classify::CompletionReport;
use ferry_core::{FileCompletion, Severity};
use tracing::{error, info, warn};

/// Byte accounting for the single in-flight upload.
///
/// Created in `on_file_start`, owned by the hooks object, dropped when the
/// file's completion fires. Uploads are strictly sequential, so at most one
/// of these exists at a time. Time is passed in explicitly so the throttle
/// can be driven deterministically.
#[derive(Debug)]
pub struct ProgressState {
    total_bytes: u64,
    bytes_uploaded: u64,
    bytes_since_render: u64,
    last_render: Instant,
    interval: Duration,
}

/// One redraw worth of progress data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderFrame {
    pub bytes_uploaded: u64,
    pub total_bytes: u64,
    pub speed_bps: u64,
}

impl ProgressState {
    pub fn new(total_bytes: u64, interval: Duration, now: Instant) -> Self {
        Self {
            total_bytes,
            bytes_uploaded: 0,
            bytes_since_render: 0,
            last_render: now,
            interval,
        }
    }

    /// Account for one transferred chunk. Returns a frame only when a
    /// redraw is due: the configured interval has elapsed since the last
    /// one, or the file just completed. Redrawing on every chunk would
    /// dominate wall-clock time on fast transfers of many small chunks.
    pub fn record(&mut self, chunk_len: u64, now: Instant) -> Option<RenderFrame> {
        self.bytes_since_render += chunk_len;
        self.bytes_uploaded += chunk_len;

        let elapsed = now.duration_since(self.last_render);
        if elapsed < self.interval && self.bytes_uploaded < self.total_bytes {
            return None;
        }

        let elapsed_ms = elapsed.as_millis().max(1) as u64;
        let frame = RenderFrame {
            bytes_uploaded: self.bytes_uploaded,
            total_bytes: self.total_bytes,
            speed_bps: self.bytes_since_render * 1000 / elapsed_ms,
        };
        self.last_render = now;
        self.bytes_since_render = 0;
        Some(frame)
    }

    /// Force the final 100% frame when the transfer ended short of one.
    pub fn finish(&mut self, now: Instant) -> Option<RenderFrame> {
        if self.is_complete() {
            return None;
        }
        let remaining = self.total_bytes - self.bytes_uploaded;
        self.record(remaining, now)
    }

    pub fn is_complete(&self) -> bool {
        self.bytes_uploaded >= self.total_bytes
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn bytes_uploaded(&self) -> u64 {
        self.bytes_uploaded
    }
}

/// Upload lifecycle hooks, invoked by the backend and consumed by the
/// presentation layer. Reporting is observational; it never changes engine
/// control flow.
pub trait TransferHooks: Send {
    /// Fires once per file, immediately before transfer starts.
    fn on_file_start(&mut self, local_path: &Utf8Path, total_bytes: u64);
    /// Fires per transferred chunk.
    fn on_file_progress(&mut self, local_path: &Utf8Path, chunk_len: u64);
    /// Fires once per completion cycle, terminal for that cycle.
    fn on_file_complete(&mut self, completion: &FileCompletion);
}

/// Emit a classified completion as exactly one leveled log line.
pub fn emit_completion(report: &CompletionReport) {
    match report.severity {
        Severity::Info => info!("{}", report.message),
        Severity::Warn => warn!("{}", report.message),
        Severity::Error => error!("{}", report.message),
    }
}

/// Hooks for runs without progress bars: log terminal outcomes, skip
/// rendering entirely.
#[derive(Debug, Default)]
pub struct QuietHooks;

impl TransferHooks for QuietHooks {
    fn on_file_start(&mut self, _local_path: &Utf8Path, _total_bytes: u64) {}

    fn on_file_progress(&mut self, _local_path: &Utf8Path, _chunk_len: u64) {}

    fn on_file_complete(&mut self, completion: &FileCompletion) {
        emit_completion(&CompletionReport::classify(completion));
    }
}
