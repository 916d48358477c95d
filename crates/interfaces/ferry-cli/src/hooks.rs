use std::time::{Duration, Instant};

use camino::Utf8Path;
use ferry_core::classify::CompletionReport;
use ferry_core::FileCompletion;
use ferry_pipeline::progress::{emit_completion, ProgressState, TransferHooks};
use humansize::{format_size, DECIMAL};
use indicatif::{ProgressBar, ProgressStyle};

/// Progress-bar hooks: one indicatif bar for the single in-flight file.
///
/// Redraws are gated by `ProgressState`, not per chunk; the bar is torn
/// down (forced to 100% when short) before the completion line is logged.
pub struct ProgressHooks {
    interval: Duration,
    active: Option<(ProgressBar, ProgressState)>,
}

impl ProgressHooks {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            active: None,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{prefix} {percent:>3}%[{bar:20}] {msg} ({bytes}/{total_bytes} bytes)",
        )
        .unwrap()
        .progress_chars("= ")
    }
}

impl TransferHooks for ProgressHooks {
    fn on_file_start(&mut self, local_path: &Utf8Path, total_bytes: u64) {
        let bar = ProgressBar::new(total_bytes);
        bar.set_style(Self::style());
        bar.set_prefix(format!("Uploading '{local_path}'"));
        self.active = Some((
            bar,
            ProgressState::new(total_bytes, self.interval, Instant::now()),
        ));
    }

    fn on_file_progress(&mut self, _local_path: &Utf8Path, chunk_len: u64) {
        if let Some((bar, state)) = self.active.as_mut() {
            if let Some(frame) = state.record(chunk_len, Instant::now()) {
                bar.set_position(frame.bytes_uploaded);
                bar.set_message(format!("{}/s", format_size(frame.speed_bps, DECIMAL)));
            }
        }
    }

    fn on_file_complete(&mut self, completion: &FileCompletion) {
        if let Some((bar, mut state)) = self.active.take() {
            if let Some(frame) = state.finish(Instant::now()) {
                bar.set_position(frame.bytes_uploaded);
            }
            bar.finish_and_clear();
        }
        emit_completion(&CompletionReport::classify(completion));
    }
}
