use crate::scanner::OutcomeCounts;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

const BAR_TEMPLATE: &str = "{spinner:.cyan} Processing... [{bar:40.green/dim}] {pos}/{len} ({eta})";

/// Receives scan progress from the coordinating thread. Workers never
/// talk to the sink directly.
pub trait ProgressSink: Send {
    fn start(&mut self, total: usize);
    fn advance(&mut self, completed: usize, total: usize);
    fn finish(&mut self, counts: &OutcomeCounts);
}

/// Console progress bar on stderr
#[derive(Default)]
pub struct BarProgress {
    bar: Option<ProgressBar>,
}

impl BarProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for BarProgress {
    fn start(&mut self, total: usize) {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
            bar.set_style(style.progress_chars("█▓▒░ "));
        }
        self.bar = Some(bar);
    }

    fn advance(&mut self, completed: usize, _total: usize) {
        if let Some(bar) = &self.bar {
            bar.set_position(completed as u64);
        }
    }

    fn finish(&mut self, _counts: &OutcomeCounts) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

/// Logs progress roughly every tenth of the corpus, for runs without a terminal.
#[derive(Default)]
pub struct LogProgress {
    step: usize,
    last_reported: usize,
}

impl ProgressSink for LogProgress {
    fn start(&mut self, total: usize) {
        self.step = (total / 10).max(1);
        self.last_reported = 0;
    }

    fn advance(&mut self, completed: usize, total: usize) {
        if completed == total || completed >= self.last_reported + self.step {
            info!("Processed {}/{} files", completed, total);
            self.last_reported = completed;
        }
    }

    fn finish(&mut self, counts: &OutcomeCounts) {
        info!("Processed {} files", counts.total());
    }
}

pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn start(&mut self, _total: usize) {}

    fn advance(&mut self, _completed: usize, _total: usize) {}

    fn finish(&mut self, _counts: &OutcomeCounts) {}
}
