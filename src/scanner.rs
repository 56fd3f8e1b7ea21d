//! Finding MIDI files in a directory and classifying all of them on a
//! bounded pool of worker threads.

use crate::{
    loader::{FileResult, Loader, Outcome},
    progress::ProgressSink,
    selection::TargetInstrument,
    track::{FormatParser, SmfParser},
};
use anyhow::{bail, Context, Result};
use crossbeam_channel::unbounded;
use once_cell::sync::Lazy;
use std::{
    collections::BTreeSet,
    ffi::OsStr,
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::Arc,
    thread,
    time::Duration,
};
use tracing::{info, warn};

/// Parsing is mostly waiting for the disk, so twice the core count keeps
/// the CPUs busy without opening thousands of files at once.
pub static DEFAULT_WORKERS: Lazy<usize> = Lazy::new(|| {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
        * 2
});

#[derive(Clone, Debug)]
pub struct ScanConfig {
    pub workers: usize,
    /// Matched without regard to case and without the leading dot
    pub extensions: Vec<String>,
    pub target: TargetInstrument,
    pub file_timeout: Option<Duration>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: *DEFAULT_WORKERS,
            extensions: vec!["mid".to_string()],
            target: TargetInstrument::default(),
            file_timeout: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub valid: usize,
    pub no_instrument: usize,
    pub corrupted: usize,
}

impl OutcomeCounts {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Valid(_) => self.valid += 1,
            Outcome::NoInstrumentTrack => self.no_instrument += 1,
            Outcome::Corrupted(_) => self.corrupted += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.valid + self.no_instrument + self.corrupted
    }
}

#[derive(Debug)]
pub struct ScanReport {
    /// Only files with a resolved track, in completion order
    pub valid: Vec<FileResult>,
    pub counts: OutcomeCounts,
}

pub struct Scanner {
    loader: Loader,
    config: ScanConfig,
    progress: Box<dyn ProgressSink>,
}

impl Scanner {
    pub fn new(config: ScanConfig, progress: Box<dyn ProgressSink>) -> Self {
        Self::with_parser(Arc::new(SmfParser), config, progress)
    }

    pub fn with_parser(
        parser: Arc<dyn FormatParser>,
        config: ScanConfig,
        progress: Box<dyn ProgressSink>,
    ) -> Self {
        let loader = Loader::new(parser, config.target.clone())
            .with_timeout(config.file_timeout)
            .with_parse_limit(config.workers);
        Self {
            loader,
            config,
            progress,
        }
    }

    pub fn scan_directory(&mut self, dir: &Path) -> Result<ScanReport> {
        let files = discover_files(dir, &self.config.extensions)?;
        info!(
            "Found {} midi files in {}. Processing...",
            files.len(),
            dir.display()
        );
        let total = files.len();
        let report = self.scan_files(files);
        let counts = report.counts;
        info!(
            "Found {} {} tracks in {} files.",
            counts.valid,
            self.loader.target().keyword(),
            total
        );
        info!(
            "Found {} files without {}.",
            counts.no_instrument,
            self.loader.target().keyword()
        );
        info!("Found {} corrupted files.", counts.corrupted);
        Ok(report)
    }

    /// Loads every file on the worker pool. Results arrive in completion
    /// order, not in the order of `files`.
    pub fn scan_files(&mut self, files: Vec<PathBuf>) -> ScanReport {
        let total = files.len();
        let workers = self.config.workers.clamp(1, total.max(1));
        let (job_tx, job_rx) = unbounded::<PathBuf>();
        let (done_tx, done_rx) = unbounded::<FileResult>();
        for path in files {
            // job_rx is still held here, so the send can't fail
            let _ = job_tx.send(path);
        }
        drop(job_tx);

        let loader = &self.loader;
        let progress = &mut self.progress;
        let mut counts = OutcomeCounts::default();
        let mut valid = vec![];
        progress.start(total);
        thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let done_tx = done_tx.clone();
                scope.spawn(move || {
                    for path in job_rx {
                        if done_tx.send(loader.load(&path)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(done_tx);

            for (completed, result) in done_rx.iter().enumerate() {
                counts.record(&result.outcome);
                if let Outcome::Valid(_) = result.outcome {
                    valid.push(result);
                }
                progress.advance(completed + 1, total);
            }
        });
        progress.finish(&counts);

        ScanReport { valid, counts }
    }
}

/// Files directly inside `dir` whose extension is one of `extensions`,
/// sorted and without duplicates. Fails only if `dir` itself can't be listed.
pub fn discover_files(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    let mut files = BTreeSet::new();
    let entries = fs::read_dir(dir).with_context(|| format!("can't list {}", dir.display()))?;
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(err) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), err);
                continue;
            }
        };
        if path.is_file() && has_extension(&path, extensions) {
            files.insert(path);
        }
    }
    Ok(files.into_iter().collect())
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    match path.extension().and_then(OsStr::to_str) {
        Some(ext) => extensions
            .iter()
            .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext)),
        None => false,
    }
}
