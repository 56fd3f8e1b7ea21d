use crate::{
    error::LoadError,
    scanner::DEFAULT_WORKERS,
    selection::{select_track, Rule, TargetInstrument},
    track::{FormatParser, ParsedFile, SmfParser, Track},
};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    path::{Path, PathBuf},
    sync::Arc,
    thread,
    time::{Duration, Instant},
};
use tracing::{debug, warn};

/// The track picked out of a file, detached from the rest of the file
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedTrack {
    pub index: usize,
    pub rule: Rule,
    pub track: Track,
    pub ticks_per_beat: Option<u16>,
}

#[derive(Debug)]
pub enum Outcome {
    Valid(SelectedTrack),
    NoInstrumentTrack,
    Corrupted(LoadError),
}

#[derive(Debug)]
pub struct FileResult {
    pub path: PathBuf,
    pub outcome: Outcome,
}

impl FileResult {
    pub fn selected(&self) -> Option<&SelectedTrack> {
        match &self.outcome {
            Outcome::Valid(selected) => Some(selected),
            _ => None,
        }
    }
}

/// Tokens for parser threads. A thread holds its token until its parse
/// returns, even after the loader stopped waiting for it.
#[derive(Clone)]
struct ParseSlots {
    release: Sender<()>,
    acquire: Receiver<()>,
}

impl ParseSlots {
    fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        let (release, acquire) = bounded(limit);
        for _ in 0..limit {
            let _ = release.send(());
        }
        Self { release, acquire }
    }
}

struct SlotGuard(Sender<()>);

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let _ = self.0.send(());
    }
}

/// Parses one file and classifies it. Failures never escape as errors,
/// they become a [`Outcome::Corrupted`] or [`Outcome::NoInstrumentTrack`].
#[derive(Clone)]
pub struct Loader {
    parser: Arc<dyn FormatParser>,
    target: TargetInstrument,
    timeout: Option<Duration>,
    slots: ParseSlots,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new(Arc::new(SmfParser), TargetInstrument::default())
    }
}

impl Loader {
    pub fn new(parser: Arc<dyn FormatParser>, target: TargetInstrument) -> Self {
        Self {
            parser,
            target,
            timeout: None,
            slots: ParseSlots::new(*DEFAULT_WORKERS),
        }
    }

    /// Give up on files whose parsing takes longer than `timeout`. The
    /// parser thread of an abandoned file is left to finish on its own.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Caps the parser threads alive at once when a timeout is set,
    /// abandoned ones included. A file that can't get a thread before its
    /// timeout runs out is timed out without being parsed.
    pub fn with_parse_limit(mut self, limit: usize) -> Self {
        self.slots = ParseSlots::new(limit);
        self
    }

    pub fn target(&self) -> &TargetInstrument {
        &self.target
    }

    pub fn load(&self, path: &Path) -> FileResult {
        let outcome = match self.parse(path) {
            Err(err) => {
                warn!("Could not load {}: {}", path.display(), err);
                Outcome::Corrupted(err)
            }
            Ok(parsed) => self.classify(path, parsed),
        };
        FileResult {
            path: path.to_path_buf(),
            outcome,
        }
    }

    fn classify(&self, path: &Path, mut parsed: ParsedFile) -> Outcome {
        match select_track(&parsed.tracks, &self.target) {
            Some(selection) => {
                debug!(
                    "Found {} track {} in {} by {}",
                    self.target.keyword(),
                    selection.index,
                    path.display(),
                    selection.rule
                );
                Outcome::Valid(SelectedTrack {
                    index: selection.index,
                    rule: selection.rule,
                    track: parsed.tracks.swap_remove(selection.index),
                    ticks_per_beat: parsed.ticks_per_beat,
                })
            }
            None => {
                warn!(
                    "Could not find {} track in {}",
                    self.target.keyword(),
                    path.display()
                );
                Outcome::NoInstrumentTrack
            }
        }
    }

    fn parse(&self, path: &Path) -> Result<ParsedFile, LoadError> {
        let timeout = match self.timeout {
            None => {
                return catch_unwind(AssertUnwindSafe(|| self.parser.parse(path)))
                    .unwrap_or(Err(LoadError::Panicked))
            }
            Some(timeout) => timeout,
        };
        let deadline = Instant::now() + timeout;
        if self.slots.acquire.recv_deadline(deadline).is_err() {
            return Err(LoadError::TimedOut(timeout));
        }
        let slot = SlotGuard(self.slots.release.clone());
        let (tx, rx) = bounded(1);
        let parser = Arc::clone(&self.parser);
        let owned_path = path.to_path_buf();
        thread::Builder::new()
            .name("ghost-tail-parse".into())
            .spawn(move || {
                let _slot = slot;
                // the receiver is gone if the loader already gave up
                let _ = tx.send(parser.parse(&owned_path));
            })
            .map_err(LoadError::Spawn)?;
        match rx.recv_deadline(deadline) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(LoadError::TimedOut(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(LoadError::Panicked),
        }
    }
}
