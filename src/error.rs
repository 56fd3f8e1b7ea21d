use std::{io, time::Duration};

use thiserror::Error;

/// Why a file could not be turned into tracks. Every variant ends up as a
/// corrupted outcome; none of them aborts a scan.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("can't read file: {0}")]
    Read(#[from] io::Error),

    #[error("not a valid MIDI file: {0}")]
    Parse(String),

    #[error("can't build tempo map: {0}")]
    Timing(String),

    #[error("parsing took longer than {0:?}")]
    TimedOut(Duration),

    #[error("parser panicked")]
    Panicked,

    #[error("can't start parser thread: {0}")]
    Spawn(io::Error),
}
