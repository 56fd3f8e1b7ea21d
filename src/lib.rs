//! Finds the piano track in each file of a MIDI corpus and turns it into
//! note and sustain pedal events.

pub mod classify;
pub mod cmdline;
pub mod error;
pub mod extract;
pub mod loader;
pub mod persist;
pub mod progress;
pub mod scanner;
pub mod selection;
pub mod track;

#[cfg(test)]
mod test_helpers;

pub use error::LoadError;
pub use extract::{extract_events, NoteEvent, PedalEvent, PerformanceEvents};
pub use loader::{FileResult, Loader, Outcome, SelectedTrack};
pub use scanner::{OutcomeCounts, ScanConfig, ScanReport, Scanner};
pub use selection::{select_track, Rule, Selection, TargetInstrument};
pub use track::{FormatParser, Message, MessageKind, ParsedFile, SmfParser, Track};
