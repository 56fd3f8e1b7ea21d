use crate::track::{MessageKind, Track};
use midly::num::u7;

/// Whether the track plays anything. Zero-velocity note-ons count too.
pub fn has_note_events(track: &Track) -> bool {
    track
        .messages()
        .iter()
        .any(|message| matches!(message.kind, MessageKind::NoteOn { .. }))
}

pub fn has_instrument_change(track: &Track) -> bool {
    first_declared_instrument(track).is_some()
}

/// Program of the first program change in the track. Later changes are ignored.
pub fn first_declared_instrument(track: &Track) -> Option<u7> {
    track
        .messages()
        .iter()
        .find_map(|message| match message.kind {
            MessageKind::ProgramChange { program } => Some(program),
            _ => None,
        })
}
