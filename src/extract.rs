use crate::track::{MessageKind, Track};
use serde::{Deserialize, Serialize};

/// Controller number of the sustain (damper) pedal
pub const SUSTAIN_PEDAL: u8 = 64;
/// Controller values at or above this count as a pressed pedal
pub const PEDAL_DOWN_THRESHOLD: u8 = 64;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub pitch: u8,
    /// Always 0 for releases
    pub velocity: u8,
    /// Seconds from the start of the file
    pub onset_time: f64,
    pub is_onset: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PedalEvent {
    pub is_depressed: bool,
    pub time: f64,
}

/// Notes and sustain pedal changes of one track, each in track order
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceEvents {
    pub notes: Vec<NoteEvent>,
    pub pedals: Vec<PedalEvent>,
}

/// Splits a track into note and sustain pedal events. Onsets and releases
/// are not paired into durations.
pub fn extract_events(track: &Track) -> PerformanceEvents {
    let mut events = PerformanceEvents::default();
    for message in track.messages() {
        match message.kind {
            MessageKind::NoteOn { key, vel } if vel.as_int() > 0 => {
                events.notes.push(NoteEvent {
                    pitch: key.as_int(),
                    velocity: vel.as_int(),
                    onset_time: message.time,
                    is_onset: true,
                })
            }
            // a silent note-on is a release
            MessageKind::NoteOn { key, .. } | MessageKind::NoteOff { key, .. } => {
                events.notes.push(NoteEvent {
                    pitch: key.as_int(),
                    velocity: 0,
                    onset_time: message.time,
                    is_onset: false,
                })
            }
            MessageKind::Controller { controller, value }
                if controller.as_int() == SUSTAIN_PEDAL =>
            {
                events.pedals.push(PedalEvent {
                    is_depressed: value.as_int() >= PEDAL_DOWN_THRESHOLD,
                    time: message.time,
                })
            }
            _ => {}
        }
    }
    events
}
