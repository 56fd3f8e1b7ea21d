//! Owned, parser-independent view of a multi-track MIDI file.
//!
//! Files are parsed with `midly` and every event is timestamped in seconds
//! using the tempo map of the whole file, so a track can be handed around
//! (and across threads) without borrowing the raw file bytes.

use crate::error::LoadError;
use midi_reader_writer::{midly_0_5::merge_tracks, ConvertTicksToMicroseconds};
use midly::{
    num::{u4, u7},
    MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind,
};
use std::{fs, path::Path};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MessageKind {
    NoteOn { key: u7, vel: u7 },
    NoteOff { key: u7, vel: u7 },
    ProgramChange { program: u7 },
    Controller { controller: u7, value: u7 },
    Meta,
    /// Pitch bend, aftertouch, sysex and escape sequences
    Other,
}

/// One event of a track
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Message {
    /// Absolute position in ticks
    pub ticks: u64,
    /// Ticks since the previous message of the same track
    pub delta: u64,
    /// Absolute position in seconds
    pub time: f64,
    pub channel: Option<u4>,
    pub kind: MessageKind,
}

impl Message {
    /// A channel-less message at the given time, mostly useful for building tracks by hand.
    pub fn at(time: f64, kind: MessageKind) -> Self {
        Self {
            ticks: 0,
            delta: 0,
            time,
            channel: None,
            kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Track {
    name: Option<String>,
    messages: Vec<Message>,
}

impl Track {
    pub fn new(name: Option<String>, messages: Vec<Message>) -> Self {
        Self { name, messages }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParsedFile {
    pub tracks: Vec<Track>,
    /// `None` when the file uses SMPTE timecode instead of metrical timing
    pub ticks_per_beat: Option<u16>,
}

/// Turns a file on disk into tracks. Implementations must be usable from
/// several scanner workers at once.
pub trait FormatParser: Send + Sync {
    fn parse(&self, path: &Path) -> Result<ParsedFile, LoadError>;
}

/// Standard MIDI File parser backed by `midly`
#[derive(Clone, Copy, Debug, Default)]
pub struct SmfParser;

impl FormatParser for SmfParser {
    fn parse(&self, path: &Path) -> Result<ParsedFile, LoadError> {
        let data = fs::read(path)?;
        parse_smf(&data)
    }
}

pub fn parse_smf(data: &[u8]) -> Result<ParsedFile, LoadError> {
    let smf = Smf::parse(data).map_err(|err| LoadError::Parse(err.to_string()))?;
    let timing = smf.header.timing;
    let ticks_per_beat = match timing {
        Timing::Metrical(tpb) => Some(tpb.as_int()),
        Timing::Timecode(..) => None,
    };
    let mut ticks_to_microseconds = ConvertTicksToMicroseconds::try_from(smf.header)
        .map_err(|_| LoadError::Timing(format!("unsupported timing {:?}", timing)))?;

    let mut tracks = smf
        .tracks
        .iter()
        .map(|events| Track {
            name: track_name(events),
            messages: Vec::with_capacity(events.len()),
        })
        .collect::<Vec<_>>();
    let mut previous_ticks = vec![0u64; tracks.len()];

    // Tempo changes usually live in the first track but apply to all of
    // them, so times are converted over the merged stream.
    for (ticks, track_index, event) in merge_tracks(&smf.tracks) {
        let micros = ticks_to_microseconds.convert(ticks, &event);
        let (channel, kind) = convert_event(&event);
        if let Some(track) = tracks.get_mut(track_index) {
            let delta = ticks.saturating_sub(previous_ticks[track_index]);
            previous_ticks[track_index] = ticks;
            track.messages.push(Message {
                ticks,
                delta,
                time: micros as f64 / 1_000_000.0,
                channel,
                kind,
            });
        }
    }

    Ok(ParsedFile {
        tracks,
        ticks_per_beat,
    })
}

fn track_name(events: &[TrackEvent]) -> Option<String> {
    events.iter().find_map(|event| match event.kind {
        TrackEventKind::Meta(MetaMessage::TrackName(name)) => {
            Some(String::from_utf8_lossy(name).into_owned())
        }
        _ => None,
    })
}

fn convert_event(event: &TrackEventKind) -> (Option<u4>, MessageKind) {
    match *event {
        TrackEventKind::Midi { channel, message } => {
            let kind = match message {
                MidiMessage::NoteOn { key, vel } => MessageKind::NoteOn { key, vel },
                MidiMessage::NoteOff { key, vel } => MessageKind::NoteOff { key, vel },
                MidiMessage::ProgramChange { program } => MessageKind::ProgramChange { program },
                MidiMessage::Controller { controller, value } => {
                    MessageKind::Controller { controller, value }
                }
                _ => MessageKind::Other,
            };
            (Some(channel), kind)
        }
        TrackEventKind::Meta(_) => (None, MessageKind::Meta),
        _ => (None, MessageKind::Other),
    }
}
