use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use midly::{
    num::{u15, u24, u28, u4},
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind,
};

use crate::{
    error::LoadError,
    track::{FormatParser, Message, MessageKind, ParsedFile, Track},
};

/// Delta ticks and event, in file order
pub type RawTrack = Vec<(u32, TrackEventKind<'static>)>;

/// Encodes tracks as a parallel Standard MIDI File at 480 ticks per beat.
pub fn smf_bytes(tracks: &[RawTrack]) -> Vec<u8> {
    let smf = Smf {
        header: Header::new(Format::Parallel, Timing::Metrical(u15::from(480))),
        tracks: tracks
            .iter()
            .map(|track| {
                track
                    .iter()
                    .map(|(delta, kind)| TrackEvent {
                        delta: u28::from(*delta),
                        kind: *kind,
                    })
                    .collect()
            })
            .collect(),
    };
    let mut bytes = Vec::new();
    smf.write_std(&mut bytes).expect("can't encode test MIDI file");
    bytes
}

pub fn write_midi_file(dir: &Path, file_name: &str, tracks: &[RawTrack]) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, smf_bytes(tracks)).expect("can't write test MIDI file");
    path
}

fn channel_message(message: MidiMessage) -> TrackEventKind<'static> {
    TrackEventKind::Midi {
        channel: u4::from(0),
        message,
    }
}

pub fn note_on(key: u8, vel: u8) -> TrackEventKind<'static> {
    channel_message(MidiMessage::NoteOn {
        key: key.into(),
        vel: vel.into(),
    })
}

pub fn program(program: u8) -> TrackEventKind<'static> {
    channel_message(MidiMessage::ProgramChange {
        program: program.into(),
    })
}

pub fn controller(controller: u8, value: u8) -> TrackEventKind<'static> {
    channel_message(MidiMessage::Controller {
        controller: controller.into(),
        value: value.into(),
    })
}

pub fn track_name(name: &'static str) -> TrackEventKind<'static> {
    TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes()))
}

pub fn tempo(microseconds_per_beat: u32) -> TrackEventKind<'static> {
    TrackEventKind::Meta(MetaMessage::Tempo(u24::from(microseconds_per_beat)))
}

pub fn end_of_track() -> TrackEventKind<'static> {
    TrackEventKind::Meta(MetaMessage::EndOfTrack)
}

/// A playable track with an optional program change before its single note.
pub fn playing_track(name: Option<&str>, program: Option<u8>) -> Track {
    let mut messages = vec![];
    if let Some(program) = program {
        messages.push(Message::at(
            0.0,
            MessageKind::ProgramChange {
                program: program.into(),
            },
        ));
    }
    messages.push(Message::at(
        0.0,
        MessageKind::NoteOn {
            key: 60.into(),
            vel: 80.into(),
        },
    ));
    messages.push(Message::at(
        1.0,
        MessageKind::NoteOff {
            key: 60.into(),
            vel: 0.into(),
        },
    ));
    Track::new(name.map(String::from), messages)
}

/// A track holding only meta events, like a conductor track.
pub fn silent_track(name: Option<&str>) -> Track {
    Track::new(
        name.map(String::from),
        vec![Message::at(0.0, MessageKind::Meta)],
    )
}

/// Raw events of a two-track file whose second track is an unambiguous piano part.
pub fn piano_song(name: &'static str) -> Vec<RawTrack> {
    vec![
        vec![(0, track_name("Conductor")), (0, end_of_track())],
        vec![
            (0, track_name(name)),
            (0, program(0)),
            (0, note_on(60, 80)),
            (480, controller(64, 100)),
            (0, note_on(60, 0)),
            (0, end_of_track()),
        ],
    ]
}

/// A parser that hangs for a while and then fails, remembering the most
/// parses it ever saw running at once.
#[derive(Clone, Default)]
pub struct CountingParser {
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl CountingParser {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl FormatParser for CountingParser {
    fn parse(&self, _path: &Path) -> Result<ParsedFile, LoadError> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(200));
        self.running.fetch_sub(1, Ordering::SeqCst);
        Err(LoadError::Parse("hung".into()))
    }
}
