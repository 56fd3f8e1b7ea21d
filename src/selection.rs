//! Picking the one track of a file that carries the target instrument.
//!
//! Files in the wild rarely say which track is which, so the decision is a
//! chain of increasingly weak hints. Each rule only resolves when exactly
//! one track satisfies it; a rule matching several tracks falls through to
//! the next one instead of guessing.
//!
//! 1. Only tracks with note-on events are considered at all.
//! 2. A single playing track is the answer.
//! 3. A single playing track whose name contains the instrument keyword.
//! 4. A single playing track whose first program change is the target program.
//! 5. A single playing track without any program change, since General MIDI
//!    defaults every channel to program 0.
//!
//! Anything else is unresolved.

use crate::classify::{first_declared_instrument, has_note_events};
use crate::track::Track;
use midly::num::u7;
use std::fmt;

/// General MIDI program 0
pub const ACOUSTIC_GRAND_PIANO: u8 = 0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetInstrument {
    keyword: String,
    program: u7,
}

impl TargetInstrument {
    pub fn new(keyword: &str, program: u7) -> Self {
        Self {
            keyword: keyword.trim().to_lowercase(),
            program,
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn program(&self) -> u7 {
        self.program
    }

    fn is_named_in(&self, track: &Track) -> bool {
        track
            .name()
            .map(|name| name.trim().to_lowercase().contains(&self.keyword))
            .unwrap_or(false)
    }
}

impl Default for TargetInstrument {
    fn default() -> Self {
        Self::new("piano", ACOUSTIC_GRAND_PIANO.into())
    }
}

/// The rule that resolved a selection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rule {
    SoleCandidate,
    NameKeyword,
    DeclaredProgram,
    DefaultProgram,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            Rule::SoleCandidate => "only track with notes",
            Rule::NameKeyword => "track name",
            Rule::DeclaredProgram => "program change",
            Rule::DefaultProgram => "no program change",
        };
        f.write_str(description)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    /// Position in the file's full track list, not among the candidates
    pub index: usize,
    pub rule: Rule,
}

fn only<T: Copy>(items: &[T]) -> Option<T> {
    match items {
        [item] => Some(*item),
        _ => None,
    }
}

pub fn select_track(tracks: &[Track], target: &TargetInstrument) -> Option<Selection> {
    let candidates = tracks
        .iter()
        .enumerate()
        .filter(|(_, track)| has_note_events(track))
        .collect::<Vec<_>>();

    if let [(index, _)] = candidates[..] {
        return Some(Selection {
            index,
            rule: Rule::SoleCandidate,
        });
    }

    let named = candidates
        .iter()
        .filter(|(_, track)| target.is_named_in(track))
        .map(|(index, _)| *index)
        .collect::<Vec<_>>();
    if let Some(index) = only(&named) {
        return Some(Selection {
            index,
            rule: Rule::NameKeyword,
        });
    }

    let mut declared = vec![];
    let mut undeclared = vec![];
    for (index, track) in &candidates {
        match first_declared_instrument(track) {
            Some(program) if program == target.program => declared.push(*index),
            Some(_) => {}
            None => undeclared.push(*index),
        }
    }

    if let Some(index) = only(&declared) {
        Some(Selection {
            index,
            rule: Rule::DeclaredProgram,
        })
    } else {
        only(&undeclared).map(|index| Selection {
            index,
            rule: Rule::DefaultProgram,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{playing_track, silent_track};
    use rstest::rstest;

    fn piano() -> TargetInstrument {
        TargetInstrument::default()
    }

    fn selected(tracks: &[Track]) -> Option<(usize, Rule)> {
        select_track(tracks, &piano()).map(|selection| (selection.index, selection.rule))
    }

    #[test]
    fn no_tracks() {
        assert_eq!(selected(&[]), None);
    }

    #[test]
    fn only_silent_tracks() {
        let tracks = [silent_track(Some("Piano")), silent_track(None)];
        assert_eq!(selected(&tracks), None);
    }

    #[rstest(
        name,
        program,
        case(None, None),
        case(Some("Violin"), Some(40)),
        case(Some("Piano"), Some(0)),
        case(Some("Drums"), Some(118))
    )]
    fn single_playing_track_wins_whatever_it_is(name: Option<&str>, program: Option<u8>) {
        let tracks = [
            silent_track(Some("Conductor")),
            playing_track(name, program),
            silent_track(Some("Piano")),
        ];
        assert_eq!(selected(&tracks), Some((1, Rule::SoleCandidate)));
    }

    #[rstest(
        name,
        case("Piano"),
        case("  GRAND PIANO "),
        case("Electric piano 2"),
        case("pianoforte")
    )]
    fn single_named_track(name: &str) {
        let tracks = [
            silent_track(Some("Conductor")),
            playing_track(Some("Bass"), Some(0)),
            playing_track(Some(name), Some(4)),
            playing_track(None, None),
        ];
        assert_eq!(selected(&tracks), Some((2, Rule::NameKeyword)));
    }

    #[test]
    fn index_refers_to_full_track_list() {
        let tracks = [
            silent_track(Some("Conductor")),
            silent_track(Some("Lyrics")),
            playing_track(Some("Bass"), Some(33)),
            playing_track(Some("Piano"), Some(0)),
        ];
        assert_eq!(selected(&tracks), Some((3, Rule::NameKeyword)));
    }

    #[test]
    fn silent_named_track_is_not_a_candidate() {
        let tracks = [
            silent_track(Some("Piano")),
            playing_track(Some("Strings"), Some(48)),
            playing_track(Some("Keys"), Some(0)),
        ];
        assert_eq!(selected(&tracks), Some((2, Rule::DeclaredProgram)));
    }

    #[test]
    fn two_named_tracks_fall_through_to_programs() {
        let tracks = [
            playing_track(Some("Piano RH"), Some(0)),
            playing_track(Some("Piano LH"), Some(1)),
        ];
        assert_eq!(selected(&tracks), Some((0, Rule::DeclaredProgram)));
    }

    #[test]
    fn two_named_tracks_with_same_program_are_unresolved() {
        let tracks = [
            playing_track(Some("Piano RH"), Some(0)),
            playing_track(Some("Piano LH"), Some(0)),
        ];
        assert_eq!(selected(&tracks), None);
    }

    #[test]
    fn two_unnamed_tracks_without_programs_are_unresolved() {
        let tracks = [playing_track(None, None), playing_track(Some("Melody"), None)];
        assert_eq!(selected(&tracks), None);
    }

    #[test]
    fn declared_program_beats_default_program() {
        let tracks = [
            playing_track(Some("Melody"), None),
            playing_track(Some("Chords"), Some(0)),
        ];
        assert_eq!(selected(&tracks), Some((1, Rule::DeclaredProgram)));
    }

    #[test]
    fn two_declared_fall_through_to_single_default() {
        let tracks = [
            playing_track(Some("A"), Some(0)),
            playing_track(Some("B"), Some(0)),
            playing_track(Some("C"), None),
            playing_track(Some("D"), Some(25)),
        ];
        assert_eq!(selected(&tracks), Some((2, Rule::DefaultProgram)));
    }

    #[test]
    fn other_programs_are_unresolved() {
        let tracks = [
            playing_track(Some("Guitar"), Some(25)),
            playing_track(Some("Bass"), Some(33)),
        ];
        assert_eq!(selected(&tracks), None);
    }

    #[test]
    fn custom_target_instrument() {
        let target = TargetInstrument::new(" Guitar", 25.into());
        let tracks = [
            playing_track(Some("Piano"), Some(0)),
            playing_track(Some("Nylon guitar"), Some(24)),
        ];
        let selection = select_track(&tracks, &target).unwrap();
        assert_eq!(selection.index, 1);
        assert_eq!(selection.rule, Rule::NameKeyword);
        assert_eq!(target.keyword(), "guitar");
    }

    #[test]
    fn selection_is_repeatable() {
        let tracks = [
            playing_track(Some("Piano RH"), Some(0)),
            playing_track(Some("Piano LH"), None),
            playing_track(Some("Bass"), Some(33)),
        ];
        let first = select_track(&tracks, &piano());
        let second = select_track(&tracks, &piano());
        assert_eq!(first, second);
    }
}
