use anyhow::{Context, Result};
use ghost_tail::classify::{first_declared_instrument, has_note_events};
use ghost_tail::selection::{select_track, TargetInstrument};
use ghost_tail::track::{FormatParser, SmfParser};
use std::{env, path::Path};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let mid_file_path = args.get(1).context("usage: ghost-tail-track-info FILE")?;

    let parsed = SmfParser.parse(Path::new(mid_file_path))?;
    println!("midi file has {} tracks!", parsed.tracks.len());

    for (track_num, track) in parsed.tracks.iter().enumerate() {
        let program = match first_declared_instrument(track) {
            Some(program) => program.as_int().to_string(),
            None => "-".to_string(),
        };
        println!(
            "track {} {:?} has {} events, notes: {}, program: {}",
            track_num + 1,
            track.name().unwrap_or(""),
            track.len(),
            has_note_events(track),
            program
        );
    }

    match select_track(&parsed.tracks, &TargetInstrument::default()) {
        Some(selection) => println!(
            "piano track is track {} ({})",
            selection.index + 1,
            selection.rule
        ),
        None => println!("no piano track"),
    }
    Ok(())
}
