//! Writing extracted events next to each other in an output directory.
//! The blob format is bincode and is only meant to be read back by
//! [`load_events`].

use crate::{
    extract::{extract_events, PerformanceEvents},
    loader::FileResult,
};
use anyhow::{bail, Context, Result};
use std::{
    collections::HashSet,
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

pub const EVENTS_EXTENSION: &str = "bin";

/// `out_dir/song.MID.bin` for `some/where/song.MID`. The source extension
/// is kept so `song.mid` and `song.MID` don't share an output file.
pub fn output_path(out_dir: &Path, source: &Path) -> PathBuf {
    let mut name = source
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("events"));
    name.push(".");
    name.push(EVENTS_EXTENSION);
    out_dir.join(name)
}

pub fn save_events(path: &Path, events: &PerformanceEvents) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let bytes = bincode::serialize(events).context("Failed to serialize events")?;
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn load_events(path: &Path) -> Result<PerformanceEvents> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    bincode::deserialize(&bytes).context("Failed to deserialize events")
}

/// Extracts and saves the events of every resolved file, returning how many were written.
/// Fails instead of overwriting when two results map to the same output file.
pub fn export_all(results: &[FileResult], out_dir: &Path) -> Result<usize> {
    let mut written = HashSet::new();
    for result in results {
        if let Some(selected) = result.selected() {
            let path = output_path(out_dir, &result.path);
            if !written.insert(path.clone()) {
                bail!(
                    "{} would overwrite events already written to {}",
                    result.path.display(),
                    path.display()
                );
            }
            let events = extract_events(&selected.track);
            save_events(&path, &events)?;
            debug!(
                "Wrote {} notes and {} pedal events to {}",
                events.notes.len(),
                events.pedals.len(),
                path.display()
            );
        }
    }
    Ok(written.len())
}
