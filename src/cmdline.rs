use crate::{scanner::ScanConfig, selection::TargetInstrument};
use midly::num::u7;
use std::{num::ParseIntError, path::PathBuf, time::Duration};

use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(
    name = "ghost-tail",
    about = "Finds the piano track of every MIDI file in a directory"
)]
pub struct Cli {
    #[structopt(parse(from_os_str), default_value = "data/raw/jazz-piano-midi")]
    pub directory: PathBuf,
    /// Number of files parsed at once [default: twice the number of cores]
    #[structopt(short = "j", long = "workers")]
    pub workers: Option<usize>,
    /// Track name fragment identifying the instrument
    #[structopt(short = "k", long = "keyword", default_value = "piano")]
    pub keyword: String,
    /// General MIDI program of the instrument
    #[structopt(
        short = "p",
        long = "program",
        parse(try_from_str = parse_program),
        default_value = "0"
    )]
    pub program: u7,
    /// File extension to scan, repeatable [default: mid]
    #[structopt(short = "e", long = "extension")]
    pub extensions: Vec<String>,
    /// Give up on a file after this many milliseconds
    #[structopt(short = "t", long = "timeout", parse(try_from_str = parse_duration))]
    pub timeout: Option<Duration>,
    /// Write the note and pedal events of every piano track here
    #[structopt(short = "o", long = "output-dir", parse(from_os_str))]
    pub output_dir: Option<PathBuf>,
    /// Used when RUST_LOG is not set
    #[structopt(long = "log-level", default_value = "info")]
    pub log_level: String,
    /// Log progress instead of drawing a progress bar
    #[structopt(long = "no-progress")]
    pub no_progress: bool,
}

fn parse_duration(src: &str) -> Result<Duration, ParseIntError> {
    let millis = src.parse()?;
    Ok(Duration::from_millis(millis))
}

fn parse_program(src: &str) -> Result<u7, String> {
    let program: u8 = src.parse().map_err(|err: ParseIntError| err.to_string())?;
    if program > 127 {
        return Err(format!("program {} is out of range 0-127", program));
    }
    Ok(u7::from(program))
}

impl Cli {
    pub fn scan_config(&self) -> ScanConfig {
        let defaults = ScanConfig::default();
        ScanConfig {
            workers: self.workers.unwrap_or(defaults.workers),
            extensions: if self.extensions.is_empty() {
                defaults.extensions
            } else {
                self.extensions.clone()
            },
            target: TargetInstrument::new(&self.keyword, self.program),
            file_timeout: self.timeout,
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::from_args()
}
