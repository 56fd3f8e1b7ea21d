use anyhow::Result;
use ghost_tail::cmdline::{parse_args, Cli};
use ghost_tail::persist::export_all;
use ghost_tail::progress::{BarProgress, LogProgress, ProgressSink};
use ghost_tail::scanner::Scanner;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = parse_args();
    init_logging(&args);
    run(&args)
}

fn init_logging(args: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Cli) -> Result<()> {
    let progress: Box<dyn ProgressSink> = if args.no_progress {
        Box::new(LogProgress::default())
    } else {
        Box::new(BarProgress::new())
    };
    let config = args.scan_config();
    let keyword = config.target.keyword().to_string();
    let mut scanner = Scanner::new(config, progress);

    println!("Using {} as midi directory.", args.directory.display());
    let report = scanner.scan_directory(&args.directory)?;
    let counts = report.counts;
    println!(
        "Found {} {} tracks, {} files without {}, {} corrupted files.",
        counts.valid, keyword, counts.no_instrument, keyword, counts.corrupted
    );

    if let Some(out_dir) = &args.output_dir {
        let written = export_all(&report.valid, out_dir)?;
        info!("Wrote {} event files to {}", written, out_dir.display());
    }
    Ok(())
}
