use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use usm_demux::{DemuxOptions, FileSink, UsmDemuxer, UsmError, DEFAULT_RESYNC_LIMIT};

/// Extract video, alpha and ADX audio streams from USM movie files.
#[derive(Parser)]
#[command(name = "usm-demux")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Input .usm file(s)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Write streams into this directory instead of next to the input
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Report the streams without writing them
    #[arg(long)]
    dry_run: bool,

    /// Abort on the first unrecognized block tag. By default the scanner
    /// skips ahead to the next recognized tag, up to --resync-limit bytes
    #[arg(long, conflicts_with = "resync_limit")]
    strict: bool,

    /// Bytes to search past an unrecognized tag for the next block
    #[arg(long, default_value_t = DEFAULT_RESYNC_LIMIT)]
    resync_limit: usize,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: &Cli, demuxer: &UsmDemuxer, input: &Path) -> Result<()> {
    let report = match demuxer.demux_file(input) {
        Ok(report) => report,
        Err(UsmError::MissingContainerMarker { .. }) => {
            anyhow::bail!("no USM container data found in {}", input.display());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to demultiplex {}", input.display()))
        }
    };

    for dropped in &report.dropped {
        eprintln!("WARNING: skipping {}: {}", dropped.key, dropped.reason);
    }

    let mut sink = match &cli.output_dir {
        Some(dir) => FileSink::with_output_dir(dir),
        None => FileSink::new(),
    };

    if cli.dry_run {
        for stream in &report.streams {
            let destination = sink.destination(&stream.file_name);
            println!("would write {}, {} bytes", destination.display(), stream.payload.len());
        }
        return Ok(());
    }

    let written = report
        .write_all(&mut sink)
        .with_context(|| format!("failed to write streams of {}", input.display()))?;
    for (path, stream) in written.iter().zip(&report.streams) {
        println!("writing {}, {} bytes", path.display(), stream.payload.len());
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = if cli.strict {
        DemuxOptions::new().strict()
    } else {
        DemuxOptions::new().resync_limit(cli.resync_limit)
    };
    let demuxer = UsmDemuxer::new(options);

    let mut failed = false;
    for input in &cli.inputs {
        if let Err(e) = run(&cli, &demuxer, input) {
            eprintln!("ERROR: {:#}", e);
            failed = true;
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn strict_help_names_the_resync_default() {
        let cmd = Cli::command();
        let strict = cmd
            .get_arguments()
            .find(|arg| arg.get_id() == "strict")
            .unwrap();
        let help = strict.get_help().unwrap().to_string();
        assert!(help.contains("By default"), "{help}");
        assert!(help.contains("--resync-limit"), "{help}");
    }

    #[test]
    fn strict_conflicts_with_resync_limit() {
        let result = Cli::try_parse_from(["usm-demux", "--strict", "--resync-limit", "8", "a.usm"]);
        assert!(result.is_err());
    }
}
