/// Command line entry point of the vehicle asset reporter.
/// Builds a report for the trips between --start and --end and writes it to the spreadsheet given by --output.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;
use vehicle_asset_reporter::*;

#[derive(Parser)]
#[command(name = "vehicle_asset_reporter")]
#[command(about = "Summarise vehicle trips and GPS trails into a spreadsheet", long_about = None)]
struct Cli {
    /// Start of the time window, epoch seconds or a local YYYYMMDDHHMMSS timestamp
    #[arg(long, value_parser = parse_time_arg)]
    start: TimeArg,
    /// End of the time window (inclusive), epoch seconds or a local YYYYMMDDHHMMSS timestamp
    #[arg(long, value_parser = parse_time_arg)]
    end: TimeArg,
    /// Trip-info CSV file
    #[arg(long)]
    trip_info: Option<PathBuf>,
    /// Directory with the <vehicle_number>.csv trail files
    #[arg(long)]
    trails_dir: Option<PathBuf>,
    /// Spreadsheet to write
    #[arg(long)]
    output: Option<PathBuf>,
}

/// A time argument as given on the command line
#[derive(Debug, Clone)]
enum TimeArg {
    Epoch(i64),
    Local(String),
}

impl TimeArg {
    /// Epoch seconds, local timestamps are read in the given offset
    fn to_epoch(&self, offset: time::UtcOffset) -> Result<i64, ReportError> {
        match self {
            TimeArg::Epoch(seconds) => Ok(*seconds),
            TimeArg::Local(time_string) => compact_timestamp_to_epoch(time_string, offset),
        }
    }
}

fn parse_time_arg(value: &str) -> Result<TimeArg, String> {
    let value = value.trim();
    if value.len() == 14 && value.chars().all(|c| c.is_ascii_digit()) {
        parse_compact_timestamp(value).map_err(|e| e.to_string())?;
        return Ok(TimeArg::Local(value.to_string()));
    }
    value
        .parse::<i64>()
        .map(TimeArg::Epoch)
        .map_err(|_| format!("'{}' is neither epoch seconds nor YYYYMMDDHHMMSS", value))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Defaults, overridden by whatever was given
    let mut config = ReportConfig::default();
    if let Some(trip_info) = cli.trip_info {
        config.trip_info_file = trip_info;
    }
    if let Some(trails_dir) = cli.trails_dir {
        config.vehicle_trails_dir = trails_dir;
    }
    if let Some(output) = cli.output {
        config.output_file = output;
    }
    info!("{}", config);

    let (start_time, end_time) = match (cli.start.to_epoch(config.utc_offset), cli.end.to_epoch(config.utc_offset)) {
        (Ok(start), Ok(end)) => (start, end),
        (Err(e), _) | (_, Err(e)) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match vehicle_asset_reporter(&config, start_time, end_time) {
        ReportOutcome::Written { .. } | ReportOutcome::NothingToWrite => ExitCode::SUCCESS,
        ReportOutcome::Aborted(_) => ExitCode::FAILURE,
    }
}
