use std::path::{Path, PathBuf};
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};

use dvbscan::tuner::DvbFrontend;
use dvbscan::{
    CancelToken, ConfigFile, ScanError, ScanPhase, Scanner, StopMode, TableSource, TsFileSource,
};
use dvbscan_conf::{
    check_format, parse_channel_line, parse_sections, serialize_channel, write_channel_file,
    ChannelParams, ChannelRecord, Key,
};

use super::tuner_ids;

/// Exit code of an interrupted scan.
const EXIT_CANCELLED: i32 = 130;

#[derive(Debug)]
pub(crate) struct ScanArgs {
    pub params: Option<String>,
    pub initial: Option<PathBuf>,
    pub adapter: Option<u32>,
    pub frontend: Option<u32>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub append: bool,
    pub timeout: Option<u64>,
    pub keep_partial: bool,
}

struct Found {
    records: Vec<ChannelRecord>,
    cancelled: bool,
}

pub(crate) fn cmd_scan(args: ScanArgs, config: &ConfigFile) -> i32 {
    let mut scan_config = match config.scan_config() {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            return 1;
        }
    };
    if let Some(secs) = args.timeout {
        if secs == 0 {
            error!("The timeout must be positive");
            return 1;
        }
        scan_config.limits.timeout = Duration::from_secs(secs);
    }

    let token = CancelToken::new();
    {
        let token = token.clone();
        if let Err(e) = ctrlc::set_handler(move || token.cancel()) {
            warn!("Failed to install the Ctrl-C handler: {}", e);
        }
    }
    let stop_mode = if args.keep_partial {
        StopMode::Emit
    } else {
        StopMode::Discard
    };

    let found = match &args.input {
        Some(path) => match TsFileSource::open(path) {
            Ok(source) => run(
                Scanner::new(source, scan_config)
                    .with_cancel_token(token)
                    .with_stop_mode(stop_mode),
                &args,
            ),
            Err(e) => {
                error!("{}", e);
                return 1;
            }
        },
        None => {
            let (adapter, frontend) = tuner_ids(args.adapter, args.frontend, config);
            match DvbFrontend::open(adapter, frontend) {
                Ok(source) => run(
                    Scanner::new(source, scan_config)
                        .with_cancel_token(token)
                        .with_stop_mode(stop_mode),
                    &args,
                ),
                Err(e) => {
                    error!("{}", e);
                    return 1;
                }
            }
        }
    };

    let found = match found {
        Ok(found) => found,
        Err(code) => return code,
    };

    if found.records.is_empty() {
        warn!("No channels found");
        return if found.cancelled { EXIT_CANCELLED } else { 1 };
    }

    let output = args
        .output
        .as_deref()
        .or(config.output.channels_file.as_deref());
    if let Err(code) = write_records(&found.records, output, args.append) {
        return code;
    }

    if found.cancelled {
        EXIT_CANCELLED
    } else {
        0
    }
}

fn run<S: TableSource>(mut scanner: Scanner<S>, args: &ScanArgs) -> Result<Found, i32> {
    if let Some(text) = &args.params {
        let params = parse_params(text).map_err(|e| {
            error!("{}", e);
            1
        })?;
        return scan_one(&mut scanner, &params);
    }
    match &args.initial {
        Some(path) => scan_file(&mut scanner, path),
        None => {
            error!("Nothing to scan");
            Err(1)
        }
    }
}

/// Parse `key=value:...` tuning parameters.
fn parse_params(text: &str) -> Result<ChannelParams, String> {
    let record = parse_channel_line(&format!("manual:{}", text.trim_start_matches(':')))
        .map_err(|e| format!("Invalid parameters: {}", e))?;
    let params = record.params;

    if params.delivery_system().is_none() {
        return Err(format!("Missing or unknown {} in {:?}", Key::DeliverySystem, text));
    }
    if !params.contains(Key::Frequency) {
        return Err(format!("Missing {} in {:?}", Key::Frequency, text));
    }
    Ok(params)
}

fn scan_one<S: TableSource>(
    scanner: &mut Scanner<S>,
    params: &ChannelParams,
) -> Result<Found, i32> {
    match scanner.scan_manual(params) {
        Ok(outcome) => {
            if outcome.phase == ScanPhase::TimedOut {
                warn!(
                    "Timed out after {:.1}s, keeping what was found",
                    outcome.elapsed.as_secs_f32()
                );
            }
            info!(
                "{} channels in {:.1}s",
                outcome.records.len(),
                outcome.elapsed.as_secs_f32()
            );
            Ok(Found {
                records: outcome.records,
                cancelled: outcome.stopped,
            })
        }
        Err(ScanError::Cancelled) => {
            warn!("Scan cancelled");
            Err(EXIT_CANCELLED)
        }
        Err(e) => {
            error!("{}", e);
            Err(1)
        }
    }
}

fn scan_file<S: TableSource>(scanner: &mut Scanner<S>, path: &Path) -> Result<Found, i32> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        error!("Failed to read {}: {}", path.display(), e);
        1
    })?;
    let sections = parse_sections(&text);
    if let Err(e) = check_format(&sections) {
        warn!("{}: {}", path.display(), e);
    }
    if sections.is_empty() {
        error!("{}: no transponders", path.display());
        return Err(1);
    }

    let bar = ProgressBar::new(sections.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:30} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let result = scanner.scan_batch(&sections, |p| {
        bar.set_position(p.index as u64);
        bar.set_message(format!("{} ({} channels)", p.name, p.found));
    });
    bar.finish_and_clear();

    match result {
        Ok(report) => {
            info!(
                "{} transponders scanned, {} failed, {} channels",
                report.scanned,
                report.failures,
                report.records.len()
            );
            if report.cancelled {
                warn!("Scan cancelled");
            }
            Ok(Found {
                records: report.records,
                cancelled: report.cancelled,
            })
        }
        Err(e) => {
            error!("{}", e);
            Err(1)
        }
    }
}

fn write_records(records: &[ChannelRecord], output: Option<&Path>, append: bool) -> Result<(), i32> {
    match output {
        Some(path) => {
            write_channel_file(path, records, append).map_err(|e| {
                error!("Failed to write {}: {}", path.display(), e);
                1
            })?;
            eprintln!(
                "{} {} channels to {}",
                if append { "Appended" } else { "Wrote" }.green().bold(),
                records.len(),
                path.display()
            );
        }
        None => {
            for record in records {
                println!("{}", serialize_channel(record));
            }
        }
    }
    Ok(())
}
