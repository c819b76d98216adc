use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;
use log::{error, info, warn};

use dvbscan::ConfigFile;
use dvbscan_conf::convert_channels;

use super::tuner_ids;

pub(crate) fn cmd_convert(
    input: PathBuf,
    output: Option<PathBuf>,
    adapter: Option<u32>,
    frontend: Option<u32>,
    config: &ConfigFile,
) -> i32 {
    let text = match std::fs::read_to_string(&input) {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to read {}: {}", input.display(), e);
            return 1;
        }
    };

    let (adapter, frontend) = tuner_ids(adapter, frontend, config);
    let conversion = convert_channels(&text, adapter, frontend);
    if let Some(e) = &conversion.format_error {
        warn!("{}: {}", input.display(), e);
    }
    info!(
        "{} channels converted, {} sections without audio/video skipped",
        conversion.lines.len(),
        conversion.skipped
    );

    let written = match &output {
        Some(path) => write_lines(path, &conversion.lines),
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            conversion
                .lines
                .iter()
                .try_for_each(|line| writeln!(out, "{}", line))
        }
    };
    if let Err(e) = written {
        error!("Failed to write channels: {}", e);
        return 1;
    }

    if let Some(path) = &output {
        eprintln!(
            "{} {} channels to {}",
            "Wrote".green().bold(),
            conversion.lines.len(),
            path.display()
        );
    }

    if conversion.lines.is_empty() && conversion.format_error.is_some() {
        1
    } else {
        0
    }
}

fn write_lines(path: &Path, lines: &[String]) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    out.flush()
}
