use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use clap_num::maybe_hex;

#[derive(Debug, Parser)]
#[clap(name = "dvbscan")]
#[clap(about = "dvbscan finds the channels of DVB, ATSC and ISDB transponders and writes them as a channel list. ", long_about = None)]
#[clap(author = "maleicacid")]
#[clap(version)]
pub(crate) struct Cli {
    /// Increase log verbosity (-v: debug, -vv: trace).{n}
    /// Takes precedence over RUST_LOG and the config file.
    #[clap(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file.{n}
    /// If not specified, `$XDG_CONFIG_HOME/dvbscan/dvbscan.toml` or
    /// `~/.config/dvbscan/dvbscan.toml` is read when present.
    #[clap(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

/// Output format for channel listing.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Scan for channels.{n}
    /// Either a single transponder given as channel-line parameters
    /// (`--params`), or every transponder of a DVBv5 initial-scan file
    /// (`--initial`).{n}
    /// The tables are read from the DVB adapter, or from a recorded
    /// transport stream when `--input` is given.
    #[clap(group(
    ArgGroup::new("target")
    .args(& ["params", "initial"])
    .required(true)
    ))]
    Scan {
        /// Tuning parameters in channel-line form, without the name.{n}
        /// e.g. `delsys=3:frequency=474000000:bandwidth-hz=8000000`
        #[clap(short, long, value_name = "PARAMS")]
        params: Option<String>,

        /// DVBv5 initial-scan file; every section is scanned in turn.
        #[clap(short = 'I', long, value_name = "FILE")]
        initial: Option<PathBuf>,

        /// The adapter number (`/dev/dvb/adapterN`).
        #[clap(short, long)]
        adapter: Option<u32>,

        /// The frontend number within the adapter.
        #[clap(short, long)]
        frontend: Option<u32>,

        /// Read a recorded transport stream instead of tuning.
        #[clap(short = 'i', long, value_name = "TS_FILE")]
        input: Option<PathBuf>,

        /// The channel file to write.{n}
        /// If neither this nor `output.channels_file` is set, the channel
        /// lines are printed to stdout.
        #[clap(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Append to the channel file instead of replacing it.
        #[clap(long)]
        append: bool,

        /// Timeout per transponder in seconds.
        #[clap(short, long, value_name = "seconds")]
        timeout: Option<u64>,

        /// Keep the channels found so far when interrupted.{n}
        /// By default an interrupted scan discards the transponder in
        /// progress.
        #[clap(long)]
        keep_partial: bool,
    },

    /// Convert a DVBv5 channel file into a channel list.{n}
    /// Sections without both a video and an audio PID are skipped.
    Convert {
        /// The DVBv5 channel file.
        #[clap(required = true)]
        input: PathBuf,

        /// The channel file to write. Defaults to stdout.
        #[clap(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Adapter number recorded in every line.
        #[clap(short, long)]
        adapter: Option<u32>,

        /// Frontend number recorded in every line.
        #[clap(short, long)]
        frontend: Option<u32>,
    },

    /// Show the name and delivery systems of a frontend.
    Info {
        /// The adapter number (`/dev/dvb/adapterN`).
        #[clap(short, long)]
        adapter: Option<u32>,

        /// The frontend number within the adapter.
        #[clap(short, long)]
        frontend: Option<u32>,

        /// Output format.
        #[clap(value_enum, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show a channel list.{n}
    /// Enumerated parameters are printed with their catalog labels.
    Show {
        /// The channel file. Defaults to `output.channels_file`.
        file: Option<PathBuf>,

        /// Output format.
        #[clap(value_enum, long, short = 'F', default_value = "table")]
        format: OutputFormat,

        /// Search by channel name (partial match).
        #[clap(long, short = 'n')]
        name: Option<String>,

        /// Filter by program number (decimal or 0x-prefixed hex).
        #[clap(long, value_parser = maybe_hex::<u32>)]
        program: Option<u32>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_scan_requires_target() {
        assert!(Cli::try_parse_from(["dvbscan", "scan"]).is_err());
        assert!(Cli::try_parse_from(["dvbscan", "scan", "-p", "delsys=3", "-I", "x"]).is_err());

        let cli = Cli::try_parse_from(["dvbscan", "-vv", "scan", "-I", "dvb-t/uk", "-a", "1"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Scan {
                initial, adapter, ..
            } => {
                assert_eq!(initial, Some(PathBuf::from("dvb-t/uk")));
                assert_eq!(adapter, Some(1));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_show_program_accepts_hex() {
        let cli = Cli::try_parse_from(["dvbscan", "show", "--program", "0x1044"]).unwrap();
        assert!(matches!(cli.command, Commands::Show { program: Some(0x1044), .. }));
    }
}
