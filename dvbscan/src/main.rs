use clap::Parser;
use log::{info, LevelFilter};

use dvbscan::config::resolve_config;

use crate::commands::ScanArgs;
use crate::context::{Cli, Commands};

mod commands;
mod context;

/// `-v` beats `RUST_LOG`, which beats the config file.
fn init_logger(verbose: u8, config_level: Option<&str>) {
    let default = config_level.unwrap_or("info");
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }
    builder.init();
}

fn main() {
    let cli = Cli::parse();

    let (config, config_path) = match resolve_config(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };
    init_logger(cli.verbose, config.logging.level.as_deref());
    if let Some(path) = config_path {
        info!("Loaded config from: {}", path.display());
    }

    let code = match cli.command {
        Commands::Scan {
            params,
            initial,
            adapter,
            frontend,
            input,
            output,
            append,
            timeout,
            keep_partial,
        } => commands::cmd_scan(
            ScanArgs {
                params,
                initial,
                adapter,
                frontend,
                input,
                output,
                append,
                timeout,
                keep_partial,
            },
            &config,
        ),
        Commands::Convert {
            input,
            output,
            adapter,
            frontend,
        } => commands::cmd_convert(input, output, adapter, frontend, &config),
        Commands::Info {
            adapter,
            frontend,
            format,
        } => commands::cmd_info(adapter, frontend, format, &config),
        Commands::Show {
            file,
            format,
            name,
            program,
        } => commands::cmd_show(file, format, name, program, &config),
    };

    std::process::exit(code);
}
