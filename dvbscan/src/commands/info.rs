use colored::Colorize;
use log::error;

use dvbscan::tuner::{device_path, query_frontend};
use dvbscan::{ConfigFile, FrontendInfo};
use dvbscan_conf::DeliverySystem;

use super::tuner_ids;
use crate::context::OutputFormat;

pub(crate) fn cmd_info(
    adapter: Option<u32>,
    frontend: Option<u32>,
    format: OutputFormat,
    config: &ConfigFile,
) -> i32 {
    let (adapter, frontend) = tuner_ids(adapter, frontend, config);
    let info = match query_frontend(adapter, frontend) {
        Ok(info) => info,
        Err(e) => {
            error!("{}", e);
            return 1;
        }
    };

    match format {
        OutputFormat::Table => {
            println!(
                "{}  {}",
                device_path(adapter, "frontend", frontend).bold(),
                info.name.cyan()
            );
            for code in &info.delivery_systems {
                println!("  {:>3}  {}", code, system_label(*code));
            }
        }
        OutputFormat::Json => match serde_json::to_string_pretty(&info) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize: {}", e);
                return 1;
            }
        },
        OutputFormat::Csv => print_csv(&info),
    }

    0
}

fn system_label(code: u32) -> &'static str {
    DeliverySystem::from_code(code).map_or("unknown", DeliverySystem::label)
}

fn print_csv(info: &FrontendInfo) {
    println!("name,delsys,label");
    for code in &info.delivery_systems {
        println!("\"{}\",{},{}", info.name.replace('"', "\"\""), code, system_label(*code));
    }
}
