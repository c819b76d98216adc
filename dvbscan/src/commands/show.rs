use std::path::PathBuf;

use colored::Colorize;
use log::{error, info};

use dvbscan::ConfigFile;
use dvbscan_conf::catalog::display;
use dvbscan_conf::{read_channel_file, ChannelRecord, Key, ParamKey, ParamValue};

use crate::context::OutputFormat;

pub(crate) fn cmd_show(
    file: Option<PathBuf>,
    format: OutputFormat,
    name: Option<String>,
    program: Option<u32>,
    config: &ConfigFile,
) -> i32 {
    let Some(path) = file.or_else(|| config.output.channels_file.clone()) else {
        error!("No channel file given and output.channels_file is not configured");
        return 1;
    };

    let channels = match read_channel_file(&path) {
        Ok(chs) => chs,
        Err(e) => {
            error!("Failed to read {}: {}", path.display(), e);
            return 1;
        }
    };
    info!("{} channels in {}", channels.len(), path.display());

    let filtered = filter_channels(channels, name.as_deref(), program);
    if filtered.is_empty() {
        println!("No channels found matching the criteria.");
        return 0;
    }

    match format {
        OutputFormat::Table => print_channels_table(&filtered),
        OutputFormat::Json => match serde_json::to_string_pretty(&filtered) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize: {}", e);
                return 1;
            }
        },
        OutputFormat::Csv => print_channels_csv(&filtered),
    }

    0
}

fn filter_channels(
    channels: Vec<ChannelRecord>,
    name: Option<&str>,
    program: Option<u32>,
) -> Vec<ChannelRecord> {
    let name = name.map(str::to_lowercase);
    channels
        .into_iter()
        .filter(|ch| {
            if let Some(n) = &name {
                if !ch.display_name.to_lowercase().contains(n) {
                    return false;
                }
            }
            if let Some(p) = program {
                if ch.program_number != p {
                    return false;
                }
            }
            true
        })
        .collect()
}

/// Catalog label of an enumerated parameter, the raw value otherwise.
fn param_label(key: &ParamKey, value: &ParamValue) -> String {
    let label = match (key, value) {
        (ParamKey::Known(k), ParamValue::Int(v)) => k
            .category()
            .zip(u32::try_from(*v).ok())
            .and_then(|(category, code)| display(category, code)),
        _ => None,
    };
    label.map_or_else(|| value.to_string(), str::to_string)
}

/// Tuning parameters other than the delivery system and frequency.
fn extra_params(ch: &ChannelRecord) -> String {
    ch.params
        .iter()
        .filter(|(key, _)| {
            !matches!(
                key,
                ParamKey::Known(Key::DeliverySystem | Key::Frequency | Key::Adapter | Key::Frontend)
            )
        })
        .map(|(key, value)| format!("{}={}", key, param_label(key, value)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn system_label(ch: &ChannelRecord) -> String {
    ch.params
        .delivery_system()
        .map_or_else(|| "-".to_string(), |s| s.label().to_string())
}

fn frequency(ch: &ChannelRecord) -> String {
    ch.params
        .get_int(Key::Frequency)
        .map_or_else(|| "-".to_string(), |f| f.to_string())
}

fn print_channels_table(channels: &[ChannelRecord]) {
    let width = channels
        .iter()
        .map(|ch| ch.display_name.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);

    println!(
        "{}",
        format!(
            "{:<width$}  {:>7}  {:>6}  {:>6}  {:<8}  {:>11}  {}",
            "Name",
            "Program",
            "Video",
            "Audio",
            "System",
            "Frequency",
            "Parameters",
            width = width
        )
        .bold()
    );
    for ch in channels {
        println!(
            "{}  {:>7}  {:>6}  {:>6}  {:<8}  {:>11}  {}",
            format!("{:<width$}", ch.display_name, width = width).cyan(),
            ch.program_number,
            ch.video_pid,
            ch.audio_pid,
            system_label(ch),
            frequency(ch),
            extra_params(ch).dimmed(),
        );
    }
    println!();
    println!("Total: {} channels", channels.len());
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn print_channels_csv(channels: &[ChannelRecord]) {
    println!("name,program_number,video_pid,audio_pid,delsys,frequency,parameters");
    for ch in channels {
        println!(
            "{},{},{},{},{},{},{}",
            csv_field(&ch.display_name),
            ch.program_number,
            ch.video_pid,
            ch.audio_pid,
            csv_field(&system_label(ch)),
            frequency(ch),
            csv_field(&extra_params(ch)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dvbscan_conf::parse_channel_line;

    fn channels() -> Vec<ChannelRecord> {
        [
            "BBC ONE:program-number=4164:video-pid=101:audio-pid=102:delsys=3:frequency=490000000:modulation=3",
            "BBC TWO:program-number=4228:video-pid=201:audio-pid=202:delsys=3:frequency=490000000",
            "ITV1:program-number=8263:video-pid=301:audio-pid=302:delsys=3:frequency=514000000",
        ]
        .iter()
        .map(|line| parse_channel_line(line).unwrap())
        .collect()
    }

    #[test]
    fn test_filter_by_name_and_program() {
        let by_name = filter_channels(channels(), Some("bbc"), None);
        assert_eq!(by_name.len(), 2);

        let by_program = filter_channels(channels(), None, Some(0x2047));
        assert_eq!(by_program.len(), 1);
        assert_eq!(by_program[0].display_name, "ITV1");

        assert!(filter_channels(channels(), Some("bbc"), Some(8263)).is_empty());
    }

    #[test]
    fn test_enumerated_params_get_labels() {
        let ch = &channels()[0];
        assert_eq!(system_label(ch), "DVB-T");
        assert_eq!(extra_params(ch), "modulation=QAM 64");
    }

    #[test]
    fn test_csv_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
