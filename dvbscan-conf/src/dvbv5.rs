//! DVBv5 `dvb_channel.conf` / scan-file dialect.
//!
//! ```text
//! [BBC ONE]
//!     SERVICE_ID = 4164
//!     VIDEO_PID = 101
//!     AUDIO_PID = 102 106
//!     FREQUENCY = 490000000
//!     DELIVERY_SYSTEM = DVBT
//! ```
//!
//! Conversion is one-way into the internal line dialect. Initial-scan files
//! use the same syntax but carry transponders only, without PIDs.

use std::fmt::Write;

use log::{debug, warn};
use nom::bytes::complete::{is_not, take_until};
use nom::character::complete::char;
use nom::combinator::rest;
use nom::sequence::{delimited, separated_pair};
use nom::IResult;

use crate::catalog::Polarity;
use crate::error::ConfError;
use crate::line::{normalize_symbol_rate, parse_long, sanitize_name};
use crate::params::{ChannelParams, Key, ParamKey, ParamValue};

/// DVBv5 key names and the parameter each one fills.
const KEY_TABLE: &[(&str, Key)] = &[
    ("DELIVERY_SYSTEM", Key::DeliverySystem),
    ("FREQUENCY", Key::Frequency),
    ("BANDWIDTH_HZ", Key::BandwidthHz),
    ("SYMBOL_RATE", Key::SymbolRate),
    ("MODULATION", Key::Modulation),
    ("INVERSION", Key::Inversion),
    ("CODE_RATE_HP", Key::CodeRateHp),
    ("CODE_RATE_LP", Key::CodeRateLp),
    ("INNER_FEC", Key::InnerFec),
    ("TRANSMISSION_MODE", Key::TransmissionMode),
    ("GUARD_INTERVAL", Key::Guard),
    ("HIERARCHY", Key::Hierarchy),
    ("STREAM_ID", Key::StreamId),
    ("POLARIZATION", Key::Polarity),
    ("PILOT", Key::Pilot),
    ("ROLLOFF", Key::Rolloff),
    ("INTERLEAVING", Key::Interleaving),
    ("LNB", Key::LnbType),
    ("SAT_NUMBER", Key::DiseqcSource),
    ("SERVICE_ID", Key::ProgramNumber),
    ("VIDEO_PID", Key::VideoPid),
    ("AUDIO_PID", Key::AudioPid),
];

fn lookup_key(name: &str) -> Option<Key> {
    KEY_TABLE
        .iter()
        .find(|(dvbv5, _)| *dvbv5 == name)
        .map(|(_, key)| *key)
}

/// One bracketed section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dvbv5Section {
    pub name: String,
    /// `KEY = VALUE` pairs in file order, both sides trimmed.
    pub entries: Vec<(String, String)>,
}

impl Dvbv5Section {
    /// Raw value of a key (exact match).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_av_pids(&self) -> bool {
        self.get("VIDEO_PID").is_some() && self.get("AUDIO_PID").is_some()
    }

    /// Translate the section into a parameter set.
    ///
    /// Enumerated values resolve through the catalog; a token the catalog
    /// does not know leaves its parameter unset. `SAT_NUMBER` is taken as a
    /// plain number, never resolved.
    pub fn to_params(&self) -> ChannelParams {
        let mut params = ChannelParams::new();

        for (name, value) in &self.entries {
            let Some(key) = lookup_key(name) else {
                debug!("[{}] ignoring key {}", self.name, name);
                continue;
            };

            match key {
                Key::Polarity => match Polarity::resolve(value) {
                    Some(p) => params.set(key, ParamValue::Polarity(p)),
                    None => warn!("[{}] unknown polarization {:?}", self.name, value),
                },
                Key::SymbolRate => {
                    params.set_int(key, normalize_symbol_rate(parse_long(value)))
                }
                Key::DiseqcSource => params.set_int(key, parse_long(value)),
                _ => match key.category() {
                    Some(category) => match crate::catalog::resolve(category, value) {
                        Some(code) => params.set_int(key, code as i64),
                        None => warn!(
                            "[{}] unknown {} value {:?}, leaving it unset",
                            self.name,
                            category.name(),
                            value
                        ),
                    },
                    None => params.set_int(key, parse_long(value)),
                },
            }
        }

        params
    }
}

enum Dvbv5Line<'a> {
    Section(&'a str),
    Entry(&'a str, &'a str),
}

fn section_header(input: &str) -> IResult<&str, &str> {
    delimited(char('['), take_until("]"), char(']'))(input)
}

fn key_value(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(is_not("="), char('='), rest)(input)
}

fn parse_line(line: &str) -> Option<Dvbv5Line<'_>> {
    if let Ok((_, name)) = section_header(line) {
        return Some(Dvbv5Line::Section(name));
    }
    if let Ok((_, (key, value))) = key_value(line) {
        return Some(Dvbv5Line::Entry(key.trim(), value.trim()));
    }
    None
}

/// Split a DVBv5 file into its sections.
///
/// Blank lines and `#` comments are skipped, as are entries that appear
/// before the first section header.
pub fn parse_sections(text: &str) -> Vec<Dvbv5Section> {
    let mut sections: Vec<Dvbv5Section> = Vec::new();

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_line(line) {
            Some(Dvbv5Line::Section(name)) => sections.push(Dvbv5Section {
                name: name.to_string(),
                entries: Vec::new(),
            }),
            Some(Dvbv5Line::Entry(key, value)) => match sections.last_mut() {
                Some(section) => section.entries.push((key.to_string(), value.to_string())),
                None => debug!("line {}: entry outside of any section", lineno + 1),
            },
            None => debug!("line {}: unrecognised {:?}", lineno + 1, line),
        }
    }

    sections
}

/// Check that the first section describes a transponder.
pub fn check_format(sections: &[Dvbv5Section]) -> Result<(), ConfError> {
    let first = sections.first().ok_or(ConfError::NoSections)?;
    for required in ["DELIVERY_SYSTEM", "FREQUENCY"] {
        if first.get(required).is_none() {
            return Err(ConfError::IncorrectFormat {
                section: first.name.clone(),
                missing: required,
            });
        }
    }
    Ok(())
}

/// Result of converting a DVBv5 channel file.
#[derive(Debug, Clone, Default)]
pub struct Conversion {
    /// Internal-dialect lines, one per audio/video service.
    pub lines: Vec<String>,
    /// Sections dropped for lacking a video or audio PID.
    pub skipped: usize,
    /// Format problem found in the file, if any.
    pub format_error: Option<ConfError>,
}

/// Render one section as an internal channel line.
///
/// Returns `None` for sections without both a video and an audio PID.
pub fn section_to_line(section: &Dvbv5Section, adapter: u32, frontend: u32) -> Option<String> {
    if !section.has_av_pids() {
        return None;
    }

    let mut line = sanitize_name(&section.name);
    for (key, value) in section.to_params().iter() {
        if *key == ParamKey::Known(Key::DiseqcSource) {
            continue;
        }
        let _ = write!(line, ":{}={}", key, value);
    }
    let _ = write!(line, ":{}={}:{}={}", Key::Adapter, adapter, Key::Frontend, frontend);
    if let Some(sat) = section.get("SAT_NUMBER") {
        let _ = write!(line, ":{}={}", Key::DiseqcSource, sat);
    }

    Some(line)
}

/// Convert a DVBv5 channel file into internal channel lines.
///
/// A format problem is reported in the result but does not stop the
/// conversion: every section is processed on its own.
pub fn convert_channels(text: &str, adapter: u32, frontend: u32) -> Conversion {
    let sections = parse_sections(text);
    let mut conversion = Conversion {
        format_error: check_format(&sections).err(),
        ..Default::default()
    };

    if let Some(err) = &conversion.format_error {
        warn!("{}", err);
    }

    for section in &sections {
        match section_to_line(section, adapter, frontend) {
            Some(line) => conversion.lines.push(line),
            None => {
                debug!("[{}] skipped, no audio/video PIDs", section.name);
                conversion.skipped += 1;
            }
        }
    }

    conversion
}
