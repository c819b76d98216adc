//! Internal channel-line dialect.
//!
//! ```text
//! BBC ONE:program-number=4164:video-pid=101:audio-pid=102:delsys=3:frequency=490000000:...
//! ```
//!
//! The first field is the display name, every further field is a
//! `key=value` pair. Values are plain integers except `polarity`, which is
//! written as `H` or `V`.

use std::fmt::Write;

use crate::catalog::Polarity;
use crate::error::ConfError;
use crate::params::{ChannelRecord, Key, ParamKey, ParamValue};

/// Symbol rates above this are taken to be in symbols/s and scaled to kSym/s.
pub const SYMBOL_RATE_HZ_THRESHOLD: i64 = 100_000;

/// Characters that cannot appear in a display name.
const NAME_RESERVED: [char; 3] = [':', '[', ']'];

/// Best-effort integer conversion with `atol` semantics.
///
/// Leading blanks and an optional sign are accepted, parsing stops at the
/// first non-digit, and input without leading digits yields 0.
pub fn parse_long(value: &str) -> i64 {
    let s = value.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut n: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        n = n.saturating_mul(10).saturating_add((b - b'0') as i64);
    }

    if negative {
        -n
    } else {
        n
    }
}

/// Scale a symbol rate given in symbols/s down to kSym/s.
pub fn normalize_symbol_rate(rate: i64) -> i64 {
    if rate > SYMBOL_RATE_HZ_THRESHOLD {
        rate / 1000
    } else {
        rate
    }
}

/// Remove characters that would break the line format.
pub fn sanitize_name(name: &str) -> String {
    name.chars().filter(|c| !NAME_RESERVED.contains(c)).collect()
}

fn to_pid(value: &str) -> u32 {
    u32::try_from(parse_long(value)).unwrap_or(0)
}

/// Decode one channel line.
///
/// Parsing never fails on field content: malformed numbers become 0 and
/// fields without `=` are ignored. Only empty and comment lines are
/// rejected.
pub fn parse_channel_line(line: &str) -> Result<ChannelRecord, ConfError> {
    let line = line.trim_end_matches(|c: char| c == '\r' || c == '\n');
    if line.trim().is_empty() {
        return Err(ConfError::EmptyLine);
    }
    if line.starts_with('#') {
        return Err(ConfError::Comment);
    }

    let mut fields = line.split(':');
    let mut record = ChannelRecord::new(fields.next().unwrap_or_default());

    for field in fields {
        let Some((name, value)) = field.split_once('=') else {
            continue;
        };
        let name = name.trim();

        match Key::from_name(name) {
            Some(Key::ProgramNumber) => record.program_number = to_pid(value),
            Some(Key::VideoPid) => record.video_pid = to_pid(value),
            Some(Key::AudioPid) => record.audio_pid = to_pid(value),
            Some(Key::Polarity) => record.params.set(
                Key::Polarity,
                ParamValue::Polarity(Polarity::from_field(value)),
            ),
            Some(Key::SymbolRate) => record
                .params
                .set_int(Key::SymbolRate, normalize_symbol_rate(parse_long(value))),
            Some(Key::LnbType) => {
                let code = parse_long(value);
                record.params.set_int(Key::LnbType, code);
                record.params.apply_lnb_type(code);
            }
            Some(key) => record.params.set_int(key, parse_long(value)),
            None => record
                .params
                .set_int(ParamKey::Other(name.to_string()), parse_long(value)),
        }
    }

    Ok(record)
}

/// Encode a channel record as one line.
///
/// The demux fields come first, then `delsys` and the parameters of the
/// delivery system's field list, in list order. Parameters missing from the
/// record are skipped. Without a known delivery system every tuner
/// parameter is written in insertion order.
pub fn serialize_channel(record: &ChannelRecord) -> String {
    let mut line = format!(
        "{}:{}={}:{}={}:{}={}",
        sanitize_name(&record.display_name),
        Key::ProgramNumber,
        record.program_number,
        Key::VideoPid,
        record.video_pid,
        Key::AudioPid,
        record.audio_pid,
    );

    let params = &record.params;
    match params.delivery_system() {
        Some(system) => {
            let _ = write!(line, ":{}={}", Key::DeliverySystem, system.code());
            for &key in system.field_list() {
                if let Some(value) = params.get(key) {
                    let _ = write!(line, ":{}={}", key, value);
                }
            }
        }
        None => {
            for (key, value) in params.iter() {
                if matches!(key, ParamKey::Known(k) if k.is_demux()) {
                    continue;
                }
                let _ = write!(line, ":{}={}", key, value);
            }
        }
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{self, Category};
    use crate::params::{ChannelParams, DeliverySystem};

    fn record_with(params: ChannelParams) -> ChannelRecord {
        ChannelRecord {
            display_name: "Test Channel".to_string(),
            program_number: 4164,
            video_pid: 101,
            audio_pid: 102,
            params,
        }
    }

    fn params_for(system: DeliverySystem) -> ChannelParams {
        let mut params = ChannelParams::new();
        params.set_int(Key::DeliverySystem, system.code() as i64);
        for (i, &key) in system.field_list().iter().enumerate() {
            match key {
                Key::Polarity => {
                    params.set(key, ParamValue::Polarity(Polarity::Vertical));
                }
                Key::LnbType => params.set_int(key, 0),
                Key::SymbolRate => params.set_int(key, 27_500),
                Key::Frequency => params.set_int(key, 474_000_000),
                _ => params.set_int(key, i as i64 + 1),
            }
        }
        params
    }

    #[test]
    fn test_parse_long() {
        assert_eq!(parse_long("474000000"), 474_000_000);
        assert_eq!(parse_long("  42abc"), 42);
        assert_eq!(parse_long("-7"), -7);
        assert_eq!(parse_long("+7"), 7);
        assert_eq!(parse_long("abc"), 0);
        assert_eq!(parse_long(""), 0);
        assert_eq!(parse_long("-"), 0);
    }

    #[test]
    fn test_symbol_rate_normalization() {
        assert_eq!(normalize_symbol_rate(27_500_000), 27_500);
        assert_eq!(normalize_symbol_rate(6_900), 6_900);
        assert_eq!(normalize_symbol_rate(100_000), 100_000);
    }

    #[test]
    fn test_parse_line_fields() {
        let rec = parse_channel_line(
            "Das Erste HD:program-number=10301:video-pid=5101:audio-pid=5102:delsys=6:\
             frequency=11494000:symbol-rate=22000000:polarity=H:lnb-type=0\r\n",
        )
        .unwrap();

        assert_eq!(rec.display_name, "Das Erste HD");
        assert_eq!(rec.program_number, 10301);
        assert_eq!(rec.video_pid, 5101);
        assert_eq!(rec.audio_pid, 5102);
        assert_eq!(rec.params.delivery_system(), Some(DeliverySystem::Dvbs2));
        assert_eq!(rec.params.get_int(Key::SymbolRate), Some(22_000));
        assert_eq!(rec.params.polarity(), Some(Polarity::Horizontal));
        assert_eq!(rec.params.get_int(Key::LnbLof1), Some(9_750_000));
        assert!(!rec.params.contains(Key::ProgramNumber));
    }

    #[test]
    fn test_parse_line_polarity_values() {
        for (value, expected) in [
            ("v", Polarity::Vertical),
            ("0", Polarity::Vertical),
            ("V", Polarity::Vertical),
            ("h", Polarity::Horizontal),
            ("1", Polarity::Horizontal),
            ("x", Polarity::Horizontal),
        ] {
            let rec = parse_channel_line(&format!("A:polarity={}", value)).unwrap();
            assert_eq!(rec.params.polarity(), Some(expected), "{}", value);
        }
    }

    #[test]
    fn test_parse_line_is_tolerant() {
        let rec = parse_channel_line("Odd:frequency=abc:garbage:video-pid=-3:lna=1").unwrap();
        assert_eq!(rec.params.get_int(Key::Frequency), Some(0));
        assert_eq!(rec.video_pid, 0);
        assert_eq!(
            rec.params.get_param(&ParamKey::Other("lna".to_string())),
            Some(&ParamValue::Int(1))
        );
    }

    #[test]
    fn test_parse_line_rejects_empty_and_comment() {
        assert_eq!(parse_channel_line(""), Err(ConfError::EmptyLine));
        assert_eq!(parse_channel_line("   \n"), Err(ConfError::EmptyLine));
        assert_eq!(parse_channel_line("# Name:frequency"), Err(ConfError::Comment));
    }

    #[test]
    fn test_similar_keys_do_not_cross_resolve() {
        let rec = parse_channel_line("A:code-rate-hp=3:code-rate-lp=1:inner-fec=9").unwrap();
        assert_eq!(rec.params.get_int(Key::CodeRateHp), Some(3));
        assert_eq!(rec.params.get_int(Key::CodeRateLp), Some(1));
        assert_eq!(rec.params.get_int(Key::InnerFec), Some(9));

        // a truncated key is kept as-is, never folded into a known one
        let rec = parse_channel_line("A:code-rate=2").unwrap();
        assert!(!rec.params.contains(Key::CodeRateHp));
        assert!(!rec.params.contains(Key::CodeRateLp));
    }

    #[test]
    fn test_serialize_dvbt() {
        let mut params = ChannelParams::new();
        params.set_int(Key::DeliverySystem, 3);
        params.set_int(Key::Hierarchy, 0);
        params.set_int(Key::Frequency, 490_000_000);
        params.set_int(Key::BandwidthHz, 8_000_000);
        params.set_int(Key::Adapter, 1);

        let line = serialize_channel(&record_with(params));
        assert_eq!(
            line,
            "Test Channel:program-number=4164:video-pid=101:audio-pid=102:delsys=3:\
             frequency=490000000:bandwidth-hz=8000000:hierarchy=0"
        );
    }

    #[test]
    fn test_serialize_strips_reserved_name_chars() {
        let mut rec = record_with(ChannelParams::new());
        rec.display_name = "News: [Live]".to_string();
        assert!(serialize_channel(&rec).starts_with("News Live:program-number=4164"));
    }

    #[test]
    fn test_round_trip_every_delivery_system() {
        for entry in catalog::entries(Category::DeliverySystem) {
            let system = DeliverySystem::from_code(entry.code).unwrap();
            let original = record_with(params_for(system));

            let line = serialize_channel(&original);
            let parsed = parse_channel_line(&line).unwrap();

            assert_eq!(parsed.display_name, original.display_name, "{:?}", system);
            assert_eq!(parsed.program_number, 4164);
            assert_eq!(parsed.video_pid, 101);
            assert_eq!(parsed.audio_pid, 102);
            assert_eq!(parsed.params.delivery_system(), Some(system));
            for &key in system.field_list() {
                assert_eq!(
                    parsed.params.get(key),
                    original.params.get(key),
                    "{:?} {}",
                    system,
                    key
                );
            }
        }
    }
}
