//! Channel parameter set and channel records.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::catalog::{self, Category, Polarity};

/// Parameter names understood by the translator.
///
/// Dispatch is by exact name; there is no prefix or substring matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    DeliverySystem,
    Frequency,
    BandwidthHz,
    SymbolRate,
    Modulation,
    Inversion,
    CodeRateHp,
    CodeRateLp,
    InnerFec,
    TransmissionMode,
    Guard,
    Hierarchy,
    StreamId,
    Polarity,
    Pilot,
    Rolloff,
    Interleaving,
    DiseqcSource,
    LnbType,
    LnbLof1,
    LnbLof2,
    LnbSlof,
    Adapter,
    Frontend,
    ProgramNumber,
    VideoPid,
    AudioPid,
}

impl Key {
    pub const ALL: [Key; 27] = [
        Key::DeliverySystem,
        Key::Frequency,
        Key::BandwidthHz,
        Key::SymbolRate,
        Key::Modulation,
        Key::Inversion,
        Key::CodeRateHp,
        Key::CodeRateLp,
        Key::InnerFec,
        Key::TransmissionMode,
        Key::Guard,
        Key::Hierarchy,
        Key::StreamId,
        Key::Polarity,
        Key::Pilot,
        Key::Rolloff,
        Key::Interleaving,
        Key::DiseqcSource,
        Key::LnbType,
        Key::LnbLof1,
        Key::LnbLof2,
        Key::LnbSlof,
        Key::Adapter,
        Key::Frontend,
        Key::ProgramNumber,
        Key::VideoPid,
        Key::AudioPid,
    ];

    /// Name used in channel lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Key::DeliverySystem => "delsys",
            Key::Frequency => "frequency",
            Key::BandwidthHz => "bandwidth-hz",
            Key::SymbolRate => "symbol-rate",
            Key::Modulation => "modulation",
            Key::Inversion => "inversion",
            Key::CodeRateHp => "code-rate-hp",
            Key::CodeRateLp => "code-rate-lp",
            Key::InnerFec => "inner-fec",
            Key::TransmissionMode => "transmission-mode",
            Key::Guard => "guard",
            Key::Hierarchy => "hierarchy",
            Key::StreamId => "stream-id",
            Key::Polarity => "polarity",
            Key::Pilot => "pilot",
            Key::Rolloff => "rolloff",
            Key::Interleaving => "interleaving",
            Key::DiseqcSource => "diseqc-source",
            Key::LnbType => "lnb-type",
            Key::LnbLof1 => "lnb-lof1",
            Key::LnbLof2 => "lnb-lof2",
            Key::LnbSlof => "lnb-slof",
            Key::Adapter => "adapter",
            Key::Frontend => "frontend",
            Key::ProgramNumber => "program-number",
            Key::VideoPid => "video-pid",
            Key::AudioPid => "audio-pid",
        }
    }

    /// Look up a key by its exact name.
    pub fn from_name(name: &str) -> Option<Key> {
        Key::ALL.iter().copied().find(|k| k.as_str() == name)
    }

    /// Catalog category for keys with an enumerated value set.
    pub fn category(self) -> Option<Category> {
        match self {
            Key::DeliverySystem => Some(Category::DeliverySystem),
            Key::Modulation => Some(Category::Modulation),
            Key::Inversion => Some(Category::Inversion),
            Key::CodeRateHp => Some(Category::CodeRateHp),
            Key::CodeRateLp => Some(Category::CodeRateLp),
            Key::InnerFec => Some(Category::InnerFec),
            Key::TransmissionMode => Some(Category::TransmissionMode),
            Key::Guard => Some(Category::GuardInterval),
            Key::Hierarchy => Some(Category::Hierarchy),
            Key::Polarity => Some(Category::Polarity),
            Key::Pilot => Some(Category::Pilot),
            Key::Rolloff => Some(Category::Rolloff),
            Key::Interleaving => Some(Category::Interleaving),
            Key::LnbType => Some(Category::LnbType),
            Key::DiseqcSource => Some(Category::SatNumber),
            _ => None,
        }
    }

    /// Whether the key addresses the demultiplexer rather than the tuner.
    pub fn is_demux(self) -> bool {
        matches!(self, Key::ProgramNumber | Key::VideoPid | Key::AudioPid)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameter name, known or passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Known(Key),
    Other(String),
}

impl ParamKey {
    pub fn parse(name: &str) -> Self {
        match Key::from_name(name) {
            Some(key) => ParamKey::Known(key),
            None => ParamKey::Other(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ParamKey::Known(key) => key.as_str(),
            ParamKey::Other(name) => name,
        }
    }
}

impl From<Key> for ParamKey {
    fn from(key: Key) -> Self {
        ParamKey::Known(key)
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamValue {
    Int(i64),
    Polarity(Polarity),
}

impl ParamValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Polarity(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Polarity(p) => write!(f, "{}", p.letter()),
        }
    }
}

/// Insertion-ordered set of tuning parameters for one transponder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelParams {
    entries: Vec<(ParamKey, ParamValue)>,
}

impl ChannelParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing an existing value in place.
    pub fn set(&mut self, key: impl Into<ParamKey>, value: ParamValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn set_int(&mut self, key: impl Into<ParamKey>, value: i64) {
        self.set(key, ParamValue::Int(value));
    }

    pub fn get(&self, key: Key) -> Option<&ParamValue> {
        self.get_param(&ParamKey::Known(key))
    }

    pub fn get_param(&self, key: &ParamKey) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_int(&self, key: Key) -> Option<i64> {
        self.get(key).and_then(ParamValue::as_int)
    }

    pub fn contains(&self, key: Key) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: Key) -> Option<ParamValue> {
        let pos = self
            .entries
            .iter()
            .position(|(k, _)| *k == ParamKey::Known(key))?;
        Some(self.entries.remove(pos).1)
    }

    pub fn polarity(&self) -> Option<Polarity> {
        match self.get(Key::Polarity)? {
            ParamValue::Polarity(p) => Some(*p),
            ParamValue::Int(_) => None,
        }
    }

    /// Raw delivery system code, if present.
    pub fn delivery_system_code(&self) -> Option<u32> {
        self.get_int(Key::DeliverySystem)
            .and_then(|v| u32::try_from(v).ok())
    }

    pub fn delivery_system(&self) -> Option<DeliverySystem> {
        self.delivery_system_code().and_then(DeliverySystem::from_code)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Program the LNB oscillators from an LNB type code.
    ///
    /// Unknown codes leave the oscillator parameters untouched.
    pub fn apply_lnb_type(&mut self, code: i64) {
        let Some(band) = u32::try_from(code).ok().and_then(catalog::lnb_band) else {
            log::warn!("Unknown LNB type {}, keeping frontend defaults", code);
            return;
        };
        self.set_int(Key::LnbLof1, band.low_lof as i64);
        self.set_int(Key::LnbLof2, band.high_lof as i64);
        self.set_int(Key::LnbSlof, band.switch_freq as i64);
    }
}

impl Serialize for ChannelParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            match value {
                ParamValue::Int(v) => map.serialize_entry(key.as_str(), v)?,
                ParamValue::Polarity(p) => {
                    map.serialize_entry(key.as_str(), &p.letter().to_string())?
                }
            }
        }
        map.end()
    }
}

/// Delivery systems, numbered as `fe_delivery_system`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliverySystem {
    Undefined,
    DvbcAnnexA,
    DvbcAnnexB,
    Dvbt,
    Dss,
    Dvbs,
    Dvbs2,
    Dvbh,
    Isdbt,
    Isdbs,
    Isdbc,
    Atsc,
    AtscMh,
    Dtmb,
    Cmmb,
    Dab,
    Dvbt2,
    Turbo,
    DvbcAnnexC,
}

const DVBT_FIELDS: &[Key] = &[
    Key::Frequency,
    Key::BandwidthHz,
    Key::Modulation,
    Key::Inversion,
    Key::CodeRateHp,
    Key::CodeRateLp,
    Key::TransmissionMode,
    Key::Guard,
    Key::Hierarchy,
];

const DVBT2_FIELDS: &[Key] = &[
    Key::Frequency,
    Key::BandwidthHz,
    Key::Modulation,
    Key::Inversion,
    Key::CodeRateHp,
    Key::CodeRateLp,
    Key::TransmissionMode,
    Key::Guard,
    Key::Hierarchy,
    Key::StreamId,
];

const DVBS_FIELDS: &[Key] = &[
    Key::DiseqcSource,
    Key::Frequency,
    Key::SymbolRate,
    Key::Polarity,
    Key::InnerFec,
    Key::LnbType,
];

const DSS_FIELDS: &[Key] = &[
    Key::DiseqcSource,
    Key::Frequency,
    Key::SymbolRate,
    Key::Modulation,
    Key::Polarity,
    Key::InnerFec,
    Key::Pilot,
    Key::Rolloff,
    Key::LnbType,
];

const DVBS2_FIELDS: &[Key] = &[
    Key::DiseqcSource,
    Key::Frequency,
    Key::SymbolRate,
    Key::Modulation,
    Key::Polarity,
    Key::InnerFec,
    Key::Pilot,
    Key::Rolloff,
    Key::StreamId,
    Key::LnbType,
];

const DVBC_FIELDS: &[Key] = &[
    Key::Frequency,
    Key::SymbolRate,
    Key::Modulation,
    Key::Inversion,
    Key::InnerFec,
];

const ATSC_FIELDS: &[Key] = &[Key::Frequency, Key::Modulation];

const DTMB_FIELDS: &[Key] = &[
    Key::Frequency,
    Key::BandwidthHz,
    Key::Modulation,
    Key::Inversion,
    Key::InnerFec,
    Key::TransmissionMode,
    Key::Guard,
    Key::Interleaving,
];

const FREQUENCY_ONLY: &[Key] = &[Key::Frequency];

impl DeliverySystem {
    pub fn from_code(code: u32) -> Option<Self> {
        let system = match code {
            0 => DeliverySystem::Undefined,
            1 => DeliverySystem::DvbcAnnexA,
            2 => DeliverySystem::DvbcAnnexB,
            3 => DeliverySystem::Dvbt,
            4 => DeliverySystem::Dss,
            5 => DeliverySystem::Dvbs,
            6 => DeliverySystem::Dvbs2,
            7 => DeliverySystem::Dvbh,
            8 => DeliverySystem::Isdbt,
            9 => DeliverySystem::Isdbs,
            10 => DeliverySystem::Isdbc,
            11 => DeliverySystem::Atsc,
            12 => DeliverySystem::AtscMh,
            13 => DeliverySystem::Dtmb,
            14 => DeliverySystem::Cmmb,
            15 => DeliverySystem::Dab,
            16 => DeliverySystem::Dvbt2,
            17 => DeliverySystem::Turbo,
            18 => DeliverySystem::DvbcAnnexC,
            _ => return None,
        };
        Some(system)
    }

    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn label(self) -> &'static str {
        catalog::display(Category::DeliverySystem, self.code()).unwrap_or("Unknown")
    }

    /// Parameters written after the demux fields of a channel line.
    pub fn field_list(self) -> &'static [Key] {
        match self {
            DeliverySystem::Dvbt => DVBT_FIELDS,
            DeliverySystem::Dvbt2 => DVBT2_FIELDS,
            DeliverySystem::Dvbs | DeliverySystem::Turbo => DVBS_FIELDS,
            DeliverySystem::Dss => DSS_FIELDS,
            DeliverySystem::Dvbs2 => DVBS2_FIELDS,
            DeliverySystem::DvbcAnnexA | DeliverySystem::DvbcAnnexC => DVBC_FIELDS,
            DeliverySystem::Atsc | DeliverySystem::DvbcAnnexB => ATSC_FIELDS,
            DeliverySystem::Dtmb => DTMB_FIELDS,
            _ => FREQUENCY_ONLY,
        }
    }

    /// Whether channel names come from the ATSC virtual channel table.
    pub fn uses_vct(self) -> bool {
        matches!(
            self,
            DeliverySystem::Atsc | DeliverySystem::AtscMh | DeliverySystem::DvbcAnnexB
        )
    }

    pub fn is_satellite(self) -> bool {
        matches!(
            self,
            DeliverySystem::Dvbs
                | DeliverySystem::Dvbs2
                | DeliverySystem::Dss
                | DeliverySystem::Turbo
                | DeliverySystem::Isdbs
        )
    }
}

/// One scanned channel: a program on a tuned transponder.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChannelRecord {
    pub display_name: String,
    pub program_number: u32,
    pub video_pid: u32,
    pub audio_pid: u32,
    pub params: ChannelParams,
}

impl ChannelRecord {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            program_number: 0,
            video_pid: 0,
            audio_pid: 0,
            params: ChannelParams::new(),
        }
    }
}
