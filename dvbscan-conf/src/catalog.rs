//! Descriptor catalog.
//!
//! Static tables mapping the symbolic tokens found in DVBv5 channel files
//! to the numeric values the Linux DVB v5 frontend API expects, plus a
//! human-readable label for each value.
//!
//! Every category is an immutable slice of [`DescriptorEntry`]. Within a
//! category both `code` and `wire_token` are unique, and token comparison is
//! case-sensitive.

use log::debug;

/// One symbolic value of a tuning property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorEntry {
    /// Value understood by the frontend (`fe_modulation`, `fe_code_rate`, ...).
    pub code: u32,
    /// Spelling used in DVBv5 channel files.
    pub wire_token: &'static str,
    /// Label for presentation.
    pub label: &'static str,
}

const fn entry(code: u32, wire_token: &'static str, label: &'static str) -> DescriptorEntry {
    DescriptorEntry {
        code,
        wire_token,
        label,
    }
}

/// Property categories with an enumerated value set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    DeliverySystem,
    Inversion,
    CodeRateHp,
    CodeRateLp,
    InnerFec,
    Modulation,
    TransmissionMode,
    GuardInterval,
    Hierarchy,
    Pilot,
    Rolloff,
    Polarity,
    LnbType,
    SatNumber,
    Interleaving,
}

impl Category {
    /// All categories, in catalog order.
    pub const ALL: [Category; 15] = [
        Category::DeliverySystem,
        Category::Inversion,
        Category::CodeRateHp,
        Category::CodeRateLp,
        Category::InnerFec,
        Category::Modulation,
        Category::TransmissionMode,
        Category::GuardInterval,
        Category::Hierarchy,
        Category::Pilot,
        Category::Rolloff,
        Category::Polarity,
        Category::LnbType,
        Category::SatNumber,
        Category::Interleaving,
    ];

    /// Short name used in log messages.
    pub fn name(self) -> &'static str {
        match self {
            Category::DeliverySystem => "delivery system",
            Category::Inversion => "inversion",
            Category::CodeRateHp => "code rate HP",
            Category::CodeRateLp => "code rate LP",
            Category::InnerFec => "inner FEC",
            Category::Modulation => "modulation",
            Category::TransmissionMode => "transmission mode",
            Category::GuardInterval => "guard interval",
            Category::Hierarchy => "hierarchy",
            Category::Pilot => "pilot",
            Category::Rolloff => "rolloff",
            Category::Polarity => "polarity",
            Category::LnbType => "LNB",
            Category::SatNumber => "satellite number",
            Category::Interleaving => "interleaving",
        }
    }
}

static DELIVERY_SYSTEMS: [DescriptorEntry; 19] = [
    entry(0, "UNDEFINED", "Undefined"),
    entry(1, "DVBC/ANNEX_A", "DVB-C Annex A"),
    entry(2, "DVBC/ANNEX_B", "DVB-C Annex B"),
    entry(3, "DVBT", "DVB-T"),
    entry(4, "DSS", "DSS"),
    entry(5, "DVBS", "DVB-S"),
    entry(6, "DVBS2", "DVB-S2"),
    entry(7, "DVBH", "DVB-H"),
    entry(8, "ISDBT", "ISDB-T"),
    entry(9, "ISDBS", "ISDB-S"),
    entry(10, "ISDBC", "ISDB-C"),
    entry(11, "ATSC", "ATSC"),
    entry(12, "ATSCMH", "ATSC-M/H"),
    entry(13, "DTMB", "DTMB"),
    entry(14, "CMMB", "CMMB"),
    entry(15, "DAB", "DAB"),
    entry(16, "DVBT2", "DVB-T2"),
    entry(17, "TURBO", "Turbo"),
    entry(18, "DVBC/ANNEX_C", "DVB-C Annex C"),
];

static INVERSION: [DescriptorEntry; 3] = [
    entry(0, "OFF", "Off"),
    entry(1, "ON", "On"),
    entry(2, "AUTO", "Auto"),
];

// fe_code_rate; shared by the HP, LP and inner FEC categories.
static CODE_RATES: [DescriptorEntry; 13] = [
    entry(0, "NONE", "None"),
    entry(1, "1/2", "1/2"),
    entry(2, "2/3", "2/3"),
    entry(3, "3/4", "3/4"),
    entry(4, "4/5", "4/5"),
    entry(5, "5/6", "5/6"),
    entry(6, "6/7", "6/7"),
    entry(7, "7/8", "7/8"),
    entry(8, "8/9", "8/9"),
    entry(9, "AUTO", "Auto"),
    entry(10, "3/5", "3/5"),
    entry(11, "9/10", "9/10"),
    entry(12, "2/5", "2/5"),
];

static MODULATION: [DescriptorEntry; 14] = [
    entry(0, "QPSK", "QPSK"),
    entry(1, "QAM/16", "QAM 16"),
    entry(2, "QAM/32", "QAM 32"),
    entry(3, "QAM/64", "QAM 64"),
    entry(4, "QAM/128", "QAM 128"),
    entry(5, "QAM/256", "QAM 256"),
    entry(6, "QAM/AUTO", "Auto"),
    entry(7, "VSB/8", "VSB 8"),
    entry(8, "VSB/16", "VSB 16"),
    entry(9, "PSK/8", "PSK 8"),
    entry(10, "APSK/16", "APSK 16"),
    entry(11, "APSK/32", "APSK 32"),
    entry(12, "DQPSK", "DQPSK"),
    entry(13, "QAM/4_NR", "QAM 4 NR"),
];

static TRANSMISSION_MODE: [DescriptorEntry; 9] = [
    entry(0, "2K", "2K"),
    entry(1, "8K", "8K"),
    entry(2, "AUTO", "Auto"),
    entry(3, "4K", "4K"),
    entry(4, "1K", "1K"),
    entry(5, "16K", "16K"),
    entry(6, "32K", "32K"),
    entry(7, "C1", "C1"),
    entry(8, "C3780", "C3780"),
];

static GUARD_INTERVAL: [DescriptorEntry; 11] = [
    entry(0, "1/32", "1/32"),
    entry(1, "1/16", "1/16"),
    entry(2, "1/8", "1/8"),
    entry(3, "1/4", "1/4"),
    entry(4, "AUTO", "Auto"),
    entry(5, "1/128", "1/128"),
    entry(6, "19/128", "19/128"),
    entry(7, "19/256", "19/256"),
    entry(8, "PN420", "PN 420"),
    entry(9, "PN595", "PN 595"),
    entry(10, "PN945", "PN 945"),
];

static HIERARCHY: [DescriptorEntry; 5] = [
    entry(0, "NONE", "None"),
    entry(1, "1", "1"),
    entry(2, "2", "2"),
    entry(3, "4", "4"),
    entry(4, "AUTO", "Auto"),
];

static PILOT: [DescriptorEntry; 3] = [
    entry(0, "ON", "On"),
    entry(1, "OFF", "Off"),
    entry(2, "AUTO", "Auto"),
];

static ROLLOFF: [DescriptorEntry; 4] = [
    entry(0, "35", "0.35"),
    entry(1, "20", "0.20"),
    entry(2, "25", "0.25"),
    entry(3, "AUTO", "Auto"),
];

static POLARITY: [DescriptorEntry; 4] = [
    entry(0, "HORIZONTAL", "H (18V)"),
    entry(1, "VERTICAL", "V (13V)"),
    entry(2, "LEFT", "L (18V)"),
    entry(3, "RIGHT", "R (13V)"),
];

static LNB_TYPES: [DescriptorEntry; 9] = [
    entry(0, "UNIVERSAL", "Universal"),
    entry(1, "DBS", "DBS"),
    entry(2, "EXTENDED", "Extended"),
    entry(3, "STANDARD", "Standard"),
    entry(4, "ENHANCED", "Enhanced"),
    entry(5, "C-BAND", "C-Band"),
    entry(6, "C-MULT", "C-Band Multipoint"),
    entry(7, "DISHPRO", "DishPro"),
    entry(8, "110BS", "110BS"),
];

static SAT_NUMBERS: [DescriptorEntry; 4] = [
    entry(0, "0", "DiSEqC 1 (A)"),
    entry(1, "1", "DiSEqC 2 (B)"),
    entry(2, "2", "DiSEqC 3 (C)"),
    entry(3, "3", "DiSEqC 4 (D)"),
];

static INTERLEAVING: [DescriptorEntry; 4] = [
    entry(0, "NONE", "None"),
    entry(1, "AUTO", "Auto"),
    entry(2, "240", "240"),
    entry(3, "720", "720"),
];

/// Entry list of a category.
pub fn entries(category: Category) -> &'static [DescriptorEntry] {
    match category {
        Category::DeliverySystem => &DELIVERY_SYSTEMS,
        Category::Inversion => &INVERSION,
        Category::CodeRateHp | Category::CodeRateLp | Category::InnerFec => &CODE_RATES,
        Category::Modulation => &MODULATION,
        Category::TransmissionMode => &TRANSMISSION_MODE,
        Category::GuardInterval => &GUARD_INTERVAL,
        Category::Hierarchy => &HIERARCHY,
        Category::Pilot => &PILOT,
        Category::Rolloff => &ROLLOFF,
        Category::Polarity => &POLARITY,
        Category::LnbType => &LNB_TYPES,
        Category::SatNumber => &SAT_NUMBERS,
        Category::Interleaving => &INTERLEAVING,
    }
}

/// Resolve a wire token to the frontend's numeric code.
///
/// The token is trimmed and compared exactly against each entry; the first
/// match wins. A miss is not an error: the caller leaves the property unset
/// so that the frontend falls back to its default.
pub fn resolve(category: Category, token: &str) -> Option<u32> {
    let token = token.trim();
    let found = entries(category)
        .iter()
        .find(|e| e.wire_token == token)
        .map(|e| e.code);

    if found.is_none() {
        debug!("Unresolved {} token: {:?}", category.name(), token);
    }
    found
}

/// Reverse lookup of a code to its display label.
pub fn display(category: Category, code: u32) -> Option<&'static str> {
    entries(category)
        .iter()
        .find(|e| e.code == code)
        .map(|e| e.label)
}

/// Reverse lookup of a code to its DVBv5 spelling.
pub fn wire_token(category: Category, code: u32) -> Option<&'static str> {
    entries(category)
        .iter()
        .find(|e| e.code == code)
        .map(|e| e.wire_token)
}

/// Linear polarisation, as selected by the LNB supply voltage.
///
/// Circular polarisations share the same two voltages: left uses 18 V like
/// horizontal, right uses 13 V like vertical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    /// 18 V.
    Horizontal,
    /// 13 V.
    Vertical,
}

impl Polarity {
    /// Resolve a DVBv5 polarisation token or its one-letter shorthand.
    pub fn resolve(token: &str) -> Option<Self> {
        match token.trim() {
            "HORIZONTAL" | "H" | "h" | "LEFT" | "L" | "l" => Some(Polarity::Horizontal),
            "VERTICAL" | "V" | "v" | "RIGHT" | "R" | "r" => Some(Polarity::Vertical),
            other => {
                debug!("Unresolved polarity token: {:?}", other);
                None
            }
        }
    }

    /// Interpret an internal-dialect `polarity=` value.
    ///
    /// A leading `v`, `V` or `0` selects vertical; anything else, including
    /// an empty value, is horizontal.
    pub fn from_field(value: &str) -> Self {
        match value.trim_start().chars().next() {
            Some('v') | Some('V') | Some('0') => Polarity::Vertical,
            _ => Polarity::Horizontal,
        }
    }

    /// The letter written to channel lines.
    pub fn letter(self) -> char {
        match self {
            Polarity::Horizontal => 'H',
            Polarity::Vertical => 'V',
        }
    }

    /// Catalog code of the linear polarisation.
    pub fn code(self) -> u32 {
        match self {
            Polarity::Horizontal => 0,
            Polarity::Vertical => 1,
        }
    }
}

/// Local-oscillator plan of an LNB type, in kHz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LnbBand {
    /// Low band local oscillator.
    pub low_lof: u32,
    /// High band local oscillator (0 for single band LNBs).
    pub high_lof: u32,
    /// Frequency at which the high band is selected (0 if none).
    pub switch_freq: u32,
    /// High/low band is chosen by polarisation rather than frequency.
    pub polarity_switched: bool,
}

const fn band(low_lof: u32, high_lof: u32, switch_freq: u32, polarity_switched: bool) -> LnbBand {
    LnbBand {
        low_lof,
        high_lof,
        switch_freq,
        polarity_switched,
    }
}

// Indexed by the LNB type code.
static LNB_BANDS: [LnbBand; 9] = [
    band(9_750_000, 10_600_000, 11_700_000, false),
    band(11_250_000, 0, 0, false),
    band(9_750_000, 10_600_000, 11_700_000, false),
    band(10_000_000, 0, 0, false),
    band(9_750_000, 0, 0, false),
    band(5_150_000, 0, 0, false),
    band(5_150_000, 5_750_000, 0, true),
    band(11_250_000, 14_350_000, 0, true),
    band(10_678_000, 0, 0, false),
];

/// Oscillator plan for an LNB type code.
pub fn lnb_band(code: u32) -> Option<LnbBand> {
    LNB_BANDS.get(code as usize).copied()
}

impl LnbBand {
    /// Intermediate frequency and band selection for a transponder.
    ///
    /// Returns `(if_khz, high_band)`. C-band style LNBs have the oscillator
    /// above the signal, so the absolute difference is taken.
    pub fn intermediate_frequency(&self, freq_khz: u32, polarity: Polarity) -> (u32, bool) {
        let high_band = if self.polarity_switched {
            polarity == Polarity::Horizontal && self.high_lof != 0
        } else {
            self.switch_freq != 0 && freq_khz >= self.switch_freq
        };

        let lof = if high_band { self.high_lof } else { self.low_lof };
        (freq_khz.abs_diff(lof), high_band)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_and_tokens_unique() {
        for category in Category::ALL {
            let list = entries(category);
            let codes: HashSet<_> = list.iter().map(|e| e.code).collect();
            let tokens: HashSet<_> = list.iter().map(|e| e.wire_token).collect();
            assert_eq!(codes.len(), list.len(), "{:?}", category);
            assert_eq!(tokens.len(), list.len(), "{:?}", category);
        }
    }

    #[test]
    fn test_resolve_then_display() {
        for category in Category::ALL {
            for e in entries(category) {
                let code = resolve(category, e.wire_token).unwrap();
                assert_eq!(display(category, code), Some(e.label));
                assert_eq!(wire_token(category, code), Some(e.wire_token));
            }
        }
    }

    #[test]
    fn test_resolve_is_exact() {
        assert_eq!(resolve(Category::Modulation, "QAM/64"), Some(3));
        assert_eq!(resolve(Category::Modulation, " QAM/64 "), Some(3));
        // "QAM" is a prefix of several tokens but names none of them
        assert_eq!(resolve(Category::Modulation, "QAM"), None);
        assert_eq!(resolve(Category::Modulation, "qam/64"), None);
        assert_eq!(resolve(Category::GuardInterval, "1/12"), None);
        assert_eq!(resolve(Category::GuardInterval, "1/128"), Some(5));
    }

    #[test]
    fn test_delivery_system_tokens() {
        assert_eq!(resolve(Category::DeliverySystem, "DVBT"), Some(3));
        assert_eq!(resolve(Category::DeliverySystem, "DVBT2"), Some(16));
        assert_eq!(resolve(Category::DeliverySystem, "DVBC/ANNEX_A"), Some(1));
        assert_eq!(display(Category::DeliverySystem, 6), Some("DVB-S2"));
    }

    #[test]
    fn test_polarity_shorthand() {
        assert_eq!(Polarity::resolve("HORIZONTAL"), Some(Polarity::Horizontal));
        assert_eq!(Polarity::resolve("V"), Some(Polarity::Vertical));
        assert_eq!(Polarity::resolve("L"), Some(Polarity::Horizontal));
        assert_eq!(Polarity::resolve("R"), Some(Polarity::Vertical));
        assert_eq!(Polarity::resolve("X"), None);

        assert_eq!(Polarity::from_field("v"), Polarity::Vertical);
        assert_eq!(Polarity::from_field("V"), Polarity::Vertical);
        assert_eq!(Polarity::from_field("0"), Polarity::Vertical);
        assert_eq!(Polarity::from_field("H"), Polarity::Horizontal);
        assert_eq!(Polarity::from_field("1"), Polarity::Horizontal);
        assert_eq!(Polarity::from_field(""), Polarity::Horizontal);
    }

    #[test]
    fn test_lnb_universal_bands() {
        let universal = lnb_band(0).unwrap();
        assert_eq!(
            universal.intermediate_frequency(10_744_000, Polarity::Horizontal),
            (994_000, false)
        );
        assert_eq!(
            universal.intermediate_frequency(11_727_000, Polarity::Vertical),
            (1_127_000, true)
        );
    }

    #[test]
    fn test_lnb_c_band_and_multipoint() {
        let c_band = lnb_band(5).unwrap();
        assert_eq!(
            c_band.intermediate_frequency(3_840_000, Polarity::Vertical),
            (1_310_000, false)
        );

        let c_mult = lnb_band(6).unwrap();
        assert_eq!(
            c_mult.intermediate_frequency(3_840_000, Polarity::Horizontal),
            (1_910_000, true)
        );
        assert!(lnb_band(42).is_none());
    }
}
