//! ATSC Virtual Channel Table parsing (A/65).
//!
//! Terrestrial (0xC8) and cable (0xC9) VCTs share one layout: a fixed
//! 32-byte record per virtual channel followed by its descriptors.

use super::psi::PsiSection;
use super::table_id;

/// Size of the fixed part of a channel record.
const CHANNEL_FIXED_LEN: usize = 32;

/// One virtual channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VctChannel {
    /// Up to seven UTF-16 code units, NUL padding removed.
    pub short_name: String,
    pub major_channel_number: u16,
    pub minor_channel_number: u16,
    pub modulation_mode: u8,
    pub channel_tsid: u16,
    pub program_number: u16,
    pub hidden: bool,
    pub service_type: u8,
    pub source_id: u16,
}

impl VctChannel {
    /// `major.minor` as shown by ATSC receivers.
    pub fn channel_number(&self) -> String {
        format!("{}.{}", self.major_channel_number, self.minor_channel_number)
    }
}

/// Parsed VCT section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VctTable {
    pub table_id: u8,
    pub transport_stream_id: u16,
    pub version_number: u8,
    pub section_number: u8,
    pub channels: Vec<VctChannel>,
}

impl VctTable {
    pub fn parse(section: &PsiSection) -> Result<Self, &'static str> {
        let tid = section.header.table_id;
        if tid != table_id::TVCT && tid != table_id::CVCT {
            return Err("Not a VCT section");
        }

        let data = section.data;
        if data.len() < 2 {
            return Err("VCT data too short");
        }
        let num_channels = data[1] as usize;

        let mut vct = VctTable {
            table_id: tid,
            transport_stream_id: section.header.table_id_extension,
            version_number: section.header.version_number,
            section_number: section.header.section_number,
            channels: Vec::with_capacity(num_channels),
        };

        let mut offset = 2;
        for _ in 0..num_channels {
            if offset + CHANNEL_FIXED_LEN > data.len() {
                return Err("VCT channel record truncated");
            }
            let rec = &data[offset..offset + CHANNEL_FIXED_LEN];

            let units: Vec<u16> = rec[..14]
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .take_while(|&u| u != 0)
                .collect();

            let descriptors_length = ((rec[30] as usize & 0x03) << 8) | rec[31] as usize;

            vct.channels.push(VctChannel {
                short_name: String::from_utf16_lossy(&units).trim().to_string(),
                major_channel_number: ((rec[14] as u16 & 0x0F) << 6) | (rec[15] as u16 >> 2),
                minor_channel_number: ((rec[15] as u16 & 0x03) << 8) | rec[16] as u16,
                modulation_mode: rec[17],
                channel_tsid: u16::from_be_bytes([rec[22], rec[23]]),
                program_number: u16::from_be_bytes([rec[24], rec[25]]),
                hidden: rec[26] & 0x10 != 0,
                service_type: rec[27] & 0x3F,
                source_id: u16::from_be_bytes([rec[28], rec[29]]),
            });

            offset += CHANNEL_FIXED_LEN + descriptors_length;
        }

        Ok(vct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts_analyzer::fixtures::{long_section, tvct_section};

    #[test]
    fn test_parse_tvct() {
        let raw = tvct_section(0x0801, &[(7, 1, 3, "WJLA-HD"), (7, 2, 4, "Me")]);
        let vct = VctTable::parse(&PsiSection::parse(&raw).unwrap()).unwrap();

        assert_eq!(vct.table_id, table_id::TVCT);
        assert_eq!(vct.transport_stream_id, 0x0801);
        assert_eq!(vct.channels.len(), 2);

        let first = &vct.channels[0];
        assert_eq!(first.short_name, "WJLA-HD");
        assert_eq!(first.channel_number(), "7.1");
        assert_eq!(first.program_number, 3);
        assert_eq!(first.channel_tsid, 0x0801);
        assert_eq!(first.source_id, 4);
        assert_eq!(first.service_type, 0x02);
        assert!(!first.hidden);

        assert_eq!(vct.channels[1].short_name, "Me");
    }

    #[test]
    fn test_high_channel_numbers() {
        let raw = tvct_section(1, &[(1000, 999, 1, "X")]);
        let vct = VctTable::parse(&PsiSection::parse(&raw).unwrap()).unwrap();
        assert_eq!(vct.channels[0].major_channel_number, 1000);
        assert_eq!(vct.channels[0].minor_channel_number, 999);
    }

    #[test]
    fn test_truncated_record() {
        let raw = long_section(table_id::CVCT, 1, 0, &[0x00, 0x01, 0x00, 0x41]);
        assert!(VctTable::parse(&PsiSection::parse(&raw).unwrap()).is_err());
    }
}
