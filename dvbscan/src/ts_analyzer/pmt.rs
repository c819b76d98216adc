//! PMT (Program Map Table) parsing.
//!
//! The PMT lists the elementary streams of one program. A scan only needs
//! the first video and the first audio PID.

use super::descriptors::DescriptorIter;
use super::psi::PsiSection;
use super::{descriptor_tag, table_id};

/// Stream type constants.
pub mod stream_type {
    /// MPEG-1 Video.
    pub const MPEG1_VIDEO: u8 = 0x01;
    /// MPEG-2 Video.
    pub const MPEG2_VIDEO: u8 = 0x02;
    /// MPEG-1 Audio.
    pub const MPEG1_AUDIO: u8 = 0x03;
    /// MPEG-2 Audio.
    pub const MPEG2_AUDIO: u8 = 0x04;
    /// MPEG-2 PES Private Data.
    pub const PES_PRIVATE_DATA: u8 = 0x06;
    /// AAC Audio (ADTS).
    pub const AAC_AUDIO: u8 = 0x0F;
    /// MPEG-4 Part 2 Video.
    pub const MPEG4_VIDEO: u8 = 0x10;
    /// AAC Audio (LATM).
    pub const AAC_LATM: u8 = 0x11;
    /// H.264/AVC Video.
    pub const H264_VIDEO: u8 = 0x1B;
    /// H.265/HEVC Video.
    pub const H265_VIDEO: u8 = 0x24;
    /// AVS2 Video (DTMB).
    pub const AVS2_VIDEO: u8 = 0xD2;
    /// ATSC AC-3 Audio.
    pub const ATSC_AC3: u8 = 0x81;
    /// ATSC E-AC-3 Audio.
    pub const ATSC_EAC3: u8 = 0x87;
}

/// Coarse classification of an elementary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
    Other,
}

/// A single elementary stream entry in the PMT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PmtStream {
    pub stream_type: u8,
    pub elementary_pid: u16,
    /// ES info descriptors (raw).
    pub descriptors: Vec<u8>,
}

impl PmtStream {
    pub fn kind(&self) -> StreamKind {
        match self.stream_type {
            stream_type::MPEG1_VIDEO
            | stream_type::MPEG2_VIDEO
            | stream_type::MPEG4_VIDEO
            | stream_type::H264_VIDEO
            | stream_type::H265_VIDEO
            | stream_type::AVS2_VIDEO => StreamKind::Video,
            stream_type::MPEG1_AUDIO
            | stream_type::MPEG2_AUDIO
            | stream_type::AAC_AUDIO
            | stream_type::AAC_LATM
            | stream_type::ATSC_AC3
            | stream_type::ATSC_EAC3 => StreamKind::Audio,
            // DVB carries AC-3, E-AC-3, DTS and AAC as private data
            stream_type::PES_PRIVATE_DATA => {
                let audio = DescriptorIter::new(&self.descriptors).any(|(tag, _)| {
                    matches!(
                        tag,
                        descriptor_tag::AC3
                            | descriptor_tag::ENHANCED_AC3
                            | descriptor_tag::DTS
                            | descriptor_tag::AAC
                    )
                });
                if audio {
                    StreamKind::Audio
                } else {
                    StreamKind::Other
                }
            }
            _ => StreamKind::Other,
        }
    }

    pub fn is_video(&self) -> bool {
        self.kind() == StreamKind::Video
    }

    pub fn is_audio(&self) -> bool {
        self.kind() == StreamKind::Audio
    }
}

/// Parsed PMT section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PmtTable {
    /// Program number (service ID).
    pub program_number: u16,
    pub version_number: u8,
    pub pcr_pid: u16,
    /// Program info descriptors (raw).
    pub program_info: Vec<u8>,
    pub streams: Vec<PmtStream>,
}

impl PmtTable {
    pub fn parse(section: &PsiSection) -> Result<Self, &'static str> {
        if section.header.table_id != table_id::PMT {
            return Err("Not a PMT section");
        }

        let data = section.data;
        if data.len() < 4 {
            return Err("PMT data too short");
        }

        let pcr_pid = ((data[0] as u16 & 0x1F) << 8) | data[1] as u16;
        let program_info_length = ((data[2] as usize & 0x0F) << 8) | data[3] as usize;
        if data.len() < 4 + program_info_length {
            return Err("Invalid program info length");
        }

        let mut pmt = PmtTable {
            program_number: section.header.table_id_extension,
            version_number: section.header.version_number,
            pcr_pid,
            program_info: data[4..4 + program_info_length].to_vec(),
            streams: Vec::new(),
        };

        let mut offset = 4 + program_info_length;
        while offset + 5 <= data.len() {
            let stream_type = data[offset];
            let elementary_pid = ((data[offset + 1] as u16 & 0x1F) << 8) | data[offset + 2] as u16;
            let es_info_length =
                ((data[offset + 3] as usize & 0x0F) << 8) | data[offset + 4] as usize;
            offset += 5;

            if offset + es_info_length > data.len() {
                break;
            }

            pmt.streams.push(PmtStream {
                stream_type,
                elementary_pid,
                descriptors: data[offset..offset + es_info_length].to_vec(),
            });
            offset += es_info_length;
        }

        Ok(pmt)
    }

    /// PID of the first video stream, in table order.
    pub fn first_video_pid(&self) -> Option<u16> {
        self.streams
            .iter()
            .find(|s| s.is_video())
            .map(|s| s.elementary_pid)
    }

    /// PID of the first audio stream, in table order.
    pub fn first_audio_pid(&self) -> Option<u16> {
        self.streams
            .iter()
            .find(|s| s.is_audio())
            .map(|s| s.elementary_pid)
    }
}
