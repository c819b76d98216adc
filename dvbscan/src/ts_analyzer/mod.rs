//! MPEG-TS table extraction.
//!
//! Turns raw transport stream bytes into the PSI/SI tables a channel scan
//! needs.
//!
//! # Supported Tables
//! - PAT (Program Association Table) - PID 0x0000
//! - PMT (Program Map Table) - PIDs announced by the PAT
//! - SDT (Service Description Table, actual) - PID 0x0011
//! - TVCT/CVCT (ATSC Virtual Channel Table) - PID 0x1FFB
//!
//! # Usage
//! ```ignore
//! use dvbscan::ts_analyzer::{SiTable, TsAnalyzer};
//!
//! let mut analyzer = TsAnalyzer::new();
//! for table in analyzer.feed(&ts_data) {
//!     if let SiTable::Pat(pat) = table {
//!         println!("TSID: {}", pat.transport_stream_id);
//!     }
//! }
//! ```

mod analyzer;
mod descriptors;
mod packet;
mod pat;
mod pmt;
mod psi;
mod sdt;
mod vct;

#[cfg(test)]
pub(crate) mod fixtures;

pub use analyzer::{SiTable, TsAnalyzer};
pub use descriptors::{decode_dvb_string, find_descriptor, DescriptorIter, ServiceDescriptor};
pub use packet::{TsHeader, TsPacket, TsPacketIterator, SYNC_BYTE, TS_PACKET_SIZE};
pub use pat::{PatEntry, PatTable};
pub use pmt::{stream_type, PmtStream, PmtTable, StreamKind};
pub use psi::{crc32_mpeg2, PsiHeader, PsiSection, SectionCollector};
pub use sdt::{SdtService, SdtTable};
pub use vct::{VctChannel, VctTable};

/// Well-known PIDs in MPEG-TS.
pub mod pid {
    /// Program Association Table PID.
    pub const PAT: u16 = 0x0000;
    /// Service Description Table PID.
    pub const SDT: u16 = 0x0011;
    /// ATSC PSIP base PID, carrying the VCT.
    pub const ATSC_PSIP: u16 = 0x1FFB;
    /// Null packet PID (stuffing).
    pub const NULL: u16 = 0x1FFF;
    /// Pseudo-PID that asks the demux for the whole transport stream.
    pub const ALL: u16 = 0x2000;
}

/// Table IDs for PSI/SI tables.
pub mod table_id {
    /// Program Association Section.
    pub const PAT: u8 = 0x00;
    /// Program Map Section.
    pub const PMT: u8 = 0x02;
    /// Service Description Section - actual.
    pub const SDT_ACTUAL: u8 = 0x42;
    /// Service Description Section - other.
    pub const SDT_OTHER: u8 = 0x46;
    /// ATSC Terrestrial Virtual Channel Table.
    pub const TVCT: u8 = 0xC8;
    /// ATSC Cable Virtual Channel Table.
    pub const CVCT: u8 = 0xC9;
}

/// Descriptor tags used in PSI/SI tables.
pub mod descriptor_tag {
    /// Registration descriptor.
    pub const REGISTRATION: u8 = 0x05;
    /// ISO 639 language descriptor.
    pub const ISO_639_LANGUAGE: u8 = 0x0A;
    /// Service descriptor.
    pub const SERVICE: u8 = 0x48;
    /// DVB AC-3 descriptor.
    pub const AC3: u8 = 0x6A;
    /// DVB enhanced AC-3 descriptor.
    pub const ENHANCED_AC3: u8 = 0x7A;
    /// DVB DTS descriptor.
    pub const DTS: u8 = 0x7B;
    /// DVB AAC descriptor.
    pub const AAC: u8 = 0x7C;
    /// ATSC extended channel name descriptor.
    pub const EXTENDED_CHANNEL_NAME: u8 = 0xA0;
}
