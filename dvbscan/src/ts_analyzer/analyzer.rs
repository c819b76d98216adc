//! Turns a byte stream into decoded tables.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use super::packet::{TsPacket, TsPacketIterator};
use super::pat::PatTable;
use super::pmt::PmtTable;
use super::psi::{PsiSection, SectionCollector};
use super::sdt::SdtTable;
use super::vct::VctTable;
use super::{pid, table_id};

/// A decoded table delivered to the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiTable {
    Pat(PatTable),
    Pmt(PmtTable),
    Sdt(SdtTable),
    Vct(VctTable),
}

impl SiTable {
    pub fn kind(&self) -> &'static str {
        match self {
            SiTable::Pat(_) => "PAT",
            SiTable::Pmt(_) => "PMT",
            SiTable::Sdt(_) => "SDT",
            SiTable::Vct(_) => "VCT",
        }
    }
}

/// Section identity used to report each table version once.
type SectionKey = (u16, u8, u16, u8, u8);

/// Incremental table extractor.
///
/// Bytes may be fed in arbitrary chunks; a trailing partial packet is kept
/// for the next call. PMT PIDs are learned from the PAT.
#[derive(Debug, Default)]
pub struct TsAnalyzer {
    pending: Vec<u8>,
    collectors: HashMap<u16, SectionCollector>,
    /// PMT PID -> program numbers carried on it. Programs may share a PID.
    pmt_pids: HashMap<u16, HashSet<u16>>,
    seen: HashSet<SectionKey>,
    packets_processed: usize,
}

impl TsAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed TS data, returning tables completed by it.
    pub fn feed(&mut self, data: &[u8]) -> Vec<SiTable> {
        let mut buf = std::mem::take(&mut self.pending);
        buf.extend_from_slice(data);

        let mut tables = Vec::new();
        let mut packets = TsPacketIterator::new(&buf);
        for packet in packets.by_ref() {
            self.packets_processed += 1;
            self.process_packet(&packet, &mut tables);
        }
        let consumed = packets.position();

        self.pending = buf.split_off(consumed.min(buf.len()));
        tables
    }

    fn process_packet(&mut self, packet: &TsPacket, tables: &mut Vec<SiTable>) {
        let header = &packet.header;
        if header.pid == pid::NULL || header.transport_error || header.is_scrambled() {
            return;
        }

        // SDT/VCT are ignored until a PAT has announced programs
        let have_pat = !self.pmt_pids.is_empty();
        let wanted = header.pid == pid::PAT
            || (have_pat && (header.pid == pid::SDT || header.pid == pid::ATSC_PSIP))
            || self.pmt_pids.contains_key(&header.pid);
        if !wanted || packet.payload.is_empty() {
            return;
        }

        let sections = self.collectors.entry(header.pid).or_default().push(
            packet.payload,
            header.continuity_counter,
            header.payload_unit_start,
        );

        for raw in sections {
            if let Some(table) = self.process_section(header.pid, &raw) {
                tables.push(table);
            }
        }
    }

    fn process_section(&mut self, pid_val: u16, data: &[u8]) -> Option<SiTable> {
        let section = match PsiSection::parse(data) {
            Ok(s) => s,
            Err(e) => {
                trace!("PID {:#06x}: dropping section: {}", pid_val, e);
                return None;
            }
        };

        let h = section.header;
        if !h.section_syntax_indicator || !h.current_next_indicator {
            return None;
        }
        let key = (
            pid_val,
            h.table_id,
            h.table_id_extension,
            h.version_number,
            h.section_number,
        );
        if self.seen.contains(&key) {
            return None;
        }

        let table = match (pid_val, h.table_id) {
            (pid::PAT, table_id::PAT) => {
                let pat = PatTable::parse(&section).ok()?;
                for entry in &pat.programs {
                    self.pmt_pids
                        .entry(entry.pid)
                        .or_default()
                        .insert(entry.program_number);
                }
                debug!(
                    "PAT: tsid {} with {} programs",
                    pat.transport_stream_id,
                    pat.programs.len()
                );
                SiTable::Pat(pat)
            }
            (pid::SDT, table_id::SDT_ACTUAL) => SiTable::Sdt(SdtTable::parse(&section).ok()?),
            (pid::ATSC_PSIP, table_id::TVCT | table_id::CVCT) => {
                SiTable::Vct(VctTable::parse(&section).ok()?)
            }
            (_, table_id::PMT) => {
                if !self.pmt_pids.get(&pid_val)?.contains(&h.table_id_extension) {
                    return None;
                }
                SiTable::Pmt(PmtTable::parse(&section).ok()?)
            }
            _ => return None,
        };

        self.seen.insert(key);
        trace!("PID {:#06x}: {} v{}", pid_val, table.kind(), h.version_number);
        Some(table)
    }

    pub fn packets_processed(&self) -> usize {
        self.packets_processed
    }

    /// Forget everything, ready for a new multiplex.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
