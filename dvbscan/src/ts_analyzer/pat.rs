//! PAT (Program Association Table) parsing.
//!
//! The PAT is transmitted on PID 0x0000 and lists every program in the
//! multiplex together with the PID of its PMT.

use super::psi::PsiSection;
use super::table_id;

/// A single PAT entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatEntry {
    pub program_number: u16,
    /// PID of the PMT for this program.
    pub pid: u16,
}

/// Parsed PAT section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatTable {
    pub transport_stream_id: u16,
    pub version_number: u8,
    /// Programs in table order, excluding the network entry.
    pub programs: Vec<PatEntry>,
    /// NIT PID (program number 0), if announced.
    pub nit_pid: Option<u16>,
}

impl PatTable {
    pub fn parse(section: &PsiSection) -> Result<Self, &'static str> {
        if section.header.table_id != table_id::PAT {
            return Err("Not a PAT section");
        }
        if section.data.len() % 4 != 0 {
            return Err("Invalid PAT data length");
        }

        let mut pat = PatTable {
            transport_stream_id: section.header.table_id_extension,
            version_number: section.header.version_number,
            ..Default::default()
        };

        for chunk in section.data.chunks_exact(4) {
            let program_number = u16::from_be_bytes([chunk[0], chunk[1]]);
            let pid = ((chunk[2] as u16 & 0x1F) << 8) | chunk[3] as u16;

            if program_number == 0 {
                pat.nit_pid = Some(pid);
            } else {
                pat.programs.push(PatEntry {
                    program_number,
                    pid,
                });
            }
        }

        Ok(pat)
    }

    pub fn pmt_pid(&self, program_number: u16) -> Option<u16> {
        self.programs
            .iter()
            .find(|p| p.program_number == program_number)
            .map(|p| p.pid)
    }
}
