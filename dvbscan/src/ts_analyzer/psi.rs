//! PSI section framing: header parsing, CRC validation and reassembly of
//! sections spread over several TS packets.

use log::trace;

/// PSI section header (common to all PSI tables).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PsiHeader {
    pub table_id: u8,
    pub section_syntax_indicator: bool,
    /// Section length (12 bits).
    pub section_length: u16,
    /// Table ID extension (long sections only).
    pub table_id_extension: u16,
    /// Version number (5 bits).
    pub version_number: u8,
    pub current_next_indicator: bool,
    pub section_number: u8,
    pub last_section_number: u8,
}

/// A parsed PSI section.
#[derive(Debug, Clone)]
pub struct PsiSection<'a> {
    pub header: PsiHeader,
    /// Section body after the header, before the CRC.
    pub data: &'a [u8],
    pub crc32: u32,
}

impl<'a> PsiSection<'a> {
    /// Parse a PSI section starting at its `table_id` byte.
    ///
    /// Long-form sections are rejected when their CRC does not match.
    pub fn parse(data: &'a [u8]) -> Result<Self, &'static str> {
        if data.len() < 3 {
            return Err("Section too short for header");
        }

        let table_id = data[0];
        let section_syntax_indicator = data[1] & 0x80 != 0;
        let section_length = ((data[1] as u16 & 0x0F) << 8) | data[2] as u16;

        let total_length = 3 + section_length as usize;
        if data.len() < total_length {
            return Err("Incomplete section data");
        }

        if !section_syntax_indicator {
            return Ok(PsiSection {
                header: PsiHeader {
                    table_id,
                    section_syntax_indicator,
                    section_length,
                    table_id_extension: 0,
                    version_number: 0,
                    current_next_indicator: true,
                    section_number: 0,
                    last_section_number: 0,
                },
                data: &data[3..total_length],
                crc32: 0,
            });
        }

        // 5 header bytes + CRC
        if section_length < 9 {
            return Err("Section length too small");
        }

        let crc_offset = total_length - 4;
        let crc32 = u32::from_be_bytes([
            data[crc_offset],
            data[crc_offset + 1],
            data[crc_offset + 2],
            data[crc_offset + 3],
        ]);
        if crc32_mpeg2(&data[..crc_offset]) != crc32 {
            return Err("CRC mismatch");
        }

        Ok(PsiSection {
            header: PsiHeader {
                table_id,
                section_syntax_indicator,
                section_length,
                table_id_extension: ((data[3] as u16) << 8) | data[4] as u16,
                version_number: (data[5] >> 1) & 0x1F,
                current_next_indicator: data[5] & 0x01 != 0,
                section_number: data[6],
                last_section_number: data[7],
            },
            data: &data[8..crc_offset],
            crc32,
        })
    }

    /// Total section length including header and CRC.
    pub fn total_length(&self) -> usize {
        3 + self.header.section_length as usize
    }
}

/// Reassembles sections for one PID.
///
/// Several sections may complete in a single packet; a continuity gap drops
/// whatever was partially collected.
#[derive(Debug, Default)]
pub struct SectionCollector {
    buffer: Vec<u8>,
    last_cc: Option<u8>,
}

impl SectionCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.last_cc = None;
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Add one packet payload, returning every section it completes.
    pub fn push(&mut self, payload: &[u8], cc: u8, payload_unit_start: bool) -> Vec<Vec<u8>> {
        let mut complete = Vec::new();

        if let Some(last) = self.last_cc {
            if cc == last {
                // duplicate packet
                return complete;
            }
            if cc != (last + 1) & 0x0F && !self.buffer.is_empty() {
                trace!("continuity gap {} -> {}, dropping partial section", last, cc);
                self.buffer.clear();
            }
        }
        self.last_cc = Some(cc);

        if payload_unit_start {
            let Some((&pointer, rest)) = payload.split_first() else {
                return complete;
            };
            let pointer = pointer as usize;
            if pointer > rest.len() {
                self.buffer.clear();
                return complete;
            }

            if !self.buffer.is_empty() {
                self.buffer.extend_from_slice(&rest[..pointer]);
                self.drain_into(&mut complete);
            }
            self.buffer.clear();
            self.buffer.extend_from_slice(&rest[pointer..]);
        } else if self.buffer.is_empty() {
            // mid-section with no start seen yet
            return complete;
        } else {
            self.buffer.extend_from_slice(payload);
        }

        self.drain_into(&mut complete);
        complete
    }

    fn drain_into(&mut self, out: &mut Vec<Vec<u8>>) {
        loop {
            match self.buffer.first() {
                None => return,
                // stuffing up to the end of the packet
                Some(&0xFF) => {
                    self.buffer.clear();
                    return;
                }
                Some(_) => {}
            }
            if self.buffer.len() < 3 {
                return;
            }

            let len = 3 + (((self.buffer[1] as usize & 0x0F) << 8) | self.buffer[2] as usize);
            if self.buffer.len() < len {
                return;
            }
            out.push(self.buffer.drain(..len).collect());
        }
    }
}

/// Calculate CRC32 for MPEG-2 (polynomial 0x04C11DB7).
pub fn crc32_mpeg2(data: &[u8]) -> u32 {
    static CRC_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = (i as u32) << 24;
            let mut j = 0;
            while j < 8 {
                crc = if crc & 0x8000_0000 != 0 {
                    (crc << 1) ^ 0x04C1_1DB7
                } else {
                    crc << 1
                };
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    data.iter().fold(0xFFFF_FFFF, |crc, &byte| {
        (crc << 8) ^ CRC_TABLE[((crc >> 24) ^ byte as u32) as usize]
    })
}
