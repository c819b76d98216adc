//! MPEG-TS packet parsing.

/// TS packet size in bytes.
pub const TS_PACKET_SIZE: usize = 188;

/// TS sync byte (0x47).
pub const SYNC_BYTE: u8 = 0x47;

/// Parsed TS packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TsHeader {
    /// Transport error indicator.
    pub transport_error: bool,
    /// Payload unit start indicator.
    pub payload_unit_start: bool,
    /// Packet Identifier (13 bits).
    pub pid: u16,
    /// Transport scrambling control (2 bits).
    pub scrambling_control: u8,
    /// Adaptation field control (2 bits).
    pub adaptation_field_control: u8,
    /// Continuity counter (4 bits).
    pub continuity_counter: u8,
}

impl TsHeader {
    pub fn has_adaptation_field(&self) -> bool {
        self.adaptation_field_control & 0x02 != 0
    }

    pub fn has_payload(&self) -> bool {
        self.adaptation_field_control & 0x01 != 0
    }

    pub fn is_scrambled(&self) -> bool {
        self.scrambling_control != 0
    }
}

/// A parsed TS packet borrowing its payload from the input buffer.
#[derive(Debug, Clone)]
pub struct TsPacket<'a> {
    pub header: TsHeader,
    /// Payload bytes after the adaptation field, if any.
    pub payload: &'a [u8],
}

impl<'a> TsPacket<'a> {
    /// Parse a TS packet from the first 188 bytes of `data`.
    pub fn parse(data: &'a [u8]) -> Result<Self, &'static str> {
        if data.len() < TS_PACKET_SIZE {
            return Err("Packet too short");
        }
        if data[0] != SYNC_BYTE {
            return Err("Invalid sync byte");
        }

        let header = TsHeader {
            transport_error: data[1] & 0x80 != 0,
            payload_unit_start: data[1] & 0x40 != 0,
            pid: ((data[1] as u16 & 0x1F) << 8) | data[2] as u16,
            scrambling_control: (data[3] >> 6) & 0x03,
            adaptation_field_control: (data[3] >> 4) & 0x03,
            continuity_counter: data[3] & 0x0F,
        };

        let offset = if header.has_adaptation_field() {
            5 + data[4] as usize
        } else {
            4
        };

        let payload = if header.has_payload() && offset < TS_PACKET_SIZE {
            &data[offset..TS_PACKET_SIZE]
        } else {
            &[]
        };

        Ok(TsPacket { header, payload })
    }
}

/// Iterator over TS packets in a byte stream.
///
/// Bytes that do not start a packet are skipped until the next sync byte.
pub struct TsPacketIterator<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> TsPacketIterator<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        let mut it = Self { data, offset: 0 };
        it.seek_sync();
        it
    }

    /// Byte offset of the first unconsumed byte.
    pub fn position(&self) -> usize {
        self.offset
    }

    fn seek_sync(&mut self) {
        while self.offset < self.data.len() && self.data[self.offset] != SYNC_BYTE {
            self.offset += 1;
        }
    }
}

impl<'a> Iterator for TsPacketIterator<'a> {
    type Item = TsPacket<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.offset + TS_PACKET_SIZE <= self.data.len() {
            // the following packet must line up too, when there is one
            let next = self.offset + TS_PACKET_SIZE;
            let aligned = next >= self.data.len() || self.data[next] == SYNC_BYTE;

            match TsPacket::parse(&self.data[self.offset..]) {
                Ok(packet) if aligned => {
                    self.offset += TS_PACKET_SIZE;
                    return Some(packet);
                }
                _ => {
                    self.offset += 1;
                    self.seek_sync();
                }
            }
        }
        None
    }
}
