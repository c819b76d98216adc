//! Hand-built sections and packets for tests.

use super::packet::{SYNC_BYTE, TS_PACKET_SIZE};
use super::psi::crc32_mpeg2;
use super::{descriptor_tag, table_id};

/// Long-form section with a valid CRC.
pub fn long_section(table_id: u8, extension: u16, version: u8, body: &[u8]) -> Vec<u8> {
    let section_length = 5 + body.len() + 4;
    let mut raw = vec![
        table_id,
        0xB0 | ((section_length >> 8) as u8 & 0x0F),
        section_length as u8,
        (extension >> 8) as u8,
        extension as u8,
        0xC1 | ((version & 0x1F) << 1),
        0x00,
        0x00,
    ];
    raw.extend_from_slice(body);
    let crc = crc32_mpeg2(&raw);
    raw.extend_from_slice(&crc.to_be_bytes());
    raw
}

pub fn pat_section(tsid: u16, programs: &[(u16, u16)]) -> Vec<u8> {
    let mut body = Vec::new();
    for &(number, pid) in programs {
        body.extend_from_slice(&number.to_be_bytes());
        body.push(0xE0 | (pid >> 8) as u8);
        body.push(pid as u8);
    }
    long_section(table_id::PAT, tsid, 0, &body)
}

/// PMT with `(stream_type, pid, es_descriptors)` entries.
pub fn pmt_section(program: u16, streams: &[(u8, u16, &[u8])]) -> Vec<u8> {
    let mut body = vec![0xE1, 0x00, 0xF0, 0x00];
    for &(stream_type, pid, descriptors) in streams {
        body.push(stream_type);
        body.push(0xE0 | (pid >> 8) as u8);
        body.push(pid as u8);
        body.push(0xF0 | (descriptors.len() >> 8) as u8);
        body.push(descriptors.len() as u8);
        body.extend_from_slice(descriptors);
    }
    long_section(table_id::PMT, program, 0, &body)
}

pub fn service_descriptor(provider: &[u8], name: &[u8]) -> Vec<u8> {
    let mut d = vec![descriptor_tag::SERVICE, (3 + provider.len() + name.len()) as u8, 0x01];
    d.push(provider.len() as u8);
    d.extend_from_slice(provider);
    d.push(name.len() as u8);
    d.extend_from_slice(name);
    d
}

/// SDT actual with `(service_id, name)` entries.
pub fn sdt_section(tsid: u16, services: &[(u16, &str)]) -> Vec<u8> {
    let mut body = vec![0x20, 0x85, 0xFF];
    for &(service_id, name) in services {
        let descriptor = service_descriptor(b"Provider", name.as_bytes());
        body.extend_from_slice(&service_id.to_be_bytes());
        body.push(0xFD);
        body.push(0x80 | (descriptor.len() >> 8) as u8);
        body.push(descriptor.len() as u8);
        body.extend_from_slice(&descriptor);
    }
    long_section(table_id::SDT_ACTUAL, tsid, 0, &body)
}

/// Terrestrial VCT with `(major, minor, program, short_name)` entries.
pub fn tvct_section(tsid: u16, channels: &[(u16, u16, u16, &str)]) -> Vec<u8> {
    let mut body = vec![0x00, channels.len() as u8];
    for &(major, minor, program, name) in channels {
        let mut units: Vec<u16> = name.encode_utf16().take(7).collect();
        units.resize(7, 0);
        for unit in units {
            body.extend_from_slice(&unit.to_be_bytes());
        }
        body.push(0xF0 | (major >> 6) as u8);
        body.push(((major & 0x3F) << 2) as u8 | ((minor >> 8) & 0x03) as u8);
        body.push(minor as u8);
        body.push(0x04);
        body.extend_from_slice(&0u32.to_be_bytes());
        body.extend_from_slice(&tsid.to_be_bytes());
        body.extend_from_slice(&program.to_be_bytes());
        body.push(0x0D);
        body.push(0xC2);
        body.extend_from_slice(&(program + 1).to_be_bytes());
        body.push(0xFC);
        body.push(0x00);
    }
    body.push(0xFC);
    body.push(0x00);
    long_section(table_id::TVCT, tsid, 0, &body)
}

/// Split one section into TS packets on `pid`, continuity counters from `cc`.
pub fn packetize(pid: u16, cc: &mut u8, section: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut remaining = section;
    let mut first = true;

    while first || !remaining.is_empty() {
        let mut p = vec![SYNC_BYTE, (pid >> 8) as u8 & 0x1F, pid as u8, 0x10 | (*cc & 0x0F)];
        if first {
            p[1] |= 0x40;
            p.push(0x00);
        }
        let room = TS_PACKET_SIZE - p.len();
        let take = room.min(remaining.len());
        p.extend_from_slice(&remaining[..take]);
        p.resize(TS_PACKET_SIZE, 0xFF);

        remaining = &remaining[take..];
        *cc = (*cc + 1) & 0x0F;
        first = false;
        out.extend_from_slice(&p);
    }
    out
}
