//! Descriptor loops and the descriptors a scan cares about.

/// Iterator over `(tag, body)` pairs of a descriptor loop.
///
/// Stops at the first descriptor whose length runs past the loop.
pub struct DescriptorIter<'a> {
    data: &'a [u8],
}

impl<'a> DescriptorIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl<'a> Iterator for DescriptorIter<'a> {
    type Item = (u8, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.len() < 2 {
            return None;
        }
        let tag = self.data[0];
        let len = self.data[1] as usize;
        if self.data.len() < 2 + len {
            self.data = &[];
            return None;
        }
        let body = &self.data[2..2 + len];
        self.data = &self.data[2 + len..];
        Some((tag, body))
    }
}

/// Find the first descriptor with the given tag.
pub fn find_descriptor(data: &[u8], tag: u8) -> Option<&[u8]> {
    DescriptorIter::new(data)
        .find(|(t, _)| *t == tag)
        .map(|(_, body)| body)
}

/// Service descriptor (0x48).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub service_type: u8,
    pub provider_name: String,
    pub service_name: String,
}

impl ServiceDescriptor {
    /// Parse the descriptor body (without tag and length).
    pub fn parse(data: &[u8]) -> Result<Self, &'static str> {
        if data.len() < 3 {
            return Err("Service descriptor too short");
        }

        let service_type = data[0];
        let provider_len = data[1] as usize;
        if data.len() < 2 + provider_len + 1 {
            return Err("Invalid provider name length");
        }
        let provider_name = decode_dvb_string(&data[2..2 + provider_len]);

        let name_offset = 2 + provider_len;
        let name_len = data[name_offset] as usize;
        if data.len() < name_offset + 1 + name_len {
            return Err("Invalid service name length");
        }
        let service_name = decode_dvb_string(&data[name_offset + 1..name_offset + 1 + name_len]);

        Ok(ServiceDescriptor {
            service_type,
            provider_name,
            service_name,
        })
    }
}

/// Decode a DVB text field.
///
/// The leading character table selector is stripped. UTF-8 (0x15) and
/// valid UTF-8 input decode as such; everything else is read as Latin-1.
/// Control codes in 0x80..=0x9F (emphasis, line breaks) are dropped.
pub fn decode_dvb_string(data: &[u8]) -> String {
    let body = match data.first() {
        Some(&0x10) => data.get(3..).unwrap_or_default(),
        Some(&0x1F) => data.get(2..).unwrap_or_default(),
        Some(&b) if b < 0x20 => &data[1..],
        _ => data,
    };

    let text = match std::str::from_utf8(body) {
        Ok(s) => s.to_string(),
        Err(_) => body.iter().map(|&b| b as char).collect(),
    };

    text.chars()
        .filter(|c| !matches!(*c as u32, 0x80..=0x9F))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_iter() {
        let data = [0x48, 0x02, 0xAA, 0xBB, 0x0A, 0x01, 0xCC, 0x6A, 0x05, 0x00];
        let tags: Vec<(u8, usize)> = DescriptorIter::new(&data).map(|(t, b)| (t, b.len())).collect();
        // the truncated 0x6A descriptor is not yielded
        assert_eq!(tags, vec![(0x48, 2), (0x0A, 1)]);
        assert_eq!(find_descriptor(&data, 0x0A), Some(&[0xCC][..]));
        assert_eq!(find_descriptor(&data, 0x6A), None);
    }

    #[test]
    fn test_parse_service_descriptor() {
        let data = [0x01, 0x03, b'A', b'B', b'C', 0x04, b'C', b'H', b'0', b'1'];
        let desc = ServiceDescriptor::parse(&data).unwrap();
        assert_eq!(desc.service_type, 0x01);
        assert_eq!(desc.provider_name, "ABC");
        assert_eq!(desc.service_name, "CH01");
    }

    #[test]
    fn test_service_descriptor_truncated() {
        assert!(ServiceDescriptor::parse(&[0x01, 0x05, b'A']).is_err());
    }

    #[test]
    fn test_decode_dvb_string() {
        assert_eq!(decode_dvb_string(b"\x05Das Erste"), "Das Erste");
        assert_eq!(decode_dvb_string(b"\x10\x00\x01ZDF"), "ZDF");
        assert_eq!(decode_dvb_string("\u{15}Één".as_bytes()), "Één");
        assert_eq!(decode_dvb_string(b"\x86BBC\x87 ONE"), "BBC ONE");
        assert_eq!(decode_dvb_string(b"Caf\xe9"), "Café");
        assert_eq!(decode_dvb_string(b""), "");
    }
}
