//! SDT (Service Description Table) parsing.
//!
//! The SDT is transmitted on PID 0x0011 and carries the service names of
//! DVB multiplexes.

use super::descriptors::{find_descriptor, ServiceDescriptor};
use super::psi::PsiSection;
use super::{descriptor_tag, table_id};

/// Service entry in the SDT.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SdtService {
    /// Service ID (program number).
    pub service_id: u16,
    pub running_status: u8,
    pub free_ca_mode: bool,
    pub service_descriptor: Option<ServiceDescriptor>,
}

impl SdtService {
    /// Service name from the service descriptor, if it is not empty.
    pub fn name(&self) -> Option<&str> {
        self.service_descriptor
            .as_ref()
            .map(|d| d.service_name.as_str())
            .filter(|n| !n.is_empty())
    }
}

/// Parsed SDT section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SdtTable {
    pub transport_stream_id: u16,
    pub original_network_id: u16,
    pub version_number: u8,
    pub section_number: u8,
    pub services: Vec<SdtService>,
}

impl SdtTable {
    pub fn parse(section: &PsiSection) -> Result<Self, &'static str> {
        if section.header.table_id != table_id::SDT_ACTUAL
            && section.header.table_id != table_id::SDT_OTHER
        {
            return Err("Not a SDT section");
        }

        let data = section.data;
        if data.len() < 3 {
            return Err("SDT data too short");
        }

        let mut sdt = SdtTable {
            transport_stream_id: section.header.table_id_extension,
            original_network_id: u16::from_be_bytes([data[0], data[1]]),
            version_number: section.header.version_number,
            section_number: section.header.section_number,
            services: Vec::new(),
        };

        let mut offset = 3;
        while offset + 5 <= data.len() {
            let service_id = u16::from_be_bytes([data[offset], data[offset + 1]]);
            let running_status = (data[offset + 3] >> 5) & 0x07;
            let free_ca_mode = data[offset + 3] & 0x10 != 0;
            let descriptors_length =
                ((data[offset + 3] as usize & 0x0F) << 8) | data[offset + 4] as usize;
            offset += 5;

            if offset + descriptors_length > data.len() {
                break;
            }
            let descriptors = &data[offset..offset + descriptors_length];
            offset += descriptors_length;

            sdt.services.push(SdtService {
                service_id,
                running_status,
                free_ca_mode,
                service_descriptor: find_descriptor(descriptors, descriptor_tag::SERVICE)
                    .and_then(|body| ServiceDescriptor::parse(body).ok()),
            });
        }

        Ok(sdt)
    }

    pub fn find_service(&self, service_id: u16) -> Option<&SdtService> {
        self.services.iter().find(|s| s.service_id == service_id)
    }
}
