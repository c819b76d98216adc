//! Table sources: where a scan gets its PSI/SI tables from.
//!
//! A live DVB frontend tunes and streams the whole multiplex through the
//! demux; [`TsFileSource`] replays a recorded transport stream instead.

use std::time::Duration;

use dvbscan_conf::{ChannelParams, DeliverySystem};

use crate::ts_analyzer::SiTable;

#[cfg(target_os = "linux")]
pub use self::linux::{query_frontend, DvbFrontend};
#[cfg(not(target_os = "linux"))]
pub use self::unsupported::{query_frontend, DvbFrontend};

#[cfg(target_os = "linux")]
mod linux;
#[cfg(not(target_os = "linux"))]
mod unsupported;

mod error;
mod file;

pub use error::SourceError;
pub use file::TsFileSource;

/// Something that can be tuned and then yields decoded tables.
pub trait TableSource {
    /// Tune to `params`, dropping any state from the previous frequency.
    fn tune(&mut self, params: &ChannelParams) -> Result<(), SourceError>;

    /// Tables completed since the last call, waiting at most `wait` for data.
    fn poll_tables(&mut self, wait: Duration) -> Result<Vec<SiTable>, SourceError>;

    /// Whether the source can never produce more data for this tuning.
    fn exhausted(&self) -> bool {
        false
    }
}

/// What a frontend reports about itself.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FrontendInfo {
    pub name: String,
    /// Raw delivery system codes; unknown codes are kept.
    pub delivery_systems: Vec<u32>,
}

impl FrontendInfo {
    pub fn supports(&self, system: DeliverySystem) -> bool {
        self.delivery_systems.contains(&system.code())
    }
}

/// Device node path of a DVB adapter component.
pub fn device_path(adapter: u32, node: &str, index: u32) -> String {
    format!("/dev/dvb/adapter{}/{}{}", adapter, node, index)
}
