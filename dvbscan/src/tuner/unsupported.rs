use std::time::Duration;

use dvbscan_conf::ChannelParams;

use super::{FrontendInfo, SourceError, TableSource};
use crate::ts_analyzer::SiTable;

const UNSUPPORTED_MSG: &str =
    "DVB device access is not supported on this platform (supported: Linux); use --input";

pub fn query_frontend(_adapter: u32, _frontend: u32) -> Result<FrontendInfo, SourceError> {
    Err(SourceError::Unsupported(UNSUPPORTED_MSG))
}

pub struct DvbFrontend {
    _private: (),
}

impl DvbFrontend {
    pub fn open(_adapter: u32, _frontend: u32) -> Result<Self, SourceError> {
        Err(SourceError::Unsupported(UNSUPPORTED_MSG))
    }
}

impl TableSource for DvbFrontend {
    fn tune(&mut self, _params: &ChannelParams) -> Result<(), SourceError> {
        Err(SourceError::Unsupported(UNSUPPORTED_MSG))
    }

    fn poll_tables(&mut self, _wait: Duration) -> Result<Vec<SiTable>, SourceError> {
        Ok(Vec::new())
    }

    fn exhausted(&self) -> bool {
        true
    }
}
