//! dvbscan library - channel scanning for Linux DVB frontends
//!
//! Tunes a frontend (or replays a recorded transport stream), collects the
//! PAT, PMT, SDT and VCT tables of each multiplex and turns them into
//! channel records in the colon-separated channel file dialect.

pub mod aggregator;
pub mod config;
pub mod scan;
pub mod ts_analyzer;
pub mod tuner;

// Re-export commonly used types
pub use aggregator::{ScanLimits, ScanPhase, ScanSession};
pub use config::{ConfigError, ConfigFile};
pub use scan::{BatchProgress, BatchReport, CancelToken, ScanConfig, ScanError, ScanOutcome, Scanner, StopMode};
pub use tuner::{FrontendInfo, SourceError, TableSource, TsFileSource};
