//! Channel configuration for dvbscan.
//!
//! This crate holds everything about tuning parameters that does not touch
//! hardware:
//!
//! - [`catalog`]: symbolic tokens for every enumerated DVB parameter
//! - [`params`]: typed parameter sets and channel records
//! - [`line`]: the colon-separated channel-line dialect
//! - [`dvbv5`]: the DVBv5 `dvb_channel.conf` dialect
//! - [`channel_file`]: reading and writing channel lists
//!
//! # Example
//!
//! ```rust
//! use dvbscan_conf::{parse_channel_line, serialize_channel, Key};
//!
//! let rec = parse_channel_line("Ch 5:program-number=7:audio-pid=258:delsys=3:frequency=490000000").unwrap();
//! assert_eq!(rec.program_number, 7);
//! assert_eq!(rec.params.get_int(Key::Frequency), Some(490_000_000));
//!
//! let line = serialize_channel(&rec);
//! assert!(line.starts_with("Ch 5:program-number=7:video-pid=0:audio-pid=258:delsys=3"));
//! ```

pub mod catalog;
pub mod channel_file;
pub mod dvbv5;
pub mod error;
pub mod line;
pub mod params;

pub use catalog::{Category, DescriptorEntry, LnbBand, Polarity};
pub use channel_file::{parse_channel_list, read_channel_file, write_channel_file};
pub use dvbv5::{check_format, convert_channels, parse_sections, Conversion, Dvbv5Section};
pub use error::ConfError;
pub use line::{parse_channel_line, serialize_channel};
pub use params::{ChannelParams, ChannelRecord, DeliverySystem, Key, ParamKey, ParamValue};
