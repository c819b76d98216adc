//! Linux DVB API (v5) frontend, demux and DVR access.

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::thread;
use std::time::Duration;

use dvbscan_conf::catalog::{lnb_band, Polarity};
use dvbscan_conf::{ChannelParams, DeliverySystem, Key};
use log::{debug, info, warn};
use nix::fcntl::OFlag;

use super::{device_path, FrontendInfo, SourceError, TableSource};
use crate::ts_analyzer::{pid, SiTable, TsAnalyzer, TS_PACKET_SIZE};

mod sys {
    use std::os::raw::{c_char, c_void};

    pub const DTV_TUNE: u32 = 1;
    pub const DTV_CLEAR: u32 = 2;
    pub const DTV_FREQUENCY: u32 = 3;
    pub const DTV_MODULATION: u32 = 4;
    pub const DTV_BANDWIDTH_HZ: u32 = 5;
    pub const DTV_INVERSION: u32 = 6;
    pub const DTV_SYMBOL_RATE: u32 = 8;
    pub const DTV_INNER_FEC: u32 = 9;
    pub const DTV_VOLTAGE: u32 = 10;
    pub const DTV_TONE: u32 = 11;
    pub const DTV_PILOT: u32 = 12;
    pub const DTV_ROLLOFF: u32 = 13;
    pub const DTV_DELIVERY_SYSTEM: u32 = 17;
    pub const DTV_CODE_RATE_HP: u32 = 36;
    pub const DTV_CODE_RATE_LP: u32 = 37;
    pub const DTV_GUARD_INTERVAL: u32 = 38;
    pub const DTV_TRANSMISSION_MODE: u32 = 39;
    pub const DTV_HIERARCHY: u32 = 40;
    pub const DTV_STREAM_ID: u32 = 42;
    pub const DTV_ENUM_DELSYS: u32 = 44;
    pub const DTV_INTERLEAVING: u32 = 60;

    pub const SEC_VOLTAGE_13: u32 = 0;
    pub const SEC_VOLTAGE_18: u32 = 1;
    pub const SEC_TONE_ON: u32 = 0;
    pub const SEC_TONE_OFF: u32 = 1;

    // fe_type (v3)
    pub const FE_QPSK: u32 = 0;
    pub const FE_QAM: u32 = 1;
    pub const FE_OFDM: u32 = 2;
    pub const FE_ATSC: u32 = 3;
    pub const FE_CAN_2G_MODULATION: u32 = 0x1000_0000;

    pub const DMX_IN_FRONTEND: u32 = 0;
    pub const DMX_OUT_TS_TAP: u32 = 2;
    pub const DMX_PES_OTHER: u32 = 20;
    pub const DMX_IMMEDIATE_START: u32 = 4;

    #[repr(C)]
    pub struct DvbFrontendInfo {
        pub name: [c_char; 128],
        pub fe_type: u32,
        pub frequency_min: u32,
        pub frequency_max: u32,
        pub frequency_stepsize: u32,
        pub frequency_tolerance: u32,
        pub symbol_rate_min: u32,
        pub symbol_rate_max: u32,
        pub symbol_rate_tolerance: u32,
        pub notifier_delay: u32,
        pub caps: u32,
    }

    #[repr(C, packed)]
    #[derive(Clone, Copy)]
    pub struct DtvBuffer {
        pub data: [u8; 32],
        pub len: u32,
        pub reserved1: [u32; 3],
        pub reserved2: *mut c_void,
    }

    #[repr(C, packed)]
    #[derive(Clone, Copy)]
    pub union DtvPropertyValue {
        pub data: u32,
        pub buffer: DtvBuffer,
    }

    #[repr(C, packed)]
    #[derive(Clone, Copy)]
    pub struct DtvProperty {
        pub cmd: u32,
        pub reserved: [u32; 3],
        pub u: DtvPropertyValue,
        pub result: i32,
    }

    impl DtvProperty {
        pub fn new(cmd: u32, data: u32) -> Self {
            Self {
                cmd,
                reserved: [0; 3],
                u: DtvPropertyValue { data },
                result: 0,
            }
        }
    }

    #[repr(C)]
    pub struct DtvProperties {
        pub num: u32,
        pub props: *mut DtvProperty,
    }

    #[repr(C)]
    pub struct DiseqcMasterCmd {
        pub msg: [u8; 6],
        pub msg_len: u8,
    }

    #[repr(C)]
    pub struct DmxPesFilterParams {
        pub pid: u16,
        pub input: u32,
        pub output: u32,
        pub pes_type: u32,
        pub flags: u32,
    }

    nix::ioctl_read!(fe_get_info, b'o', 61, DvbFrontendInfo);
    nix::ioctl_write_ptr!(fe_diseqc_send_master_cmd, b'o', 63, DiseqcMasterCmd);
    nix::ioctl_write_ptr!(fe_set_property, b'o', 82, DtvProperties);
    nix::ioctl_read!(fe_get_property, b'o', 83, DtvProperties);
    nix::ioctl_write_ptr!(dmx_set_pes_filter, b'o', 44, DmxPesFilterParams);
}

/// Parameters passed straight through as DTV properties.
const PROPERTY_MAP: &[(Key, u32)] = &[
    (Key::Modulation, sys::DTV_MODULATION),
    (Key::BandwidthHz, sys::DTV_BANDWIDTH_HZ),
    (Key::Inversion, sys::DTV_INVERSION),
    (Key::InnerFec, sys::DTV_INNER_FEC),
    (Key::Pilot, sys::DTV_PILOT),
    (Key::Rolloff, sys::DTV_ROLLOFF),
    (Key::CodeRateHp, sys::DTV_CODE_RATE_HP),
    (Key::CodeRateLp, sys::DTV_CODE_RATE_LP),
    (Key::Guard, sys::DTV_GUARD_INTERVAL),
    (Key::TransmissionMode, sys::DTV_TRANSMISSION_MODE),
    (Key::Hierarchy, sys::DTV_HIERARCHY),
    (Key::StreamId, sys::DTV_STREAM_ID),
    (Key::Interleaving, sys::DTV_INTERLEAVING),
];

/// Time for the LNB to settle after a voltage or tone change.
const SEC_SETTLE: Duration = Duration::from_millis(15);

fn open_node(path: &str, write: bool, nonblock: bool) -> Result<File, SourceError> {
    let mut options = OpenOptions::new();
    options.read(true).write(write);
    if nonblock {
        options.custom_flags(OFlag::O_NONBLOCK.bits());
    }
    options
        .open(path)
        .map_err(|e| SourceError::device(path, e))
}

fn set_properties(fe: &File, props: &mut [sys::DtvProperty]) -> io::Result<()> {
    let cmdseq = sys::DtvProperties {
        num: props.len() as u32,
        props: props.as_mut_ptr(),
    };
    unsafe { sys::fe_set_property(fe.as_raw_fd(), &cmdseq) }?;
    Ok(())
}

fn frontend_name(fe: &File) -> io::Result<(String, u32, u32)> {
    let mut info = std::mem::MaybeUninit::<sys::DvbFrontendInfo>::zeroed();
    unsafe { sys::fe_get_info(fe.as_raw_fd(), info.as_mut_ptr()) }?;
    let info = unsafe { info.assume_init() };

    let bytes: Vec<u8> = info
        .name
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    let name = String::from_utf8_lossy(&bytes).trim().to_string();
    Ok((name, info.fe_type, info.caps))
}

fn enum_delivery_systems(fe: &File) -> io::Result<Vec<u32>> {
    let mut prop = [sys::DtvProperty::new(sys::DTV_ENUM_DELSYS, 0)];
    let mut cmdseq = sys::DtvProperties {
        num: 1,
        props: prop.as_mut_ptr(),
    };
    unsafe { sys::fe_get_property(fe.as_raw_fd(), &mut cmdseq) }?;

    let buffer = unsafe { prop[0].u.buffer };
    let len = (buffer.len as usize).min(buffer.data.len());
    Ok(buffer.data[..len].iter().map(|&b| b as u32).collect())
}

/// Map a DVB v3 frontend type to the delivery systems it implies.
fn legacy_delivery_systems(fe_type: u32, caps: u32) -> Vec<u32> {
    let second_gen = caps & sys::FE_CAN_2G_MODULATION != 0;
    let mut systems = match fe_type {
        sys::FE_QPSK => vec![DeliverySystem::Dvbs],
        sys::FE_QAM => vec![DeliverySystem::DvbcAnnexA],
        sys::FE_OFDM => vec![DeliverySystem::Dvbt],
        sys::FE_ATSC => vec![DeliverySystem::Atsc, DeliverySystem::DvbcAnnexB],
        _ => Vec::new(),
    };
    if second_gen {
        match fe_type {
            sys::FE_QPSK => systems.push(DeliverySystem::Dvbs2),
            sys::FE_OFDM => systems.push(DeliverySystem::Dvbt2),
            _ => {}
        }
    }
    systems.into_iter().map(DeliverySystem::code).collect()
}

/// Read the device name and supported delivery systems of a frontend.
///
/// The v5 `DTV_ENUM_DELSYS` query is preferred; older drivers fall back to
/// the v3 frontend type.
pub fn query_frontend(adapter: u32, frontend: u32) -> Result<FrontendInfo, SourceError> {
    let path = device_path(adapter, "frontend", frontend);
    let fe = open_node(&path, false, true)?;

    let (name, fe_type, caps) = frontend_name(&fe)?;
    let delivery_systems = match enum_delivery_systems(&fe) {
        Ok(systems) if !systems.is_empty() => systems,
        Ok(_) | Err(_) => {
            debug!("{}: DTV_ENUM_DELSYS unavailable, using fe_type {}", path, fe_type);
            legacy_delivery_systems(fe_type, caps)
        }
    };

    Ok(FrontendInfo {
        name,
        delivery_systems,
    })
}

/// Satellite-specific settings derived from the LNB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SecSetup {
    intermediate_frequency: u32,
    voltage: u32,
    tone: u32,
    /// Committed-switch byte, when a satellite number is configured.
    diseqc: Option<u8>,
}

fn sec_setup(params: &ChannelParams) -> Result<SecSetup, SourceError> {
    let frequency = params
        .get_int(Key::Frequency)
        .ok_or_else(|| SourceError::Tune("frequency is not set".into()))? as u32;
    let polarity = params.polarity().unwrap_or(Polarity::Horizontal);
    let lnb = params
        .get_int(Key::LnbType)
        .and_then(|code| lnb_band(code as u32))
        .or_else(|| lnb_band(0))
        .ok_or_else(|| SourceError::Tune("no LNB definition".into()))?;

    let (intermediate_frequency, high_band) = lnb.intermediate_frequency(frequency, polarity);

    let diseqc = params.get_int(Key::DiseqcSource).filter(|n| *n >= 0).map(|sat| {
        let mut byte = 0xF0 | (((sat & 0x03) as u8) << 2);
        if polarity == Polarity::Horizontal {
            byte |= 0x02;
        }
        if high_band {
            byte |= 0x01;
        }
        byte
    });

    Ok(SecSetup {
        intermediate_frequency,
        voltage: match polarity {
            Polarity::Vertical => sys::SEC_VOLTAGE_13,
            Polarity::Horizontal => sys::SEC_VOLTAGE_18,
        },
        tone: if high_band {
            sys::SEC_TONE_ON
        } else {
            sys::SEC_TONE_OFF
        },
        diseqc,
    })
}

/// Build the property list for one tuning request.
fn tuning_properties(
    params: &ChannelParams,
) -> Result<(Vec<sys::DtvProperty>, Option<SecSetup>), SourceError> {
    let system = params
        .delivery_system()
        .ok_or_else(|| SourceError::Tune("delivery system is not set".into()))?;
    let mut frequency = params
        .get_int(Key::Frequency)
        .ok_or_else(|| SourceError::Tune("frequency is not set".into()))? as u32;

    let sec = if system.is_satellite() {
        let sec = sec_setup(params)?;
        frequency = sec.intermediate_frequency;
        Some(sec)
    } else {
        None
    };

    let mut props = vec![
        sys::DtvProperty::new(sys::DTV_CLEAR, 0),
        sys::DtvProperty::new(sys::DTV_DELIVERY_SYSTEM, system.code()),
        sys::DtvProperty::new(sys::DTV_FREQUENCY, frequency),
    ];

    if let Some(rate) = params.get_int(Key::SymbolRate) {
        // stored in kSym/s
        props.push(sys::DtvProperty::new(sys::DTV_SYMBOL_RATE, (rate * 1000) as u32));
    }
    for &(key, cmd) in PROPERTY_MAP {
        if let Some(value) = params.get_int(key) {
            props.push(sys::DtvProperty::new(cmd, value as u32));
        }
    }
    if let Some(sec) = &sec {
        props.push(sys::DtvProperty::new(sys::DTV_VOLTAGE, sec.voltage));
        props.push(sys::DtvProperty::new(sys::DTV_TONE, sec.tone));
    }
    props.push(sys::DtvProperty::new(sys::DTV_TUNE, 0));

    Ok((props, sec))
}

/// A tunable DVB frontend streaming through its demux and DVR nodes.
pub struct DvbFrontend {
    adapter: u32,
    frontend: u32,
    fe: File,
    demux: Option<File>,
    dvr: Option<File>,
    analyzer: TsAnalyzer,
    buf: Vec<u8>,
}

impl DvbFrontend {
    pub fn open(adapter: u32, frontend: u32) -> Result<Self, SourceError> {
        let path = device_path(adapter, "frontend", frontend);
        let fe = open_node(&path, true, false)?;
        info!("Opened {}", path);

        Ok(Self {
            adapter,
            frontend,
            fe,
            demux: None,
            dvr: None,
            analyzer: TsAnalyzer::new(),
            buf: vec![0u8; TS_PACKET_SIZE * 348],
        })
    }

    fn send_diseqc(&self, byte: u8) -> io::Result<()> {
        let cmd = sys::DiseqcMasterCmd {
            msg: [0xE0, 0x10, 0x38, byte, 0x00, 0x00],
            msg_len: 4,
        };
        unsafe { sys::fe_diseqc_send_master_cmd(self.fe.as_raw_fd(), &cmd) }?;
        Ok(())
    }

    /// Route the whole transport stream to the DVR node.
    fn start_stream(&mut self) -> Result<(), SourceError> {
        self.dvr = None;
        self.demux = None;

        let demux = open_node(&device_path(self.adapter, "demux", self.frontend), true, false)?;
        let filter = sys::DmxPesFilterParams {
            pid: pid::ALL,
            input: sys::DMX_IN_FRONTEND,
            output: sys::DMX_OUT_TS_TAP,
            pes_type: sys::DMX_PES_OTHER,
            flags: sys::DMX_IMMEDIATE_START,
        };
        unsafe { sys::dmx_set_pes_filter(demux.as_raw_fd(), &filter) }.map_err(io::Error::from)?;

        let dvr = open_node(&device_path(self.adapter, "dvr", self.frontend), false, true)?;
        self.demux = Some(demux);
        self.dvr = Some(dvr);
        Ok(())
    }
}

impl TableSource for DvbFrontend {
    fn tune(&mut self, params: &ChannelParams) -> Result<(), SourceError> {
        let (mut props, sec) = tuning_properties(params)?;

        if let Some(SecSetup {
            voltage,
            diseqc: Some(byte),
            ..
        }) = sec
        {
            // the switch must see the final voltage, with the tone off
            let mut pre = [
                sys::DtvProperty::new(sys::DTV_VOLTAGE, voltage),
                sys::DtvProperty::new(sys::DTV_TONE, sys::SEC_TONE_OFF),
            ];
            set_properties(&self.fe, &mut pre)?;
            thread::sleep(SEC_SETTLE);
            self.send_diseqc(byte)?;
            thread::sleep(SEC_SETTLE);
        }

        set_properties(&self.fe, &mut props)
            .map_err(|e| SourceError::Tune(format!("FE_SET_PROPERTY: {}", e)))?;
        debug!(
            "adapter{}/frontend{}: tuned {:?} at {:?}",
            self.adapter,
            self.frontend,
            params.delivery_system(),
            params.get_int(Key::Frequency)
        );

        self.analyzer.reset();
        self.start_stream()
    }

    fn poll_tables(&mut self, wait: Duration) -> Result<Vec<SiTable>, SourceError> {
        let Some(dvr) = self.dvr.as_mut() else {
            return Err(SourceError::Tune("not tuned".into()));
        };

        let mut tables = Vec::new();
        let mut got_data = false;
        loop {
            match dvr.read(&mut self.buf) {
                Ok(0) => break,
                Ok(n) => {
                    got_data = true;
                    tables.extend(self.analyzer.feed(&self.buf[..n]));
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                // EOVERFLOW: the kernel ring buffer overran, data resumes
                Err(e) if e.raw_os_error() == Some(nix::libc::EOVERFLOW) => {
                    warn!("DVR buffer overflow");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        if !got_data {
            thread::sleep(wait);
        }
        Ok(tables)
    }
}
