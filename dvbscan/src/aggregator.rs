//! Per-frequency table bookkeeping.
//!
//! A [`ScanSession`] collects the PAT, PMT, SDT and VCT tables of one tuned
//! multiplex, correlates them by program number and turns them into
//! [`ChannelRecord`]s.
//!
//! ```text
//! Idle --PAT--> AwaitingPmt --all PMTs--> AwaitingNames --all names--> Complete
//!   \________________________ timeout ________________________/---> TimedOut
//! ```

use std::time::{Duration, Instant};

use dvbscan_conf::{ChannelParams, ChannelRecord};
use log::{debug, trace, warn};

use crate::ts_analyzer::{PatEntry, PatTable, PmtTable, SdtTable, SiTable, VctTable};

/// Default cap on programs, PMTs and names kept per scan.
pub const MAX_PROGRAMS: usize = 128;

/// Default wall-clock budget for one frequency.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(11);

/// Bounds applied to a single scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLimits {
    pub max_programs: usize,
    pub timeout: Duration,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            max_programs: MAX_PROGRAMS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Where a scan currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// Not started, or waiting for the PAT.
    Idle,
    AwaitingPmt,
    AwaitingNames,
    Complete,
    TimedOut,
}

impl ScanPhase {
    pub fn is_finished(self) -> bool {
        matches!(self, ScanPhase::Complete | ScanPhase::TimedOut)
    }
}

/// Progress flags and counters of the running scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanState {
    pub pat_done: bool,
    pub pmt_done: bool,
    pub sdt_done: bool,
    pub vct_done: bool,
    pub pat_count: usize,
    /// PAT programs past the capacity, not tracked.
    pub pat_dropped: usize,
    pub pmt_count: usize,
    pub sdt_count: usize,
    pub vct_count: usize,
    pub start_time: Option<Instant>,
    pub current_time: Option<Instant>,
}

impl ScanState {
    fn is_complete(&self) -> bool {
        self.pat_done && self.pmt_done && (self.sdt_done || self.vct_done)
    }
}

/// A vector that refuses to grow past a fixed capacity.
#[derive(Debug, Clone)]
pub struct TableBuf<T> {
    items: Vec<T>,
    capacity: usize,
    dropped: usize,
}

impl<T> TableBuf<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity,
            dropped: 0,
        }
    }

    /// Append `item`, or count it as dropped when full.
    pub fn push(&mut self, item: T) -> bool {
        if self.items.len() >= self.capacity {
            self.dropped += 1;
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.dropped = 0;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Items refused since the last clear.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

/// Elementary stream PIDs of one program; 0 means absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramEntry {
    pub program_number: u16,
    pub video_pid: u16,
    pub audio_pid: u16,
}

/// Display name of one program, from the SDT or the VCT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameEntry {
    pub program_number: u16,
    pub display_name: String,
}

fn fallback_name(program_number: u16) -> String {
    format!("Program-{}", program_number)
}

/// Table collection for one tuned frequency.
#[derive(Debug, Clone)]
pub struct ScanSession {
    limits: ScanLimits,
    atsc: bool,
    running: bool,
    finished: Option<ScanPhase>,
    state: ScanState,
    pat: TableBuf<PatEntry>,
    pmt: TableBuf<ProgramEntry>,
    sdt: TableBuf<NameEntry>,
    vct: TableBuf<NameEntry>,
}

impl ScanSession {
    /// `atsc` selects the VCT instead of the SDT as the source of names.
    pub fn new(limits: ScanLimits, atsc: bool) -> Self {
        let cap = limits.max_programs;
        Self {
            limits,
            atsc,
            running: false,
            finished: None,
            state: ScanState::default(),
            pat: TableBuf::new(cap),
            pmt: TableBuf::new(cap),
            sdt: TableBuf::new(cap),
            vct: TableBuf::new(cap),
        }
    }

    pub fn set_atsc(&mut self, atsc: bool) {
        self.atsc = atsc;
    }

    pub fn is_atsc(&self) -> bool {
        self.atsc
    }

    pub fn limits(&self) -> &ScanLimits {
        &self.limits
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    fn clear(&mut self) {
        self.state = ScanState::default();
        self.finished = None;
        self.pat.clear();
        self.pmt.clear();
        self.sdt.clear();
        self.vct.clear();
    }

    /// Begin a new frequency, discarding everything from the previous one.
    pub fn start(&mut self, now: Instant) {
        self.clear();
        self.state.start_time = Some(now);
        self.state.current_time = Some(now);
        self.running = true;
        debug!("scan started (atsc: {})", self.atsc);
    }

    /// Abort the scan and discard what was collected.
    pub fn cancel(&mut self) {
        if self.running {
            debug!(
                "scan cancelled with {}/{} PMTs",
                self.state.pmt_count, self.state.pat_count
            );
        }
        self.clear();
        self.running = false;
    }

    pub fn on_table(&mut self, table: &SiTable, now: Instant) {
        self.state.current_time = Some(now);
        match table {
            SiTable::Pat(pat) => self.on_pat(pat),
            SiTable::Pmt(pmt) => self.on_pmt(pmt),
            SiTable::Sdt(sdt) => self.on_sdt(sdt),
            SiTable::Vct(vct) => self.on_vct(vct),
        }
    }

    /// Record the program list. Only the first PAT of a scan counts.
    pub fn on_pat(&mut self, pat: &PatTable) {
        if !self.accepting() || self.state.pat_done {
            return;
        }

        for entry in &pat.programs {
            self.pat.push(*entry);
        }
        if self.pat.dropped() > 0 {
            warn!(
                "PAT lists {} programs, keeping the first {}",
                pat.programs.len(),
                self.pat.capacity()
            );
        }

        self.state.pat_count = self.pat.len();
        self.state.pat_dropped = self.pat.dropped();
        self.state.pat_done = true;
        debug!("PAT done: {} programs", self.state.pat_count);
    }

    /// Record the first video and audio PID of a program announced by the PAT.
    pub fn on_pmt(&mut self, pmt: &PmtTable) {
        if !self.accepting() || !self.state.pat_done {
            return;
        }

        let program_number = pmt.program_number;
        if !self.pat.iter().any(|e| e.program_number == program_number) {
            trace!("PMT for unlisted program {}", program_number);
            return;
        }
        if self.pmt.iter().any(|e| e.program_number == program_number) {
            trace!("duplicate PMT for program {}", program_number);
            return;
        }

        let entry = ProgramEntry {
            program_number,
            video_pid: pmt.first_video_pid().unwrap_or(0),
            audio_pid: pmt.first_audio_pid().unwrap_or(0),
        };
        if !self.pmt.push(entry) {
            warn!("PMT table full, dropping program {}", program_number);
            return;
        }

        self.state.pmt_count = self.pmt.len();
        if self.state.pmt_count == self.state.pat_count {
            self.state.pmt_done = true;
            debug!("PMT done: {} programs", self.state.pmt_count);
        }
    }

    pub fn on_sdt(&mut self, sdt: &SdtTable) {
        if !self.accepting() || !self.state.pat_done {
            return;
        }

        let names = sdt.services.iter().map(|s| {
            let name = s
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| fallback_name(s.service_id));
            (s.service_id, name)
        });
        let added = Self::record_names(&self.pat, &mut self.sdt, names);

        self.state.sdt_count = self.sdt.len();
        if added > 0 && self.state.sdt_count == self.state.pat_count {
            self.state.sdt_done = true;
            debug!("SDT done: {} names", self.state.sdt_count);
        }
    }

    /// VCT names are only used by ATSC scans.
    pub fn on_vct(&mut self, vct: &VctTable) {
        if !self.accepting() || !self.state.pat_done {
            return;
        }
        if !self.atsc {
            trace!("ignoring VCT in a non-ATSC scan");
            return;
        }

        let names = vct.channels.iter().map(|c| {
            let name = if c.short_name.is_empty() {
                fallback_name(c.program_number)
            } else {
                c.short_name.clone()
            };
            (c.program_number, name)
        });
        let added = Self::record_names(&self.pat, &mut self.vct, names);

        self.state.vct_count = self.vct.len();
        if added > 0 && self.state.vct_count == self.state.pat_count {
            self.state.vct_done = true;
            debug!("VCT done: {} names", self.state.vct_count);
        }
    }

    /// Keep names of programs listed in the PAT; the first name per program wins.
    fn record_names(
        pat: &TableBuf<PatEntry>,
        buf: &mut TableBuf<NameEntry>,
        names: impl Iterator<Item = (u16, String)>,
    ) -> usize {
        let mut added = 0;
        for (program_number, display_name) in names {
            if !pat.iter().any(|e| e.program_number == program_number) {
                continue;
            }
            if buf.iter().any(|e| e.program_number == program_number) {
                continue;
            }
            if buf.push(NameEntry {
                program_number,
                display_name,
            }) {
                added += 1;
            } else {
                warn!("name table full, dropping program {}", program_number);
            }
        }
        added
    }

    fn accepting(&self) -> bool {
        self.running && self.finished.is_none()
    }

    /// Advance the clock and report the phase.
    ///
    /// `Complete` and `TimedOut` stick until the next [`start`](Self::start).
    pub fn poll(&mut self, now: Instant) -> ScanPhase {
        if let Some(phase) = self.finished {
            return phase;
        }
        if !self.running {
            return ScanPhase::Idle;
        }
        self.state.current_time = Some(now);

        // an empty PAT never completes
        if self.state.is_complete() && self.state.pat_count > 0 {
            debug!("scan complete: {} programs", self.state.pat_count);
            self.finished = Some(ScanPhase::Complete);
            return ScanPhase::Complete;
        }

        if self.elapsed() >= self.limits.timeout {
            warn!(
                "scan timed out after {:?} (PAT: {}, PMT: {}/{}, names: {})",
                self.limits.timeout,
                self.state.pat_done,
                self.state.pmt_count,
                self.state.pat_count,
                self.state.sdt_count.max(self.state.vct_count)
            );
            self.finished = Some(ScanPhase::TimedOut);
            return ScanPhase::TimedOut;
        }

        if !self.state.pat_done {
            ScanPhase::Idle
        } else if !self.state.pmt_done {
            ScanPhase::AwaitingPmt
        } else {
            ScanPhase::AwaitingNames
        }
    }

    /// End the scan now unless it already finished, as if the timeout hit.
    pub fn expire(&mut self) -> ScanPhase {
        if let Some(phase) = self.finished {
            return phase;
        }
        if self.running {
            self.finished = Some(ScanPhase::TimedOut);
            ScanPhase::TimedOut
        } else {
            ScanPhase::Idle
        }
    }

    /// Time since [`start`](Self::start), as of the last clock update.
    pub fn elapsed(&self) -> Duration {
        match (self.state.start_time, self.state.current_time) {
            (Some(start), Some(now)) => now.saturating_duration_since(start),
            _ => Duration::ZERO,
        }
    }

    fn name_for(&self, program_number: u16) -> String {
        let lookup = |buf: &TableBuf<NameEntry>| {
            buf.iter()
                .find(|e| e.program_number == program_number)
                .map(|e| e.display_name.clone())
        };

        lookup(&self.sdt)
            .or_else(|| if self.atsc { lookup(&self.vct) } else { None })
            .unwrap_or_else(|| fallback_name(program_number))
    }

    /// Build records for every program with an audio stream, in PAT order.
    ///
    /// Works on partial data as well, so a timed-out or stopped scan can
    /// still report what it found.
    pub fn emit(&self, params: &ChannelParams) -> Vec<ChannelRecord> {
        let mut records = Vec::new();
        for pat_entry in self.pat.iter() {
            let Some(program) = self
                .pmt
                .iter()
                .find(|p| p.program_number == pat_entry.program_number)
            else {
                continue;
            };
            if program.audio_pid == 0 {
                trace!("program {} has no audio, skipped", program.program_number);
                continue;
            }

            records.push(ChannelRecord {
                display_name: self.name_for(program.program_number),
                program_number: program.program_number as u32,
                video_pid: program.video_pid as u32,
                audio_pid: program.audio_pid as u32,
                params: params.clone(),
            });
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts_analyzer::stream_type;
    use crate::ts_analyzer::{PmtStream, SdtService, ServiceDescriptor, VctChannel};
    use dvbscan_conf::Key;

    fn pat(programs: &[u16]) -> PatTable {
        PatTable {
            programs: programs
                .iter()
                .map(|&n| PatEntry {
                    program_number: n,
                    pid: 0x100 + n,
                })
                .collect(),
            ..Default::default()
        }
    }

    fn pmt(program: u16, video: u16, audio: u16) -> PmtTable {
        let mut streams = Vec::new();
        if video != 0 {
            streams.push(PmtStream {
                stream_type: stream_type::MPEG2_VIDEO,
                elementary_pid: video,
                descriptors: vec![],
            });
        }
        if audio != 0 {
            streams.push(PmtStream {
                stream_type: stream_type::MPEG1_AUDIO,
                elementary_pid: audio,
                descriptors: vec![],
            });
        }
        PmtTable {
            program_number: program,
            streams,
            ..Default::default()
        }
    }

    fn sdt(services: &[(u16, &str)]) -> SdtTable {
        SdtTable {
            services: services
                .iter()
                .map(|&(id, name)| SdtService {
                    service_id: id,
                    running_status: 4,
                    free_ca_mode: false,
                    service_descriptor: Some(ServiceDescriptor {
                        service_type: 1,
                        provider_name: String::new(),
                        service_name: name.to_string(),
                    }),
                })
                .collect(),
            ..Default::default()
        }
    }

    fn vct(channels: &[(u16, &str)]) -> VctTable {
        VctTable {
            channels: channels
                .iter()
                .map(|&(program, name)| VctChannel {
                    short_name: name.to_string(),
                    program_number: program,
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    fn params() -> ChannelParams {
        let mut p = ChannelParams::new();
        p.set_int(Key::DeliverySystem, 3);
        p.set_int(Key::Frequency, 490_000_000);
        p
    }

    fn started(atsc: bool) -> (ScanSession, Instant) {
        let t0 = Instant::now();
        let mut session = ScanSession::new(ScanLimits::default(), atsc);
        session.start(t0);
        (session, t0)
    }

    #[test]
    fn test_table_buf_capacity() {
        let mut buf = TableBuf::new(2);
        assert!(buf.push(1));
        assert!(buf.push(2));
        assert!(!buf.push(3));
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.dropped(), 1);
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.dropped(), 0);
    }

    #[test]
    fn test_phases_to_complete() {
        let (mut s, t0) = started(false);
        assert_eq!(s.poll(t0), ScanPhase::Idle);

        s.on_pat(&pat(&[1, 2, 3]));
        assert_eq!(s.poll(t0), ScanPhase::AwaitingPmt);

        s.on_pmt(&pmt(1, 101, 102));
        s.on_pmt(&pmt(2, 201, 202));
        s.on_pmt(&pmt(3, 301, 302));
        assert!(s.state().pmt_done);
        assert_eq!(s.poll(t0), ScanPhase::AwaitingNames);

        s.on_sdt(&sdt(&[(1, "One"), (2, "Two"), (3, "Three")]));
        assert_eq!(s.poll(t0 + Duration::from_secs(1)), ScanPhase::Complete);

        let records = s.emit(&params());
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].display_name, "Two");
        assert_eq!(records[1].program_number, 2);
        assert_eq!(records[1].video_pid, 201);
        assert_eq!(records[1].audio_pid, 202);
        assert_eq!(records[1].params.get_int(Key::Frequency), Some(490_000_000));
    }

    #[test]
    fn test_capacity_boundary() {
        let (mut s, _) = started(false);
        let programs: Vec<u16> = (1..=200).collect();
        s.on_pat(&pat(&programs));
        assert_eq!(s.state().pat_count, MAX_PROGRAMS);
        assert_eq!(s.state().pat_dropped, 200 - MAX_PROGRAMS);
        assert_eq!(s.pat.dropped(), 72);
        assert!(s.state().pat_done);

        // programs past the cap are not tracked
        s.on_pmt(&pmt(150, 0, 1));
        assert_eq!(s.state().pmt_count, 0);
    }

    #[test]
    fn test_custom_capacity() {
        let limits = ScanLimits {
            max_programs: 2,
            ..Default::default()
        };
        let mut s = ScanSession::new(limits, false);
        s.start(Instant::now());
        s.on_pat(&pat(&[1, 2, 3]));
        assert_eq!(s.state().pat_count, 2);
        assert_eq!(s.state().pat_dropped, 1);
    }

    #[test]
    fn test_timeout_emits_partial() {
        let (mut s, t0) = started(false);
        s.on_pat(&pat(&[1, 2, 3]));
        s.on_pmt(&pmt(1, 101, 102));
        s.on_pmt(&pmt(2, 201, 202));

        assert_eq!(s.poll(t0 + Duration::from_secs(10)), ScanPhase::AwaitingPmt);
        assert_eq!(s.poll(t0 + Duration::from_secs(11)), ScanPhase::TimedOut);

        // late tables do not change a finished scan
        s.on_pmt(&pmt(3, 301, 302));
        assert_eq!(s.state().pmt_count, 2);

        let records = s.emit(&params());
        let numbers: Vec<u32> = records.iter().map(|r| r.program_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(records[0].display_name, "Program-1");
    }

    #[test]
    fn test_missing_audio_is_excluded() {
        let (mut s, t0) = started(false);
        s.on_pat(&pat(&[1, 2]));
        s.on_pmt(&pmt(1, 101, 0));
        s.on_pmt(&pmt(2, 201, 202));
        s.on_sdt(&sdt(&[(1, "Data"), (2, "TV")]));
        assert_eq!(s.poll(t0), ScanPhase::Complete);

        let records = s.emit(&params());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].display_name, "TV");
    }

    #[test]
    fn test_empty_pat_times_out_empty() {
        let (mut s, t0) = started(false);
        s.on_pat(&pat(&[]));
        s.on_sdt(&sdt(&[]));
        assert_eq!(s.poll(t0 + Duration::from_secs(5)), ScanPhase::AwaitingPmt);
        assert_eq!(s.poll(t0 + Duration::from_secs(12)), ScanPhase::TimedOut);
        assert!(s.emit(&params()).is_empty());
    }

    #[test]
    fn test_first_pat_and_pmt_win() {
        let (mut s, _) = started(false);
        s.on_pat(&pat(&[1]));
        s.on_pat(&pat(&[7, 8]));
        assert_eq!(s.state().pat_count, 1);

        s.on_pmt(&pmt(1, 101, 102));
        s.on_pmt(&pmt(1, 111, 112));
        let records = s.emit(&params());
        assert_eq!(records[0].audio_pid, 102);
    }

    #[test]
    fn test_tables_before_pat_are_ignored() {
        let (mut s, _) = started(false);
        s.on_pmt(&pmt(1, 101, 102));
        s.on_sdt(&sdt(&[(1, "One")]));
        s.on_pat(&pat(&[1]));
        assert_eq!(s.state().pmt_count, 0);
        assert_eq!(s.state().sdt_count, 0);
    }

    #[test]
    fn test_name_matching_under_reordering() {
        // names are matched by program number, whatever order sections arrive in
        let orders: [&[&[(u16, &str)]]; 2] = [
            &[&[(1, "One"), (2, "Two")], &[(3, "Three")]],
            &[&[(3, "Three")], &[(2, "Two"), (1, "One")]],
        ];
        for sections in orders {
            let (mut s, t0) = started(false);
            s.on_sdt(&sdt(&[(1, "Early")]));
            s.on_pat(&pat(&[3, 1, 2]));
            for section in sections {
                s.on_sdt(&sdt(section));
            }
            for n in [2, 3, 1] {
                s.on_pmt(&pmt(n, 0, 0x100 + n));
            }
            assert_eq!(s.poll(t0), ScanPhase::Complete);

            let names: Vec<String> = s.emit(&params()).into_iter().map(|r| r.display_name).collect();
            assert_eq!(names, vec!["Three", "One", "Two"]);
        }
    }

    #[test]
    fn test_first_name_wins() {
        let (mut s, _) = started(false);
        s.on_pat(&pat(&[1]));
        s.on_pmt(&pmt(1, 0, 5));
        s.on_sdt(&sdt(&[(1, "First"), (1, "Second")]));
        s.on_sdt(&sdt(&[(1, "Third")]));
        assert_eq!(s.emit(&params())[0].display_name, "First");
        assert_eq!(s.state().sdt_count, 1);
    }

    #[test]
    fn test_unnamed_service_gets_fallback() {
        let (mut s, t0) = started(false);
        s.on_pat(&pat(&[9]));
        s.on_pmt(&pmt(9, 0, 5));
        s.on_sdt(&sdt(&[(9, "")]));
        assert_eq!(s.poll(t0), ScanPhase::Complete);
        assert_eq!(s.emit(&params())[0].display_name, "Program-9");
    }

    #[test]
    fn test_vct_only_for_atsc() {
        let (mut s, t0) = started(false);
        s.on_pat(&pat(&[3]));
        s.on_pmt(&pmt(3, 0x31, 0x34));
        s.on_vct(&vct(&[(3, "KABC")]));
        assert_eq!(s.poll(t0), ScanPhase::AwaitingNames);
        assert_eq!(s.emit(&params())[0].display_name, "Program-3");

        let (mut s, t0) = started(true);
        s.on_pat(&pat(&[3]));
        s.on_pmt(&pmt(3, 0x31, 0x34));
        s.on_vct(&vct(&[(3, "KABC")]));
        assert_eq!(s.poll(t0), ScanPhase::Complete);
        assert_eq!(s.emit(&params())[0].display_name, "KABC");
    }

    #[test]
    fn test_sdt_preferred_over_vct() {
        let (mut s, _) = started(true);
        s.on_pat(&pat(&[3]));
        s.on_pmt(&pmt(3, 0x31, 0x34));
        s.on_vct(&vct(&[(3, "FromVct")]));
        s.on_sdt(&sdt(&[(3, "FromSdt")]));
        assert_eq!(s.emit(&params())[0].display_name, "FromSdt");
    }

    #[test]
    fn test_restart_clears_previous_tables() {
        let (mut s, t0) = started(false);
        s.on_pat(&pat(&[1]));
        s.on_pmt(&pmt(1, 101, 102));
        s.on_sdt(&sdt(&[(1, "Old")]));
        assert_eq!(s.poll(t0), ScanPhase::Complete);

        let t1 = t0 + Duration::from_secs(20);
        s.start(t1);
        assert_eq!(s.poll(t1), ScanPhase::Idle);
        assert_eq!(*s.state(), ScanState {
            start_time: Some(t1),
            current_time: Some(t1),
            ..Default::default()
        });
        assert!(s.emit(&params()).is_empty());

        s.on_pat(&pat(&[1]));
        s.on_pmt(&pmt(1, 101, 102));
        assert_eq!(s.emit(&params())[0].display_name, "Program-1");
    }

    #[test]
    fn test_cancel_resets_to_idle() {
        let (mut s, t0) = started(false);
        s.on_pat(&pat(&[1]));
        s.on_pmt(&pmt(1, 101, 102));
        s.cancel();

        assert!(!s.is_running());
        assert_eq!(s.poll(t0), ScanPhase::Idle);
        assert!(s.emit(&params()).is_empty());

        // tables are not accepted until the next start
        s.on_pat(&pat(&[1]));
        assert!(!s.state().pat_done);
    }

    #[test]
    fn test_expire() {
        let (mut s, t0) = started(false);
        s.on_pat(&pat(&[1]));
        assert_eq!(s.expire(), ScanPhase::TimedOut);
        assert_eq!(s.poll(t0), ScanPhase::TimedOut);

        let (mut s, t0) = started(false);
        s.on_pat(&pat(&[1]));
        s.on_pmt(&pmt(1, 0, 2));
        s.on_sdt(&sdt(&[(1, "A")]));
        assert_eq!(s.poll(t0), ScanPhase::Complete);
        assert_eq!(s.expire(), ScanPhase::Complete);
    }

    #[test]
    fn test_on_table_dispatch() {
        let (mut s, t0) = started(false);
        let t1 = t0 + Duration::from_millis(250);
        s.on_table(&SiTable::Pat(pat(&[1])), t1);
        s.on_table(&SiTable::Pmt(pmt(1, 0, 2)), t1);
        assert_eq!(s.elapsed(), Duration::from_millis(250));
        assert_eq!(s.poll(t1), ScanPhase::AwaitingNames);
    }
}
