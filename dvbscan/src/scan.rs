//! Scan orchestration: tune, collect tables until complete or timed out,
//! emit channel records.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dvbscan_conf::{ChannelParams, ChannelRecord, Dvbv5Section, Key};
use log::{debug, info, warn};
use thiserror::Error;

use crate::aggregator::{ScanLimits, ScanPhase, ScanSession};
use crate::tuner::{SourceError, TableSource};

/// Default polling interval.
pub const DEFAULT_TICK: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    pub tick: Duration,
    pub limits: ScanLimits,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            limits: ScanLimits::default(),
        }
    }
}

/// Shared stop request, safe to trigger from a signal handler thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// What a stopped scan does with the tables collected so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopMode {
    #[default]
    Discard,
    Emit,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("device unavailable: {0}")]
    DeviceUnavailable(#[source] SourceError),

    #[error("scan cancelled")]
    Cancelled,

    #[error(transparent)]
    Source(SourceError),
}

impl From<SourceError> for ScanError {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::DeviceUnavailable { .. } | SourceError::Unsupported(_) => {
                ScanError::DeviceUnavailable(e)
            }
            other => ScanError::Source(other),
        }
    }
}

/// Result of scanning one frequency.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub records: Vec<ChannelRecord>,
    /// `Complete` or `TimedOut`, or the phase reached when stopped.
    pub phase: ScanPhase,
    pub elapsed: Duration,
    pub stopped: bool,
}

/// Summary of a batch scan.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub records: Vec<ChannelRecord>,
    /// Transponders attempted.
    pub scanned: usize,
    /// Transponders that failed to tune or timed out.
    pub failures: usize,
    pub cancelled: bool,
}

/// Progress of a batch, reported before each transponder.
#[derive(Debug, Clone, Copy)]
pub struct BatchProgress<'a> {
    pub index: usize,
    pub total: usize,
    pub name: &'a str,
    pub found: usize,
}

/// Drives a [`TableSource`] through one or many frequencies.
pub struct Scanner<S: TableSource> {
    source: S,
    config: ScanConfig,
    session: ScanSession,
    cancel: CancelToken,
    stop_mode: StopMode,
}

impl<S: TableSource> Scanner<S> {
    pub fn new(source: S, config: ScanConfig) -> Self {
        Self {
            source,
            session: ScanSession::new(config.limits, false),
            config,
            cancel: CancelToken::new(),
            stop_mode: StopMode::default(),
        }
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_stop_mode(mut self, mode: StopMode) -> Self {
        self.stop_mode = mode;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Tune once and collect until complete, timed out or stopped.
    pub fn scan_manual(&mut self, params: &ChannelParams) -> Result<ScanOutcome, ScanError> {
        if self.cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let atsc = params
            .delivery_system()
            .map_or(false, |system| system.uses_vct());
        self.session.set_atsc(atsc);
        self.source.tune(params)?;

        let started = Instant::now();
        self.session.start(started);

        let phase = loop {
            if self.cancel.is_cancelled() {
                return self.stop(params, started);
            }

            let tables = match self.source.poll_tables(self.config.tick) {
                Ok(tables) => tables,
                Err(e) => {
                    self.session.cancel();
                    return Err(e.into());
                }
            };
            let now = Instant::now();
            for table in &tables {
                self.session.on_table(table, now);
            }

            let phase = self.session.poll(now);
            if phase.is_finished() {
                break phase;
            }
            if tables.is_empty() && self.source.exhausted() {
                debug!("source exhausted in phase {:?}", phase);
                break self.session.expire();
            }
        };

        let records = self.session.emit(params);
        let elapsed = started.elapsed();
        self.session.cancel();
        Ok(ScanOutcome {
            records,
            phase,
            elapsed,
            stopped: false,
        })
    }

    fn stop(&mut self, params: &ChannelParams, started: Instant) -> Result<ScanOutcome, ScanError> {
        let phase = self.session.poll(Instant::now());
        match self.stop_mode {
            StopMode::Discard => {
                info!("scan stopped, discarding partial tables");
                self.session.cancel();
                Err(ScanError::Cancelled)
            }
            StopMode::Emit => {
                let records = self.session.emit(params);
                info!("scan stopped, keeping {} channels", records.len());
                self.session.cancel();
                Ok(ScanOutcome {
                    records,
                    phase,
                    elapsed: started.elapsed(),
                    stopped: true,
                })
            }
        }
    }

    /// Scan every transponder of an initial-scan file.
    ///
    /// Tuning failures and timeouts are counted and skipped. An unavailable
    /// device aborts the batch.
    pub fn scan_batch<F>(
        &mut self,
        sections: &[Dvbv5Section],
        mut progress: F,
    ) -> Result<BatchReport, ScanError>
    where
        F: FnMut(&BatchProgress),
    {
        let mut report = BatchReport::default();
        let total = sections.len();

        for (index, section) in sections.iter().enumerate() {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            progress(&BatchProgress {
                index,
                total,
                name: &section.name,
                found: report.records.len(),
            });

            let params = section.to_params();
            report.scanned += 1;
            if params.delivery_system().is_none() || !params.contains(Key::Frequency) {
                warn!("[{}]: no delivery system or frequency, skipped", section.name);
                report.failures += 1;
                continue;
            }

            match self.scan_manual(&params) {
                Ok(outcome) => {
                    info!(
                        "[{}]: {} channels ({:?}, {:.1}s)",
                        section.name,
                        outcome.records.len(),
                        outcome.phase,
                        outcome.elapsed.as_secs_f32()
                    );
                    if outcome.phase == ScanPhase::TimedOut {
                        report.failures += 1;
                    }
                    report.records.extend(outcome.records);
                    if outcome.stopped {
                        report.cancelled = true;
                        break;
                    }
                }
                Err(ScanError::Cancelled) => {
                    report.cancelled = true;
                    break;
                }
                Err(e @ ScanError::DeviceUnavailable(_)) => return Err(e),
                Err(e) => {
                    warn!("[{}]: {}", section.name, e);
                    report.failures += 1;
                }
            }
        }

        Ok(report)
    }
}
