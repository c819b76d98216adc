use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Duration;

use dvbscan_conf::ChannelParams;
use log::{debug, info};

use super::{SourceError, TableSource};
use crate::ts_analyzer::{SiTable, TsAnalyzer, TS_PACKET_SIZE};

/// Packets read per poll.
const PACKETS_PER_POLL: usize = 512;

/// Replays a recorded transport stream.
///
/// Tuning is a no-op that rewinds to the start, so every scan sees the
/// whole recording.
pub struct TsFileSource<R = BufReader<File>> {
    reader: R,
    analyzer: TsAnalyzer,
    buf: Vec<u8>,
    eof: bool,
}

impl TsFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)
            .map_err(|e| SourceError::device(path.display().to_string(), e))?;
        info!("Replaying {}", path.display());
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: Read + Seek> TsFileSource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            analyzer: TsAnalyzer::new(),
            buf: vec![0u8; TS_PACKET_SIZE * PACKETS_PER_POLL],
            eof: false,
        }
    }

    fn read_chunk(&mut self) -> io::Result<usize> {
        loop {
            match self.reader.read(&mut self.buf) {
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }
}

impl<R: Read + Seek> TableSource for TsFileSource<R> {
    fn tune(&mut self, params: &ChannelParams) -> Result<(), SourceError> {
        debug!("file source ignores tuning to {:?}", params.delivery_system());
        self.reader.seek(SeekFrom::Start(0))?;
        self.analyzer.reset();
        self.eof = false;
        Ok(())
    }

    fn poll_tables(&mut self, _wait: Duration) -> Result<Vec<SiTable>, SourceError> {
        if self.eof {
            return Ok(Vec::new());
        }
        let n = self.read_chunk()?;
        if n == 0 {
            debug!(
                "end of recording after {} packets",
                self.analyzer.packets_processed()
            );
            self.eof = true;
            return Ok(Vec::new());
        }
        Ok(self.analyzer.feed(&self.buf[..n]))
    }

    fn exhausted(&self) -> bool {
        self.eof
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts_analyzer::fixtures::{packetize, pat_section};
    use std::io::Cursor;

    #[test]
    fn test_replay_and_rewind() {
        let mut cc = 0;
        let ts = packetize(0x0000, &mut cc, &pat_section(9, &[(1, 0x100)]));
        let mut source = TsFileSource::from_reader(Cursor::new(ts));
        let params = ChannelParams::new();

        source.tune(&params).unwrap();
        let tables = source.poll_tables(Duration::ZERO).unwrap();
        assert_eq!(tables.len(), 1);
        assert!(!source.exhausted());
        assert!(source.poll_tables(Duration::ZERO).unwrap().is_empty());
        assert!(source.exhausted());

        // a new tuning replays from the start
        source.tune(&params).unwrap();
        assert!(!source.exhausted());
        assert_eq!(source.poll_tables(Duration::ZERO).unwrap().len(), 1);
    }

    #[test]
    fn test_open_missing_file() {
        let err = TsFileSource::open(Path::new("/nonexistent/dvbscan.ts")).err().unwrap();
        assert!(matches!(err, SourceError::DeviceUnavailable { .. }));
    }
}
