//! Channel list files in the internal line dialect.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::Local;
use log::{debug, warn};

use crate::line::{parse_channel_line, serialize_channel};
use crate::params::ChannelRecord;

/// Parse the contents of a channel list.
///
/// Comment and blank lines are skipped silently.
pub fn parse_channel_list(text: &str) -> Vec<ChannelRecord> {
    let mut records = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        match parse_channel_line(line) {
            Ok(record) => records.push(record),
            Err(e) if e.is_skippable() => {}
            Err(e) => warn!("line {}: {}", lineno + 1, e),
        }
    }
    records
}

/// Read a channel list from disk.
pub fn read_channel_file(path: &Path) -> io::Result<Vec<ChannelRecord>> {
    let text = fs::read_to_string(path)?;
    let records = parse_channel_list(&text);
    debug!("Read {} channels from {}", records.len(), path.display());
    Ok(records)
}

/// Write channel records, one line each.
///
/// A header comment is written when the file is created or truncated.
pub fn write_channel_file(path: &Path, records: &[ChannelRecord], append: bool) -> io::Result<()> {
    let exists = path.exists();
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;

    if !append || !exists {
        writeln!(
            file,
            "# dvbscan channel list, generated {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(file, "# Name:program-number=N:video-pid=N:audio-pid=N:delsys=N:...")?;
    }

    for record in records {
        writeln!(file, "{}", serialize_channel(record))?;
    }
    file.flush()?;

    debug!("Wrote {} channels to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Key;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("dvbscan-conf-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_parse_channel_list_skips_comments() {
        let text = "# header\n\nOne:program-number=1:audio-pid=2\n#Two:program-number=2\nThree:frequency=5\n";
        let records = parse_channel_list(text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].display_name, "One");
        assert_eq!(records[1].params.get_int(Key::Frequency), Some(5));
    }

    #[test]
    fn test_write_then_read() {
        let path = temp_path("write.conf");
        let mut record = ChannelRecord::new("Channel 5");
        record.program_number = 7;
        record.audio_pid = 0x101;
        record.params.set_int(Key::DeliverySystem, 11);
        record.params.set_int(Key::Frequency, 177_000_000);
        record.params.set_int(Key::Modulation, 7);

        write_channel_file(&path, &[record.clone()], false).unwrap();
        write_channel_file(&path, &[record.clone()], true).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with('#')).count(), 2);

        let records = read_channel_file(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], record);

        let _ = fs::remove_file(&path);
    }
}
