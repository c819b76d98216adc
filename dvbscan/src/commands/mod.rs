//! Subcommand handlers. Each returns the process exit code.

mod convert;
mod info;
mod scan;
mod show;

pub(crate) use convert::cmd_convert;
pub(crate) use info::cmd_info;
pub(crate) use scan::{cmd_scan, ScanArgs};
pub(crate) use show::cmd_show;

use dvbscan::ConfigFile;

/// Adapter and frontend from the command line, then the config file.
pub(crate) fn tuner_ids(adapter: Option<u32>, frontend: Option<u32>, config: &ConfigFile) -> (u32, u32) {
    (
        adapter.or(config.tuner.adapter).unwrap_or(0),
        frontend.or(config.tuner.frontend).unwrap_or(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let mut config = ConfigFile::default();
        assert_eq!(tuner_ids(None, None, &config), (0, 0));

        config.tuner.adapter = Some(2);
        config.tuner.frontend = Some(1);
        assert_eq!(tuner_ids(None, None, &config), (2, 1));
        assert_eq!(tuner_ids(Some(0), None, &config), (0, 1));
    }
}
