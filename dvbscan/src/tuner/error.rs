use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot open {path}: {source}")]
    DeviceUnavailable {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("tuning failed: {0}")]
    Tune(String),

    #[error("{0}")]
    Unsupported(&'static str),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl SourceError {
    pub fn device(path: impl Into<String>, source: io::Error) -> Self {
        SourceError::DeviceUnavailable {
            path: path.into(),
            source,
        }
    }
}
