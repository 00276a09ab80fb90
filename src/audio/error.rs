use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("no audio output device: {0}")]
    Device(String),

    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: rodio::decoder::DecoderError,
    },

    #[error("audio thread exited during startup")]
    ThreadGone,
}
