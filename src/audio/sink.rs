//! Utilities for creating `rodio` sinks from `AudioSource` values.
//!
//! The helper here encapsulates opening/decoding a file and preparing a
//! paused `Sink` at the requested start position.

use std::fs::File;
use std::io::BufReader;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};

use super::error::AudioError;
use super::types::AudioSource;

/// Create a paused `Sink` for `source` that starts playback at `start_at`.
///
/// Also returns the decoder's duration estimate, when it has one.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    source: &AudioSource,
    start_at: Duration,
) -> Result<(Sink, Option<Duration>), AudioError> {
    let file = File::open(&source.path).map_err(|e| AudioError::Open {
        path: source.path.clone(),
        source: e,
    })?;

    let decoder = Decoder::new(BufReader::new(file)).map_err(|e| AudioError::Decode {
        path: source.path.clone(),
        source: e,
    })?;
    let estimated = decoder.total_duration();

    let sink = Sink::connect_new(stream.mixer());
    // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
    sink.append(decoder.skip_duration(start_at));
    sink.pause();
    Ok((sink, estimated))
}
