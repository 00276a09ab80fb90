//! Audio output: the port the player drives and its rodio implementation.
//!
//! - `types`: `AudioOutput` trait, `AudioSource`, `AudioEvent`
//! - `bridge`: `AudioBridge`, which keeps an output in step with `PlayerState`
//! - `output` / `thread` / `sink`: the rodio-backed output running on its own thread

mod bridge;
mod error;
mod output;
mod sink;
mod thread;
mod types;

pub use bridge::AudioBridge;
pub use error::AudioError;
pub use output::RodioOutput;
pub use types::{AudioEvent, AudioOutput, AudioSource};

#[cfg(test)]
mod tests;
