//! Error types for audio output.

use thiserror::Error;

/// Errors from opening the audio output device.
///
/// Buffer underruns and overruns are not errors anywhere in this crate;
/// they are partial-transfer return values.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("no default audio output device")]
    NoOutputDevice,

    #[error("audio device error: {0}")]
    Device(String),

    #[error("audio stream error: {0}")]
    Stream(String),
}
