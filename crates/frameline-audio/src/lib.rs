//! Frameline Audio - Sample buffering between render and output
//!
//! Architecture:
//! - `AudioRingBuffer`: bounded sample queue between the render pipeline
//!   (producer) and the audio device callback (consumer). The buffer does
//!   no locking itself; both sides share it behind a single mutex.
//! - `output`: the device callback body (drain + zero-fill) and a cpal
//!   output stream wrapper around it.

pub mod error;
pub mod output;
pub mod ring_buffer;

pub use error::AudioError;
pub use output::{fill_from_ring, AudioOutput, SharedRingBuffer};
pub use ring_buffer::AudioRingBuffer;
