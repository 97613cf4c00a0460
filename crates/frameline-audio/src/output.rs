//! Audio device output: drain the ring buffer, zero-fill the shortfall.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use tracing::{error, info};

use crate::error::AudioError;
use crate::ring_buffer::AudioRingBuffer;

/// The ring buffer as shared between producer and consumer: one mutex
/// serializes every access, per the buffer's concurrency contract.
pub type SharedRingBuffer = Arc<Mutex<AudioRingBuffer>>;

/// Device callback body: fill `out` from the ring buffer, substituting
/// silence for any shortfall. Underrun is not an error.
pub fn fill_from_ring(ring: &Mutex<AudioRingBuffer>, out: &mut [f32]) {
    let read = ring.lock().read(out);
    for sample in &mut out[read..] {
        *sample = 0.0;
    }
}

/// A cpal output stream draining a shared ring buffer.
///
/// The stream plays for the lifetime of this handle; dropping it closes
/// the device.
pub struct AudioOutput {
    _stream: cpal::Stream,
    sample_rate: u32,
    channels: u16,
}

impl AudioOutput {
    /// Open the default output device and start draining `ring`.
    pub fn new(ring: SharedRingBuffer) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;
        let config = device
            .default_output_config()
            .map_err(|e| AudioError::Device(e.to_string()))?;
        let sample_rate = config.sample_rate().0;
        let channels = config.channels();
        info!(sample_rate, channels, "opening audio output");

        let stream = device
            .build_output_stream(
                &config.config(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    fill_from_ring(&ring, data);
                },
                |err| error!("audio output stream error: {err}"),
                None,
            )
            .map_err(|e| AudioError::Stream(e.to_string()))?;
        stream
            .play()
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            sample_rate,
            channels,
        })
    }

    /// Device sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Device channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }
}
