//! Integration tests for the audio sample path.

use std::sync::Arc;

use frameline_audio::{fill_from_ring, AudioRingBuffer};
use parking_lot::Mutex;

#[test]
fn producer_and_consumer_preserve_sample_order() {
    let ring = Arc::new(Mutex::new(AudioRingBuffer::new(256)));
    let total = 10_000usize;

    let producer = {
        let ring = Arc::clone(&ring);
        std::thread::spawn(move || {
            let mut next = 0usize;
            while next < total {
                let block: Vec<f32> = (next..(next + 64).min(total)).map(|i| i as f32).collect();
                let written = ring.lock().write(&block);
                next += written;
                if written < block.len() {
                    std::thread::sleep(std::time::Duration::from_micros(100));
                }
            }
        })
    };

    let mut received = Vec::with_capacity(total);
    let mut out = [0.0f32; 64];
    while received.len() < total {
        let read = ring.lock().read(&mut out);
        received.extend_from_slice(&out[..read]);
        if read == 0 {
            std::thread::sleep(std::time::Duration::from_micros(100));
        }
    }
    producer.join().unwrap();

    // Backpressure clipped writes, but never reordered or dropped data.
    for (i, sample) in received.iter().enumerate() {
        assert_eq!(*sample, i as f32);
    }
}

#[test]
fn device_callback_substitutes_silence_for_underrun() {
    let ring = Arc::new(Mutex::new(AudioRingBuffer::new(1024)));
    ring.lock().write(&[0.1, 0.2, 0.3, 0.4]);

    let mut out = [7.0f32; 16];
    fill_from_ring(&ring, &mut out);

    assert_eq!(&out[..4], &[0.1, 0.2, 0.3, 0.4]);
    assert!(out[4..].iter().all(|&s| s == 0.0));
}

#[test]
fn stall_resync_discards_only_the_stale_tail() {
    let ring = Arc::new(Mutex::new(AudioRingBuffer::new(1024)));
    let samples_per_frame = 100;

    // Five frames of audio buffered, then the scheduler skips two frames.
    let data: Vec<f32> = (0..5 * samples_per_frame).map(|i| i as f32).collect();
    ring.lock().write(&data);
    let dropped = ring.lock().offset_write(2 * samples_per_frame);
    assert_eq!(dropped, 2 * samples_per_frame);

    let mut out = vec![0.0f32; 5 * samples_per_frame];
    let read = ring.lock().read(&mut out);
    assert_eq!(read, 3 * samples_per_frame);
    assert_eq!(out[read - 1], (3 * samples_per_frame - 1) as f32);
}
