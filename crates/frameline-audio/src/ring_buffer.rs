//! Bounded circular sample buffer for the playback audio path.
//!
//! One producer (the render pipeline) and one consumer (the audio device
//! callback) share this buffer behind a single external mutex; the buffer
//! itself performs no synchronization. Transfers beyond the available
//! space or data are clipped, never errors: the return value reports the
//! actual count, and a short write is ordinary backpressure.

/// Fixed-capacity circular buffer of interleaved f32 samples.
#[derive(Debug)]
pub struct AudioRingBuffer {
    buffer: Box<[f32]>,
    write_pos: usize,
    read_pos: usize,
    free_count: usize,
}

impl AudioRingBuffer {
    /// Create a buffer holding `capacity` samples. Capacity is fixed for
    /// the buffer's lifetime and must be at least 1.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "ring buffer capacity must be at least 1");
        Self {
            buffer: vec![0.0f32; capacity].into_boxed_slice(),
            write_pos: 0,
            read_pos: 0,
            free_count: capacity,
        }
    }

    /// Total sample capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Samples currently buffered and readable.
    #[inline]
    pub fn buffered(&self) -> usize {
        self.buffer.len() - self.free_count
    }

    /// Samples that can be written before the buffer is full.
    #[inline]
    pub fn free(&self) -> usize {
        self.free_count
    }

    /// Copy samples in. Returns the count actually written, clipped to the
    /// free space. Performed as at most two contiguous copies.
    pub fn write(&mut self, src: &[f32]) -> usize {
        let count = src.len().min(self.free_count);
        if count == 0 {
            return 0;
        }

        let capacity = self.buffer.len();
        let first = (capacity - self.write_pos).min(count);
        self.buffer[self.write_pos..self.write_pos + first].copy_from_slice(&src[..first]);
        let second = count - first;
        if second > 0 {
            self.buffer[..second].copy_from_slice(&src[first..count]);
        }

        self.write_pos = (self.write_pos + count) % capacity;
        self.free_count -= count;
        count
    }

    /// Copy samples out. Returns the count actually read, clipped to the
    /// buffered amount.
    pub fn read(&mut self, dst: &mut [f32]) -> usize {
        let count = dst.len().min(self.buffered());
        if count == 0 {
            return 0;
        }

        let capacity = self.buffer.len();
        let first = (capacity - self.read_pos).min(count);
        dst[..first].copy_from_slice(&self.buffer[self.read_pos..self.read_pos + first]);
        let second = count - first;
        if second > 0 {
            dst[first..count].copy_from_slice(&self.buffer[..second]);
        }

        self.read_pos = (self.read_pos + count) % capacity;
        self.free_count += count;
        count
    }

    /// Discard up to `count` of the most recently written unread samples,
    /// rewinding the write cursor. Returns the count actually discarded.
    ///
    /// Used to resynchronize after a stall or seek: stale samples that
    /// would otherwise play late are dropped rather than drained.
    pub fn offset_write(&mut self, count: usize) -> usize {
        let dropped = count.min(self.buffered());
        if dropped == 0 {
            return 0;
        }
        let capacity = self.buffer.len();
        self.write_pos = (self.write_pos + capacity - dropped) % capacity;
        self.free_count += dropped;
        dropped
    }

    /// Drop all buffered samples.
    pub fn clear(&mut self) {
        self.read_pos = self.write_pos;
        self.free_count = self.buffer.len();
    }
}
