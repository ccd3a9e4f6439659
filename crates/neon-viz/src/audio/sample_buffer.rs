//! Mono sample history shared between the audio callback and analysis.

use std::sync::{Arc, Mutex};

use neon_viz_core::SourceError;

pub type SharedBuffer = Arc<Mutex<SampleBuffer>>;

/// Fixed-size ring of the most recent mono samples.
pub struct SampleBuffer {
    samples: Vec<f32>,
    write_pos: usize,
    /// Total samples ever written; lets readers detect fresh data
    written: u64,
    sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(capacity: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![0.0; capacity.max(1)],
            write_pos: 0,
            written: 0,
            sample_rate,
        }
    }

    pub fn shared(capacity: usize, sample_rate: u32) -> SharedBuffer {
        Arc::new(Mutex::new(Self::new(capacity, sample_rate)))
    }

    /// Append interleaved samples, averaging `channels` into one.
    pub fn push_interleaved(&mut self, data: &[f32], channels: usize) {
        let channels = channels.max(1);
        for chunk in data.chunks(channels) {
            let sample = chunk.iter().sum::<f32>() / chunk.len() as f32;
            self.push(sample);
        }
    }

    pub fn push(&mut self, sample: f32) {
        self.samples[self.write_pos] = if sample.is_finite() { sample } else { 0.0 };
        self.write_pos = (self.write_pos + 1) % self.samples.len();
        self.written += 1;
    }

    /// Copy the newest `out.len()` samples, oldest first. Zero-pads when
    /// `out` is longer than the buffer.
    pub fn copy_latest(&self, out: &mut [f32]) {
        let len = self.samples.len();
        let n = out.len().min(len);
        let pad = out.len() - n;
        out[..pad].fill(0.0);

        let start = (self.write_pos + len - n) % len;
        let first = (len - start).min(n);
        out[pad..pad + first].copy_from_slice(&self.samples[start..start + first]);
        out[pad + first..].copy_from_slice(&self.samples[..n - first]);
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
    }

    pub fn clear(&mut self) {
        self.samples.fill(0.0);
        self.write_pos = 0;
    }
}

/// Lock the shared buffer, mapping poison to a source error.
pub fn lock(buffer: &SharedBuffer) -> Result<std::sync::MutexGuard<'_, SampleBuffer>, SourceError> {
    buffer.lock().map_err(|_| SourceError::Poisoned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_latest_in_order() {
        let mut buf = SampleBuffer::new(4, 44100);
        for s in [1.0, 2.0, 3.0, 4.0, 5.0, 6.0] {
            buf.push(s);
        }
        let mut out = [0.0; 3];
        buf.copy_latest(&mut out);
        assert_eq!(out, [4.0, 5.0, 6.0]);

        let mut all = [0.0; 4];
        buf.copy_latest(&mut all);
        assert_eq!(all, [3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_copy_latest_pads() {
        let mut buf = SampleBuffer::new(2, 44100);
        buf.push(0.5);
        buf.push(0.25);
        let mut out = [9.0; 4];
        buf.copy_latest(&mut out);
        assert_eq!(out, [0.0, 0.0, 0.5, 0.25]);
    }

    #[test]
    fn test_downmix_and_counter() {
        let mut buf = SampleBuffer::new(8, 48000);
        buf.push_interleaved(&[1.0, 0.0, 0.5, 0.5, f32::NAN, 1.0], 2);
        assert_eq!(buf.written(), 3);
        let mut out = [0.0; 3];
        buf.copy_latest(&mut out);
        assert_eq!(out[0], 0.5);
        assert_eq!(out[1], 0.5);
        assert_eq!(out[2], 0.0);
    }
}
