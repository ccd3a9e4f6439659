//! FFT front end that turns raw samples into [`SpectralFrame`]s.
//!
//! Behaves like a browser analyser node: Blackman window, magnitudes
//! normalised by the FFT size, per-bin temporal smoothing, decibel output.

use std::f32::consts::PI;
use std::sync::Arc;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use tracing::debug;

use neon_viz_core::frame::SILENCE_DB;
use neon_viz_core::{AudioSource, FrameFormat, SourceError, SpectralFrame};

use super::sample_buffer::{lock, SharedBuffer};

/// Transform size; yields FFT_SIZE / 2 bins
pub const FFT_SIZE: usize = 2048;

/// Per-bin smoothing between successive spectra (0 = none)
pub const SMOOTHING_TIME_CONSTANT: f32 = 0.8;

pub struct SpectrumAnalyser {
    fft: Arc<dyn Fft<f32>>,
    fft_buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    window: Vec<f32>,
    /// Smoothed linear magnitude per bin
    smoothed: Vec<f32>,
    time_constant: f32,
}

impl SpectrumAnalyser {
    pub fn new(fft_size: usize, time_constant: f32) -> Self {
        let fft_size = fft_size.max(2);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Self {
            fft,
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch,
            window: blackman_window(fft_size),
            smoothed: vec![0.0; fft_size / 2],
            time_constant: time_constant.clamp(0.0, 1.0),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_buffer.len()
    }

    pub fn bins(&self) -> usize {
        self.smoothed.len()
    }

    /// Transform `samples` (length `fft_size`, zero-padded if shorter) and
    /// write one dB value per bin into `out`.
    pub fn process(&mut self, samples: &[f32], out: &mut [f32]) {
        for (i, slot) in self.fft_buffer.iter_mut().enumerate() {
            let sample = samples.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.fft_buffer, &mut self.scratch);

        let norm = 1.0 / self.fft_buffer.len() as f32;
        let tau = self.time_constant;
        for (k, smoothed) in self.smoothed.iter_mut().enumerate() {
            let magnitude = self.fft_buffer[k].norm() * norm;
            *smoothed = tau * *smoothed + (1.0 - tau) * magnitude;
            if let Some(db) = out.get_mut(k) {
                *db = to_db(*smoothed);
            }
        }
    }
}

fn blackman_window(n: usize) -> Vec<f32> {
    const ALPHA: f32 = 0.16;
    let a0 = (1.0 - ALPHA) / 2.0;
    let a1 = 0.5;
    let a2 = ALPHA / 2.0;
    (0..n)
        .map(|i| {
            let x = i as f32 / n as f32;
            a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
        })
        .collect()
}

fn to_db(magnitude: f32) -> f32 {
    if magnitude > 0.0 {
        (20.0 * magnitude.log10()).max(SILENCE_DB)
    } else {
        SILENCE_DB
    }
}

/// [`AudioSource`] that reads the shared sample buffer and runs the FFT.
///
/// Holds no device handle, so it can move to the analysis thread while the
/// stream stays with its owner.
pub struct AnalyserSource {
    buffer: SharedBuffer,
    analyser: SpectrumAnalyser,
    format: FrameFormat,
    last_written: u64,
}

impl AnalyserSource {
    pub fn new(buffer: SharedBuffer, sample_rate: u32) -> Self {
        let analyser = SpectrumAnalyser::new(FFT_SIZE, SMOOTHING_TIME_CONSTANT);
        let format = FrameFormat::for_fft(analyser.fft_size(), sample_rate);
        debug!(
            "Analyser: fft={} bins={} @ {} Hz",
            analyser.fft_size(),
            analyser.bins(),
            sample_rate
        );
        Self {
            buffer,
            analyser,
            format,
            last_written: 0,
        }
    }
}

impl AudioSource for AnalyserSource {
    fn format(&self) -> FrameFormat {
        self.format
    }

    fn fill_frame(&mut self, frame: &mut SpectralFrame) -> Result<bool, SourceError> {
        {
            let buffer = lock(&self.buffer)?;
            let written = buffer.written();
            if written == self.last_written {
                return Ok(false);
            }
            self.last_written = written;
            buffer.copy_latest(&mut frame.waveform);
            frame.sample_rate = buffer.sample_rate();
        }

        self.analyser
            .process(&frame.waveform, &mut frame.magnitude_spectrum);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::sample_buffer::SampleBuffer;

    fn sine(freq: f32, sample_rate: f32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_silence_is_floor() {
        let mut analyser = SpectrumAnalyser::new(256, 0.0);
        let mut out = vec![0.0; 128];
        analyser.process(&[0.0; 256], &mut out);
        assert!(out.iter().all(|&db| db == SILENCE_DB));
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let mut analyser = SpectrumAnalyser::new(1024, 0.0);
        let mut out = vec![0.0; 512];
        // Bin 64 at 44.1 kHz / 1024
        let freq = 64.0 * 44100.0 / 1024.0;
        analyser.process(&sine(freq, 44100.0, 1024), &mut out);

        let peak = out
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(peak, Some(64));
    }

    #[test]
    fn test_smoothing_carries_over() {
        let mut analyser = SpectrumAnalyser::new(256, 0.8);
        let mut loud = vec![0.0; 128];
        analyser.process(&sine(2000.0, 44100.0, 256), &mut loud);
        let mut after = vec![0.0; 128];
        analyser.process(&[0.0; 256], &mut after);
        // Decays instead of dropping straight to the floor
        assert!(after.iter().any(|&db| db > SILENCE_DB));
    }

    #[test]
    fn test_source_reports_no_new_data() {
        let buffer = SampleBuffer::shared(FFT_SIZE, 44100);
        let mut source = AnalyserSource::new(buffer.clone(), 44100);
        let mut frame = SpectralFrame::new(source.format());

        assert!(!source.fill_frame(&mut frame).unwrap());

        buffer.lock().unwrap().push_interleaved(&sine(440.0, 44100.0, 512), 1);
        assert!(source.fill_frame(&mut frame).unwrap());
        assert!(!source.fill_frame(&mut frame).unwrap());
        assert_eq!(frame.magnitude_spectrum.len(), FFT_SIZE / 2);
        assert!(frame.waveform.iter().any(|&s| s != 0.0));
    }
}
