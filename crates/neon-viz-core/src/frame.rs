//! Analysis input: one frame of spectral and time-domain data.

use crate::error::{ConfigError, SourceError};

/// Decibel value treated as silence. Bins at or below it carry no energy.
pub const SILENCE_DB: f32 = -160.0;

/// Upper clamp for decibel input (well above 0 dBFS).
pub const MAX_DB: f32 = 100.0;

/// Default transform size. Yields `DEFAULT_FFT_SIZE / 2` usable bins.
pub const DEFAULT_FFT_SIZE: usize = 2048;

/// Default sample rate when the source does not report one.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Fixed dimensions of every frame in one analysis session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFormat {
    /// Number of magnitude bins (N)
    pub bins: usize,
    /// Number of time-domain samples (M)
    pub samples: usize,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl FrameFormat {
    pub fn new(bins: usize, samples: usize, sample_rate: u32) -> Result<Self, ConfigError> {
        if bins == 0 || samples == 0 || sample_rate == 0 {
            return Err(ConfigError::InvalidFormat {
                bins,
                samples,
                sample_rate,
            });
        }
        Ok(Self {
            bins,
            samples,
            sample_rate,
        })
    }

    /// Format produced by a transform of `fft_size` points.
    pub fn for_fft(fft_size: usize, sample_rate: u32) -> Self {
        Self {
            bins: (fft_size / 2).max(1),
            samples: fft_size.max(1),
            sample_rate: sample_rate.max(1),
        }
    }

    /// Width of one bin in Hz.
    pub fn bin_width(&self) -> f32 {
        bin_width(self.sample_rate, self.bins)
    }
}

impl Default for FrameFormat {
    fn default() -> Self {
        Self::for_fft(DEFAULT_FFT_SIZE, DEFAULT_SAMPLE_RATE)
    }
}

/// One sampled instant of audio analysis input.
///
/// Buffers are sized once from a [`FrameFormat`] and refilled in place by the
/// audio source every tick, so the steady state never allocates.
#[derive(Debug, Clone)]
pub struct SpectralFrame {
    /// Log-magnitude (dB) per frequency bin
    pub magnitude_spectrum: Vec<f32>,
    /// Most recent time-domain samples in [-1, 1]
    pub waveform: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl SpectralFrame {
    /// Silent frame with the given dimensions.
    pub fn new(format: FrameFormat) -> Self {
        Self {
            magnitude_spectrum: vec![SILENCE_DB; format.bins],
            waveform: vec![0.0; format.samples],
            sample_rate: format.sample_rate,
        }
    }

    /// Build a frame from existing buffers.
    pub fn from_parts(magnitude_spectrum: Vec<f32>, waveform: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            magnitude_spectrum,
            waveform,
            sample_rate,
        }
    }

    pub fn format(&self) -> FrameFormat {
        FrameFormat {
            bins: self.magnitude_spectrum.len(),
            samples: self.waveform.len(),
            sample_rate: self.sample_rate,
        }
    }

    /// Reset to silence without reallocating.
    pub fn clear(&mut self) {
        self.magnitude_spectrum.fill(SILENCE_DB);
        self.waveform.fill(0.0);
    }
}

/// Supplies one [`SpectralFrame`] per tick.
///
/// Implementations write into the caller's frame instead of returning a new
/// one. `Ok(false)` means nothing new was available this tick; the loop then
/// holds the previous visual state. Errors are handled the same way.
pub trait AudioSource {
    /// Dimensions of the frames this source produces. Constant per session.
    fn format(&self) -> FrameFormat;

    /// Fill `frame` with the next analysis frame.
    fn fill_frame(&mut self, frame: &mut SpectralFrame) -> Result<bool, SourceError>;
}

impl<S: AudioSource + ?Sized> AudioSource for Box<S> {
    fn format(&self) -> FrameFormat {
        (**self).format()
    }

    fn fill_frame(&mut self, frame: &mut SpectralFrame) -> Result<bool, SourceError> {
        (**self).fill_frame(frame)
    }
}

/// Width of one bin in Hz for `bins` bins spanning 0..nyquist.
pub fn bin_width(sample_rate: u32, bins: usize) -> f32 {
    if bins == 0 {
        return 0.0;
    }
    (sample_rate as f32 / 2.0) / bins as f32
}

/// Clamp a decibel reading into a finite range. NaN and -inf map to silence.
#[inline]
pub fn sanitize_db(db: f32) -> f32 {
    if db.is_nan() {
        SILENCE_DB
    } else {
        db.clamp(SILENCE_DB, MAX_DB)
    }
}

/// Convert decibels to linear magnitude via `10^(dB/20)`.
///
/// Readings at or below [`SILENCE_DB`] (including -inf and NaN) are exactly 0.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    let db = sanitize_db(db);
    if db <= SILENCE_DB {
        0.0
    } else {
        10f32.powf(db / 20.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_to_linear() {
        assert_eq!(db_to_linear(0.0), 1.0);
        assert!((db_to_linear(-20.0) - 0.1).abs() < 1e-6);
        assert!((db_to_linear(20.0) - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_db_to_linear_silence() {
        assert_eq!(db_to_linear(SILENCE_DB), 0.0);
        assert_eq!(db_to_linear(-1.0e6), 0.0);
        assert_eq!(db_to_linear(f32::NEG_INFINITY), 0.0);
        assert_eq!(db_to_linear(f32::NAN), 0.0);
        assert!(db_to_linear(f32::INFINITY).is_finite());
    }

    #[test]
    fn test_frame_format_for_fft() {
        let format = FrameFormat::for_fft(2048, 48000);
        assert_eq!(format.bins, 1024);
        assert_eq!(format.samples, 2048);
        assert!((format.bin_width() - 23.4375).abs() < 1e-4);
    }

    #[test]
    fn test_frame_format_rejects_zero() {
        assert!(FrameFormat::new(0, 2048, 44100).is_err());
        assert!(FrameFormat::new(1024, 0, 44100).is_err());
        assert!(FrameFormat::new(1024, 2048, 0).is_err());
    }

    #[test]
    fn test_new_frame_is_silent() {
        let frame = SpectralFrame::new(FrameFormat::default());
        assert_eq!(frame.magnitude_spectrum.len(), 1024);
        assert!(frame.magnitude_spectrum.iter().all(|&db| db == SILENCE_DB));
        assert!(frame.waveform.iter().all(|&s| s == 0.0));
    }
}
