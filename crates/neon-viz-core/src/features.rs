//! Feature extraction: RMS, spectral centroid, spectral flux, band energy.
//!
//! All functions are zero-guarded: silence yields zeros, never NaN or infinity.
//! [`FeatureExtractor`] adds the one piece of history flux needs.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::frame::{bin_width, db_to_linear, sanitize_db, SpectralFrame};

/// Energy split into three frequency buckets (linear magnitude sums)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandEnergy {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
}

impl BandEnergy {
    pub fn total(&self) -> f32 {
        self.low + self.mid + self.high
    }
}

/// Frequency cutoffs partitioning the spectrum into low/mid/high.
///
/// Bins below `low` go to the low bucket, `[low, mid)` to mid, `[mid, high)`
/// to high. Bins at or above `high` are not counted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCutoffs", into = "RawCutoffs")]
pub struct BandCutoffs {
    low: f32,
    mid: f32,
    high: f32,
}

impl BandCutoffs {
    pub fn new(low: f32, mid: f32, high: f32) -> Result<Self, ConfigError> {
        let finite = low.is_finite() && mid.is_finite() && high.is_finite();
        if !finite || low < 0.0 || low >= mid || mid >= high {
            return Err(ConfigError::UnorderedCutoffs { low, mid, high });
        }
        Ok(Self { low, mid, high })
    }

    pub fn low(&self) -> f32 {
        self.low
    }

    pub fn mid(&self) -> f32 {
        self.mid
    }

    pub fn high(&self) -> f32 {
        self.high
    }
}

impl Default for BandCutoffs {
    fn default() -> Self {
        Self {
            low: 60.0,
            mid: 2000.0,
            high: 8000.0,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawCutoffs {
    low_hz: f32,
    mid_hz: f32,
    high_hz: f32,
}

impl TryFrom<RawCutoffs> for BandCutoffs {
    type Error = ConfigError;

    fn try_from(raw: RawCutoffs) -> Result<Self, Self::Error> {
        Self::new(raw.low_hz, raw.mid_hz, raw.high_hz)
    }
}

impl From<BandCutoffs> for RawCutoffs {
    fn from(cutoffs: BandCutoffs) -> Self {
        Self {
            low_hz: cutoffs.low,
            mid_hz: cutoffs.mid,
            high_hz: cutoffs.high,
        }
    }
}

/// Features computed for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeatureSet {
    /// Instantaneous loudness (0-1 for a normalized waveform)
    pub rms: f32,
    /// Spectral centroid in Hz ("brightness")
    pub centroid: f32,
    /// Positive spectral change since the previous frame (0 on the first tick)
    pub flux: f32,
    /// Linear magnitude per frequency bucket
    pub band_energy: BandEnergy,
}

/// Root mean square of the waveform. Empty input gives 0.
pub fn calculate_rms(waveform: &[f32]) -> f32 {
    if waveform.is_empty() {
        return 0.0;
    }
    let sum: f32 = waveform
        .iter()
        .map(|&s| if s.is_finite() { s * s } else { 0.0 })
        .sum();
    let rms = (sum / waveform.len() as f32).sqrt();
    if rms.is_finite() {
        rms
    } else {
        0.0
    }
}

/// Magnitude-weighted mean frequency in Hz. Silence gives 0.
pub fn calculate_centroid(spectrum: &[f32], sample_rate: u32) -> f32 {
    if is_unfilled(spectrum) {
        return 0.0;
    }

    let width = bin_width(sample_rate, spectrum.len());
    let mut weighted_sum = 0.0f32;
    let mut magnitude_sum = 0.0f32;

    for (k, &db) in spectrum.iter().enumerate() {
        let magnitude = db_to_linear(db);
        weighted_sum += k as f32 * width * magnitude;
        magnitude_sum += magnitude;
    }

    if magnitude_sum > 0.0 {
        let centroid = weighted_sum / magnitude_sum;
        if centroid.is_finite() {
            return centroid;
        }
    }
    0.0
}

/// Sum of positive decibel increases from `previous` to `current`.
///
/// Only the overlapping bins are compared. Decay contributes nothing, so a
/// spectrum compared against itself yields exactly 0.
pub fn calculate_flux(current: &[f32], previous: &[f32]) -> f32 {
    current
        .iter()
        .zip(previous.iter())
        .map(|(&cur, &prev)| (sanitize_db(cur) - sanitize_db(prev)).max(0.0))
        .sum()
}

/// Linear magnitude accumulated per frequency bucket.
pub fn calculate_band_energy(spectrum: &[f32], sample_rate: u32, cutoffs: &BandCutoffs) -> BandEnergy {
    let mut bands = BandEnergy::default();
    if is_unfilled(spectrum) {
        return bands;
    }

    let width = bin_width(sample_rate, spectrum.len());
    for (k, &db) in spectrum.iter().enumerate() {
        let frequency = k as f32 * width;
        if frequency >= cutoffs.high {
            // Bins are ordered by frequency; nothing above counts.
            break;
        }
        let magnitude = db_to_linear(db);
        if frequency < cutoffs.low {
            bands.low += magnitude;
        } else if frequency < cutoffs.mid {
            bands.mid += magnitude;
        } else {
            bands.high += magnitude;
        }
    }
    bands
}

/// A spectrum of exact zeros comes from a source that never wrote to its
/// buffer. It carries no energy rather than 0 dB in every bin.
fn is_unfilled(spectrum: &[f32]) -> bool {
    spectrum.iter().all(|&db| db == 0.0)
}

/// Stateful extractor owning the previous magnitude spectrum for flux.
///
/// One instance per analysis session. The retained spectrum is a copy, so the
/// caller may reuse or drop its frame after [`extract`](Self::extract).
pub struct FeatureExtractor {
    cutoffs: BandCutoffs,
    previous_spectrum: Vec<f32>,
    has_history: bool,
}

impl FeatureExtractor {
    /// Create an extractor for spectra of `bins` bins.
    pub fn new(bins: usize, cutoffs: BandCutoffs) -> Self {
        debug!(
            "FeatureExtractor created: bins={}, cutoffs={}/{}/{} Hz",
            bins, cutoffs.low, cutoffs.mid, cutoffs.high
        );
        Self {
            cutoffs,
            previous_spectrum: Vec::with_capacity(bins),
            has_history: false,
        }
    }

    pub fn cutoffs(&self) -> &BandCutoffs {
        &self.cutoffs
    }

    /// Whether a previous spectrum is held for flux.
    pub fn has_history(&self) -> bool {
        self.has_history
    }

    /// Compute all features for `frame` and retain its spectrum for next time.
    pub fn extract(&mut self, frame: &SpectralFrame) -> FeatureSet {
        let spectrum = &frame.magnitude_spectrum;

        let flux = if self.has_history {
            calculate_flux(spectrum, &self.previous_spectrum)
        } else {
            0.0
        };

        let features = FeatureSet {
            rms: calculate_rms(&frame.waveform),
            centroid: calculate_centroid(spectrum, frame.sample_rate),
            flux: if flux.is_finite() { flux } else { 0.0 },
            band_energy: calculate_band_energy(spectrum, frame.sample_rate, &self.cutoffs),
        };

        // Reuses capacity; only reallocates if the bin count grew.
        self.previous_spectrum.clear();
        self.previous_spectrum.extend_from_slice(spectrum);
        self.has_history = true;

        features
    }

    /// Forget the retained spectrum; the next flux will be 0.
    pub fn reset(&mut self) {
        self.previous_spectrum.clear();
        self.has_history = false;
    }
}
