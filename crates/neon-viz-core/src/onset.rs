//! Edge-triggered onset detection over the spectral flux stream.
//!
//! A single-datum trigger: fires when flux jumps by more than a threshold
//! since the previous call. No peak picking and no cooldown; rings spawned
//! by an onset fade on their own, so a false positive is cheap.

/// Default flux jump that counts as an onset. Empirical; tune via config.
pub const DEFAULT_FLUX_THRESHOLD: f32 = 50.0;

/// Marker that a transient occurred on a given tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnsetEvent {
    pub tick: u64,
}

#[derive(Debug, Clone)]
pub struct OnsetDetector {
    previous_flux: f32,
    threshold: f32,
}

impl OnsetDetector {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_FLUX_THRESHOLD)
    }

    pub fn with_threshold(threshold: f32) -> Self {
        Self {
            previous_flux: 0.0,
            threshold: if threshold.is_finite() {
                threshold.max(0.0)
            } else {
                DEFAULT_FLUX_THRESHOLD
            },
        }
    }

    /// Returns `true` when `flux - previous_flux > threshold`.
    ///
    /// `previous_flux` is updated on every call, fired or not.
    pub fn detect(&mut self, flux: f32) -> bool {
        let flux = if flux.is_finite() { flux } else { 0.0 };
        let delta = flux - self.previous_flux;
        self.previous_flux = flux;
        delta > self.threshold
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        if threshold.is_finite() {
            self.threshold = threshold.max(0.0);
        }
    }

    pub fn previous_flux(&self) -> f32 {
        self.previous_flux
    }

    pub fn reset(&mut self) {
        self.previous_flux = 0.0;
    }
}

impl Default for OnsetDetector {
    fn default() -> Self {
        Self::new()
    }
}
