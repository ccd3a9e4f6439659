//! Exponential moving-average smoothing for scalar feature streams.

use crate::error::ConfigError;

/// Smallest alpha derived from the user's smoothing control.
pub const MIN_ALPHA: f32 = 0.05;

/// One step of exponential smoothing.
///
/// The first sample of a stream (`previous == None`) passes through
/// unchanged. Afterwards the result is the convex combination
/// `alpha * raw + (1 - alpha) * previous`, so it never leaves the
/// range spanned by `raw` and `previous`.
#[inline]
pub fn smooth(raw: f32, previous: Option<f32>, alpha: f32) -> f32 {
    match previous {
        None => raw,
        Some(previous) => {
            let alpha = alpha.clamp(0.0, 1.0);
            let value = alpha * raw + (1.0 - alpha) * previous;
            // Rounding can land a hair outside the interval.
            value.clamp(raw.min(previous), raw.max(previous))
        }
    }
}

/// Map the user's smoothing control (0 = none, 1 = heavy) to an alpha.
pub fn alpha_from_smoothing(smoothing: f32) -> f32 {
    let smoothing = if smoothing.is_finite() { smoothing } else { 0.0 };
    (1.0 - smoothing).clamp(MIN_ALPHA, 1.0)
}

/// A smoothed scalar stream. The caller owns one per feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedFeature {
    value: Option<f32>,
    alpha: f32,
}

impl SmoothedFeature {
    pub fn new(alpha: f32) -> Result<Self, ConfigError> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(ConfigError::InvalidAlpha(alpha));
        }
        Ok(Self { value: None, alpha })
    }

    /// Stream whose alpha follows the user's smoothing control.
    pub fn from_smoothing(smoothing: f32) -> Self {
        Self {
            value: None,
            alpha: alpha_from_smoothing(smoothing),
        }
    }

    /// Feed one raw observation and return the smoothed value.
    ///
    /// Non-finite observations are read as 0.
    pub fn update(&mut self, raw: f32) -> f32 {
        let raw = if raw.is_finite() { raw } else { 0.0 };
        let next = smooth(raw, self.value, self.alpha);
        self.value = Some(next);
        next
    }

    /// Current smoothed value, 0 before the first observation.
    pub fn value(&self) -> f32 {
        self.value.unwrap_or(0.0)
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Change the coefficient. Values above 1 are clamped to 1; zero,
    /// negative and NaN leave the current alpha in place.
    pub fn set_alpha(&mut self, alpha: f32) {
        if alpha > 0.0 {
            self.alpha = alpha.min(1.0);
        }
    }

    /// Forget the running value; the next observation passes through.
    pub fn reset(&mut self) {
        self.value = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_passes_through() {
        assert_eq!(smooth(0.7, None, 0.3), 0.7);

        let mut stream = SmoothedFeature::new(0.3).unwrap();
        assert_eq!(stream.update(0.7), 0.7);
    }

    #[test]
    fn test_alpha_one_tracks_raw() {
        assert_eq!(smooth(0.2, Some(0.9), 1.0), 0.2);
    }

    #[test]
    fn test_recurrence() {
        let mut stream = SmoothedFeature::new(0.25).unwrap();
        stream.update(1.0);
        let v = stream.update(0.0);
        assert!((v - 0.75).abs() < 1e-6);
        let v = stream.update(0.0);
        assert!((v - 0.5625).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_bad_alpha() {
        assert_eq!(SmoothedFeature::new(0.0), Err(ConfigError::InvalidAlpha(0.0)));
        assert!(SmoothedFeature::new(1.5).is_err());
        assert!(SmoothedFeature::new(f32::NAN).is_err());
        assert!(SmoothedFeature::new(1.0).is_ok());
    }

    #[test]
    fn test_set_alpha_accepts_what_new_accepts() {
        let mut stream = SmoothedFeature::new(0.5).unwrap();
        stream.set_alpha(0.01);
        assert_eq!(stream.alpha(), 0.01);
        assert!(SmoothedFeature::new(0.01).is_ok());

        stream.set_alpha(3.0);
        assert_eq!(stream.alpha(), 1.0);
        stream.set_alpha(0.0);
        stream.set_alpha(f32::NAN);
        assert_eq!(stream.alpha(), 1.0);
    }

    #[test]
    fn test_alpha_from_smoothing() {
        assert_eq!(alpha_from_smoothing(0.0), 1.0);
        assert!((alpha_from_smoothing(0.4) - 0.6).abs() < 1e-6);
        assert_eq!(alpha_from_smoothing(1.0), MIN_ALPHA);
        assert_eq!(alpha_from_smoothing(-3.0), 1.0);
        assert_eq!(alpha_from_smoothing(f32::NAN), 1.0);
    }

    #[test]
    fn test_reset_and_value() {
        let mut stream = SmoothedFeature::from_smoothing(0.5);
        assert_eq!(stream.value(), 0.0);
        stream.update(4.0);
        stream.reset();
        assert_eq!(stream.update(2.0), 2.0);
    }

    #[test]
    fn test_non_finite_reads_as_zero() {
        let mut stream = SmoothedFeature::new(0.5).unwrap();
        assert_eq!(stream.update(f32::NAN), 0.0);
        assert_eq!(stream.update(f32::INFINITY), 0.0);
    }
}
