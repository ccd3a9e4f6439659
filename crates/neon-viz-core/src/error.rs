//! Error types for the analysis pipeline.
//!
//! The per-tick path never fails: silence and bad values are absorbed by
//! zero-guarded arithmetic. Errors only come from construction-time
//! validation and from the audio source collaborator.

/// Errors raised by an [`AudioSource`](crate::AudioSource) when it cannot
/// produce a frame. The frame loop treats every variant as a missing frame.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// No capture or playback device could be opened
    #[error("no audio device available")]
    NoDevice,

    /// The device rejected its configuration
    #[error("audio device error: {0}")]
    Device(String),

    /// Building or starting the stream failed
    #[error("audio stream error: {0}")]
    Stream(String),

    /// An audio file could not be decoded
    #[error("failed to decode audio: {0}")]
    Decode(String),

    /// The source panicked while filling a frame
    #[error("audio source panicked: {0}")]
    Panicked(String),

    /// The shared sample buffer was poisoned by a panicking audio callback
    #[error("sample buffer lock poisoned")]
    Poisoned,
}

/// Invalid analysis configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Band cutoffs must satisfy `0 <= low < mid < high`
    #[error("band cutoffs must be ordered low < mid < high (got {low} / {mid} / {high} Hz)")]
    UnorderedCutoffs { low: f32, mid: f32, high: f32 },

    /// Smoothing coefficient outside (0, 1]
    #[error("smoothing alpha must lie in (0, 1], got {0}")]
    InvalidAlpha(f32),

    /// Flux threshold must be a finite, non-negative number
    #[error("flux threshold must be finite and >= 0, got {0}")]
    InvalidThreshold(f32),

    /// The bar policy needs at least one bar
    #[error("bar count must be at least 1")]
    ZeroBars,

    /// Ring dynamics that would never expire or are not finite
    #[error("invalid ring dynamics: {0}")]
    InvalidRings(String),

    /// Frame format with zero bins, zero samples or zero sample rate
    #[error("invalid frame format: {bins} bins, {samples} samples @ {sample_rate} Hz")]
    InvalidFormat {
        bins: usize,
        samples: usize,
        sample_rate: u32,
    },
}
