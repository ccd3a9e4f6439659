//! Audio analysis and feature-to-visual mapping for neon-viz.
//!
//! Data flows one way per tick:
//! [`AudioSource`] -> [`SpectralFrame`] -> [`FeatureExtractor`] ->
//! ([`SmoothedFeature`], [`OnsetDetector`]) -> [`ParameterMapper`] ->
//! [`Renderer`]. [`FrameLoop`] wires the stages together.

pub mod config;
pub mod controls;
pub mod error;
pub mod features;
pub mod frame;
pub mod frame_loop;
pub mod mapper;
pub mod onset;
pub mod preset;
pub mod smoothing;
pub mod worker;

pub use config::{AnalysisConfig, BarsConfig, RingsConfig};
pub use controls::{Control, ControlConfig, ControlUpdate};
pub use error::{ConfigError, SourceError};
pub use features::{BandCutoffs, BandEnergy, FeatureExtractor, FeatureSet};
pub use frame::{AudioSource, FrameFormat, SpectralFrame};
pub use frame_loop::{FrameLoop, LoopCommand, LoopHandle, Renderer, TickOutcome};
pub use mapper::{
    BarParams, MapInput, MappingPolicy, ParameterMapper, RingInstance, Smoothed,
    VisualParameters,
};
pub use onset::{OnsetDetector, OnsetEvent};
pub use preset::{Preset, PresetColors, PresetStyle, Rgb, PRESETS};
pub use smoothing::{smooth, SmoothedFeature};
pub use worker::AnalysisWorker;
