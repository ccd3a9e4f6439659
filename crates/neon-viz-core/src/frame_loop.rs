//! The per-refresh driver: source -> features -> smoothing -> onset ->
//! mapping -> renderer.
//!
//! Control and preset changes arrive on a channel from any thread and are
//! drained at the start of a tick, so a tick always sees one consistent
//! set of controls.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use tracing::{debug, info, trace, warn};

use crate::config::AnalysisConfig;
use crate::controls::{ControlConfig, ControlUpdate};
use crate::error::{ConfigError, SourceError};
use crate::features::{FeatureExtractor, FeatureSet};
use crate::frame::{AudioSource, SpectralFrame};
use crate::mapper::{MapInput, ParameterMapper, Smoothed, VisualParameters};
use crate::onset::{OnsetDetector, OnsetEvent};
use crate::preset::Preset;
use crate::smoothing::{alpha_from_smoothing, SmoothedFeature};

/// Consumer of mapped parameters. Called at most once per tick.
pub trait Renderer {
    fn present(&mut self, params: &VisualParameters);
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn present(&mut self, params: &VisualParameters) {
        (**self).present(params)
    }
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn present(&mut self, params: &VisualParameters) {
        (**self).present(params)
    }
}

/// Asynchronous requests applied at the next tick boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopCommand {
    SetControls(ControlConfig),
    UpdateControl(ControlUpdate),
    SetPreset(Preset),
    /// Drop analysis history, e.g. after the input device changed
    Reset,
    Stop,
}

/// Cloneable, thread-safe handle for steering a [`FrameLoop`].
#[derive(Clone)]
pub struct LoopHandle {
    commands: Sender<LoopCommand>,
    alive: Arc<AtomicBool>,
}

impl LoopHandle {
    pub fn set_controls(&self, controls: ControlConfig) {
        self.send(LoopCommand::SetControls(controls));
    }

    pub fn update_control(&self, update: ControlUpdate) {
        self.send(LoopCommand::UpdateControl(update));
    }

    pub fn set_preset(&self, preset: Preset) {
        self.send(LoopCommand::SetPreset(preset));
    }

    pub fn reset(&self) {
        self.send(LoopCommand::Reset);
    }

    /// Stop the loop. Takes effect immediately: no renderer call happens
    /// after this returns, even for a tick already in progress.
    pub fn stop(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.send(LoopCommand::Stop);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn send(&self, command: LoopCommand) {
        // The loop may already be gone; a dropped command is fine then.
        let _ = self.commands.send(command);
    }
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A new frame was analysed and presented
    Rendered,
    /// No frame was available; the previous analysis was kept and only
    /// control changes were applied
    Held,
    /// The loop has been stopped; nothing was presented
    Stopped,
}

pub struct FrameLoop<S> {
    source: S,
    frame: SpectralFrame,
    extractor: FeatureExtractor,
    rms: SmoothedFeature,
    centroid: SmoothedFeature,
    detector: OnsetDetector,
    mapper: ParameterMapper,
    params: VisualParameters,
    features: FeatureSet,
    controls: ControlConfig,
    preset: Preset,
    commands_tx: Sender<LoopCommand>,
    commands_rx: Receiver<LoopCommand>,
    alive: Arc<AtomicBool>,
    tick: u64,
    source_failing: bool,
}

impl<S: AudioSource> FrameLoop<S> {
    /// Build a loop around `source`. All buffers are sized here from the
    /// source's frame format.
    pub fn new(
        source: S,
        config: &AnalysisConfig,
        controls: ControlConfig,
        preset: Preset,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let format = source.format();
        let controls = controls.clamped();

        info!(
            "Frame loop: {} bins, {} samples @ {} Hz, preset '{}'",
            format.bins, format.samples, format.sample_rate, preset.name
        );

        let mapper = ParameterMapper::new(config);
        let mut params = mapper.blank_params();
        params.preset = preset;
        params.controls = controls;
        params.bloom = controls.bloom;

        let (commands_tx, commands_rx) = crossbeam_channel::unbounded();
        let alpha = alpha_from_smoothing(controls.smoothing);

        Ok(Self {
            frame: SpectralFrame::new(format),
            extractor: FeatureExtractor::new(format.bins, config.cutoffs),
            rms: SmoothedFeature::new(alpha)?,
            centroid: SmoothedFeature::new(alpha)?,
            detector: OnsetDetector::with_threshold(config.flux_threshold),
            mapper,
            params,
            features: FeatureSet::default(),
            controls,
            preset,
            commands_tx,
            commands_rx,
            alive: Arc::new(AtomicBool::new(true)),
            tick: 0,
            source_failing: false,
            source,
        })
    }

    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            commands: self.commands_tx.clone(),
            alive: Arc::clone(&self.alive),
        }
    }

    /// Run one tick and present the result.
    ///
    /// On a missing frame the previous parameters are presented again.
    pub fn tick<R: Renderer + ?Sized>(&mut self, renderer: &mut R) -> TickOutcome {
        let outcome = self.advance();
        if outcome == TickOutcome::Stopped {
            return TickOutcome::Stopped;
        }
        // A stop may have raced in while the tick was computing.
        if !self.is_alive() {
            return TickOutcome::Stopped;
        }
        renderer.present(&self.params);
        outcome
    }

    /// Run one tick without presenting. The result is in [`params`](Self::params).
    pub fn advance(&mut self) -> TickOutcome {
        if !self.is_alive() {
            return TickOutcome::Stopped;
        }
        if !self.drain_commands() {
            return TickOutcome::Stopped;
        }

        self.tick += 1;

        let filled = panic::catch_unwind(AssertUnwindSafe(|| {
            self.source.fill_frame(&mut self.frame)
        }))
        .unwrap_or_else(|payload| Err(SourceError::Panicked(panic_message(payload.as_ref()))));

        match filled {
            Ok(true) => {
                if self.source_failing {
                    info!("Audio source recovered");
                    self.source_failing = false;
                }
            }
            Ok(false) => {
                trace!("tick {}: no frame, holding", self.tick);
                self.hold();
                return TickOutcome::Held;
            }
            Err(e) => {
                if !self.source_failing {
                    warn!("Audio source error, holding last frame: {}", e);
                    self.source_failing = true;
                } else {
                    debug!("tick {}: source still failing: {}", self.tick, e);
                }
                self.hold();
                return TickOutcome::Held;
            }
        }

        self.analyse();
        TickOutcome::Rendered
    }

    /// Keep the last analysed frame but apply this tick's controls.
    fn hold(&mut self) {
        self.mapper
            .refresh_controls(&self.preset, &self.controls, &mut self.params);
    }

    fn analyse(&mut self) {
        let features = self.extractor.extract(&self.frame);
        let smoothed = Smoothed {
            rms: self.rms.update(features.rms),
            centroid: self.centroid.update(features.centroid),
        };

        // Runs even while rings are off so the flux history stays current.
        let onset = self
            .detector
            .detect(features.flux)
            .then_some(OnsetEvent { tick: self.tick });
        if onset.is_some() {
            trace!("tick {}: onset (flux {:.1})", self.tick, features.flux);
        }

        let input = MapInput {
            features,
            smoothed,
            onset,
            spectrum: &self.frame.magnitude_spectrum,
            preset: &self.preset,
            controls: &self.controls,
        };
        self.mapper.map(&input, &mut self.params);
        self.params.tick = self.tick;
        self.features = features;
    }

    /// Apply every pending command. Returns false if a stop was requested.
    fn drain_commands(&mut self) -> bool {
        loop {
            match self.commands_rx.try_recv() {
                Ok(LoopCommand::SetControls(controls)) => {
                    debug!("Controls replaced");
                    self.set_controls(controls);
                }
                Ok(LoopCommand::UpdateControl(update)) => {
                    debug!("Control update: {:?}", update);
                    let mut controls = self.controls;
                    controls.apply(update);
                    self.set_controls(controls);
                }
                Ok(LoopCommand::SetPreset(preset)) => {
                    info!("Preset: {}", preset.name);
                    self.preset = preset;
                }
                Ok(LoopCommand::Reset) => self.reset(),
                Ok(LoopCommand::Stop) => {
                    self.shutdown();
                    return false;
                }
                // The loop owns a sender, so disconnection cannot happen.
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return true,
            }
        }
    }

    fn set_controls(&mut self, controls: ControlConfig) {
        let controls = controls.clamped();
        if controls.smoothing != self.controls.smoothing {
            let alpha = alpha_from_smoothing(controls.smoothing);
            self.rms.set_alpha(alpha);
            self.centroid.set_alpha(alpha);
        }
        self.controls = controls;
    }

    fn shutdown(&mut self) {
        if self.alive.swap(false, Ordering::SeqCst) {
            info!("Frame loop stopped after {} ticks", self.tick);
        }
    }

    /// Stop from the owning thread.
    pub fn stop(&mut self) {
        self.shutdown();
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Parameters from the most recent analysed tick.
    pub fn params(&self) -> &VisualParameters {
        &self.params
    }

    /// Raw features from the most recent analysed tick.
    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// Controls as applied at the last tick boundary.
    pub fn controls(&self) -> &ControlConfig {
        &self.controls
    }

    pub fn preset(&self) -> &Preset {
        &self.preset
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Start a fresh analysis session on the same buffers (e.g. after the
    /// input device changed).
    pub fn reset(&mut self) {
        debug!("Frame loop reset");
        self.extractor.reset();
        self.rms.reset();
        self.centroid.reset();
        self.detector.reset();
        self.mapper.reset();
        self.frame.clear();
        self.features = FeatureSet::default();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
