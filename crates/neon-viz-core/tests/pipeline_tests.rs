use std::collections::VecDeque;
use std::thread;

use neon_viz_core::frame::SILENCE_DB;
use neon_viz_core::{
    AnalysisConfig, AudioSource, ControlConfig, ControlUpdate, FrameFormat, FrameLoop, LoopHandle,
    Preset, Renderer, RingsConfig, SourceError, SpectralFrame, TickOutcome, VisualParameters,
};

#[derive(Debug, Clone, Copy)]
enum Step {
    /// Uniform spectrum level (dB) and constant waveform sample
    Frame(f32, f32),
    Missing,
    Fail,
    Panic,
}

struct Scripted {
    steps: VecDeque<Step>,
    then: Step,
}

impl Scripted {
    fn new(steps: impl IntoIterator<Item = Step>, then: Step) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            then,
        }
    }

    fn constant(step: Step) -> Self {
        Self::new([], step)
    }
}

impl AudioSource for Scripted {
    fn format(&self) -> FrameFormat {
        FrameFormat::for_fft(2048, 44100)
    }

    fn fill_frame(&mut self, frame: &mut SpectralFrame) -> Result<bool, SourceError> {
        match self.steps.pop_front().unwrap_or(self.then) {
            Step::Frame(db, sample) => {
                frame.magnitude_spectrum.fill(db);
                frame.waveform.fill(sample);
                Ok(true)
            }
            Step::Missing => Ok(false),
            Step::Fail => Err(SourceError::Stream("device unplugged".into())),
            Step::Panic => panic!("capture callback went away"),
        }
    }
}

#[derive(Default)]
struct Recorder {
    frames: Vec<VisualParameters>,
}

impl Renderer for Recorder {
    fn present(&mut self, params: &VisualParameters) {
        self.frames.push(params.clone());
    }
}

fn frame_loop(source: Scripted, config: &AnalysisConfig) -> FrameLoop<Scripted> {
    FrameLoop::new(source, config, ControlConfig::default(), Preset::default()).unwrap()
}

const FLAT: Step = Step::Frame(-60.0, 0.1);
const LOUD: Step = Step::Frame(-40.0, 0.3);

#[test]
fn test_silence_for_100_ticks() {
    for silent_db in [SILENCE_DB, 0.0] {
        let mut fl = frame_loop(
            Scripted::constant(Step::Frame(silent_db, 0.0)),
            &AnalysisConfig::default(),
        );
        let mut recorder = Recorder::default();

        for _ in 0..100 {
            assert_eq!(fl.tick(&mut recorder), TickOutcome::Rendered);
            let features = fl.features();
            assert_eq!(features.rms, 0.0);
            assert_eq!(features.centroid, 0.0);
            assert_eq!(features.flux, 0.0);
        }

        assert_eq!(recorder.frames.len(), 100);
        for params in &recorder.frames {
            assert!(params.rings.is_empty());
            assert_eq!(params.bars.len(), 64);
            assert!(params.bars.iter().all(|b| b.height == 0.1));
        }
    }
}

#[test]
fn test_spike_spawns_exactly_one_ring() {
    let mut fl = frame_loop(
        Scripted::new([FLAT, LOUD], LOUD),
        &AnalysisConfig::default(),
    );
    let mut recorder = Recorder::default();

    fl.tick(&mut recorder);
    assert_eq!(fl.features().flux, 0.0);
    assert!(recorder.frames[0].rings.is_empty());

    fl.tick(&mut recorder);
    // +20 dB in each of 1024 bins
    assert!((fl.features().flux - 20.0 * 1024.0).abs() < 1.0);
    assert_eq!(recorder.frames[1].rings.len(), 1);

    // Sustained level: flux drops to 0, no new ring
    fl.tick(&mut recorder);
    assert_eq!(recorder.frames[2].rings.len(), 1);
}

#[test]
fn test_disabling_rings_clears_them_until_next_onset() {
    let steps = [FLAT, LOUD, FLAT, LOUD, FLAT];
    let mut fl = frame_loop(Scripted::new(steps, FLAT), &AnalysisConfig::default());
    let handle = fl.handle();
    let mut recorder = Recorder::default();

    for _ in 0..steps.len() {
        fl.tick(&mut recorder);
    }
    assert_eq!(recorder.frames.last().map(|p| p.rings.len()), Some(2));

    handle.update_control(ControlUpdate::OnsetRings(false));
    fl.tick(&mut recorder);
    assert!(recorder.frames.last().unwrap().rings.is_empty());

    handle.update_control(ControlUpdate::OnsetRings(true));
    for _ in 0..10 {
        fl.tick(&mut recorder);
        assert!(recorder.frames.last().unwrap().rings.is_empty());
    }
}

#[test]
fn test_rings_resume_on_new_onset_after_reenable() {
    let mut fl = frame_loop(
        Scripted::new([FLAT, LOUD, FLAT, FLAT, FLAT, LOUD], FLAT),
        &AnalysisConfig::default(),
    );
    let handle = fl.handle();
    let mut recorder = Recorder::default();

    fl.tick(&mut recorder);
    fl.tick(&mut recorder);
    assert_eq!(recorder.frames[1].rings.len(), 1);

    handle.update_control(ControlUpdate::OnsetRings(false));
    fl.tick(&mut recorder);
    assert!(recorder.frames[2].rings.is_empty());

    handle.update_control(ControlUpdate::OnsetRings(true));
    fl.tick(&mut recorder);
    fl.tick(&mut recorder);
    assert!(recorder.frames[4].rings.is_empty());

    fl.tick(&mut recorder);
    let rings = &recorder.frames[5].rings;
    assert_eq!(rings.len(), 1);
    assert_eq!(rings[0].age, 1);
}

#[test]
fn test_ring_outlives_fifty_ticks_then_expires() {
    let config = AnalysisConfig {
        rings: RingsConfig {
            decay: 0.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut fl = frame_loop(Scripted::new([FLAT, LOUD], LOUD), &config);
    let mut recorder = Recorder::default();

    fl.tick(&mut recorder);
    let mut visible = 0;
    for _ in 0..60 {
        fl.tick(&mut recorder);
        if recorder.frames.last().unwrap().rings.is_empty() {
            break;
        }
        visible += 1;
    }
    assert_eq!(visible, 50);
}

#[test]
fn test_missing_frame_holds_previous_parameters() {
    let mut fl = frame_loop(
        Scripted::new([FLAT, LOUD, Step::Missing, Step::Fail, Step::Fail], LOUD),
        &AnalysisConfig::default(),
    );
    let mut recorder = Recorder::default();

    assert_eq!(fl.tick(&mut recorder), TickOutcome::Rendered);
    assert_eq!(fl.tick(&mut recorder), TickOutcome::Rendered);
    assert_eq!(fl.tick(&mut recorder), TickOutcome::Held);
    assert_eq!(fl.tick(&mut recorder), TickOutcome::Held);
    assert_eq!(fl.tick(&mut recorder), TickOutcome::Held);

    let reference = &recorder.frames[1];
    assert_eq!(reference.rings.len(), 1);
    for held in &recorder.frames[2..5] {
        assert_eq!(held, reference);
    }

    // Recovery resumes analysis where it left off
    assert_eq!(fl.tick(&mut recorder), TickOutcome::Rendered);
    assert_eq!(recorder.frames[5].tick, 6);
    assert_eq!(fl.features().flux, 0.0);
}

#[test]
fn test_controls_apply_while_source_is_stalled() {
    let mut fl = frame_loop(
        Scripted::new([FLAT, LOUD], Step::Missing),
        &AnalysisConfig::default(),
    );
    let mut recorder = Recorder::default();
    fl.tick(&mut recorder);
    fl.tick(&mut recorder);
    assert_eq!(recorder.frames[1].rings.len(), 1);

    let handle = fl.handle();
    handle.update_control(ControlUpdate::OnsetRings(false));
    handle.update_control(ControlUpdate::Bloom(0.1));
    assert_eq!(fl.tick(&mut recorder), TickOutcome::Held);

    let held = recorder.frames.last().unwrap();
    assert!(held.rings.is_empty());
    assert_eq!(held.bloom, 0.1);
    assert!(!held.controls.onset_rings);
    // The analysis itself is still the last real frame
    assert_eq!(held.bars, recorder.frames[1].bars);
    assert_eq!(held.tick, 2);

    // Turning rings back on does not bring the old one back
    handle.update_control(ControlUpdate::OnsetRings(true));
    fl.tick(&mut recorder);
    assert!(recorder.frames.last().unwrap().rings.is_empty());
}

#[test]
fn test_panicking_source_is_a_missing_frame() {
    let mut fl = frame_loop(
        Scripted::new([FLAT, LOUD, Step::Panic], LOUD),
        &AnalysisConfig::default(),
    );
    let mut recorder = Recorder::default();

    assert_eq!(fl.tick(&mut recorder), TickOutcome::Rendered);
    assert_eq!(fl.tick(&mut recorder), TickOutcome::Rendered);
    assert_eq!(fl.tick(&mut recorder), TickOutcome::Held);
    assert_eq!(recorder.frames[2], recorder.frames[1]);
    assert!(fl.is_alive());

    assert_eq!(fl.tick(&mut recorder), TickOutcome::Rendered);
    assert_eq!(recorder.frames[3].tick, 4);
}

struct StopOnPresent {
    handle: LoopHandle,
    presented: usize,
}

impl Renderer for StopOnPresent {
    fn present(&mut self, _: &VisualParameters) {
        self.presented += 1;
        self.handle.stop();
    }
}

#[test]
fn test_no_present_after_stop() {
    let mut fl = frame_loop(Scripted::constant(FLAT), &AnalysisConfig::default());
    let mut renderer = StopOnPresent {
        handle: fl.handle(),
        presented: 0,
    };

    assert_eq!(fl.tick(&mut renderer), TickOutcome::Rendered);
    for _ in 0..5 {
        assert_eq!(fl.tick(&mut renderer), TickOutcome::Stopped);
    }
    assert_eq!(renderer.presented, 1);
    assert!(!fl.is_alive());
}

#[test]
fn test_stop_from_another_thread() {
    let mut fl = frame_loop(Scripted::constant(FLAT), &AnalysisConfig::default());
    let handle = fl.handle();
    let mut recorder = Recorder::default();
    fl.tick(&mut recorder);

    thread::spawn(move || handle.stop()).join().unwrap();

    assert_eq!(fl.tick(&mut recorder), TickOutcome::Stopped);
    assert_eq!(recorder.frames.len(), 1);
}

struct TweakOnPresent {
    handle: LoopHandle,
    seen: Vec<ControlConfig>,
}

impl Renderer for TweakOnPresent {
    fn present(&mut self, params: &VisualParameters) {
        self.seen.push(params.controls);
        self.handle.update_control(ControlUpdate::Sensitivity(0.0));
        self.handle.update_control(ControlUpdate::PitchToColor(false));
        self.handle.set_preset(Preset::by_name("Aurora Ribbons"));
    }
}

#[test]
fn test_changes_apply_together_at_tick_boundary() {
    let mut fl = frame_loop(Scripted::constant(LOUD), &AnalysisConfig::default());
    let mut renderer = TweakOnPresent {
        handle: fl.handle(),
        seen: Vec::new(),
    };

    fl.tick(&mut renderer);
    assert_eq!(renderer.seen[0], ControlConfig::default());
    assert_eq!(fl.preset().name, "Neon Spectrum");

    fl.tick(&mut renderer);
    let applied = renderer.seen[1];
    assert_eq!(applied.sensitivity, 0.0);
    assert!(!applied.pitch_to_color);
    assert_eq!(fl.params().preset.name, "Aurora Ribbons");
    // Zero sensitivity collapses every bar to the floor
    assert!(fl.params().bars.iter().all(|b| b.height == 0.1));
}

#[test]
fn test_out_of_range_controls_are_clamped() {
    let controls = ControlConfig {
        sensitivity: 7.0,
        bloom: -2.0,
        ..Default::default()
    };
    let mut fl = FrameLoop::new(
        Scripted::constant(LOUD),
        &AnalysisConfig::default(),
        controls,
        Preset::default(),
    )
    .unwrap();
    let mut recorder = Recorder::default();
    fl.tick(&mut recorder);

    let params = &recorder.frames[0];
    assert_eq!(params.controls.sensitivity, 1.0);
    assert_eq!(params.bloom, 0.0);
}
