mod audio;
mod renderer;
mod ui;
mod utils;

use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use nannou::prelude::*;
use neon_viz_core::{
    AnalysisWorker, ControlConfig, ControlUpdate, FrameLoop, LoopHandle, Preset, Renderer,
    VisualParameters,
};
use tracing::{error, info, warn};

use audio::{AnalyserSource, FilePlayer, Input, SampleBuffer, SharedBuffer, SourcePipe, FFT_SIZE};
use renderer::{Resolution, SceneRenderer};
use ui::bindings::{parse_key, Action};
use ui::control_panel::ControlPanel;
use ui::help_overlay::HelpOverlay;
use ui::preset_picker::PresetPicker;
use utils::{Config, ConfigWatcher, LiveChange};

/// Analysis tick for the threaded driver (~60 Hz)
const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Sample rate assumed until a stream reports its own
const DEFAULT_SAMPLE_RATE: u32 = 44100;

#[derive(Parser, Debug)]
#[command(name = "neon-viz", version, about = "Audio-reactive neon visualizer")]
struct Args {
    /// Play and visualize a WAV file instead of capturing a device
    #[arg(long, value_name = "WAV")]
    file: Option<PathBuf>,

    /// Start with this preset (overrides the config file)
    #[arg(long)]
    preset: Option<String>,

    /// Run in a window instead of fullscreen
    #[arg(short, long)]
    windowed: bool,

    /// Print audio system diagnostics and exit
    #[arg(long)]
    audio_info: bool,

    /// Debug-level logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,

    /// Run analysis on its own thread
    #[arg(long)]
    threaded: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    utils::init_logging(args.verbose);

    if args.audio_info {
        utils::log_audio_info();
        return Ok(());
    }

    if let Some(path) = &args.file {
        anyhow::ensure!(path.is_file(), "no such file: {}", path.display());
    } else {
        SourcePipe::list_devices();
    }

    if let Some(name) = &args.preset {
        if Preset::find(name).is_none() {
            let names: Vec<&str> = Preset::names().collect();
            warn!("Unknown preset '{}' (available: {})", name, names.join(", "));
        }
    }

    nannou::app(model).update(update).exit(exit).run();
    Ok(())
}

/// Who runs the analysis pipeline.
enum Driver {
    /// Ticked from the nannou update callback
    Inline(FrameLoop<AnalyserSource>),
    /// Ticked on a worker thread; parameters arrive over a channel
    Threaded(AnalysisWorker),
}

impl Driver {
    /// Build the pipeline. Also returns blank parameters sized for it.
    fn start(
        source: AnalyserSource,
        config: &Config,
        controls: ControlConfig,
        preset: Preset,
        threaded: bool,
    ) -> Result<(Self, VisualParameters)> {
        let frame_loop = FrameLoop::new(source, &config.analysis, controls, preset)
            .context("invalid [analysis] settings")?;
        let blank = frame_loop.params().clone();

        let driver = if threaded {
            let worker = AnalysisWorker::spawn(frame_loop, TICK_INTERVAL)
                .context("could not start the analysis thread")?;
            Driver::Threaded(worker)
        } else {
            Driver::Inline(frame_loop)
        };
        Ok((driver, blank))
    }

    fn handle(&self) -> LoopHandle {
        match self {
            Driver::Inline(frame_loop) => frame_loop.handle(),
            Driver::Threaded(worker) => worker.handle(),
        }
    }

    /// Hand the newest parameters to `renderer`.
    fn drive(&mut self, renderer: &mut SceneRenderer) {
        match self {
            Driver::Inline(frame_loop) => {
                frame_loop.tick(renderer);
            }
            Driver::Threaded(worker) => {
                if !worker.handle().is_alive() {
                    return;
                }
                if let Some(params) = worker.latest() {
                    renderer.present(&params);
                    worker.recycle(params);
                }
            }
        }
    }

    fn stop(&mut self) {
        match self {
            Driver::Inline(frame_loop) => frame_loop.stop(),
            Driver::Threaded(worker) => worker.stop(),
        }
    }
}

struct Model {
    input: Input,
    driver: Driver,
    handle: LoopHandle,
    renderer: SceneRenderer,
    config: Config,
    watcher: Option<ConfigWatcher>,
    /// The UI owns the controls; the pipeline gets copies
    controls: ControlConfig,
    preset: Preset,
    picker: PresetPicker,
    help_overlay: HelpOverlay,
    control_panel: ControlPanel,
}

fn fatal(msg: impl Display) -> ! {
    error!("{}", msg);
    std::process::exit(1)
}

fn open_input(args: &Args, buffer: &SharedBuffer, config: &Config) -> Result<Input> {
    match &args.file {
        Some(path) => {
            let timeout = Duration::from_secs(config.device_timeout_secs());
            let player = FilePlayer::open(path, SharedBuffer::clone(buffer), timeout)
                .with_context(|| format!("could not play {}", path.display()))?;
            Ok(Input::File(player))
        }
        None => {
            let pipe = SourcePipe::new(SharedBuffer::clone(buffer), config)
                .context("could not open an audio device")?;
            Ok(Input::Device(pipe))
        }
    }
}

fn model(app: &App) -> Model {
    let args = Args::parse();
    let resolution = Resolution::current(args.windowed);
    app.set_exit_on_escape(false);

    let mut win = app
        .new_window()
        .title("neon-viz")
        .view(view)
        .key_pressed(key_pressed)
        .size(resolution.width, resolution.height)
        .min_size(400, 300);

    if resolution.fullscreen {
        win = win.fullscreen();
    }

    let window_id = win
        .build()
        .unwrap_or_else(|e| fatal(format!("could not create window: {:?}", e)));

    // Hide cursor in fullscreen mode
    if resolution.fullscreen {
        if let Some(window) = app.window(window_id) {
            window.set_cursor_visible(false);
        }
    }

    let config = Config::load();
    let controls = config.controls();
    let preset = args
        .preset
        .as_deref()
        .map(Preset::by_name)
        .unwrap_or_else(|| config.preset());

    let buffer = SampleBuffer::shared(FFT_SIZE * 2, DEFAULT_SAMPLE_RATE);
    let (input, input_error) = match open_input(&args, &buffer, &config) {
        Ok(input) => (input, None),
        Err(e) => {
            // Keep the window up; the pipeline holds on silence.
            warn!("{:#}", e);
            (Input::Stopped, Some(format!("{:#}", e)))
        }
    };

    let sample_rate = buffer
        .lock()
        .map(|b| b.sample_rate())
        .unwrap_or(DEFAULT_SAMPLE_RATE);
    let source = AnalyserSource::new(SharedBuffer::clone(&buffer), sample_rate);
    let (driver, blank) = Driver::start(source, &config, controls, preset, args.threaded)
        .unwrap_or_else(|e| fatal(format!("{:#}", e)));

    let mut renderer = SceneRenderer::new(blank);
    renderer.show_notification(match input_error {
        Some(e) => e,
        None => format!("{} | {}", preset.name, input.label()),
    });

    let watcher = Config::path().and_then(|path| {
        ConfigWatcher::new(path, config.clone())
            .map_err(|e| warn!("Config hot reload disabled: {}", e))
            .ok()
    });

    info!("Started: preset '{}', input '{}'", preset.name, input.label());

    Model {
        input,
        handle: driver.handle(),
        driver,
        renderer,
        config,
        watcher,
        controls,
        preset,
        picker: PresetPicker::new(),
        help_overlay: HelpOverlay::new(),
        control_panel: ControlPanel::new(),
    }
}

fn update(_app: &App, model: &mut Model, _update: Update) {
    if let Some(change) = model.watcher.as_mut().and_then(ConfigWatcher::poll) {
        apply_live_change(model, change);
    }

    model.driver.drive(&mut model.renderer);
    model.renderer.step();
}

/// Forward config file edits; they land at the next tick boundary.
fn apply_live_change(model: &mut Model, change: LiveChange) {
    if let Some(controls) = change.controls {
        model.controls = controls;
        model.config.controls = controls;
        model.handle.set_controls(controls);
    }
    if let Some(preset) = change.preset {
        model.config.preset = Some(preset.name.to_string());
        set_preset(model, preset);
    }
    model
        .renderer
        .show_notification("Config reloaded".to_string());
}

fn view(app: &App, model: &Model, frame: Frame) {
    let bounds = app.window_rect();
    let draw = app.draw();

    model.renderer.draw(&draw, bounds, frame.nth() == 0);
    model.renderer.draw_notification(&draw, bounds);
    model.control_panel.draw(
        &draw,
        bounds,
        &model.controls,
        &model.preset,
        &model.renderer.params().features,
    );

    model.picker.draw(&draw, bounds, &model.preset);
    model.help_overlay.draw(&draw, bounds, &model.input.label());

    if let Err(e) = draw.to_frame(app, &frame) {
        warn!("Frame draw failed: {:?}", e);
    }
}

fn key_pressed(app: &App, model: &mut Model, key: Key) {
    let action = parse_key(key, app.keys.mods.shift(), model.picker.active);

    match action {
        Some(Action::Quit) => app.quit(),
        Some(Action::ShowHelp) => {
            model.help_overlay.toggle();
            model.picker.hide(); // Close picker when showing help
        }
        Some(Action::ToggleHud) => model.control_panel.toggle(),

        // Preset picker
        Some(Action::PickerShow) => {
            model.help_overlay.hide();
            model.picker.show(&model.preset);
        }
        Some(Action::PickerHide) => model.picker.hide(),
        Some(Action::PickerMoveUp) => model.picker.move_up(),
        Some(Action::PickerMoveDown) => model.picker.move_down(),
        Some(Action::PickerSelect) => {
            let preset = model.picker.selected();
            set_preset(model, preset);
            model.picker.hide();
        }

        // Controls
        Some(Action::NextPreset) => {
            let next = model.preset.next();
            set_preset(model, next);
        }
        Some(Action::ToggleRings) => {
            let on = !model.controls.onset_rings;
            update_control(model, ControlUpdate::OnsetRings(on));
            let state = if on { "on" } else { "off" };
            model
                .renderer
                .show_notification(format!("Onset rings: {}", state));
        }
        Some(Action::TogglePitchColor) => {
            let on = !model.controls.pitch_to_color;
            update_control(model, ControlUpdate::PitchToColor(on));
            let state = if on { "on" } else { "off" };
            model
                .renderer
                .show_notification(format!("Pitch to color: {}", state));
        }
        Some(Action::SelectNextControl) => model.control_panel.select_next(),
        Some(Action::SelectPrevControl) => model.control_panel.select_prev(),
        Some(Action::IncreaseControl) => {
            let update = model.control_panel.nudge(&model.controls, 1.0);
            update_control(model, update);
        }
        Some(Action::DecreaseControl) => {
            let update = model.control_panel.nudge(&model.controls, -1.0);
            update_control(model, update);
        }
        Some(Action::ApplyBloomDefault) => {
            let bloom = model.preset.bloom_default;
            update_control(model, ControlUpdate::Bloom(bloom));
            model
                .renderer
                .show_notification(format!("Bloom: {:.2}", bloom));
        }

        // Input
        Some(Action::StopInput) => stop_input(model),
        Some(Action::SelectDevice(idx)) => select_device(model, idx),

        None => {} // Unhandled key
    }
}

fn update_control(model: &mut Model, update: ControlUpdate) {
    model.controls.apply(update);
    model.handle.update_control(update);
}

fn set_preset(model: &mut Model, preset: Preset) {
    model.preset = preset;
    model.handle.set_preset(preset);
    model
        .renderer
        .show_notification(format!("{}: {}", preset.name, preset.description));
}

fn stop_input(model: &mut Model) {
    if matches!(model.input, Input::Stopped) && !model.handle.is_alive() {
        return;
    }
    model.input.stop();
    model.handle.stop();
    info!("Input stopped");
    model
        .renderer
        .show_notification("Input stopped".to_string());
}

fn select_device(model: &mut Model, idx: usize) {
    let result = match &mut model.input {
        Input::Device(pipe) => pipe.select_device(idx, &mut model.config),
        Input::File(_) => {
            model
                .renderer
                .show_notification("Playing a file; device switching is off".to_string());
            return;
        }
        Input::Stopped => {
            model
                .renderer
                .show_notification("Input stopped".to_string());
            return;
        }
    };

    let msg = match result {
        Some((name, true)) => {
            // New signal: drop flux history so the switch is not an onset
            model.handle.reset();
            format!("[{}] {}", idx, name)
        }
        Some((name, false)) => format!("[{}] {} - FAILED", idx, name),
        None => format!("[{}] - INVALID", idx),
    };
    model.renderer.show_notification(msg);
}

fn exit(_app: &App, mut model: Model) {
    model.handle.stop();
    model.driver.stop();
    model.input.stop();
    info!("Presented {} frames", model.renderer.presented());
}
