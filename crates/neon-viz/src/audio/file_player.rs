//! Looped WAV playback through the default output device.
//!
//! The output callback writes each sample to the speakers and to the
//! shared analysis buffer, so what you see matches what you hear.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Stream;
use neon_viz_core::SourceError;
use tracing::{error, info, warn};

use super::sample_buffer::{lock, SharedBuffer};
use super::source_pipe::{probe_config, DeviceKind};

/// A decoded mono track
pub struct Track {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Track {
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate.max(1) as f64)
    }
}

/// Decode a WAV file to mono f32 in [-1, 1].
pub fn decode_wav(path: &Path) -> Result<Track, SourceError> {
    let reader = hound::WavReader::open(path)
        .map_err(|e| SourceError::Decode(format!("{}: {}", path.display(), e)))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| SourceError::Decode(e.to_string()))?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .map_err(|e| SourceError::Decode(e.to_string()))?
        }
    };

    let samples: Vec<f32> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    if samples.is_empty() {
        return Err(SourceError::Decode(format!("{}: no samples", path.display())));
    }

    Ok(Track {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Looping read position with sample-rate conversion by nearest sample.
#[derive(Debug, Clone, Copy)]
pub struct Playhead {
    pos: f64,
    step: f64,
}

impl Playhead {
    pub fn new(track_rate: u32, device_rate: u32) -> Self {
        Self {
            pos: 0.0,
            step: track_rate as f64 / device_rate.max(1) as f64,
        }
    }

    pub fn next(&mut self, samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let len = samples.len() as f64;
        let sample = samples[(self.pos as usize).min(samples.len() - 1)];
        self.pos += self.step;
        if self.pos >= len {
            self.pos %= len;
        }
        sample
    }
}

/// Owns the playback stream. Stays on the thread that created it.
pub struct FilePlayer {
    name: String,
    _stream: Option<Stream>,
}

impl FilePlayer {
    pub fn open(path: &Path, buffer: SharedBuffer, timeout: Duration) -> Result<Self, SourceError> {
        let track = decode_wav(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let device = cpal::default_host()
            .default_output_device()
            .ok_or(SourceError::NoDevice)?;
        let config = probe_config(&device, DeviceKind::Output, timeout)?;
        let channels = config.channels.max(1) as usize;
        let device_rate = config.sample_rate.0;

        if device_rate != track.sample_rate {
            warn!(
                "Resampling {} from {} Hz to {} Hz",
                name, track.sample_rate, device_rate
            );
        }
        lock(&buffer)?.set_sample_rate(device_rate);

        info!("Playing {} ({:.1}s, looped)", name, track.duration().as_secs_f32());
        let mut playhead = Playhead::new(track.sample_rate, device_rate);
        let samples: Arc<[f32]> = track.samples.into();

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut analysis = buffer.lock().ok();
                    for frame in data.chunks_mut(channels) {
                        let sample = playhead.next(&samples);
                        frame.fill(sample);
                        if let Some(buf) = analysis.as_mut() {
                            buf.push(sample);
                        }
                    }
                },
                |err| error!("Playback stream error: {}", err),
                None,
            )
            .map_err(|e| SourceError::Stream(e.to_string()))?;
        stream
            .play()
            .map_err(|e| SourceError::Stream(e.to_string()))?;

        Ok(Self {
            name,
            _stream: Some(stream),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stop(&mut self) {
        self._stream = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playhead_loops() {
        let samples = [0.1, 0.2, 0.3];
        let mut head = Playhead::new(44100, 44100);
        let out: Vec<f32> = (0..5).map(|_| head.next(&samples)).collect();
        assert_eq!(out, vec![0.1, 0.2, 0.3, 0.1, 0.2]);
    }

    #[test]
    fn test_playhead_resamples() {
        let samples = [0.0, 1.0, 2.0, 3.0];
        // Track at half the device rate: each sample plays twice
        let mut head = Playhead::new(22050, 44100);
        let out: Vec<f32> = (0..8).map(|_| head.next(&samples)).collect();
        assert_eq!(out, vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn test_decode_wav_downmixes() {
        let path = std::env::temp_dir().join(format!("neon-viz-decode-{}.wav", std::process::id()));
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..100 {
            writer.write_sample(i16::MAX).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let track = decode_wav(&path).unwrap();
        assert_eq!(track.sample_rate, 8000);
        assert_eq!(track.samples.len(), 100);
        assert!((track.samples[0] - 0.5).abs() < 1e-3);
        assert!((track.duration().as_secs_f64() - 0.0125).abs() < 1e-9);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_decode_missing_file() {
        let result = decode_wav(Path::new("/nonexistent/neon-viz.wav"));
        assert!(matches!(result, Err(SourceError::Decode(_))));
    }
}
