//! Device capture into the shared sample buffer.
//!
//! Both input devices and output devices (loopback, on hosts that allow
//! it) are offered; the number keys index into the combined list.

use std::fmt;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use neon_viz_core::SourceError;
use tracing::{debug, error, info, warn};

use super::sample_buffer::{lock, SharedBuffer};
use crate::utils::Config;

/// Device names tried, in order, when nothing was saved.
const PREFERRED_INPUTS: [&str; 2] = ["pipewire", "pulse"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DeviceKind {
    Input,
    Output,
}

impl DeviceKind {
    fn from_is_input(is_input: bool) -> Self {
        if is_input {
            DeviceKind::Input
        } else {
            DeviceKind::Output
        }
    }

    fn is_input(self) -> bool {
        self == DeviceKind::Input
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Input => write!(f, "input"),
            DeviceKind::Output => write!(f, "output"),
        }
    }
}

struct Endpoint {
    device: Device,
    name: String,
    kind: DeviceKind,
}

/// Index of the device to open first: the saved one, then a preferred
/// sound server input, then the host default input, then the first entry.
fn pick_start_device<'a>(
    entries: impl Iterator<Item = (&'a str, DeviceKind)> + Clone,
    saved: Option<(&str, DeviceKind)>,
    default_input: Option<&str>,
) -> usize {
    let find = |name: &str, kind: DeviceKind| entries.clone().position(|e| e == (name, kind));

    saved
        .and_then(|(name, kind)| find(name, kind))
        .or_else(|| {
            PREFERRED_INPUTS
                .iter()
                .find_map(|name| find(*name, DeviceKind::Input))
        })
        .or_else(|| default_input.and_then(|name| find(name, DeviceKind::Input)))
        .unwrap_or(0)
}

/// Owns the capture stream. Stays on the thread that created it.
pub struct SourcePipe {
    buffer: SharedBuffer,
    endpoints: Vec<Endpoint>,
    active: usize,
    stream: Option<Stream>,
}

impl SourcePipe {
    /// Open the saved device, or the best guess, feeding `buffer`.
    pub fn new(buffer: SharedBuffer, config: &Config) -> Result<Self, SourceError> {
        let endpoints = enumerate();
        if endpoints.is_empty() {
            return Err(SourceError::NoDevice);
        }

        let saved = config.last_device.as_deref().map(|name| {
            let kind = DeviceKind::from_is_input(config.last_device_is_input.unwrap_or(true));
            (name, kind)
        });
        let default_input = cpal::default_host()
            .default_input_device()
            .and_then(|d| d.name().ok());
        let active = pick_start_device(
            endpoints.iter().map(|e| (e.name.as_str(), e.kind)),
            saved,
            default_input.as_deref(),
        );

        let endpoint = &endpoints[active];
        let timeout = Duration::from_secs(config.device_timeout_secs());
        let stream = open_stream(endpoint, &buffer, timeout)?;
        info!("[{}] Capturing {} ({})", active, endpoint.name, endpoint.kind);

        Ok(Self {
            buffer,
            endpoints,
            active,
            stream: Some(stream),
        })
    }

    /// Log the numbered device list.
    pub fn list_devices() {
        info!("=== Audio Devices ===");
        for (idx, e) in enumerate().iter().enumerate() {
            info!("  [{}] {} ({})", idx, e.name, e.kind);
        }
        info!("Use 0-9 (Shift for +10) to switch devices");
    }

    pub fn current_name(&self) -> &str {
        &self.endpoints[self.active].name
    }

    /// Switch capture to device `index`.
    ///
    /// `None` when the index is out of range, otherwise the device name and
    /// whether its stream started. A working choice is saved to `config`.
    pub fn select_device(&mut self, index: usize, config: &mut Config) -> Option<(String, bool)> {
        let endpoint = self.endpoints.get(index)?;
        let name = endpoint.name.clone();
        if index == self.active && self.stream.is_some() {
            return Some((name, true));
        }

        info!("[{}] Switching to {} ({})", index, name, endpoint.kind);
        match lock(&self.buffer) {
            Ok(mut buf) => buf.clear(),
            Err(e) => warn!("Could not clear sample buffer: {}", e),
        }

        let timeout = Duration::from_secs(config.device_timeout_secs());
        match open_stream(endpoint, &self.buffer, timeout) {
            Ok(stream) => {
                self.stream = Some(stream);
                self.active = index;
                config.set_device(&name, endpoint.kind.is_input());
                Some((name, true))
            }
            Err(e) => {
                warn!("[{}] {} failed: {}", index, name, e);
                Some((name, false))
            }
        }
    }

    /// Drop the stream; the buffer stops receiving samples.
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            debug!("Capture stream closed");
        }
    }
}

fn enumerate() -> Vec<Endpoint> {
    let host = cpal::default_host();
    let named = |kind: DeviceKind| {
        move |device: Device| {
            device.name().ok().map(|name| Endpoint { device, name, kind })
        }
    };

    let mut endpoints: Vec<Endpoint> = match host.input_devices() {
        Ok(devices) => devices.filter_map(named(DeviceKind::Input)).collect(),
        Err(e) => {
            warn!("Could not list input devices: {}", e);
            Vec::new()
        }
    };
    match host.output_devices() {
        Ok(devices) => endpoints.extend(devices.filter_map(named(DeviceKind::Output))),
        Err(e) => warn!("Could not list output devices: {}", e),
    }
    endpoints
}

fn open_stream(
    endpoint: &Endpoint,
    buffer: &SharedBuffer,
    timeout: Duration,
) -> Result<Stream, SourceError> {
    let stream_config = probe_config(&endpoint.device, endpoint.kind, timeout)?;
    let channels = stream_config.channels as usize;
    lock(buffer)?.set_sample_rate(stream_config.sample_rate.0);
    debug!(
        "{}: {} ch @ {} Hz",
        endpoint.name, channels, stream_config.sample_rate.0
    );

    let sink = SharedBuffer::clone(buffer);
    let stream = endpoint
        .device
        .build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                // A poisoned lock is reported by the analysis side.
                if let Ok(mut buf) = sink.lock() {
                    buf.push_interleaved(data, channels);
                }
            },
            |err| error!("Capture stream error: {}", err),
            None,
        )
        .map_err(|e| SourceError::Stream(e.to_string()))?;

    stream
        .play()
        .map_err(|e| SourceError::Stream(e.to_string()))?;
    Ok(stream)
}

/// Ask for the device's default config on a helper thread. Some backends
/// hang here on broken devices.
pub(super) fn probe_config(
    device: &Device,
    kind: DeviceKind,
    timeout: Duration,
) -> Result<StreamConfig, SourceError> {
    let device = device.clone();
    let (tx, rx) = crossbeam_channel::bounded(1);

    thread::spawn(move || {
        let config = match kind {
            DeviceKind::Input => device.default_input_config(),
            DeviceKind::Output => device.default_output_config(),
        };
        let _ = tx.send(config);
    });

    match rx.recv_timeout(timeout) {
        Ok(Ok(config)) => Ok(config.into()),
        Ok(Err(e)) => Err(SourceError::Device(e.to_string())),
        Err(_) => Err(SourceError::Device(format!(
            "no config after {:?}",
            timeout
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICES: [(&str, DeviceKind); 5] = [
        ("default", DeviceKind::Input),
        ("hw:USB", DeviceKind::Input),
        ("pulse", DeviceKind::Input),
        ("pulse", DeviceKind::Output),
        ("speakers", DeviceKind::Output),
    ];

    fn pick(saved: Option<(&str, DeviceKind)>, default_input: Option<&str>) -> usize {
        pick_start_device(DEVICES.iter().copied(), saved, default_input)
    }

    #[test]
    fn test_saved_device_wins() {
        assert_eq!(pick(Some(("pulse", DeviceKind::Output)), Some("hw:USB")), 3);
        assert_eq!(pick(Some(("speakers", DeviceKind::Output)), None), 4);
    }

    #[test]
    fn test_saved_kind_must_match() {
        // No "speakers" input, so fall through to the sound server
        assert_eq!(pick(Some(("speakers", DeviceKind::Input)), None), 2);
    }

    #[test]
    fn test_fallback_order() {
        assert_eq!(pick(None, Some("hw:USB")), 2);
        let no_server = [("default", DeviceKind::Input), ("hw:USB", DeviceKind::Input)];
        assert_eq!(pick_start_device(no_server.iter().copied(), None, Some("hw:USB")), 1);
        assert_eq!(pick_start_device(no_server.iter().copied(), None, None), 0);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(DeviceKind::from_is_input(false).to_string(), "output");
        assert!(DeviceKind::Input.is_input());
    }
}
