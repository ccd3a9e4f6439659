//! Audio system diagnostics for Unix platforms.
//!
//! Reports the PulseAudio/PipeWire setup and the devices cpal can open,
//! so a silent visualizer can be traced to the wrong capture source.

use std::process::Command;

use cpal::traits::{DeviceTrait, HostTrait};
use tracing::{info, warn};

/// Logs audio server state and the devices visible to cpal
pub fn log_audio_info() {
    info!("=== Audio System Diagnostics ===");

    info!("--- Audio Server ---");
    for server in ["pipewire", "pulseaudio"] {
        if is_running(server) {
            info!("{}: running", server);
            run_cmd(server, &["--version"]);
        } else {
            info!("{}: not running", server);
        }
    }

    info!("--- Default Devices ---");
    run_cmd("pactl", &["get-default-sink"]);
    run_cmd("pactl", &["get-default-source"]);

    // Capturing what the speakers play needs a monitor source
    info!("--- Monitor Sources ---");
    match Command::new("pactl").args(["list", "sources", "short"]).output() {
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let monitors: Vec<&str> = stdout.lines().filter(|l| l.contains(".monitor")).collect();
            if monitors.is_empty() {
                info!("  (none found - you may need to create a loopback)");
            }
            for line in monitors {
                info!("  {}", line);
            }
        }
        Err(_) => info!("  (pactl not found)"),
    }

    info!("--- cpal ---");
    let host = cpal::default_host();
    info!("Host: {:?}", host.id());
    let default_input = host.default_input_device().and_then(|d| d.name().ok());
    let default_output = host.default_output_device().and_then(|d| d.name().ok());
    info!("Default input: {}", default_input.as_deref().unwrap_or("(none)"));
    info!("Default output: {}", default_output.as_deref().unwrap_or("(none)"));

    match host.input_devices() {
        Ok(devices) => {
            for device in devices {
                let name = device.name().unwrap_or_else(|_| "(unnamed)".into());
                match device.default_input_config() {
                    Ok(config) => info!(
                        "  in  {} ({} ch @ {} Hz)",
                        name,
                        config.channels(),
                        config.sample_rate().0
                    ),
                    Err(e) => warn!("  in  {} (no default config: {})", name, e),
                }
            }
        }
        Err(e) => warn!("Could not enumerate input devices: {}", e),
    }

    info!("=== End Diagnostics ===");
}

fn is_running(process: &str) -> bool {
    Command::new("pgrep")
        .arg("-x")
        .arg(process)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn run_cmd(cmd: &str, args: &[&str]) {
    match Command::new(cmd).args(args).output() {
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            for line in stdout.lines() {
                info!("  {}", line);
            }
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.is_empty() && !output.status.success() {
                warn!("  (error: {})", stderr.trim());
            }
        }
        Err(_) => info!("  ({} not found)", cmd),
    }
}
