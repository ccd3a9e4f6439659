//! Hot reload of live settings from the config file.
//!
//! Only `[controls]` and `preset` are live; the rest is read at startup.
//! Device saves rewrite the file too, so changes are diffed against the
//! last snapshot and only real edits are forwarded.

use std::path::{Path, PathBuf};

use crossbeam_channel::{Receiver, Sender};
use neon_viz_core::{ControlConfig, Preset};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use super::config::Config;

/// Live settings that changed on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveChange {
    pub controls: Option<ControlConfig>,
    pub preset: Option<Preset>,
}

/// Compare two snapshots; `None` when nothing live changed.
pub fn diff(old: &Config, new: &Config) -> Option<LiveChange> {
    let controls = (new.controls() != old.controls()).then(|| new.controls());
    let preset = (new.preset().name != old.preset().name).then(|| new.preset());
    if controls.is_none() && preset.is_none() {
        None
    } else {
        Some(LiveChange { controls, preset })
    }
}

pub struct ConfigWatcher {
    // Dropping the watcher stops the notify thread.
    _watcher: RecommendedWatcher,
    events: Receiver<()>,
    path: PathBuf,
    snapshot: Config,
}

impl ConfigWatcher {
    /// Watch `path`. The parent directory is watched so editors that
    /// replace the file on save are still seen.
    pub fn new(path: PathBuf, snapshot: Config) -> notify::Result<Self> {
        let (tx, rx) = crossbeam_channel::bounded(16);
        let file_name = path.file_name().map(|n| n.to_os_string());

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            forward(res, file_name.as_deref(), &tx)
        })?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        info!("Watching {:?} for changes", path);

        Ok(Self {
            _watcher: watcher,
            events: rx,
            path,
            snapshot,
        })
    }

    /// Call once per frame. Reloads the file if it was touched and returns
    /// whatever live settings differ from the previous load.
    pub fn poll(&mut self) -> Option<LiveChange> {
        let mut touched = false;
        while self.events.try_recv().is_ok() {
            touched = true;
        }
        if !touched {
            return None;
        }

        match Config::load_from(&self.path) {
            Ok(config) => {
                let change = diff(&self.snapshot, &config);
                self.snapshot = config;
                if let Some(ref change) = change {
                    debug!("Config change: {:?}", change);
                }
                change
            }
            Err(e) => {
                // Half-written files are common mid-save; keep the old values.
                warn!("Config reload skipped: {}", e);
                None
            }
        }
    }
}

fn forward(res: notify::Result<Event>, file_name: Option<&std::ffi::OsStr>, tx: &Sender<()>) {
    let event = match res {
        Ok(event) => event,
        Err(e) => {
            warn!("Config watch error: {}", e);
            return;
        }
    };
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return;
    }
    let ours = event
        .paths
        .iter()
        .any(|p| p.file_name() == file_name);
    if ours {
        // Full channel means a reload is already pending.
        let _ = tx.try_send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_ignores_device_changes() {
        let old = Config::default();
        let mut new = old.clone();
        new.last_device = Some("pulse".into());
        assert_eq!(diff(&old, &new), None);
    }

    #[test]
    fn test_diff_reports_controls_and_preset() {
        let old = Config::default();
        let mut new = old.clone();
        new.controls.bloom = 0.2;
        new.preset = Some("Aurora Ribbons".into());

        let change = diff(&old, &new).unwrap();
        assert_eq!(change.controls.map(|c| c.bloom), Some(0.2));
        assert_eq!(change.preset.map(|p| p.name), Some("Aurora Ribbons"));
    }

    #[test]
    fn test_diff_compares_clamped_values() {
        let old = Config::default();
        let mut new = old.clone();
        new.controls.sensitivity = 1.0;
        let mut newer = new.clone();
        newer.controls.sensitivity = 5.0;
        assert_eq!(diff(&new, &newer), None);
    }
}
