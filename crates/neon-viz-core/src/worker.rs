//! Threaded analysis: a [`FrameLoop`] on its own thread.
//!
//! The analysis state never leaves the worker thread. Each analysed tick is
//! handed to the consumer as a complete [`VisualParameters`] value over a
//! bounded single-producer/single-consumer channel; consumed values can be
//! sent back through [`AnalysisWorker::recycle`] so steady state does not
//! allocate.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use tracing::{debug, info, warn};

use crate::frame::AudioSource;
use crate::frame_loop::{FrameLoop, LoopHandle, TickOutcome};
use crate::mapper::VisualParameters;

/// Parameters buffered between worker and consumer.
const CHANNEL_DEPTH: usize = 2;

pub struct AnalysisWorker {
    handle: LoopHandle,
    params_rx: Receiver<VisualParameters>,
    recycle_tx: Sender<VisualParameters>,
    thread: Option<JoinHandle<()>>,
}

impl AnalysisWorker {
    /// Move `frame_loop` onto a new thread ticking every `interval`.
    pub fn spawn<S>(frame_loop: FrameLoop<S>, interval: Duration) -> std::io::Result<Self>
    where
        S: AudioSource + Send + 'static,
    {
        let handle = frame_loop.handle();
        let (params_tx, params_rx) = crossbeam_channel::bounded(CHANNEL_DEPTH);
        let (recycle_tx, recycle_rx) = crossbeam_channel::bounded(CHANNEL_DEPTH + 1);

        let thread = thread::Builder::new()
            .name("neon-analysis".into())
            .spawn(move || run(frame_loop, interval, params_tx, recycle_rx))?;

        info!("Analysis worker started ({:?} interval)", interval);
        Ok(Self {
            handle,
            params_rx,
            recycle_tx,
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    pub fn receiver(&self) -> &Receiver<VisualParameters> {
        &self.params_rx
    }

    /// Newest pending parameters, if any. Older pending values are recycled.
    pub fn latest(&self) -> Option<VisualParameters> {
        let mut newest = None;
        while let Ok(params) = self.params_rx.try_recv() {
            if let Some(older) = newest.replace(params) {
                self.recycle(older);
            }
        }
        newest
    }

    /// Return a consumed value for reuse.
    pub fn recycle(&self, params: VisualParameters) {
        let _ = self.recycle_tx.try_send(params);
    }

    /// Stop the loop and wait for the thread to exit.
    pub fn stop(&mut self) {
        self.handle.stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Analysis worker panicked");
            } else {
                debug!("Analysis worker joined");
            }
        }
    }
}

impl Drop for AnalysisWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<S: AudioSource>(
    mut frame_loop: FrameLoop<S>,
    interval: Duration,
    params_tx: Sender<VisualParameters>,
    recycle_rx: Receiver<VisualParameters>,
) {
    loop {
        match frame_loop.advance() {
            TickOutcome::Stopped => break,
            TickOutcome::Held => {}
            TickOutcome::Rendered => {
                let out = match recycle_rx.try_recv() {
                    Ok(mut reused) => {
                        reused.clone_from(frame_loop.params());
                        reused
                    }
                    Err(_) => frame_loop.params().clone(),
                };
                // Re-check so nothing is handed over after a stop.
                if !frame_loop.is_alive() {
                    break;
                }
                // Full: the consumer is behind and still holds a recent value.
                if let Err(TrySendError::Disconnected(_)) = params_tx.try_send(out) {
                    frame_loop.stop();
                    break;
                }
            }
        }
        thread::sleep(interval);
    }
    debug!("Analysis thread exiting after {} ticks", frame_loop.ticks());
}
