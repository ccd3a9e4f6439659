//! Onset-rings policy: rings spawned on onsets that grow and fade.

use tracing::trace;

use super::{MapInput, MappingPolicy, VisualParameters};
use crate::config::RingsConfig;

/// Upper bound on the preallocated ring set.
const MAX_RING_CAPACITY: usize = 4096;

/// An animated onset marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingInstance {
    /// Ticks since spawn
    pub age: u32,
    pub radius: f32,
    pub opacity: f32,
}

pub struct RingsPolicy {
    config: RingsConfig,
    active: Vec<RingInstance>,
}

impl RingsPolicy {
    pub fn new(config: RingsConfig) -> Self {
        let capacity = lifetime_bound(&config);
        Self {
            config,
            active: Vec::with_capacity(capacity),
        }
    }

    pub fn active(&self) -> &[RingInstance] {
        &self.active
    }

    pub fn capacity(&self) -> usize {
        self.active.capacity()
    }

    fn spawn(&mut self) {
        self.active.push(RingInstance {
            age: 0,
            radius: self.config.initial_radius,
            opacity: self.config.initial_opacity,
        });
    }

    /// Mirror the active set into `out` without advancing it, clearing it
    /// first if rings are switched off.
    pub fn sync(&mut self, onset_rings: bool, out: &mut VisualParameters) {
        if !onset_rings {
            self.active.clear();
        }
        out.rings.clear();
        out.rings.extend_from_slice(&self.active);
    }

    /// Advance every ring one tick and drop the expired ones.
    fn advance(&mut self) {
        let RingsConfig {
            speed,
            decay,
            max_radius,
            ..
        } = self.config;

        for ring in &mut self.active {
            ring.age = ring.age.saturating_add(1);
            ring.radius += speed;
            ring.opacity -= decay;
        }
        self.active
            .retain(|ring| ring.radius <= max_radius && ring.opacity > 0.0);
    }
}

impl MappingPolicy for RingsPolicy {
    fn map(&mut self, input: &MapInput<'_>, out: &mut VisualParameters) {
        if !input.controls.onset_rings {
            self.active.clear();
            out.rings.clear();
            return;
        }

        if input.onset.is_some() {
            self.spawn();
            trace!("ring spawned, {} active", self.active.len());
        }
        self.advance();

        out.rings.clear();
        out.rings.extend_from_slice(&self.active);
    }

    fn reset(&mut self) {
        self.active.clear();
    }
}

/// How many rings can be alive at once: at most one spawn per tick, so the
/// lifetime in ticks bounds the set.
fn lifetime_bound(config: &RingsConfig) -> usize {
    let by_radius = if config.speed > 0.0 {
        ((config.max_radius - config.initial_radius) / config.speed).max(0.0)
    } else {
        f32::INFINITY
    };
    let by_opacity = if config.decay > 0.0 {
        (config.initial_opacity / config.decay).max(0.0)
    } else {
        f32::INFINITY
    };
    let ticks = by_radius.min(by_opacity);
    if ticks.is_finite() {
        // +2 absorbs float rounding at the boundary
        (ticks.ceil() as usize + 2).min(MAX_RING_CAPACITY)
    } else {
        MAX_RING_CAPACITY
    }
}
