//! Marker lifecycle: collision-free spawning, absorption, staleness.

use crate::ForagerConfig;
use crate::geometry::Vec2;
use rand::{Rng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by world construction and marker placement.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// No collision-free marker position was found within the attempt cap.
    #[error("arena saturated: no collision-free marker position after {attempts} attempts")]
    Saturated { attempts: u32 },
}

/// Category assigned to a marker once, at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerKind {
    Beneficial,
    Harmful,
}

/// A circular marker. Markers are recycled by relocation, never deleted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Marker {
    pub position: Vec2,
    pub kind: MarkerKind,
    /// Ticks since the marker was last relocated.
    pub age: u32,
}

/// The arena and its markers.
#[derive(Debug, Clone)]
pub struct World {
    extent: f32,
    marker_radius: f32,
    beneficial_bias: f32,
    spawn_attempt_cap: u32,
    stale_age: u32,
    relocation_interval: u32,
    relocation_chance: f32,
    markers: Vec<Marker>,
}

impl World {
    /// Build a world and fill it with the configured number of
    /// collision-free markers.
    pub fn populate(config: &ForagerConfig, rng: &mut SmallRng) -> Result<Self, WorldError> {
        let mut world = Self {
            extent: config.arena_extent,
            marker_radius: config.marker_radius,
            beneficial_bias: config.beneficial_bias,
            spawn_attempt_cap: config.spawn_attempt_cap,
            stale_age: config.stale_age,
            relocation_interval: config.relocation_interval,
            relocation_chance: config.relocation_chance,
            markers: Vec::with_capacity(config.marker_count),
        };
        for _ in 0..config.marker_count {
            world.spawn_marker(rng)?;
        }
        Ok(world)
    }

    /// Rejection-sample a position clear of every existing marker.
    ///
    /// A candidate is rejected while it lies within twice the marker radius
    /// of an existing marker on *both* axes. Attempts are capped so a
    /// saturated arena surfaces as an error instead of an unbounded loop.
    fn sample_position(&self, rng: &mut SmallRng) -> Result<Vec2, WorldError> {
        let lo = self.marker_radius;
        let hi = self.extent - self.marker_radius;
        for _ in 0..self.spawn_attempt_cap {
            let candidate = Vec2::new(rng.random_range(lo..hi), rng.random_range(lo..hi));
            let blocked = self.markers.iter().any(|marker| {
                (marker.position.x - candidate.x).abs() < self.marker_radius * 2.0
                    && (marker.position.y - candidate.y).abs() < self.marker_radius * 2.0
            });
            if !blocked {
                return Ok(candidate);
            }
        }
        Err(WorldError::Saturated {
            attempts: self.spawn_attempt_cap,
        })
    }

    /// Spawn a fresh marker, returning its index.
    pub fn spawn_marker(&mut self, rng: &mut SmallRng) -> Result<usize, WorldError> {
        let position = self.sample_position(rng)?;
        let kind = if rng.random::<f32>() < self.beneficial_bias {
            MarkerKind::Beneficial
        } else {
            MarkerKind::Harmful
        };
        self.markers.push(Marker {
            position,
            kind,
            age: 0,
        });
        Ok(self.markers.len() - 1)
    }

    /// Move the marker at `index` to a fresh position, resetting its age.
    /// The category is retained.
    pub fn relocate(&mut self, index: usize, rng: &mut SmallRng) -> Result<(), WorldError> {
        let position = self.sample_position(rng)?;
        let marker = &mut self.markers[index];
        marker.position = position;
        marker.age = 0;
        Ok(())
    }

    /// Age every marker one tick, relocating stale ones on the periodic
    /// cadence with a small independent probability. Returns the indices
    /// that were relocated.
    pub fn age_tick(&mut self, tick: u64, rng: &mut SmallRng) -> Result<Vec<usize>, WorldError> {
        let mut relocated = Vec::new();
        for index in 0..self.markers.len() {
            let stale = self.markers[index].age > self.stale_age;
            if stale
                && tick % u64::from(self.relocation_interval) == 0
                && rng.random::<f32>() < self.relocation_chance
            {
                self.relocate(index, rng)?;
                relocated.push(index);
            } else {
                self.markers[index].age += 1;
            }
        }
        Ok(relocated)
    }

    /// Indices of markers absorbed by an agent at `center`.
    ///
    /// A marker is absorbed iff its center falls strictly inside the
    /// axis-aligned square of half-side `radius` centered on the agent.
    /// Overlapping circles without center containment do not count.
    #[must_use]
    pub fn absorbed_by(&self, center: Vec2, radius: f32) -> Vec<usize> {
        self.markers
            .iter()
            .enumerate()
            .filter(|(_, marker)| {
                center.x - radius < marker.position.x
                    && marker.position.x < center.x + radius
                    && center.y - radius < marker.position.y
                    && marker.position.y < center.y + radius
            })
            .map(|(index, _)| index)
            .collect()
    }

    /// Side length of the square arena.
    #[must_use]
    pub const fn extent(&self) -> f32 {
        self.extent
    }

    /// Radius shared by every marker.
    #[must_use]
    pub const fn marker_radius(&self) -> f32 {
        self.marker_radius
    }

    /// Immutable access to the markers.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Mutable access to the markers (scenario setup and tests).
    #[must_use]
    pub fn markers_mut(&mut self) -> &mut Vec<Marker> {
        &mut self.markers
    }
}
