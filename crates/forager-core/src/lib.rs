//! Core types shared across the forager workspace.
//!
//! A single agent senses a bounded square arena through a fan of directional
//! eye rays and learns, with a tabular Q-learner, to collect beneficial
//! markers while avoiding harmful ones and the boundary. Rendering and
//! pacing live outside this crate behind the [`sim::RenderSink`] contract.

pub mod agent;
pub mod geometry;
pub mod perception;
pub mod qlearn;
pub mod sim;
pub mod world;

use rand::{SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};

pub use agent::{Agent, NUM_EYES};
pub use geometry::{Segment, Vec2};
pub use perception::{Detection, DetectionState, sense};
pub use qlearn::{Action, ModelError, QLearner};
pub use sim::{Mode, NullSink, RenderFrame, RenderSink, Simulation, TickReport};
pub use world::{Marker, MarkerKind, World, WorldError};

/// Static configuration for a forager run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForagerConfig {
    /// Side length of the square arena in normalized units.
    pub arena_extent: f32,
    /// Number of markers kept alive in the arena.
    pub marker_count: usize,
    /// Radius of every marker.
    pub marker_radius: f32,
    /// Probability that a freshly spawned marker is beneficial.
    pub beneficial_bias: f32,
    /// Collision radius of the agent.
    pub agent_radius: f32,
    /// Length of each eye ray.
    pub view_distance: f32,
    /// Forward step taken by the regular actions.
    pub stride: f32,
    /// Forward step taken by the wide-swing actions.
    pub short_stride: f32,
    /// Marker age (ticks since relocation) after which it counts as stale.
    pub stale_age: u32,
    /// Cadence in ticks at which stale markers are considered for relocation.
    pub relocation_interval: u32,
    /// Independent relocation probability for each stale marker.
    pub relocation_chance: f32,
    /// Upper bound on rejection-sampling attempts when placing a marker.
    pub spawn_attempt_cap: u32,
    /// Rolling window length (ticks) for the capture-quality ratio.
    pub capture_window: usize,
    /// Exploration rate of the Q-learner.
    pub epsilon: f64,
    /// Step size of the Q-learner.
    pub alpha: f64,
    /// Discount factor of the Q-learner.
    pub gamma: f64,
    /// Reward for absorbing a beneficial marker.
    pub beneficial_reward: f64,
    /// Reward for absorbing a harmful marker.
    pub harmful_penalty: f64,
    /// Shaping reward for a forward step that stays clear of the boundary.
    pub progress_reward: f64,
    /// Shaping penalty for a forward step that ends near the boundary.
    pub near_edge_penalty: f64,
    /// Penalty issued when a forward step is vetoed at the boundary.
    pub edge_veto_penalty: f64,
    /// Extra reward for the first clear forward step after a vetoed one.
    pub recovery_bonus: f64,
    /// Optional RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,
}

impl Default for ForagerConfig {
    fn default() -> Self {
        Self {
            arena_extent: 1.0,
            marker_count: 50,
            marker_radius: 0.015,
            beneficial_bias: 0.6,
            agent_radius: 0.025,
            view_distance: 0.2,
            stride: 0.025,
            short_stride: 0.01,
            stale_age: 2_500,
            relocation_interval: 100,
            relocation_chance: 0.05,
            spawn_attempt_cap: 10_000,
            capture_window: 5_000,
            epsilon: 0.1,
            alpha: 0.2,
            gamma: 0.9,
            beneficial_reward: 5.0,
            harmful_penalty: -6.0,
            progress_reward: 0.5,
            near_edge_penalty: -0.1,
            edge_veto_penalty: -1.0,
            recovery_bonus: 0.25,
            rng_seed: None,
        }
    }
}

impl ForagerConfig {
    /// Validates the configuration before a simulation is built from it.
    pub fn validate(&self) -> Result<(), WorldError> {
        if self.arena_extent <= 0.0 {
            return Err(WorldError::InvalidConfig("arena_extent must be positive"));
        }
        if self.marker_radius <= 0.0 || self.agent_radius <= 0.0 {
            return Err(WorldError::InvalidConfig(
                "marker_radius and agent_radius must be positive",
            ));
        }
        if self.marker_radius * 2.0 >= self.arena_extent {
            return Err(WorldError::InvalidConfig(
                "markers must fit inside the arena",
            ));
        }
        if self.view_distance <= 0.0 {
            return Err(WorldError::InvalidConfig("view_distance must be positive"));
        }
        if self.stride <= 0.0 || self.short_stride <= 0.0 {
            return Err(WorldError::InvalidConfig("strides must be positive"));
        }
        if !(0.0..=1.0).contains(&self.beneficial_bias)
            || !(0.0..=1.0).contains(&self.relocation_chance)
        {
            return Err(WorldError::InvalidConfig(
                "beneficial_bias and relocation_chance must lie in [0, 1]",
            ));
        }
        if self.relocation_interval == 0 {
            return Err(WorldError::InvalidConfig(
                "relocation_interval must be non-zero",
            ));
        }
        if self.spawn_attempt_cap == 0 {
            return Err(WorldError::InvalidConfig(
                "spawn_attempt_cap must be non-zero",
            ));
        }
        if self.capture_window == 0 {
            return Err(WorldError::InvalidConfig(
                "capture_window must be non-zero",
            ));
        }
        if !(0.0..=1.0).contains(&self.epsilon)
            || !(0.0..=1.0).contains(&self.alpha)
            || !(0.0..=1.0).contains(&self.gamma)
        {
            return Err(WorldError::InvalidConfig(
                "epsilon, alpha, and gamma must lie in [0, 1]",
            ));
        }
        Ok(())
    }

    /// Returns a generator seeded from the config, or from entropy if absent.
    pub fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}
