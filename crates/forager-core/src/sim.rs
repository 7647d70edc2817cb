//! The per-tick control loop: sense, act, reward, learn, age.

use crate::ForagerConfig;
use crate::agent::{Agent, NUM_EYES};
use crate::geometry::{Segment, Vec2};
use crate::perception::{DetectionState, sense};
use crate::qlearn::{Action, QLearner};
use crate::world::{MarkerKind, World, WorldError};
use rand::rngs::SmallRng;

/// Run mode for a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Explore, learn, and accumulate a score until the iteration budget.
    Train,
    /// Exploit a loaded table greedily; no learning, runs until cancelled.
    Play,
}

/// Snapshot handed to the render sink after every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub tick: u64,
    pub center: Vec2,
    pub heading: f32,
    pub eyes: [Segment; NUM_EYES],
    pub detections: DetectionState,
    pub status: String,
}

/// Consumer of per-tick render snapshots. Free to no-op.
pub trait RenderSink {
    fn present(&mut self, frame: &RenderFrame);
}

/// Render sink that discards every frame.
#[derive(Debug, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn present(&mut self, _frame: &RenderFrame) {}
}

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub action: Action,
    pub reward: f64,
    /// Markers absorbed this tick.
    pub collected: u32,
    /// Beneficial markers among those absorbed.
    pub beneficial: u32,
}

/// One agent, one world, one table: the whole simulation, owned explicitly
/// and advanced one tick at a time.
pub struct Simulation {
    config: ForagerConfig,
    mode: Mode,
    agent: Agent,
    world: World,
    learner: QLearner,
    rng: SmallRng,
    tick: u64,
    detections: DetectionState,
    last: Option<(DetectionState, Action)>,
    prev_at_edge: bool,
    score: f64,
    collected_window: Vec<u32>,
    beneficial_window: Vec<u32>,
    collected_sum: u64,
    beneficial_sum: u64,
}

impl Simulation {
    /// Build a simulation with a fresh, empty Q-table.
    pub fn new(config: ForagerConfig, mode: Mode) -> Result<Self, WorldError> {
        let learner = QLearner::new(config.epsilon, config.alpha, config.gamma);
        Self::with_learner(config, mode, learner)
    }

    /// Build a simulation around an existing learner (e.g. a loaded model).
    ///
    /// Play mode forces the exploration rate to zero so the restored policy
    /// is exploited greedily.
    pub fn with_learner(
        config: ForagerConfig,
        mode: Mode,
        mut learner: QLearner,
    ) -> Result<Self, WorldError> {
        config.validate()?;
        let mut rng = config.seeded_rng();
        let world = World::populate(&config, &mut rng)?;
        let agent = Agent::new(config.agent_radius, config.view_distance);
        if mode == Mode::Play {
            learner.epsilon = 0.0;
        }
        let detections = sense(&agent, &world);
        let window = config.capture_window;
        Ok(Self {
            config,
            mode,
            agent,
            world,
            learner,
            rng,
            tick: 0,
            detections,
            last: None,
            prev_at_edge: false,
            score: 0.0,
            collected_window: vec![0; window],
            beneficial_window: vec![0; window],
            collected_sum: 0,
            beneficial_sum: 0,
        })
    }

    /// Execute one tick: choose an action from the carried detection state,
    /// apply its kinematics, absorb markers, re-sense, learn, and age the
    /// world.
    pub fn step(&mut self) -> Result<TickReport, WorldError> {
        let state = self.detections;
        let action = self.learner.choose_action(&state, &mut self.rng);
        let mut reward = 0.0;
        let bound = self.config.arena_extent;

        if action == Action::Forward {
            if self.agent.at_boundary(bound) {
                // Veto: the forward step would push the agent off-arena.
                self.prev_at_edge = true;
                reward += self.config.edge_veto_penalty;
            } else {
                self.agent.move_forward(self.config.stride);
                if self.agent.near_boundary(bound) {
                    reward += self.config.near_edge_penalty;
                } else {
                    reward += self.config.progress_reward;
                    if self.prev_at_edge {
                        reward += self.config.recovery_bonus;
                    }
                }
                self.prev_at_edge = false;
            }
        } else {
            self.agent.turn(action.turn_degrees());
            if !self.agent.at_boundary(bound) {
                let stride = if action.short_stride() {
                    self.config.short_stride
                } else {
                    self.config.stride
                };
                self.agent.move_forward(stride);
            }
        }

        let absorbed = self.world.absorbed_by(self.agent.center(), self.agent.radius());
        let mut collected = 0u32;
        let mut beneficial = 0u32;
        for index in absorbed {
            match self.world.markers()[index].kind {
                MarkerKind::Beneficial => {
                    reward += self.config.beneficial_reward;
                    beneficial += 1;
                }
                MarkerKind::Harmful => reward += self.config.harmful_penalty,
            }
            self.world.relocate(index, &mut self.rng)?;
            collected += 1;
        }
        self.record_captures(collected, beneficial);

        self.detections = sense(&self.agent, &self.world);

        if self.mode == Mode::Train {
            // The previous tick's pair is updated with this tick's reward
            // and this tick's pre-action state as the successor. Skipped on
            // the very first tick, which has no predecessor.
            if let Some((last_state, last_action)) = self.last {
                self.learner.learn(&last_state, last_action, reward, &state);
            }
            self.last = Some((state, action));
        }

        self.world.age_tick(self.tick, &mut self.rng)?;
        self.score += reward;
        self.tick += 1;

        Ok(TickReport {
            tick: self.tick,
            action,
            reward,
            collected,
            beneficial,
        })
    }

    fn record_captures(&mut self, collected: u32, beneficial: u32) {
        let slot = (self.tick as usize) % self.config.capture_window;
        self.collected_sum -= u64::from(self.collected_window[slot]);
        self.beneficial_sum -= u64::from(self.beneficial_window[slot]);
        self.collected_window[slot] = collected;
        self.beneficial_window[slot] = beneficial;
        self.collected_sum += u64::from(collected);
        self.beneficial_sum += u64::from(beneficial);
    }

    /// Beneficial share of captures over the rolling window, 0.0 when no
    /// marker was collected yet.
    #[must_use]
    pub fn capture_ratio(&self) -> f64 {
        if self.collected_sum == 0 {
            0.0
        } else {
            self.beneficial_sum as f64 / self.collected_sum as f64
        }
    }

    /// Build the per-tick render snapshot.
    #[must_use]
    pub fn frame(&self) -> RenderFrame {
        let status = match self.mode {
            Mode::Train => format!(
                "age={} ratio={:.3} score={}",
                self.tick,
                self.capture_ratio(),
                self.score as i64,
            ),
            Mode::Play => format!("ratio={:.3}", self.capture_ratio()),
        };
        RenderFrame {
            tick: self.tick,
            center: self.agent.center(),
            heading: self.agent.heading(),
            eyes: *self.agent.eyes(),
            detections: self.detections,
            status,
        }
    }

    /// Recompute the carried detection state from the current agent and
    /// world. Needed after external scenario edits, never during a run.
    pub fn resense(&mut self) {
        self.detections = sense(&self.agent, &self.world);
    }

    /// Ticks executed so far.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Cumulative reward accumulated in train mode.
    #[must_use]
    pub const fn score(&self) -> f64 {
        self.score
    }

    /// Run mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Immutable access to the configuration.
    #[must_use]
    pub const fn config(&self) -> &ForagerConfig {
        &self.config
    }

    /// The detection state carried into the next tick.
    #[must_use]
    pub const fn detections(&self) -> &DetectionState {
        &self.detections
    }

    /// Immutable access to the agent.
    #[must_use]
    pub const fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Mutable access to the agent (scenario setup).
    #[must_use]
    pub fn agent_mut(&mut self) -> &mut Agent {
        &mut self.agent
    }

    /// Immutable access to the world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world (scenario setup).
    #[must_use]
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Immutable access to the learner.
    #[must_use]
    pub const fn learner(&self) -> &QLearner {
        &self.learner
    }

    /// Mutable access to the learner.
    #[must_use]
    pub fn learner_mut(&mut self) -> &mut QLearner {
        &mut self.learner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config(seed: u64) -> ForagerConfig {
        ForagerConfig {
            marker_count: 0,
            epsilon: 0.0,
            rng_seed: Some(seed),
            ..ForagerConfig::default()
        }
    }

    #[test]
    fn first_tick_skips_learning() {
        let mut sim = Simulation::new(quiet_config(1), Mode::Train).expect("sim");
        sim.step().expect("step");
        assert!(sim.learner().is_empty());
        sim.step().expect("step");
        assert_eq!(sim.learner().len(), 1);
    }

    #[test]
    fn play_mode_never_learns_and_exploits_greedily() {
        let config = ForagerConfig {
            epsilon: 0.7,
            ..quiet_config(2)
        };
        let mut sim = Simulation::new(config, Mode::Play).expect("sim");
        assert_eq!(sim.learner().epsilon, 0.0);
        for _ in 0..10 {
            sim.step().expect("step");
        }
        assert!(sim.learner().is_empty());
    }

    #[test]
    fn capture_window_slots_are_recycled() {
        let config = ForagerConfig {
            capture_window: 4,
            ..quiet_config(3)
        };
        let mut sim = Simulation::new(config, Mode::Train).expect("sim");
        sim.record_captures(2, 1);
        assert!((sim.capture_ratio() - 0.5).abs() < 1e-9);
        sim.tick = 4; // wraps onto the same slot
        sim.record_captures(1, 1);
        assert!((sim.capture_ratio() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn status_line_matches_mode() {
        let sim = Simulation::new(quiet_config(4), Mode::Train).expect("sim");
        assert_eq!(sim.frame().status, "age=0 ratio=0.000 score=0");
        let sim = Simulation::new(quiet_config(4), Mode::Play).expect("sim");
        assert_eq!(sim.frame().status, "ratio=0.000");
    }

    #[test]
    fn frame_reflects_agent_geometry() {
        let sim = Simulation::new(quiet_config(5), Mode::Train).expect("sim");
        let frame = sim.frame();
        assert_eq!(frame.center, sim.agent().center());
        assert_eq!(frame.eyes, *sim.agent().eyes());
        assert_eq!(frame.detections, *sim.detections());
    }
}
