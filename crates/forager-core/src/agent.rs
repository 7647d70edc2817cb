//! Agent pose and eye-ray kinematics.

use crate::geometry::{Segment, Vec2};
use std::f32::consts::{FRAC_PI_2, TAU};

/// Number of directional eyes the agent possesses.
pub const NUM_EYES: usize = 5;

/// Angular offsets of the eye fan from the heading, in degrees.
const EYE_OFFSETS_DEG: [f32; NUM_EYES] = [30.0, 15.0, 0.0, -15.0, -30.0];

/// The single mobile agent: a pose plus a rigid fan of eye rays.
///
/// Eyes are owned exclusively by the agent and follow every `move`/`turn`
/// rigidly; they are never persisted.
#[derive(Debug, Clone)]
pub struct Agent {
    center: Vec2,
    heading: f32,
    radius: f32,
    view_distance: f32,
    eyes: [Segment; NUM_EYES],
}

impl Agent {
    /// Place an agent at the arena center, facing "up" (heading pi/2).
    #[must_use]
    pub fn new(radius: f32, view_distance: f32) -> Self {
        let mut agent = Self {
            center: Vec2::new(0.5, 0.5),
            heading: FRAC_PI_2,
            radius,
            view_distance,
            eyes: [Segment::default(); NUM_EYES],
        };
        agent.rebuild_eyes();
        agent
    }

    /// Teleport to a new pose, rebuilding the eye fan from it.
    pub fn set_pose(&mut self, center: Vec2, heading: f32) {
        self.center = center;
        self.heading = heading.rem_euclid(TAU);
        self.rebuild_eyes();
    }

    fn rebuild_eyes(&mut self) {
        for (eye, offset) in self.eyes.iter_mut().zip(EYE_OFFSETS_DEG) {
            let angle = self.heading + offset.to_radians();
            let tip = Vec2::new(
                self.center.x + self.view_distance * angle.cos(),
                self.center.y + self.view_distance * angle.sin(),
            );
            *eye = Segment::new(self.center, tip);
        }
    }

    /// Translate the center along the current heading by `distance`.
    ///
    /// Every eye ray translates rigidly with the center; the fan geometry
    /// relative to the heading is unchanged.
    pub fn move_forward(&mut self, distance: f32) {
        let dx = self.heading.cos() * distance;
        let dy = self.heading.sin() * distance;
        self.center = Vec2::new(self.center.x + dx, self.center.y + dy);
        for eye in &mut self.eyes {
            eye.start = self.center;
            eye.end = Vec2::new(eye.end.x + dx, eye.end.y + dy);
        }
    }

    /// Rotate every eye ray about the center by `degrees` and advance the
    /// heading by the same angle, wrapped to [0, 2pi).
    pub fn turn(&mut self, degrees: f32) {
        let radians = degrees.to_radians();
        let (sin, cos) = radians.sin_cos();
        for eye in &mut self.eyes {
            let rx = eye.end.x - eye.start.x;
            let ry = eye.end.y - eye.start.y;
            eye.end = Vec2::new(
                rx * cos - ry * sin + eye.start.x,
                rx * sin + ry * cos + eye.start.y,
            );
        }
        self.heading = (self.heading + radians).rem_euclid(TAU);
    }

    /// Whether any eye tip lies outside the inflated boundary interval
    /// `(-view + 2r, bound + view - 2r)`. Used to veto forward movement.
    #[must_use]
    pub fn at_boundary(&self, bound: f32) -> bool {
        let lo = -self.view_distance + self.radius * 2.0;
        let hi = bound + self.view_distance - self.radius * 2.0;
        self.eyes.iter().any(|eye| {
            !(lo < eye.end.x && eye.end.x < hi) || !(lo < eye.end.y && eye.end.y < hi)
        })
    }

    /// Whether any eye tip lies strictly outside the raw arena bounds.
    /// A softer signal than [`Agent::at_boundary`], used only for reward
    /// shaping.
    #[must_use]
    pub fn near_boundary(&self, bound: f32) -> bool {
        self.eyes.iter().any(|eye| {
            !(0.0 < eye.end.x && eye.end.x < bound) || !(0.0 < eye.end.y && eye.end.y < bound)
        })
    }

    /// Current center position.
    #[must_use]
    pub const fn center(&self) -> Vec2 {
        self.center
    }

    /// Current heading in [0, 2pi).
    #[must_use]
    pub const fn heading(&self) -> f32 {
        self.heading
    }

    /// Collision radius.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Eye ray length.
    #[must_use]
    pub const fn view_distance(&self) -> f32 {
        self.view_distance
    }

    /// The eye rays, rooted at the center.
    #[must_use]
    pub const fn eyes(&self) -> &[Segment; NUM_EYES] {
        &self.eyes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_agent() -> Agent {
        Agent::new(0.025, 0.2)
    }

    #[test]
    fn starts_centered_facing_up() {
        let agent = default_agent();
        assert_eq!(agent.center(), Vec2::new(0.5, 0.5));
        assert!((agent.heading() - FRAC_PI_2).abs() < 1e-6);
        // Center eye points straight up.
        let center_eye = agent.eyes()[NUM_EYES / 2];
        assert!((center_eye.end.x - 0.5).abs() < 1e-6);
        assert!((center_eye.end.y - 0.7).abs() < 1e-6);
    }

    #[test]
    fn move_then_reverse_restores_center() {
        let mut agent = default_agent();
        agent.turn(37.0);
        let before = agent.center();
        agent.move_forward(0.025);
        agent.move_forward(-0.025);
        assert!((agent.center().x - before.x).abs() < 1e-6);
        assert!((agent.center().y - before.y).abs() < 1e-6);
    }

    #[test]
    fn turn_then_reverse_restores_eyes() {
        let mut agent = default_agent();
        let before = *agent.eyes();
        agent.turn(30.0);
        agent.turn(-30.0);
        for (eye, original) in agent.eyes().iter().zip(before.iter()) {
            assert!((eye.end.x - original.end.x).abs() < 1e-5);
            assert!((eye.end.y - original.end.y).abs() < 1e-5);
        }
        assert!((agent.heading() - FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn heading_wraps_to_full_turn() {
        let mut agent = default_agent();
        agent.turn(350.0);
        assert!(agent.heading() >= 0.0 && agent.heading() < TAU);
        agent.turn(-720.0);
        assert!(agent.heading() >= 0.0 && agent.heading() < TAU);
    }

    #[test]
    fn boundary_predicates_disagree_in_the_soft_band() {
        let mut agent = default_agent();
        agent.set_pose(Vec2::new(0.9, 0.5), 0.0);
        // Tip at x = 1.1: beyond the raw bound but inside the inflated one.
        assert!(agent.near_boundary(1.0));
        assert!(!agent.at_boundary(1.0));

        agent.set_pose(Vec2::new(0.98, 0.5), 0.0);
        // Tip at x = 1.18: beyond bound + view - 2r = 1.15.
        assert!(agent.at_boundary(1.0));
    }

    #[test]
    fn centered_agent_sees_no_boundary() {
        let agent = default_agent();
        assert!(!agent.near_boundary(1.0));
        assert!(!agent.at_boundary(1.0));
    }
}
