//! Per-eye classification of the nearest visible object.

use crate::agent::{Agent, NUM_EYES};
use crate::geometry::{segment_sees_circle, wall_crossing_distance};
use crate::world::{MarkerKind, World};
use serde::{Deserialize, Serialize};

/// Classification of the nearest object along one eye ray.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Detection {
    /// Nothing within view distance.
    #[default]
    Empty,
    Beneficial,
    Harmful,
    Wall,
}

/// One entry per eye, in fan order. Taken as an immutable tuple, this is the
/// state key of the Q-learning engine (state space 4^NUM_EYES).
pub type DetectionState = [Detection; NUM_EYES];

/// Classify the nearest detected object for every eye.
///
/// The wall crossing is evaluated once per eye and recorded tentatively;
/// any marker the ray sees at a smaller distance overwrites it. Marker
/// distance is center-to-center minus both radii.
#[must_use]
pub fn sense(agent: &Agent, world: &World) -> DetectionState {
    let mut detections = [Detection::Empty; NUM_EYES];
    let bound = world.extent();
    for (eye, detection) in agent.eyes().iter().zip(detections.iter_mut()) {
        let mut best = f32::INFINITY;
        if let Some(dist) = wall_crossing_distance(*eye, bound, agent.view_distance()) {
            best = dist;
            *detection = Detection::Wall;
        }
        for marker in world.markers() {
            if !segment_sees_circle(*eye, marker.position, world.marker_radius()) {
                continue;
            }
            let dist = marker.position.distance_to(agent.center())
                - world.marker_radius()
                - agent.radius();
            if dist < best {
                best = dist;
                *detection = match marker.kind {
                    MarkerKind::Beneficial => Detection::Beneficial,
                    MarkerKind::Harmful => Detection::Harmful,
                };
            }
        }
    }
    detections
}
