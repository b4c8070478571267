//! Path following for AI-driven vehicles: desired direction → throttle and
//! steering, plus the cylinder test used to decide a waypoint was reached.

use crate::math::{Quat, Vec3, forward_vector, right_vector};
use crate::vehicle::Vehicle;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// `(acceleration, turning)` for a desired world direction. Never reverses.
pub fn request_move(rotation: &Quat, direction: &Vec3) -> (f32, f32) {
    let Some(direction) = direction.try_normalize(1.0e-6) else {
        return (0.0, 0.0);
    };
    let acceleration = forward_vector(rotation).dot(&direction).clamp(0.0, 1.0);
    let turning = right_vector(rotation).dot(&direction).clamp(-1.0, 1.0);
    (acceleration, turning)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Destination {
    pub goal: Vec3,
    pub goal_radius: f32,
    /// Carried for hosts that test height; the 2-D test ignores it.
    pub goal_half_height: f32,
    pub acceptance_radius: f32,
    pub agent_radius: f32,
    pub agent_radius_multiplier: f32,
}

impl Destination {
    pub fn point(goal: Vec3, acceptance_radius: f32) -> Self {
        Self {
            goal,
            goal_radius: 0.0,
            goal_half_height: 0.0,
            acceptance_radius,
            agent_radius: 0.0,
            agent_radius_multiplier: 1.0,
        }
    }

    pub fn has_reached(&self, agent_location: &Vec3) -> bool {
        let dx = agent_location.x - self.goal.x;
        let dy = agent_location.y - self.goal.y;
        let reach = self.acceptance_radius
            + self.goal_radius
            + self.agent_radius * self.agent_radius_multiplier;
        dx * dx + dy * dy <= reach * reach
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathFollower {
    waypoints: Vec<Vec3>,
    current: usize,
    pub acceptance_radius: f32,
    pub agent_radius: f32,
    pub looped: bool,
}

impl PathFollower {
    pub fn new(waypoints: Vec<Vec3>, acceptance_radius: f32) -> Self {
        Self {
            waypoints,
            current: 0,
            acceptance_radius,
            agent_radius: 0.0,
            looped: false,
        }
    }

    pub fn looped(mut self) -> Self {
        self.looped = true;
        self
    }

    pub fn current_waypoint(&self) -> Option<Vec3> {
        self.waypoints.get(self.current).copied()
    }

    pub fn is_finished(&self) -> bool {
        self.current >= self.waypoints.len()
    }

    /// Steers `vehicle` toward the current waypoint. Returns false once the
    /// route is done, with the vehicle's inputs cleared.
    pub fn update(&mut self, vehicle: &mut Vehicle, location: &Vec3, rotation: &Quat) -> bool {
        // each waypoint is checked at most once per update
        for _ in 0..self.waypoints.len() {
            let Some(goal) = self.current_waypoint() else {
                break;
            };
            let destination = Destination {
                agent_radius: self.agent_radius,
                ..Destination::point(goal, self.acceptance_radius)
            };
            if !destination.has_reached(location) {
                let mut direction = goal - location;
                direction.z = 0.0;
                vehicle.request_path_move(rotation, &direction);
                return true;
            }

            debug!(waypoint = self.current, "waypoint reached");
            self.current += 1;
            if self.looped && self.is_finished() {
                self.current = 0;
            }
        }

        vehicle.clear_inputs();
        false
    }
}
