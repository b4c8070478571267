//! Physics state snapshots exchanged between the controlling side and observers.

use crate::input::{MovementModifiers, VehicleInput};
use crate::math::{Quat, Vec3, lerp_vec, slerp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehiclePhysicsState {
    /// World time in seconds on the producing side. On the server receive path
    /// this is replaced by the sender's estimated one-way trip time.
    pub timestamp: f64,
    pub input: VehicleInput,
    pub location: Vec3,
    pub rotation: Quat,
    pub linear_velocity: Vec3,
    /// Degrees per second.
    pub angular_velocity: Vec3,
    pub modifiers: MovementModifiers,
}

impl Default for VehiclePhysicsState {
    fn default() -> Self {
        Self {
            timestamp: 0.0,
            input: VehicleInput::default(),
            location: Vec3::zeros(),
            rotation: Quat::identity(),
            linear_velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            modifiers: MovementModifiers::default(),
        }
    }
}

impl VehiclePhysicsState {
    /// Interpolates every channel. Alpha 0 and 1 return the endpoints verbatim;
    /// the modifier mask switches at 0.5.
    pub fn lerp(a: &Self, b: &Self, alpha: f32) -> Self {
        if alpha <= 0.0 {
            return *a;
        }
        if alpha >= 1.0 {
            return *b;
        }

        Self {
            timestamp: a.timestamp + (b.timestamp - a.timestamp) * alpha as f64,
            input: VehicleInput::lerp(&a.input, &b.input, alpha),
            location: lerp_vec(&a.location, &b.location, alpha),
            rotation: slerp(&a.rotation, &b.rotation, alpha),
            linear_velocity: lerp_vec(&a.linear_velocity, &b.linear_velocity, alpha),
            angular_velocity: lerp_vec(&a.angular_velocity, &b.angular_velocity, alpha),
            modifiers: if alpha < 0.5 { a.modifiers } else { b.modifiers },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::from_euler_degrees;

    fn state(t: f64, x: f32, yaw: f32) -> VehiclePhysicsState {
        VehiclePhysicsState {
            timestamp: t,
            location: Vec3::new(x, 0.0, 0.0),
            rotation: from_euler_degrees(0.0, 0.0, yaw),
            linear_velocity: Vec3::new(x * 2.0, 0.0, 0.0),
            ..Default::default()
        }
    }

    #[test]
    fn endpoints_are_exact() {
        let a = state(1.0, 10.0, 0.0);
        let b = state(2.0, 20.0, 40.0);
        assert_eq!(VehiclePhysicsState::lerp(&a, &b, 0.0), a);
        assert_eq!(VehiclePhysicsState::lerp(&a, &b, 1.0), b);
    }

    #[test]
    fn midpoint_blends_every_channel() {
        let a = state(1.0, 10.0, 0.0);
        let mut b = state(2.0, 20.0, 40.0);
        b.modifiers.block_acceleration = true;

        let mid = VehiclePhysicsState::lerp(&a, &b, 0.5);
        assert!((mid.location.x - 15.0).abs() < 1e-5);
        assert!((mid.linear_velocity.x - 30.0).abs() < 1e-5);
        assert!((mid.rotation.angle().to_degrees() - 20.0).abs() < 1e-3);
        assert!((mid.timestamp - 1.5).abs() < 1e-9);
        assert!(mid.modifiers.block_acceleration);
    }
}
