//! Per-tick derived physics data, rebuilt from the body every pre-physics tick.

use crate::host::VehicleBody;
use crate::input::VehicleInput;
use crate::math::{KMH_MULTIPLIER, Vec3, clamp01};
use crate::settings::VehicleSettings;

/// km/h under which the vehicle counts as stationary.
pub const MOVING_SPEED_KMH: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehiclePhysicsRuntime {
    pub local_linear_velocity: Vec3,
    /// Degrees per second, body space.
    pub local_angular_velocity: Vec3,

    /// Signed forward speed, km/h.
    pub speed: f32,
    /// 0..1 share of the max speed for the current direction.
    pub speed_unit: f32,

    pub is_braking: bool,
    pub is_engine_braking: bool,
    pub is_accelerating: bool,
    pub is_drifting: bool,

    pub adherence_multiplier: f32,
    pub rotation_multiplier: f32,
    pub linear_adherence: f32,
    pub angular_adherence: f32,

    pub last_applied_acceleration: f32,
    pub last_applied_braking: f32,
}

impl Default for VehiclePhysicsRuntime {
    fn default() -> Self {
        Self {
            local_linear_velocity: Vec3::zeros(),
            local_angular_velocity: Vec3::zeros(),
            speed: 0.0,
            speed_unit: 0.0,
            is_braking: false,
            is_engine_braking: false,
            is_accelerating: false,
            is_drifting: false,
            adherence_multiplier: 1.0,
            rotation_multiplier: 1.0,
            linear_adherence: 0.0,
            angular_adherence: 0.0,
            last_applied_acceleration: 0.0,
            last_applied_braking: 0.0,
        }
    }
}

impl VehiclePhysicsRuntime {
    /// Reads velocities back from the body and recomputes speed data.
    /// Adherence multipliers carry over between ticks.
    pub fn refresh<B: VehicleBody + ?Sized>(
        &mut self,
        body: &B,
        settings: &VehicleSettings,
        input: &VehicleInput,
        max_speed_multiplier: f32,
    ) {
        let inverse = body.transform().rotation.inverse();
        self.local_linear_velocity = inverse * body.linear_velocity();
        self.local_angular_velocity = inverse * body.angular_velocity_deg();

        self.speed = self.local_linear_velocity.x * KMH_MULTIPLIER;
        let tolerance = settings.physics.movement_direction_tolerance;
        let max = if self.is_moving_forward(tolerance) {
            Some(settings.engine.max_speed * max_speed_multiplier)
        } else if self.is_moving_backward(tolerance) {
            Some(settings.engine.max_reverse_speed)
        } else {
            None
        };
        self.speed_unit = match max {
            Some(max) if max > 0.0 => clamp01(self.speed.abs() / max),
            Some(_) => 1.0,
            None => 0.0,
        };

        self.is_drifting = input.drifting && self.speed.abs() >= settings.steering.drift_min_speed;
        self.is_braking = false;
        self.is_engine_braking = false;
        self.is_accelerating = false;
    }

    pub fn speed_absolute(&self) -> f32 {
        self.speed.abs()
    }

    pub fn is_moving(&self) -> bool {
        self.speed.abs() > MOVING_SPEED_KMH
    }

    pub fn is_moving_forward(&self, tolerance: f32) -> bool {
        self.speed > tolerance
    }

    pub fn is_moving_backward(&self, tolerance: f32) -> bool {
        self.speed < -tolerance
    }

    pub fn forward_velocity(&self) -> f32 {
        self.local_linear_velocity.x
    }

    /// Positive to the right.
    pub fn right_velocity(&self) -> f32 {
        -self.local_linear_velocity.y
    }
}
