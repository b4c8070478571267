//! Drift adherence: grip multipliers that drop to the drift floor the moment a
//! drift starts and climb back linearly once it ends.

use crate::runtime::VehiclePhysicsRuntime;
use crate::settings::SteeringSettings;

pub fn update_adherence(runtime: &mut VehiclePhysicsRuntime, steering: &SteeringSettings, dt: f32) {
    if runtime.is_drifting {
        runtime.adherence_multiplier = steering.drift_adherence_percentage;
        runtime.rotation_multiplier = steering.drift_rotation_percentage;
    } else {
        let recovery = steering.drift_recovery_speed * dt;
        runtime.adherence_multiplier = recover(
            runtime.adherence_multiplier,
            recovery,
            steering.drift_adherence_percentage,
        );
        runtime.rotation_multiplier = recover(
            runtime.rotation_multiplier,
            recovery,
            steering.drift_rotation_percentage,
        );
    }

    runtime.linear_adherence = steering.linear_damping * runtime.adherence_multiplier;
    runtime.angular_adherence = steering.angular_damping * runtime.adherence_multiplier;
}

/// Adherence disabled: raw damping values, multipliers untouched.
pub fn raw_adherence(runtime: &mut VehiclePhysicsRuntime, steering: &SteeringSettings) {
    runtime.linear_adherence = steering.linear_damping;
    runtime.angular_adherence = steering.angular_damping;
}

fn recover(value: f32, step: f32, floor: f32) -> f32 {
    let floor = floor.min(1.0);
    (value + step).clamp(floor, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snaps_to_floor_when_drifting() {
        let steering = SteeringSettings::default();
        let mut rt = VehiclePhysicsRuntime {
            is_drifting: true,
            ..Default::default()
        };
        update_adherence(&mut rt, &steering, 0.016);
        assert_eq!(rt.adherence_multiplier, 0.1);
        assert_eq!(rt.rotation_multiplier, 0.1);
        assert!((rt.linear_adherence - 0.1).abs() < 1e-6);
    }

    #[test]
    fn recovers_monotonically_within_bounds() {
        let steering = SteeringSettings {
            drift_recovery_speed: 0.5,
            ..Default::default()
        };
        let mut rt = VehiclePhysicsRuntime {
            is_drifting: true,
            ..Default::default()
        };
        update_adherence(&mut rt, &steering, 0.1);

        rt.is_drifting = false;
        let mut last = rt.adherence_multiplier;
        for _ in 0..40 {
            update_adherence(&mut rt, &steering, 0.1);
            assert!(rt.adherence_multiplier >= last);
            assert!(rt.adherence_multiplier >= 0.1 && rt.adherence_multiplier <= 1.0);
            last = rt.adherence_multiplier;
        }
        assert_eq!(rt.adherence_multiplier, 1.0);
    }

    #[test]
    fn raw_values_when_disabled() {
        let steering = SteeringSettings {
            linear_damping: 3.0,
            angular_damping: 2.0,
            ..Default::default()
        };
        let mut rt = VehiclePhysicsRuntime::default();
        raw_adherence(&mut rt, &steering);
        assert_eq!(rt.linear_adherence, 3.0);
        assert_eq!(rt.angular_adherence, 2.0);
    }
}
