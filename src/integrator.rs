// ==============================================================================
// integrator.rs - VELOCITY INTEGRATION
// ------------------------------------------------------------------------------
// Works on the body-space velocities held in VehiclePhysicsRuntime; the tick
// writes them back to the body afterwards.
//
// accelerate()  : adherence blend toward the forward-aligned "natural" velocity,
//                 then exactly one of engine braking / braking / acceleration.
//                 The Z component always leaves untouched.
// turn()        : yaw rate from the turning force.
// stabilize()   : roll/pitch rates that pull the body flat.
// ==============================================================================

use crate::forces::ForceState;
use crate::math::{Quat, Vec3, clamp01, euler_degrees, lerp_vec, sign, vector_pitch};
use crate::runtime::VehiclePhysicsRuntime;
use crate::settings::SteeringSettings;

pub fn accelerate(
    runtime: &mut VehiclePhysicsRuntime,
    forces: &ForceState,
    drive_wheels_multiplier: f32,
    dt: f32,
) {
    let velocity = runtime.local_linear_velocity;
    let pitch = vector_pitch(&velocity);
    let heading = Vec3::new(pitch.cos(), 0.0, pitch.sin());

    // velocity pitch kept, yaw locked to the body's forward axis
    let mut natural = heading;
    natural.x *= sign(runtime.speed);
    let target = natural * velocity.norm();
    let mut result = lerp_vec(&velocity, &target, clamp01(runtime.linear_adherence * dt));

    let is_moving = runtime.is_moving();
    let has_acceleration = forces.acceleration != 0.0;
    let can_accelerate = has_acceleration && runtime.speed_unit < 1.0;

    if !is_moving && !has_acceleration {
        result.x = 0.0;
    }

    let opposite_direction =
        is_moving && has_acceleration && sign(forces.acceleration) != sign(runtime.speed);
    let engine_braking = is_moving && !has_acceleration;
    let braking = engine_braking || opposite_direction;

    runtime.is_engine_braking = engine_braking;
    runtime.is_braking = braking;
    runtime.is_accelerating = false;
    runtime.last_applied_acceleration = 0.0;
    runtime.last_applied_braking = 0.0;

    if engine_braking {
        let before = result.norm();
        let stopped = Vec3::new(0.0, result.y, result.z);
        result = lerp_vec(&result, &stopped, clamp01(forces.engine_braking * dt));
        runtime.last_applied_braking = before - result.norm();
    } else if braking {
        let amount = forces.braking * dt;
        if let Some(direction) = result.try_normalize(1.0e-6) {
            result -= direction * amount;
        }
        runtime.last_applied_braking = amount;
    } else if can_accelerate {
        let amount = forces.acceleration * drive_wheels_multiplier * dt;
        result += heading * amount;
        runtime.last_applied_acceleration = amount;
        runtime.is_accelerating = true;
    }

    result.z = velocity.z;
    runtime.local_linear_velocity = result;
}

/// Exponential decay of the body-space angular velocity.
pub fn apply_angular_adherence(runtime: &mut VehiclePhysicsRuntime, dt: f32) {
    let alpha = clamp01(runtime.angular_adherence * dt);
    runtime.local_angular_velocity = lerp_vec(&runtime.local_angular_velocity, &Vec3::zeros(), alpha);
}

/// Positive turning force steers right: negative yaw rate about +Z.
pub fn turn(
    runtime: &mut VehiclePhysicsRuntime,
    forces: &ForceState,
    steering: &SteeringSettings,
    dt: f32,
) {
    if forces.turning == 0.0 {
        return;
    }
    if !steering.allow_steering_while_braking && runtime.is_braking && !runtime.is_engine_braking {
        return;
    }
    runtime.local_angular_velocity.z -= forces.turning * runtime.rotation_multiplier * dt;
}

pub fn stabilize(runtime: &mut VehiclePhysicsRuntime, rotation: &Quat, force: f32, dt: f32) {
    let (roll, pitch, _) = euler_degrees(rotation);
    runtime.local_angular_velocity.x = -roll * force * dt;
    runtime.local_angular_velocity.y = -pitch * force * dt;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{KMH_MULTIPLIER, from_euler_degrees};

    fn runtime_at(velocity: Vec3) -> VehiclePhysicsRuntime {
        let speed = velocity.x * KMH_MULTIPLIER;
        VehiclePhysicsRuntime {
            local_linear_velocity: velocity,
            speed,
            speed_unit: (speed.abs() / 180.0).min(1.0),
            linear_adherence: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn accelerates_from_rest_by_force_times_dt() {
        let mut rt = runtime_at(Vec3::zeros());
        let forces = ForceState { acceleration: 10.0, ..Default::default() };
        accelerate(&mut rt, &forces, 1.0, 0.016);
        assert!((rt.local_linear_velocity.x - 0.16).abs() < 1e-5);
        assert!(rt.is_accelerating);
        assert!((rt.last_applied_acceleration - 0.16).abs() < 1e-6);
    }

    #[test]
    fn drive_multiplier_scales_acceleration() {
        let mut rt = runtime_at(Vec3::zeros());
        let forces = ForceState { acceleration: 10.0, ..Default::default() };
        accelerate(&mut rt, &forces, 0.5, 1.0);
        assert!((rt.local_linear_velocity.x - 5.0).abs() < 1e-5);
    }

    #[test]
    fn engine_braking_decays_without_reversing() {
        // 50 km/h
        let mut rt = runtime_at(Vec3::new(50.0 / KMH_MULTIPLIER, 0.0, 0.0));
        let forces = ForceState { engine_braking: 2.0, ..Default::default() };
        let mut last = rt.local_linear_velocity.x;
        for _ in 0..200 {
            accelerate(&mut rt, &forces, 1.0, 0.016);
            assert!(rt.local_linear_velocity.x >= 0.0);
            assert!(rt.local_linear_velocity.x <= last);
            last = rt.local_linear_velocity.x;
            rt.speed = rt.local_linear_velocity.x * KMH_MULTIPLIER;
            if rt.is_moving() {
                assert!(rt.is_engine_braking);
            }
        }
        assert!(rt.local_linear_velocity.x < 50.0 / KMH_MULTIPLIER);
    }

    #[test]
    fn opposite_throttle_brakes() {
        let mut rt = runtime_at(Vec3::new(1000.0, 0.0, 0.0));
        let forces = ForceState { acceleration: -5.0, braking: 100.0, ..Default::default() };
        accelerate(&mut rt, &forces, 1.0, 0.5);
        assert!(rt.is_braking);
        assert!(!rt.is_engine_braking);
        assert!((rt.local_linear_velocity.x - 950.0).abs() < 1e-3);
        assert_eq!(rt.last_applied_braking, 50.0);
    }

    #[test]
    fn stationary_creep_is_removed() {
        let mut rt = runtime_at(Vec3::new(2.0, 3.0, -4.0));
        accelerate(&mut rt, &ForceState::default(), 1.0, 0.016);
        assert_eq!(rt.local_linear_velocity.x, 0.0);
        assert_eq!(rt.local_linear_velocity.z, -4.0);
    }

    #[test]
    fn vertical_component_is_preserved() {
        let mut rt = runtime_at(Vec3::new(1000.0, 200.0, -300.0));
        let forces = ForceState { acceleration: 100.0, ..Default::default() };
        accelerate(&mut rt, &forces, 1.0, 0.1);
        assert_eq!(rt.local_linear_velocity.z, -300.0);
    }

    #[test]
    fn adherence_pulls_lateral_into_forward() {
        let mut rt = runtime_at(Vec3::new(1000.0, 500.0, 0.0));
        rt.linear_adherence = 10.0;
        let forces = ForceState { acceleration: 1.0, ..Default::default() };
        accelerate(&mut rt, &forces, 1.0, 0.1);
        assert!(rt.local_linear_velocity.y.abs() < 1e-3);
        assert!(rt.local_linear_velocity.x > 1000.0);
    }

    #[test]
    fn right_turn_is_negative_yaw() {
        let mut rt = VehiclePhysicsRuntime::default();
        let forces = ForceState { turning: 100.0, ..Default::default() };
        turn(&mut rt, &forces, &SteeringSettings::default(), 0.1);
        assert!((rt.local_angular_velocity.z + 10.0).abs() < 1e-4);
    }

    #[test]
    fn no_turning_while_braking_unless_allowed() {
        let forces = ForceState { turning: 100.0, ..Default::default() };
        let mut rt = VehiclePhysicsRuntime { is_braking: true, ..Default::default() };
        turn(&mut rt, &forces, &SteeringSettings::default(), 0.1);
        assert_eq!(rt.local_angular_velocity.z, 0.0);

        rt.is_engine_braking = true;
        turn(&mut rt, &forces, &SteeringSettings::default(), 0.1);
        assert!(rt.local_angular_velocity.z < 0.0);
    }

    #[test]
    fn stabilization_opposes_roll_and_pitch() {
        let mut rt = VehiclePhysicsRuntime::default();
        let tilted = from_euler_degrees(10.0, -5.0, 0.0);
        stabilize(&mut rt, &tilted, 30.0, 0.1);
        assert!((rt.local_angular_velocity.x + 30.0).abs() < 1e-2);
        assert!((rt.local_angular_velocity.y - 15.0).abs() < 1e-2);
    }

    #[test]
    fn angular_adherence_decays() {
        let mut rt = VehiclePhysicsRuntime {
            local_angular_velocity: Vec3::new(0.0, 0.0, 100.0),
            angular_adherence: 5.0,
            ..Default::default()
        };
        apply_angular_adherence(&mut rt, 0.1);
        assert!((rt.local_angular_velocity.z - 50.0).abs() < 1e-4);
    }
}
