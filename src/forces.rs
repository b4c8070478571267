// ==============================================================================
// forces.rs - CURVE-DRIVEN FORCE MODEL
// ------------------------------------------------------------------------------
// Computed once per tick before runtime data is refreshed, so it always sees
// the previous tick's speed.
//
//   acceleration   : acceleration curve (input > 0) or reversing curve (< 0),
//                    scaled by input; 0 when acceleration is blocked
//   engine braking : engine braking curve
//   braking        : braking curve
//   turning        : steering curve × input, reversed when moving backward
//                    (speed below -movement_direction_tolerance), blended
//                    with last tick's turning force
// ==============================================================================

use crate::curve::{CurveKind, CurveProvider};
use crate::input::{MovementModifiers, VehicleInput};
use crate::math::lerp;
use crate::settings::VehicleSettings;

/// Turning forces at or under this magnitude count as released.
const TURNING_RELEASED: f32 = 0.2;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ForceState {
    pub acceleration: f32,
    pub engine_braking: f32,
    pub braking: f32,
    pub turning: f32,
}

pub trait ForceStrategy: Send {
    fn compute(
        &mut self,
        curves: &dyn CurveProvider,
        settings: &VehicleSettings,
        input: &VehicleInput,
        modifiers: MovementModifiers,
        speed: f32,
        previous: &ForceState,
    ) -> ForceState;
}

/// Default strategy: everything comes from the response curves.
#[derive(Debug, Default, Clone, Copy)]
pub struct CurveForces;

impl ForceStrategy for CurveForces {
    fn compute(
        &mut self,
        curves: &dyn CurveProvider,
        settings: &VehicleSettings,
        input: &VehicleInput,
        modifiers: MovementModifiers,
        speed: f32,
        previous: &ForceState,
    ) -> ForceState {
        compute_forces(curves, settings, input, modifiers, speed, previous)
    }
}

pub fn compute_forces(
    curves: &dyn CurveProvider,
    settings: &VehicleSettings,
    input: &VehicleInput,
    modifiers: MovementModifiers,
    speed: f32,
    previous: &ForceState,
) -> ForceState {
    let speed_abs = speed.abs();
    let throttle = input.acceleration();

    let acceleration = if modifiers.block_acceleration {
        0.0
    } else if throttle > 0.0 {
        curves.evaluate(CurveKind::Acceleration, speed_abs) * throttle
    } else if throttle < 0.0 {
        curves.evaluate(CurveKind::Reversing, speed_abs) * throttle
    } else {
        0.0
    };

    ForceState {
        acceleration,
        engine_braking: curves.evaluate(CurveKind::EngineBraking, speed_abs),
        braking: curves.evaluate(CurveKind::Braking, speed_abs),
        turning: turning_force(curves, settings, input.turning(), speed, previous.turning),
    }
}

fn turning_force(
    curves: &dyn CurveProvider,
    settings: &VehicleSettings,
    turning_input: f32,
    speed: f32,
    previous: f32,
) -> f32 {
    let damping = settings.steering.steering_damping;
    let moving_backward = speed < -settings.physics.movement_direction_tolerance;
    let was_released = previous.abs() <= TURNING_RELEASED;

    if turning_input == 0.0 {
        return if was_released { 0.0 } else { lerp(0.0, previous, damping) };
    }

    let mut fresh = curves.evaluate(CurveKind::Steering, speed.abs()) * turning_input;
    if moving_backward {
        fresh = -fresh;
    }

    if was_released {
        lerp(fresh, 0.0, damping)
    } else {
        lerp(fresh, previous, damping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::ResponseCurve;
    use crate::settings::VehicleSettings;

    fn settings() -> VehicleSettings {
        let mut s = VehicleSettings::default();
        s.engine.acceleration_curve = Some(ResponseCurve::constant(10.0));
        s.engine.reversing_curve = Some(ResponseCurve::constant(4.0));
        s.engine.engine_braking_curve = Some(ResponseCurve::constant(0.5));
        s.engine.braking_curve = Some(ResponseCurve::constant(20.0));
        s.steering.steering_curve = Some(ResponseCurve::constant(100.0));
        s
    }

    fn input(acc: f32, turn: f32) -> VehicleInput {
        let mut i = VehicleInput::default();
        i.set_acceleration(acc);
        i.set_turning(turn);
        i
    }

    fn compute(s: &VehicleSettings, i: &VehicleInput, speed: f32, prev: &ForceState) -> ForceState {
        compute_forces(s, s, i, MovementModifiers::default(), speed, prev)
    }

    #[test]
    fn throttle_sign_selects_curve() {
        let s = settings();
        let prev = ForceState::default();
        assert_eq!(compute(&s, &input(1.0, 0.0), 0.0, &prev).acceleration, 10.0);
        assert_eq!(compute(&s, &input(-0.5, 0.0), 0.0, &prev).acceleration, -2.0);
        assert_eq!(compute(&s, &input(0.0, 0.0), 0.0, &prev).acceleration, 0.0);
    }

    #[test]
    fn blocked_acceleration_is_zero() {
        let s = settings();
        let f = compute_forces(
            &s,
            &s,
            &input(1.0, 0.0),
            MovementModifiers { block_acceleration: true },
            0.0,
            &ForceState::default(),
        );
        assert_eq!(f.acceleration, 0.0);
        assert_eq!(f.braking, 20.0);
    }

    #[test]
    fn turning_ramps_from_rest() {
        let s = settings();
        let f = compute(&s, &input(0.0, 1.0), 50.0, &ForceState::default());
        // lerp(100, 0, 0.5)
        assert!((f.turning - 50.0).abs() < 1e-4);

        let f2 = compute(&s, &input(0.0, 1.0), 50.0, &f);
        assert!((f2.turning - 75.0).abs() < 1e-4);
    }

    #[test]
    fn turning_reverses_backwards() {
        let s = settings();
        let prev = ForceState { turning: -50.0, ..Default::default() };
        let f = compute(&s, &input(0.0, 1.0), -20.0, &prev);
        assert!((f.turning + 75.0).abs() < 1e-4);
    }

    #[test]
    fn creeping_backward_inside_tolerance_steers_forward() {
        let mut s = settings();
        s.physics.movement_direction_tolerance = 5.0;
        let prev = ForceState { turning: 10.0, ..Default::default() };

        // -2 km/h is inside the band: lerp(100, 10, 0.5)
        let f = compute(&s, &input(0.0, 1.0), -2.0, &prev);
        assert!((f.turning - 55.0).abs() < 1e-4);

        // -8 km/h is moving backward: lerp(-100, 10, 0.5)
        let f = compute(&s, &input(0.0, 1.0), -8.0, &prev);
        assert!((f.turning + 45.0).abs() < 1e-4);
    }

    #[test]
    fn sign_flip_is_smoothed() {
        let s = settings();
        let prev = ForceState { turning: 100.0, ..Default::default() };
        let f = compute(&s, &input(0.0, -1.0), 50.0, &prev);
        assert!((f.turning - 0.0).abs() < 1e-4);
    }

    #[test]
    fn release_decays_then_settles_at_zero() {
        let s = settings();
        let mut f = ForceState { turning: 80.0, ..Default::default() };
        let mut last = f.turning;
        for _ in 0..20 {
            f = compute(&s, &input(0.0, 0.0), 50.0, &f);
            assert!(f.turning.abs() <= last.abs());
            last = f.turning;
        }
        assert_eq!(f.turning, 0.0);
    }
}
