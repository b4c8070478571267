//! Body tilt (pitch kick on throttle / brake onset) and roll (lean from lateral
//! slip). Angles in degrees.

use super::AnimationFrame;
use super::settings::{RollSettings, TiltParams};
use crate::math::{KMH_MULTIPLIER, sign};

/// Damped oscillator re-triggered when acceleration or braking starts while
/// the body is nearly level.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TiltState {
    pub current: f32,
    timer: f32,
    active: Option<TiltParams>,
    was_accelerating: bool,
    was_braking: bool,
}

impl TiltState {
    pub fn update(
        &mut self,
        frame: &AnimationFrame,
        acceleration: &TiltParams,
        braking: &TiltParams,
        dt: f32,
    ) {
        let accelerating = frame.is_accelerating;
        let braking_now = frame.is_braking;

        let started = (accelerating && !self.was_accelerating) || (braking_now && !self.was_braking);
        if started && self.current.abs() < 0.1 {
            self.timer = 0.0;

            let mut params = if accelerating { *acceleration } else { *braking };
            let mut ratio = if params.damping_speed != 0.0 {
                (frame.speed / params.damping_speed).abs().clamp(0.0, 1.0)
            } else {
                0.0
            };
            if accelerating {
                ratio = 1.0 - ratio;
            }
            params.speed *= ratio;

            let applied = if accelerating {
                frame.last_applied_acceleration.abs()
            } else {
                frame.last_applied_braking.abs()
            };
            let strength = if params.acceleration_target != 0.0 {
                (applied / params.acceleration_target).clamp(0.0, 1.0)
            } else {
                1.0
            };
            params.max_angle *= strength;

            let mut direction = sign(frame.last_applied_acceleration);
            if direction == 0.0 {
                direction = sign(frame.speed);
            }
            params.max_angle *= if accelerating { direction } else { -direction };

            self.active = Some(params);
        }

        self.was_accelerating = accelerating;
        self.was_braking = braking_now;

        let Some(params) = self.active else {
            return;
        };
        self.timer += dt;
        self.current =
            params.max_angle * (-params.damping * self.timer).exp() * (params.speed * self.timer).sin();
    }
}

pub fn body_roll(lateral_velocity: f32, settings: &RollSettings) -> f32 {
    let slip = if settings.damping_speed != 0.0 {
        (lateral_velocity * KMH_MULTIPLIER / settings.damping_speed).clamp(-1.0, 1.0)
    } else {
        0.0
    };
    let roll = (slip * settings.max_angle).clamp(-settings.max_angle, settings.max_angle);
    roll * settings.strength
}
