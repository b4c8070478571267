// ==============================================================================
// animation/wheels.rs - WHEEL STEERING + ROLLING
// ------------------------------------------------------------------------------
// Steering angle : linear sweep toward turning * max_direction, re-targeted
//                  whenever the target changes, clamped to the sweep bracket.
// Rolling        : distance travelled / wheel perimeter, in degrees.
//                  Tracked vehicles counter-rotate sides when turning in place
//                  and slow the inner side while turning on the move.
// ==============================================================================

use super::AnimationFrame;
use super::settings::{TankSettings, WheelAnimationSettings, WheelSide};
use crate::math::Transform;
use std::f32::consts::PI;

#[derive(Debug, Clone, PartialEq)]
pub struct WheelAnimationInfo {
    /// Accumulated rolling angle, degrees.
    pub rotation: f32,
    pub offset: f32,
    pub swing: f32,
    pub side: WheelSide,
    pub is_steering: bool,
    /// Static meshes only: mesh socket and its rest transform.
    pub socket: Option<String>,
    pub initial_relative: Transform,
}

impl Default for WheelAnimationInfo {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            offset: 0.0,
            swing: 0.0,
            side: WheelSide::None,
            is_steering: false,
            socket: None,
            initial_relative: Transform::identity(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SteeringSweep {
    pub current: f32,
    begin: f32,
    end: f32,
    timer: f32,
    duration: f32,
}

impl SteeringSweep {
    pub fn target(&self) -> f32 {
        self.end
    }

    pub fn update(&mut self, turning: f32, settings: &WheelAnimationSettings, dt: f32) {
        let target = turning * settings.max_direction;
        if target != self.end {
            self.timer = 0.0;
            self.begin = self.current;
            self.end = target;
            self.duration = if settings.max_direction != 0.0 {
                (settings.transition_time * (target - self.current) / settings.max_direction).abs()
            } else {
                0.0
            };
        }

        if self.timer < self.duration {
            self.timer += dt;
            let swept = (self.end - self.begin) * self.timer / self.duration + self.begin;
            self.current = swept.clamp(self.begin.min(self.end), self.begin.max(self.end));
        } else {
            self.timer = 0.0;
            self.duration = 0.0;
            self.current = self.end;
        }
    }
}

/// Degrees a wheel of `radius` cm turns while covering `speed` km/h for `dt`.
pub fn rolling_angle(speed: f32, radius: f32, dt: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    let perimeter = 2.0 * PI * radius * 0.01;
    let travelled = speed.abs() / 3.6 * dt;
    travelled / perimeter * 360.0
}

fn should_rotate(frame: &AnimationFrame, settings: &WheelAnimationSettings) -> bool {
    !settings.stop_rotation_on_braking || !frame.is_braking || frame.is_engine_braking
}

fn travel_direction(frame: &AnimationFrame) -> f32 {
    if frame.is_moving_backward { 1.0 } else { -1.0 }
}

pub fn rotate_wheels(
    wheels: &mut [WheelAnimationInfo],
    frame: &AnimationFrame,
    settings: &WheelAnimationSettings,
    dt: f32,
) {
    if !should_rotate(frame, settings) || frame.speed == 0.0 {
        return;
    }
    let direction = travel_direction(frame);
    for (wheel, sample) in wheels.iter_mut().zip(&frame.wheels) {
        wheel.rotation += rolling_angle(frame.speed, sample.radius, dt) * direction;
    }
}

pub fn rotate_tracks(
    wheels: &mut [WheelAnimationInfo],
    frame: &AnimationFrame,
    settings: &WheelAnimationSettings,
    tank: &TankSettings,
    steering_angle: f32,
    dt: f32,
) {
    if !should_rotate(frame, settings) {
        return;
    }
    let direction = travel_direction(frame);
    let turning = frame.turning_input;

    for (wheel, sample) in wheels.iter_mut().zip(&frame.wheels) {
        let side = wheel.side;
        if side == WheelSide::None {
            continue;
        }

        if frame.speed.abs() <= tank.inverse_rotation_speed {
            if turning == 0.0 {
                continue;
            }
            let spin = if (side == WheelSide::Left && turning > 0.0)
                || (side == WheelSide::Right && turning < 0.0)
            {
                -1.0
            } else {
                1.0
            };
            wheel.rotation +=
                rolling_angle(turning, sample.radius, dt) * spin * tank.in_place_rotation_multiplier;
            continue;
        }

        let multiplier = if steering_angle == 0.0 {
            1.0
        } else {
            let ratio = if settings.max_direction > 0.0 {
                (steering_angle.abs() / settings.max_direction).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let alpha = (1.0 - ratio).max(0.01);
            let inner = (side == WheelSide::Left && steering_angle < 0.0)
                || (side == WheelSide::Right && steering_angle > 0.0);
            if inner {
                (alpha * tank.side_rotation_multiplier).clamp(0.01, 1.0)
            } else {
                1.0
            }
        };
        wheel.rotation += rolling_angle(frame.speed, sample.radius, dt) * direction * multiplier;
    }
}
