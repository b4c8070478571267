// ==============================================================================
// animation/mod.rs - PRESENTATION LAYER
// ------------------------------------------------------------------------------
// Reads a vehicle once per frame (AnimationFrame) and derives the visual pose:
// steering angle, wheel roll, suspension offset and swing, body tilt and roll.
// Never feeds back into the simulation.
// ==============================================================================

pub mod body;
pub mod settings;
pub mod static_animator;
pub mod wheels;

pub use body::{TiltState, body_roll};
pub use settings::{AnimationSettings, RollSettings, TankSettings, TiltParams, WheelSide};
pub use static_animator::{StaticAnimator, StaticPose};
pub use wheels::{SteeringSweep, WheelAnimationInfo, rolling_angle};

use crate::math::Vec3;
use crate::vehicle::Vehicle;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WheelSample {
    pub offset: f32,
    pub swing: f32,
    pub radius: f32,
    pub steering: bool,
}

/// Everything the animators read from a vehicle in one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationFrame {
    pub speed: f32, // km/h, signed
    pub turning_input: f32,
    pub is_moving_backward: bool,
    pub is_accelerating: bool,
    pub is_braking: bool,
    pub is_engine_braking: bool,
    pub last_applied_acceleration: f32,
    pub last_applied_braking: f32,
    pub local_velocity: Vec3,
    pub wheels: Vec<WheelSample>,
}

impl Vehicle {
    pub fn animation_frame(&self) -> AnimationFrame {
        AnimationFrame {
            speed: self.speed(),
            turning_input: self.active_input().turning(),
            is_moving_backward: self.is_moving_backward(),
            is_accelerating: self.is_accelerating(),
            is_braking: self.is_braking(),
            is_engine_braking: self.is_engine_braking(),
            last_applied_acceleration: self.last_applied_acceleration(),
            last_applied_braking: self.last_applied_braking(),
            local_velocity: self.local_velocity(),
            wheels: self
                .springs()
                .iter()
                .zip(&self.settings().suspension.springs)
                .map(|(state, spring)| WheelSample {
                    offset: state.wheel_offset,
                    swing: state.swing,
                    radius: spring.wheel_radius,
                    steering: spring.steering,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WheelPose {
    pub rotation: f32,
    pub offset: f32,
    pub swing: f32,
}

/// What a remote viewer needs to draw the vehicle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnimationPose {
    pub direction: f32,
    pub tilt: f32,
    pub roll: f32,
    pub wheels: Vec<WheelPose>,
}

#[derive(Debug, Clone, Default)]
pub struct VehicleAnimator {
    settings: AnimationSettings,
    wheels: Vec<WheelAnimationInfo>,
    steering: SteeringSweep,
    tilt: TiltState,
    roll: f32,
}

impl VehicleAnimator {
    pub fn new(settings: AnimationSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn settings(&self) -> &AnimationSettings {
        &self.settings
    }

    pub fn wheels(&self) -> &[WheelAnimationInfo] {
        &self.wheels
    }

    pub(crate) fn wheels_mut(&mut self) -> &mut Vec<WheelAnimationInfo> {
        &mut self.wheels
    }

    pub fn direction(&self) -> f32 {
        self.steering.current
    }

    pub fn tilt(&self) -> f32 {
        self.tilt.current
    }

    pub fn roll(&self) -> f32 {
        self.roll
    }

    /// Rebuilds the registry with one entry per wheel; sides come from the
    /// settings when configured.
    pub fn allocate_wheels(&mut self, samples: &[WheelSample]) {
        let sides = &self.settings.wheels.sides;
        self.wheels = samples
            .iter()
            .enumerate()
            .map(|(i, sample)| WheelAnimationInfo {
                side: sides.get(i).copied().unwrap_or_default(),
                is_steering: sample.steering,
                ..Default::default()
            })
            .collect();
    }

    pub fn update(&mut self, frame: &AnimationFrame, dt: f32) {
        if self.wheels.len() != frame.wheels.len() {
            self.allocate_wheels(&frame.wheels);
        }
        self.update_wheels(frame, dt);
        self.update_body(frame, dt);
    }

    pub(crate) fn update_wheels(&mut self, frame: &AnimationFrame, dt: f32) {
        let wheel_settings = &self.settings.wheels;
        self.steering.update(frame.turning_input, wheel_settings, dt);

        match &self.settings.tank {
            Some(tank) => wheels::rotate_tracks(
                &mut self.wheels,
                frame,
                wheel_settings,
                tank,
                self.steering.current,
                dt,
            ),
            None => wheels::rotate_wheels(&mut self.wheels, frame, wheel_settings, dt),
        }

        for (wheel, sample) in self.wheels.iter_mut().zip(&frame.wheels) {
            wheel.offset = sample.offset;
            wheel.swing = sample.swing;
        }
    }

    pub(crate) fn update_body(&mut self, frame: &AnimationFrame, dt: f32) {
        self.tilt.update(
            frame,
            &self.settings.acceleration_tilt,
            &self.settings.braking_tilt,
            dt,
        );
        self.roll = body_roll(frame.local_velocity.y, &self.settings.roll);
    }

    pub fn pose(&self) -> AnimationPose {
        AnimationPose {
            direction: self.steering.current,
            tilt: self.tilt.current,
            roll: self.roll,
            wheels: self
                .wheels
                .iter()
                .map(|w| WheelPose {
                    rotation: w.rotation,
                    offset: w.offset,
                    swing: w.swing,
                })
                .collect(),
        }
    }
}
