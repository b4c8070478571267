use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WheelSide {
    #[default]
    None,
    Left,
    Right,
}

impl WheelSide {
    /// +Y is left in body space; wheels on the centre line have no side.
    pub fn from_local_y(y: f32) -> Self {
        if y > 0.0 {
            WheelSide::Left
        } else if y < 0.0 {
            WheelSide::Right
        } else {
            WheelSide::None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelAnimationSettings {
    /// Degrees of steering at full turning input.
    #[serde(default = "default_max_direction")]
    pub max_direction: f32,
    /// Seconds for a full 0 → max steering sweep.
    #[serde(default = "default_transition_time")]
    pub transition_time: f32,
    #[serde(default = "default_true")]
    pub stop_rotation_on_braking: bool,
    /// One entry per wheel, spring order. The static animator requires it to
    /// match the spring count.
    #[serde(default)]
    pub sides: Vec<WheelSide>,
}

fn default_max_direction() -> f32 {
    50.0
}
fn default_transition_time() -> f32 {
    0.3
}
fn default_true() -> bool {
    true
}

impl Default for WheelAnimationSettings {
    fn default() -> Self {
        Self {
            max_direction: default_max_direction(),
            transition_time: default_transition_time(),
            stop_rotation_on_braking: true,
            sides: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TiltParams {
    #[serde(default = "default_tilt_angle")]
    pub max_angle: f32,
    /// Oscillation speed, rad/s.
    #[serde(default = "default_tilt_speed")]
    pub speed: f32,
    #[serde(default = "default_tilt_damping")]
    pub damping: f32,
    /// Applied acceleration/braking that gives the full max angle.
    #[serde(default = "default_tilt_target")]
    pub acceleration_target: f32,
    /// km/h
    #[serde(default = "default_damping_speed")]
    pub damping_speed: f32,
}

fn default_tilt_angle() -> f32 {
    10.0
}
fn default_tilt_speed() -> f32 {
    10.0
}
fn default_tilt_damping() -> f32 {
    5.0
}
fn default_tilt_target() -> f32 {
    10.0
}
fn default_damping_speed() -> f32 {
    150.0
}

impl Default for TiltParams {
    fn default() -> Self {
        Self {
            max_angle: default_tilt_angle(),
            speed: default_tilt_speed(),
            damping: default_tilt_damping(),
            acceleration_target: default_tilt_target(),
            damping_speed: default_damping_speed(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollSettings {
    #[serde(default = "default_roll_angle")]
    pub max_angle: f32,
    #[serde(default = "default_roll_strength")]
    pub strength: f32,
    #[serde(default = "default_damping_speed")]
    pub damping_speed: f32,
}

fn default_roll_angle() -> f32 {
    7.0
}
fn default_roll_strength() -> f32 {
    5.0
}

impl Default for RollSettings {
    fn default() -> Self {
        Self {
            max_angle: default_roll_angle(),
            strength: default_roll_strength(),
            damping_speed: default_damping_speed(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TankSettings {
    #[serde(default = "default_in_place")]
    pub in_place_rotation_multiplier: f32,
    #[serde(default = "default_side_multiplier")]
    pub side_rotation_multiplier: f32,
    /// km/h under which turning spins the tracks in opposite directions.
    #[serde(default = "default_inverse_speed")]
    pub inverse_rotation_speed: f32,
}

fn default_in_place() -> f32 {
    1.0
}
fn default_side_multiplier() -> f32 {
    0.5
}
fn default_inverse_speed() -> f32 {
    5.0
}

impl Default for TankSettings {
    fn default() -> Self {
        Self {
            in_place_rotation_multiplier: default_in_place(),
            side_rotation_multiplier: default_side_multiplier(),
            inverse_rotation_speed: default_inverse_speed(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationSettings {
    #[serde(default)]
    pub wheels: WheelAnimationSettings,
    #[serde(default)]
    pub acceleration_tilt: TiltParams,
    #[serde(default)]
    pub braking_tilt: TiltParams,
    #[serde(default)]
    pub roll: RollSettings,
    /// Present for tracked vehicles.
    #[serde(default)]
    pub tank: Option<TankSettings>,
}
