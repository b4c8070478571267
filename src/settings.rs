// ==============================================================================
// settings.rs - VEHICLE TUNING
// ------------------------------------------------------------------------------
// VehicleSettings is immutable for a simulation epoch. Replacing it (or any of
// its groups) un-initializes the vehicle until settings are applied again.
//
// Groups:
//   physics     : stabilization, friction, network correction, gravity
//   engine      : acceleration/reversing/engine-braking/braking curves, max speeds
//   steering    : steering curve, damping, drift tuning
//   suspension  : traces + per-spring tuning
//   advanced    : per-phase toggles
// ==============================================================================

use crate::curve::{CurveKind, CurveProvider, ResponseCurve};
use crate::math::Vec3;
use serde::{Deserialize, Serialize};

/// Collision channel bits understood by ground probes.
pub const COLLISION_WORLD_STATIC: u32 = 0b0001;
pub const COLLISION_VEHICLE: u32 = 0b0010;

fn default_true() -> bool {
    true
}

// --------------------------------------------------
// Physics
// --------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsSettings {
    #[serde(default = "default_stabilization_force")]
    pub stabilization_force: f32,

    #[serde(default = "default_friction_force")]
    pub friction_force: f32,

    /// km/h of lateral slip above which friction no longer bites.
    #[serde(default = "default_friction_force_threshold")]
    pub friction_force_threshold: f32,

    /// km/h under which the lateral position is pinned to an anchor.
    #[serde(default = "default_total_friction_speed_threshold")]
    pub total_friction_speed_threshold: f32,

    /// km/h dead zone for moving forward/backward queries.
    #[serde(default)]
    pub movement_direction_tolerance: f32,

    #[serde(default = "default_correction_exponent")]
    pub correction_exponent: f32,

    #[serde(default = "default_location_snap_distance")]
    pub location_snap_distance: f32,

    /// Degrees.
    #[serde(default = "default_rotation_snap_distance")]
    pub rotation_snap_distance: f32,

    #[serde(default)]
    pub enhance_correction: bool,

    #[serde(default)]
    pub custom_gravity: bool,

    #[serde(default = "default_gravity")]
    pub gravity: Vec3,

    /// Multiplier on delta time for every force phase except suspension.
    #[serde(default = "default_force_time_scale")]
    pub force_time_scale: f32,
}

fn default_stabilization_force() -> f32 {
    30.0
}
fn default_friction_force() -> f32 {
    0.7
}
fn default_friction_force_threshold() -> f32 {
    5.0
}
fn default_total_friction_speed_threshold() -> f32 {
    5.0
}
fn default_correction_exponent() -> f32 {
    0.9
}
fn default_location_snap_distance() -> f32 {
    150.0
}
fn default_rotation_snap_distance() -> f32 {
    3.0
}
fn default_gravity() -> Vec3 {
    Vec3::new(0.0, 0.0, -980.0)
}
fn default_force_time_scale() -> f32 {
    1.0
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            stabilization_force: default_stabilization_force(),
            friction_force: default_friction_force(),
            friction_force_threshold: default_friction_force_threshold(),
            total_friction_speed_threshold: default_total_friction_speed_threshold(),
            movement_direction_tolerance: 0.0,
            correction_exponent: default_correction_exponent(),
            location_snap_distance: default_location_snap_distance(),
            rotation_snap_distance: default_rotation_snap_distance(),
            enhance_correction: false,
            custom_gravity: false,
            gravity: default_gravity(),
            force_time_scale: default_force_time_scale(),
        }
    }
}

// --------------------------------------------------
// Engine
// --------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default)]
    pub acceleration_curve: Option<ResponseCurve>,

    #[serde(default)]
    pub reversing_curve: Option<ResponseCurve>,

    #[serde(default)]
    pub engine_braking_curve: Option<ResponseCurve>,

    #[serde(default)]
    pub braking_curve: Option<ResponseCurve>,

    /// km/h
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,

    /// km/h
    #[serde(default = "default_max_reverse_speed")]
    pub max_reverse_speed: f32,

    #[serde(default = "default_true")]
    pub scale_acceleration_by_drive_wheels: bool,
}

fn default_max_speed() -> f32 {
    180.0
}
fn default_max_reverse_speed() -> f32 {
    50.0
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            acceleration_curve: None,
            reversing_curve: None,
            engine_braking_curve: None,
            braking_curve: None,
            max_speed: default_max_speed(),
            max_reverse_speed: default_max_reverse_speed(),
            scale_acceleration_by_drive_wheels: true,
        }
    }
}

// --------------------------------------------------
// Steering
// --------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteeringSettings {
    #[serde(default)]
    pub steering_curve: Option<ResponseCurve>,

    #[serde(default)]
    pub allow_steering_while_braking: bool,

    /// Blend factor between the fresh and previous turning force.
    #[serde(default = "default_steering_damping")]
    pub steering_damping: f32,

    /// Linear adherence coefficient.
    #[serde(default = "default_one")]
    pub linear_damping: f32,

    /// Angular adherence coefficient.
    #[serde(default = "default_one")]
    pub angular_damping: f32,

    #[serde(default = "default_drift_percentage")]
    pub drift_adherence_percentage: f32,

    #[serde(default = "default_drift_percentage")]
    pub drift_rotation_percentage: f32,

    #[serde(default = "default_drift_recovery_speed")]
    pub drift_recovery_speed: f32,

    /// km/h
    #[serde(default = "default_drift_min_speed")]
    pub drift_min_speed: f32,
}

fn default_steering_damping() -> f32 {
    0.5
}
fn default_one() -> f32 {
    1.0
}
fn default_drift_percentage() -> f32 {
    0.1
}
fn default_drift_recovery_speed() -> f32 {
    0.1
}
fn default_drift_min_speed() -> f32 {
    30.0
}

impl Default for SteeringSettings {
    fn default() -> Self {
        Self {
            steering_curve: None,
            allow_steering_while_braking: false,
            steering_damping: default_steering_damping(),
            linear_damping: 1.0,
            angular_damping: 1.0,
            drift_adherence_percentage: default_drift_percentage(),
            drift_rotation_percentage: default_drift_percentage(),
            drift_recovery_speed: default_drift_recovery_speed(),
            drift_min_speed: default_drift_min_speed(),
        }
    }
}

// --------------------------------------------------
// Suspension
// --------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspensionSpring {
    /// Bone (skeletal) or socket (static) name; resolved once at init.
    pub attachment: String,

    #[serde(default)]
    pub spring_force: f32,

    #[serde(default)]
    pub target_height: f32,

    #[serde(default)]
    pub damping: f32,

    #[serde(default = "default_wheel_radius")]
    pub wheel_radius: f32,

    #[serde(default)]
    pub steering: bool,

    #[serde(default = "default_true")]
    pub drive: bool,

    #[serde(default = "default_swing_pivot")]
    pub swing_pivot: f32,

    /// Degrees, (min, max).
    #[serde(default)]
    pub swing_min_max: (f32, f32),

    /// Units, (min, max). Min is full droop.
    #[serde(default)]
    pub offset_min_max: (f32, f32),
}

fn default_wheel_radius() -> f32 {
    35.0
}
fn default_swing_pivot() -> f32 {
    0.5
}

impl SuspensionSpring {
    pub fn new(attachment: impl Into<String>) -> Self {
        Self {
            attachment: attachment.into(),
            spring_force: 0.0,
            target_height: 0.0,
            damping: 0.0,
            wheel_radius: default_wheel_radius(),
            steering: false,
            drive: true,
            swing_pivot: default_swing_pivot(),
            swing_min_max: (0.0, 0.0),
            offset_min_max: (0.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspensionSettings {
    #[serde(default)]
    pub trace_length: f32,

    /// Anti-sink margin: traces start this far above the spring.
    #[serde(default = "default_trace_up_offset")]
    pub trace_up_offset: f32,

    /// Sphere radius; 0 casts a ray.
    #[serde(default)]
    pub trace_thickness: f32,

    #[serde(default = "default_collision_mask")]
    pub collision_mask: u32,

    /// Lets the spring pull the body down onto the ground.
    #[serde(default)]
    pub ground_snapping: bool,

    #[serde(default)]
    pub suspension_stabilization: bool,

    #[serde(default = "default_stabilization_multiplier")]
    pub stabilization_multiplier: f32,

    #[serde(default)]
    pub parent_bone: Option<String>,

    #[serde(default)]
    pub springs: Vec<SuspensionSpring>,
}

fn default_trace_up_offset() -> f32 {
    50.0
}
fn default_collision_mask() -> u32 {
    COLLISION_WORLD_STATIC
}
fn default_stabilization_multiplier() -> f32 {
    5.0
}

impl Default for SuspensionSettings {
    fn default() -> Self {
        Self {
            trace_length: 0.0,
            trace_up_offset: default_trace_up_offset(),
            trace_thickness: 0.0,
            collision_mask: default_collision_mask(),
            ground_snapping: false,
            suspension_stabilization: false,
            stabilization_multiplier: default_stabilization_multiplier(),
            parent_bone: None,
            springs: Vec::new(),
        }
    }
}

// --------------------------------------------------
// Advanced
// --------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdvancedSettings {
    #[serde(default = "default_true")]
    pub disable_physics_in_sequencer: bool,
    #[serde(default = "default_true")]
    pub enable_suspension: bool,
    #[serde(default = "default_true")]
    pub enable_adherence: bool,
    #[serde(default = "default_true")]
    pub enable_acceleration: bool,
    #[serde(default = "default_true")]
    pub enable_turning: bool,
    #[serde(default = "default_true")]
    pub enable_friction: bool,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            disable_physics_in_sequencer: true,
            enable_suspension: true,
            enable_adherence: true,
            enable_acceleration: true,
            enable_turning: true,
            enable_friction: true,
        }
    }
}

// --------------------------------------------------
// VehicleSettings
// --------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleSettings {
    #[serde(default)]
    pub physics: PhysicsSettings,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub steering: SteeringSettings,
    #[serde(default)]
    pub suspension: SuspensionSettings,
    #[serde(default)]
    pub advanced: AdvancedSettings,
}

impl VehicleSettings {
    fn curve(&self, kind: CurveKind) -> Option<&ResponseCurve> {
        match kind {
            CurveKind::Acceleration => self.engine.acceleration_curve.as_ref(),
            CurveKind::Reversing => self.engine.reversing_curve.as_ref(),
            CurveKind::EngineBraking => self.engine.engine_braking_curve.as_ref(),
            CurveKind::Braking => self.engine.braking_curve.as_ref(),
            CurveKind::Steering => self.steering.steering_curve.as_ref(),
        }
    }

    pub fn drive_wheel_count(&self) -> usize {
        self.suspension.springs.iter().filter(|s| s.drive).count()
    }

    pub fn steering_wheel_count(&self) -> usize {
        self.suspension.springs.iter().filter(|s| s.steering).count()
    }
}

impl CurveProvider for VehicleSettings {
    fn has_curve(&self, kind: CurveKind) -> bool {
        self.curve(kind).is_some()
    }

    fn evaluate(&self, kind: CurveKind, x: f32) -> f32 {
        self.curve(kind).map_or(0.0, |c| c.evaluate(x))
    }
}
