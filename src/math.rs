// ==============================================================================
// math.rs - SCALAR + FRAME HELPERS SHARED BY EVERY PHASE
// ------------------------------------------------------------------------------
// Frame convention (right-handed, body local):
//   +X forward, +Y left, +Z up
// World units are centimetres; speeds shown to gameplay code are km/h.
// Angular velocities are kept in degrees per second.
//
// Euler angles used by stabilization and animation are (roll, pitch, yaw) in
// degrees about X, Y, Z respectively.
// ==============================================================================

use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};

pub type Vec3 = Vector3<f32>;
pub type Pos3 = Point3<f32>;
pub type Quat = UnitQuaternion<f32>;
pub type Transform = Isometry3<f32>;

/// units/s (cm/s) → km/h
pub const KMH_MULTIPLIER: f32 = 0.036;

#[inline]
pub fn lerp(a: f32, b: f32, alpha: f32) -> f32 {
    a + (b - a) * alpha
}

#[inline]
pub fn lerp_vec(a: &Vec3, b: &Vec3, alpha: f32) -> Vec3 {
    a + (b - a) * alpha
}

#[inline]
pub fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Three-way sign: -1, 0 or 1. `f32::signum` reports 1 for +0.
#[inline]
pub fn sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[inline]
pub fn is_nearly_zero(v: f32, tolerance: f32) -> bool {
    v.abs() <= tolerance
}

/// Maps `value` from `input` range to `output` range, clamped to the output.
/// A degenerate input range collapses to the output's lower bound.
pub fn map_range_clamped(input: (f32, f32), output: (f32, f32), value: f32) -> f32 {
    let span = input.1 - input.0;
    if span.abs() <= f32::EPSILON {
        return output.0;
    }
    let alpha = clamp01((value - input.0) / span);
    lerp(output.0, output.1, alpha)
}

/// Right vector of a body in world space (local -Y).
#[inline]
pub fn right_vector(rotation: &Quat) -> Vec3 {
    rotation * -Vec3::y()
}

#[inline]
pub fn forward_vector(rotation: &Quat) -> Vec3 {
    rotation * Vec3::x()
}

#[inline]
pub fn up_vector(rotation: &Quat) -> Vec3 {
    rotation * Vec3::z()
}

/// (roll, pitch, yaw) in degrees.
pub fn euler_degrees(rotation: &Quat) -> (f32, f32, f32) {
    let (r, p, y) = rotation.euler_angles();
    (r.to_degrees(), p.to_degrees(), y.to_degrees())
}

pub fn from_euler_degrees(roll: f32, pitch: f32, yaw: f32) -> Quat {
    Quat::from_euler_angles(roll.to_radians(), pitch.to_radians(), yaw.to_radians())
}

/// Angle between two rotations, in degrees.
#[inline]
pub fn angular_distance_deg(a: &Quat, b: &Quat) -> f32 {
    a.angle_to(b).to_degrees()
}

/// Rotation angle of a delta quaternion, in degrees.
#[inline]
pub fn rotation_angle_deg(q: &Quat) -> f32 {
    q.angle().to_degrees()
}

/// Slerp that falls back to the nearer endpoint for opposite rotations.
pub fn slerp(a: &Quat, b: &Quat, alpha: f32) -> Quat {
    a.try_slerp(b, alpha, 1.0e-6)
        .unwrap_or(if alpha < 0.5 { *a } else { *b })
}

/// Pitch of a direction vector in radians (angle above the XY plane).
pub fn vector_pitch(v: &Vec3) -> f32 {
    let horizontal = (v.x * v.x + v.y * v.y).sqrt();
    v.z.atan2(horizontal)
}
