// ==============================================================================
// correction.rs - ERROR CORRECTION CHANNELS
// ------------------------------------------------------------------------------
// One channel per corrected quantity (location, rotation, linear velocity,
// angular velocity). A channel is armed when an authoritative snapshot lands
// and is stepped once per pre-physics tick until the remaining error drops
// under the correcting threshold (1 unit / 1 degree).
//
// Per tick:
//   |error| > snap   → jump to target, stop correcting
//   otherwise        → error = lerp(error, 0, exponent), live += error
// ==============================================================================

use crate::math::{Quat, Vec3, lerp_vec, rotation_angle_deg, slerp};

pub const CORRECTION_THRESHOLD: f32 = 1.0;
pub const ROTATION_CORRECTION_THRESHOLD_DEG: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorCorrection {
    pub target: Vec3,
    pub error: Vec3,
    pub is_correcting: bool,
}

impl Default for VectorCorrection {
    fn default() -> Self {
        Self {
            target: Vec3::zeros(),
            error: Vec3::zeros(),
            is_correcting: false,
        }
    }
}

impl VectorCorrection {
    pub fn arm(&mut self, authoritative: Vec3, historical: Vec3) {
        self.target = authoritative;
        self.error = authoritative - historical;
        self.is_correcting = self.error.norm() > CORRECTION_THRESHOLD;
    }

    /// Steps the channel and returns the corrected live value.
    /// `snap_distance` of `None` never snaps.
    pub fn step(
        &mut self,
        live: Vec3,
        snap_distance: Option<f32>,
        exponent: f32,
        enhanced: bool,
    ) -> Vec3 {
        if !self.is_correcting {
            return live;
        }

        if snap_distance.is_some_and(|snap| self.error.norm() > snap) {
            self.is_correcting = false;
            self.error = Vec3::zeros();
            return self.target;
        }

        if enhanced {
            self.error = self.target - live;
        }
        self.error = lerp_vec(&self.error, &Vec3::zeros(), exponent);
        self.is_correcting = self.error.norm() > CORRECTION_THRESHOLD;
        live + self.error
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationCorrection {
    pub target: Quat,
    /// Delta that takes the live rotation to the target (post-multiplied).
    pub error: Quat,
    pub is_correcting: bool,
}

impl Default for RotationCorrection {
    fn default() -> Self {
        Self {
            target: Quat::identity(),
            error: Quat::identity(),
            is_correcting: false,
        }
    }
}

impl RotationCorrection {
    pub fn arm(&mut self, authoritative: Quat, historical: Quat) {
        self.target = authoritative;
        self.error = historical.inverse() * authoritative;
        self.is_correcting = rotation_angle_deg(&self.error) > ROTATION_CORRECTION_THRESHOLD_DEG;
    }

    pub fn step(&mut self, live: Quat, snap_angle_deg: f32, exponent: f32, enhanced: bool) -> Quat {
        if !self.is_correcting {
            return live;
        }

        if rotation_angle_deg(&self.error) > snap_angle_deg {
            self.is_correcting = false;
            self.error = Quat::identity();
            return self.target;
        }

        if enhanced {
            self.error = live.inverse() * self.target;
        }
        self.error = slerp(&self.error, &Quat::identity(), exponent);
        self.is_correcting = rotation_angle_deg(&self.error) > ROTATION_CORRECTION_THRESHOLD_DEG;
        live * self.error
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Corrections {
    pub location: VectorCorrection,
    pub rotation: RotationCorrection,
    pub linear_velocity: VectorCorrection,
    pub angular_velocity: VectorCorrection,
}

impl Corrections {
    pub fn reset(&mut self) {
        self.location.reset();
        self.rotation.reset();
        self.linear_velocity.reset();
        self.angular_velocity.reset();
    }

    pub fn any_correcting(&self) -> bool {
        self.location.is_correcting
            || self.rotation.is_correcting
            || self.linear_velocity.is_correcting
            || self.angular_velocity.is_correcting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::from_euler_degrees;

    #[test]
    fn small_error_is_not_corrected() {
        let mut c = VectorCorrection::default();
        c.arm(Vec3::new(0.5, 0.0, 0.0), Vec3::zeros());
        assert!(!c.is_correcting);
        assert_eq!(c.step(Vec3::zeros(), Some(150.0), 0.9, false), Vec3::zeros());
    }

    #[test]
    fn large_error_snaps_and_stops() {
        let mut c = VectorCorrection::default();
        c.arm(Vec3::new(500.0, 0.0, 0.0), Vec3::zeros());
        assert!(c.is_correcting);

        let live = c.step(Vec3::new(3.0, 0.0, 0.0), Some(150.0), 0.9, false);
        assert_eq!(live, Vec3::new(500.0, 0.0, 0.0));
        assert!(!c.is_correcting);
    }

    #[test]
    fn moderate_error_decays() {
        let mut c = VectorCorrection::default();
        c.arm(Vec3::new(50.0, 0.0, 0.0), Vec3::zeros());

        let live = c.step(Vec3::zeros(), Some(150.0), 0.9, false);
        assert!((live.x - 5.0).abs() < 1e-4);
        assert!(c.is_correcting);

        // 5 → 0.5, under the threshold
        let live = c.step(live, Some(150.0), 0.9, false);
        assert!((live.x - 5.5).abs() < 1e-3);
        assert!(!c.is_correcting);
    }

    #[test]
    fn velocity_channel_never_snaps() {
        let mut c = VectorCorrection::default();
        c.arm(Vec3::new(10_000.0, 0.0, 0.0), Vec3::zeros());
        let live = c.step(Vec3::zeros(), None, 0.9, false);
        assert!((live.x - 1000.0).abs() < 1e-2);
    }

    #[test]
    fn enhanced_mode_remeasures_against_live() {
        let mut c = VectorCorrection::default();
        c.arm(Vec3::new(100.0, 0.0, 0.0), Vec3::zeros());
        let live = c.step(Vec3::new(95.0, 0.0, 0.0), Some(150.0), 0.9, true);
        assert!((live.x - 95.5).abs() < 1e-3);
        assert!(!c.is_correcting);
    }

    #[test]
    fn rotation_snaps_over_angle() {
        let mut c = RotationCorrection::default();
        let target = from_euler_degrees(0.0, 0.0, 20.0);
        c.arm(target, Quat::identity());
        assert!(c.is_correcting);
        let live = c.step(Quat::identity(), 3.0, 0.9, false);
        assert_eq!(live, target);
        assert!(!c.is_correcting);
    }

    #[test]
    fn rotation_decays_under_snap() {
        let mut c = RotationCorrection::default();
        let target = from_euler_degrees(0.0, 0.0, 2.5);
        c.arm(target, Quat::identity());
        let live = c.step(Quat::identity(), 3.0, 0.9, false);
        assert!((rotation_angle_deg(&live) - 0.25).abs() < 0.05);
        assert!(!c.is_correcting);
    }

    #[test]
    fn reset_clears_every_channel() {
        let mut all = Corrections::default();
        all.location.arm(Vec3::new(50.0, 0.0, 0.0), Vec3::zeros());
        all.angular_velocity.arm(Vec3::new(0.0, 0.0, 90.0), Vec3::zeros());
        assert!(all.any_correcting());
        all.reset();
        assert!(!all.any_correcting());
    }
}
