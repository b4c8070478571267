//! Driver input for one vehicle.
//!
//! Axes are kept as floats locally and quantized to 8 bits only on the wire
//! (see `protocol`). Internal flags (drift, stabilization) are named fields;
//! custom flags stay a raw byte because their meaning belongs to the game.

use crate::math::lerp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleInput {
    acceleration: f32,
    turning: f32,
    custom: f32,
    custom_flags: u8,
    pub drifting: bool,
    pub stabilizing: bool,
}

impl VehicleInput {
    // Internal flag bits as they cross the wire
    pub const DRIFTING: u8 = 1 << 0;
    pub const STABILIZING: u8 = 1 << 1;

    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    pub fn turning(&self) -> f32 {
        self.turning
    }

    pub fn custom(&self) -> f32 {
        self.custom
    }

    pub fn custom_flags(&self) -> u8 {
        self.custom_flags
    }

    pub fn set_acceleration(&mut self, value: f32) {
        self.acceleration = clamp_axis(value);
    }

    pub fn set_turning(&mut self, value: f32) {
        self.turning = clamp_axis(value);
    }

    pub fn set_custom(&mut self, value: f32) {
        self.custom = clamp_axis(value);
    }

    pub fn set_custom_flags(&mut self, flags: u8) {
        self.custom_flags = flags;
    }

    #[inline]
    pub fn set_custom_flag(&mut self, flag: u8, enabled: bool) {
        if enabled {
            self.custom_flags |= flag;
        } else {
            self.custom_flags &= !flag;
        }
    }

    #[inline]
    pub const fn has_custom_flag(&self, flag: u8) -> bool {
        self.custom_flags & flag != 0
    }

    pub fn internal_bits(&self) -> u8 {
        let mut bits = 0;
        if self.drifting {
            bits |= Self::DRIFTING;
        }
        if self.stabilizing {
            bits |= Self::STABILIZING;
        }
        bits
    }

    pub fn set_internal_bits(&mut self, bits: u8) {
        self.drifting = bits & Self::DRIFTING != 0;
        self.stabilizing = bits & Self::STABILIZING != 0;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Axes interpolate; flags take `a` below 0.5 and `b` from there on.
    pub fn lerp(a: &Self, b: &Self, alpha: f32) -> Self {
        let pick = if alpha < 0.5 { a } else { b };
        Self {
            acceleration: lerp(a.acceleration, b.acceleration, alpha),
            turning: lerp(a.turning, b.turning, alpha),
            custom: lerp(a.custom, b.custom, alpha),
            custom_flags: pick.custom_flags,
            drifting: pick.drifting,
            stabilizing: pick.stabilizing,
        }
    }
}

#[inline]
fn clamp_axis(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(-1.0, 1.0) }
}

/// Movement modifiers pushed by gameplay; travel as a bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementModifiers {
    pub block_acceleration: bool,
}

impl MovementModifiers {
    pub const BLOCK_ACCELERATION: u8 = 1 << 0;

    pub fn bits(&self) -> u8 {
        if self.block_acceleration { Self::BLOCK_ACCELERATION } else { 0 }
    }

    pub fn from_bits(bits: u8) -> Self {
        Self {
            block_acceleration: bits & Self::BLOCK_ACCELERATION != 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_clamp_axes() {
        let mut input = VehicleInput::default();
        input.set_acceleration(3.0);
        input.set_turning(-7.5);
        input.set_custom(f32::NAN);
        assert_eq!(input.acceleration(), 1.0);
        assert_eq!(input.turning(), -1.0);
        assert_eq!(input.custom(), 0.0);
    }

    #[test]
    fn custom_flags_set_and_check() {
        let mut input = VehicleInput::default();
        input.set_custom_flag(0b100, true);
        assert!(input.has_custom_flag(0b100));
        assert!(!input.has_custom_flag(0b001));
        input.set_custom_flag(0b100, false);
        assert_eq!(input.custom_flags(), 0);
    }

    #[test]
    fn internal_bits_round_trip() {
        let mut input = VehicleInput::default();
        input.drifting = true;
        let mut other = VehicleInput::default();
        other.set_internal_bits(input.internal_bits());
        assert!(other.drifting);
        assert!(!other.stabilizing);
    }

    #[test]
    fn lerp_picks_flags_at_half() {
        let a = VehicleInput::default();
        let mut b = VehicleInput::default();
        b.set_acceleration(1.0);
        b.drifting = true;

        let early = VehicleInput::lerp(&a, &b, 0.25);
        assert!((early.acceleration() - 0.25).abs() < 1e-6);
        assert!(!early.drifting);

        let late = VehicleInput::lerp(&a, &b, 0.5);
        assert!(late.drifting);
    }

    #[test]
    fn modifier_bits() {
        let m = MovementModifiers { block_acceleration: true };
        assert_eq!(m.bits(), 1);
        assert_eq!(MovementModifiers::from_bits(1), m);
        assert_eq!(MovementModifiers::from_bits(0), MovementModifiers::default());
    }
}
