// ==============================================================================
// curve.rs - RESPONSE CURVES (speed → force lookups)
// ------------------------------------------------------------------------------
// The force model never owns curve math directly. It asks a CurveProvider for
// `evaluate(kind, |speed_kmh|)`. VehicleSettings implements CurveProvider from
// its own serialized piecewise-linear curves; hosts may plug anything else.
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    Acceleration,
    Reversing,
    EngineBraking,
    Braking,
    Steering,
}

impl CurveKind {
    pub const ALL: [CurveKind; 5] = [
        CurveKind::Acceleration,
        CurveKind::Reversing,
        CurveKind::EngineBraking,
        CurveKind::Braking,
        CurveKind::Steering,
    ];
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CurveKind::Acceleration => "acceleration",
            CurveKind::Reversing => "reversing",
            CurveKind::EngineBraking => "engine braking",
            CurveKind::Braking => "braking",
            CurveKind::Steering => "steering",
        };
        write!(f, "{s}")
    }
}

pub trait CurveProvider {
    fn has_curve(&self, kind: CurveKind) -> bool;

    /// Missing curves evaluate to 0; initialization refuses to run without them.
    fn evaluate(&self, kind: CurveKind, x: f32) -> f32;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
}

/// Piecewise-linear curve, constant beyond its first and last keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseCurve {
    keys: Vec<CurveKey>,
}

impl ResponseCurve {
    pub fn new(mut keys: Vec<CurveKey>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    pub fn from_points(points: &[(f32, f32)]) -> Self {
        Self::new(
            points
                .iter()
                .map(|&(time, value)| CurveKey { time, value })
                .collect(),
        )
    }

    pub fn constant(value: f32) -> Self {
        Self::from_points(&[(0.0, value)])
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    pub fn evaluate(&self, x: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if x <= first.time {
            return first.value;
        }
        if x >= last.time {
            return last.value;
        }

        // first key strictly later than x; guaranteed to exist and be > 0 here
        let end = self.keys.partition_point(|k| k.time <= x);
        let a = self.keys[end - 1];
        let b = self.keys[end];
        let span = b.time - a.time;
        if span <= f32::EPSILON {
            return b.value;
        }
        a.value + (b.value - a.value) * ((x - a.time) / span)
    }
}
