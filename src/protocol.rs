// ==============================================================================
// protocol.rs - WIRE FORMAT
// ------------------------------------------------------------------------------
// Binary frames (bincode, serde mode, standard config):
//   client → server : ClientFrame
//   server → client : ServerFrame
// Text frames (JSON): welcome + per-tick world snapshot.
//
// Quantization:
//   input axes      → i8, round(v * 127), decoded / 127
//   location / vels → i32 whole units (cm, cm/s, deg/s)
//   rotation        → unit quaternion, 4 x f32
// ==============================================================================

use crate::animation::AnimationPose;
use crate::error::CodecError;
use crate::input::{MovementModifiers, VehicleInput};
use crate::math::{Quat, Vec3};
use crate::presets::PresetKind;
use crate::snapshot::VehiclePhysicsState;
use nalgebra::Quaternion;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --------------------------------------------------
// Quantized values
// --------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireInput {
    pub acceleration: i8,
    pub turning: i8,
    pub custom: i8,
    pub custom_flags: u8,
    pub bits: u8, // drift / stabilize
}

fn quantize_axis(v: f32) -> i8 {
    (v.clamp(-1.0, 1.0) * 127.0).round() as i8
}

fn dequantize_axis(v: i8) -> f32 {
    (v as f32 / 127.0).clamp(-1.0, 1.0)
}

impl From<&VehicleInput> for WireInput {
    fn from(input: &VehicleInput) -> Self {
        Self {
            acceleration: quantize_axis(input.acceleration()),
            turning: quantize_axis(input.turning()),
            custom: quantize_axis(input.custom()),
            custom_flags: input.custom_flags(),
            bits: input.internal_bits(),
        }
    }
}

impl From<WireInput> for VehicleInput {
    fn from(wire: WireInput) -> Self {
        let mut input = VehicleInput::default();
        input.set_acceleration(dequantize_axis(wire.acceleration));
        input.set_turning(dequantize_axis(wire.turning));
        input.set_custom(dequantize_axis(wire.custom));
        input.set_custom_flags(wire.custom_flags);
        input.set_internal_bits(wire.bits);
        input
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireVec(pub [i32; 3]);

impl From<Vec3> for WireVec {
    fn from(v: Vec3) -> Self {
        Self([v.x.round() as i32, v.y.round() as i32, v.z.round() as i32])
    }
}

impl From<WireVec> for Vec3 {
    fn from(v: WireVec) -> Self {
        Vec3::new(v.0[0] as f32, v.0[1] as f32, v.0[2] as f32)
    }
}

/// (i, j, k, w)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireQuat(pub [f32; 4]);

impl From<Quat> for WireQuat {
    fn from(q: Quat) -> Self {
        Self([q.i, q.j, q.k, q.w])
    }
}

impl From<WireQuat> for Quat {
    fn from(q: WireQuat) -> Self {
        let [i, j, k, w] = q.0;
        Quat::try_new(Quaternion::new(w, i, j, k), 1.0e-6).unwrap_or_else(Quat::identity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireState {
    pub timestamp: f64,
    pub input: WireInput,
    pub location: WireVec,
    pub rotation: WireQuat,
    pub linear_velocity: WireVec,
    pub angular_velocity: WireVec,
    pub modifiers: u8,
}

impl From<&VehiclePhysicsState> for WireState {
    fn from(s: &VehiclePhysicsState) -> Self {
        Self {
            timestamp: s.timestamp,
            input: (&s.input).into(),
            location: s.location.into(),
            rotation: s.rotation.into(),
            linear_velocity: s.linear_velocity.into(),
            angular_velocity: s.angular_velocity.into(),
            modifiers: s.modifiers.bits(),
        }
    }
}

impl From<WireState> for VehiclePhysicsState {
    fn from(w: WireState) -> Self {
        Self {
            timestamp: w.timestamp,
            input: w.input.into(),
            location: w.location.into(),
            rotation: w.rotation.into(),
            linear_velocity: w.linear_velocity.into(),
            angular_velocity: w.angular_velocity.into(),
            modifiers: MovementModifiers::from_bits(w.modifiers),
        }
    }
}

// --------------------------------------------------
// Frames
// --------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientFrame {
    /// `rtt_ms` is the client's own latest round-trip estimate.
    Ping { client_time: f64, rtt_ms: u32 },
    State { vehicle: Uuid, state: WireState },
    Teleport { vehicle: Uuid, location: WireVec, rotation: WireQuat },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerFrame {
    Pong { client_time: f64, server_time: f64 },
    State { vehicle: Uuid, state: WireState },
    Teleport { vehicle: Uuid, location: WireVec, rotation: WireQuat },
    Spawned { vehicle: Uuid, owner: Option<Uuid> },
    Despawned { vehicle: Uuid },
    MaxSpeedMultiplier { vehicle: Uuid, multiplier: f32 },
}

pub fn encode<T: Serialize>(frame: &T) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::serde::encode_to_vec(frame, bincode::config::standard())?)
}

pub fn decode<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T, CodecError> {
    let (frame, _) = bincode::serde::decode_from_slice(data, bincode::config::standard())?;
    Ok(frame)
}

// --------------------------------------------------
// JSON
// --------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextFrame {
    Welcome { player_id: Uuid, vehicle_id: Uuid },
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleView {
    pub id: Uuid,
    pub owner: Option<Uuid>,
    pub preset: PresetKind,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub speed: f32,
    pub pose: AnimationPose,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub tick: u64,
    pub vehicles: Vec<VehicleView>,
}

impl WorldSnapshot {
    pub fn new(tick: u64, vehicles: Vec<VehicleView>) -> Self {
        Self { kind: "snapshot", tick, vehicles }
    }

    pub fn to_json(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string(self)?)
    }
}
