// ==============================================================================
// host.rs - WHAT THE CORE NEEDS FROM THE ENGINE
// ------------------------------------------------------------------------------
// VehicleBody         : rigid-body read/write (world space, cm, deg/s)
// GroundProbe         : ray / sphere casts for the suspension
// AttachmentProvider  : bone / socket lookup, resolved once at init
// WheelMeshRig        : relative transforms written by the static animator
// NetworkTransport    : fire-and-forget state + teleport delivery
// MovementHook        : additive force/torque after integration
//
// The core never owns any of these; callers pass them in per operation.
// ==============================================================================

use crate::input::VehicleInput;
use crate::math::{Quat, Transform, Vec3};
use crate::snapshot::VehiclePhysicsState;

// --------------------------------------------------
// Rigid body
// --------------------------------------------------

pub trait VehicleBody {
    /// False when the vehicle has no root body to drive.
    fn has_body(&self) -> bool {
        true
    }

    fn transform(&self) -> Transform;
    fn set_location(&mut self, location: Vec3);
    fn set_rotation(&mut self, rotation: Quat);

    fn linear_velocity(&self) -> Vec3;
    fn set_linear_velocity(&mut self, velocity: Vec3);

    /// Degrees per second, world space.
    fn angular_velocity_deg(&self) -> Vec3;
    fn set_angular_velocity_deg(&mut self, velocity: Vec3);

    /// World-space centre of mass.
    fn center_of_mass(&self) -> Vec3;

    fn velocity_at_point(&self, point: Vec3) -> Vec3 {
        let omega = self.angular_velocity_deg().map(f32::to_radians);
        self.linear_velocity() + omega.cross(&(point - self.center_of_mass()))
    }

    fn add_force(&mut self, force: Vec3);
    fn add_force_at_point(&mut self, force: Vec3, point: Vec3);
    fn add_torque(&mut self, torque: Vec3);

    fn mass(&self) -> f32;

    fn is_simulating(&self) -> bool;
    fn set_simulating(&mut self, simulating: bool);
    fn set_gravity_enabled(&mut self, enabled: bool);

    /// World gravity along Z, units/s².
    fn world_gravity_z(&self) -> f32;
}

// --------------------------------------------------
// Ground probe
// --------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeQuery {
    pub start: Vec3,
    pub end: Vec3,
    /// 0 casts a ray, anything else a sphere of this radius.
    pub radius: f32,
    pub mask: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeHit {
    /// Distance travelled from `start` along the cast.
    pub distance: f32,
    /// Impact point on the ground.
    pub point: Vec3,
    pub normal: Vec3,
}

pub trait GroundProbe {
    fn cast(&self, query: &ProbeQuery) -> Option<ProbeHit>;
}

pub trait VehicleHost: VehicleBody + GroundProbe {}

impl<T: VehicleBody + GroundProbe> VehicleHost for T {}

// --------------------------------------------------
// Mesh attachments
// --------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshKind {
    Skeletal,
    Static,
    Other,
}

pub trait AttachmentProvider {
    fn mesh_kind(&self) -> MeshKind;

    /// Bone transform in component space (skeletal) or socket transform
    /// relative to the body (static).
    fn attachment_local_transform(&self, name: &str) -> Option<Transform>;

    /// World transform of a bone.
    fn bone_world_transform(&self, name: &str) -> Option<Transform>;

    /// World transform of the visual child mesh of a static vehicle.
    fn visual_mesh_world_transform(&self) -> Option<Transform>;
}

pub trait WheelMeshRig {
    /// Relative transform of the wheel mesh attached at `socket`, if any.
    fn wheel_relative_transform(&self, socket: &str) -> Option<Transform>;
    fn set_wheel_relative_transform(&mut self, socket: &str, transform: Transform);
    fn set_visual_relative_rotation(&mut self, rotation: Quat);
}

// --------------------------------------------------
// Network
// --------------------------------------------------

pub trait NetworkTransport {
    /// Controlling client → server, unreliable.
    fn send_state_to_server(&mut self, state: &VehiclePhysicsState);

    /// Server → every non-owning observer, unreliable.
    fn replicate_state(&mut self, state: &VehiclePhysicsState);

    /// Controlling client → server, reliable.
    fn send_teleport_to_server(&mut self, location: Vec3, rotation: Quat);

    /// Server → everyone, reliable.
    fn multicast_teleport(&mut self, location: Vec3, rotation: Quat);

    /// This node's estimated one-way trip time, seconds.
    fn half_rtt(&self) -> f64;

    /// Server only: one-way trip time of the vehicle's controlling player.
    fn owner_half_rtt(&self) -> f64;
}

/// Transport for standalone simulation: nothing is sent, latency is zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoNetwork;

impl NetworkTransport for NoNetwork {
    fn send_state_to_server(&mut self, _state: &VehiclePhysicsState) {}
    fn replicate_state(&mut self, _state: &VehiclePhysicsState) {}
    fn send_teleport_to_server(&mut self, _location: Vec3, _rotation: Quat) {}
    fn multicast_teleport(&mut self, _location: Vec3, _rotation: Quat) {}
    fn half_rtt(&self) -> f64 {
        0.0
    }
    fn owner_half_rtt(&self) -> f64 {
        0.0
    }
}

// --------------------------------------------------
// Custom movement
// --------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HookContribution {
    pub force: Vec3,
    pub torque: Vec3,
}

impl Default for HookContribution {
    fn default() -> Self {
        Self {
            force: Vec3::zeros(),
            torque: Vec3::zeros(),
        }
    }
}

pub trait MovementHook: Send {
    fn contribute(&mut self, input: &VehicleInput, body: &dyn VehicleHost, dt: f32)
        -> HookContribution;
}
