//! In-memory host doubles for unit tests: a kinematic body over flat ground,
//! a named-attachment rig and a recording transport.

use crate::host::{
    AttachmentProvider, GroundProbe, MeshKind, NetworkTransport, ProbeHit, ProbeQuery,
    VehicleBody, WheelMeshRig,
};
use crate::math::{Quat, Transform, Vec3};
use crate::snapshot::VehiclePhysicsState;
use nalgebra::Translation3;
use std::collections::HashMap;

pub fn approx(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

pub fn at(location: Vec3) -> Transform {
    Transform::from_parts(Translation3::from(location), Quat::identity())
}

#[derive(Debug, Clone)]
pub struct FakeBody {
    pub exists: bool,
    pub transform: Transform,
    pub linear_velocity: Vec3,
    pub angular_velocity_deg: Vec3,
    pub mass: f32,
    pub simulating: bool,
    pub gravity_enabled: bool,
    pub gravity_z: f32,
    /// Height of the infinite flat ground, `None` for no ground at all.
    pub ground_z: Option<f32>,
    /// Shifts reported contact points, for off-axis sphere hits.
    pub contact_offset: Vec3,
    pub forces: Vec<(Vec3, Option<Vec3>)>,
    pub torques: Vec<Vec3>,
}

impl Default for FakeBody {
    fn default() -> Self {
        Self {
            exists: true,
            transform: Transform::identity(),
            linear_velocity: Vec3::zeros(),
            angular_velocity_deg: Vec3::zeros(),
            mass: 1000.0,
            simulating: true,
            gravity_enabled: true,
            gravity_z: -980.0,
            ground_z: None,
            contact_offset: Vec3::zeros(),
            forces: Vec::new(),
            torques: Vec::new(),
        }
    }
}

impl FakeBody {
    pub fn on_ground(height: f32) -> Self {
        Self {
            transform: at(Vec3::new(0.0, 0.0, height)),
            ground_z: Some(0.0),
            ..Default::default()
        }
    }

    pub fn total_force(&self) -> Vec3 {
        self.forces.iter().fold(Vec3::zeros(), |acc, (f, _)| acc + f)
    }

    /// Moves the body by its velocity and drops recorded forces.
    pub fn step(&mut self, dt: f32) {
        self.transform.translation.vector += self.linear_velocity * dt;
        self.forces.clear();
        self.torques.clear();
    }
}

impl VehicleBody for FakeBody {
    fn has_body(&self) -> bool {
        self.exists
    }
    fn transform(&self) -> Transform {
        self.transform
    }
    fn set_location(&mut self, location: Vec3) {
        self.transform.translation = Translation3::from(location);
    }
    fn set_rotation(&mut self, rotation: Quat) {
        self.transform.rotation = rotation;
    }
    fn linear_velocity(&self) -> Vec3 {
        self.linear_velocity
    }
    fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.linear_velocity = velocity;
    }
    fn angular_velocity_deg(&self) -> Vec3 {
        self.angular_velocity_deg
    }
    fn set_angular_velocity_deg(&mut self, velocity: Vec3) {
        self.angular_velocity_deg = velocity;
    }
    fn center_of_mass(&self) -> Vec3 {
        self.transform.translation.vector
    }
    fn add_force(&mut self, force: Vec3) {
        self.forces.push((force, None));
    }
    fn add_force_at_point(&mut self, force: Vec3, point: Vec3) {
        self.forces.push((force, Some(point)));
    }
    fn add_torque(&mut self, torque: Vec3) {
        self.torques.push(torque);
    }
    fn mass(&self) -> f32 {
        self.mass
    }
    fn is_simulating(&self) -> bool {
        self.simulating
    }
    fn set_simulating(&mut self, simulating: bool) {
        self.simulating = simulating;
    }
    fn set_gravity_enabled(&mut self, enabled: bool) {
        self.gravity_enabled = enabled;
    }
    fn world_gravity_z(&self) -> f32 {
        self.gravity_z
    }
}

impl GroundProbe for FakeBody {
    fn cast(&self, query: &ProbeQuery) -> Option<ProbeHit> {
        let ground = self.ground_z?;
        let delta = query.end - query.start;
        let length = delta.norm();
        let dir = delta.try_normalize(1.0e-6)?;
        if dir.z >= 0.0 {
            return None;
        }

        // travel until the cast shape touches z = ground
        let contact_z = ground + query.radius;
        let travel = ((query.start.z - contact_z) / -dir.z).max(0.0);
        if travel > length {
            return None;
        }

        let center = query.start + dir * travel;
        Some(ProbeHit {
            distance: travel,
            point: Vec3::new(center.x, center.y, ground) + self.contact_offset,
            normal: Vec3::z(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct FakeRig {
    pub kind: MeshKind,
    pub attachments: HashMap<String, Transform>,
    pub bones_world: HashMap<String, Transform>,
    pub visual_world: Option<Transform>,
    pub wheel_meshes: HashMap<String, Transform>,
    pub visual_rotation: Quat,
}

impl FakeRig {
    pub fn new(kind: MeshKind) -> Self {
        Self {
            kind,
            attachments: HashMap::new(),
            bones_world: HashMap::new(),
            visual_world: Some(Transform::identity()),
            wheel_meshes: HashMap::new(),
            visual_rotation: Quat::identity(),
        }
    }

    pub fn with_attachment(mut self, name: &str, location: Vec3) -> Self {
        self.attachments.insert(name.to_string(), at(location));
        self
    }

    pub fn with_wheel_mesh(mut self, socket: &str, location: Vec3) -> Self {
        self.wheel_meshes.insert(socket.to_string(), at(location));
        self
    }
}

impl AttachmentProvider for FakeRig {
    fn mesh_kind(&self) -> MeshKind {
        self.kind
    }
    fn attachment_local_transform(&self, name: &str) -> Option<Transform> {
        self.attachments.get(name).copied()
    }
    fn bone_world_transform(&self, name: &str) -> Option<Transform> {
        self.bones_world.get(name).copied()
    }
    fn visual_mesh_world_transform(&self) -> Option<Transform> {
        self.visual_world
    }
}

impl WheelMeshRig for FakeRig {
    fn wheel_relative_transform(&self, socket: &str) -> Option<Transform> {
        self.wheel_meshes.get(socket).copied()
    }
    fn set_wheel_relative_transform(&mut self, socket: &str, transform: Transform) {
        self.wheel_meshes.insert(socket.to_string(), transform);
    }
    fn set_visual_relative_rotation(&mut self, rotation: Quat) {
        self.visual_rotation = rotation;
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingNet {
    pub half_rtt: f64,
    pub owner_half_rtt: f64,
    pub sent_to_server: Vec<VehiclePhysicsState>,
    pub replicated: Vec<VehiclePhysicsState>,
    pub teleports_to_server: Vec<(Vec3, Quat)>,
    pub multicast_teleports: Vec<(Vec3, Quat)>,
}

impl NetworkTransport for RecordingNet {
    fn send_state_to_server(&mut self, state: &VehiclePhysicsState) {
        self.sent_to_server.push(*state);
    }
    fn replicate_state(&mut self, state: &VehiclePhysicsState) {
        self.replicated.push(*state);
    }
    fn send_teleport_to_server(&mut self, location: Vec3, rotation: Quat) {
        self.teleports_to_server.push((location, rotation));
    }
    fn multicast_teleport(&mut self, location: Vec3, rotation: Quat) {
        self.multicast_teleports.push((location, rotation));
    }
    fn half_rtt(&self) -> f64 {
        self.half_rtt
    }
    fn owner_half_rtt(&self) -> f64 {
        self.owner_half_rtt
    }
}

/// Skeletal rig carrying the sport car's four wheel bones.
pub fn sport_car_rig() -> FakeRig {
    crate::presets::sport_car_preset()
        .attachments
        .iter()
        .fold(FakeRig::new(MeshKind::Skeletal), |rig, (name, location)| {
            rig.with_attachment(name, *location)
        })
}
