// ==============================================================================
// rapier_host.rs - RAPIER BACKED HOST
// ------------------------------------------------------------------------------
// Rapier works in metres with +Z up; the vehicle core works in centimetres.
// Everything crossing the seam is scaled by UNITS_PER_METER:
//
//   lengths, velocities : x 100 out, / 100 in
//   forces              : kg*cm/s^2  → N      (/ 100)
//   torques             : kg*cm^2/s^2 → N*m   (/ 10 000)
//   angular velocity    : rad/s ↔ deg/s
//
// Collision groups mirror the core's probe masks:
//   ground  : member of WORLD_STATIC, collides with VEHICLE
//   chassis : member of VEHICLE,      collides with WORLD_STATIC
// ==============================================================================

use crate::host::{
    AttachmentProvider, GroundProbe, MeshKind, ProbeHit, ProbeQuery, VehicleBody,
};
use crate::math::{Quat, Transform, Vec3};
use crate::presets::VehiclePreset;
use crate::settings::{COLLISION_VEHICLE, COLLISION_WORLD_STATIC};
use ::nalgebra::Translation3;
use rapier3d::na;
use rapier3d::parry::query::ShapeCastOptions;
use rapier3d::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};

pub const UNITS_PER_METER: f32 = 100.0;

const GROUP_GROUND: Group = Group::from_bits_truncate(COLLISION_WORLD_STATIC);
const GROUP_CHASSIS: Group = Group::from_bits_truncate(COLLISION_VEHICLE);

// --------------------------------------------------
// Conversions (core nalgebra ↔ rapier nalgebra)
// --------------------------------------------------

#[inline]
fn to_metres(v: &Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z] / UNITS_PER_METER
}

#[inline]
fn to_units(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z) * UNITS_PER_METER
}

#[inline]
fn to_rapier_rotation(q: &Quat) -> Rotation<Real> {
    na::UnitQuaternion::new_normalize(na::Quaternion::new(q.w, q.i, q.j, q.k))
}

#[inline]
fn from_rapier_rotation(q: &Rotation<Real>) -> Quat {
    Quat::new_normalize(::nalgebra::Quaternion::new(q.w, q.i, q.j, q.k))
}

// --------------------------------------------------
// World
// --------------------------------------------------

pub struct PhysicsWorld {
    pub gravity: Vector<Real>,                // m/s^2
    pub pipeline: PhysicsPipeline,            // physics pipeline
    pub island_manager: IslandManager,        // manages islands of bodies
    pub broad_phase: DefaultBroadPhase,       // broad-phase collision detection
    pub narrow_phase: NarrowPhase,            // collision detection
    pub bodies: RigidBodySet,                 // for rigid bodies
    pub colliders: ColliderSet,               // for collision shapes
    pub joints: ImpulseJointSet,              // for constraints
    pub multibody_joints: MultibodyJointSet,  // for articulated bodies
    pub ccd: CCDSolver,                       // continuous collision detection
    pub query_pipeline: QueryPipeline,        // for ground probes
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        let gravity = vector![0.0, 0.0, -9.81];

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        // 1000 x 1000 m slab, top surface at z = 0
        let ground_rb = RigidBodyBuilder::fixed()
            .translation(vector![0.0, 0.0, -1.0])
            .build();
        let ground_handle = bodies.insert(ground_rb);

        let ground_collider = ColliderBuilder::cuboid(500.0, 500.0, 1.0)
            .collision_groups(InteractionGroups::new(GROUP_GROUND, GROUP_CHASSIS))
            .friction(1.2)
            .restitution(0.0)
            .build();
        colliders.insert_with_parent(ground_collider, ground_handle, &mut bodies);

        debug!(bodies = bodies.len(), colliders = colliders.len(), "ground inserted");

        let mut world = Self {
            gravity,
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        };
        world.update_queries();
        world
    }

    /// Dynamic chassis box for `preset` at `location` (cm).
    pub fn spawn_vehicle(&mut self, preset: &VehiclePreset, location: Vec3, rotation: Quat) -> RigidBodyHandle {
        let half = to_metres(&preset.chassis_half_extents);
        let com = to_metres(&preset.chassis_com_offset);
        let volume = 8.0 * half.x * half.y * half.z;
        let density = if volume > 0.0 { preset.mass / volume } else { 1.0 };

        // damping is applied by the vehicle core itself
        let rb = RigidBodyBuilder::dynamic()
            .position(Isometry::from_parts(to_metres(&location).into(), to_rapier_rotation(&rotation)))
            .ccd_enabled(true)
            .build();

        let collider = ColliderBuilder::cuboid(half.x, half.y, half.z)
            .translation(com)
            .collision_groups(InteractionGroups::new(GROUP_CHASSIS, GROUP_GROUND))
            .active_events(ActiveEvents::empty())
            .density(density)
            .friction(0.0)
            .restitution(0.0)
            .build();

        let handle = self.bodies.insert(rb);
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies);
        self.update_queries();

        info!(?handle, mass = preset.mass, ?location, "vehicle body spawned");
        handle
    }

    pub fn remove_vehicle(&mut self, handle: RigidBodyHandle) {
        self.bodies.remove(
            handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            true,
        );
        self.update_queries();
    }

    /// Refreshes the probe structures after bodies were moved outside a step.
    pub fn update_queries(&mut self) {
        self.query_pipeline.update(&self.colliders);
    }

    /// Host view of one body, or None once it was removed.
    pub fn body(&mut self, handle: RigidBodyHandle) -> Option<RapierBody<'_>> {
        self.bodies.get(handle)?;
        Some(RapierBody {
            handle,
            bodies: &mut self.bodies,
            colliders: &self.colliders,
            query: &self.query_pipeline,
            gravity_z: self.gravity.z,
        })
    }

    pub fn step(&mut self, dt: Real) {
        let hooks = ();
        let events = ();

        self.pipeline.step(
            &self.gravity,
            &IntegrationParameters {
                dt,
                ..IntegrationParameters::default()
            },
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            Some(&mut self.query_pipeline),
            &hooks,
            &events,
        );

        // user forces persist in rapier; the core adds them fresh every tick
        for (_, body) in self.bodies.iter_mut() {
            body.reset_forces(false);
            body.reset_torques(false);
        }
    }
}

// --------------------------------------------------
// Body adapter
// --------------------------------------------------

pub struct RapierBody<'a> {
    handle: RigidBodyHandle,
    bodies: &'a mut RigidBodySet,
    colliders: &'a ColliderSet,
    query: &'a QueryPipeline,
    gravity_z: Real,
}

impl RapierBody<'_> {
    pub fn handle(&self) -> RigidBodyHandle {
        self.handle
    }

    fn rb(&self) -> &RigidBody {
        &self.bodies[self.handle]
    }

    fn rb_mut(&mut self) -> &mut RigidBody {
        &mut self.bodies[self.handle]
    }
}

impl VehicleBody for RapierBody<'_> {
    fn transform(&self) -> Transform {
        let iso = self.rb().position();
        Transform::from_parts(
            Translation3::from(to_units(&iso.translation.vector)),
            from_rapier_rotation(&iso.rotation),
        )
    }

    fn set_location(&mut self, location: Vec3) {
        self.rb_mut().set_translation(to_metres(&location), true);
    }

    fn set_rotation(&mut self, rotation: Quat) {
        self.rb_mut().set_rotation(to_rapier_rotation(&rotation), true);
    }

    fn linear_velocity(&self) -> Vec3 {
        to_units(self.rb().linvel())
    }

    fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.rb_mut().set_linvel(to_metres(&velocity), true);
    }

    fn angular_velocity_deg(&self) -> Vec3 {
        let w = self.rb().angvel();
        Vec3::new(w.x, w.y, w.z).map(f32::to_degrees)
    }

    fn set_angular_velocity_deg(&mut self, velocity: Vec3) {
        let w = velocity.map(f32::to_radians);
        self.rb_mut().set_angvel(vector![w.x, w.y, w.z], true);
    }

    fn center_of_mass(&self) -> Vec3 {
        to_units(&self.rb().center_of_mass().coords)
    }

    fn add_force(&mut self, force: Vec3) {
        self.rb_mut().add_force(to_metres(&force), true);
    }

    fn add_force_at_point(&mut self, force: Vec3, point: Vec3) {
        let point = Point::from(to_metres(&point));
        self.rb_mut().add_force_at_point(to_metres(&force), point, true);
    }

    fn add_torque(&mut self, torque: Vec3) {
        let t = to_metres(&torque) / UNITS_PER_METER;
        self.rb_mut().add_torque(t, true);
    }

    fn mass(&self) -> f32 {
        self.rb().mass()
    }

    fn is_simulating(&self) -> bool {
        let rb = self.rb();
        rb.is_enabled() && rb.is_dynamic()
    }

    fn set_simulating(&mut self, simulating: bool) {
        self.rb_mut().set_enabled(simulating);
    }

    fn set_gravity_enabled(&mut self, enabled: bool) {
        self.rb_mut().set_gravity_scale(if enabled { 1.0 } else { 0.0 }, true);
    }

    fn world_gravity_z(&self) -> f32 {
        self.gravity_z * UNITS_PER_METER
    }
}

impl GroundProbe for RapierBody<'_> {
    fn cast(&self, query: &ProbeQuery) -> Option<ProbeHit> {
        let start = to_metres(&query.start);
        let delta = to_metres(&query.end) - start;
        let length = delta.norm();
        if length <= f32::EPSILON {
            return None;
        }
        let dir = delta / length;

        let filter = QueryFilter::default()
            .exclude_rigid_body(self.handle)
            .groups(InteractionGroups::new(Group::ALL, Group::from_bits_truncate(query.mask)));

        if query.radius <= 0.0 {
            let ray = Ray::new(Point::from(start), dir);
            let (_, hit) = self.query.cast_ray_and_get_normal(
                &*self.bodies,
                self.colliders,
                &ray,
                length,
                true,
                filter,
            )?;
            let point = start + dir * hit.time_of_impact;
            return Some(ProbeHit {
                distance: hit.time_of_impact * UNITS_PER_METER,
                point: to_units(&point),
                normal: Vec3::new(hit.normal.x, hit.normal.y, hit.normal.z),
            });
        }

        let radius = query.radius / UNITS_PER_METER;
        let ball = Ball::new(radius);
        let (collider, hit) = self.query.cast_shape(
            &*self.bodies,
            self.colliders,
            &Isometry::translation(start.x, start.y, start.z),
            &dir,
            &ball,
            ShapeCastOptions::with_max_time_of_impact(length),
            filter,
        )?;

        let local_normal = hit.normal1.into_inner();
        let normal = match self.colliders.get(collider) {
            Some(c) => c.position().rotation * local_normal,
            None => local_normal,
        };
        let centre = start + dir * hit.time_of_impact;
        Some(ProbeHit {
            distance: hit.time_of_impact * UNITS_PER_METER,
            point: to_units(&(centre - normal * radius)),
            normal: Vec3::new(normal.x, normal.y, normal.z),
        })
    }
}

// --------------------------------------------------
// Attachments
// --------------------------------------------------

/// Preset attachment points exposed as skeleton bones of the chassis.
#[derive(Debug, Clone, Default)]
pub struct PresetRig {
    attachments: HashMap<String, Transform>,
}

impl PresetRig {
    pub fn new(preset: &VehiclePreset) -> Self {
        let attachments = preset
            .attachments
            .iter()
            .map(|(name, location)| {
                (name.clone(), Transform::from_parts(Translation3::from(*location), Quat::identity()))
            })
            .collect();
        Self { attachments }
    }
}

impl AttachmentProvider for PresetRig {
    fn mesh_kind(&self) -> MeshKind {
        MeshKind::Skeletal
    }

    fn attachment_local_transform(&self, name: &str) -> Option<Transform> {
        self.attachments.get(name).copied()
    }

    fn bone_world_transform(&self, _name: &str) -> Option<Transform> {
        None
    }

    fn visual_mesh_world_transform(&self) -> Option<Transform> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NoNetwork;
    use crate::presets::sport_car_preset;
    use crate::testing::approx;
    use crate::vehicle::{Frame, Vehicle, VehicleContext};

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn spawned_body_reports_centimetres() {
        let mut world = PhysicsWorld::new();
        let handle = world.spawn_vehicle(&sport_car_preset(), Vec3::new(150.0, -20.0, 120.0), Quat::identity());
        let body = world.body(handle).unwrap();

        let t = body.transform().translation.vector;
        assert!(approx(t.x, 150.0, 1e-3) && approx(t.y, -20.0, 1e-3) && approx(t.z, 120.0, 1e-3));
        assert!(approx(body.world_gravity_z(), -981.0, 1e-3));
        assert!(approx(body.mass(), 1350.0, 1.0));
        assert!(body.is_simulating());
    }

    #[test]
    fn probe_hits_ground_and_skips_own_chassis() {
        let mut world = PhysicsWorld::new();
        let handle = world.spawn_vehicle(&sport_car_preset(), Vec3::new(0.0, 0.0, 100.0), Quat::identity());
        let body = world.body(handle).unwrap();

        let ray = ProbeQuery {
            start: Vec3::new(0.0, 0.0, 100.0),
            end: Vec3::new(0.0, 0.0, -100.0),
            radius: 0.0,
            mask: COLLISION_WORLD_STATIC,
        };
        let hit = body.cast(&ray).unwrap();
        assert!(approx(hit.distance, 100.0, 0.1));
        assert!(approx(hit.point.z, 0.0, 0.1));
        assert!(approx(hit.normal.z, 1.0, 1e-4));

        let sphere = ProbeQuery { radius: 10.0, ..ray };
        let hit = body.cast(&sphere).unwrap();
        assert!(approx(hit.distance, 90.0, 0.5));

        let short = ProbeQuery { end: Vec3::new(0.0, 0.0, 50.0), ..ray };
        assert!(body.cast(&short).is_none());
    }

    #[test]
    fn velocity_round_trips_through_units() {
        let mut world = PhysicsWorld::new();
        let handle = world.spawn_vehicle(&sport_car_preset(), Vec3::new(0.0, 0.0, 100.0), Quat::identity());
        let mut body = world.body(handle).unwrap();

        body.set_linear_velocity(Vec3::new(1000.0, 0.0, 0.0));
        body.set_angular_velocity_deg(Vec3::new(0.0, 0.0, 90.0));
        assert!(approx(body.linear_velocity().x, 1000.0, 1e-2));
        assert!(approx(body.angular_velocity_deg().z, 90.0, 1e-3));
    }

    #[test]
    fn sport_car_rests_on_its_springs() {
        let preset = sport_car_preset();
        let rig = PresetRig::new(&preset);
        let mut world = PhysicsWorld::new();
        let handle = world.spawn_vehicle(&preset, Vec3::new(0.0, 0.0, 100.0), Quat::identity());

        let mut vehicle = Vehicle::skeletal(preset.settings.clone());
        {
            let mut body = world.body(handle).unwrap();
            vehicle.apply_settings(&mut body, &rig).unwrap();
        }

        let mut net = NoNetwork;
        for i in 0..120 {
            let frame = Frame { dt: DT, now: i as f64 * DT as f64 };
            if let Some(mut body) = world.body(handle) {
                let mut ctx = VehicleContext { host: &mut body, attachments: &rig, net: &mut net };
                vehicle.pre_physics(&mut ctx, frame);
            }
            world.step(DT);
            if let Some(mut body) = world.body(handle) {
                let mut ctx = VehicleContext { host: &mut body, attachments: &rig, net: &mut net };
                vehicle.post_physics(&mut ctx, frame);
            }
        }

        let body = world.body(handle).unwrap();
        let z = body.transform().translation.vector.z;
        assert!(z.is_finite() && z > 0.0 && z < 200.0, "z = {z}");
        assert!(vehicle.grounded_wheels() > 0);
    }
}
