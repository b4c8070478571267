// ==============================================================================
// vehicle.rs - ARCADE VEHICLE
// ------------------------------------------------------------------------------
// Owns settings, per-spring state, input, runtime data and the network
// reconciliation state of one vehicle. The host engine is borrowed per call:
//
//   apply_settings()  : resolve attachments, validate curves, enable ticking
//   pre_physics()     : corrections → forces → suspension → velocities  (tick.rs)
//   post_physics()    : snapshot → send / replicate / buffer            (tick.rs)
//   receive_*()       : authoritative snapshots + teleports             (network.rs)
// ==============================================================================

mod network;
mod tick;

pub use network::NetRole;

use crate::correction::Corrections;
use crate::curve::{CurveKind, CurveProvider};
use crate::error::{InitError, InitResult};
use crate::forces::{CurveForces, ForceState, ForceStrategy};
use crate::history::{DEFAULT_HISTORY_CAPACITY, PhysicsStateRingBuffer};
use crate::host::{AttachmentProvider, MovementHook, NetworkTransport, VehicleBody, VehicleHost};
use crate::friction::FrictionAnchor;
use crate::input::{MovementModifiers, VehicleInput};
use crate::math::{Quat, Vec3};
use crate::runtime::VehiclePhysicsRuntime;
use crate::settings::{
    AdvancedSettings, EngineSettings, PhysicsSettings, SteeringSettings, SuspensionSettings,
    VehicleSettings,
};
use crate::snapshot::VehiclePhysicsState;
use crate::suspension::{RaycastSuspension, SpringState, SuspensionStrategy, WheelContacts};
use crate::variant::{MeshVariant, SkeletalMesh, StaticMesh};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Everything a tick borrows from the host engine.
pub struct VehicleContext<'a> {
    pub host: &'a mut dyn VehicleHost,
    pub attachments: &'a dyn AttachmentProvider,
    pub net: &'a mut dyn NetworkTransport,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Seconds since the previous tick.
    pub dt: f32,
    /// World time, seconds.
    pub now: f64,
}

pub struct Vehicle {
    settings: VehicleSettings,
    initialized: bool,
    tick_enabled: bool,
    is_sequencer_actor: bool,

    mesh: Box<dyn MeshVariant>,
    suspension: Box<dyn SuspensionStrategy>,
    force_model: Box<dyn ForceStrategy>,
    hook: Option<Box<dyn MovementHook>>,

    springs: Vec<SpringState>,
    contacts: WheelContacts,

    input: VehicleInput,        // local controls
    active_input: VehicleInput, // what the last tick simulated
    modifiers: MovementModifiers,
    forces: ForceState,
    runtime: VehiclePhysicsRuntime,
    friction: FrictionAnchor,
    max_speed_multiplier: f32,

    role: NetRole,
    observed_controller: Option<Uuid>,
    history: PhysicsStateRingBuffer,
    corrections: Corrections,
    server_state: Option<VehiclePhysicsState>,
    last_teleport_time: f64,
}

impl Vehicle {
    pub fn new(settings: VehicleSettings, mesh: Box<dyn MeshVariant>) -> Self {
        Self {
            settings,
            initialized: false,
            tick_enabled: false,
            is_sequencer_actor: false,
            mesh,
            suspension: Box::new(RaycastSuspension),
            force_model: Box::new(CurveForces),
            hook: None,
            springs: Vec::new(),
            contacts: WheelContacts::default(),
            input: VehicleInput::default(),
            active_input: VehicleInput::default(),
            modifiers: MovementModifiers::default(),
            forces: ForceState::default(),
            runtime: VehiclePhysicsRuntime::default(),
            friction: FrictionAnchor::default(),
            max_speed_multiplier: 1.0,
            role: NetRole::standalone(),
            observed_controller: None,
            history: PhysicsStateRingBuffer::new(DEFAULT_HISTORY_CAPACITY),
            corrections: Corrections::default(),
            server_state: None,
            last_teleport_time: f64::NEG_INFINITY,
        }
    }

    pub fn skeletal(settings: VehicleSettings) -> Self {
        Self::new(settings, Box::new(SkeletalMesh::default()))
    }

    pub fn static_mesh(settings: VehicleSettings) -> Self {
        Self::new(settings, Box::new(StaticMesh))
    }

    pub fn with_suspension_strategy(mut self, strategy: Box<dyn SuspensionStrategy>) -> Self {
        self.suspension = strategy;
        self
    }

    pub fn with_force_strategy(mut self, strategy: Box<dyn ForceStrategy>) -> Self {
        self.force_model = strategy;
        self
    }

    pub fn set_movement_hook(&mut self, hook: Option<Box<dyn MovementHook>>) {
        self.hook = hook;
    }

    pub fn set_sequencer_actor(&mut self, is_sequencer_actor: bool) {
        self.is_sequencer_actor = is_sequencer_actor;
    }

    // --------------------------------------------------
    // Settings / initialization
    // --------------------------------------------------

    pub fn settings(&self) -> &VehicleSettings {
        &self.settings
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_tick_enabled(&self) -> bool {
        self.tick_enabled
    }

    /// Replaces every settings group. The vehicle stays inert until
    /// `apply_settings` runs again.
    pub fn set_settings(&mut self, settings: VehicleSettings) {
        self.settings = settings;
        self.uninitialize();
    }

    pub fn set_physics_settings(&mut self, physics: PhysicsSettings) {
        self.settings.physics = physics;
        self.uninitialize();
    }

    pub fn set_engine_settings(&mut self, engine: EngineSettings) {
        self.settings.engine = engine;
        self.uninitialize();
    }

    pub fn set_steering_settings(&mut self, steering: SteeringSettings) {
        self.settings.steering = steering;
        self.uninitialize();
    }

    pub fn set_suspension_settings(&mut self, suspension: SuspensionSettings) {
        self.settings.suspension = suspension;
        self.uninitialize();
    }

    pub fn set_advanced_settings(&mut self, advanced: AdvancedSettings) {
        self.settings.advanced = advanced;
        self.uninitialize();
    }

    fn uninitialize(&mut self) {
        self.initialized = false;
        self.tick_enabled = false;
    }

    /// (Re)initializes the vehicle against its host. On failure the vehicle
    /// is left inert and the reason is both logged and returned.
    pub fn apply_settings<H>(&mut self, host: &mut H, attachments: &dyn AttachmentProvider) -> InitResult
    where
        H: VehicleHost + ?Sized,
    {
        self.uninitialize();
        self.history = PhysicsStateRingBuffer::new(DEFAULT_HISTORY_CAPACITY);

        if let Err(err) = self.initialize_movement(host, attachments) {
            error!(%err, "vehicle movement initialization failed");
            return Err(err);
        }

        let points = self
            .mesh
            .register_attachment_points(&self.settings.suspension, attachments);
        self.springs = points.into_iter().map(SpringState::new).collect();
        self.contacts = WheelContacts::default();

        self.initialized = true;
        self.tick_enabled = true;
        info!(
            springs = self.springs.len(),
            drive = self.settings.drive_wheel_count(),
            steering = self.settings.steering_wheel_count(),
            "vehicle initialized"
        );
        Ok(())
    }

    fn initialize_movement<H>(&mut self, host: &mut H, attachments: &dyn AttachmentProvider) -> InitResult
    where
        H: VehicleHost + ?Sized,
    {
        if self.is_sequencer_actor && self.settings.advanced.disable_physics_in_sequencer {
            host.set_simulating(false);
            return Err(InitError::DisabledInSequencer);
        }
        if !host.has_body() {
            return Err(InitError::MissingRootBody);
        }
        if let Some(kind) = CurveKind::ALL.into_iter().find(|k| !self.settings.has_curve(*k)) {
            return Err(InitError::MissingCurve(kind));
        }

        self.mesh.initialize(&self.settings.suspension, attachments)?;
        host.set_gravity_enabled(!self.settings.physics.custom_gravity);
        Ok(())
    }

    // --------------------------------------------------
    // Input
    // --------------------------------------------------

    pub fn input(&self) -> &VehicleInput {
        &self.input
    }

    /// Input the last tick actually simulated (the authoritative one on observers).
    pub fn active_input(&self) -> &VehicleInput {
        &self.active_input
    }

    pub fn set_acceleration_input(&mut self, value: f32) {
        self.input.set_acceleration(value);
    }

    pub fn set_turning_input(&mut self, value: f32) {
        self.input.set_turning(value);
    }

    pub fn set_custom_input(&mut self, value: f32) {
        self.input.set_custom(value);
    }

    pub fn set_drift_input(&mut self, drifting: bool) {
        self.input.drifting = drifting;
    }

    pub fn set_stabilization_input(&mut self, stabilizing: bool) {
        self.input.stabilizing = stabilizing;
    }

    pub fn set_custom_flag(&mut self, flag: u8, enabled: bool) {
        self.input.set_custom_flag(flag, enabled);
    }

    pub fn has_custom_flag(&self, flag: u8) -> bool {
        self.input.has_custom_flag(flag)
    }

    pub fn clear_inputs(&mut self) {
        self.input.clear();
    }

    /// Turns a desired world direction into throttle/steering.
    pub fn request_path_move(&mut self, rotation: &Quat, direction: &Vec3) {
        let (acceleration, turning) = crate::path::request_move(rotation, direction);
        self.input.set_acceleration(acceleration);
        self.input.set_turning(turning);
    }

    // --------------------------------------------------
    // Modifiers
    // --------------------------------------------------

    pub fn max_speed_multiplier(&self) -> f32 {
        self.max_speed_multiplier
    }

    pub fn set_max_speed_multiplier(&mut self, multiplier: f32) {
        self.max_speed_multiplier = multiplier.max(0.0);
    }

    pub fn modifiers(&self) -> MovementModifiers {
        self.modifiers
    }

    /// Only the controlling side may block acceleration; observers get it
    /// through the snapshots.
    pub fn set_block_acceleration(&mut self, blocked: bool) {
        if !self.has_control() {
            warn!("set_block_acceleration ignored: vehicle is not controlled here");
            return;
        }
        self.modifiers.block_acceleration = blocked;
    }

    pub fn set_custom_gravity<B: VehicleBody + ?Sized>(
        &mut self,
        host: &mut B,
        enabled: bool,
        gravity: Vec3,
    ) {
        self.settings.physics.custom_gravity = enabled;
        self.settings.physics.gravity = gravity;
        if self.initialized {
            host.set_gravity_enabled(!enabled);
        }
    }

    pub fn vehicle_gravity<B: VehicleBody + ?Sized>(&self, host: &B) -> Vec3 {
        if self.settings.physics.custom_gravity {
            self.settings.physics.gravity
        } else {
            Vec3::new(0.0, 0.0, host.world_gravity_z())
        }
    }

    pub fn set_linear_velocity<B: VehicleBody + ?Sized>(&self, host: &mut B, velocity: Vec3, local: bool) {
        let world = if local {
            host.transform().rotation * velocity
        } else {
            velocity
        };
        host.set_linear_velocity(world);
    }

    // --------------------------------------------------
    // Queries
    // --------------------------------------------------

    pub fn springs(&self) -> &[SpringState] {
        &self.springs
    }

    pub fn contacts(&self) -> &WheelContacts {
        &self.contacts
    }

    pub fn runtime(&self) -> &VehiclePhysicsRuntime {
        &self.runtime
    }

    pub fn forces(&self) -> &ForceState {
        &self.forces
    }

    pub fn wheel_offset(&self, index: usize) -> f32 {
        self.springs.get(index).map_or(0.0, |s| s.wheel_offset)
    }

    pub fn wheel_count(&self) -> usize {
        self.springs.len()
    }

    pub fn grounded_wheels(&self) -> usize {
        self.contacts.grounded
    }

    pub fn grounded_drive_wheels(&self) -> usize {
        self.contacts.drive_grounded
    }

    pub fn grounded_steering_wheels(&self) -> usize {
        self.contacts.steering_grounded
    }

    pub fn drive_wheels_multiplier(&self) -> f32 {
        self.contacts.drive_wheels_multiplier()
    }

    /// Any drive or steering wheel touches the ground, moving or not.
    pub fn is_moving_on_ground(&self) -> bool {
        self.contacts.drive_grounded + self.contacts.steering_grounded > 0
    }

    pub fn is_falling(&self) -> bool {
        !self.is_moving_on_ground()
    }

    pub fn speed(&self) -> f32 {
        self.runtime.speed
    }

    pub fn speed_absolute(&self) -> f32 {
        self.runtime.speed_absolute()
    }

    pub fn speed_unit(&self) -> f32 {
        self.runtime.speed_unit
    }

    pub fn local_velocity(&self) -> Vec3 {
        self.runtime.local_linear_velocity
    }

    pub fn forward_velocity(&self) -> f32 {
        self.runtime.forward_velocity()
    }

    pub fn right_velocity(&self) -> f32 {
        self.runtime.right_velocity()
    }

    pub fn last_applied_acceleration(&self) -> f32 {
        self.runtime.last_applied_acceleration
    }

    pub fn last_applied_braking(&self) -> f32 {
        self.runtime.last_applied_braking
    }

    pub fn is_accelerating(&self) -> bool {
        self.runtime.is_accelerating
    }

    pub fn is_braking(&self) -> bool {
        self.runtime.is_braking
    }

    pub fn is_engine_braking(&self) -> bool {
        self.runtime.is_engine_braking
    }

    pub fn is_drifting(&self) -> bool {
        self.runtime.is_drifting
    }

    pub fn is_moving(&self) -> bool {
        self.runtime.is_moving()
    }

    pub fn is_moving_forward(&self) -> bool {
        self.runtime
            .is_moving_forward(self.settings.physics.movement_direction_tolerance)
    }

    pub fn is_moving_backward(&self) -> bool {
        self.runtime
            .is_moving_backward(self.settings.physics.movement_direction_tolerance)
    }
}
