// ==============================================================================
// state.rs - SHARED GAME STATE
// ------------------------------------------------------------------------------
// Connected clients and every simulated vehicle. One tick:
//
//   1) AI path following        (server-owned vehicles)
//   2) pre-physics per vehicle  (corrections, forces, suspension, velocities)
//   3) one rapier step
//   4) post-physics per vehicle (snapshot → replicate / buffer)
//   5) animation update
//   6) sanity reset             (teleport back to spawn)
//   7) flush outgoing frames + JSON world snapshot
// ==============================================================================

use std::collections::HashMap;

use arcade_vehicle::animation::{AnimationSettings, VehicleAnimator, WheelSide};
use arcade_vehicle::config::ServerConfig;
use arcade_vehicle::host::{NetworkTransport, VehicleBody};
use arcade_vehicle::math::{Quat, Vec3, from_euler_degrees};
use arcade_vehicle::path::PathFollower;
use arcade_vehicle::presets::{PresetKind, VehiclePreset};
use arcade_vehicle::protocol::{
    self, ClientFrame, ServerFrame, VehicleView, WireState, WorldSnapshot,
};
use arcade_vehicle::rapier_host::{PhysicsWorld, PresetRig};
use arcade_vehicle::snapshot::VehiclePhysicsState;
use arcade_vehicle::vehicle::{Frame, NetRole, Vehicle, VehicleContext};
use rapier3d::prelude::RigidBodyHandle;
use tokio::sync::mpsc::UnboundedSender;
use tungstenite::Message;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

// --------------------------------------------------
// Outgoing events
// --------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outgoing {
    Replicate(VehiclePhysicsState),
    Teleport(Vec3, Quat),
}

/// Server side transport: collects what a vehicle wants sent, flushed to the
/// clients once the vehicle call returns.
pub struct ServerLink<'a> {
    owner_half_rtt: f64,
    events: &'a mut Vec<Outgoing>,
}

impl<'a> ServerLink<'a> {
    pub fn new(owner_half_rtt: f64, events: &'a mut Vec<Outgoing>) -> Self {
        Self { owner_half_rtt, events }
    }
}

impl NetworkTransport for ServerLink<'_> {
    fn send_state_to_server(&mut self, _state: &VehiclePhysicsState) {
        debug!("server-side vehicle tried to send state to itself");
    }

    fn replicate_state(&mut self, state: &VehiclePhysicsState) {
        self.events.push(Outgoing::Replicate(*state));
    }

    fn send_teleport_to_server(&mut self, _location: Vec3, _rotation: Quat) {
        debug!("server-side vehicle tried to send a teleport to itself");
    }

    fn multicast_teleport(&mut self, location: Vec3, rotation: Quat) {
        self.events.push(Outgoing::Teleport(location, rotation));
    }

    fn half_rtt(&self) -> f64 {
        0.0
    }

    fn owner_half_rtt(&self) -> f64 {
        self.owner_half_rtt
    }
}

// --------------------------------------------------
// Entities
// --------------------------------------------------

pub struct Client {
    pub vehicle_id: Uuid,
    pub tx: UnboundedSender<Message>,
    /// seconds, from the client's last reported RTT
    pub half_rtt: f64,
}

pub struct ServerVehicle {
    pub id: Uuid,
    pub owner: Option<Uuid>,
    pub kind: PresetKind,
    pub body: RigidBodyHandle,
    pub rig: PresetRig,
    pub vehicle: Vehicle,
    pub animator: VehicleAnimator,
    pub path: Option<PathFollower>,
    pub spawn: (Vec3, Quat),
}

/// Tank presets get the track animator; wheel sides follow the attachment
/// side unless configured.
pub fn animation_settings(base: &AnimationSettings, kind: PresetKind, preset: &VehiclePreset) -> AnimationSettings {
    let mut settings = base.clone();
    if kind == PresetKind::Tank && settings.tank.is_none() {
        settings.tank = Some(Default::default());
    }
    if settings.wheels.sides.is_empty() {
        settings.wheels.sides = preset
            .attachments
            .iter()
            .map(|(_, location)| WheelSide::from_local_y(location.y))
            .collect();
    }
    settings
}

pub struct SharedGameState {
    pub tick: u64,
    pub time: f64,
    pub config: ServerConfig,
    pub clients: HashMap<Uuid, Client>,
    pub vehicles: HashMap<Uuid, ServerVehicle>,
}

impl SharedGameState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            tick: 0,
            time: 0.0,
            config,
            clients: HashMap::new(),
            vehicles: HashMap::new(),
        }
    }

    // --------------------------------------------------
    // Spawning
    // --------------------------------------------------

    fn spawn_vehicle(
        &mut self,
        physics: &mut PhysicsWorld,
        kind: PresetKind,
        owner: Option<Uuid>,
        location: Vec3,
        rotation: Quat,
    ) -> Option<Uuid> {
        let preset = kind.build();
        let rig = PresetRig::new(&preset);
        let body = physics.spawn_vehicle(&preset, location, rotation);

        let mut vehicle = Vehicle::skeletal(preset.settings.clone());
        vehicle.set_role(NetRole::server(owner));

        let applied = match physics.body(body) {
            Some(mut host) => vehicle.apply_settings(&mut host, &rig),
            None => Err(arcade_vehicle::InitError::MissingRootBody),
        };
        if applied.is_err() {
            // apply_settings already logged the reason
            physics.remove_vehicle(body);
            return None;
        }

        let id = Uuid::new_v4();
        let animator = VehicleAnimator::new(animation_settings(&self.config.animation, kind, &preset));
        self.vehicles.insert(
            id,
            ServerVehicle {
                id,
                owner,
                kind,
                body,
                rig,
                vehicle,
                animator,
                path: None,
                spawn: (location, rotation),
            },
        );
        self.broadcast_frame(&ServerFrame::Spawned { vehicle: id, owner });
        info!(%id, ?kind, ?owner, "vehicle spawned");
        Some(id)
    }

    /// Registers a client and gives it a vehicle of the configured preset.
    pub fn add_player(
        &mut self,
        physics: &mut PhysicsWorld,
        player_id: Uuid,
        tx: UnboundedSender<Message>,
    ) -> Option<Uuid> {
        let location = self.config.player_spawn(self.clients.len());
        let vehicle_id =
            self.spawn_vehicle(physics, self.config.vehicle, Some(player_id), location, Quat::identity())?;
        if self.config.max_speed_multiplier != 1.0 {
            self.set_max_speed_multiplier(vehicle_id, self.config.max_speed_multiplier);
        }

        // tell the newcomer about everything already on the map
        for v in self.vehicles.values() {
            if v.id != vehicle_id {
                send_frame(&tx, &ServerFrame::Spawned { vehicle: v.id, owner: v.owner });
            }
        }

        self.clients.insert(
            player_id,
            Client {
                vehicle_id,
                tx,
                half_rtt: 0.0,
            },
        );
        Some(vehicle_id)
    }

    pub fn remove_player(&mut self, physics: &mut PhysicsWorld, player_id: &Uuid) {
        let Some(client) = self.clients.remove(player_id) else {
            return;
        };
        if let Some(v) = self.vehicles.remove(&client.vehicle_id) {
            physics.remove_vehicle(v.body);
            self.broadcast_frame(&ServerFrame::Despawned { vehicle: v.id });
            info!(player = %player_id, vehicle = %v.id, "vehicle removed");
        }
    }

    pub fn spawn_ai_vehicles(&mut self, physics: &mut PhysicsWorld) {
        for ai in self.config.ai_vehicles.clone() {
            let rotation = from_euler_degrees(0.0, 0.0, ai.yaw);
            let Some(id) = self.spawn_vehicle(physics, ai.preset, None, ai.spawn_location(), rotation) else {
                continue;
            };
            if let Some(v) = self.vehicles.get_mut(&id) {
                let mut follower = PathFollower::new(ai.waypoints(), ai.acceptance_radius);
                if ai.looped {
                    follower = follower.looped();
                }
                v.path = Some(follower);
            }
        }
    }

    /// Scales a vehicle's forward top speed and tells every client.
    pub fn set_max_speed_multiplier(&mut self, vehicle: Uuid, multiplier: f32) -> bool {
        let Some(v) = self.vehicles.get_mut(&vehicle) else {
            return false;
        };
        v.vehicle.set_max_speed_multiplier(multiplier);
        let multiplier = v.vehicle.max_speed_multiplier();
        self.broadcast_frame(&ServerFrame::MaxSpeedMultiplier { vehicle, multiplier });
        true
    }

    // --------------------------------------------------
    // Inbound
    // --------------------------------------------------

    pub fn handle_client_frame(&mut self, physics: &mut PhysicsWorld, player_id: &Uuid, frame: ClientFrame) {
        let Some(client) = self.clients.get_mut(player_id) else {
            return;
        };
        let own_vehicle = client.vehicle_id;
        let now = self.time;

        match frame {
            ClientFrame::Ping { client_time, rtt_ms } => {
                client.half_rtt = rtt_ms as f64 / 2000.0;
                send_frame(&client.tx, &ServerFrame::Pong { client_time, server_time: now });
            }
            ClientFrame::State { vehicle, state } => {
                if vehicle != own_vehicle {
                    warn!(player = %player_id, %vehicle, "state for a vehicle the player does not own");
                    return;
                }
                let owner_half_rtt = client.half_rtt;
                let mut events = Vec::new();
                if let Some(v) = self.vehicles.get_mut(&vehicle) {
                    let mut link = ServerLink::new(owner_half_rtt, &mut events);
                    v.vehicle.receive_state_on_server(state.into(), &mut link, now);
                }
                self.dispatch(vehicle, Some(*player_id), events);
            }
            ClientFrame::Teleport { vehicle, location, rotation } => {
                if vehicle != own_vehicle {
                    warn!(player = %player_id, %vehicle, "teleport for a vehicle the player does not own");
                    return;
                }
                let owner_half_rtt = client.half_rtt;
                let mut events = Vec::new();
                if let Some(v) = self.vehicles.get_mut(&vehicle) {
                    if let Some(mut host) = physics.body(v.body) {
                        let mut link = ServerLink::new(owner_half_rtt, &mut events);
                        v.vehicle
                            .receive_teleport_request(&mut host, &mut link, location.into(), rotation.into(), now);
                    }
                }
                physics.update_queries();
                self.dispatch(vehicle, Some(*player_id), events);
            }
        }
    }

    // --------------------------------------------------
    // Tick
    // --------------------------------------------------

    pub fn step(&mut self, physics: &mut PhysicsWorld, dt: f32) {
        self.time += dt as f64;
        let frame = Frame { dt, now: self.time };
        let clients = &self.clients;
        let mut outgoing: Vec<(Uuid, Option<Uuid>, Vec<Outgoing>)> = Vec::new();

        // 1) AI
        for v in self.vehicles.values_mut() {
            let Some(path) = v.path.as_mut() else { continue };
            let Some(host) = physics.body(v.body) else { continue };
            let transform = host.transform();
            path.update(&mut v.vehicle, &transform.translation.vector, &transform.rotation);
        }

        // 2) pre-physics
        for v in self.vehicles.values_mut() {
            let Some(mut host) = physics.body(v.body) else { continue };
            let mut events = Vec::new();
            let mut link = ServerLink::new(owner_half_rtt(clients, v.owner), &mut events);
            let mut ctx = VehicleContext { host: &mut host, attachments: &v.rig, net: &mut link };
            v.vehicle.pre_physics(&mut ctx, frame);
        }

        // 3) physics
        physics.step(dt);

        // 4-6) post-physics, animation, sanity
        let sanity = self.config.sanity;
        for v in self.vehicles.values_mut() {
            let Some(mut host) = physics.body(v.body) else { continue };
            let mut events = Vec::new();
            {
                let mut link = ServerLink::new(owner_half_rtt(clients, v.owner), &mut events);
                let mut ctx = VehicleContext { host: &mut host, attachments: &v.rig, net: &mut link };
                v.vehicle.post_physics(&mut ctx, frame);
            }

            v.animator.update(&v.vehicle.animation_frame(), dt);

            let location = host.transform().translation.vector;
            if !sanity.contains(&location) {
                warn!(vehicle = %v.id, ?location, "vehicle left the sanity box, resetting");
                let (spawn_location, spawn_rotation) = v.spawn;
                let mut link = ServerLink::new(owner_half_rtt(clients, v.owner), &mut events);
                v.vehicle
                    .teleport(&mut host, &mut link, spawn_location, spawn_rotation, frame.now);
            }

            if !events.is_empty() {
                outgoing.push((v.id, v.owner, events));
            }
        }
        physics.update_queries();

        // 7) flush
        for (vehicle, owner, events) in outgoing {
            self.dispatch(vehicle, owner, events);
        }
        self.tick += 1;
        self.broadcast_snapshot(physics);
    }

    // --------------------------------------------------
    // Outbound
    // --------------------------------------------------

    fn dispatch(&self, vehicle: Uuid, owner: Option<Uuid>, events: Vec<Outgoing>) {
        for event in events {
            match event {
                Outgoing::Replicate(state) => {
                    let frame = ServerFrame::State { vehicle, state: WireState::from(&state) };
                    for (id, client) in &self.clients {
                        if Some(*id) != owner {
                            send_frame(&client.tx, &frame);
                        }
                    }
                }
                Outgoing::Teleport(location, rotation) => {
                    self.broadcast_frame(&ServerFrame::Teleport {
                        vehicle,
                        location: location.into(),
                        rotation: rotation.into(),
                    });
                }
            }
        }
    }

    fn broadcast_frame(&self, frame: &ServerFrame) {
        for client in self.clients.values() {
            send_frame(&client.tx, frame);
        }
    }

    /// Build and send a JSON snapshot of all vehicles to all clients.
    pub fn broadcast_snapshot(&self, physics: &mut PhysicsWorld) {
        let mut views = Vec::with_capacity(self.vehicles.len());
        for v in self.vehicles.values() {
            let Some(host) = physics.body(v.body) else { continue };
            let transform = host.transform();
            let p = transform.translation.vector;
            let q = transform.rotation;
            views.push(VehicleView {
                id: v.id,
                owner: v.owner,
                preset: v.kind,
                position: [p.x, p.y, p.z],
                rotation: [q.i, q.j, q.k, q.w],
                speed: v.vehicle.speed(),
                pose: v.animator.pose(),
            });
        }

        let json = match WorldSnapshot::new(self.tick, views).to_json() {
            Ok(json) => json,
            Err(err) => {
                error!(%err, "snapshot encoding failed");
                return;
            }
        };
        for client in self.clients.values() {
            let _ = client.tx.send(Message::Text(json.clone()));
        }
    }
}

fn owner_half_rtt(clients: &HashMap<Uuid, Client>, owner: Option<Uuid>) -> f64 {
    owner
        .and_then(|id| clients.get(&id))
        .map(|c| c.half_rtt)
        .unwrap_or(0.0)
}

pub fn send_frame(tx: &UnboundedSender<Message>, frame: &ServerFrame) {
    match protocol::encode(frame) {
        Ok(bytes) => {
            let _ = tx.send(Message::Binary(bytes));
        }
        Err(err) => error!(%err, "frame encoding failed"),
    }
}
