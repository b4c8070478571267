// ==============================================================================
// vehicle/network.rs - ROLES, RECONCILIATION, TELEPORT
// ------------------------------------------------------------------------------
// In control  = (controlled && locally controlled) || (!controlled && authority)
//
// Controlling side : simulates its own input and ships a snapshot each tick.
// Server           : stamps incoming snapshots with the owner's half RTT and
//                    replicates them to every other node.
// Observer         : simulates the last authoritative input, buffers its own
//                    states, and arms correction channels from the buffered
//                    state at the snapshot's local time.
// ==============================================================================

use super::Vehicle;
use crate::host::{NetworkTransport, VehicleBody};
use crate::math::{Quat, Vec3};
use crate::snapshot::VehiclePhysicsState;
use tracing::{debug, error};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetRole {
    /// This node is the server.
    pub authority: bool,
    /// Player currently driving the vehicle, if any.
    pub controller: Option<Uuid>,
    /// The controller is the player on this node.
    pub locally_controlled: bool,
}

impl NetRole {
    /// Single node, nobody driving remotely.
    pub fn standalone() -> Self {
        Self {
            authority: true,
            controller: None,
            locally_controlled: false,
        }
    }

    pub fn server(controller: Option<Uuid>) -> Self {
        Self {
            authority: true,
            controller,
            locally_controlled: false,
        }
    }

    pub fn client(controller: Option<Uuid>, locally_controlled: bool) -> Self {
        Self {
            authority: false,
            controller,
            locally_controlled: controller.is_some() && locally_controlled,
        }
    }

    pub fn has_control(&self) -> bool {
        match self.controller {
            Some(_) => self.locally_controlled,
            None => self.authority,
        }
    }
}

impl Vehicle {
    pub fn role(&self) -> NetRole {
        self.role
    }

    /// Takes effect at the next tick, which also notices controller changes.
    pub fn set_role(&mut self, role: NetRole) {
        self.role = role;
    }

    pub fn has_control(&self) -> bool {
        self.role.has_control()
    }

    pub fn server_state(&self) -> Option<&VehiclePhysicsState> {
        self.server_state.as_ref()
    }

    pub fn history(&self) -> &crate::history::PhysicsStateRingBuffer {
        &self.history
    }

    pub fn corrections(&self) -> &crate::correction::Corrections {
        &self.corrections
    }

    pub fn last_teleport_time(&self) -> f64 {
        self.last_teleport_time
    }

    pub(super) fn observe_controller(&mut self) {
        if self.observed_controller != self.role.controller {
            debug!(
                from = ?self.observed_controller,
                to = ?self.role.controller,
                "vehicle controller changed"
            );
            self.observed_controller = self.role.controller;
            self.clear_network_data();
        }
    }

    /// Drops inputs, buffered history, corrections and the friction anchor.
    pub fn clear_network_data(&mut self) {
        self.input.clear();
        self.active_input.clear();
        self.history.clear();
        self.corrections.reset();
        self.friction.reset();
        self.server_state = None;
    }

    // --------------------------------------------------
    // Snapshot receive
    // --------------------------------------------------

    /// Server side: a snapshot arrived from the controlling client, or the
    /// server produced it while in control.
    pub fn receive_state_on_server(
        &mut self,
        mut state: VehiclePhysicsState,
        net: &mut dyn NetworkTransport,
        now: f64,
    ) {
        state.timestamp = net.owner_half_rtt();
        self.server_state = Some(state);
        net.replicate_state(&state);

        if !self.has_control() {
            self.receive_replicated_state(state, &*net, now);
        }
    }

    /// Observer side: reconcile against an authoritative snapshot.
    pub fn receive_replicated_state(
        &mut self,
        state: VehiclePhysicsState,
        net: &dyn NetworkTransport,
        now: f64,
    ) {
        let half_rtt = net.half_rtt();
        let local_time = now - (state.timestamp + half_rtt);
        if local_time < self.last_teleport_time {
            debug!(local_time, teleport = self.last_teleport_time, "stale snapshot dropped");
            return;
        }

        self.server_state = Some(state);

        if let Some(past) = self.history.suitable_state(local_time) {
            self.corrections.location.arm(state.location, past.location);
            self.corrections.rotation.arm(state.rotation, past.rotation);
            self.corrections
                .linear_velocity
                .arm(state.linear_velocity, past.linear_velocity);
            self.corrections
                .angular_velocity
                .arm(state.angular_velocity, past.angular_velocity);
        }

        self.history.clear_old_states(local_time + half_rtt);
    }

    // --------------------------------------------------
    // Teleport
    // --------------------------------------------------

    /// Controller or server only. The server applies and multicasts; a
    /// controlling client asks the server.
    pub fn teleport<B: VehicleBody + ?Sized>(
        &mut self,
        host: &mut B,
        net: &mut dyn NetworkTransport,
        location: Vec3,
        rotation: Quat,
        now: f64,
    ) {
        if self.role.authority {
            net.multicast_teleport(location, rotation);
            self.apply_teleport(host, location, rotation, now);
        } else if self.has_control() {
            net.send_teleport_to_server(location, rotation);
        } else {
            error!("teleport refused: vehicle is neither controlled here nor authoritative");
        }
    }

    /// Server side: the controlling client asked for a teleport.
    pub fn receive_teleport_request<B: VehicleBody + ?Sized>(
        &mut self,
        host: &mut B,
        net: &mut dyn NetworkTransport,
        location: Vec3,
        rotation: Quat,
        now: f64,
    ) {
        net.multicast_teleport(location, rotation);
        self.apply_teleport(host, location, rotation, now);
    }

    /// Every node, on a multicast teleport.
    pub fn apply_teleport<B: VehicleBody + ?Sized>(
        &mut self,
        host: &mut B,
        location: Vec3,
        rotation: Quat,
        now: f64,
    ) {
        self.last_teleport_time = now;
        self.clear_network_data();

        host.set_location(location);
        host.set_rotation(rotation);
        host.set_linear_velocity(Vec3::zeros());
        host.set_angular_velocity_deg(Vec3::zeros());

        self.friction.reanchor(location);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::friction::apply_friction;
    use crate::input::VehicleInput;
    use crate::runtime::VehiclePhysicsRuntime;
    use crate::settings::PhysicsSettings;
    use crate::testing::{FakeBody, RecordingNet, sport_car_rig};

    fn observer() -> (Vehicle, FakeBody) {
        let mut vehicle = Vehicle::skeletal(crate::presets::sport_car());
        let mut body = FakeBody::on_ground(60.0);
        vehicle.apply_settings(&mut body, &sport_car_rig()).unwrap();
        vehicle.set_role(NetRole::client(Some(Uuid::new_v4()), false));
        (vehicle, body)
    }

    fn state_at(timestamp: f64, x: f32) -> VehiclePhysicsState {
        VehiclePhysicsState {
            timestamp,
            location: Vec3::new(x, 0.0, 60.0),
            ..Default::default()
        }
    }

    #[test]
    fn control_truth_table() {
        let player = Some(Uuid::new_v4());
        assert!(NetRole::standalone().has_control());
        assert!(NetRole::server(None).has_control());
        assert!(!NetRole::server(player).has_control());
        assert!(NetRole::client(player, true).has_control());
        assert!(!NetRole::client(player, false).has_control());
        assert!(!NetRole::client(None, true).has_control());
    }

    #[test]
    fn server_stamps_and_replicates() {
        let mut vehicle = Vehicle::skeletal(crate::presets::sport_car());
        vehicle.set_role(NetRole::server(Some(Uuid::new_v4())));
        let mut net = RecordingNet { owner_half_rtt: 0.04, ..Default::default() };

        vehicle.receive_state_on_server(state_at(99.0, 10.0), &mut net, 5.0);

        assert_eq!(net.replicated.len(), 1);
        assert_eq!(net.replicated[0].timestamp, 0.04);
        assert_eq!(vehicle.server_state().map(|s| s.timestamp), Some(0.04));
    }

    #[test]
    fn observer_arms_corrections_from_history() {
        let (mut vehicle, _) = observer();
        vehicle.history.add(state_at(1.0, 0.0));
        vehicle.history.add(state_at(2.0, 100.0));
        vehicle.history.add(state_at(3.0, 200.0));

        // local time 2.5: historical x = 150, authoritative x = 180
        let net = RecordingNet { half_rtt: 0.25, ..Default::default() };
        vehicle.receive_replicated_state(state_at(0.25, 180.0), &net, 3.0);

        let location = &vehicle.corrections().location;
        assert!(location.is_correcting);
        assert!((location.error.x - 30.0).abs() < 1e-3);
        assert!(!vehicle.corrections().linear_velocity.is_correcting);
        assert!(vehicle.server_state().is_some());
        // older than 2.75 dropped, one lower bracket kept
        assert_eq!(vehicle.history().first().timestamp, 2.0);
    }

    #[test]
    fn snapshot_before_teleport_is_rejected() {
        let (mut vehicle, mut body) = observer();
        vehicle.apply_teleport(&mut body, Vec3::new(0.0, 0.0, 60.0), Quat::identity(), 10.0);
        vehicle.history.add(state_at(9.0, 0.0));

        let net = RecordingNet::default();
        vehicle.receive_replicated_state(state_at(0.0, 500.0), &net, 9.5);
        assert!(vehicle.server_state().is_none());
        assert!(!vehicle.corrections().any_correcting());
    }

    #[test]
    fn teleport_zeroes_velocity_and_clears_corrections() {
        let (mut vehicle, mut body) = observer();
        vehicle.set_role(NetRole::standalone());
        vehicle.corrections.location.arm(Vec3::new(50.0, 0.0, 0.0), Vec3::zeros());
        vehicle.corrections.angular_velocity.arm(Vec3::new(0.0, 0.0, 90.0), Vec3::zeros());
        body.linear_velocity = Vec3::new(1000.0, 5.0, 0.0);
        body.angular_velocity_deg = Vec3::new(0.0, 0.0, 30.0);

        let mut net = RecordingNet::default();
        let target = Vec3::new(500.0, -200.0, 80.0);
        vehicle.teleport(&mut body, &mut net, target, Quat::identity(), 4.0);

        assert_eq!(body.linear_velocity, Vec3::zeros());
        assert_eq!(body.angular_velocity_deg, Vec3::zeros());
        assert_eq!(body.transform.translation.vector, target);
        assert!(!vehicle.corrections().any_correcting());
        assert_eq!(vehicle.last_teleport_time(), 4.0);
        assert_eq!(net.multicast_teleports.len(), 1);
    }

    #[test]
    fn teleport_moves_the_friction_anchor() {
        let (mut vehicle, mut body) = observer();
        vehicle.set_role(NetRole::standalone());
        let physics = PhysicsSettings::default();
        let mut runtime = VehiclePhysicsRuntime::default();

        apply_friction(&mut runtime, &mut vehicle.friction, &physics, 1.0, &mut body);
        assert!(vehicle.friction.active);
        assert_eq!(vehicle.friction.location, Vec3::new(0.0, 0.0, 60.0));

        let target = Vec3::new(500.0, -200.0, 60.0);
        let mut net = RecordingNet::default();
        vehicle.teleport(&mut body, &mut net, target, Quat::identity(), 2.0);
        assert!(vehicle.friction.active);
        assert_eq!(vehicle.friction.location, target);

        // next friction tick holds the teleport spot, not the old anchor
        apply_friction(&mut runtime, &mut vehicle.friction, &physics, 1.0, &mut body);
        assert_eq!(body.transform.translation.vector, target);
    }

    #[test]
    fn controlling_client_asks_server_to_teleport() {
        let mut vehicle = Vehicle::skeletal(crate::presets::sport_car());
        vehicle.set_role(NetRole::client(Some(Uuid::new_v4()), true));
        let mut body = FakeBody::default();
        let mut net = RecordingNet::default();

        vehicle.teleport(&mut body, &mut net, Vec3::new(1.0, 2.0, 3.0), Quat::identity(), 1.0);
        assert_eq!(net.teleports_to_server.len(), 1);
        assert!(net.multicast_teleports.is_empty());
        assert_eq!(body.transform.translation.vector, Vec3::zeros());
    }

    #[test]
    fn observer_cannot_teleport() {
        let (mut vehicle, mut body) = observer();
        let mut net = RecordingNet::default();
        vehicle.teleport(&mut body, &mut net, Vec3::new(1.0, 2.0, 3.0), Quat::identity(), 1.0);
        assert!(net.teleports_to_server.is_empty());
        assert!(net.multicast_teleports.is_empty());
    }

    #[test]
    fn controller_change_clears_network_data() {
        let (mut vehicle, _) = observer();
        vehicle.observe_controller();
        vehicle.history.add(state_at(1.0, 0.0));
        vehicle.set_acceleration_input(1.0);

        vehicle.set_role(NetRole::client(Some(Uuid::new_v4()), false));
        vehicle.observe_controller();
        assert!(vehicle.history().is_empty());
        assert_eq!(*vehicle.input(), VehicleInput::default());
    }
}
