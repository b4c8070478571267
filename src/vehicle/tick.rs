// ==============================================================================
// vehicle/tick.rs - PRE / POST PHYSICS
// ------------------------------------------------------------------------------
// pre_physics (before the host integrates):
//   prepare       : corrections + server modifiers (observers), input, forces,
//                   runtime refresh
//   gravity       : mass × custom gravity when enabled
//   suspension    : unscaled dt
//   adherence → acceleration → angular adherence + turning → friction
//   write-back    : linear, stabilization, angular, movement hook
//
// post_physics (after the host integrated):
//   snapshot → server receive (authority) / send (client) / buffer (observer)
//
// Everything after suspension runs on dt × force_time_scale.
// ==============================================================================

use super::{Frame, Vehicle, VehicleContext};
use crate::adherence::{raw_adherence, update_adherence};
use crate::friction::apply_friction;
use crate::host::{VehicleBody, VehicleHost};
use crate::integrator::{accelerate, apply_angular_adherence, stabilize, turn};
use crate::snapshot::VehiclePhysicsState;
use crate::suspension::WheelContacts;

impl Vehicle {
    pub fn pre_physics(&mut self, ctx: &mut VehicleContext<'_>, frame: Frame) {
        if !self.tick_enabled || !self.initialized {
            return;
        }
        if !ctx.host.has_body() || !ctx.host.is_simulating() {
            return;
        }

        self.observe_controller();

        let raw_dt = frame.dt;
        let dt = frame.dt * self.settings.physics.force_time_scale;

        self.prepare(&mut *ctx.host);

        if self.settings.physics.custom_gravity {
            let force = self.settings.physics.gravity * ctx.host.mass();
            ctx.host.add_force(force);
        }

        let advanced = self.settings.advanced;

        self.contacts = if advanced.enable_suspension {
            let body = ctx.host.transform();
            let base = self.mesh.wheels_base_transform(&body, ctx.attachments);
            let gravity = self.vehicle_gravity(&*ctx.host).norm();
            self.suspension.update(
                &self.settings.suspension,
                &mut self.springs,
                &mut *ctx.host,
                &base,
                gravity,
                raw_dt,
            )
        } else {
            self.all_wheels_grounded()
        };

        if advanced.enable_adherence {
            update_adherence(&mut self.runtime, &self.settings.steering, dt);
        } else {
            raw_adherence(&mut self.runtime, &self.settings.steering);
        }

        if advanced.enable_acceleration && self.contacts.drive_grounded > 0 {
            let drive = if self.settings.engine.scale_acceleration_by_drive_wheels {
                self.contacts.drive_wheels_multiplier()
            } else {
                1.0
            };
            accelerate(&mut self.runtime, &self.forces, drive, dt);
        }

        if self.contacts.steering_grounded > 0 {
            if advanced.enable_adherence {
                apply_angular_adherence(&mut self.runtime, dt);
            }
            if advanced.enable_turning {
                turn(&mut self.runtime, &self.forces, &self.settings.steering, dt);
            }
        }

        if advanced.enable_friction {
            apply_friction(
                &mut self.runtime,
                &mut self.friction,
                &self.settings.physics,
                self.contacts.total_wheels_multiplier(),
                &mut *ctx.host,
            );
        }

        let rotation = ctx.host.transform().rotation;
        ctx.host
            .set_linear_velocity(rotation * self.runtime.local_linear_velocity);

        if self.active_input.stabilizing {
            let force = self.settings.physics.stabilization_force;
            stabilize(&mut self.runtime, &rotation, force, dt);
        }
        ctx.host
            .set_angular_velocity_deg(rotation * self.runtime.local_angular_velocity);

        if let Some(hook) = self.hook.as_mut() {
            let extra = hook.contribute(&self.active_input, &*ctx.host, dt);
            ctx.host.add_force(extra.force);
            ctx.host.add_torque(extra.torque);
        }
    }

    pub fn post_physics(&mut self, ctx: &mut VehicleContext<'_>, frame: Frame) {
        if !self.tick_enabled || !self.initialized || !ctx.host.has_body() {
            return;
        }

        let state = self.build_state(&*ctx.host, frame.now);

        if !self.has_control() {
            self.history.add(state);
        } else if self.role.authority {
            self.receive_state_on_server(state, &mut *ctx.net, frame.now);
        } else {
            ctx.net.send_state_to_server(&state);
        }
    }

    // --------------------------------------------------
    // prepare
    // --------------------------------------------------

    fn prepare(&mut self, host: &mut dyn VehicleHost) {
        let in_control = self.has_control();

        if !in_control {
            self.apply_corrections(host);
            if let Some(state) = &self.server_state {
                self.modifiers = state.modifiers;
            }
        }

        self.active_input = if in_control {
            self.input
        } else {
            self.server_state.map(|s| s.input).unwrap_or_default()
        };

        let previous = self.forces;
        self.forces = self.force_model.compute(
            &self.settings,
            &self.settings,
            &self.active_input,
            self.modifiers,
            self.runtime.speed,
            &previous,
        );

        self.runtime
            .refresh(&*host, &self.settings, &self.active_input, self.max_speed_multiplier);
    }

    fn apply_corrections(&mut self, host: &mut dyn VehicleHost) {
        let physics = &self.settings.physics;
        let exponent = physics.correction_exponent;
        let enhanced = physics.enhance_correction;
        let corrections = &mut self.corrections;

        if corrections.location.is_correcting {
            let live = host.transform().translation.vector;
            let corrected = corrections.location.step(
                live,
                Some(physics.location_snap_distance),
                exponent,
                enhanced,
            );
            host.set_location(corrected);
            if self.friction.active {
                self.friction.reanchor(corrected);
            }
        }

        if corrections.rotation.is_correcting {
            let live = host.transform().rotation;
            let corrected =
                corrections
                    .rotation
                    .step(live, physics.rotation_snap_distance, exponent, enhanced);
            host.set_rotation(corrected);
        }

        if corrections.linear_velocity.is_correcting {
            let live = host.linear_velocity();
            let corrected = corrections.linear_velocity.step(live, None, exponent, enhanced);
            host.set_linear_velocity(corrected);
        }

        if corrections.angular_velocity.is_correcting {
            let live = host.angular_velocity_deg();
            let corrected = corrections.angular_velocity.step(live, None, exponent, enhanced);
            host.set_angular_velocity_deg(corrected);
        }
    }

    fn build_state<B: VehicleBody + ?Sized>(&self, host: &B, now: f64) -> VehiclePhysicsState {
        let transform = host.transform();
        VehiclePhysicsState {
            timestamp: now,
            input: self.active_input,
            location: transform.translation.vector,
            rotation: transform.rotation,
            linear_velocity: host.linear_velocity(),
            angular_velocity: host.angular_velocity_deg(),
            modifiers: self.modifiers,
        }
    }

    /// Suspension disabled: every wheel counts as touching the ground.
    fn all_wheels_grounded(&self) -> WheelContacts {
        let total = self.springs.len();
        let drive = self.settings.drive_wheel_count();
        let steering = self.settings.steering_wheel_count();
        WheelContacts {
            total,
            grounded: total,
            drive_total: drive,
            drive_grounded: drive,
            steering_total: steering,
            steering_grounded: steering,
        }
    }
}
