// ==============================================================================
// suspension.rs - RAYCAST SUSPENSION
// ------------------------------------------------------------------------------
// Per spring, every tick:
//   1) trace from (spring + up × up_offset) down to (spring - up × length)
//      (sphere when trace_thickness > 0, distance measured along up to the
//      contact point)
//   2) distance < 0 means the body sank: lift it, refresh, distance = 0
//   3) spring force = -(|g| × k × (distance - target)) - damping × v·n
//      clamped ≥ 0 unless ground snapping is on
//   4) second pass: apply forces at the spring, derive wheel offset + swing
//
// A missed trace means full droop (offset = min) and no ground contact.
// ==============================================================================

use crate::host::{ProbeQuery, VehicleHost};
use crate::math::{Transform, Vec3, map_range_clamped, up_vector};
use crate::settings::SuspensionSettings;
use nalgebra::Point3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringState {
    /// Body-space attachment location, resolved once at init.
    pub local_location: Vec3,

    pub hit: bool,
    pub distance: f32,
    pub normal: Vec3,
    pub impact_point: Vec3,
    pub trace_start: Vec3,
    pub trace_end: Vec3,

    /// World location the force is applied at.
    pub begin: Vec3,
    pub wheel_offset: f32,
    /// Degrees.
    pub swing: f32,
    pub force: Vec3,
}

impl SpringState {
    pub fn new(local_location: Vec3) -> Self {
        Self {
            local_location,
            hit: false,
            distance: 0.0,
            normal: Vec3::z(),
            impact_point: Vec3::zeros(),
            trace_start: Vec3::zeros(),
            trace_end: Vec3::zeros(),
            begin: Vec3::zeros(),
            wheel_offset: 0.0,
            swing: 0.0,
            force: Vec3::zeros(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WheelContacts {
    pub total: usize,
    pub grounded: usize,
    pub drive_total: usize,
    pub drive_grounded: usize,
    pub steering_total: usize,
    pub steering_grounded: usize,
}

impl WheelContacts {
    pub fn drive_wheels_multiplier(&self) -> f32 {
        fraction(self.drive_grounded, self.drive_total)
    }

    pub fn steering_wheels_multiplier(&self) -> f32 {
        fraction(self.steering_grounded, self.steering_total)
    }

    pub fn total_wheels_multiplier(&self) -> f32 {
        fraction(self.grounded, self.total)
    }
}

fn fraction(grounded: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        (grounded as f32 / total as f32).clamp(0.0, 1.0)
    }
}

pub trait SuspensionStrategy: Send {
    fn update(
        &mut self,
        settings: &SuspensionSettings,
        springs: &mut [SpringState],
        host: &mut dyn VehicleHost,
        wheels_base: &Transform,
        gravity: f32,
        dt: f32,
    ) -> WheelContacts;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RaycastSuspension;

impl SuspensionStrategy for RaycastSuspension {
    fn update(
        &mut self,
        settings: &SuspensionSettings,
        springs: &mut [SpringState],
        host: &mut dyn VehicleHost,
        wheels_base: &Transform,
        gravity: f32,
        dt: f32,
    ) -> WheelContacts {
        update_suspension(settings, springs, host, wheels_base, gravity, dt)
    }
}

/// `gravity` is the gravity magnitude, units/s².
pub fn update_suspension<H: VehicleHost + ?Sized>(
    settings: &SuspensionSettings,
    springs: &mut [SpringState],
    host: &mut H,
    wheels_base: &Transform,
    gravity: f32,
    dt: f32,
) -> WheelContacts {
    let mut contacts = WheelContacts::default();
    let mut sink_shift = Vec3::zeros();

    for (state, spring) in springs.iter_mut().zip(&settings.springs) {
        contacts.total += 1;
        contacts.drive_total += spring.drive as usize;
        contacts.steering_total += spring.steering as usize;

        trace_spring(settings, state, host, &mut sink_shift);

        let body = host.transform();
        let up = up_vector(&body.rotation);
        let spring_world = body * Point3::from(state.local_location);
        let mut base = *wheels_base;
        base.translation.vector += sink_shift;
        let wheel_world = base * Point3::from(state.local_location);

        state.begin = spring_world.coords;
        state.wheel_offset = spring_world.z - wheel_world.z;
        state.force = Vec3::zeros();

        if !state.hit {
            continue;
        }

        let point_velocity = host.velocity_at_point(state.trace_start);
        let relative = point_velocity.dot(&state.normal);

        let stiffness = gravity.abs() * spring.spring_force;
        let damping = if settings.suspension_stabilization {
            spring.damping * settings.stabilization_multiplier * dt
        } else {
            spring.damping
        };

        let mut magnitude =
            -(stiffness * (state.distance - spring.target_height)) - damping * relative;
        if !settings.ground_snapping {
            magnitude = magnitude.max(0.0);
        }
        state.force = up * magnitude;

        contacts.grounded += 1;
        contacts.drive_grounded += spring.drive as usize;
        contacts.steering_grounded += spring.steering as usize;
    }

    for (state, spring) in springs.iter_mut().zip(&settings.springs) {
        let (min, max) = spring.offset_min_max;
        let offset = if state.hit {
            host.add_force_at_point(state.force, state.begin);
            let raw = -(state.distance - spring.wheel_radius) + state.wheel_offset;
            raw.clamp(min.min(max), max.max(min))
        } else {
            min
        };
        state.wheel_offset = offset;
        state.swing = map_range_clamped(spring.offset_min_max, spring.swing_min_max, offset);
    }

    contacts
}

fn trace_spring<H: VehicleHost + ?Sized>(
    settings: &SuspensionSettings,
    state: &mut SpringState,
    host: &mut H,
    sink_shift: &mut Vec3,
) {
    let body = host.transform();
    let up = up_vector(&body.rotation);
    let spring_world = (body * Point3::from(state.local_location)).coords;

    state.trace_start = spring_world + up * settings.trace_up_offset;
    state.trace_end = spring_world - up * settings.trace_length;

    let query = ProbeQuery {
        start: state.trace_start,
        end: state.trace_end,
        radius: settings.trace_thickness.max(0.0),
        mask: settings.collision_mask,
    };

    let Some(hit) = host.cast(&query) else {
        state.hit = false;
        return;
    };

    state.hit = true;
    state.normal = hit.normal;
    state.impact_point = hit.point;
    state.distance = if query.radius > 0.0 {
        (query.start - hit.point).dot(&up)
    } else {
        hit.distance
    };

    if settings.trace_up_offset > 0.0 {
        state.distance -= settings.trace_up_offset;
        state.trace_start -= up * settings.trace_up_offset;
    }

    if state.distance < 0.0 {
        // sank below the ground: lift so the remaining traces see the fix
        let lift = up * -state.distance;
        host.set_location(body.translation.vector + lift);
        state.trace_start += lift;
        *sink_shift += lift;
        state.distance = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::VehicleBody;
    use crate::settings::SuspensionSpring;
    use crate::testing::{FakeBody, approx};

    fn settings() -> SuspensionSettings {
        let mut spring = SuspensionSpring::new("wheel_fl");
        spring.spring_force = 30.0;
        spring.target_height = 60.0;
        spring.damping = 100.0;
        spring.wheel_radius = 35.0;
        spring.steering = true;
        spring.offset_min_max = (-20.0, 5.0);
        spring.swing_min_max = (-2.5, 7.0);

        SuspensionSettings {
            trace_length: 80.0,
            trace_up_offset: 50.0,
            springs: vec![spring],
            ..Default::default()
        }
    }

    fn run(body: &mut FakeBody, s: &SuspensionSettings) -> (Vec<SpringState>, WheelContacts) {
        let mut springs = vec![SpringState::new(Vec3::new(100.0, 80.0, 0.0))];
        let base = body.transform();
        let contacts = update_suspension(s, &mut springs, body, &base, 980.0, 0.016);
        (springs, contacts)
    }

    #[test]
    fn compressed_spring_pushes_up() {
        let mut body = FakeBody::on_ground(50.0);
        let (springs, contacts) = run(&mut body, &settings());

        assert!(springs[0].hit);
        assert!(approx(springs[0].distance, 50.0, 1e-3));
        // 980 × 30 × (60 - 50)
        assert!(approx(springs[0].force.z, 294_000.0, 1.0));
        assert_eq!(body.forces.len(), 1);
        assert_eq!(body.forces[0].1, Some(Vec3::new(100.0, 80.0, 50.0)));

        assert_eq!(contacts.grounded, 1);
        assert_eq!(contacts.steering_grounded, 1);
        assert_eq!(contacts.drive_wheels_multiplier(), 1.0);
    }

    #[test]
    fn wheel_offset_and_swing_follow_distance() {
        let mut body = FakeBody::on_ground(50.0);
        let (springs, _) = run(&mut body, &settings());
        // -(50 - 35) clamped into (-20, 5)
        assert!(approx(springs[0].wheel_offset, -15.0, 1e-3));
        assert!(approx(springs[0].swing, -0.6, 1e-3));
    }

    #[test]
    fn extended_spring_never_pulls_without_snapping() {
        let mut body = FakeBody::on_ground(75.0);
        let (springs, _) = run(&mut body, &settings());
        assert_eq!(springs[0].force, Vec3::zeros());

        let mut snapping = settings();
        snapping.ground_snapping = true;
        let mut body = FakeBody::on_ground(75.0);
        let (springs, _) = run(&mut body, &snapping);
        assert!(springs[0].force.z < 0.0);
    }

    #[test]
    fn miss_is_full_droop_and_not_grounded() {
        let mut body = FakeBody::default();
        let (springs, contacts) = run(&mut body, &settings());
        assert!(!springs[0].hit);
        assert_eq!(springs[0].wheel_offset, -20.0);
        assert_eq!(springs[0].swing, -2.5);
        assert_eq!(contacts.grounded, 0);
        assert_eq!(contacts.drive_wheels_multiplier(), 0.0);
        assert!(body.forces.is_empty());
    }

    #[test]
    fn sunk_body_is_lifted() {
        let mut body = FakeBody::on_ground(-10.0);
        let (springs, _) = run(&mut body, &settings());
        assert!(approx(body.transform.translation.vector.z, 0.0, 1e-3));
        assert_eq!(springs[0].distance, 0.0);
    }

    #[test]
    fn later_springs_trace_from_the_lifted_body() {
        let mut s = settings();
        s.springs[0].offset_min_max = (-100.0, 100.0);
        s.springs.push(s.springs[0].clone());

        let mut body = FakeBody::on_ground(-10.0);
        let mut springs = vec![
            SpringState::new(Vec3::new(100.0, 80.0, 0.0)),
            SpringState::new(Vec3::new(-100.0, 80.0, 0.0)),
        ];
        let base = body.transform();
        let contacts = update_suspension(&s, &mut springs, &mut body, &base, 980.0, 0.016);

        // lifted once by the first spring, the second sees the new height
        assert!(approx(body.transform.translation.vector.z, 0.0, 1e-3));
        assert_eq!(contacts.grounded, 2);
        assert!(approx(springs[1].trace_start.z, 0.0, 1e-3));
        assert_eq!(springs[1].distance, 0.0);
        // offset measured against the shifted wheel base: -(0 - 35)
        assert!(approx(springs[1].wheel_offset, 35.0, 1e-3));
        assert!(approx(springs[0].wheel_offset, 35.0, 1e-3));
    }

    #[test]
    fn off_axis_sphere_contact_measures_along_up() {
        let mut s = settings();
        s.trace_thickness = 15.0;
        let mut body = FakeBody::on_ground(50.0);
        body.contact_offset = Vec3::new(30.0, 0.0, 0.0);
        let (springs, _) = run(&mut body, &s);
        assert!(approx(springs[0].distance, 50.0, 1e-3));
    }

    #[test]
    fn sphere_trace_measures_to_impact() {
        let mut s = settings();
        s.trace_thickness = 15.0;
        let mut body = FakeBody::on_ground(50.0);
        let (springs, _) = run(&mut body, &s);
        assert!(springs[0].hit);
        assert!(approx(springs[0].distance, 50.0, 1e-3));
    }

    #[test]
    fn damping_opposes_approach_speed() {
        let mut body = FakeBody::on_ground(50.0);
        body.linear_velocity = Vec3::new(0.0, 0.0, -100.0);
        let (springs, _) = run(&mut body, &settings());
        // 294000 + 100 × 100
        assert!(approx(springs[0].force.z, 304_000.0, 1.0));
    }

    #[test]
    fn no_drive_wheels_gives_zero_multiplier() {
        let contacts = WheelContacts::default();
        assert_eq!(contacts.drive_wheels_multiplier(), 0.0);
        assert_eq!(contacts.total_wheels_multiplier(), 0.0);
    }
}
