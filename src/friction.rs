// ==============================================================================
// friction.rs - LATERAL FRICTION HEURISTIC
// ------------------------------------------------------------------------------
// Only runs with full adherence (no drift, recovery finished).
//
// 1) lateral damper:
//      alpha = 1 - clamp(|lateral km/h| / threshold)
//      v.y   = lerp(v.y, -v.y, clamp(friction × alpha × grounded fraction))
// 2) total friction: under the total-friction speed, pin the lateral world
//    position to an anchor captured on the first low-speed tick. The pin
//    loosens with the post-friction forward speed. Teleports and location
//    corrections re-anchor.
// ==============================================================================

use crate::host::VehicleBody;
use crate::math::{KMH_MULTIPLIER, Vec3, clamp01, lerp};
use crate::runtime::VehiclePhysicsRuntime;
use crate::settings::PhysicsSettings;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrictionAnchor {
    pub location: Vec3,
    /// Total friction was applied on the previous tick.
    pub active: bool,
}

impl Default for FrictionAnchor {
    fn default() -> Self {
        Self {
            location: Vec3::zeros(),
            active: false,
        }
    }
}

impl FrictionAnchor {
    pub fn reanchor(&mut self, location: Vec3) {
        self.location = location;
        self.active = true;
    }

    pub fn reset(&mut self) {
        self.active = false;
    }
}

pub fn apply_friction<B: VehicleBody + ?Sized>(
    runtime: &mut VehiclePhysicsRuntime,
    anchor: &mut FrictionAnchor,
    physics: &PhysicsSettings,
    grounded_fraction: f32,
    body: &mut B,
) {
    if runtime.adherence_multiplier < 1.0 {
        return;
    }

    let velocity = &mut runtime.local_linear_velocity;
    let threshold = physics.friction_force_threshold;
    let alpha = if threshold > 0.0 {
        1.0 - clamp01((velocity.y * KMH_MULTIPLIER).abs() / threshold)
    } else {
        0.0
    };

    let bite = clamp01(physics.friction_force * alpha * grounded_fraction);
    velocity.y = lerp(velocity.y, -velocity.y, bite);

    let total_threshold = physics.total_friction_speed_threshold;
    let forward_kmh = (velocity.x * KMH_MULTIPLIER).abs();
    let apply_total = total_threshold > 0.0 && alpha > 0.0 && forward_kmh <= total_threshold;

    if apply_total {
        let transform = body.transform();
        let location = transform.translation.vector;

        if anchor.active {
            let mut local = transform.rotation.inverse() * (anchor.location - location);
            local.x = 0.0;
            local.z = 0.0;
            local.y = lerp(local.y, 0.0, clamp01(forward_kmh / total_threshold));

            let pinned = location + transform.rotation * local;
            body.set_location(pinned);
            anchor.location = pinned;
        } else {
            anchor.location = location;
        }
    }

    anchor.active = apply_total;
}
