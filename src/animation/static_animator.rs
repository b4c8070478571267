// ==============================================================================
// animation/static_animator.rs - STATIC MESH VEHICLES
// ------------------------------------------------------------------------------
// Static vehicles have no skeleton: each wheel is its own mesh attached at the
// spring's socket, and the body is a child visual mesh. Allocation records each
// wheel mesh's rest transform; every frame rebuilds the wheel transforms from
// it and rotates the visual mesh by (roll, tilt).
// ==============================================================================

use super::{AnimationFrame, VehicleAnimator, WheelAnimationInfo, WheelSide};
use crate::error::{InitError, InitResult};
use crate::host::WheelMeshRig;
use crate::math::{Quat, Transform, Vec3, euler_degrees, from_euler_degrees};
use crate::settings::SuspensionSettings;
use nalgebra::Translation3;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq)]
pub struct StaticPose {
    pub body_rotation: Quat,
    /// (socket, relative transform), spring order.
    pub wheels: Vec<(String, Transform)>,
}

#[derive(Debug, Clone)]
pub struct StaticAnimator {
    animator: VehicleAnimator,
    allocated: bool,
}

impl StaticAnimator {
    pub fn new(animator: VehicleAnimator) -> Self {
        Self {
            animator,
            allocated: false,
        }
    }

    pub fn animator(&self) -> &VehicleAnimator {
        &self.animator
    }

    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// Binds one registry entry per spring to the wheel mesh at its socket.
    /// The configured side list must have one entry per spring.
    pub fn allocate(&mut self, suspension: &SuspensionSettings, rig: &dyn WheelMeshRig) -> InitResult {
        self.allocated = false;

        let sides = self.animator.settings().wheels.sides.clone();
        if sides.len() != suspension.springs.len() {
            let err = InitError::WheelCountMismatch {
                wheels: sides.len(),
                springs: suspension.springs.len(),
            };
            error!(%err, "static animator allocation failed");
            return Err(err);
        }

        let mut wheels = Vec::with_capacity(sides.len());
        for (spring, side) in suspension.springs.iter().zip(sides) {
            let Some(initial) = rig.wheel_relative_transform(&spring.attachment) else {
                let err = InitError::MissingWheelMesh(spring.attachment.clone());
                error!(%err, "static animator allocation failed");
                return Err(err);
            };
            wheels.push(WheelAnimationInfo {
                side,
                is_steering: spring.steering,
                socket: Some(spring.attachment.clone()),
                initial_relative: initial,
                ..Default::default()
            });
        }

        info!(wheels = wheels.len(), "static animator allocated");
        *self.animator.wheels_mut() = wheels;
        self.allocated = true;
        Ok(())
    }

    /// Advances the animation and writes the pose to `rig`. Does nothing until
    /// allocation succeeded or when the wheel count no longer matches.
    pub fn update(&mut self, frame: &AnimationFrame, dt: f32, rig: &mut dyn WheelMeshRig) {
        if !self.allocated || frame.wheels.len() != self.animator.wheels().len() {
            return;
        }
        self.animator.update_wheels(frame, dt);
        self.animator.update_body(frame, dt);
        self.apply(rig);
    }

    pub fn pose(&self) -> StaticPose {
        let direction = self.animator.direction();
        let wheels = self
            .animator
            .wheels()
            .iter()
            .filter_map(|wheel| {
                let socket = wheel.socket.clone()?;
                Some((socket, wheel_transform(wheel, direction)))
            })
            .collect();

        StaticPose {
            body_rotation: from_euler_degrees(self.animator.roll(), self.animator.tilt(), 0.0),
            wheels,
        }
    }

    pub fn apply(&self, rig: &mut dyn WheelMeshRig) {
        let pose = self.pose();
        rig.set_visual_relative_rotation(pose.body_rotation);
        for (socket, transform) in pose.wheels {
            rig.set_wheel_relative_transform(&socket, transform);
        }
    }
}

fn wheel_transform(wheel: &WheelAnimationInfo, direction: f32) -> Transform {
    let (_, _, rest_yaw) = euler_degrees(&wheel.initial_relative.rotation);
    let spin = if wheel.side == WheelSide::Right { -wheel.rotation } else { wheel.rotation };
    let yaw = if wheel.is_steering { rest_yaw + direction } else { rest_yaw };

    let rotation = from_euler_degrees(wheel.swing, 0.0, 0.0) * from_euler_degrees(0.0, spin, yaw);
    let location = wheel.initial_relative.translation.vector + Vec3::new(0.0, 0.0, wheel.offset);
    Transform::from_parts(Translation3::from(location), rotation)
}
