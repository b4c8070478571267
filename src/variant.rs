// ==============================================================================
// variant.rs - MESH REPRESENTATION VARIANTS
// ------------------------------------------------------------------------------
// A vehicle is either a skeletal mesh (springs on bones, optional parent bone
// for the wheel base) or a static mesh (springs on sockets of a visual child
// mesh that the animator tilts/rolls). Picked at construction, never swapped.
// ==============================================================================

use crate::error::{InitError, InitResult};
use crate::host::{AttachmentProvider, MeshKind};
use crate::math::{Transform, Vec3};
use crate::settings::SuspensionSettings;
use tracing::{error, warn};

pub trait MeshVariant: Send {
    fn initialize(
        &mut self,
        suspension: &SuspensionSettings,
        attachments: &dyn AttachmentProvider,
    ) -> InitResult;

    /// Body-space location of every spring, in spring order. Unresolvable
    /// names log and fall back to the origin.
    fn register_attachment_points(
        &mut self,
        suspension: &SuspensionSettings,
        attachments: &dyn AttachmentProvider,
    ) -> Vec<Vec3>;

    fn wheels_base_transform(&self, body: &Transform, attachments: &dyn AttachmentProvider)
        -> Transform;
}

fn resolve_points(
    suspension: &SuspensionSettings,
    attachments: &dyn AttachmentProvider,
    what: &str,
) -> Vec<Vec3> {
    suspension
        .springs
        .iter()
        .map(|spring| match attachments.attachment_local_transform(&spring.attachment) {
            Some(t) => t.translation.vector,
            None => {
                error!(attachment = %spring.attachment, "{what} not found, spring stays at origin");
                Vec3::zeros()
            }
        })
        .collect()
}

// --------------------------------------------------
// Skeletal
// --------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct SkeletalMesh {
    parent_bone: Option<String>,
}

impl SkeletalMesh {
    pub fn parent_bone(&self) -> Option<&str> {
        self.parent_bone.as_deref()
    }
}

impl MeshVariant for SkeletalMesh {
    fn initialize(
        &mut self,
        suspension: &SuspensionSettings,
        attachments: &dyn AttachmentProvider,
    ) -> InitResult {
        if attachments.mesh_kind() != MeshKind::Skeletal {
            return Err(InitError::SkeletalMeshExpected);
        }

        self.parent_bone = match &suspension.parent_bone {
            Some(bone) if attachments.bone_world_transform(bone).is_some() => Some(bone.clone()),
            Some(bone) => {
                warn!(bone = %bone, "parent bone not found, wheels follow the body");
                None
            }
            None => None,
        };
        Ok(())
    }

    fn register_attachment_points(
        &mut self,
        suspension: &SuspensionSettings,
        attachments: &dyn AttachmentProvider,
    ) -> Vec<Vec3> {
        resolve_points(suspension, attachments, "bone")
    }

    fn wheels_base_transform(
        &self,
        body: &Transform,
        attachments: &dyn AttachmentProvider,
    ) -> Transform {
        self.parent_bone
            .as_deref()
            .and_then(|bone| attachments.bone_world_transform(bone))
            .unwrap_or(*body)
    }
}

// --------------------------------------------------
// Static
// --------------------------------------------------

#[derive(Debug, Default, Clone, Copy)]
pub struct StaticMesh;

impl MeshVariant for StaticMesh {
    fn initialize(
        &mut self,
        _suspension: &SuspensionSettings,
        attachments: &dyn AttachmentProvider,
    ) -> InitResult {
        if attachments.mesh_kind() != MeshKind::Static {
            return Err(InitError::StaticMeshExpected);
        }
        if attachments.visual_mesh_world_transform().is_none() {
            return Err(InitError::MissingVisualMesh);
        }
        Ok(())
    }

    fn register_attachment_points(
        &mut self,
        suspension: &SuspensionSettings,
        attachments: &dyn AttachmentProvider,
    ) -> Vec<Vec3> {
        resolve_points(suspension, attachments, "socket")
    }

    fn wheels_base_transform(
        &self,
        body: &Transform,
        attachments: &dyn AttachmentProvider,
    ) -> Transform {
        attachments.visual_mesh_world_transform().unwrap_or(*body)
    }
}
