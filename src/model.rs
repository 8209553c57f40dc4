//! MANO parameter space and collaborator contracts
//!
//! The decoder network and the hand model itself live outside this crate;
//! both are reached through the traits below as blocking, batch-oriented
//! calls. This module pins down the parameter dimensions and assembles full
//! pose vectors from decoded joint parameters.

use glam::Vec3;

use crate::error::CollaboratorError;

/// Number of vertices in the MANO hand mesh topology.
pub const MANO_VERTEX_COUNT: usize = 778;

/// Dimension of a latent code fed to the decoder.
pub const LATENT_DIM: usize = 2;

/// Joint parameters produced by the decoder: 15 joints, 3 axis-angle values each.
pub const POSE_DELTA_DIM: usize = 45;

/// Full pose vector: 3 global-rotation values followed by the joint parameters.
pub const POSE_DIM: usize = POSE_DELTA_DIM + 3;

/// Shape (beta) parameters accepted by the hand model.
pub const SHAPE_DIM: usize = 10;

/// Global rotation about the x axis applied to every sample so the palm faces
/// the camera.
pub const GLOBAL_ROTATION_X: f32 = std::f32::consts::FRAC_PI_4;

pub type Latent = [f32; LATENT_DIM];
pub type PoseDelta = [f32; POSE_DELTA_DIM];
pub type Pose = [f32; POSE_DIM];
pub type Shape = [f32; SHAPE_DIM];

/// A trained network mapping latent codes to joint parameters.
pub trait PoseDecoder {
    /// Decode a whole batch of latent codes in one call.
    ///
    /// Implementations must accept an arbitrary batch size; the manifold
    /// composer issues exactly one call per composition.
    fn decode(&self, latents: &[Latent]) -> Result<Vec<PoseDelta>, CollaboratorError>;
}

/// A parametric hand mesh model (MANO) mapping shape and pose parameters to
/// vertex positions over a fixed triangle topology.
pub trait HandModel {
    /// Compute per-sample vertex positions for a batch of parameter sets.
    fn vertices(&self, shapes: &[Shape], poses: &[Pose]) -> Result<Vec<Vec<Vec3>>, CollaboratorError>;

    /// The fixed triangle face list shared by every posed mesh.
    fn faces(&self) -> &[[u32; 3]];

    /// Mean pose bias added to every decoded joint-parameter vector.
    fn mean_pose(&self) -> PoseDelta {
        [0.0; POSE_DELTA_DIM]
    }
}

/// Build full pose vectors from decoded joint parameters: the fixed global
/// rotation, then each delta offset by the model's mean pose.
pub fn assemble_poses(deltas: &[PoseDelta], mean_pose: &PoseDelta) -> Vec<Pose> {
    deltas
        .iter()
        .map(|delta| {
            let mut pose = [0.0; POSE_DIM];
            pose[0] = GLOBAL_ROTATION_X;
            for (slot, (d, m)) in pose[3..].iter_mut().zip(delta.iter().zip(mean_pose.iter())) {
                *slot = d + m;
            }
            pose
        })
        .collect()
}

/// Zero shape parameters for a whole batch.
pub fn zero_shapes(batch_size: usize) -> Vec<Shape> {
    vec![[0.0; SHAPE_DIM]; batch_size]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembled_pose_starts_with_global_rotation() {
        let poses = assemble_poses(&[[0.0; POSE_DELTA_DIM]], &[0.0; POSE_DELTA_DIM]);
        assert_eq!(poses.len(), 1);
        assert_eq!(poses[0][0], GLOBAL_ROTATION_X);
        assert_eq!(poses[0][1], 0.0);
        assert_eq!(poses[0][2], 0.0);
    }

    #[test]
    fn mean_pose_bias_is_added_per_joint() {
        let mut delta = [0.0; POSE_DELTA_DIM];
        delta[0] = 1.0;
        delta[44] = -2.0;
        let mut mean = [0.0; POSE_DELTA_DIM];
        mean[0] = 0.5;
        mean[44] = 0.25;

        let poses = assemble_poses(&[delta], &mean);
        assert_eq!(poses[0][3], 1.5);
        assert_eq!(poses[0][47], -1.75);
    }

    #[test]
    fn assembly_preserves_batch_order() {
        let mut a = [0.0; POSE_DELTA_DIM];
        a[0] = 1.0;
        let mut b = [0.0; POSE_DELTA_DIM];
        b[0] = 2.0;

        let poses = assemble_poses(&[a, b], &[0.0; POSE_DELTA_DIM]);
        assert_eq!(poses[0][3], 1.0);
        assert_eq!(poses[1][3], 2.0);
    }

    #[test]
    fn zero_shapes_match_batch_size() {
        let shapes = zero_shapes(7);
        assert_eq!(shapes.len(), 7);
        assert!(shapes.iter().all(|s| s.iter().all(|v| *v == 0.0)));
    }
}
