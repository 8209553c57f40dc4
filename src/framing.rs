//! Clip-space framing for hand meshes
//!
//! The render pipeline carries no camera or projection matrix: vertex
//! positions are interpreted directly as clip-space coordinates. Framing is
//! therefore a pure data transform applied to the mesh before upload, kept
//! separate from the renderer so it can be tested without a GPU.

use glam::Vec3;

/// Scale bringing MANO's metric coordinates up to clip-space extents.
pub const FRAMING_SCALE: f32 = 10.0;

/// Translation centering the hand in the camera window.
pub const FRAMING_OFFSET: Vec3 = Vec3::new(-0.15, 0.0, 0.0);

/// Scale and translate mesh positions into the fixed clip-space window.
pub fn frame_vertices(vertices: &[Vec3]) -> Vec<Vec3> {
    vertices
        .iter()
        .map(|v| *v * FRAMING_SCALE + FRAMING_OFFSET)
        .collect()
}
