//! Offscreen MANO hand rendering and latent-manifold visualization
//!
//! This crate inspects a generative hand-pose model by sampling a 2-D grid of
//! latent codes, decoding each code to MANO pose parameters, rendering every
//! posed hand off-screen on the GPU, and tiling the renders into one composite
//! "manifold" image.
//!
//! The two heavy collaborators are deliberately external:
//! - [`PoseDecoder`] maps latent codes to joint parameters (a trained network)
//! - [`HandModel`] maps shape and pose parameters to mesh vertices (MANO)
//!
//! Rendering is headless: [`HandRenderer`] owns a wgpu device without any
//! surface and reads each frame back into an [`image::RgbImage`].

pub mod annotate;
pub mod error;
pub mod framing;
pub mod manifold;
pub mod model;
pub mod renderer;

pub use error::{CollaboratorError, RenderError, RenderResult};
pub use manifold::{LatentGrid, ManifoldConfig};
pub use model::{HandModel, PoseDecoder};
pub use renderer::{HandRenderer, RendererConfig};
