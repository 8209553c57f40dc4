//! Error types for the renderer and manifold composer

use thiserror::Error;

/// Opaque error surfaced by an external collaborator (decoder or hand model).
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Renderer and composition error type
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("no suitable GPU adapter found")]
    AdapterNotFound,
    #[error("failed to create device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),
    #[error("vertex count mismatch: renderer holds {expected} vertices, mesh has {actual}")]
    VertexCountMismatch { expected: usize, actual: usize },
    #[error("failed to map rendered pixels for readback: {0}")]
    ReadbackFailed(#[from] wgpu::BufferAsyncError),
    #[error("pixel readback was incomplete")]
    ReadbackInterrupted,
    #[error("pose decoder failed: {0}")]
    Decoder(#[source] CollaboratorError),
    #[error("hand model failed: {0}")]
    Model(#[source] CollaboratorError),
    #[error("failed to encode output image: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to write output image: {0}")]
    Io(#[from] std::io::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;
