//! Renderer error types

use thiserror::Error;

/// Errors raised while setting up or resizing the renderer.
///
/// Drawing and group operations never fail; they skip or clamp malformed input instead.
#[derive(Error, Debug)]
pub enum GalError {
    /// The rasterizer could not allocate a pixel buffer of the requested size
    #[error("Failed to allocate a {width}x{height} pixel buffer")]
    BufferAllocation { width: u32, height: u32 },

    /// A frame or group recording still holds the surface built for the current size
    #[error("Cannot resize to {width}x{height} while the surface is held by a {holder}")]
    SurfaceHeld { width: u32, height: u32, holder: &'static str },
}

/// Result type for renderer setup operations
pub type Result<T> = std::result::Result<T, GalError>;
