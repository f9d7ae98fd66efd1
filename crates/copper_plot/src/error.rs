//! Plotting error types

use thiserror::Error;

/// Errors raised while loading board data.
///
/// Plotting itself never fails: malformed geometry is skipped and sizes are clamped.
#[derive(Error, Debug)]
pub enum PlotError {
    /// Layer name not in the layer table
    #[error("Unknown layer name: {0}")]
    UnknownLayer(String),

    /// Board data that violates the board model
    #[error("Malformed board: {0}")]
    MalformedBoard(String),
}

/// Result type for plotting setup operations
pub type Result<T> = std::result::Result<T, PlotError>;
