//! Error types for the rendering adapters.

/// Errors raised by a spatial rendering surface.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("surface unavailable: {0}")]
    Unavailable(String),
    #[error("route could not be calculated: {0}")]
    RouteFailed(String),
    #[error("provider error: {0}")]
    Provider(String),
}
