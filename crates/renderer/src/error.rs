use gradient::MalformedGradientError;

/// The GPU context could not be acquired.
///
/// This is reported through the `on_context_error` callback rather than
/// returned; the renderer that hit it stays idle and never draws.
#[derive(Debug, Clone, thiserror::Error)]
#[error("GPU context unavailable: {reason}")]
pub struct ContextUnavailableError {
    reason: String,
}

impl ContextUnavailableError {
    pub(crate) fn new(err: &anyhow::Error) -> Self {
        Self {
            reason: format!("{err:#}"),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Failure of a single frame.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Gradient(#[from] MalformedGradientError),
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("failed to read back rendered frame: {0}")]
    Readback(String),
    #[error("renderer has no GPU context")]
    Idle,
}
