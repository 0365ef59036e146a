/// Structural problems with a gradient description.
///
/// These are never recovered internally: a frame whose gradient fails to
/// parse is aborted and the error surfaces to whoever asked for the draw.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedGradientError {
    #[error("expected exactly one gradient, found {0}")]
    MultipleGradients(usize),
    #[error("unsupported gradient type '{0}'; only linear-gradient is supported")]
    UnsupportedType(String),
    #[error("gradient has no color stops")]
    NoColorStops,
    #[error("invalid color '{0}'")]
    InvalidColor(String),
    #[error("malformed gradient: {0}")]
    Syntax(String),
}

impl MalformedGradientError {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax(message.into())
    }
}
