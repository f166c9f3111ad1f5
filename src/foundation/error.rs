/// Convenience result type used across cutframe.
pub type CutframeResult<T> = Result<T, CutframeError>;

/// Top-level error taxonomy used by engine APIs.
///
/// None of these are fatal to a preview: callers degrade to a placeholder, a skipped layer or an
/// idle controller and keep the preview interactive.
#[derive(thiserror::Error, Debug)]
pub enum CutframeError {
    /// Invalid user-provided timeline, options or geometry.
    #[error("validation error: {0}")]
    Validation(String),

    /// A media reference has no resolvable source.
    #[error("resolution miss: {0}")]
    ResolutionMiss(String),

    /// A single element or a whole frame failed to render.
    #[error("render failure: {0}")]
    RenderFailure(String),

    /// The dragged element disappeared mid-gesture.
    #[error("transform cancelled: {0}")]
    TransformCancelled(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CutframeError {
    /// Build a [`CutframeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CutframeError::ResolutionMiss`] value.
    pub fn resolution_miss(msg: impl Into<String>) -> Self {
        Self::ResolutionMiss(msg.into())
    }

    /// Build a [`CutframeError::RenderFailure`] value.
    pub fn render_failure(msg: impl Into<String>) -> Self {
        Self::RenderFailure(msg.into())
    }

    /// Build a [`CutframeError::TransformCancelled`] value.
    pub fn transform_cancelled(msg: impl Into<String>) -> Self {
        Self::TransformCancelled(msg.into())
    }

    /// Build a [`CutframeError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for CutframeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
