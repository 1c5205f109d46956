/// Convenience result type used across nightwork.
pub type NightworkResult<T> = Result<T, NightworkError>;

/// Top-level error taxonomy used by engine APIs.
///
/// None of these are fatal to playback: the session degrades the affected modality and keeps
/// ticking. They surface at construction boundaries (config loading, backend activation, export).
#[derive(thiserror::Error, Debug)]
pub enum NightworkError {
    /// Invalid user-provided configuration or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// Audio backend could not be created or activated.
    #[error("audio error: {0}")]
    Audio(String),

    /// Narration capability failed to speak or cancel.
    #[error("narration error: {0}")]
    Narration(String),

    /// Rasterization or frame export failed.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NightworkError {
    /// Build a [`NightworkError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`NightworkError::Audio`] value.
    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }

    /// Build a [`NightworkError::Narration`] value.
    pub fn narration(msg: impl Into<String>) -> Self {
        Self::Narration(msg.into())
    }

    /// Build a [`NightworkError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`NightworkError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
