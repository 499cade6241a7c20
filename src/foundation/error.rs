use crate::data::table::{MissingColumn, missing_columns_message};

/// Convenience result type used across barrace.
pub type RaceResult<T> = Result<T, RaceError>;

/// Top-level error taxonomy used by race APIs.
#[derive(thiserror::Error, Debug)]
pub enum RaceError {
    /// Invalid user-provided configuration or input data.
    #[error("validation error: {0}")]
    Validation(String),

    /// The input table lacks one or more configured columns.
    #[error("{}", missing_columns_message(.0))]
    MissingColumns(Vec<MissingColumn>),

    /// Interpolation needs at least two distinct time points.
    #[error("cannot animate between fewer than two observations (got {observations})")]
    InsufficientData {
        /// Number of distinct time points found in the series.
        observations: usize,
    },

    /// Errors while rasterizing the scene mirror.
    #[error("render error: {0}")]
    Render(String),

    /// Errors while capturing or finalizing the video stream.
    #[error("capture error: {0}")]
    Capture(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RaceError {
    /// Build a [`RaceError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`RaceError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`RaceError::Capture`] value.
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    /// Build a [`RaceError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` when the failure came from user input rather than the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::MissingColumns(_) | Self::InsufficientData { .. }
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
