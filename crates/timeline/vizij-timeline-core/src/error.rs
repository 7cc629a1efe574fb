//! Error types for timeline construction and playback.

use crate::step_meta::ExecutionMode;

/// Why an animation handle did not finish.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AnimationFailure {
    /// The handle was cancelled (explicitly, or by a newer play-through).
    #[error("animation was cancelled")]
    Cancelled,

    /// The platform animator aborted the animation.
    #[error("animation aborted: {reason}")]
    Aborted { reason: String },
}

/// Error type for every fallible timeline operation.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum TimelineError {
    /// A command was created without any values.
    #[error("Command for '{property}' has an empty value list")]
    EmptyValues { property: String },

    /// A step that needs at least one command received none.
    #[error("{mode} step requires at least one command")]
    EmptyStep { mode: ExecutionMode },

    /// A timing override is out of range.
    #[error("Invalid timing: {field} = {value}")]
    InvalidTiming { field: &'static str, value: f64 },

    /// An animation failed while the timeline was playing.
    #[error("Playback of '{property}' failed: {failure}")]
    Playback {
        property: String,
        #[source]
        failure: AnimationFailure,
    },

    /// A newer play-through took over the target while this one was at `step`.
    #[error("Play-through was superseded at step {step}")]
    Superseded { step: usize },

    /// A stored timeline could not be parsed.
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl TimelineError {
    /// Get error category for logging/metrics
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::EmptyValues { .. } | Self::EmptyStep { .. } | Self::InvalidTiming { .. } => {
                "validation"
            }
            Self::Playback { .. } | Self::Superseded { .. } => "playback",
            Self::Serialization { .. } => "serialization",
        }
    }

    /// True when the play-through was cancelled rather than aborted.
    #[inline]
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            Self::Playback {
                failure: AnimationFailure::Cancelled,
                ..
            } | Self::Superseded { .. }
        )
    }
}

impl From<serde_json::Error> for TimelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}
