//! Timing configuration passed to the platform animator.
//!
//! Resolution order for a single command (later wins):
//! config defaults < step overrides < command overrides < Init zero-duration < forced fill.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TimelineError;

/// Named easing curves. Curve evaluation belongs to the platform animator.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    Ease,
    #[default]
    EaseIn,
    EaseOut,
    EaseInOut,
    StepStart,
    StepEnd,
}

impl Easing {
    /// CSS keyword for this curve.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Ease => "ease",
            Self::EaseIn => "ease-in",
            Self::EaseOut => "ease-out",
            Self::EaseInOut => "ease-in-out",
            Self::StepStart => "step-start",
            Self::StepEnd => "step-end",
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How an animation's effect applies outside its active interval.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fill {
    #[default]
    None,
    Forwards,
    Backwards,
    Both,
}

/// Fully resolved timing for one animation. Times are in milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectTiming {
    pub delay: f64,
    pub duration: f64,
    pub iterations: f64,
    pub easing: Easing,
    pub fill: Fill,
}

impl Default for EffectTiming {
    fn default() -> Self {
        Self {
            delay: 0.0,
            duration: 300.0,
            iterations: 1.0,
            easing: Easing::EaseIn,
            fill: Fill::None,
        }
    }
}

impl EffectTiming {
    /// Total active time including the start delay.
    #[inline]
    pub fn end_time(&self) -> f64 {
        self.delay + self.duration * self.iterations
    }

    /// Committing styles on finish only works when the final state is retained,
    /// so every animation the engine starts carries `fill: both`.
    #[inline]
    pub fn retained(mut self) -> Self {
        self.fill = Fill::Both;
        self
    }
}

/// Partial timing; unset fields fall through to the next layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<Easing>,
}

impl TimingOverrides {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides used for Init steps: applied instantly, exactly once.
    #[inline]
    pub fn instant() -> Self {
        Self {
            delay: Some(0.0),
            duration: Some(0.0),
            iterations: Some(1.0),
            ..Self::default()
        }
    }

    #[inline]
    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = Some(delay);
        self
    }

    #[inline]
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    #[inline]
    pub fn with_iterations(mut self, iterations: f64) -> Self {
        self.iterations = Some(iterations);
        self
    }

    #[inline]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.delay.is_none()
            && self.duration.is_none()
            && self.iterations.is_none()
            && self.easing.is_none()
    }

    /// Layer these overrides on top of `base`.
    pub fn apply_to(&self, base: &EffectTiming) -> EffectTiming {
        EffectTiming {
            delay: self.delay.unwrap_or(base.delay),
            duration: self.duration.unwrap_or(base.duration),
            iterations: self.iterations.unwrap_or(base.iterations),
            easing: self.easing.unwrap_or(base.easing),
            fill: base.fill,
        }
    }

    /// Reject negative or non-finite times and non-positive iteration counts.
    pub fn validate(&self) -> Result<(), TimelineError> {
        if let Some(delay) = self.delay {
            if !delay.is_finite() || delay < 0.0 {
                return Err(TimelineError::InvalidTiming {
                    field: "delay",
                    value: delay,
                });
            }
        }
        if let Some(duration) = self.duration {
            if !duration.is_finite() || duration < 0.0 {
                return Err(TimelineError::InvalidTiming {
                    field: "duration",
                    value: duration,
                });
            }
        }
        if let Some(iterations) = self.iterations {
            // Infinite iterations are legal for the platform, NaN and <= 0 are not.
            if iterations.is_nan() || iterations <= 0.0 {
                return Err(TimelineError::InvalidTiming {
                    field: "iterations",
                    value: iterations,
                });
            }
        }
        Ok(())
    }
}
