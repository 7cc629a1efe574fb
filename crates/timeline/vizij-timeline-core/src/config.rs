//! Core configuration for vizij-timeline-core.

use serde::{Deserialize, Serialize};

use crate::timing::EffectTiming;

/// Scene-wide settings. Keep this minimal; expand as needed without breaking API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Timing used for any field no step or command overrides.
    #[serde(default)]
    pub default_timing: EffectTiming,

    /// Text placed between template contributions of a composite property.
    #[serde(default = "default_separator")]
    pub composite_separator: String,
}

fn default_separator() -> String {
    " ".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_timing: EffectTiming::default(),
            composite_separator: default_separator(),
        }
    }
}
