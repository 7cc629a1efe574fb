//! Vizij Timeline Core (engine-agnostic)
//!
//! Declarative, replayable animation timelines for a single target. Commands
//! describe property animations through value templates; the keyframe
//! synthesizer resolves every command against the full prior history so each
//! animation starts where the previous one left off; steps run commands alone,
//! in sequence or concurrently; a Scene collects steps immutably and plays them
//! on a host-provided [`Target`].

pub mod command;
pub mod commands;
pub mod config;
pub mod error;
pub mod history;
pub mod ids;
pub mod platform;
pub mod playback;
pub mod property;
pub mod scene;
pub mod state;
pub mod step;
pub mod step_meta;
pub mod stored_timeline;
pub mod synth;
pub mod template;
pub mod timing;

// Re-exports for consumers (hosts)
pub use command::{CommandDescriptor, IntoValues, Keyframe, ResolvedCommand};
pub use config::Config;
pub use error::{AnimationFailure, TimelineError};
pub use history::History;
pub use ids::{HandleId, SceneId};
pub use platform::{AnimationHandle, Animator, HandleEvent, InlineStyle, StyleInspector, Target};
pub use playback::{PlayGate, PlayOptions, PlayTicket, PlaybackState};
pub use property::{kebabize, PropertyId};
pub use scene::{create_scene, Scene};
pub use state::StateMap;
pub use step::Step;
pub use step_meta::{ExecutionMode, StepMeta};
pub use stored_timeline::parse_stored_timeline_json;
pub use synth::{synthesize, ResolvedStep, SeedCache};
pub use template::{Template, MARKER};
pub use timing::{Easing, EffectTiming, Fill, TimingOverrides};

/// Result alias for fallible timeline operations.
pub type Result<T> = core::result::Result<T, TimelineError>;
