use std::cell::Cell;

use serde::{Deserialize, Serialize};

use crate::error::TimelineError;

/// Playback state of a Scene
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// No play-through in progress
    #[default]
    Idle,
    /// A play-through is running
    Playing,
    /// The current step's handles are paused
    Paused,
}

impl PlaybackState {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Playing => "playing",
            Self::Paused => "paused",
        }
    }

    /// Check if there is a play-through to pause or resume
    #[inline]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Options for [`crate::Scene::play`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayOptions {
    /// Keep the final styles after a successful play-through. When false the
    /// target's inline style is restored to the Scene's baseline.
    #[serde(default = "default_commit")]
    pub commit: bool,
}

fn default_commit() -> bool {
    true
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self { commit: true }
    }
}

impl PlayOptions {
    /// Play and restore the baseline afterwards.
    pub fn preview() -> Self {
        Self { commit: false }
    }
}

/// Play-through counter shared by every Scene animating one target.
///
/// Opening the gate supersedes whatever play-through held it before.
#[derive(Debug, Default)]
pub struct PlayGate {
    generation: Cell<u64>,
}

impl PlayGate {
    /// Start a new play-through and return its generation.
    pub fn open(&self) -> u64 {
        let next = self.generation.get().wrapping_add(1);
        self.generation.set(next);
        next
    }

    #[inline]
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.get() == generation
    }
}

/// A running play-through's claim on its target while it plays step `step`.
#[derive(Debug, Clone, Copy)]
pub struct PlayTicket<'a> {
    gate: &'a PlayGate,
    generation: u64,
    step: usize,
}

impl<'a> PlayTicket<'a> {
    pub fn new(gate: &'a PlayGate, generation: u64, step: usize) -> Self {
        Self {
            gate,
            generation,
            step,
        }
    }

    #[inline]
    pub fn step(&self) -> usize {
        self.step
    }

    /// `Err(Superseded)` once another play-through opened the gate.
    pub fn check(&self) -> Result<(), TimelineError> {
        if self.gate.is_current(self.generation) {
            Ok(())
        } else {
            Err(TimelineError::Superseded { step: self.step })
        }
    }
}
