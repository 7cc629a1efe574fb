//! Declarative, pre-resolution description of a step.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::command::CommandDescriptor;
use crate::error::TimelineError;
use crate::timing::TimingOverrides;

/// How a step runs its commands.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One command.
    Simple,
    /// Commands one after another.
    Chain,
    /// All commands at once.
    Together,
    /// Zero-duration setup applied before every other step.
    Init,
}

impl ExecutionMode {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Chain => "chain",
            Self::Together => "together",
            Self::Init => "init",
        }
    }

    /// Parse a mode name, falling back to `Simple` for anything unknown so a
    /// single bad entry does not abort a whole timeline.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            log::warn!("unknown execution mode '{s}', falling back to simple");
            Self::Simple
        })
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" | "apply" => Ok(Self::Simple),
            "chain" => Ok(Self::Chain),
            "together" => Ok(Self::Together),
            "init" => Ok(Self::Init),
            other => Err(format!("unknown execution mode '{other}'")),
        }
    }
}

/// Built through [`StepMeta::new`]; stored timelines go through
/// [`crate::stored_timeline`], which applies the same validation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StepMeta {
    mode: ExecutionMode,
    commands: Vec<CommandDescriptor>,
    #[serde(skip_serializing_if = "TimingOverrides::is_empty")]
    timing: TimingOverrides,
}

impl StepMeta {
    /// Validate and normalize a step description.
    ///
    /// A `Simple` step keeps only its first command; extra commands are dropped
    /// with a warning. A `Simple` step without commands is an error.
    pub fn new(
        mode: ExecutionMode,
        mut commands: Vec<CommandDescriptor>,
        timing: TimingOverrides,
    ) -> Result<Self, TimelineError> {
        timing.validate()?;
        if mode == ExecutionMode::Simple {
            if commands.is_empty() {
                return Err(TimelineError::EmptyStep { mode });
            }
            if commands.len() > 1 {
                log::warn!(
                    "simple step received {} commands; keeping '{}' only",
                    commands.len(),
                    commands[0].property()
                );
                commands.truncate(1);
            }
        }
        Ok(Self {
            mode,
            commands,
            timing,
        })
    }

    #[inline]
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    #[inline]
    pub fn commands(&self) -> &[CommandDescriptor] {
        &self.commands
    }

    #[inline]
    pub fn timing(&self) -> &TimingOverrides {
        &self.timing
    }

    #[inline]
    pub fn is_init(&self) -> bool {
        self.mode == ExecutionMode::Init
    }

    /// Union of two Init metas. A command for a (property, template) pair already
    /// present replaces the earlier one in place; new pairs are appended.
    pub fn merge_init(&self, other: &StepMeta) -> StepMeta {
        let mut commands = self.commands.clone();
        for incoming in &other.commands {
            let existing = commands.iter_mut().find(|c| {
                c.property() == incoming.property() && c.template() == incoming.template()
            });
            match existing {
                Some(slot) => *slot = incoming.clone(),
                None => commands.push(incoming.clone()),
            }
        }
        StepMeta {
            mode: ExecutionMode::Init,
            commands,
            timing: self.timing.clone(),
        }
    }
}
