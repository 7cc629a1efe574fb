//! Keyframe synthesis.
//!
//! Each command is resolved against everything that ran before it:
//!
//! 1. fold the prior step metas into a [`StateMap`];
//! 2. pick a continuity seed per command: the last known value of its
//!    (property, template) pair, or the target's live value when the pair was
//!    never animated;
//! 3. prepend the seed to the declared values;
//! 4. render every value against a working copy of the map, so composite
//!    properties keep the contributions of their other templates;
//! 5. attach the keyframes to the command.
//!
//! The working copy carries across the commands of one step.

use std::cell::{Cell, RefCell};

use hashbrown::HashMap;

use crate::command::{Keyframe, ResolvedCommand};
use crate::platform::StyleInspector;
use crate::property::PropertyId;
use crate::state::StateMap;
use crate::step_meta::{ExecutionMode, StepMeta};
use crate::template::Template;
use crate::timing::TimingOverrides;

/// A step meta with keyframes computed for every command.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedStep {
    pub mode: ExecutionMode,
    pub commands: Vec<ResolvedCommand>,
    pub timing: TimingOverrides,
}

/// Memoized live-value reads, keyed by (property, template).
///
/// Shared by a Scene and every Scene derived from it, so re-resolving a
/// history never reads the target twice for the same pair and a built Scene
/// always replays the same keyframes.
#[derive(Debug, Default)]
pub struct SeedCache {
    seeds: RefCell<HashMap<(PropertyId, Template), String>>,
    reads: Cell<usize>,
}

impl SeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed for a pair never seen in the history.
    pub fn seed<S: StyleInspector + ?Sized>(
        &self,
        inspector: &S,
        property: &PropertyId,
        template: &Template,
    ) -> String {
        let key = (property.clone(), template.clone());
        if let Some(value) = self.seeds.borrow().get(&key) {
            return value.clone();
        }
        let live = inspector.current_value(property);
        self.reads.set(self.reads.get() + 1);
        let value = template.extract(&live);
        log::trace!("seeded {property} / {template} from live value '{live}' -> '{value}'");
        self.seeds.borrow_mut().insert(key, value.clone());
        value
    }

    /// Number of live reads performed so far.
    #[inline]
    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.seeds.borrow().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolve `meta` against `prior` (timeline order). `live_seed` is called for
/// pairs absent from the folded state.
pub fn synthesize<'a, I, F>(
    prior: I,
    meta: &StepMeta,
    separator: &str,
    mut live_seed: F,
) -> ResolvedStep
where
    I: IntoIterator<Item = &'a StepMeta>,
    F: FnMut(&PropertyId, &Template) -> String,
{
    let mut working = StateMap::fold(prior);
    let mut commands = Vec::with_capacity(meta.commands().len());

    for descriptor in meta.commands() {
        let property = descriptor.property();
        let template = descriptor.template();
        let seed = match working.get(property, template) {
            Some(value) => value.to_string(),
            None => live_seed(property, template),
        };

        let mut seeded_values = Vec::with_capacity(descriptor.values().len() + 1);
        seeded_values.push(seed);
        seeded_values.extend(descriptor.values().iter().cloned());

        let keyframes = seeded_values
            .iter()
            .map(|value| {
                working.set(property, template, value);
                Keyframe {
                    property: property.clone(),
                    value: working.render(property, separator),
                }
            })
            .collect();

        commands.push(ResolvedCommand {
            descriptor: descriptor.clone(),
            seeded_values,
            keyframes,
        });
    }

    ResolvedStep {
        mode: meta.mode(),
        commands,
        timing: meta.timing().clone(),
    }
}
