//! State map: `property -> template -> last raw value`.
//!
//! Never stored on a Scene. The synthesizer rebuilds it as a local fold over the
//! step history each time it runs, so a partially updated map can never leak
//! between builder calls.

use indexmap::IndexMap;

use crate::property::PropertyId;
use crate::step_meta::StepMeta;
use crate::template::Template;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateMap {
    entries: IndexMap<PropertyId, IndexMap<Template, String>>,
}

impl StateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold step metas (in timeline order) into the map.
    pub fn fold<'a, I>(metas: I) -> Self
    where
        I: IntoIterator<Item = &'a StepMeta>,
    {
        let mut state = Self::new();
        for meta in metas {
            for command in meta.commands() {
                state.set(command.property(), command.template(), command.last_value());
            }
        }
        state
    }

    pub fn get(&self, property: &PropertyId, template: &Template) -> Option<&str> {
        self.entries
            .get(property)
            .and_then(|templates| templates.get(template))
            .map(String::as_str)
    }

    /// Record the current raw value of a template. Templates keep the position
    /// they were first seen at, even when their value is cleared.
    pub fn set(&mut self, property: &PropertyId, template: &Template, value: &str) {
        let templates = self.entries.entry(property.clone()).or_default();
        match templates.get_mut(template) {
            Some(slot) => {
                slot.clear();
                slot.push_str(value);
            }
            None => {
                templates.insert(template.clone(), value.to_string());
            }
        }
    }

    /// Templates registered for a property, in first-seen order.
    pub fn templates(&self, property: &PropertyId) -> impl Iterator<Item = (&Template, &str)> {
        self.entries
            .get(property)
            .into_iter()
            .flat_map(|templates| templates.iter().map(|(t, v)| (t, v.as_str())))
    }

    /// Literal value of a property: every template with a non-empty value,
    /// rendered and joined by `separator`.
    pub fn render(&self, property: &PropertyId, separator: &str) -> String {
        let parts: Vec<String> = self
            .templates(property)
            .filter(|(_, value)| !value.is_empty())
            .map(|(template, value)| template.render(value))
            .collect();
        parts.join(separator)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
