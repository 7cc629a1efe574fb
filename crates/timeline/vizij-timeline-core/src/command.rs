//! Command descriptors and their resolved (keyframed) form.

use serde::{Deserialize, Serialize};

use crate::error::TimelineError;
use crate::property::PropertyId;
use crate::template::Template;
use crate::timing::TimingOverrides;

/// Declarative animation of one property: `values` are raw (pre-template) strings
/// played in order. Construction rejects an empty value list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCommand")]
pub struct CommandDescriptor {
    property: PropertyId,
    template: Template,
    values: Vec<String>,
    #[serde(default, skip_serializing_if = "TimingOverrides::is_empty")]
    timing: TimingOverrides,
}

impl CommandDescriptor {
    pub fn new(
        property: impl Into<PropertyId>,
        template: impl Into<Template>,
        values: impl IntoValues,
    ) -> Result<Self, TimelineError> {
        let property = property.into();
        let values = values.into_values();
        if values.is_empty() {
            return Err(TimelineError::EmptyValues {
                property: property.to_string(),
            });
        }
        Ok(Self {
            property,
            template: template.into(),
            values,
            timing: TimingOverrides::default(),
        })
    }

    /// Attach per-command timing; these prevail over step-level timing.
    pub fn with_timing(mut self, timing: TimingOverrides) -> Result<Self, TimelineError> {
        timing.validate()?;
        self.timing = timing;
        Ok(self)
    }

    #[inline]
    pub fn property(&self) -> &PropertyId {
        &self.property
    }

    #[inline]
    pub fn template(&self) -> &Template {
        &self.template
    }

    #[inline]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    #[inline]
    pub fn timing(&self) -> &TimingOverrides {
        &self.timing
    }

    /// Last declared value; the value this command leaves behind.
    #[inline]
    pub fn last_value(&self) -> &str {
        // Non-empty by construction.
        self.values.last().map(String::as_str).unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct RawCommand {
    property: PropertyId,
    #[serde(default = "Template::identity")]
    template: Template,
    values: Vec<String>,
    #[serde(default)]
    timing: TimingOverrides,
}

impl TryFrom<RawCommand> for CommandDescriptor {
    type Error = TimelineError;

    fn try_from(raw: RawCommand) -> Result<Self, Self::Error> {
        CommandDescriptor::new(raw.property, raw.template, raw.values)?.with_timing(raw.timing)
    }
}

/// One keyframe handed to the platform animator: a literal property value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyframe {
    pub property: PropertyId,
    pub value: String,
}

/// A command plus the keyframes computed for it at build time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCommand {
    pub descriptor: CommandDescriptor,
    /// Declared values with the continuity seed prepended.
    pub seeded_values: Vec<String>,
    pub keyframes: Vec<Keyframe>,
}

impl ResolvedCommand {
    #[inline]
    pub fn property(&self) -> &PropertyId {
        self.descriptor.property()
    }

    /// Raw value the command starts from.
    #[inline]
    pub fn seed(&self) -> &str {
        self.seeded_values
            .first()
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Literal values, in keyframe order.
    pub fn literal_values(&self) -> Vec<&str> {
        self.keyframes.iter().map(|k| k.value.as_str()).collect()
    }
}

/// Conversion of user input (single value or a list) into raw value strings.
pub trait IntoValues {
    fn into_values(self) -> Vec<String>;
}

macro_rules! impl_into_values_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl IntoValues for $t {
                fn into_values(self) -> Vec<String> {
                    vec![self.to_string()]
                }
            }
        )*
    };
}

impl_into_values_scalar!(&str, String, f32, f64, i32, i64, u32, u64, usize);

impl<T: ToString> IntoValues for Vec<T> {
    fn into_values(self) -> Vec<String> {
        self.iter().map(ToString::to_string).collect()
    }
}

impl<T: ToString> IntoValues for &[T] {
    fn into_values(self) -> Vec<String> {
        self.iter().map(ToString::to_string).collect()
    }
}

impl<T: ToString, const N: usize> IntoValues for [T; N] {
    fn into_values(self) -> Vec<String> {
        self.iter().map(ToString::to_string).collect()
    }
}
