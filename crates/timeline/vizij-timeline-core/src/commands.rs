//! Command factories for common properties.
//!
//! Values accept anything [`IntoValues`] covers: a single string or number,
//! an array, a slice or a vector.

use crate::command::{CommandDescriptor, IntoValues};
use crate::error::TimelineError;
use crate::property::PropertyId;
use crate::template::Template;

/// Animate any property through `template`.
pub fn animate(
    property: impl Into<PropertyId>,
    template: impl Into<Template>,
    values: impl IntoValues,
) -> Result<CommandDescriptor, TimelineError> {
    CommandDescriptor::new(property, template, values)
}

pub fn fade(values: impl IntoValues) -> Result<CommandDescriptor, TimelineError> {
    animate("opacity", Template::identity(), values)
}

pub fn translate(values: impl IntoValues) -> Result<CommandDescriptor, TimelineError> {
    animate("transform", "translate($)", values)
}

pub fn translate_x(values: impl IntoValues) -> Result<CommandDescriptor, TimelineError> {
    animate("transform", "translateX($)", values)
}

pub fn translate_y(values: impl IntoValues) -> Result<CommandDescriptor, TimelineError> {
    animate("transform", "translateY($)", values)
}

pub fn rotate(values: impl IntoValues) -> Result<CommandDescriptor, TimelineError> {
    animate("transform", "rotate($)", values)
}

pub fn scale(values: impl IntoValues) -> Result<CommandDescriptor, TimelineError> {
    animate("transform", "scale($)", values)
}

/// Font size in pixels; values are bare numbers.
pub fn font_size(values: impl IntoValues) -> Result<CommandDescriptor, TimelineError> {
    animate("fontSize", "$px", values)
}

pub fn background_color(values: impl IntoValues) -> Result<CommandDescriptor, TimelineError> {
    animate("backgroundColor", Template::identity(), values)
}
