use serde::Deserialize;

use crate::command::CommandDescriptor;
use crate::error::TimelineError;
use crate::property::PropertyId;
use crate::step_meta::{ExecutionMode, StepMeta};
use crate::template::Template;
use crate::timing::TimingOverrides;

/// Public API: parse a stored timeline document into step metas, in order.
///
/// Accepted shapes:
/// - a bare array of steps, or `{ "name"?: string, "steps": [...] }`;
/// - a step is `{ "mode": string, "commands": [...], "timing"?: {...} }`
///   (`executionMode` / `timingOverrides` are accepted as aliases);
/// - a command is `{ "property", "template"?, "values", "timing"? }` where
///   `values` is a single string/number/bool or a list of them.
///
/// Notes:
/// - Unknown mode names fall back to `simple` with a warning.
/// - The template defaults to the identity template `$`.
/// - Every step goes through [`StepMeta::new`], so the builder's validation applies.
pub fn parse_stored_timeline_json(s: &str) -> Result<Vec<StepMeta>, TimelineError> {
    let doc: StoredTimeline = serde_json::from_str(s)?;
    let (name, steps) = match doc {
        StoredTimeline::Steps(steps) => (None, steps),
        StoredTimeline::Document { name, steps } => (name, steps),
    };

    let mut metas = Vec::with_capacity(steps.len());
    for stored in steps {
        let mode = ExecutionMode::parse_lenient(&stored.mode);
        let commands = stored
            .commands
            .into_iter()
            .map(to_descriptor)
            .collect::<Result<Vec<_>, _>>()?;
        metas.push(StepMeta::new(mode, commands, stored.timing)?);
    }
    log::debug!(
        "parsed stored timeline {:?} with {} step(s)",
        name.as_deref().unwrap_or("<unnamed>"),
        metas.len()
    );
    Ok(metas)
}

fn to_descriptor(c: StoredCommand) -> Result<CommandDescriptor, TimelineError> {
    let values: Vec<String> = match c.values {
        RawValues::One(v) => vec![v.into_string()],
        RawValues::Many(vs) => vs.into_iter().map(RawValue::into_string).collect(),
    };
    CommandDescriptor::new(c.property, c.template, values)?.with_timing(c.timing)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredTimeline {
    Steps(Vec<StoredStep>),
    Document {
        #[serde(default)]
        name: Option<String>,
        steps: Vec<StoredStep>,
    },
}

#[derive(Deserialize)]
struct StoredStep {
    #[serde(alias = "executionMode")]
    mode: String,
    #[serde(default)]
    commands: Vec<StoredCommand>,
    #[serde(default, alias = "timingOverrides")]
    timing: TimingOverrides,
}

#[derive(Deserialize)]
struct StoredCommand {
    #[serde(alias = "propertyId")]
    property: PropertyId,
    #[serde(default = "Template::identity")]
    template: Template,
    values: RawValues,
    #[serde(default, alias = "timingOverrides")]
    timing: TimingOverrides,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValues {
    Many(Vec<RawValue>),
    One(RawValue),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl RawValue {
    fn into_string(self) -> String {
        match self {
            RawValue::Text(s) => s,
            RawValue::Number(n) => n.to_string(),
            RawValue::Bool(b) => b.to_string(),
        }
    }
}
