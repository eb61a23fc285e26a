//! Slot resolution and prompt rendering.
//!
//! A [`PromptTemplate`] pairs a question string containing `{slot}` tokens
//! with per-slot directives:
//!
//! - `"lookup:<path>"`: dotted path into the ontology's `properties`
//!   collection, e.g. `lookup:properties.{property}.i18n.name`
//! - `"morph:<domain>.<key>.<field>"`: grammatical form from the morphology
//!   table, e.g. `morph:order.{order}.adverb`
//! - an object: static map from the slot's raw value to a display string
//! - any other string: plain passthrough
//!
//! Resolution runs in two passes: raw slot values first, then directive
//! overrides. A directive that cannot be resolved keeps the pass-one value.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::ontology::Ontology;
use crate::slots::{format_number, SlotValues};

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("token regex is valid"));

/// How a prompt slot is turned into display text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawDirective", into = "RawDirective")]
pub enum SlotDirective {
    Passthrough(String),
    Lookup(String),
    Morph(String),
    Map(BTreeMap<String, String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawDirective {
    Text(String),
    Map(BTreeMap<String, String>),
}

impl From<RawDirective> for SlotDirective {
    fn from(raw: RawDirective) -> Self {
        match raw {
            RawDirective::Map(map) => SlotDirective::Map(map),
            RawDirective::Text(text) => {
                if let Some(path) = text.strip_prefix("lookup:") {
                    SlotDirective::Lookup(path.to_string())
                } else if let Some(path) = text.strip_prefix("morph:") {
                    SlotDirective::Morph(path.to_string())
                } else {
                    SlotDirective::Passthrough(text)
                }
            }
        }
    }
}

impl From<SlotDirective> for RawDirective {
    fn from(directive: SlotDirective) -> Self {
        match directive {
            SlotDirective::Passthrough(text) => RawDirective::Text(text),
            SlotDirective::Lookup(path) => RawDirective::Text(format!("lookup:{path}")),
            SlotDirective::Morph(path) => RawDirective::Text(format!("morph:{path}")),
            SlotDirective::Map(map) => RawDirective::Map(map),
        }
    }
}

/// A question (or explanation) string plus its slot directives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub question: String,
    #[serde(default)]
    pub slots: BTreeMap<String, SlotDirective>,
}

/// Replace every `{name}` token found in `values`; unknown tokens are kept
/// verbatim.
pub fn interpolate(template: &str, values: &BTreeMap<String, String>) -> String {
    TOKEN
        .replace_all(template, |caps: &Captures<'_>| {
            values
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Run both resolution passes and return the display value of every slot.
pub fn resolve_slots(
    slots: &SlotValues,
    prompt: &PromptTemplate,
    ontology: &Ontology,
) -> BTreeMap<String, String> {
    let mut resolved: BTreeMap<String, String> = slots
        .iter()
        .map(|(name, value)| (name.clone(), value.to_string()))
        .collect();

    let mut overrides = BTreeMap::new();
    for (name, directive) in &prompt.slots {
        let value = match directive {
            SlotDirective::Passthrough(_) => None,
            SlotDirective::Lookup(path) => lookup(&interpolate(path, &resolved), ontology),
            SlotDirective::Morph(path) => morph(&interpolate(path, &resolved), ontology),
            SlotDirective::Map(map) => slots
                .get(name)
                .and_then(|raw| map.get(&raw.to_string()))
                .cloned(),
        };
        match value {
            Some(v) => {
                overrides.insert(name.clone(), v);
            }
            None => tracing::trace!(slot = %name, "directive unresolved, keeping raw value"),
        }
    }
    resolved.extend(overrides);
    resolved
}

/// Resolve slots and substitute them into the template's question string.
pub fn render_prompt(slots: &SlotValues, prompt: &PromptTemplate, ontology: &Ontology) -> String {
    let resolved = resolve_slots(slots, prompt, ontology);
    interpolate(&prompt.question, &resolved)
}

/// Only the `properties` collection is navigable; the segment after it is a
/// property id and the rest walks that property's fields.
fn lookup(path: &str, ontology: &Ontology) -> Option<String> {
    let mut segments = path.split('.');
    if segments.next()? != "properties" {
        return None;
    }
    let property = ontology.property(segments.next()?).ok()?;
    let mut node = serde_json::to_value(property).ok()?;
    for segment in segments {
        node = node.get(segment)?.clone();
    }
    match node {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => n.as_f64().map(format_number),
        _ => None,
    }
}

fn morph(path: &str, ontology: &Ontology) -> Option<String> {
    let mut segments = path.splitn(3, '.');
    let (domain, key, field) = (segments.next()?, segments.next()?, segments.next()?);
    ontology
        .i18n
        .morphology
        .get(domain)?
        .get(key)?
        .get(field)
        .cloned()
}
