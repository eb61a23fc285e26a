//! Slot values passed between pipeline stages.
//!
//! A generator fills a [`SlotValues`] bag for one generation call; solvers,
//! the prompt renderer and the distractor engine read from it. Slots are
//! never persisted.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// A single slot value: a string, a number, or a list of strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotValue {
    Number(f64),
    Text(String),
    List(Vec<String>),
}

/// Answers share the slot value shape.
pub type Answer = SlotValue;

impl SlotValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SlotValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            SlotValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            SlotValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Loose numeric coercion in the spirit of a dynamic `Number()` cast.
    ///
    /// Blank text coerces to `0`, unparseable text to `NaN`, a one-element
    /// list to its element, and any other list to `NaN`.
    pub fn to_number(&self) -> f64 {
        match self {
            SlotValue::Number(n) => *n,
            SlotValue::Text(s) => coerce_str(s),
            SlotValue::List(items) => match items.as_slice() {
                [] => 0.0,
                [only] => coerce_str(only),
                _ => f64::NAN,
            },
        }
    }

    /// Canonical serialization used for exact comparisons.
    pub fn canonical(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

fn coerce_str(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

impl fmt::Display for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotValue::Number(n) => write!(f, "{}", format_number(*n)),
            SlotValue::Text(s) => write!(f, "{s}"),
            SlotValue::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

impl From<&str> for SlotValue {
    fn from(s: &str) -> Self {
        SlotValue::Text(s.to_string())
    }
}

impl From<String> for SlotValue {
    fn from(s: String) -> Self {
        SlotValue::Text(s)
    }
}

impl From<f64> for SlotValue {
    fn from(n: f64) -> Self {
        SlotValue::Number(n)
    }
}

impl From<i32> for SlotValue {
    fn from(n: i32) -> Self {
        SlotValue::Number(f64::from(n))
    }
}

impl From<u32> for SlotValue {
    fn from(n: u32) -> Self {
        SlotValue::Number(f64::from(n))
    }
}

impl From<usize> for SlotValue {
    fn from(n: usize) -> Self {
        SlotValue::Number(n as f64)
    }
}

impl From<Vec<String>> for SlotValue {
    fn from(items: Vec<String>) -> Self {
        SlotValue::List(items)
    }
}

/// Render a number the way the question text expects: integers without a
/// trailing `.0`, everything else in shortest round-trip form.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == value.trunc() && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    format!("{value}")
}

/// Round half away from zero to `digits` decimal places.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// The name → value bag produced by one generator run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotValues(BTreeMap<String, SlotValue>);

impl SlotValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<SlotValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<SlotValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&SlotValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SlotValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge `other` into `self`, overwriting existing names.
    pub fn extend(&mut self, other: &SlotValues) {
        for (name, value) in other.iter() {
            self.0.insert(name.clone(), value.clone());
        }
    }

    /// A required text slot. Numbers are accepted and stringified.
    pub fn text(&self, stage: &str, name: &str) -> Result<String> {
        match self.0.get(name) {
            Some(SlotValue::Text(s)) => Ok(s.clone()),
            Some(SlotValue::Number(n)) => Ok(format_number(*n)),
            _ => Err(EngineError::missing_slot(stage, name)),
        }
    }

    /// A required numeric slot. Numeric text is accepted.
    pub fn number(&self, stage: &str, name: &str) -> Result<f64> {
        match self.0.get(name) {
            Some(SlotValue::Number(n)) => Ok(*n),
            Some(SlotValue::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| EngineError::missing_slot(stage, name)),
            _ => Err(EngineError::missing_slot(stage, name)),
        }
    }

    /// A required list slot.
    pub fn list(&self, stage: &str, name: &str) -> Result<&[String]> {
        match self.0.get(name) {
            Some(SlotValue::List(items)) => Ok(items),
            _ => Err(EngineError::missing_slot(stage, name)),
        }
    }
}

impl FromIterator<(String, SlotValue)> for SlotValues {
    fn from_iter<T: IntoIterator<Item = (String, SlotValue)>>(iter: T) -> Self {
        SlotValues(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_formatting_drops_integer_fraction() {
        assert_eq!(format_number(58.0), "58");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(58.44), "58.44");
        assert_eq!(format_number(0.125), "0.125");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn display_joins_lists() {
        let v = SlotValue::List(vec!["Na".into(), "Mg".into(), "Al".into()]);
        assert_eq!(v.to_string(), "Na, Mg, Al");
    }

    #[test]
    fn loose_coercion() {
        assert_eq!(SlotValue::from("  ").to_number(), 0.0);
        assert_eq!(SlotValue::from(" 2.5 ").to_number(), 2.5);
        assert!(SlotValue::from("abc").to_number().is_nan());
        assert_eq!(SlotValue::List(vec!["4".into()]).to_number(), 4.0);
        assert!(SlotValue::List(vec!["4".into(), "5".into()]).to_number().is_nan());
    }

    #[test]
    fn rounding_matches_half_up_for_positive_values() {
        assert_eq!(round_to(58.444, 2), 58.44);
        assert_eq!(round_to(0.0625, 3), 0.063);
        assert_eq!(round_to(39.99, 1), 40.0);
    }

    #[test]
    fn typed_accessors_report_missing_slots() {
        let slots = SlotValues::new().with("mass", 20.0).with("formula", "NaCl");
        assert_eq!(slots.number("amount_calc", "mass").unwrap(), 20.0);
        assert_eq!(slots.text("molar_mass", "formula").unwrap(), "NaCl");
        let err = slots.text("molar_mass", "substance_id").unwrap_err();
        assert!(matches!(err, EngineError::MissingSlotData { .. }));
        assert!(slots.list("periodic_trend_order", "elements").is_err());
    }

    #[test]
    fn untagged_serde_keeps_shapes() {
        let slots = SlotValues::new()
            .with("Z", 11u32)
            .with("element", "Na")
            .with("elements", vec!["Na".to_string(), "K".to_string()]);
        let json = serde_json::to_string(&slots).unwrap();
        let back: SlotValues = serde_json::from_str(&json).unwrap();
        assert_eq!(back, slots);
        assert_eq!(back.get("Z"), Some(&SlotValue::Number(11.0)));
    }
}
