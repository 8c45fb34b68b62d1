//! Field-level comparison of embed payloads.

use richdiff_common::Embed;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// How a single field differs between two objects
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    /// The field holds a different value (or is new); carries the new value
    Changed(Value),
    /// The field exists on the left only
    Removed,
    /// The field is an object on the right and differs somewhere below. A new
    /// object field is nested against an empty object.
    Nested(FieldDiff),
}

/// Fields of the right-hand object that differ from the left-hand one.
/// Fields not listed are unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldDiff {
    fields: BTreeMap<String, FieldChange>,
}

impl FieldDiff {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldChange)> {
        self.fields.iter().map(|(name, change)| (name.as_str(), change))
    }

    /// The only changed field, if exactly one field changed
    pub fn single_field(&self) -> Option<(&str, &FieldChange)> {
        if self.fields.len() == 1 {
            self.iter().next()
        } else {
            None
        }
    }
}

/// Deep comparison of two JSON objects.
///
/// Objects are compared recursively, including objects that only exist on
/// the right; every other value, arrays included, is compared as a whole.
pub fn structural_diff(left: &Map<String, Value>, right: &Map<String, Value>) -> FieldDiff {
    let mut fields = BTreeMap::new();

    for (name, right_value) in right {
        let change = match left.get(name) {
            None => Some(added_value(right_value)),
            Some(left_value) => value_change(left_value, right_value),
        };
        if let Some(change) = change {
            fields.insert(name.clone(), change);
        }
    }
    for name in left.keys() {
        if !right.contains_key(name) {
            fields.insert(name.clone(), FieldChange::Removed);
        }
    }

    FieldDiff { fields }
}

fn value_change(left: &Value, right: &Value) -> Option<FieldChange> {
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => {
            let nested = structural_diff(l, r);
            (!nested.is_empty()).then_some(FieldChange::Nested(nested))
        }
        _ if left == right => None,
        _ => Some(FieldChange::Changed(right.clone())),
    }
}

fn added_value(right: &Value) -> FieldChange {
    match right {
        Value::Object(r) if !r.is_empty() => FieldChange::Nested(structural_diff(&Map::new(), r)),
        _ => FieldChange::Changed(right.clone()),
    }
}

/// Compare two embeds.
///
/// Embeds of the same kind are compared payload to payload, so the result
/// names payload fields such as `embedData`. Embeds of different kinds are
/// compared as whole tagged values.
pub fn embed_diff(left: &Embed, right: &Embed) -> FieldDiff {
    if left.tag() == right.tag() {
        match (left.payload(), right.payload()) {
            (Value::Object(l), Value::Object(r)) => structural_diff(&l, &r),
            (l, r) => single_value_diff(left.tag(), &l, &r),
        }
    } else {
        match (left.to_value(), right.to_value()) {
            (Value::Object(l), Value::Object(r)) => structural_diff(&l, &r),
            _ => FieldDiff::default(),
        }
    }
}

/// Payloads of opaque embeds need not be objects; report them under the tag
fn single_value_diff(tag: &str, left: &Value, right: &Value) -> FieldDiff {
    let mut fields = BTreeMap::new();
    if let Some(change) = value_change(left, right) {
        fields.insert(tag.to_string(), change);
    }
    FieldDiff { fields }
}
