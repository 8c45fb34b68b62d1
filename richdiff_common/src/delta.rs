//! Operations and operation sequences.
//!
//! A [`Delta`] is an ordered list of [`Op`]s. When every op is an insert the
//! delta is a full document snapshot; otherwise it is an edit script to be
//! applied to a document. Both share the JSON shape
//! `[{"insert": ...}, {"retain": n}, {"delete": n}]`.

use crate::attributes::{self, AttributeMap};
use crate::embed::Embed;
use crate::text::utf16_len;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// What an insert puts into the document
#[derive(Debug, Clone, PartialEq)]
pub enum InsertContent {
    Text(String),
    Embed(Embed),
}

impl InsertContent {
    /// Length in document units: UTF-16 code units for text, 1 for an embed
    pub fn len(&self) -> usize {
        match self {
            InsertContent::Text(text) => utf16_len(text),
            InsertContent::Embed(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            InsertContent::Text(text) => Some(text),
            InsertContent::Embed(_) => None,
        }
    }

    pub fn as_embed(&self) -> Option<&Embed> {
        match self {
            InsertContent::Embed(embed) => Some(embed),
            InsertContent::Text(_) => None,
        }
    }
}

impl From<&str> for InsertContent {
    fn from(text: &str) -> Self {
        InsertContent::Text(text.to_string())
    }
}

impl From<String> for InsertContent {
    fn from(text: String) -> Self {
        InsertContent::Text(text)
    }
}

impl From<Embed> for InsertContent {
    fn from(embed: Embed) -> Self {
        InsertContent::Embed(embed)
    }
}

/// A single step of a document or edit script
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawOp")]
pub enum Op {
    Insert {
        content: InsertContent,
        attributes: Option<AttributeMap>,
    },
    Retain {
        length: usize,
        attributes: Option<AttributeMap>,
    },
    Delete {
        length: usize,
    },
}

impl Op {
    pub fn insert(content: impl Into<InsertContent>) -> Self {
        Op::Insert {
            content: content.into(),
            attributes: None,
        }
    }

    pub fn insert_with(content: impl Into<InsertContent>, attributes: AttributeMap) -> Self {
        Op::Insert {
            content: content.into(),
            attributes: attributes::normalize(Some(attributes)),
        }
    }

    pub fn retain(length: usize) -> Self {
        Op::Retain {
            length,
            attributes: None,
        }
    }

    pub fn retain_with(length: usize, attributes: AttributeMap) -> Self {
        Op::Retain {
            length,
            attributes: attributes::normalize(Some(attributes)),
        }
    }

    pub fn delete(length: usize) -> Self {
        Op::Delete { length }
    }

    /// Length of the op in document units
    pub fn len(&self) -> usize {
        match self {
            Op::Insert { content, .. } => content.len(),
            Op::Retain { length, .. } | Op::Delete { length } => *length,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn attributes(&self) -> Option<&AttributeMap> {
        match self {
            Op::Insert { attributes, .. } | Op::Retain { attributes, .. } => attributes.as_ref(),
            Op::Delete { .. } => None,
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Op::Insert { .. })
    }

    pub fn is_retain(&self) -> bool {
        matches!(self, Op::Retain { .. })
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Op::Delete { .. })
    }

    pub fn content(&self) -> Option<&InsertContent> {
        match self {
            Op::Insert { content, .. } => Some(content),
            _ => None,
        }
    }

    pub fn embed(&self) -> Option<&Embed> {
        self.content().and_then(InsertContent::as_embed)
    }

    /// Wire name of the op kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            Op::Insert { .. } => "insert",
            Op::Retain { .. } => "retain",
            Op::Delete { .. } => "delete",
        }
    }
}

impl Serialize for Op {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let attributes = self.attributes();
        let mut map = serializer.serialize_map(Some(1 + usize::from(attributes.is_some())))?;
        match self {
            Op::Insert { content, .. } => match content {
                InsertContent::Text(text) => map.serialize_entry("insert", text)?,
                InsertContent::Embed(embed) => map.serialize_entry("insert", embed)?,
            },
            Op::Retain { length, .. } => map.serialize_entry("retain", length)?,
            Op::Delete { length } => map.serialize_entry("delete", length)?,
        }
        if let Some(attributes) = attributes {
            map.serialize_entry("attributes", attributes)?;
        }
        map.end()
    }
}

/// Wire form of an op before validation
#[derive(Deserialize)]
struct RawOp {
    insert: Option<Value>,
    retain: Option<u64>,
    delete: Option<u64>,
    attributes: Option<AttributeMap>,
}

impl TryFrom<RawOp> for Op {
    type Error = String;

    fn try_from(raw: RawOp) -> Result<Self, Self::Error> {
        let attributes = attributes::normalize(raw.attributes);
        match (raw.insert, raw.retain, raw.delete) {
            (Some(insert), None, None) => {
                let content = match insert {
                    Value::String(text) => InsertContent::Text(text),
                    Value::Object(_) => InsertContent::Embed(
                        serde_json::from_value(insert).map_err(|e| e.to_string())?,
                    ),
                    other => {
                        return Err(format!(
                            "insert must be a string or an embed object, got {other}"
                        ))
                    }
                };
                Ok(Op::Insert {
                    content,
                    attributes,
                })
            }
            (None, Some(retain), None) => Ok(Op::Retain {
                length: positive_length("retain", retain)?,
                attributes,
            }),
            (None, None, Some(delete)) => {
                if attributes.is_some() {
                    return Err("delete cannot carry attributes".to_string());
                }
                Ok(Op::Delete {
                    length: positive_length("delete", delete)?,
                })
            }
            _ => Err("op must have exactly one of insert, retain or delete".to_string()),
        }
    }
}

fn positive_length(kind: &str, length: u64) -> Result<usize, String> {
    if length == 0 {
        return Err(format!("{kind} length must be positive"));
    }
    usize::try_from(length).map_err(|_| format!("{kind} length {length} is too large"))
}

/// An ordered sequence of ops
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Delta {
    ops: Vec<Op>,
}

/// A full snapshot: a delta made of inserts only
pub type Document = Delta;

/// A transformation to apply to a document
pub type EditScript = Delta;

impl Delta {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Wrap ops as given, without normalizing them
    pub fn from_ops(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<Op> {
        self.ops
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Op> {
        self.ops.iter()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Sum of op lengths in document units
    pub fn length(&self) -> usize {
        self.ops.iter().map(Op::len).sum()
    }

    /// True when every op is an insert
    pub fn is_document(&self) -> bool {
        self.ops.iter().all(Op::is_insert)
    }

    pub fn insert(&mut self, content: impl Into<InsertContent>) -> &mut Self {
        self.push(Op::insert(content))
    }

    pub fn retain(&mut self, length: usize) -> &mut Self {
        self.push(Op::retain(length))
    }

    pub fn delete(&mut self, length: usize) -> &mut Self {
        self.push(Op::delete(length))
    }

    /// Append `op`, merging it into the last op where possible.
    ///
    /// Consecutive deletes merge, as do retains or text inserts with equal
    /// attributes. An insert following a delete is placed before it so that
    /// equivalent scripts share one canonical form. Empty ops are dropped.
    pub fn push(&mut self, op: Op) -> &mut Self {
        if op.is_empty() {
            return self;
        }

        let mut index = self.ops.len();
        if let Some(Op::Delete { length: last }) = self.ops.last_mut() {
            if let Op::Delete { length } = op {
                *last += length;
                return self;
            }
            if op.is_insert() {
                index -= 1;
                if index == 0 {
                    self.ops.insert(0, op);
                    return self;
                }
            }
        }

        if index > 0 {
            if let Some(merged) = merge(&self.ops[index - 1], &op) {
                self.ops[index - 1] = merged;
                return self;
            }
        }

        if index == self.ops.len() {
            self.ops.push(op);
        } else {
            self.ops.insert(index, op);
        }
        self
    }

    /// Drop a trailing retain that carries no attributes
    pub fn chop(&mut self) -> &mut Self {
        if let Some(Op::Retain {
            attributes: None, ..
        }) = self.ops.last()
        {
            self.ops.pop();
        }
        self
    }
}

/// Combine two adjacent ops into one if they are mergeable
fn merge(prev: &Op, next: &Op) -> Option<Op> {
    match (prev, next) {
        (
            Op::Retain {
                length: a,
                attributes: attrs_a,
            },
            Op::Retain {
                length: b,
                attributes: attrs_b,
            },
        ) if attrs_a == attrs_b => Some(Op::Retain {
            length: a + b,
            attributes: attrs_a.clone(),
        }),
        (
            Op::Insert {
                content: InsertContent::Text(a),
                attributes: attrs_a,
            },
            Op::Insert {
                content: InsertContent::Text(b),
                attributes: attrs_b,
            },
        ) if attrs_a == attrs_b => Some(Op::Insert {
            content: InsertContent::Text(format!("{a}{b}")),
            attributes: attrs_a.clone(),
        }),
        (Op::Delete { length: a }, Op::Delete { length: b }) => Some(Op::Delete { length: a + b }),
        _ => None,
    }
}

impl From<Vec<Op>> for Delta {
    fn from(ops: Vec<Op>) -> Self {
        Self::from_ops(ops)
    }
}

impl FromIterator<Op> for Delta {
    /// Collect ops through [`Delta::push`], normalizing as they arrive
    fn from_iter<I: IntoIterator<Item = Op>>(iter: I) -> Self {
        let mut delta = Delta::new();
        for op in iter {
            delta.push(op);
        }
        delta
    }
}

impl<'a> IntoIterator for &'a Delta {
    type Item = &'a Op;
    type IntoIter = std::slice::Iter<'a, Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

impl<'de> Deserialize<'de> for Delta {
    /// Accepts either a bare op array or the `{"ops": [...]}` wrapper
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ops = match Value::deserialize(deserializer)? {
            Value::Array(items) => items,
            Value::Object(mut wrapper) => match wrapper.remove("ops") {
                Some(Value::Array(items)) => items,
                Some(_) => return Err(D::Error::custom("`ops` must be an array of ops")),
                None => return Err(D::Error::custom("expected an op array or an `ops` field")),
            },
            other => {
                return Err(D::Error::custom(format!(
                    "expected an op array or an `ops` object, got {other}"
                )))
            }
        };

        // Report the failing op with its position
        let ops = ops
            .into_iter()
            .enumerate()
            .map(|(i, raw)| {
                Op::deserialize(raw).map_err(|e| D::Error::custom(format!("op {i}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Delta::from_ops(ops))
    }
}
